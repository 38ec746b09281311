//! Cell comments (notes) and hyperlinks
//!
//! ## Example
//!
//! ```rust
//! use sheetsplit_core::{CellComment, CellRange, Hyperlink, Worksheet};
//!
//! let mut sheet = Worksheet::new("Q1");
//! sheet.set_comment("B2", CellComment::new("Dana", "Check this total")).unwrap();
//! sheet.add_hyperlink(
//!     Hyperlink::external(CellRange::parse("A1").unwrap(), "https://example.com/q1")
//!         .with_display("Source"),
//! );
//!
//! assert_eq!(sheet.comment("B2").unwrap().unwrap().author, "Dana");
//! assert_eq!(sheet.hyperlinks().len(), 1);
//! ```

use crate::cell::CellRange;

/// A cell comment/note
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellComment {
    /// Author of the comment (may be empty)
    pub author: String,
    /// Plain text content
    pub text: String,
    /// Verbatim `<r>` runs of a formatted comment; empty for plain text
    pub runs_xml: String,
}

impl CellComment {
    /// Create a plain-text comment
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            runs_xml: String::new(),
        }
    }

    /// Check if this comment has an author
    pub fn has_author(&self) -> bool {
        !self.author.is_empty()
    }
}

impl std::fmt::Display for CellComment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_author() {
            write!(f, "[{}]: {}", self.author, self.text)
        } else {
            write!(f, "{}", self.text)
        }
    }
}

/// A hyperlink anchored to a cell range
///
/// A link leads to an external `target` (URL, file path), a `location`
/// inside the workbook, or a location within an external target.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    /// Cells the link is attached to
    pub range: CellRange,
    /// External target
    pub target: Option<String>,
    /// Location inside the workbook or the target (e.g. `Summary!A1`)
    pub location: Option<String>,
    /// Display text
    pub display: Option<String>,
    /// Tooltip text
    pub tooltip: Option<String>,
}

impl Hyperlink {
    /// A link to an external target
    pub fn external(range: CellRange, target: impl Into<String>) -> Self {
        Self {
            range,
            target: Some(target.into()),
            location: None,
            display: None,
            tooltip: None,
        }
    }

    /// A link to a location inside the workbook
    pub fn internal(range: CellRange, location: impl Into<String>) -> Self {
        Self {
            range,
            target: None,
            location: Some(location.into()),
            display: None,
            tooltip: None,
        }
    }

    /// Set the display text
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Set the tooltip
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_display() {
        assert_eq!(CellComment::new("Dana", "Check").to_string(), "[Dana]: Check");
        assert_eq!(CellComment::new("", "Check").to_string(), "Check");
        assert!(!CellComment::default().has_author());
    }

    #[test]
    fn test_hyperlink_builders() {
        let range = CellRange::parse("A1:B2").unwrap();
        let link = Hyperlink::internal(range, "Summary!A1").with_tooltip("Back");
        assert_eq!(link.target, None);
        assert_eq!(link.location.as_deref(), Some("Summary!A1"));
        assert_eq!(link.tooltip.as_deref(), Some("Back"));

        let link = Hyperlink::external(range, "https://example.com").with_display("Site");
        assert_eq!(link.target.as_deref(), Some("https://example.com"));
        assert_eq!(link.display.as_deref(), Some("Site"));
    }
}
