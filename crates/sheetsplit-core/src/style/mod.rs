//! Shared styling resources
//!
//! Cells refer to formatting by index into the workbook's style sheet, so the
//! style sheet, the theme it draws colors and fonts from, and the number
//! format table are treated as immutable resources shared between workbooks:
//! [`crate::Workbook`] holds them behind `Arc`.
//!
//! - [`StyleSheet`] - The workbook style part, kept as markup
//! - [`Theme`] - The workbook theme part, kept as markup
//! - [`NumberFormatTable`] - Custom number formats by id

mod number_format;

pub use number_format::NumberFormatTable;

/// A workbook style sheet
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    /// The complete style part
    pub xml: String,
    /// Number of `cellXfs` records (valid cell style indices are below this)
    pub cell_xfs_count: u32,
    /// Number of differential formats (`dxfs`), referenced by tables and rules
    pub dxf_count: u32,
}

impl StyleSheet {
    /// Create a style sheet from its markup and record counts
    pub fn new(xml: impl Into<String>, cell_xfs_count: u32, dxf_count: u32) -> Self {
        Self {
            xml: xml.into(),
            cell_xfs_count,
            dxf_count,
        }
    }

    /// Check if a cell style index refers to an existing record
    pub fn has_cell_xf(&self, index: u32) -> bool {
        index < self.cell_xfs_count
    }
}

/// A workbook theme (colors, fonts and effects)
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Theme name, if declared
    pub name: Option<String>,
    /// The complete theme part
    pub xml: String,
}

impl Theme {
    /// Create a theme from its markup
    pub fn new(name: Option<String>, xml: impl Into<String>) -> Self {
        Self {
            name,
            xml: xml.into(),
        }
    }
}
