//! Column types

/// A `<col>` record: settings that apply to columns `min..=max`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpan {
    /// Start column index (0-based)
    pub min: u16,
    /// End column index (0-based, inclusive)
    pub max: u16,
    /// Width in character units
    pub width: Option<f64>,
    /// Width was set explicitly
    pub custom_width: bool,
    /// Hidden
    pub hidden: bool,
    /// Outline level
    pub outline_level: u8,
    /// Style index
    pub style_index: Option<u32>,
    /// Collapsed
    pub collapsed: bool,
    /// Best fit
    pub best_fit: bool,
}

impl ColumnSpan {
    /// Create column data for a single column
    pub fn single(index: u16) -> Self {
        Self::range(index, index)
    }

    /// Create column data for a range of columns
    pub fn range(min: u16, max: u16) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            width: None,
            custom_width: false,
            hidden: false,
            outline_level: 0,
            style_index: None,
            collapsed: false,
            best_fit: false,
        }
    }

    /// Set an explicit width
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self.custom_width = true;
        self
    }

    /// Set hidden
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Check if the span covers a column
    pub fn contains(&self, col: u16) -> bool {
        col >= self.min && col <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_normalized() {
        let span = ColumnSpan::range(5, 2).with_width(12.5);
        assert_eq!((span.min, span.max), (2, 5));
        assert!(span.custom_width);
        assert!(span.contains(3));
        assert!(!span.contains(6));
    }
}
