//! Row types

/// Row metadata (`<row>` attributes other than the cells themselves)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowInfo {
    /// Height in points (None = default)
    pub height: Option<f64>,
    /// Height was set explicitly rather than auto-fitted
    pub custom_height: bool,
    /// Row is hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Row-level style index (None = no row style)
    pub style_index: Option<u32>,
    /// Row is collapsed (in outline)
    pub collapsed: bool,
    /// Thick top border flag
    pub thick_top: bool,
    /// Thick bottom border flag
    pub thick_bottom: bool,
}

impl RowInfo {
    /// Create row info with an explicit height
    pub fn with_height(height: f64) -> Self {
        Self {
            height: Some(height),
            custom_height: true,
            ..Self::default()
        }
    }

    /// Mark the row hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Check if this row has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.height.is_some()
            || self.custom_height
            || self.hidden
            || self.outline_level > 0
            || self.style_index.is_some()
            || self.collapsed
            || self.thick_top
            || self.thick_bottom
    }
}
