//! Workbook type - the main document structure

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::named_range::{NamedRange, NamedRangeCollection};
use crate::properties::{CustomProperties, DocumentProperties};
use crate::style::{NumberFormatTable, StyleSheet, Theme};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
///
/// A workbook owns its worksheets and workbook-level metadata. The style
/// sheet, theme and number-format table are immutable shared resources held
/// behind `Arc`, so cloning a workbook shares them while every other part is
/// deep-copied.
///
/// Optional metadata groups are `None` when the source package did not carry
/// them; writers skip absent groups rather than inventing defaults.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
    /// Workbook settings
    settings: WorkbookSettings,
    /// Window views (`bookViews`)
    views: Vec<WorkbookView>,
    /// Calculation settings (`calcPr`)
    calculation: Option<CalculationSettings>,
    /// Named ranges (defined names)
    named_ranges: NamedRangeCollection,
    /// Core and extended document properties
    properties: Option<DocumentProperties>,
    /// Custom document properties
    custom_properties: Option<CustomProperties>,
    /// Theme
    theme: Option<Arc<Theme>>,
    /// Style sheet
    styles: Option<Arc<StyleSheet>>,
    /// Number-format definitions
    number_formats: Option<Arc<NumberFormatTable>>,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(Worksheet::name).collect()
    }

    /// Add a new empty worksheet with the given name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.add_existing_worksheet(Worksheet::new(name))
    }

    /// Add an existing worksheet to the workbook
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        Ok(index)
    }

    /// Total number of defined tables across all sheets
    pub fn table_count(&self) -> usize {
        self.worksheets.iter().map(Worksheet::table_count).sum()
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    // ==================== Views & Calculation ====================

    /// Workbook window views
    pub fn views(&self) -> &[WorkbookView] {
        &self.views
    }

    /// Replace the workbook window views
    pub fn set_views(&mut self, views: Vec<WorkbookView>) {
        self.views = views;
    }

    /// Calculation settings
    pub fn calculation(&self) -> Option<&CalculationSettings> {
        self.calculation.as_ref()
    }

    /// Set calculation settings
    pub fn set_calculation(&mut self, calculation: Option<CalculationSettings>) {
        self.calculation = calculation;
    }

    // ==================== Named Ranges ====================

    /// Define a new named range
    pub fn define_name(&mut self, range: NamedRange) -> Result<()> {
        self.named_ranges.define(range)
    }

    /// Get the named range collection (read-only)
    pub fn named_ranges(&self) -> &NamedRangeCollection {
        &self.named_ranges
    }

    /// Replace the named range collection
    pub fn set_named_ranges(&mut self, named_ranges: NamedRangeCollection) {
        self.named_ranges = named_ranges;
    }

    // ==================== Properties ====================

    /// Core and extended document properties
    pub fn properties(&self) -> Option<&DocumentProperties> {
        self.properties.as_ref()
    }

    /// Set document properties
    pub fn set_properties(&mut self, properties: Option<DocumentProperties>) {
        self.properties = properties;
    }

    /// Custom document properties
    pub fn custom_properties(&self) -> Option<&CustomProperties> {
        self.custom_properties.as_ref()
    }

    /// Set custom document properties
    pub fn set_custom_properties(&mut self, properties: Option<CustomProperties>) {
        self.custom_properties = properties;
    }

    // ==================== Shared Resources ====================

    /// Theme
    pub fn theme(&self) -> Option<&Arc<Theme>> {
        self.theme.as_ref()
    }

    /// Set the theme
    pub fn set_theme(&mut self, theme: Option<Arc<Theme>>) {
        self.theme = theme;
    }

    /// Style sheet
    pub fn styles(&self) -> Option<&Arc<StyleSheet>> {
        self.styles.as_ref()
    }

    /// Set the style sheet
    pub fn set_styles(&mut self, styles: Option<Arc<StyleSheet>>) {
        self.styles = styles;
    }

    /// Number-format definitions
    pub fn number_formats(&self) -> Option<&Arc<NumberFormatTable>> {
        self.number_formats.as_ref()
    }

    /// Set the number-format definitions
    pub fn set_number_formats(&mut self, number_formats: Option<Arc<NumberFormatTable>>) {
        self.number_formats = number_formats;
    }

    /// Validate a sheet name
    ///
    /// Names read from existing packages may contain characters the
    /// spreadsheet UI would refuse, so only emptiness, length and
    /// case-insensitive uniqueness are enforced.
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        let name_lower = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().to_lowercase() == name_lower)
        {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }
}

/// Workbook-level settings (`workbookPr`, `workbookProtection`)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookSettings {
    /// Date system: false = 1900 (Windows), true = 1904 (Mac)
    pub date_1904: bool,
    /// VBA code name of the workbook
    pub code_name: Option<String>,
    /// Default theme version recorded by the producing application
    pub default_theme_version: Option<u32>,
    /// Structure/window protection
    pub protection: Option<WorkbookProtection>,
}

/// Workbook structure protection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookProtection {
    /// Sheets cannot be added, moved or deleted
    pub lock_structure: bool,
    /// Windows cannot be resized or moved
    pub lock_windows: bool,
    /// Legacy 16-bit password hash (hex)
    pub password: Option<String>,
    /// Hash algorithm name
    pub algorithm_name: Option<String>,
    /// Base64 hash value
    pub hash_value: Option<String>,
    /// Base64 salt value
    pub salt_value: Option<String>,
    /// Hash iteration count
    pub spin_count: Option<u32>,
}

/// A workbook window (`<workbookView>`)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookView {
    /// Window x position
    pub x_window: Option<i32>,
    /// Window y position
    pub y_window: Option<i32>,
    /// Window width
    pub window_width: Option<u32>,
    /// Window height
    pub window_height: Option<u32>,
    /// Ratio between tab bar and horizontal scroll bar (per mille)
    pub tab_ratio: Option<u32>,
    /// Index of the sheet shown first in the tab bar
    pub first_sheet: usize,
    /// Index of the active sheet
    pub active_tab: usize,
    /// Any other attributes, in file order
    pub extra_attributes: Vec<(String, String)>,
}

impl WorkbookView {
    /// Copy of this view that points at the first sheet
    pub fn for_single_sheet(&self) -> Self {
        Self {
            first_sheet: 0,
            active_tab: 0,
            ..self.clone()
        }
    }
}

/// Calculation settings (`<calcPr>`)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalculationSettings {
    /// Engine version that last calculated the workbook
    pub calc_id: Option<u32>,
    /// `auto`, `autoNoTable` or `manual`
    pub calc_mode: Option<String>,
    /// Recalculate everything on open
    pub full_calc_on_load: Option<bool>,
    /// `A1` or `R1C1`
    pub ref_mode: Option<String>,
    /// Iterative calculation enabled
    pub iterate: Option<bool>,
    /// Iteration count
    pub iterate_count: Option<u32>,
    /// Iteration delta
    pub iterate_delta: Option<f64>,
    /// Any other attributes, in file order
    pub extra_attributes: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::named_range::NameScope;

    #[test]
    fn test_add_worksheets() {
        let mut wb = Workbook::empty();
        assert!(wb.is_empty());

        assert_eq!(wb.add_worksheet_with_name("Summary").unwrap(), 0);
        assert_eq!(wb.add_worksheet_with_name("Q1/Q2").unwrap(), 1);
        assert_eq!(wb.sheet_names(), vec!["Summary", "Q1/Q2"]);
        assert_eq!(wb.sheet_index("Q1/Q2"), Some(1));
    }

    #[test]
    fn test_duplicate_name() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("Sheet1").unwrap();

        assert!(wb.add_worksheet_with_name("SHEET1").is_err());
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb
            .add_worksheet_with_name(&"A".repeat(MAX_SHEET_NAME_LEN + 1))
            .is_err());
    }

    #[test]
    fn test_clone_shares_resources() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("Data").unwrap();
        wb.set_theme(Some(Arc::new(Theme::new(Some("Office".into()), "<a:theme/>"))));
        wb.define_name(NamedRange::new("Rate", "Data!$B$1", NameScope::Workbook))
            .unwrap();

        let copy = wb.clone();
        assert!(Arc::ptr_eq(copy.theme().unwrap(), wb.theme().unwrap()));
        assert_eq!(copy.named_ranges(), wb.named_ranges());
    }

    #[test]
    fn test_view_for_single_sheet() {
        let view = WorkbookView {
            active_tab: 3,
            first_sheet: 1,
            window_width: Some(28800),
            ..WorkbookView::default()
        };
        let single = view.for_single_sheet();
        assert_eq!((single.active_tab, single.first_sheet), (0, 0));
        assert_eq!(single.window_width, Some(28800));
    }
}
