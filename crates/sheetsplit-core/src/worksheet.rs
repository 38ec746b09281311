//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue, Formula};
use crate::column::ColumnSpan;
use crate::comment::{CellComment, Hyperlink};
use crate::error::{Error, Result};
use crate::row::RowInfo;
use crate::table::{AutoFilter, Table};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Cloning a worksheet is a full deep copy: the cell grid, row and column
/// settings, merges, tables and every preserved fragment are owned values.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Visibility in the workbook
    state: SheetState,
    /// Cell storage
    cells: CellStorage,
    /// Row settings keyed by row index
    rows: BTreeMap<u32, RowInfo>,
    /// Column spans in file order
    columns: Vec<ColumnSpan>,
    /// Sheet-wide row/column defaults
    format: SheetFormat,
    /// Merged regions
    merged_regions: Vec<CellRange>,
    /// Sheet autofilter
    auto_filter: Option<AutoFilter>,
    /// Defined tables hosted by this sheet
    tables: Vec<Table>,
    /// Sheet protection settings
    protection: Option<SheetProtection>,
    /// Page margins
    page_margins: Option<PageMargins>,
    /// Cell comments keyed by (row, col)
    comments: BTreeMap<(u32, u16), CellComment>,
    /// Hyperlinks in file order
    hyperlinks: Vec<Hyperlink>,
    /// Preserved markup for settings without a typed model
    fragments: SheetFragments,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            state: SheetState::Visible,
            cells: CellStorage::new(),
            rows: BTreeMap::new(),
            columns: Vec::new(),
            format: SheetFormat::default(),
            merged_regions: Vec::new(),
            auto_filter: None,
            tables: Vec::new(),
            protection: None,
            page_margins: None,
            comments: BTreeMap::new(),
            hyperlinks: Vec::new(),
            fragments: SheetFragments::default(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Get the visibility state
    pub fn state(&self) -> SheetState {
        self.state
    }

    /// Set the visibility state
    pub fn set_state(&mut self, state: SheetState) {
        self.state = state;
    }

    /// Check if the sheet is visible
    pub fn is_visible(&self) -> bool {
        self.state == SheetState::Visible
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cells.get(addr.row, addr.col))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Get cell value by address (Empty when the cell does not exist)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Get a cell's style index (0 when the cell does not exist)
    pub fn cell_style_index_at(&self, row: u32, col: u16) -> u32 {
        self.cells.get(row, col).map_or(0, |c| c.style_index)
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        validate_cell_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: Formula) -> Result<()> {
        self.set_cell_value(address, CellValue::Formula(formula))
    }

    /// Set a cell style index by row and column indices
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style_index: u32) -> Result<()> {
        validate_cell_position(row, col)?;
        self.cells.set_style(row, col, style_index);
        Ok(())
    }

    /// Store a complete cell (value and style)
    pub fn set_cell_at(&mut self, row: u32, col: u16, cell: CellData) -> Result<()> {
        validate_cell_position(row, col)?;
        self.cells.insert(row, col, cell);
        Ok(())
    }

    /// Clear a cell by indices
    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(row, col);
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Check if the worksheet has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    /// Iterate over the cells of one row
    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.row(row)
    }

    /// Get the used range (bounds of all stored cells)
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells.used_bounds()
    }

    // === Row/Column Operations ===

    /// Get the settings of a row, if it has any
    pub fn row_info(&self, row: u32) -> Option<&RowInfo> {
        self.rows.get(&row)
    }

    /// Replace the settings of a row
    pub fn set_row_info(&mut self, row: u32, info: RowInfo) {
        if info.has_custom_settings() {
            self.rows.insert(row, info);
        } else {
            self.rows.remove(&row);
        }
    }

    /// Iterate over rows with custom settings
    pub fn rows(&self) -> impl Iterator<Item = (u32, &RowInfo)> {
        self.rows.iter().map(|(&row, info)| (row, info))
    }

    /// Row height in points (sheet default when not set)
    pub fn row_height(&self, row: u32) -> f64 {
        self.rows
            .get(&row)
            .and_then(|r| r.height)
            .unwrap_or(self.format.default_row_height)
    }

    /// Set row height
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        let info = self.rows.entry(row).or_default();
        info.height = Some(height);
        info.custom_height = true;
    }

    /// Set row hidden state
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        let mut info = self.rows.get(&row).cloned().unwrap_or_default();
        info.hidden = hidden;
        self.set_row_info(row, info);
    }

    /// Column spans in file order
    pub fn columns(&self) -> &[ColumnSpan] {
        &self.columns
    }

    /// Append a column span
    pub fn add_column_span(&mut self, span: ColumnSpan) -> Result<()> {
        if span.max >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(span.max, MAX_COLS - 1));
        }
        self.columns.push(span);
        Ok(())
    }

    /// Width of a column (None = sheet default)
    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| c.contains(col))
            .and_then(|c| c.width)
    }

    /// Get the sheet-wide defaults
    pub fn sheet_format(&self) -> &SheetFormat {
        &self.format
    }

    /// Get the sheet-wide defaults mutably
    pub fn sheet_format_mut(&mut self) -> &mut SheetFormat {
        &mut self.format
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Merge cells
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if self.merged_regions.iter().any(|m| m.overlaps(range)) {
            return Err(Error::MergedCellConflict(range.to_string()));
        }
        self.merged_regions.push(*range);
        Ok(())
    }

    /// Unmerge cells
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        match self.merged_regions.iter().position(|m| m == range) {
            Some(i) => {
                self.merged_regions.remove(i);
                true
            }
            None => false,
        }
    }

    // === Structure ===

    /// Get the sheet autofilter
    pub fn auto_filter(&self) -> Option<&AutoFilter> {
        self.auto_filter.as_ref()
    }

    /// Set the sheet autofilter
    pub fn set_auto_filter(&mut self, filter: Option<AutoFilter>) {
        self.auto_filter = filter;
    }

    /// Defined tables hosted by this sheet
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Number of defined tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Attach a defined table
    ///
    /// Table names are unique per workbook and tables may not overlap.
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        if let Some(existing) = self.tables.iter().find(|t| {
            t.name.eq_ignore_ascii_case(&table.name) || t.range.overlaps(&table.range)
        }) {
            return Err(Error::InvalidName(format!(
                "table '{}' conflicts with '{}'",
                table.name, existing.name
            )));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Get sheet protection
    pub fn protection(&self) -> Option<&SheetProtection> {
        self.protection.as_ref()
    }

    /// Set sheet protection
    pub fn set_protection(&mut self, protection: Option<SheetProtection>) {
        self.protection = protection;
    }

    /// Get page margins
    pub fn page_margins(&self) -> Option<&PageMargins> {
        self.page_margins.as_ref()
    }

    /// Set page margins
    pub fn set_page_margins(&mut self, margins: Option<PageMargins>) {
        self.page_margins = margins;
    }

    // === Comments and hyperlinks ===

    /// Set a comment on a cell by address string
    pub fn set_comment(&mut self, address: &str, comment: CellComment) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_comment_at(addr.row, addr.col, comment)
    }

    /// Set a comment on a cell by row and column indices
    pub fn set_comment_at(&mut self, row: u32, col: u16, comment: CellComment) -> Result<()> {
        validate_cell_position(row, col)?;
        self.comments.insert((row, col), comment);
        Ok(())
    }

    /// Get a comment by address string
    pub fn comment(&self, address: &str) -> Result<Option<&CellComment>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.comment_at(addr.row, addr.col))
    }

    /// Get a comment by row and column indices
    pub fn comment_at(&self, row: u32, col: u16) -> Option<&CellComment> {
        self.comments.get(&(row, col))
    }

    /// Remove a comment from a cell
    pub fn remove_comment_at(&mut self, row: u32, col: u16) -> Option<CellComment> {
        self.comments.remove(&(row, col))
    }

    /// Iterate over comments in row-major order
    pub fn comments(&self) -> impl Iterator<Item = (u32, u16, &CellComment)> {
        self.comments.iter().map(|(&(row, col), c)| (row, col, c))
    }

    /// Number of comments
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Distinct comment authors in order of first appearance
    pub fn comment_authors(&self) -> Vec<&str> {
        let mut authors: Vec<&str> = Vec::new();
        for comment in self.comments.values() {
            if !authors.contains(&comment.author.as_str()) {
                authors.push(&comment.author);
            }
        }
        authors
    }

    /// Hyperlinks in file order
    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    /// Get a hyperlink by position, mutably
    pub fn hyperlink_mut(&mut self, index: usize) -> Option<&mut Hyperlink> {
        self.hyperlinks.get_mut(index)
    }

    /// Attach a hyperlink, replacing one anchored to the same range
    pub fn add_hyperlink(&mut self, link: Hyperlink) {
        match self.hyperlinks.iter_mut().find(|h| h.range == link.range) {
            Some(existing) => *existing = link,
            None => self.hyperlinks.push(link),
        }
    }

    /// Preserved markup fragments
    pub fn fragments(&self) -> &SheetFragments {
        &self.fragments
    }

    /// Preserved markup fragments, mutably
    pub fn fragments_mut(&mut self) -> &mut SheetFragments {
        &mut self.fragments
    }
}

fn validate_cell_position(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
    }
    Ok(())
}

/// Visibility of a sheet within its workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetState {
    /// Shown as a tab
    #[default]
    Visible,
    /// Hidden, can be unhidden from the UI
    Hidden,
    /// Hidden, only reachable programmatically
    VeryHidden,
}

impl SheetState {
    /// Attribute value used in the workbook part
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetState::Visible => "visible",
            SheetState::Hidden => "hidden",
            SheetState::VeryHidden => "veryHidden",
        }
    }

    /// Parse the workbook attribute value (unknown values are visible)
    pub fn parse(s: &str) -> Self {
        match s {
            "hidden" => SheetState::Hidden,
            "veryHidden" => SheetState::VeryHidden,
            _ => SheetState::Visible,
        }
    }
}

/// Sheet-wide row and column defaults (`<sheetFormatPr>`)
#[derive(Debug, Clone, PartialEq)]
pub struct SheetFormat {
    /// Default row height in points
    pub default_row_height: f64,
    /// Default row height was set explicitly
    pub custom_height: bool,
    /// Default column width in characters
    pub default_col_width: Option<f64>,
    /// Base column width in characters
    pub base_col_width: Option<u32>,
    /// Rows are hidden by default
    pub zero_height: bool,
    /// Highest row outline level
    pub outline_level_row: u8,
    /// Highest column outline level
    pub outline_level_col: u8,
}

impl Default for SheetFormat {
    fn default() -> Self {
        Self {
            default_row_height: 15.0,
            custom_height: false,
            default_col_width: None,
            base_col_width: None,
            zero_height: false,
            outline_level_row: 0,
            outline_level_col: 0,
        }
    }
}

/// Sheet protection (`<sheetProtection>`)
///
/// Permission flags are tri-state: `None` means the attribute was absent and
/// the file-format default applies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetProtection {
    /// Legacy 16-bit password hash (hex)
    pub password: Option<String>,
    /// Hash algorithm name (e.g. `SHA-512`)
    pub algorithm_name: Option<String>,
    /// Base64 hash value
    pub hash_value: Option<String>,
    /// Base64 salt value
    pub salt_value: Option<String>,
    /// Hash iteration count
    pub spin_count: Option<u32>,
    /// Sheet is protected
    pub sheet: Option<bool>,
    /// Objects are locked
    pub objects: Option<bool>,
    /// Scenarios are locked
    pub scenarios: Option<bool>,
    /// Formatting cells is not allowed
    pub format_cells: Option<bool>,
    /// Formatting columns is not allowed
    pub format_columns: Option<bool>,
    /// Formatting rows is not allowed
    pub format_rows: Option<bool>,
    /// Inserting columns is not allowed
    pub insert_columns: Option<bool>,
    /// Inserting rows is not allowed
    pub insert_rows: Option<bool>,
    /// Inserting hyperlinks is not allowed
    pub insert_hyperlinks: Option<bool>,
    /// Deleting columns is not allowed
    pub delete_columns: Option<bool>,
    /// Deleting rows is not allowed
    pub delete_rows: Option<bool>,
    /// Selecting locked cells is not allowed
    pub select_locked_cells: Option<bool>,
    /// Sorting is not allowed
    pub sort: Option<bool>,
    /// Using autofilter is not allowed
    pub auto_filter: Option<bool>,
    /// Using pivot tables is not allowed
    pub pivot_tables: Option<bool>,
    /// Selecting unlocked cells is not allowed
    pub select_unlocked_cells: Option<bool>,
}

impl SheetProtection {
    /// Permission flags paired with their attribute names, in schema order
    pub fn flags(&self) -> [(&'static str, Option<bool>); 16] {
        [
            ("sheet", self.sheet),
            ("objects", self.objects),
            ("scenarios", self.scenarios),
            ("formatCells", self.format_cells),
            ("formatColumns", self.format_columns),
            ("formatRows", self.format_rows),
            ("insertColumns", self.insert_columns),
            ("insertRows", self.insert_rows),
            ("insertHyperlinks", self.insert_hyperlinks),
            ("deleteColumns", self.delete_columns),
            ("deleteRows", self.delete_rows),
            ("selectLockedCells", self.select_locked_cells),
            ("sort", self.sort),
            ("autoFilter", self.auto_filter),
            ("pivotTables", self.pivot_tables),
            ("selectUnlockedCells", self.select_unlocked_cells),
        ]
    }

    /// Set a permission flag by attribute name. Returns false for unknown names.
    pub fn set_flag(&mut self, attr: &str, value: bool) -> bool {
        let slot = match attr {
            "sheet" => &mut self.sheet,
            "objects" => &mut self.objects,
            "scenarios" => &mut self.scenarios,
            "formatCells" => &mut self.format_cells,
            "formatColumns" => &mut self.format_columns,
            "formatRows" => &mut self.format_rows,
            "insertColumns" => &mut self.insert_columns,
            "insertRows" => &mut self.insert_rows,
            "insertHyperlinks" => &mut self.insert_hyperlinks,
            "deleteColumns" => &mut self.delete_columns,
            "deleteRows" => &mut self.delete_rows,
            "selectLockedCells" => &mut self.select_locked_cells,
            "sort" => &mut self.sort,
            "autoFilter" => &mut self.auto_filter,
            "pivotTables" => &mut self.pivot_tables,
            "selectUnlockedCells" => &mut self.select_unlocked_cells,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// Page margins in inches (`<pageMargins>`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    /// Left margin
    pub left: f64,
    /// Right margin
    pub right: f64,
    /// Top margin
    pub top: f64,
    /// Bottom margin
    pub bottom: f64,
    /// Header margin
    pub header: f64,
    /// Footer margin
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

/// Worksheet settings kept as markup
///
/// Each fragment is a complete element exactly as read. Only elements that
/// reference nothing outside the sheet and the shared style sheet are kept,
/// so they stay valid in any workbook that shares the same styles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetFragments {
    /// Namespace declarations (and `mc:Ignorable`) of the source root
    /// element, needed by prefixed markup inside the fragments
    pub namespaces: Vec<(String, String)>,
    /// `<sheetPr>` (tab color, outline and fit-to-page settings)
    pub sheet_pr: Option<String>,
    /// `<sheetViews>` (selection, freeze panes, zoom)
    pub sheet_views: Option<String>,
    /// `<conditionalFormatting>` blocks in file order
    pub conditional_formatting: Vec<String>,
    /// `<dataValidations>`
    pub data_validations: Option<String>,
    /// `<printOptions>`
    pub print_options: Option<String>,
    /// `<pageSetup>` without relationship ids
    pub page_setup: Option<String>,
    /// `<headerFooter>`
    pub header_footer: Option<String>,
    /// `<rowBreaks>`
    pub row_breaks: Option<String>,
    /// `<colBreaks>`
    pub col_breaks: Option<String>,
    /// `<ignoredErrors>`
    pub ignored_errors: Option<String>,
    /// `<extLst>` (extended conditional formats, sparklines, slicers' filters)
    pub ext_lst: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableColumn;

    #[test]
    fn test_new_worksheet() {
        let ws = Worksheet::new("Test");
        assert_eq!(ws.name(), "Test");
        assert!(ws.is_visible());
        assert!(ws.is_empty());
        assert!(ws.used_range().is_none());
    }

    #[test]
    fn test_set_cell_values() {
        let mut ws = Worksheet::new("Test");

        ws.set_cell_value("A1", "Hello").unwrap();
        ws.set_cell_value("B1", 42.0).unwrap();
        ws.set_cell_value("C1", true).unwrap();
        ws.set_cell_formula("D1", Formula::new("=B1*2")).unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("Hello"));
        assert_eq!(ws.get_value("B1").unwrap().as_number(), Some(42.0));
        assert_eq!(ws.get_value("C1").unwrap().as_bool(), Some(true));
        assert!(ws.get_value("D1").unwrap().is_formula());
        assert!(ws.set_cell_value_at(MAX_ROWS, 0, 1.0).is_err());
    }

    #[test]
    fn test_used_range() {
        let mut ws = Worksheet::new("Test");

        ws.set_cell_value_at(5, 3, "A").unwrap();
        ws.set_cell_value_at(10, 7, "B").unwrap();

        let range = ws.used_range().unwrap();
        assert_eq!(range.to_string(), "D6:H11");
    }

    #[test]
    fn test_row_column_dimensions() {
        let mut ws = Worksheet::new("Test");

        assert!((ws.row_height(0) - 15.0).abs() < 0.001);
        assert_eq!(ws.column_width(0), None);

        ws.set_row_height(5, 30.0);
        ws.add_column_span(ColumnSpan::range(2, 4).with_width(20.0)).unwrap();

        assert!((ws.row_height(5) - 30.0).abs() < 0.001);
        assert_eq!(ws.column_width(3), Some(20.0));

        ws.set_row_hidden(7, true);
        ws.set_row_hidden(7, false);
        assert!(ws.row_info(7).is_none());
    }

    #[test]
    fn test_merge_conflict() {
        let mut ws = Worksheet::new("Test");
        ws.merge_cells(&CellRange::parse("A1:B2").unwrap()).unwrap();
        assert!(ws.merge_cells(&CellRange::parse("B2:C3").unwrap()).is_err());
        assert!(ws.unmerge_cells(&CellRange::parse("A1:B2").unwrap()));
        assert!(ws.merged_regions().is_empty());
    }

    #[test]
    fn test_tables_must_not_overlap() {
        let mut ws = Worksheet::new("Test");
        let table = Table::new(1, "Sales", CellRange::parse("A1:B5").unwrap())
            .with_column(TableColumn::new(1, "Region"))
            .with_column(TableColumn::new(2, "Amount"));
        ws.add_table(table).unwrap();

        let overlapping = Table::new(2, "Other", CellRange::parse("B3:C6").unwrap());
        assert!(ws.add_table(overlapping).is_err());
        assert_eq!(ws.table_count(), 1);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value("A1", 1.0).unwrap();
        ws.fragments_mut().sheet_views = Some("<sheetViews/>".into());

        let mut copy = ws.clone();
        copy.set_cell_value("A1", 2.0).unwrap();
        copy.fragments_mut().sheet_views = None;

        assert_eq!(ws.get_value("A1").unwrap().as_number(), Some(1.0));
        assert!(ws.fragments().sheet_views.is_some());
    }

    #[test]
    fn test_comments_and_hyperlinks() {
        let mut ws = Worksheet::new("Test");
        ws.set_comment("C3", CellComment::new("Lee", "later")).unwrap();
        ws.set_comment("A1", CellComment::new("Dana", "first")).unwrap();
        ws.set_comment("B2", CellComment::new("Lee", "second")).unwrap();
        assert!(ws.set_comment_at(MAX_ROWS, 0, CellComment::default()).is_err());

        let order: Vec<_> = ws.comments().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(ws.comment_authors(), vec!["Dana", "Lee"]);
        assert_eq!(ws.remove_comment_at(0, 0).unwrap().text, "first");
        assert_eq!(ws.comment_count(), 2);

        let a1 = CellRange::parse("A1").unwrap();
        ws.add_hyperlink(Hyperlink::internal(a1, "Test!B2"));
        ws.add_hyperlink(Hyperlink::external(a1, "https://example.com"));
        assert_eq!(ws.hyperlinks().len(), 1);
        assert_eq!(ws.hyperlinks()[0].target.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_protection_flags() {
        let mut protection = SheetProtection::default();
        assert!(protection.set_flag("formatCells", false));
        assert!(!protection.set_flag("bogus", true));
        assert_eq!(protection.format_cells, Some(false));
        assert_eq!(
            protection.flags().iter().filter(|(_, v)| v.is_some()).count(),
            1
        );
    }
}
