//! Defined tables and autofilters
//!
//! A defined table is a named, structured range inside one worksheet. Its
//! definition lives in its own package part and is attached to the worksheet
//! that hosts it.

use crate::cell::CellRange;

/// An autofilter applied to a range
///
/// The filter criteria (`filterColumn` and `sortState` children) are kept as
/// markup because they only reference the range itself and shared styles.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoFilter {
    /// Filtered range, including the header row
    pub range: CellRange,
    /// Verbatim child markup of the `<autoFilter>` element
    pub criteria_xml: String,
}

impl AutoFilter {
    /// Create an autofilter without criteria
    pub fn new(range: CellRange) -> Self {
        Self {
            range,
            criteria_xml: String::new(),
        }
    }
}

/// A column of a defined table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableColumn {
    /// Column id, unique within the table
    pub id: u32,
    /// Header text
    pub name: String,
    /// Totals row aggregate (`sum`, `average`, `custom`, ...)
    pub totals_row_function: Option<String>,
    /// Totals row label text
    pub totals_row_label: Option<String>,
    /// Formula applied to every data cell of the column
    pub calculated_formula: Option<String>,
    /// Formula used when `totals_row_function` is `custom`
    pub totals_row_formula: Option<String>,
    /// Differential format applied to the data cells
    pub data_dxf_id: Option<u32>,
}

impl TableColumn {
    /// Create a column with an id and header
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Visual style of a table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableStyleInfo {
    /// Table style name (e.g. `TableStyleMedium2`)
    pub name: Option<String>,
    /// Emphasize the first column
    pub show_first_column: bool,
    /// Emphasize the last column
    pub show_last_column: bool,
    /// Banded rows
    pub show_row_stripes: bool,
    /// Banded columns
    pub show_column_stripes: bool,
}

/// A defined table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table id, unique within the workbook
    pub id: u32,
    /// Internal name
    pub name: String,
    /// Name used in structured references
    pub display_name: String,
    /// Range covered by the table, including header and totals rows
    pub range: CellRange,
    /// Number of header rows (0 or 1)
    pub header_row_count: u32,
    /// Number of totals rows (0 or 1)
    pub totals_row_count: u32,
    /// Whether a totals row has ever been shown
    pub totals_row_shown: Option<bool>,
    /// Columns in left-to-right order
    pub columns: Vec<TableColumn>,
    /// Table autofilter
    pub auto_filter: Option<AutoFilter>,
    /// Table style
    pub style: Option<TableStyleInfo>,
    /// Differential format of the header row
    pub header_row_dxf_id: Option<u32>,
    /// Differential format of the data area
    pub data_dxf_id: Option<u32>,
    /// Differential format of the totals row
    pub totals_row_dxf_id: Option<u32>,
    /// Verbatim `<sortState>` element of the table
    pub sort_state_xml: Option<String>,
}

impl Table {
    /// Create a table with one header row and no columns
    pub fn new(id: u32, name: impl Into<String>, range: CellRange) -> Self {
        let name = name.into();
        Self {
            id,
            display_name: name.clone(),
            name,
            range,
            header_row_count: 1,
            totals_row_count: 0,
            totals_row_shown: None,
            columns: Vec::new(),
            auto_filter: None,
            style: None,
            header_row_dxf_id: None,
            data_dxf_id: None,
            totals_row_dxf_id: None,
            sort_state_xml: None,
        }
    }

    /// Add a column
    pub fn with_column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Number of data rows (excluding header and totals rows)
    pub fn data_row_count(&self) -> u32 {
        self.range
            .row_count()
            .saturating_sub(self.header_row_count + self.totals_row_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_data_rows() {
        let mut table = Table::new(1, "Sales", CellRange::parse("A1:C10").unwrap())
            .with_column(TableColumn::new(1, "Region"))
            .with_column(TableColumn::new(2, "Amount"));
        assert_eq!(table.display_name, "Sales");
        assert_eq!(table.data_row_count(), 9);

        table.totals_row_count = 1;
        assert_eq!(table.data_row_count(), 8);
        assert_eq!(table.columns.len(), 2);
    }
}
