//! # sheetsplit-core
//!
//! Core data structures for the sheetsplit workbook splitter.
//!
//! This crate provides the in-memory workbook model shared by the codec and
//! the split pipeline:
//! - [`CellValue`] - Cell values (numbers, strings, rich text, booleans, errors, formulas)
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`Worksheet`] - Cell grid plus structural metadata (tables, merges, sizing, protection,
//!   comments, hyperlinks)
//! - [`Workbook`] - Ordered worksheets plus workbook-level metadata
//!
//! ## Example
//!
//! ```rust
//! use sheetsplit_core::{CellRange, Table, TableColumn, Workbook};
//!
//! let mut workbook = Workbook::empty();
//! let index = workbook.add_worksheet_with_name("Q1").unwrap();
//! let sheet = workbook.worksheet_mut(index).unwrap();
//!
//! sheet.set_cell_value("A1", "Region").unwrap();
//! sheet.set_cell_value("B1", "Amount").unwrap();
//! sheet.set_cell_value("A2", "North").unwrap();
//! sheet.set_cell_value("B2", 1250.0).unwrap();
//!
//! let table = Table::new(1, "Sales", CellRange::parse("A1:B2").unwrap())
//!     .with_column(TableColumn::new(1, "Region"))
//!     .with_column(TableColumn::new(2, "Amount"));
//! sheet.add_table(table).unwrap();
//!
//! assert_eq!(workbook.table_count(), 1);
//! ```

pub mod cell;
pub mod column;
pub mod comment;
pub mod error;
pub mod named_range;
pub mod properties;
pub mod row;
pub mod style;
pub mod table;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{
    CellAddress, CellData, CellError, CellRange, CellValue, Formula, FormulaKind, RichText,
};
pub use column::ColumnSpan;
pub use comment::{CellComment, Hyperlink};
pub use error::{Error, Result};
pub use named_range::{NameScope, NamedRange, NamedRangeCollection};
pub use properties::{CustomProperties, CustomProperty, CustomValue, DocumentProperties};
pub use row::RowInfo;
pub use style::{NumberFormatTable, StyleSheet, Theme};
pub use table::{AutoFilter, Table, TableColumn, TableStyleInfo};
pub use workbook::{
    CalculationSettings, Workbook, WorkbookProtection, WorkbookSettings, WorkbookView,
};
pub use worksheet::{PageMargins, SheetFormat, SheetFragments, SheetProtection, SheetState, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
