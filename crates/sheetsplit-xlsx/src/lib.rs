//! # sheetsplit-xlsx
//!
//! XLSX (Office Open XML) reader and writer for sheetsplit.
//!
//! The reader loads a package into a [`sheetsplit_core::Workbook`], keeping
//! the parts a per-sheet split has to carry over: cell values and formulas,
//! styles, merges, tables, defined names and document properties. Sheet
//! features the model does not interpret are kept as verbatim fragments so
//! the writer can put them back.

pub mod error;
pub mod options;
pub mod reader;
pub mod writer;

mod styles;
mod xml;

pub use error::{XlsxError, XlsxResult};
pub use options::{ReadOptions, WriteOptions};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
