//! # sheetsplit
//!
//! Split an XLSX workbook into one workbook per worksheet and bundle them
//! as a zip archive.
//!
//! A run goes through five stages:
//!
//! - **validate** - accept the file by declared type or extension, within a size ceiling
//! - **analyze** - parse the workbook and summarize each worksheet
//! - **split** - copy each selected worksheet, with the workbook metadata, into a workbook of its own
//! - **archive** - serialize the split workbooks and pack them into a zip
//! - **deliver** - hand the zip to a save target
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetsplit::prelude::*;
//!
//! # async fn demo() -> sheetsplit::SplitResult<()> {
//! let pipeline = SplitPipeline::default();
//! let source = SourceFile::from_path("Report.xlsx").await?;
//!
//! pipeline.validate(&source)?;
//! let analysis = pipeline.analyze(&source).await?;
//! for sheet in &analysis.worksheets {
//!     println!("{}: {} x {}", sheet.name, sheet.row_count, sheet.column_count);
//! }
//!
//! let archive = pipeline.process(&analysis, &["Q1", "Q2"], None).await?;
//! let package = pipeline.package(&analysis, &archive).await?;
//! pipeline.deliver(&package, &DirectoryTarget::new("out")).await?;
//! # Ok(())
//! # }
//! ```

pub mod analyze;
pub mod archive;
pub mod config;
pub mod delivery;
pub mod error;
pub mod pipeline;
pub mod prelude;
pub mod source;
pub mod split;
pub mod validate;

pub use analyze::{
    analyze_workbook, AnalysisStatus, FileAnalysisResult, FileIdentity, WorksheetSummary,
};
pub use archive::{
    process_worksheets, progress_percent, sanitize_entry_stem, ArchiveEntry, SplitArchive,
};
pub use config::{
    ArchiveOptions, PipelineConfig, ValidationPolicy, MAX_FILE_SIZE, XLSX_MIME_TYPE,
    XLS_MIME_TYPE,
};
pub use delivery::{
    download_file_name, generate_download, DirectoryTarget, DownloadPackage, SaveTarget,
};
pub use error::{SplitError, SplitResult};
pub use pipeline::SplitPipeline;
pub use source::{guess_mime_type, FileDescriptor, SourceFile};
pub use split::WorkbookSplitExt;
pub use validate::validate_file;

// Re-export the model and codec types that appear in the API
pub use sheetsplit_core::{
    CellAddress, CellComment, CellRange, CellValue, Hyperlink, NameScope, NamedRange, SheetState,
    Table, Workbook, Worksheet,
};
pub use sheetsplit_xlsx::{ReadOptions, WriteOptions, XlsxError, XlsxReader, XlsxWriter};

use std::path::Path;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open an XLSX workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, XlsxError>;

    /// Save the workbook to an XLSX file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), XlsxError>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, XlsxError> {
        XlsxReader::read_file(path)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), XlsxError> {
        XlsxWriter::write_file(self, path)
    }
}
