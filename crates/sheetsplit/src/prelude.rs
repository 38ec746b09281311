//! Prelude module - common imports for sheetsplit users
//!
//! ```rust
//! use sheetsplit::prelude::*;
//! ```

pub use crate::{
    // Pipeline
    ArchiveOptions,
    DirectoryTarget,
    DownloadPackage,
    FileAnalysisResult,
    PipelineConfig,
    SaveTarget,
    SourceFile,
    SplitArchive,
    SplitError,
    SplitPipeline,
    SplitResult,
    ValidationPolicy,
    WorksheetSummary,

    // Model
    CellValue,
    Workbook,
    Worksheet,

    // Extension traits
    WorkbookExt,
    WorkbookSplitExt,

    // I/O types
    XlsxReader,
    XlsxWriter,
};
