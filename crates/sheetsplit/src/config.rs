//! Pipeline configuration

use sheetsplit_xlsx::{ReadOptions, WriteOptions};

/// Upload size ceiling (50 MiB)
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// MIME type of an XLSX workbook
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME type of a legacy Excel workbook
pub const XLS_MIME_TYPE: &str = "application/vnd.ms-excel";

/// What the validator accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Accepted declared MIME types (exact match)
    pub allowed_mime_types: Vec<String>,
    /// Accepted extensions, lowercase and without the dot
    pub allowed_extensions: Vec<String>,
    /// Largest accepted size in bytes
    pub max_file_size: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            allowed_mime_types: vec![XLSX_MIME_TYPE.to_string(), XLS_MIME_TYPE.to_string()],
            allowed_extensions: vec!["xlsx".to_string(), "xls".to_string()],
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

impl ValidationPolicy {
    /// Set the size ceiling
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Check a declared MIME type against the allow-list
    pub fn accepts_mime_type(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == mime_type)
    }

    /// Check a file name's extension (text after the last `.`) against the
    /// allow-list, ignoring case
    pub fn accepts_extension(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// How split workbooks are named and packed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Appended to the source file stem to name the download
    pub file_suffix: String,
    /// Extension of the download, with the dot
    pub archive_extension: String,
    /// Extension of each entry, with the dot
    pub entry_extension: String,
    /// Deflate level for archive entries (None = library default)
    pub compression_level: Option<u8>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            file_suffix: "_split_worksheets".to_string(),
            archive_extension: ".zip".to_string(),
            entry_extension: ".xlsx".to_string(),
            compression_level: None,
        }
    }
}

impl ArchiveOptions {
    /// Set the deflate level
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level.min(9));
        self
    }

    pub(crate) fn file_options(&self) -> zip::write::SimpleFileOptions {
        zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(self.compression_level.map(Into::into))
    }
}

/// Everything a [`SplitPipeline`](crate::SplitPipeline) needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validator policy
    pub validation: ValidationPolicy,
    /// How the analyzer parses the source
    pub read: ReadOptions,
    /// How split workbooks are serialized
    pub write: WriteOptions,
    /// Archive naming and packing
    pub archive: ArchiveOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationPolicy::default(),
            read: ReadOptions::default(),
            write: WriteOptions::default(),
            archive: ArchiveOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Replace the validation policy
    pub fn with_validation(mut self, validation: ValidationPolicy) -> Self {
        self.validation = validation;
        self
    }

    /// Replace the read options
    pub fn with_read_options(mut self, read: ReadOptions) -> Self {
        self.read = read;
        self
    }

    /// Replace the write options
    pub fn with_write_options(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }

    /// Replace the archive options
    pub fn with_archive_options(mut self, archive: ArchiveOptions) -> Self {
        self.archive = archive;
        self
    }
}
