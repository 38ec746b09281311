//! Read and write options

/// What the reader retains beyond cell values
///
/// The defaults retain everything the reader understands, which is what a
/// faithful split needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Keep the style sheet and cell/row/column style indices
    pub cell_styles: bool,
    /// Keep the custom number-format table
    pub number_formats: bool,
    /// Keep structural metadata: tables, merges, autofilter, protection,
    /// margins, comments, hyperlinks and preserved sheet fragments
    pub structure: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            cell_styles: true,
            number_formats: true,
            structure: true,
        }
    }
}

impl ReadOptions {
    /// Values only: no styles, number formats or structure
    pub fn values_only() -> Self {
        Self {
            cell_styles: false,
            number_formats: false,
            structure: false,
        }
    }
}

/// How the writer serializes a workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Write the retained style sheet and style indices
    pub cell_styles: bool,
    /// Write retained number formats when a style sheet has to be generated
    pub number_formats: bool,
    /// Deflate level for package parts (None = library default)
    pub compression_level: Option<u8>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            cell_styles: true,
            number_formats: true,
            compression_level: None,
        }
    }
}

impl WriteOptions {
    /// Set the deflate level
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level.min(9));
        self
    }

    /// Parts carry a fixed timestamp, so equal workbooks serialize to
    /// equal bytes
    pub(crate) fn file_options(&self) -> zip::write::SimpleFileOptions {
        zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
            .compression_level(self.compression_level.map(Into::into))
    }
}
