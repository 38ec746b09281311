//! Uploaded source files

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::config::{XLSX_MIME_TYPE, XLS_MIME_TYPE};
use crate::error::{SplitError, SplitResult};

/// Name, declared type and size of a file; all the validator looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDescriptor<'a> {
    /// Original file name
    pub name: &'a str,
    /// Declared MIME type (may be empty)
    pub mime_type: &'a str,
    /// Size in bytes
    pub size: u64,
}

#[derive(Debug, Clone)]
enum Content {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// An uploaded workbook: raw bytes (in memory or on disk) plus the
/// descriptor the host declared for it
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    mime_type: String,
    size: u64,
    content: Content,
}

impl SourceFile {
    /// A file already held in memory
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            content: Content::Memory(bytes),
        }
    }

    /// A file on disk. The size comes from its metadata and the MIME type is
    /// guessed from the extension; the content is read lazily.
    pub async fn from_path(path: impl AsRef<Path>) -> SplitResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(SplitError::ReadFailure)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            mime_type: guess_mime_type(&name).to_string(),
            name,
            size: metadata.len(),
            content: Content::Disk(path.to_path_buf()),
        })
    }

    /// Original file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Descriptor handed to the validator
    pub fn descriptor(&self) -> FileDescriptor<'_> {
        FileDescriptor {
            name: &self.name,
            mime_type: &self.mime_type,
            size: self.size,
        }
    }

    /// The raw bytes. Failing to obtain them is a [`SplitError::ReadFailure`].
    pub async fn read_bytes(&self) -> SplitResult<Cow<'_, [u8]>> {
        match &self.content {
            Content::Memory(bytes) => Ok(Cow::Borrowed(bytes)),
            Content::Disk(path) => tokio::fs::read(path)
                .await
                .map(Cow::Owned)
                .map_err(SplitError::ReadFailure),
        }
    }
}

/// MIME type for a file name, by extension
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("xlsx") => XLSX_MIME_TYPE,
        Some("xls") => XLS_MIME_TYPE,
        _ => "application/octet-stream",
    }
}
