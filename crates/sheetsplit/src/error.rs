//! Pipeline error types

use sheetsplit_xlsx::XlsxError;
use thiserror::Error;

/// Result type for pipeline operations
pub type SplitResult<T> = std::result::Result<T, SplitError>;

/// Errors a pipeline run can end with.
///
/// Every variant is terminal for the run that raised it. The `Display` text
/// is meant for end users; the low-level cause is available through
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum SplitError {
    /// Neither the declared type nor the file extension is accepted
    #[error("Please upload a valid Excel file (.xlsx or .xls)")]
    InvalidFormat {
        /// Name of the rejected file
        name: String,
    },

    /// The file exceeds the size ceiling
    #[error("File size must be less than {} MB", .limit / (1024 * 1024))]
    TooLarge {
        /// Size of the rejected file in bytes
        size: u64,
        /// Ceiling in bytes
        limit: u64,
    },

    /// The bytes could be read but do not form a usable workbook
    #[error("Failed to read Excel file. Please ensure it is not corrupted.")]
    CorruptFile(#[source] XlsxError),

    /// The raw bytes could not be obtained
    #[error("Failed to read file")]
    ReadFailure(#[source] std::io::Error),

    /// One worksheet could not be turned into a workbook of its own
    #[error("Failed to create a workbook for worksheet '{sheet}'")]
    SerializationFailure {
        /// Worksheet that failed
        sheet: String,
        #[source]
        source: XlsxError,
    },

    /// The output archive could not be finalized
    #[error("Failed to build the download archive")]
    Archive(#[from] zip::result::ZipError),

    /// The save target rejected the package
    #[error("Failed to save {file_name}")]
    SaveFailure {
        /// Derived download name
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

impl SplitError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            SplitError::InvalidFormat { .. } => "InvalidFormat",
            SplitError::TooLarge { .. } => "TooLarge",
            SplitError::CorruptFile(_) => "CorruptFile",
            SplitError::ReadFailure(_) => "ReadFailure",
            SplitError::SerializationFailure { .. } => "SerializationFailure",
            SplitError::Archive(_) => "Archive",
            SplitError::SaveFailure { .. } => "SaveFailure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_messages_are_user_facing() {
        let err = SplitError::TooLarge {
            size: 60 * 1024 * 1024,
            limit: 50 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File size must be less than 50 MB");
        assert_eq!(err.kind(), "TooLarge");

        let err = SplitError::CorruptFile(XlsxError::InvalidFormat("no content types".into()));
        assert!(err.source().unwrap().to_string().contains("no content types"));
    }
}
