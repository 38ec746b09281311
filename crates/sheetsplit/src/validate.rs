//! Upload validation

use crate::config::ValidationPolicy;
use crate::error::{SplitError, SplitResult};
use crate::source::FileDescriptor;

/// Check a file against `policy` without looking at its content.
///
/// The file passes when its declared type or its extension is allow-listed
/// and its size does not exceed the ceiling.
pub fn validate_file(file: &FileDescriptor<'_>, policy: &ValidationPolicy) -> SplitResult<()> {
    if !policy.accepts_mime_type(file.mime_type) && !policy.accepts_extension(file.name) {
        tracing::debug!(
            file = file.name,
            mime_type = file.mime_type,
            "rejecting file of unsupported type"
        );
        return Err(SplitError::InvalidFormat {
            name: file.name.to_string(),
        });
    }

    if file.size > policy.max_file_size {
        tracing::debug!(file = file.name, size = file.size, "rejecting oversized file");
        return Err(SplitError::TooLarge {
            size: file.size,
            limit: policy.max_file_size,
        });
    }

    Ok(())
}
