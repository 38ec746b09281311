//! Download packaging and delivery

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use zip::ZipWriter;

use crate::archive::SplitArchive;
use crate::config::ArchiveOptions;
use crate::error::{SplitError, SplitResult};

/// A finished archive, ready to hand to a [`SaveTarget`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPackage {
    /// Archive bytes
    pub blob: Bytes,
    /// Suggested file name
    pub file_name: String,
    /// Archive size in bytes
    pub size: u64,
}

/// Download name for a source file: its name without the final extension,
/// followed by the configured suffix and archive extension.
///
/// `Report.xlsx` becomes `Report_split_worksheets.zip`; a name without an
/// extension is used whole.
pub fn download_file_name(original_name: &str, options: &ArchiveOptions) -> String {
    let base = match original_name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && !ext.contains('/') => stem,
        _ => original_name,
    };
    format!("{}{}{}", base, options.file_suffix, options.archive_extension)
}

/// Pack every entry of `archive` into one zip.
///
/// Entries keep their order; each is deflated. A packaging failure is a
/// [`SplitError::Archive`].
pub async fn generate_download(
    archive: &SplitArchive,
    original_name: &str,
    options: &ArchiveOptions,
) -> SplitResult<DownloadPackage> {
    let file_options = options.file_options();
    let mut zip = ZipWriter::new(Cursor::new(Vec::with_capacity(archive.total_bytes())));

    for entry in archive.entries() {
        zip.start_file(entry.name.as_str(), file_options)?;
        zip.write_all(&entry.data)
            .map_err(zip::result::ZipError::from)?;
        tokio::task::yield_now().await;
    }

    let blob = Bytes::from(zip.finish()?.into_inner());
    let file_name = download_file_name(original_name, options);
    tracing::info!(
        file = %file_name,
        entries = archive.len(),
        bytes = blob.len(),
        "download archive ready"
    );

    Ok(DownloadPackage {
        size: blob.len() as u64,
        blob,
        file_name,
    })
}

/// Somewhere a finished package can be saved
#[allow(async_fn_in_trait)]
pub trait SaveTarget {
    /// Persist `package`. Failures are a [`SplitError::SaveFailure`].
    async fn save(&self, package: &DownloadPackage) -> SplitResult<()>;
}

/// Saves packages as files in a directory, creating it when missing
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    /// Target the directory `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `package` ends up
    pub fn path_for(&self, package: &DownloadPackage) -> PathBuf {
        self.dir.join(&package.file_name)
    }
}

impl SaveTarget for DirectoryTarget {
    async fn save(&self, package: &DownloadPackage) -> SplitResult<()> {
        let save_failure = |source| SplitError::SaveFailure {
            file_name: package.file_name.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(save_failure)?;
        let path = self.path_for(package);
        tokio::fs::write(&path, &package.blob)
            .await
            .map_err(save_failure)?;

        tracing::info!(path = %path.display(), bytes = package.size, "download saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    #[test]
    fn test_download_file_name() {
        let options = ArchiveOptions::default();
        assert_eq!(
            download_file_name("Report.xlsx", &options),
            "Report_split_worksheets.zip"
        );
        assert_eq!(
            download_file_name("q3.final.xlsx", &options),
            "q3.final_split_worksheets.zip"
        );
        assert_eq!(
            download_file_name("Budget", &options),
            "Budget_split_worksheets.zip"
        );
        assert_eq!(
            download_file_name("dir.v2/Budget", &options),
            "dir.v2/Budget_split_worksheets.zip"
        );
    }

    #[tokio::test]
    async fn test_generate_download_packs_entries_in_order() {
        let mut archive = SplitArchive::new();
        archive.add("B", ".xlsx", "B", b"second sheet".to_vec());
        archive.add("A", ".xlsx", "A", b"first sheet".to_vec());

        let package = generate_download(&archive, "Book.xlsx", &ArchiveOptions::default())
            .await
            .unwrap();
        assert_eq!(package.file_name, "Book_split_worksheets.zip");
        assert_eq!(package.size, package.blob.len() as u64);

        let mut zip = zip::ZipArchive::new(Cursor::new(package.blob.to_vec())).unwrap();
        let names: Vec<_> = zip.file_names().map(str::to_string).collect();
        assert_eq!(names.len(), 2);
        assert_eq!(zip.by_index(0).unwrap().name(), "B.xlsx");

        let mut content = String::new();
        zip.by_name("A.xlsx")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "first sheet");
    }

    #[tokio::test]
    async fn test_directory_target_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path().join("out"));
        let package = DownloadPackage {
            blob: Bytes::from_static(b"zip"),
            file_name: "Book_split_worksheets.zip".into(),
            size: 3,
        };

        target.save(&package).await.unwrap();
        assert_eq!(std::fs::read(target.path_for(&package)).unwrap(), b"zip");
    }

    #[tokio::test]
    async fn test_directory_target_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let target = DirectoryTarget::new(&blocker);
        let package = DownloadPackage {
            blob: Bytes::new(),
            file_name: "x.zip".into(),
            size: 0,
        };
        let err = target.save(&package).await.unwrap_err();
        assert!(matches!(err, SplitError::SaveFailure { ref file_name, .. } if file_name == "x.zip"));
    }
}
