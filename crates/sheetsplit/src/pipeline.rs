//! Validate, analyze, split, package and deliver

use crate::analyze::{analyze_workbook, FileAnalysisResult};
use crate::archive::{process_worksheets, SplitArchive};
use crate::config::PipelineConfig;
use crate::delivery::{generate_download, DownloadPackage, SaveTarget};
use crate::error::SplitResult;
use crate::source::SourceFile;
use crate::validate::validate_file;

/// Runs the splitting stages with one configuration.
///
/// Stages can be driven one at a time (a host shows the analysis, lets the
/// user pick sheets, then processes) or end to end with [`run`](Self::run).
#[derive(Debug, Clone, Default)]
pub struct SplitPipeline {
    config: PipelineConfig,
}

impl SplitPipeline {
    /// Create a pipeline
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Check a file's type and size
    pub fn validate(&self, source: &SourceFile) -> SplitResult<()> {
        validate_file(&source.descriptor(), &self.config.validation)
    }

    /// Read and summarize a file. Validation is not repeated here.
    pub async fn analyze(&self, source: &SourceFile) -> SplitResult<FileAnalysisResult> {
        let bytes = source.read_bytes().await?;
        let analysis = analyze_workbook(source.name(), &bytes, &self.config.read)?;
        tokio::task::yield_now().await;
        Ok(analysis)
    }

    /// Split the selected worksheets of an analyzed file
    pub async fn process<S: AsRef<str>>(
        &self,
        analysis: &FileAnalysisResult,
        selected: &[S],
        on_progress: Option<&mut (dyn FnMut(u8) + Send)>,
    ) -> SplitResult<SplitArchive> {
        process_worksheets(
            &analysis.workbook,
            selected,
            &self.config.write,
            &self.config.archive,
            on_progress,
        )
        .await
    }

    /// Pack a split archive into the download for `analysis`
    pub async fn package(
        &self,
        analysis: &FileAnalysisResult,
        archive: &SplitArchive,
    ) -> SplitResult<DownloadPackage> {
        generate_download(archive, &analysis.file.name, &self.config.archive).await
    }

    /// Hand a package to a save target
    pub async fn deliver<T: SaveTarget>(
        &self,
        package: &DownloadPackage,
        target: &T,
    ) -> SplitResult<()> {
        target.save(package).await
    }

    /// Every stage in order. `None` selects all worksheets.
    pub async fn run<T: SaveTarget>(
        &self,
        source: &SourceFile,
        selected: Option<&[String]>,
        target: &T,
        on_progress: Option<&mut (dyn FnMut(u8) + Send)>,
    ) -> SplitResult<DownloadPackage> {
        self.validate(source)?;
        let analysis = self.analyze(source).await?;

        let archive = match selected {
            Some(names) => self.process(&analysis, names, on_progress).await?,
            None => {
                let names = analysis.worksheet_names();
                self.process(&analysis, &names, on_progress).await?
            }
        };

        let package = self.package(&analysis, &archive).await?;
        self.deliver(&package, target).await?;
        Ok(package)
    }
}
