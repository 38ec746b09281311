//! sheetsplit CLI - split a workbook into one workbook per worksheet

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sheetsplit::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetsplit")]
#[command(
    author,
    version,
    about = "Split an Excel workbook into one workbook per worksheet"
)]
struct Cli {
    /// Log pipeline stages (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the worksheets of a workbook with their sizes and tables
    #[command(alias = "info")]
    Analyze {
        /// Input workbook
        input: PathBuf,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// List worksheet names, one per line
    Sheets {
        /// Input workbook
        input: PathBuf,
    },

    /// Split worksheets into a zip of single-sheet workbooks
    Split {
        /// Input workbook
        input: PathBuf,

        /// Worksheet to include (repeatable; default: all)
        #[arg(short, long = "sheet")]
        sheets: Vec<String>,

        /// Include every worksheet
        #[arg(long, conflicts_with = "sheets")]
        all: bool,

        /// Directory the zip is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Size ceiling in MiB
        #[arg(long, default_value_t = 50)]
        max_size_mb: u64,

        /// Deflate level for archive entries (0-9)
        #[arg(long)]
        level: Option<u8>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async {
        match cli.command {
            Commands::Analyze { input, json } => analyze(&input, json).await,
            Commands::Sheets { input } => list_sheets(&input).await,
            Commands::Split {
                input,
                sheets,
                all,
                output_dir,
                max_size_mb,
                level,
            } => split(&input, sheets, all, &output_dir, max_size_mb, level).await,
        }
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn load(pipeline: &SplitPipeline, input: &Path) -> Result<FileAnalysisResult> {
    let source = SourceFile::from_path(input)
        .await
        .with_context(|| format!("Failed to open '{}'", input.display()))?;
    pipeline.validate(&source)?;
    Ok(pipeline.analyze(&source).await?)
}

async fn analyze(input: &Path, json: bool) -> Result<()> {
    let pipeline = SplitPipeline::default();
    let analysis = load(&pipeline, input).await?;

    if json {
        let value = serde_json::json!({
            "file": analysis.file,
            "worksheets": analysis.worksheets,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File: {}", analysis.file.name);
    println!("Size: {} bytes", analysis.file.size);
    println!("Sheets: {}", analysis.worksheets.len());
    println!("Tables: {}", analysis.file.total_tables);

    for sheet in &analysis.worksheets {
        println!();
        println!("  Sheet {}: \"{}\"", sheet.index, sheet.name);
        if sheet.has_data {
            println!(
                "    Used range: {} rows x {} columns",
                sheet.row_count, sheet.column_count
            );
        } else {
            println!("    Used range: empty");
        }
        println!("    Tables: {}", sheet.table_count);
    }

    Ok(())
}

async fn list_sheets(input: &Path) -> Result<()> {
    let pipeline = SplitPipeline::default();
    let analysis = load(&pipeline, input).await?;

    for sheet in &analysis.worksheets {
        println!("{}\t{}", sheet.index, sheet.name);
    }

    Ok(())
}

async fn split(
    input: &Path,
    sheets: Vec<String>,
    all: bool,
    output_dir: &Path,
    max_size_mb: u64,
    level: Option<u8>,
) -> Result<()> {
    let mut archive_options = ArchiveOptions::default();
    if let Some(level) = level {
        archive_options = archive_options.with_compression_level(level);
    }
    let validation =
        ValidationPolicy::default().with_max_file_size(max_size_mb.saturating_mul(1024 * 1024));
    let config = PipelineConfig::default()
        .with_validation(validation)
        .with_archive_options(archive_options);
    let pipeline = SplitPipeline::new(config);

    let analysis = load(&pipeline, input).await?;
    let selected: Vec<String> = if all || sheets.is_empty() {
        analysis
            .worksheet_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        for name in &sheets {
            if analysis.worksheet(name).is_none() {
                bail!(
                    "No worksheet named '{}' (available: {})",
                    name,
                    analysis.worksheet_names().join(", ")
                );
            }
        }
        sheets
    };

    let mut report = |percent: u8| {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "\rProcessing worksheets... {:>3}%", percent);
        let _ = stderr.flush();
    };
    let archive = pipeline
        .process(&analysis, &selected, Some(&mut report))
        .await?;
    eprintln!();

    let package = pipeline.package(&analysis, &archive).await?;
    let target = DirectoryTarget::new(output_dir);
    pipeline.deliver(&package, &target).await?;

    for entry in archive.entries() {
        println!("  {} ({} bytes)", entry.name, entry.data.len());
    }
    println!(
        "Wrote {} ({} bytes)",
        target.path_for(&package).display(),
        package.size
    );

    Ok(())
}
