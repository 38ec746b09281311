//! Workbook analysis
//!
//! Parses the source with full retention and summarizes each worksheet for
//! the selection step.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use sheetsplit_core::{Workbook, Worksheet};
use sheetsplit_xlsx::{ReadOptions, XlsxReader};

use crate::error::{SplitError, SplitResult};

/// Outcome marker of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AnalysisStatus {
    /// The workbook was parsed and summarized
    Analyzed,
}

/// Identity record of an analyzed file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FileIdentity {
    /// Analysis time in milliseconds, unique within this process
    pub id: u64,
    /// Original file name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// ISO-8601 analysis timestamp
    pub upload_time: String,
    /// Outcome marker
    pub status: AnalysisStatus,
    /// Defined tables across all worksheets
    pub total_tables: usize,
}

/// What the selection step shows for one worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WorksheetSummary {
    /// Worksheet name
    pub name: String,
    /// Position in the workbook
    pub index: usize,
    /// Last used row, 1-based (1 for an empty sheet)
    pub row_count: u32,
    /// Last used column, 1-based (1 for an empty sheet)
    pub column_count: u32,
    /// Whether the sheet has a used range
    pub has_data: bool,
    /// Defined tables on the sheet
    pub table_count: usize,
}

impl WorksheetSummary {
    /// Summarize the worksheet at `index`
    pub fn from_worksheet(index: usize, sheet: &Worksheet) -> Self {
        let used = sheet.used_range();
        let (row_count, column_count) = match &used {
            Some(range) => (range.end.row + 1, u32::from(range.end.col) + 1),
            None => (1, 1),
        };
        Self {
            name: sheet.name().to_string(),
            index,
            row_count,
            column_count,
            has_data: used.is_some(),
            table_count: sheet.table_count(),
        }
    }
}

/// Result of analyzing one file
#[derive(Debug, Clone)]
pub struct FileAnalysisResult {
    /// Identity record
    pub file: FileIdentity,
    /// One summary per worksheet, in workbook order
    pub worksheets: Vec<WorksheetSummary>,
    /// The parsed workbook, kept for splitting
    pub workbook: Arc<Workbook>,
}

impl FileAnalysisResult {
    /// Summary of a worksheet by name
    pub fn worksheet(&self, name: &str) -> Option<&WorksheetSummary> {
        self.worksheets.iter().find(|w| w.name == name)
    }

    /// Names of all worksheets, in workbook order
    pub fn worksheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|w| w.name.as_str()).collect()
    }
}

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Wall-clock milliseconds, bumped past the previous id when the clock has
/// not moved on
fn next_file_id(now_ms: u64) -> u64 {
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let id = now_ms.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, id, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return id,
            Err(current) => last = current,
        }
    }
}

/// Parse `bytes` and summarize every worksheet.
///
/// Any parse failure is a [`SplitError::CorruptFile`]; nothing partial is
/// returned.
pub fn analyze_workbook(
    name: &str,
    bytes: &[u8],
    options: &ReadOptions,
) -> SplitResult<FileAnalysisResult> {
    let workbook = XlsxReader::read_with(Cursor::new(bytes), options).map_err(|e| {
        tracing::warn!(file = name, error = %e, "workbook could not be parsed");
        SplitError::CorruptFile(e)
    })?;

    let worksheets: Vec<WorksheetSummary> = workbook
        .worksheets()
        .enumerate()
        .map(|(index, sheet)| WorksheetSummary::from_worksheet(index, sheet))
        .collect();
    let total_tables = worksheets.iter().map(|w| w.table_count).sum();

    let now = Utc::now();
    let file = FileIdentity {
        id: next_file_id(u64::try_from(now.timestamp_millis()).unwrap_or(0)),
        name: name.to_string(),
        size: bytes.len() as u64,
        upload_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        status: AnalysisStatus::Analyzed,
        total_tables,
    };

    tracing::info!(
        file = name,
        sheets = worksheets.len(),
        tables = total_tables,
        "analyzed workbook"
    );

    Ok(FileAnalysisResult {
        file,
        worksheets,
        workbook: Arc::new(workbook),
    })
}
