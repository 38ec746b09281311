//! Split archive construction
//!
//! Turns the selected worksheets into one serialized workbook each, named
//! after the sheet with characters that are illegal in file names replaced.

use ahash::AHashSet;
use sheetsplit_core::Workbook;
use sheetsplit_xlsx::{WriteOptions, XlsxError, XlsxWriter};

use crate::config::ArchiveOptions;
use crate::error::{SplitError, SplitResult};
use crate::split::WorkbookSplitExt;

/// Characters replaced by `_` in entry names
const ILLEGAL_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace file-name-illegal characters of a sheet name with `_`
pub fn sanitize_entry_stem(sheet_name: &str) -> String {
    sheet_name
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// One serialized single-sheet workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name inside the archive
    pub name: String,
    /// Worksheet the entry was built from
    pub sheet: String,
    /// XLSX bytes
    pub data: Vec<u8>,
}

/// The serialized workbooks of one run, in selection order
#[derive(Debug, Clone, Default)]
pub struct SplitArchive {
    entries: Vec<ArchiveEntry>,
    taken: AHashSet<String>,
}

impl SplitArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry named `<stem><extension>`.
    ///
    /// Entry names are unique ignoring case; a clash gets ` (2)`, ` (3)`, ...
    /// appended to the stem. Returns the name actually used.
    pub fn add(&mut self, stem: &str, extension: &str, sheet: &str, data: Vec<u8>) -> &str {
        let mut name = format!("{}{}", stem, extension);
        let mut n = 2;
        while self.taken.contains(&name.to_lowercase()) {
            name = format!("{} ({}){}", stem, n, extension);
            n += 1;
        }
        if n > 2 {
            tracing::warn!(sheet, entry = %name, "entry name collided after sanitizing");
        }

        self.taken.insert(name.to_lowercase());
        self.entries.push(ArchiveEntry {
            name,
            sheet: sheet.to_string(),
            data,
        });
        &self.entries[self.entries.len() - 1].name
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Entry by name
    pub fn entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of the serialized workbooks
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.data.len()).sum()
    }
}

/// Percentage of `total` that `done` represents, rounded half up
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (200 * done + total) / (2 * total);
    pct.min(100) as u8
}

/// Split each selected worksheet into its own workbook and serialize it.
///
/// Sheets are processed in selection order. After each one `on_progress`
/// receives the completed percentage, so the last report is always 100.
/// The first failure aborts the run and nothing partial is returned.
pub async fn process_worksheets<S: AsRef<str>>(
    workbook: &Workbook,
    selected: &[S],
    write: &WriteOptions,
    options: &ArchiveOptions,
    mut on_progress: Option<&mut (dyn FnMut(u8) + Send)>,
) -> SplitResult<SplitArchive> {
    let total = selected.len();
    let mut archive = SplitArchive::new();

    for (i, sheet_name) in selected.iter().enumerate() {
        let sheet_name = sheet_name.as_ref();
        let data = serialize_sheet(workbook, sheet_name, write).map_err(|source| {
            tracing::error!(sheet = sheet_name, error = %source, "worksheet could not be split");
            SplitError::SerializationFailure {
                sheet: sheet_name.to_string(),
                source,
            }
        })?;

        let size = data.len();
        let entry = archive.add(
            &sanitize_entry_stem(sheet_name),
            &options.entry_extension,
            sheet_name,
            data,
        );
        tracing::debug!(sheet = sheet_name, entry, bytes = size, "worksheet split");

        if let Some(report) = on_progress.as_mut() {
            report(progress_percent(i + 1, total));
        }
        tokio::task::yield_now().await;
    }

    tracing::info!(
        sheets = total,
        bytes = archive.total_bytes(),
        "worksheets processed"
    );
    Ok(archive)
}

fn serialize_sheet(
    workbook: &Workbook,
    sheet_name: &str,
    write: &WriteOptions,
) -> Result<Vec<u8>, XlsxError> {
    let single = workbook.split_sheet(sheet_name)?;
    XlsxWriter::write_to_vec(&single, write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_entry_stem() {
        assert_eq!(sanitize_entry_stem("Q1/Q2"), "Q1_Q2");
        assert_eq!(sanitize_entry_stem(r#"a\b:c*d?e"f<g>h|i"#), "a_b_c_d_e_f_g_h_i");
        assert_eq!(sanitize_entry_stem("Plain name"), "Plain name");
    }

    #[test]
    fn test_colliding_names_are_disambiguated() {
        let mut archive = SplitArchive::new();
        assert_eq!(archive.add("Q1_Q2", ".xlsx", "Q1/Q2", vec![1]), "Q1_Q2.xlsx");
        assert_eq!(archive.add("Q1_Q2", ".xlsx", "Q1:Q2", vec![2]), "Q1_Q2 (2).xlsx");
        assert_eq!(archive.add("q1_q2", ".xlsx", "q1?q2", vec![3]), "q1_q2 (3).xlsx");
        assert_eq!(archive.len(), 3);
        assert_eq!(archive.entry("Q1_Q2 (2).xlsx").unwrap().sheet, "Q1:Q2");
        assert_eq!(archive.total_bytes(), 3);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[tokio::test]
    async fn test_unknown_sheet_aborts() {
        let mut workbook = Workbook::empty();
        workbook.add_worksheet_with_name("Only").unwrap();

        let mut reports = Vec::new();
        let mut record = |p: u8| reports.push(p);
        let err = process_worksheets(
            &workbook,
            &["Only", "Missing"],
            &WriteOptions::default(),
            &ArchiveOptions::default(),
            Some(&mut record),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SplitError::SerializationFailure { ref sheet, .. } if sheet == "Missing"));
        assert_eq!(reports, vec![50]);
    }
}
