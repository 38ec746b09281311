//! Number format definitions

use std::collections::BTreeMap;

/// Custom number-format definitions of a workbook, keyed by format id
///
/// Built-in ids (below 164) are implied by the file format and never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberFormatTable {
    custom: BTreeMap<u32, String>,
}

impl NumberFormatTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom format under `id`
    pub fn insert(&mut self, id: u32, code: impl Into<String>) {
        self.custom.insert(id, code.into());
    }

    /// Format code registered under `id`
    pub fn get(&self, id: u32) -> Option<&str> {
        self.custom.get(&id).map(String::as_str)
    }

    /// Iterate over custom formats in id order
    pub fn custom_formats(&self) -> impl Iterator<Item = (u32, &str)> {
        self.custom.iter().map(|(&id, code)| (id, code.as_str()))
    }

    /// Number of custom formats
    pub fn len(&self) -> usize {
        self.custom.len()
    }

    /// Check if there are no custom formats
    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }
}
