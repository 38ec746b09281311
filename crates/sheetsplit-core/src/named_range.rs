//! Named range definitions
//!
//! Named ranges (defined names) assign a name to a cell reference, a constant
//! or a formula expression. They are stored in definition order so that a
//! workbook written back out lists them the way the source did.

use crate::error::{Error, Result};

/// Scope of a named range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScope {
    /// Available throughout the workbook (global)
    Workbook,
    /// Scoped to a specific sheet (local), by sheet position
    Sheet(usize),
}

/// A named range definition
///
/// `refers_to` is stored as it appears in the container, without a leading
/// `=`. Examples:
/// - `Sheet1!$A$1` - single cell
/// - `Sheet1!$A$1:$D$10` - range
/// - `0.0725` - constant
/// - `SUM(Sheet1!$A:$A)` - formula expression
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    /// The name (case-insensitive)
    pub name: String,
    /// Scope of this name (workbook-wide or sheet-specific)
    pub scope: NameScope,
    /// What the name refers to
    pub refers_to: String,
    /// Optional comment/description
    pub comment: Option<String>,
    /// Whether this name is hidden from the UI
    pub hidden: bool,
}

impl NamedRange {
    /// Create a new named range
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>, scope: NameScope) -> Self {
        let refers_to = refers_to.into();
        let refers_to = match refers_to.strip_prefix('=') {
            Some(expr) => expr.to_string(),
            None => refers_to,
        };
        Self {
            name: name.into(),
            scope,
            refers_to,
            comment: None,
            hidden: false,
        }
    }

    /// Create a workbook-scoped named range
    pub fn workbook_scope(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        Self::new(name, refers_to, NameScope::Workbook)
    }

    /// Create a sheet-scoped named range
    pub fn sheet_scope(
        name: impl Into<String>,
        refers_to: impl Into<String>,
        sheet_index: usize,
    ) -> Self {
        Self::new(name, refers_to, NameScope::Sheet(sheet_index))
    }

    /// Set a comment for this named range
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Mark this named range as hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Check whether this is a built-in name (`_xlnm.Print_Area`, ...)
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("_xlnm.")
    }

    fn same_key(&self, name: &str, scope: NameScope) -> bool {
        self.scope == scope && self.name.eq_ignore_ascii_case(name)
    }
}

/// Ordered collection of named ranges
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NamedRangeCollection {
    ranges: Vec<NamedRange>,
}

impl NamedRangeCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new named range
    ///
    /// Returns an error if a name with the same scope already exists
    pub fn define(&mut self, range: NamedRange) -> Result<()> {
        if range.name.trim().is_empty() {
            return Err(Error::InvalidName("empty name".into()));
        }
        if self.contains(&range.name, range.scope) {
            return Err(Error::InvalidName(format!(
                "'{}' already exists in this scope",
                range.name
            )));
        }
        self.ranges.push(range);
        Ok(())
    }

    /// Define or update a named range
    pub fn define_or_update(&mut self, range: NamedRange) {
        match self
            .ranges
            .iter_mut()
            .find(|r| r.same_key(&range.name, range.scope))
        {
            Some(existing) => *existing = range,
            None => self.ranges.push(range),
        }
    }

    /// Get a named range by name and current sheet context
    ///
    /// A name scoped to `current_sheet` wins over a workbook-scoped one.
    pub fn get(&self, name: &str, current_sheet: usize) -> Option<&NamedRange> {
        self.get_exact(name, NameScope::Sheet(current_sheet))
            .or_else(|| self.get_exact(name, NameScope::Workbook))
    }

    /// Get a named range by exact scope
    pub fn get_exact(&self, name: &str, scope: NameScope) -> Option<&NamedRange> {
        self.ranges.iter().find(|r| r.same_key(name, scope))
    }

    /// Remove a named range
    pub fn remove(&mut self, name: &str, scope: NameScope) -> Option<NamedRange> {
        let pos = self.ranges.iter().position(|r| r.same_key(name, scope))?;
        Some(self.ranges.remove(pos))
    }

    /// Check if a name exists in the given scope
    pub fn contains(&self, name: &str, scope: NameScope) -> bool {
        self.get_exact(name, scope).is_some()
    }

    /// Iterate over all named ranges in definition order
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.iter()
    }

    /// Get the number of named ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Get all workbook-scoped names
    pub fn workbook_names(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges
            .iter()
            .filter(|r| matches!(r.scope, NameScope::Workbook))
    }

    /// Get all names scoped to a specific sheet
    pub fn sheet_names(&self, sheet_index: usize) -> impl Iterator<Item = &NamedRange> {
        self.ranges
            .iter()
            .filter(move |r| matches!(r.scope, NameScope::Sheet(idx) if idx == sheet_index))
    }

    /// Deep copy of the names that remain meaningful once sheet
    /// `sheet_index` is the only sheet of a workbook.
    ///
    /// Workbook-scoped names are kept, names local to `sheet_index` are
    /// re-scoped to sheet 0 and names local to any other sheet are dropped.
    pub fn for_single_sheet(&self, sheet_index: usize) -> Self {
        let ranges = self
            .ranges
            .iter()
            .filter_map(|r| match r.scope {
                NameScope::Workbook => Some(r.clone()),
                NameScope::Sheet(idx) if idx == sheet_index => Some(NamedRange {
                    scope: NameScope::Sheet(0),
                    ..r.clone()
                }),
                NameScope::Sheet(_) => None,
            })
            .collect();
        Self { ranges }
    }
}
