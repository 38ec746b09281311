//! Cell storage implementation
//!
//! Sparse, row-major storage: only cells that carry a value or a non-default
//! style are kept, in a `BTreeMap<row, BTreeMap<col, CellData>>` so that
//! iteration order matches the order cells must be written in.

use std::collections::BTreeMap;

use super::{CellRange, CellValue};

/// Complete data for a single cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// Index into the workbook's cellXfs table (0 = default style)
    pub style_index: u32,
}

impl CellData {
    /// Create a new cell with a value and default style
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style_index: 0,
        }
    }

    /// Create a new cell with a value and style
    pub fn with_style(value: CellValue, style_index: u32) -> Self {
        Self { value, style_index }
    }

    /// Check if this cell is effectively empty (no value and default style)
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style_index == 0
    }
}

/// Sparse row-based storage for worksheet cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell
    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a mutable cell
    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Insert a cell, replacing any previous content. Effectively empty cells
    /// are removed instead of stored.
    pub fn insert(&mut self, row: u32, col: u16, cell: CellData) {
        if cell.is_empty() {
            self.remove(row, col);
            return;
        }
        self.rows.entry(row).or_default().insert(col, cell);
    }

    /// Set a cell value, keeping its style
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        let style_index = self.get(row, col).map_or(0, |c| c.style_index);
        self.insert(row, col, CellData::with_style(value, style_index));
    }

    /// Set a cell style index, keeping its value
    pub fn set_style(&mut self, row: u32, col: u16, style_index: u32) {
        let value = self
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default();
        self.insert(row, col, CellData::with_style(value, style_index));
    }

    /// Remove a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        let row_map = self.rows.get_mut(&row)?;
        let removed = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Check if no cells are stored
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, cell)| (row, col, cell)))
    }

    /// Iterate over the cells of one row in column order
    pub fn row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, cell)| (col, cell)))
    }

    /// Indices of rows that hold at least one cell
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    /// Bounding box of all stored cells
    pub fn used_bounds(&self) -> Option<CellRange> {
        let min_row = *self.rows.keys().next()?;
        let max_row = *self.rows.keys().next_back()?;
        let mut min_col = u16::MAX;
        let mut max_col = 0;
        for cols in self.rows.values() {
            if let (Some(&first), Some(&last)) = (cols.keys().next(), cols.keys().next_back()) {
                min_col = min_col.min(first);
                max_col = max_col.max(last);
            }
        }
        Some(CellRange::from_indices(min_row, min_col, max_row, max_col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_bounds() {
        let mut storage = CellStorage::new();
        assert!(storage.used_bounds().is_none());

        storage.set_value(4, 2, CellValue::Number(1.0));
        storage.set_value(1, 5, CellValue::string("x"));
        storage.set_style(9, 0, 3);

        let bounds = storage.used_bounds().unwrap();
        assert_eq!(bounds.to_string(), "A2:F10");
        assert_eq!(storage.cell_count(), 3);
    }

    #[test]
    fn test_empty_cells_are_not_stored() {
        let mut storage = CellStorage::new();
        storage.set_value(0, 0, CellValue::Number(1.0));
        storage.set_value(0, 0, CellValue::Empty);
        assert!(storage.is_empty());

        storage.set_style(2, 2, 4);
        storage.set_value(2, 2, CellValue::Boolean(true));
        assert_eq!(storage.get(2, 2).unwrap().style_index, 4);
    }

    #[test]
    fn test_iteration_is_row_major() {
        let mut storage = CellStorage::new();
        storage.set_value(1, 0, CellValue::Number(3.0));
        storage.set_value(0, 1, CellValue::Number(2.0));
        storage.set_value(0, 0, CellValue::Number(1.0));

        let order: Vec<_> = storage.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0)]);
    }
}
