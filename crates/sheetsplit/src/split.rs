//! Single-sheet workbook construction
//!
//! A split copies one worksheet and the workbook-level metadata it depends
//! on into a fresh workbook. Worksheet content, names, views and properties
//! are deep copies; the style sheet, theme and number-format table are
//! shared `Arc`s, since the copied cell style indices point into them.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetsplit::split::WorkbookSplitExt;
//!
//! let q1 = workbook.split_sheet("Q1")?;
//! assert_eq!(q1.sheet_count(), 1);
//! ```

use std::sync::Arc;

use sheetsplit_core::{Error, Result, SheetState, Workbook, WorkbookView};

/// Extension trait for Workbook to add per-sheet splitting
pub trait WorkbookSplitExt {
    /// Build a workbook holding only the sheet called `name`.
    ///
    /// The source is never modified and the result shares no mutable state
    /// with it.
    fn split_sheet(&self, name: &str) -> Result<Workbook>;
}

impl WorkbookSplitExt for Workbook {
    fn split_sheet(&self, name: &str) -> Result<Workbook> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))?;
        let source_sheet = self
            .worksheet(index)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))?;

        let mut sheet = source_sheet.clone();
        // The only sheet of a workbook has to be visible
        if !sheet.is_visible() {
            sheet.set_state(SheetState::Visible);
        }

        let mut target = Workbook::empty();
        target.add_existing_worksheet(sheet)?;
        copy_workbook_metadata(self, &mut target, index);
        Ok(target)
    }
}

/// Copy the metadata groups present on `source`; absent groups stay unset.
fn copy_workbook_metadata(source: &Workbook, target: &mut Workbook, sheet_index: usize) {
    *target.settings_mut() = source.settings().clone();

    if let Some(properties) = source.properties() {
        target.set_properties(Some(properties.clone()));
    }
    if let Some(custom) = source.custom_properties() {
        target.set_custom_properties(Some(custom.clone()));
    }

    // Immutable shared resources
    if let Some(theme) = source.theme() {
        target.set_theme(Some(Arc::clone(theme)));
    }
    if let Some(styles) = source.styles() {
        target.set_styles(Some(Arc::clone(styles)));
    }
    if let Some(formats) = source.number_formats() {
        target.set_number_formats(Some(Arc::clone(formats)));
    }

    target.set_named_ranges(source.named_ranges().for_single_sheet(sheet_index));
    target.set_views(
        source
            .views()
            .iter()
            .map(WorkbookView::for_single_sheet)
            .collect(),
    );
    target.set_calculation(source.calculation().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetsplit_core::{
        CalculationSettings, CellRange, DocumentProperties, NameScope, NamedRange,
        NumberFormatTable, StyleSheet, Table, TableColumn, Theme,
    };

    fn source() -> Workbook {
        let mut wb = Workbook::empty();
        for name in ["Summary", "Q1", "Q2"] {
            let idx = wb.add_worksheet_with_name(name).unwrap();
            let sheet = wb.worksheet_mut(idx).unwrap();
            sheet.set_cell_value("A1", name).unwrap();
            sheet
                .add_table(
                    Table::new(idx as u32 + 1, format!("{}Table", name), CellRange::parse("A1:B3").unwrap())
                        .with_column(TableColumn::new(1, "Item"))
                        .with_column(TableColumn::new(2, "Value")),
                )
                .unwrap();
        }
        wb.worksheet_mut(2).unwrap().set_state(SheetState::Hidden);
        wb.worksheet_mut(1)
            .unwrap()
            .merge_cells(&CellRange::parse("C1:D1").unwrap())
            .unwrap();

        wb.define_name(NamedRange::workbook_scope("Rate", "Summary!$B$1"))
            .unwrap();
        wb.define_name(NamedRange::sheet_scope("Local", "Q1!$A$1", 1))
            .unwrap();
        wb.define_name(NamedRange::sheet_scope("Other", "Q2!$A$1", 2))
            .unwrap();
        wb.set_views(vec![WorkbookView {
            active_tab: 2,
            first_sheet: 1,
            ..Default::default()
        }]);
        wb.set_calculation(Some(CalculationSettings {
            calc_id: Some(191029),
            ..Default::default()
        }));
        wb.set_properties(Some(DocumentProperties {
            title: Some("Report".into()),
            ..Default::default()
        }));
        wb.set_styles(Some(Arc::new(StyleSheet::new("<styleSheet/>", 1, 0))));
        wb.set_theme(Some(Arc::new(Theme::new(None, "<a:theme/>"))));
        wb.set_number_formats(Some(Arc::new(NumberFormatTable::new())));
        wb
    }

    #[test]
    fn test_split_copies_sheet_and_metadata() {
        let wb = source();
        let q1 = wb.split_sheet("Q1").unwrap();

        assert_eq!(q1.sheet_names(), vec!["Q1"]);
        let sheet = q1.worksheet(0).unwrap();
        assert_eq!(sheet, wb.worksheet(1).unwrap());
        assert_eq!(sheet.tables()[0].name, "Q1Table");

        let names: Vec<_> = q1.named_ranges().iter().map(|n| (n.name.as_str(), n.scope)).collect();
        assert_eq!(
            names,
            vec![("Rate", NameScope::Workbook), ("Local", NameScope::Sheet(0))]
        );
        assert_eq!(q1.views()[0].active_tab, 0);
        assert_eq!(q1.views()[0].first_sheet, 0);
        assert_eq!(q1.calculation().unwrap().calc_id, Some(191029));
        assert_eq!(q1.properties().unwrap().title.as_deref(), Some("Report"));
        assert!(Arc::ptr_eq(q1.styles().unwrap(), wb.styles().unwrap()));
        assert!(Arc::ptr_eq(q1.theme().unwrap(), wb.theme().unwrap()));
        assert!(Arc::ptr_eq(
            q1.number_formats().unwrap(),
            wb.number_formats().unwrap()
        ));
    }

    #[test]
    fn test_split_is_independent_of_source() {
        let wb = source();
        let mut q1 = wb.split_sheet("Q1").unwrap();
        q1.worksheet_mut(0)
            .unwrap()
            .set_cell_value("A1", "changed")
            .unwrap();

        assert_eq!(
            wb.worksheet(1).unwrap().get_value("A1").unwrap().as_string(),
            Some("Q1")
        );
        assert_eq!(wb.named_ranges().len(), 3);
    }

    #[test]
    fn test_hidden_sheet_becomes_visible() {
        let wb = source();
        let q2 = wb.split_sheet("Q2").unwrap();
        assert!(q2.worksheet(0).unwrap().is_visible());
        assert_eq!(wb.worksheet(2).unwrap().state(), SheetState::Hidden);
    }

    #[test]
    fn test_absent_groups_stay_unset() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("Only").unwrap();
        let split = wb.split_sheet("Only").unwrap();
        assert!(split.properties().is_none());
        assert!(split.custom_properties().is_none());
        assert!(split.theme().is_none());
        assert!(split.styles().is_none());
        assert!(split.calculation().is_none());
        assert!(split.views().is_empty());
    }

    #[test]
    fn test_unknown_sheet() {
        let wb = source();
        assert!(matches!(
            wb.split_sheet("Q3"),
            Err(Error::SheetNotFound(name)) if name == "Q3"
        ));
    }
}
