//! Table part serialization

use crate::xml::escape_xml;
use sheetsplit_core::{AutoFilter, Table};

/// `<autoFilter>` with its preserved criteria
pub(crate) fn auto_filter_xml(filter: &AutoFilter) -> String {
    if filter.criteria_xml.is_empty() {
        format!("<autoFilter ref=\"{}\"/>", filter.range)
    } else {
        format!(
            "<autoFilter ref=\"{}\">{}</autoFilter>",
            filter.range, filter.criteria_xml
        )
    }
}

/// Serialize a table part.
///
/// `id` is the workbook-unique table id to write; `keep_dxf` controls whether
/// differential-format references are written.
pub(crate) fn table_xml(table: &Table, id: u32, keep_dxf: impl Fn(u32) -> bool) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<table xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" id="{}" name="{}" displayName="{}" ref="{}""#,
        id,
        escape_xml(&table.name),
        escape_xml(&table.display_name),
        table.range
    );
    if table.header_row_count != 1 {
        content.push_str(&format!(" headerRowCount=\"{}\"", table.header_row_count));
    }
    if table.totals_row_count > 0 {
        content.push_str(&format!(" totalsRowCount=\"{}\"", table.totals_row_count));
    }
    if let Some(shown) = table.totals_row_shown {
        content.push_str(&format!(" totalsRowShown=\"{}\"", if shown { 1 } else { 0 }));
    }
    for (attr, dxf) in [
        ("headerRowDxfId", table.header_row_dxf_id),
        ("dataDxfId", table.data_dxf_id),
        ("totalsRowDxfId", table.totals_row_dxf_id),
    ] {
        if let Some(dxf) = dxf.filter(|d| keep_dxf(*d)) {
            content.push_str(&format!(" {}=\"{}\"", attr, dxf));
        }
    }
    content.push('>');

    if let Some(filter) = &table.auto_filter {
        content.push_str("\n    ");
        content.push_str(&auto_filter_xml(filter));
    }
    if let Some(sort_state) = &table.sort_state_xml {
        content.push_str("\n    ");
        content.push_str(sort_state);
    }

    content.push_str(&format!(
        "\n    <tableColumns count=\"{}\">",
        table.columns.len()
    ));
    for column in &table.columns {
        content.push_str(&format!(
            "\n        <tableColumn id=\"{}\" name=\"{}\"",
            column.id,
            escape_xml(&column.name)
        ));
        if let Some(function) = &column.totals_row_function {
            content.push_str(&format!(" totalsRowFunction=\"{}\"", escape_xml(function)));
        }
        if let Some(label) = &column.totals_row_label {
            content.push_str(&format!(" totalsRowLabel=\"{}\"", escape_xml(label)));
        }
        if let Some(dxf) = column.data_dxf_id.filter(|d| keep_dxf(*d)) {
            content.push_str(&format!(" dataDxfId=\"{}\"", dxf));
        }

        if column.calculated_formula.is_none() && column.totals_row_formula.is_none() {
            content.push_str("/>");
            continue;
        }
        content.push('>');
        if let Some(formula) = &column.calculated_formula {
            content.push_str(&format!(
                "<calculatedColumnFormula>{}</calculatedColumnFormula>",
                escape_xml(formula)
            ));
        }
        if let Some(formula) = &column.totals_row_formula {
            content.push_str(&format!(
                "<totalsRowFormula>{}</totalsRowFormula>",
                escape_xml(formula)
            ));
        }
        content.push_str("</tableColumn>");
    }
    content.push_str("\n    </tableColumns>");

    if let Some(style) = &table.style {
        content.push_str("\n    <tableStyleInfo");
        if let Some(name) = &style.name {
            content.push_str(&format!(" name=\"{}\"", escape_xml(name)));
        }
        content.push_str(&format!(
            " showFirstColumn=\"{}\" showLastColumn=\"{}\" showRowStripes=\"{}\" showColumnStripes=\"{}\"/>",
            style.show_first_column as u8,
            style.show_last_column as u8,
            style.show_row_stripes as u8,
            style.show_column_stripes as u8
        ));
    }

    content.push_str("\n</table>");
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsplit_core::{CellRange, TableColumn, TableStyleInfo};

    #[test]
    fn test_table_xml() {
        let mut total = TableColumn::new(2, "Amount");
        total.totals_row_function = Some("sum".into());
        total.data_dxf_id = Some(4);

        let mut table = Table::new(7, "Sales", CellRange::parse("A1:B4").unwrap())
            .with_column(TableColumn::new(1, "Region & Zone"))
            .with_column(total);
        table.totals_row_count = 1;
        table.auto_filter = Some(AutoFilter::new(CellRange::parse("A1:B3").unwrap()));
        table.style = Some(TableStyleInfo {
            name: Some("TableStyleLight9".into()),
            show_row_stripes: true,
            ..Default::default()
        });

        let xml = table_xml(&table, 2, |_| false);
        assert!(xml.contains(r#"id="2" name="Sales" displayName="Sales" ref="A1:B4" totalsRowCount="1">"#));
        assert!(xml.contains(r#"<autoFilter ref="A1:B3"/>"#));
        assert!(xml.contains(r#"<tableColumn id="1" name="Region &amp; Zone"/>"#));
        assert!(xml.contains(r#"<tableColumn id="2" name="Amount" totalsRowFunction="sum"/>"#));
        assert!(xml.contains(r#"showRowStripes="1" showColumnStripes="0"/>"#));

        let xml = table_xml(&table, 2, |_| true);
        assert!(xml.contains(r#"dataDxfId="4""#));
    }

    #[test]
    fn test_table_formats_and_sort_state() {
        let mut table = Table::new(1, "Ranked", CellRange::parse("A1:B4").unwrap())
            .with_column(TableColumn::new(1, "Name"))
            .with_column(TableColumn::new(2, "Score"));
        table.header_row_dxf_id = Some(0);
        table.data_dxf_id = Some(5);
        table.auto_filter = Some(AutoFilter::new(CellRange::parse("A1:B4").unwrap()));
        table.sort_state_xml =
            Some(r#"<sortState ref="A2:B4"><sortCondition ref="B2:B4"/></sortState>"#.into());

        let xml = table_xml(&table, 1, |d| d < 2);
        assert!(xml.contains(r#"ref="A1:B4" headerRowDxfId="0">"#));
        assert!(!xml.contains("dataDxfId"));

        let filter = xml.find("<autoFilter").unwrap();
        let sort = xml.find("<sortState").unwrap();
        let columns = xml.find("<tableColumns").unwrap();
        assert!(filter < sort && sort < columns);
    }
}
