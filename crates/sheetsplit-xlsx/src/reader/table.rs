//! Table parts (`xl/tables/tableN.xml`)

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{capture_element, capture_inner, parse_bool};
use sheetsplit_core::{AutoFilter, CellRange, Table, TableColumn, TableStyleInfo};

/// Which formula element of a table column is being read
#[derive(Clone, Copy)]
enum ColumnFormula {
    Calculated,
    Totals,
}

pub(crate) fn read_table_xml(xml: &str) -> XlsxResult<Table> {
    let mut xml_reader = Reader::from_str(xml);

    let mut table: Option<Table> = None;
    let mut current_column: Option<TableColumn> = None;
    let mut formula: Option<(ColumnFormula, String)> = None;

    loop {
        let pos = xml_reader.buffer_position();
        let event = xml_reader.read_event()?;
        let is_start = matches!(event, Event::Start(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"table" => table = Some(read_table_attrs(&e)?),
                b"sortState" => {
                    let markup = capture_element(&mut xml_reader, xml, pos, &e, is_start)?;
                    if let Some(table) = table.as_mut() {
                        table.sort_state_xml = Some(markup);
                    }
                }
                b"autoFilter" => {
                    let filter = read_auto_filter(&mut xml_reader, xml, &e, is_start)?;
                    if let Some(table) = table.as_mut() {
                        table.auto_filter = filter;
                    }
                }
                b"tableColumn" => {
                    let column = read_table_column(&e);
                    if is_start {
                        current_column = Some(column);
                    } else if let Some(table) = table.as_mut() {
                        table.columns.push(column);
                    }
                }
                b"calculatedColumnFormula" if is_start => {
                    formula = Some((ColumnFormula::Calculated, String::new()));
                }
                b"totalsRowFormula" if is_start => {
                    formula = Some((ColumnFormula::Totals, String::new()));
                }
                b"tableStyleInfo" => {
                    if let Some(table) = table.as_mut() {
                        table.style = Some(read_style_info(&e));
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if let Some((_, text)) = formula.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"calculatedColumnFormula" | b"totalsRowFormula" => {
                    if let (Some((kind, text)), Some(column)) =
                        (formula.take(), current_column.as_mut())
                    {
                        match kind {
                            ColumnFormula::Calculated => column.calculated_formula = Some(text),
                            ColumnFormula::Totals => column.totals_row_formula = Some(text),
                        }
                    }
                }
                b"tableColumn" => {
                    if let (Some(column), Some(table)) = (current_column.take(), table.as_mut()) {
                        table.columns.push(column);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    table.ok_or_else(|| XlsxError::InvalidFormat("Table part without <table> element".into()))
}

fn read_table_attrs(e: &BytesStart<'_>) -> XlsxResult<Table> {
    let mut id = None;
    let mut name = None;
    let mut display_name = None;
    let mut range = None;
    let mut header_row_count = 1;
    let mut totals_row_count = 0;
    let mut totals_row_shown = None;
    let mut dxf_ids = [None; 3];

    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"id" => id = value.parse::<u32>().ok(),
            b"name" => name = Some(value.to_string()),
            b"displayName" => display_name = Some(value.to_string()),
            b"ref" => range = Some(CellRange::parse(&value)?),
            b"headerRowCount" => header_row_count = value.parse().unwrap_or(1),
            b"totalsRowCount" => totals_row_count = value.parse().unwrap_or(0),
            b"totalsRowShown" => totals_row_shown = Some(parse_bool(&value)),
            b"headerRowDxfId" => dxf_ids[0] = value.parse().ok(),
            b"dataDxfId" => dxf_ids[1] = value.parse().ok(),
            b"totalsRowDxfId" => dxf_ids[2] = value.parse().ok(),
            _ => {}
        }
    }

    let range = range.ok_or_else(|| XlsxError::Parse("Table without ref".into()))?;
    let display_name = display_name.or_else(|| name.clone()).unwrap_or_default();
    let name = name.unwrap_or_else(|| display_name.clone());
    if name.is_empty() {
        return Err(XlsxError::Parse("Table without name".into()));
    }

    let mut table = Table::new(id.unwrap_or(0), name, range);
    table.display_name = display_name;
    table.header_row_count = header_row_count;
    table.totals_row_count = totals_row_count;
    table.totals_row_shown = totals_row_shown;
    [table.header_row_dxf_id, table.data_dxf_id, table.totals_row_dxf_id] = dxf_ids;
    Ok(table)
}

/// Read an `<autoFilter>` element: its range and verbatim criteria markup
pub(crate) fn read_auto_filter(
    reader: &mut Reader<&[u8]>,
    xml: &str,
    e: &BytesStart<'_>,
    is_start: bool,
) -> XlsxResult<Option<AutoFilter>> {
    let range = e
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"ref")
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()));

    let criteria_xml = if is_start {
        capture_inner(reader, xml, e)?
    } else {
        String::new()
    };

    match range {
        Some(range) => {
            let mut filter = AutoFilter::new(CellRange::parse(&range)?);
            filter.criteria_xml = criteria_xml;
            Ok(Some(filter))
        }
        None => {
            log::warn!("Ignoring autoFilter without ref");
            Ok(None)
        }
    }
}

fn read_table_column(e: &BytesStart<'_>) -> TableColumn {
    let mut column = TableColumn::default();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"id" => column.id = value.parse().unwrap_or(0),
            b"name" => column.name = value.to_string(),
            b"totalsRowFunction" => column.totals_row_function = Some(value.to_string()),
            b"totalsRowLabel" => column.totals_row_label = Some(value.to_string()),
            b"dataDxfId" => column.data_dxf_id = value.parse().ok(),
            _ => {}
        }
    }
    column
}

fn read_style_info(e: &BytesStart<'_>) -> TableStyleInfo {
    let mut style = TableStyleInfo::default();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"name" => style.name = Some(value.to_string()),
            b"showFirstColumn" => style.show_first_column = parse_bool(&value),
            b"showLastColumn" => style.show_last_column = parse_bool(&value),
            b"showRowStripes" => style.show_row_stripes = parse_bool(&value),
            b"showColumnStripes" => style.show_column_stripes = parse_bool(&value),
            _ => {}
        }
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_table() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<table xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" id="3" name="Sales" displayName="Sales_Q1" ref="A1:C5" totalsRowCount="1">
  <autoFilter ref="A1:C4"><filterColumn colId="0"><filters><filter val="North"/></filters></filterColumn></autoFilter>
  <tableColumns count="3">
    <tableColumn id="1" name="Region" totalsRowLabel="Total"/>
    <tableColumn id="2" name="Amount" totalsRowFunction="sum" dataDxfId="0"/>
    <tableColumn id="3" name="Tax" totalsRowFunction="custom">
      <calculatedColumnFormula>Sales_Q1[[#This Row],[Amount]]*0.2</calculatedColumnFormula>
      <totalsRowFormula>SUBTOTAL(109,[Tax])</totalsRowFormula>
    </tableColumn>
  </tableColumns>
  <tableStyleInfo name="TableStyleMedium2" showFirstColumn="0" showLastColumn="0" showRowStripes="1" showColumnStripes="0"/>
</table>"#;

        let table = read_table_xml(xml).unwrap();
        assert_eq!(table.id, 3);
        assert_eq!(table.name, "Sales");
        assert_eq!(table.display_name, "Sales_Q1");
        assert_eq!(table.range, CellRange::parse("A1:C5").unwrap());
        assert_eq!(table.header_row_count, 1);
        assert_eq!(table.totals_row_count, 1);
        assert_eq!(table.data_row_count(), 3);

        let filter = table.auto_filter.as_ref().unwrap();
        assert_eq!(filter.range, CellRange::parse("A1:C4").unwrap());
        assert!(filter.criteria_xml.contains(r#"<filter val="North"/>"#));

        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.columns[0].totals_row_label.as_deref(), Some("Total"));
        assert_eq!(table.columns[1].data_dxf_id, Some(0));
        assert_eq!(
            table.columns[2].calculated_formula.as_deref(),
            Some("Sales_Q1[[#This Row],[Amount]]*0.2")
        );
        assert_eq!(
            table.columns[2].totals_row_formula.as_deref(),
            Some("SUBTOTAL(109,[Tax])")
        );

        let style = table.style.unwrap();
        assert_eq!(style.name.as_deref(), Some("TableStyleMedium2"));
        assert!(style.show_row_stripes);
        assert!(!style.show_column_stripes);
    }

    #[test]
    fn test_read_table_formats_and_sort_state() {
        let xml = r#"<table xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" id="2" name="Ranked" ref="A1:B4" headerRowDxfId="3" dataDxfId="1" totalsRowDxfId="2">
  <autoFilter ref="A1:B4"/>
  <sortState ref="A2:B4"><sortCondition descending="1" ref="B2:B4"/></sortState>
  <tableColumns count="2"><tableColumn id="1" name="Name"/><tableColumn id="2" name="Score"/></tableColumns>
</table>"#;

        let table = read_table_xml(xml).unwrap();
        assert_eq!(table.header_row_dxf_id, Some(3));
        assert_eq!(table.data_dxf_id, Some(1));
        assert_eq!(table.totals_row_dxf_id, Some(2));
        assert_eq!(
            table.sort_state_xml.as_deref(),
            Some(r#"<sortState ref="A2:B4"><sortCondition descending="1" ref="B2:B4"/></sortState>"#)
        );
        assert!(table.auto_filter.unwrap().criteria_xml.is_empty());
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn test_table_without_ref_is_rejected() {
        let xml = r#"<table id="1" name="T"/>"#;
        assert!(read_table_xml(xml).is_err());
    }
}
