//! End-to-end tests for XLSX roundtrip (create -> save -> read -> verify)

use std::io::{Cursor, Write};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sheetsplit_core::{
    AutoFilter, CellComment, CellError, CellRange, CellValue, ColumnSpan, Formula, Hyperlink,
    NumberFormatTable, RichText, RowInfo, Table, TableColumn, Workbook,
};
use sheetsplit_xlsx::{ReadOptions, WriteOptions, XlsxReader, XlsxWriter};

fn roundtrip(workbook: &Workbook) -> Workbook {
    let bytes = XlsxWriter::write_to_vec(workbook, &WriteOptions::default()).unwrap();
    XlsxReader::read(Cursor::new(bytes)).unwrap()
}

fn single_sheet() -> Workbook {
    let mut wb = Workbook::empty();
    wb.add_worksheet_with_name("Data").unwrap();
    wb
}

/// Test basic roundtrip with numeric values
#[test]
fn test_roundtrip_numbers() {
    let mut wb = single_sheet();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 42.0).unwrap();
    sheet.set_cell_value("B1", 3.14159).unwrap();
    sheet.set_cell_value("C1", -100.5).unwrap();
    sheet.set_cell_value("A2", 0.0).unwrap();
    sheet.set_cell_value("B2", 1e10).unwrap();
    sheet.set_cell_value("C2", f64::NAN).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();
    assert_eq!(sheet2.get_value("A1").unwrap().as_number(), Some(42.0));
    assert_eq!(sheet2.get_value("B1").unwrap().as_number(), Some(3.14159));
    assert_eq!(sheet2.get_value("C1").unwrap().as_number(), Some(-100.5));
    assert_eq!(sheet2.get_value("A2").unwrap().as_number(), Some(0.0));
    assert_eq!(sheet2.get_value("B2").unwrap().as_number(), Some(1e10));
    // Non-finite numbers have no XML spelling
    assert_eq!(
        sheet2.get_value("C2").unwrap(),
        CellValue::Error(CellError::Num)
    );
}

/// Test roundtrip of strings that need escaping
#[test]
fn test_roundtrip_strings() {
    let mut wb = single_sheet();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "Hello, World!").unwrap();
    sheet.set_cell_value("B1", "Special: <>&\"'").unwrap();
    sheet.set_cell_value("C1", "Multi\nLine").unwrap();
    sheet.set_cell_value("A2", "Unicode: \u{1F600}").unwrap();
    sheet.set_cell_value("B2", "  padded  ").unwrap();
    sheet.set_cell_value("C2", "bell\u{7} and _x0041_").unwrap();
    sheet.set_cell_value("A3", "Hello, World!").unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();
    for address in ["A1", "B1", "C1", "A2", "B2", "C2", "A3"] {
        assert_eq!(
            sheet2.get_value(address).unwrap(),
            wb.worksheet(0).unwrap().get_value(address).unwrap(),
            "cell {}",
            address
        );
    }
}

#[test]
fn test_roundtrip_booleans_errors_and_rich_text() {
    let mut wb = single_sheet();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", true).unwrap();
    sheet.set_cell_value("A2", false).unwrap();
    sheet.set_cell_value("B1", CellError::Div0).unwrap();
    sheet.set_cell_value("B2", CellError::Ref).unwrap();
    let rich = RichText {
        text: "Bold plain".into(),
        runs_xml: "<r><rPr><b/></rPr><t>Bold</t></r><r><t xml:space=\"preserve\"> plain</t></r>"
            .into(),
    };
    sheet
        .set_cell_value("C1", CellValue::RichText(rich.clone()))
        .unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();
    assert_eq!(sheet2.get_value("A1").unwrap(), CellValue::Boolean(true));
    assert_eq!(sheet2.get_value("A2").unwrap(), CellValue::Boolean(false));
    assert_eq!(sheet2.get_value("B1").unwrap(), CellValue::Error(CellError::Div0));
    assert_eq!(sheet2.get_value("B2").unwrap(), CellValue::Error(CellError::Ref));
    assert_eq!(sheet2.get_value("C1").unwrap(), CellValue::RichText(rich));
}

#[test]
fn test_roundtrip_formulas_keep_cached_values() {
    let mut wb = single_sheet();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 2.0).unwrap();
    sheet.set_cell_value("A2", 3.0).unwrap();
    let sum = Formula::new("=SUM(A1:A2)").with_cached(CellValue::Number(5.0));
    let label = Formula::new("IF(A3>4,\"big\",\"small\")").with_cached(CellValue::string("big"));
    let uncached = Formula::new("NOW()");
    sheet.set_cell_formula("A3", sum.clone()).unwrap();
    sheet.set_cell_formula("A4", label.clone()).unwrap();
    sheet.set_cell_formula("A5", uncached.clone()).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();
    assert_eq!(sheet2.get_value("A3").unwrap(), CellValue::Formula(sum));
    assert_eq!(sheet2.get_value("A4").unwrap(), CellValue::Formula(label));
    assert_eq!(sheet2.get_value("A5").unwrap(), CellValue::Formula(uncached));
}

#[test]
fn test_roundtrip_structure() {
    let mut wb = single_sheet();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "Region").unwrap();
    sheet.set_cell_value("B1", "Amount").unwrap();
    sheet.set_cell_value("A2", "North").unwrap();
    sheet.set_cell_value("B2", 10.0).unwrap();
    sheet.set_cell_value("A5", "Merged note").unwrap();
    sheet.merge_cells(&CellRange::parse("A5:C6").unwrap()).unwrap();
    sheet.set_row_info(0, RowInfo::with_height(24.0));
    sheet.set_row_info(9, RowInfo::default().hidden());
    sheet
        .add_column_span(ColumnSpan::range(0, 1).with_width(18.0))
        .unwrap();
    sheet.set_auto_filter(Some(AutoFilter::new(CellRange::parse("A1:B2").unwrap())));
    let table = Table::new(3, "Totals", CellRange::parse("E1:F3").unwrap())
        .with_column(TableColumn::new(1, "Item"))
        .with_column(TableColumn::new(2, "Cost"));
    sheet.add_table(table.clone()).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();
    assert_eq!(sheet2.merged_regions(), &[CellRange::parse("A5:C6").unwrap()]);
    assert_eq!(sheet2.row_info(0), Some(&RowInfo::with_height(24.0)));
    assert!(sheet2.row_info(9).unwrap().hidden);
    assert_eq!(sheet2.column_width(1), Some(18.0));
    assert_eq!(
        sheet2.auto_filter().map(|f| f.range.to_string()),
        Some("A1:B2".to_string())
    );
    assert_eq!(sheet2.tables(), &[table]);
}

#[test]
fn test_number_formats_survive_without_style_sheet() {
    let mut wb = single_sheet();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value("A1", 45292.0)
        .unwrap();
    let mut formats = NumberFormatTable::new();
    formats.insert(164, "yyyy-mm-dd");
    wb.set_number_formats(Some(Arc::new(formats)));

    let wb2 = roundtrip(&wb);
    let formats2 = wb2.number_formats().unwrap();
    assert_eq!(formats2.get(164), Some("yyyy-mm-dd"));
}

#[test]
fn test_comments_and_hyperlinks_roundtrip() {
    let mut wb = single_sheet();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "Docs").unwrap();
    sheet
        .set_comment("A1", CellComment::new("Dana", "line one\nline two"))
        .unwrap();
    sheet.set_comment("D7", CellComment::new("", "no author")).unwrap();
    let mut rich = CellComment::new("Lee", "Lee: bold");
    rich.runs_xml =
        r#"<r><rPr><b/></rPr><t>Lee:</t></r><r><t xml:space="preserve"> bold</t></r>"#.into();
    sheet.set_comment("B3", rich).unwrap();

    sheet.add_hyperlink(
        Hyperlink::external(CellRange::parse("A1").unwrap(), "https://example.com/docs?id=7&v=2")
            .with_display("Docs")
            .with_tooltip("Open the docs"),
    );
    sheet.add_hyperlink(Hyperlink::internal(CellRange::parse("B2:C2").unwrap(), "Data!D7"));
    sheet.add_hyperlink(
        Hyperlink::external(CellRange::parse("E1").unwrap(), "report.xlsx")
            .with_display("Report"),
    );
    let mut anchored = Hyperlink::external(CellRange::parse("E2").unwrap(), "report.xlsx");
    anchored.location = Some("Summary!A1".into());
    sheet.add_hyperlink(anchored);

    let wb2 = roundtrip(&wb);
    let before = wb.worksheet(0).unwrap();
    let after = wb2.worksheet(0).unwrap();

    assert_eq!(after.hyperlinks(), before.hyperlinks());
    let comments: Vec<_> = after.comments().collect();
    assert_eq!(comments, before.comments().collect::<Vec<_>>());
    assert_eq!(after.comment_authors(), vec!["Dana", "Lee", ""]);
}

#[test]
fn test_sheet_fragments_survive_rewrite() {
    let sheet_xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheetPr><tabColor rgb="FFFF0000"/></sheetPr>
  <sheetViews><sheetView tabSelected="1" workbookViewId="0"><pane ySplit="1" topLeftCell="A2" state="frozen"/></sheetView></sheetViews>
  <sheetData><row r="1"><c r="A1"><v>7</v></c></row></sheetData>
  <conditionalFormatting sqref="A1:A9"><cfRule type="cellIs" priority="1" operator="greaterThan"><formula>5</formula></cfRule></conditionalFormatting>
  <dataValidations count="1"><dataValidation type="list" sqref="B1"><formula1>"Yes,No"</formula1></dataValidation></dataValidations>
  <headerFooter><oddHeader>&amp;CReport</oddHeader></headerFooter>
</worksheet>"#;

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        let parts = [
            ("[Content_Types].xml", r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#),
            ("_rels/.rels", r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#),
            ("xl/workbook.xml", r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Styled" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
            ("xl/_rels/workbook.xml.rels", r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#),
            ("xl/worksheets/sheet1.xml", sheet_xml),
        ];
        for (name, content) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    let original = XlsxReader::read(Cursor::new(&buf)).unwrap();
    let rewritten = roundtrip(&original);
    let before = original.worksheet(0).unwrap().fragments();
    let after = rewritten.worksheet(0).unwrap().fragments();
    assert!(before.conditional_formatting[0].contains("greaterThan"));
    assert_eq!(after, before);
}

#[test]
fn test_values_only_read_drops_structure() {
    let mut wb = single_sheet();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "x").unwrap();
    sheet.merge_cells(&CellRange::parse("A1:B1").unwrap()).unwrap();
    sheet.set_comment("A1", CellComment::new("Dana", "note")).unwrap();
    sheet.add_hyperlink(Hyperlink::internal(CellRange::parse("A1").unwrap(), "Data!B1"));

    let bytes = XlsxWriter::write_to_vec(&wb, &WriteOptions::default()).unwrap();
    let wb2 = XlsxReader::read_with(Cursor::new(bytes), &ReadOptions::values_only()).unwrap();
    let sheet2 = wb2.worksheet(0).unwrap();
    assert_eq!(sheet2.get_value("A1").unwrap().as_string(), Some("x"));
    assert!(sheet2.merged_regions().is_empty());
    assert_eq!(sheet2.comment_count(), 0);
    assert!(sheet2.hyperlinks().is_empty());
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let mut wb = single_sheet();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value("C3", "on disk")
        .unwrap();
    XlsxWriter::write_file(&wb, &path).unwrap();

    let wb2 = XlsxReader::read_file(&path).unwrap();
    assert_eq!(
        wb2.worksheet(0).unwrap().get_value("C3").unwrap().as_string(),
        Some("on disk")
    );
}
