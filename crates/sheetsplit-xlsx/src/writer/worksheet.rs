//! Worksheet part serialization

use std::collections::BTreeSet;

use super::shared_strings::SharedStringTable;
use super::table::auto_filter_xml;
use super::StyleFilter;
use crate::xml::{encode_cell_text, escape_xml};
use sheetsplit_core::{
    CellAddress, CellData, CellValue, Formula, FormulaKind, Hyperlink, Worksheet,
};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Relationship ids a worksheet part refers to
#[derive(Debug, Default)]
pub(crate) struct SheetRelIds {
    /// One per table, in the order of [`Worksheet::tables`]
    pub tables: Vec<String>,
    /// One per hyperlink; `Some` for links with an external target
    pub hyperlinks: Vec<Option<String>>,
    /// Note drawing, present when the sheet has comments
    pub legacy_drawing: Option<String>,
}

/// Serialize a worksheet part
pub(crate) fn worksheet_xml(
    sheet: &Worksheet,
    styles: &StyleFilter<'_>,
    sst: &mut SharedStringTable,
    rel_ids: &SheetRelIds,
) -> String {
    let fragments = sheet.fragments();

    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}""#,
        MAIN_NS, REL_NS
    );
    for (key, value) in &fragments.namespaces {
        if key == "xmlns:r" {
            continue;
        }
        content.push_str(&format!(" {}=\"{}\"", key, escape_xml(value)));
    }
    content.push('>');

    push_fragment(&mut content, fragments.sheet_pr.as_deref());

    let dimension = sheet
        .used_range()
        .map_or_else(|| "A1".to_string(), |r| r.to_a1_string());
    content.push_str(&format!("\n    <dimension ref=\"{}\"/>", dimension));

    push_fragment(&mut content, fragments.sheet_views.as_deref());
    write_sheet_format(&mut content, sheet);
    write_columns(&mut content, sheet, styles);
    write_sheet_data(&mut content, sheet, styles, sst);

    if let Some(protection) = sheet.protection() {
        content.push_str("\n    <sheetProtection");
        let text_attrs = [
            ("password", protection.password.as_deref()),
            ("algorithmName", protection.algorithm_name.as_deref()),
            ("hashValue", protection.hash_value.as_deref()),
            ("saltValue", protection.salt_value.as_deref()),
        ];
        for (name, value) in text_attrs {
            if let Some(value) = value {
                content.push_str(&format!(" {}=\"{}\"", name, escape_xml(value)));
            }
        }
        if let Some(spin) = protection.spin_count {
            content.push_str(&format!(" spinCount=\"{}\"", spin));
        }
        for (name, flag) in protection.flags() {
            if let Some(flag) = flag {
                content.push_str(&format!(" {}=\"{}\"", name, flag as u8));
            }
        }
        content.push_str("/>");
    }

    if let Some(filter) = sheet.auto_filter() {
        content.push_str("\n    ");
        content.push_str(&auto_filter_xml(filter));
    }

    let merged_regions = sheet.merged_regions();
    if !merged_regions.is_empty() {
        content.push_str(&format!(
            "\n    <mergeCells count=\"{}\">",
            merged_regions.len()
        ));
        for range in merged_regions {
            content.push_str(&format!("\n        <mergeCell ref=\"{}\"/>", range));
        }
        content.push_str("\n    </mergeCells>");
    }

    for rule in &fragments.conditional_formatting {
        push_fragment(&mut content, Some(rule));
    }
    push_fragment(&mut content, fragments.data_validations.as_deref());
    write_hyperlinks(&mut content, sheet.hyperlinks(), &rel_ids.hyperlinks);
    push_fragment(&mut content, fragments.print_options.as_deref());

    if let Some(m) = sheet.page_margins() {
        content.push_str(&format!(
            "\n    <pageMargins left=\"{}\" right=\"{}\" top=\"{}\" bottom=\"{}\" header=\"{}\" footer=\"{}\"/>",
            m.left, m.right, m.top, m.bottom, m.header, m.footer
        ));
    }

    push_fragment(&mut content, fragments.page_setup.as_deref());
    push_fragment(&mut content, fragments.header_footer.as_deref());
    push_fragment(&mut content, fragments.row_breaks.as_deref());
    push_fragment(&mut content, fragments.col_breaks.as_deref());
    push_fragment(&mut content, fragments.ignored_errors.as_deref());

    if let Some(id) = &rel_ids.legacy_drawing {
        content.push_str(&format!("\n    <legacyDrawing r:id=\"{}\"/>", id));
    }

    if !rel_ids.tables.is_empty() {
        content.push_str(&format!(
            "\n    <tableParts count=\"{}\">",
            rel_ids.tables.len()
        ));
        for id in &rel_ids.tables {
            content.push_str(&format!("<tablePart r:id=\"{}\"/>", id));
        }
        content.push_str("</tableParts>");
    }

    push_fragment(&mut content, fragments.ext_lst.as_deref());

    content.push_str("\n</worksheet>");
    content
}

fn push_fragment(content: &mut String, fragment: Option<&str>) {
    if let Some(markup) = fragment {
        content.push_str("\n    ");
        content.push_str(markup);
    }
}

fn write_hyperlinks(content: &mut String, links: &[Hyperlink], rel_ids: &[Option<String>]) {
    if links.is_empty() {
        return;
    }

    content.push_str("\n    <hyperlinks>");
    for (k, link) in links.iter().enumerate() {
        content.push_str(&format!("<hyperlink ref=\"{}\"", link.range));
        if let Some(Some(id)) = rel_ids.get(k) {
            content.push_str(&format!(" r:id=\"{}\"", id));
        }
        let text_attrs = [
            ("location", link.location.as_deref()),
            ("tooltip", link.tooltip.as_deref()),
            ("display", link.display.as_deref()),
        ];
        for (name, value) in text_attrs {
            if let Some(value) = value {
                content.push_str(&format!(" {}=\"{}\"", name, escape_xml(value)));
            }
        }
        content.push_str("/>");
    }
    content.push_str("</hyperlinks>");
}

fn write_sheet_format(content: &mut String, sheet: &Worksheet) {
    let format = sheet.sheet_format();
    content.push_str("\n    <sheetFormatPr");
    if let Some(base) = format.base_col_width {
        content.push_str(&format!(" baseColWidth=\"{}\"", base));
    }
    if let Some(width) = format.default_col_width {
        content.push_str(&format!(" defaultColWidth=\"{}\"", width));
    }
    content.push_str(&format!(" defaultRowHeight=\"{}\"", format.default_row_height));
    if format.custom_height {
        content.push_str(" customHeight=\"1\"");
    }
    if format.zero_height {
        content.push_str(" zeroHeight=\"1\"");
    }
    if format.outline_level_row > 0 {
        content.push_str(&format!(" outlineLevelRow=\"{}\"", format.outline_level_row));
    }
    if format.outline_level_col > 0 {
        content.push_str(&format!(" outlineLevelCol=\"{}\"", format.outline_level_col));
    }
    content.push_str("/>");
}

fn write_columns(content: &mut String, sheet: &Worksheet, styles: &StyleFilter<'_>) {
    let columns = sheet.columns();
    if columns.is_empty() {
        return;
    }

    content.push_str("\n    <cols>");
    for span in columns {
        content.push_str(&format!(
            "\n        <col min=\"{}\" max=\"{}\"",
            span.min + 1,
            span.max + 1
        ));
        if let Some(width) = span.width {
            content.push_str(&format!(" width=\"{}\"", width));
        }
        if let Some(style) = span.style_index.filter(|s| styles.keeps_xf(*s)) {
            content.push_str(&format!(" style=\"{}\"", style));
        }
        if span.hidden {
            content.push_str(" hidden=\"1\"");
        }
        if span.best_fit {
            content.push_str(" bestFit=\"1\"");
        }
        if span.custom_width {
            content.push_str(" customWidth=\"1\"");
        }
        if span.outline_level > 0 {
            content.push_str(&format!(" outlineLevel=\"{}\"", span.outline_level));
        }
        if span.collapsed {
            content.push_str(" collapsed=\"1\"");
        }
        content.push_str("/>");
    }
    content.push_str("\n    </cols>");
}

fn write_sheet_data(
    content: &mut String,
    sheet: &Worksheet,
    styles: &StyleFilter<'_>,
    sst: &mut SharedStringTable,
) {
    let mut row_indices: BTreeSet<u32> = sheet.rows().map(|(row, _)| row).collect();
    row_indices.extend(sheet.iter_cells().map(|(row, _, _)| row));

    if row_indices.is_empty() {
        content.push_str("\n    <sheetData/>");
        return;
    }

    content.push_str("\n    <sheetData>");
    for row in row_indices {
        content.push_str(&format!("\n        <row r=\"{}\"", row + 1));
        if let Some(info) = sheet.row_info(row) {
            if let Some(style) = info.style_index.filter(|s| styles.keeps_xf(*s)) {
                content.push_str(&format!(" s=\"{}\" customFormat=\"1\"", style));
            }
            if let Some(height) = info.height {
                content.push_str(&format!(" ht=\"{}\"", height));
            }
            if info.custom_height {
                content.push_str(" customHeight=\"1\"");
            }
            if info.hidden {
                content.push_str(" hidden=\"1\"");
            }
            if info.outline_level > 0 {
                content.push_str(&format!(" outlineLevel=\"{}\"", info.outline_level));
            }
            if info.collapsed {
                content.push_str(" collapsed=\"1\"");
            }
            if info.thick_top {
                content.push_str(" thickTop=\"1\"");
            }
            if info.thick_bottom {
                content.push_str(" thickBot=\"1\"");
            }
        }

        let mut cells = sheet.row_cells(row).peekable();
        if cells.peek().is_none() {
            content.push_str("/>");
            continue;
        }
        content.push('>');
        for (col, cell) in cells {
            write_cell(content, row, col, cell, styles, sst);
        }
        content.push_str("</row>");
    }
    content.push_str("\n    </sheetData>");
}

fn write_cell(
    content: &mut String,
    row: u32,
    col: u16,
    cell: &CellData,
    styles: &StyleFilter<'_>,
    sst: &mut SharedStringTable,
) {
    let cell_ref = CellAddress::new(row, col).to_a1_string();
    let style = styles.cell_xf(cell.style_index);
    let style_attr = style.map_or_else(String::new, |s| format!(" s=\"{}\"", s));

    match &cell.value {
        CellValue::Empty => {
            // Preserve style-only cells
            if style.is_some() {
                content.push_str(&format!("<c r=\"{}\"{}/>", cell_ref, style_attr));
            }
        }
        CellValue::Number(n) if n.is_finite() => {
            content.push_str(&format!(
                "<c r=\"{}\"{}><v>{}</v></c>",
                cell_ref, style_attr, n
            ));
        }
        CellValue::Number(_) => {
            content.push_str(&format!(
                "<c r=\"{}\"{} t=\"e\"><v>#NUM!</v></c>",
                cell_ref, style_attr
            ));
        }
        CellValue::Boolean(b) => {
            content.push_str(&format!(
                "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                cell_ref, style_attr, *b as u8
            ));
        }
        CellValue::String(s) => {
            content.push_str(&format!(
                "<c r=\"{}\"{} t=\"s\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                sst.plain(s)
            ));
        }
        CellValue::RichText(rich) => {
            content.push_str(&format!(
                "<c r=\"{}\"{} t=\"s\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                sst.rich(rich)
            ));
        }
        CellValue::Error(e) => {
            content.push_str(&format!(
                "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                escape_xml(e.as_str())
            ));
        }
        CellValue::Formula(formula) => {
            write_formula_cell(content, &cell_ref, &style_attr, formula);
        }
    }
}

fn write_formula_cell(content: &mut String, cell_ref: &str, style_attr: &str, formula: &Formula) {
    let (type_attr, cached) = match formula.cached.as_deref() {
        Some(CellValue::Number(n)) if n.is_finite() => ("", Some(n.to_string())),
        Some(CellValue::Boolean(b)) => (" t=\"b\"", Some((*b as u8).to_string())),
        Some(CellValue::Error(e)) => (" t=\"e\"", Some(escape_xml(e.as_str()))),
        Some(CellValue::String(s)) => (" t=\"str\"", Some(encode_cell_text(s))),
        Some(CellValue::RichText(r)) => (" t=\"str\"", Some(encode_cell_text(&r.text))),
        _ => ("", None),
    };

    let formula_attrs = match &formula.kind {
        FormulaKind::Normal => String::new(),
        FormulaKind::Shared { index, range } => match range {
            Some(range) => format!(" t=\"shared\" ref=\"{}\" si=\"{}\"", range, index),
            None => format!(" t=\"shared\" si=\"{}\"", index),
        },
        FormulaKind::Array { range } => format!(" t=\"array\" ref=\"{}\"", range),
    };

    content.push_str(&format!("<c r=\"{}\"{}{}>", cell_ref, style_attr, type_attr));
    if formula.text.is_empty() {
        content.push_str(&format!("<f{}/>", formula_attrs));
    } else {
        content.push_str(&format!(
            "<f{}>{}</f>",
            formula_attrs,
            escape_xml(&formula.text)
        ));
    }
    if let Some(value) = cached {
        content.push_str(&format!("<v>{}</v>", value));
    }
    content.push_str("</c>");
}
