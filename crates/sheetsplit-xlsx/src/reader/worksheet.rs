//! Worksheet parts (`xl/worksheets/sheetN.xml`)

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use super::table::read_auto_filter;
use crate::error::{XlsxError, XlsxResult};
use crate::options::ReadOptions;
use crate::xml::{capture_element, decode_excel_escapes, parse_bool, start_tag_without};
use sheetsplit_core::{
    CellAddress, CellData, CellError, CellRange, CellValue, ColumnSpan, Formula, FormulaKind,
    Hyperlink, PageMargins, RowInfo, SheetProtection, Worksheet,
};

/// What a worksheet needs from the rest of the package
pub(crate) struct SheetContext<'a> {
    pub shared_strings: &'a [CellValue],
    pub options: &'a ReadOptions,
    pub date_1904: bool,
}

/// Relationship ids a worksheet part refers to
#[derive(Debug, Default, PartialEq)]
pub(crate) struct SheetRelRefs {
    /// Table parts in file order
    pub tables: Vec<String>,
    /// `(index into the sheet's hyperlinks, relationship id)` of links
    /// with an external target
    pub hyperlinks: Vec<(usize, String)>,
}

impl SheetRelRefs {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.hyperlinks.is_empty()
    }
}

/// A `<c>` element being read
#[derive(Default)]
struct PendingCell {
    row: u32,
    col: u16,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    formula: Option<PendingFormula>,
    inline_text: Option<String>,
}

#[derive(Default)]
struct PendingFormula {
    text: String,
    kind: Option<String>,
    shared_index: Option<u32>,
    reference: Option<String>,
}

/// Where text content currently goes
#[derive(Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

/// Parse a worksheet part into `worksheet`.
///
/// Returns the relationship ids of the sheet's table parts and hyperlink
/// targets, which the caller resolves through the sheet's relationships.
pub(crate) fn read_worksheet_xml(
    xml: &str,
    ctx: &SheetContext<'_>,
    worksheet: &mut Worksheet,
) -> XlsxResult<SheetRelRefs> {
    let mut xml_reader = Reader::from_str(xml);
    xml_reader.trim_text(false);

    let keep_structure = ctx.options.structure;
    let mut refs = SheetRelRefs::default();

    let mut in_sheet_data = false;
    let mut current_row = 0u32;
    let mut next_row = 0u32;
    let mut next_col = 0u16;
    let mut cell: Option<PendingCell> = None;
    let mut text_target = TextTarget::None;
    let mut in_phonetic = false;

    loop {
        let pos = xml_reader.buffer_position();
        let event = xml_reader.read_event()?;
        let is_start = matches!(event, Event::Start(_));

        match event {
            Event::Start(e) | Event::Empty(e) if in_sheet_data => match e.local_name().as_ref() {
                b"row" => {
                    let (row, info) = read_row(&e, next_row, ctx.options)?;
                    worksheet.set_row_info(row, info);
                    current_row = row;
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let pending = read_cell_start(&e, current_row, next_col, ctx.options)?;
                    next_col = pending.col.saturating_add(1);
                    if is_start {
                        cell = Some(pending);
                    } else {
                        store_cell(worksheet, pending, ctx)?;
                    }
                }
                b"v" if is_start && cell.is_some() => text_target = TextTarget::Value,
                b"f" => {
                    if let Some(cell) = cell.as_mut() {
                        cell.formula = Some(read_formula_start(&e));
                        if is_start {
                            text_target = TextTarget::Formula;
                        }
                    }
                }
                b"is" => {
                    if let Some(cell) = cell.as_mut() {
                        cell.inline_text = Some(String::new());
                    }
                }
                b"rPh" => in_phonetic = is_start,
                b"t" if is_start && !in_phonetic => {
                    if cell.as_ref().is_some_and(|c| c.inline_text.is_some()) {
                        text_target = TextTarget::Inline;
                    }
                }
                b"extLst" if is_start => {
                    xml_reader.read_to_end(QName(e.name().as_ref()))?;
                }
                _ => {}
            },
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"worksheet" => {
                    for attr in e.attributes().flatten() {
                        let key = attr.key.as_ref();
                        if key.starts_with(b"xmlns:") || key == b"mc:Ignorable" {
                            worksheet.fragments_mut().namespaces.push((
                                String::from_utf8_lossy(key).into_owned(),
                                attr.unescape_value()?.into_owned(),
                            ));
                        }
                    }
                }
                b"sheetData" => in_sheet_data = is_start,
                b"sheetFormatPr" => {
                    read_sheet_format(&e, worksheet);
                    skip_children(&mut xml_reader, &e, is_start)?;
                }
                b"cols" => {}
                b"col" => {
                    if let Some(span) = read_column(&e, ctx.options) {
                        worksheet.add_column_span(span)?;
                    }
                    skip_children(&mut xml_reader, &e, is_start)?;
                }
                b"mergeCells" => {}
                b"mergeCell" => {
                    if keep_structure {
                        read_merge(&e, worksheet)?;
                    }
                    skip_children(&mut xml_reader, &e, is_start)?;
                }
                b"tableParts" => {}
                b"tablePart" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"id" {
                            refs.tables.push(attr.unescape_value()?.into_owned());
                        }
                    }
                    skip_children(&mut xml_reader, &e, is_start)?;
                }
                b"hyperlinks" => {}
                b"hyperlink" => {
                    if keep_structure {
                        if let Some((link, rel_id)) = read_hyperlink(&e)? {
                            let range = link.range;
                            worksheet.add_hyperlink(link);
                            let index = worksheet.hyperlinks().iter().position(|h| h.range == range);
                            if let (Some(index), Some(rel_id)) = (index, rel_id) {
                                refs.hyperlinks.retain(|(i, _)| *i != index);
                                refs.hyperlinks.push((index, rel_id));
                            }
                        }
                    }
                    skip_children(&mut xml_reader, &e, is_start)?;
                }
                // note shapes are rebuilt from the comments part
                b"legacyDrawing" => skip_children(&mut xml_reader, &e, is_start)?,
                b"autoFilter" => {
                    let filter = read_auto_filter(&mut xml_reader, xml, &e, is_start)?;
                    if keep_structure {
                        worksheet.set_auto_filter(filter);
                    }
                }
                b"sheetProtection" => {
                    if keep_structure {
                        worksheet.set_protection(Some(read_protection(&e)));
                    }
                    skip_children(&mut xml_reader, &e, is_start)?;
                }
                b"pageMargins" => {
                    if keep_structure {
                        worksheet.set_page_margins(Some(read_page_margins(&e)));
                    }
                    skip_children(&mut xml_reader, &e, is_start)?;
                }
                b"pageSetup" => {
                    // printer settings live in a separate part that is not carried
                    let tag = start_tag_without(&e, &[b"r:id"], true);
                    skip_children(&mut xml_reader, &e, is_start)?;
                    if keep_structure {
                        worksheet.fragments_mut().page_setup = Some(tag);
                    }
                }
                name @ (b"sheetPr" | b"sheetViews" | b"conditionalFormatting"
                | b"dataValidations" | b"printOptions" | b"headerFooter" | b"rowBreaks"
                | b"colBreaks" | b"ignoredErrors" | b"extLst") => {
                    let name = name.to_vec();
                    let markup = capture_element(&mut xml_reader, xml, pos, &e, is_start)?;
                    if keep_structure {
                        store_fragment(worksheet, &name, markup);
                    }
                }
                b"dimension" => skip_children(&mut xml_reader, &e, is_start)?,
                other => {
                    log::debug!(
                        "Dropping unsupported worksheet element <{}>",
                        String::from_utf8_lossy(other)
                    );
                    skip_children(&mut xml_reader, &e, is_start)?;
                }
            },
            Event::Text(e) => {
                if text_target != TextTarget::None {
                    let text = e.unescape()?;
                    if let Some(cell) = cell.as_mut() {
                        let slot = match text_target {
                            TextTarget::Value => cell.value.get_or_insert_with(String::new),
                            TextTarget::Formula => match cell.formula.as_mut() {
                                Some(f) => &mut f.text,
                                None => continue,
                            },
                            TextTarget::Inline => cell.inline_text.get_or_insert_with(String::new),
                            TextTarget::None => continue,
                        };
                        slot.push_str(&text);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"f" | b"t" => text_target = TextTarget::None,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    text_target = TextTarget::None;
                    if let Some(pending) = cell.take() {
                        store_cell(worksheet, pending, ctx)?;
                    }
                }
                b"sheetData" => in_sheet_data = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(refs)
}

/// Advance past the children of a start tag
fn skip_children(reader: &mut Reader<&[u8]>, e: &BytesStart<'_>, is_start: bool) -> XlsxResult<()> {
    if is_start {
        reader.read_to_end(QName(e.name().as_ref()))?;
    }
    Ok(())
}

/// A `<hyperlink>` and the relationship id of its external target
fn read_hyperlink(e: &BytesStart<'_>) -> XlsxResult<Option<(Hyperlink, Option<String>)>> {
    let mut range = None;
    let mut rel_id = None;
    let mut location = None;
    let mut display = None;
    let mut tooltip = None;

    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"ref" => range = Some(value),
            b"location" => location = Some(value),
            b"display" => display = Some(value),
            b"tooltip" => tooltip = Some(value),
            _ if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" => {
                rel_id = Some(value)
            }
            _ => {}
        }
    }

    let Some(range) = range.and_then(|r| CellRange::parse(&r).ok()) else {
        log::warn!("Ignoring hyperlink without a valid ref");
        return Ok(None);
    };
    let link = Hyperlink {
        range,
        target: None,
        location,
        display,
        tooltip,
    };
    Ok(Some((link, rel_id)))
}

fn store_fragment(worksheet: &mut Worksheet, name: &[u8], markup: String) {
    let fragments = worksheet.fragments_mut();
    match name {
        b"sheetPr" => fragments.sheet_pr = Some(markup),
        b"sheetViews" => fragments.sheet_views = Some(markup),
        b"conditionalFormatting" => fragments.conditional_formatting.push(markup),
        b"dataValidations" => fragments.data_validations = Some(markup),
        b"printOptions" => fragments.print_options = Some(markup),
        b"headerFooter" => fragments.header_footer = Some(markup),
        b"rowBreaks" => fragments.row_breaks = Some(markup),
        b"colBreaks" => fragments.col_breaks = Some(markup),
        b"ignoredErrors" => fragments.ignored_errors = Some(markup),
        b"extLst" => fragments.ext_lst = Some(markup),
        _ => {}
    }
}

// === sheetData ===

fn read_row(e: &BytesStart<'_>, next_row: u32, options: &ReadOptions) -> XlsxResult<(u32, RowInfo)> {
    let mut row = next_row;
    let mut info = RowInfo::default();
    let mut style = None;
    let mut custom_format = false;

    for attr in e.attributes().flatten() {
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"r" => {
                row = value
                    .parse::<u32>()
                    .ok()
                    .filter(|r| *r >= 1)
                    .map(|r| r - 1)
                    .ok_or_else(|| XlsxError::Parse(format!("Invalid row number '{}'", value)))?;
            }
            b"ht" => info.height = value.parse().ok(),
            b"customHeight" => info.custom_height = parse_bool(&value),
            b"hidden" => info.hidden = parse_bool(&value),
            b"outlineLevel" => info.outline_level = value.parse().unwrap_or(0),
            b"collapsed" => info.collapsed = parse_bool(&value),
            b"thickTop" => info.thick_top = parse_bool(&value),
            b"thickBot" => info.thick_bottom = parse_bool(&value),
            b"s" => style = value.parse::<u32>().ok(),
            b"customFormat" => custom_format = parse_bool(&value),
            _ => {}
        }
    }

    if custom_format && options.cell_styles {
        info.style_index = style;
    }
    Ok((row, info))
}

fn read_cell_start(
    e: &BytesStart<'_>,
    current_row: u32,
    next_col: u16,
    options: &ReadOptions,
) -> XlsxResult<PendingCell> {
    let mut cell = PendingCell {
        row: current_row,
        col: next_col,
        ..Default::default()
    };

    for attr in e.attributes().flatten() {
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"r" => {
                let addr = CellAddress::parse(&value).map_err(|err| {
                    XlsxError::Parse(format!("Invalid cell reference '{}': {}", value, err))
                })?;
                cell.row = addr.row;
                cell.col = addr.col;
            }
            b"t" => cell.cell_type = Some(value.into_owned()),
            b"s" if options.cell_styles => cell.style = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    Ok(cell)
}

fn read_formula_start(e: &BytesStart<'_>) -> PendingFormula {
    let mut formula = PendingFormula::default();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"t" => formula.kind = Some(value.into_owned()),
            b"si" => formula.shared_index = value.parse().ok(),
            b"ref" => formula.reference = Some(value.into_owned()),
            _ => {}
        }
    }
    formula
}

fn store_cell(worksheet: &mut Worksheet, cell: PendingCell, ctx: &SheetContext<'_>) -> XlsxResult<()> {
    let plain = plain_value(&cell, ctx);

    let value = match cell.formula {
        Some(f) => match formula_kind(&f) {
            Some(kind) => CellValue::Formula(Formula {
                text: f.text,
                kind,
                cached: (!plain.is_empty()).then(|| Box::new(plain)),
            }),
            None => plain,
        },
        None => plain,
    };

    worksheet.set_cell_at(cell.row, cell.col, CellData::with_style(value, cell.style))?;
    Ok(())
}

/// The formula kind, or None for an empty formula that carries nothing
fn formula_kind(f: &PendingFormula) -> Option<FormulaKind> {
    let range = f.reference.as_deref().and_then(|r| CellRange::parse(r).ok());
    match f.kind.as_deref() {
        Some("shared") => match f.shared_index {
            Some(index) => Some(FormulaKind::Shared { index, range }),
            None => {
                log::warn!("Shared formula without group index");
                (!f.text.is_empty()).then_some(FormulaKind::Normal)
            }
        },
        Some("array") => match range {
            Some(range) => Some(FormulaKind::Array { range }),
            None => (!f.text.is_empty()).then_some(FormulaKind::Normal),
        },
        _ => (!f.text.is_empty()).then_some(FormulaKind::Normal),
    }
}

/// The cell's value ignoring any formula
fn plain_value(cell: &PendingCell, ctx: &SheetContext<'_>) -> CellValue {
    let raw = cell.value.as_deref();
    let value = match cell.cell_type.as_deref() {
        Some("s") => raw.and_then(|v| {
            let resolved = v
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| ctx.shared_strings.get(idx).cloned());
            if resolved.is_none() {
                log::warn!(
                    "Unresolvable shared string index {:?} at {}",
                    v,
                    CellAddress::new(cell.row, cell.col)
                );
            }
            resolved
        }),
        Some("b") => raw.map(|v| CellValue::Boolean(parse_bool(v.trim()))),
        Some("e") => raw.map(|v| {
            CellError::parse(v.trim())
                .map(CellValue::Error)
                .unwrap_or_else(|| CellValue::String(v.to_string()))
        }),
        Some("str") => raw.map(|v| CellValue::String(decode_excel_escapes(v))),
        Some("inlineStr") => cell
            .inline_text
            .as_deref()
            .or(raw)
            .map(|v| CellValue::String(decode_excel_escapes(v))),
        Some("d") => raw.and_then(|v| iso_to_serial(v.trim(), ctx.date_1904)).map(CellValue::Number),
        _ => raw.and_then(|v| v.trim().parse::<f64>().ok()).map(CellValue::Number),
    };
    value.unwrap_or(CellValue::Empty)
}

/// Convert an ISO 8601 date cell to a serial date number
fn iso_to_serial(s: &str, date_1904: bool) -> Option<f64> {
    let datetime = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(&format!("1899-12-30T{}", s), "%Y-%m-%dT%H:%M:%S%.f").ok()
        });

    let Some(datetime) = datetime else {
        log::warn!("Ignoring unparseable date cell {:?}", s);
        return None;
    };

    let epoch = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    }?
    .and_hms_opt(0, 0, 0)?;

    let millis = (datetime - epoch).num_milliseconds();
    Some(millis as f64 / 86_400_000.0)
}

// === Other typed elements ===

fn read_sheet_format(e: &BytesStart<'_>, worksheet: &mut Worksheet) {
    let format = worksheet.sheet_format_mut();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"defaultRowHeight" => {
                if let Ok(h) = value.parse() {
                    format.default_row_height = h;
                }
            }
            b"customHeight" => format.custom_height = parse_bool(&value),
            b"defaultColWidth" => format.default_col_width = value.parse().ok(),
            b"baseColWidth" => format.base_col_width = value.parse().ok(),
            b"zeroHeight" => format.zero_height = parse_bool(&value),
            b"outlineLevelRow" => format.outline_level_row = value.parse().unwrap_or(0),
            b"outlineLevelCol" => format.outline_level_col = value.parse().unwrap_or(0),
            _ => {}
        }
    }
}

fn read_column(e: &BytesStart<'_>, options: &ReadOptions) -> Option<ColumnSpan> {
    let mut min = None;
    let mut max = None;
    let mut span = ColumnSpan::single(0);

    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"min" => min = value.parse::<u16>().ok().filter(|v| *v >= 1),
            b"max" => max = value.parse::<u16>().ok().filter(|v| *v >= 1),
            b"width" => span.width = value.parse().ok(),
            b"customWidth" => span.custom_width = parse_bool(&value),
            b"hidden" => span.hidden = parse_bool(&value),
            b"outlineLevel" => span.outline_level = value.parse().unwrap_or(0),
            b"collapsed" => span.collapsed = parse_bool(&value),
            b"bestFit" => span.best_fit = parse_bool(&value),
            b"style" if options.cell_styles => span.style_index = value.parse().ok(),
            _ => {}
        }
    }

    match (min, max) {
        (Some(min), Some(max)) => {
            let bounds = ColumnSpan::range(min - 1, max - 1);
            span.min = bounds.min;
            span.max = bounds.max;
            Some(span)
        }
        _ => {
            log::warn!("Ignoring <col> without min/max");
            None
        }
    }
}

fn read_merge(e: &BytesStart<'_>, worksheet: &mut Worksheet) -> XlsxResult<()> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"ref" {
            let range = CellRange::parse(&attr.unescape_value()?)?;
            if let Err(err) = worksheet.merge_cells(&range) {
                log::warn!("Skipping merged region: {}", err);
            }
        }
    }
    Ok(())
}

fn read_protection(e: &BytesStart<'_>) -> SheetProtection {
    let mut protection = SheetProtection::default();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"password" => protection.password = Some(value.into_owned()),
            b"algorithmName" => protection.algorithm_name = Some(value.into_owned()),
            b"hashValue" => protection.hash_value = Some(value.into_owned()),
            b"saltValue" => protection.salt_value = Some(value.into_owned()),
            b"spinCount" => protection.spin_count = value.parse().ok(),
            key => {
                let key = String::from_utf8_lossy(key);
                if !protection.set_flag(&key, parse_bool(&value)) {
                    log::debug!("Ignoring sheetProtection attribute {}", key);
                }
            }
        }
    }
    protection
}

fn read_page_margins(e: &BytesStart<'_>) -> PageMargins {
    let mut margins = PageMargins::default();
    for attr in e.attributes().flatten() {
        let Some(value) = attr
            .unescape_value()
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
        else {
            continue;
        };
        match attr.key.as_ref() {
            b"left" => margins.left = value,
            b"right" => margins.right = value,
            b"top" => margins.top = value,
            b"bottom" => margins.bottom = value,
            b"header" => margins.header = value,
            b"footer" => margins.footer = value,
            _ => {}
        }
    }
    margins
}
