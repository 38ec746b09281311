//! XLSX styles (styles.xml) read/write helpers
//!
//! The style sheet is carried through unchanged, so reading only extracts
//! what the rest of the crate needs to know about it: how many cell formats
//! and differential formats it defines, and its custom number formats.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::escape_xml;
use sheetsplit_core::NumberFormatTable;

// === Reading ===

#[derive(Debug, Default)]
pub(crate) struct ParsedStyles {
    /// Number of `<xf>` records in `cellXfs`
    pub cell_xfs_count: u32,
    /// Number of `<dxf>` records in `dxfs`
    pub dxf_count: u32,
    /// Custom number formats from `numFmts`
    pub number_formats: NumberFormatTable,
}

pub(crate) fn read_styles_xml(xml: &str) -> XlsxResult<ParsedStyles> {
    let mut xml_reader = Reader::from_str(xml);
    xml_reader.trim_text(true);

    let mut parsed = ParsedStyles::default();
    let mut in_cell_xfs = false;
    let mut in_dxfs = false;
    let mut depth_in_list = 0usize;

    loop {
        match xml_reader.read_event()? {
            Event::Start(e) => {
                match e.local_name().as_ref() {
                    b"cellXfs" => {
                        in_cell_xfs = true;
                        depth_in_list = 0;
                        continue;
                    }
                    b"dxfs" => {
                        in_dxfs = true;
                        depth_in_list = 0;
                        continue;
                    }
                    b"xf" if in_cell_xfs && depth_in_list == 0 => parsed.cell_xfs_count += 1,
                    b"dxf" if in_dxfs && depth_in_list == 0 => parsed.dxf_count += 1,
                    _ => {}
                }
                if in_cell_xfs || in_dxfs {
                    depth_in_list += 1;
                }
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"xf" if in_cell_xfs && depth_in_list == 0 => parsed.cell_xfs_count += 1,
                b"dxf" if in_dxfs && depth_in_list == 0 => parsed.dxf_count += 1,
                b"numFmt" => {
                    let mut id = None;
                    let mut code = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"numFmtId" => {
                                id = attr
                                    .unescape_value()
                                    .ok()
                                    .and_then(|s| s.parse::<u32>().ok());
                            }
                            b"formatCode" => {
                                code = attr.unescape_value().ok().map(|s| s.to_string());
                            }
                            _ => {}
                        }
                    }
                    match (id, code) {
                        (Some(id), Some(code)) => parsed.number_formats.insert(id, code),
                        _ => log::warn!("Ignoring numFmt without id or format code"),
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"cellXfs" => in_cell_xfs = false,
                b"dxfs" => in_dxfs = false,
                _ if in_cell_xfs || in_dxfs => depth_in_list = depth_in_list.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parsed)
}

// === Writing ===

/// A minimal style sheet with a single default cell format.
///
/// Used when a workbook carries no retained style sheet. Custom number
/// formats are declared when given so their ids stay defined.
pub(crate) fn default_styles_xml(number_formats: Option<&NumberFormatTable>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    if let Some(formats) = number_formats.filter(|f| !f.is_empty()) {
        xml.push_str(&format!("\n    <numFmts count=\"{}\">", formats.len()));
        for (id, code) in formats.custom_formats() {
            xml.push_str(&format!(
                "\n        <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                id,
                escape_xml(code)
            ));
        }
        xml.push_str("\n    </numFmts>");
    }

    xml.push_str(
        r#"
    <fonts count="1">
        <font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>
    </fonts>
    <fills count="2">
        <fill><patternFill patternType="none"/></fill>
        <fill><patternFill patternType="gray125"/></fill>
    </fills>
    <borders count="1">
        <border><left/><right/><top/><bottom/><diagonal/></border>
    </borders>
    <cellStyleXfs count="1">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    </cellStyleXfs>
    <cellXfs count="1">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    </cellXfs>
    <cellStyles count="1">
        <cellStyle name="Normal" xfId="0" builtinId="0"/>
    </cellStyles>
    <dxfs count="0"/>
    <tableStyles count="0" defaultTableStyle="TableStyleMedium2" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
    );
    xml
}
