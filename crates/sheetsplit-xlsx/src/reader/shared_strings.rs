//! Shared string table (`xl/sharedStrings.xml`)

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::decode_excel_escapes;
use sheetsplit_core::{CellValue, RichText};

/// Parse the shared string table.
///
/// Plain entries become [`CellValue::String`]; entries made of formatting
/// runs become [`CellValue::RichText`] with the run markup kept verbatim.
/// Phonetic hints (`rPh`) are not part of the visible text.
pub(crate) fn read_shared_strings(xml: &str) -> XlsxResult<Vec<CellValue>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();

    let mut in_si = false;
    let mut in_t = false;
    let mut in_rph = false;
    let mut has_runs = false;
    let mut text = String::new();
    let mut si_start = 0usize;

    loop {
        let pos = reader.buffer_position();
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    has_runs = false;
                    text.clear();
                    si_start = reader.buffer_position();
                }
                b"r" if in_si => has_runs = true,
                b"rPh" => in_rph = true,
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                strings.push(CellValue::String(String::new()));
            }
            Event::Text(e) if in_t && !in_rph => {
                text.push_str(&e.unescape()?);
            }
            Event::CData(e) if in_t && !in_rph => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    let plain = decode_excel_escapes(&text);
                    if has_runs {
                        strings.push(CellValue::RichText(RichText {
                            text: plain,
                            runs_xml: xml.get(si_start..pos).unwrap_or_default().to_string(),
                        }));
                    } else {
                        strings.push(CellValue::String(plain));
                    }
                    in_si = false;
                }
                b"t" => in_t = false,
                b"rPh" => in_rph = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}
