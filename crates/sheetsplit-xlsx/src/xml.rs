//! Small XML helpers shared by the reader and the writer

use quick_xml::events::BytesStart;
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;

/// Escape text for element content or attribute values
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a cell string the way spreadsheet applications store it.
///
/// Control characters XML cannot carry (and CR, which XML parsers fold into
/// LF) become `_xHHHH_`; a literal `_xHHHH_` sequence gets its underscore
/// escaped so it survives decoding.
pub(crate) fn encode_cell_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '\t' | '\n' => out.push(c),
            c if (c as u32) < 0x20 => out.push_str(&format!("_x{:04X}_", c as u32)),
            '_' if looks_like_escape(&s[i..]) => out.push_str("_x005F_"),
            _ => out.push(c),
        }
    }
    escape_xml(&out)
}

fn looks_like_escape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b[1] == b'x'
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('_') {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = if looks_like_escape(candidate) {
            u32::from_str_radix(&candidate[2..6], 16)
                .ok()
                .and_then(char::from_u32)
        } else {
            None
        };
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Parse an XML schema boolean
pub(crate) fn parse_bool(s: &str) -> bool {
    s == "1" || s.eq_ignore_ascii_case("true")
}

/// Render a boolean the way the writer stores it
pub(crate) fn bool_attr(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// All attributes of an element, with unescaped values, in file order
pub(crate) fn attributes(e: &BytesStart<'_>) -> XlsxResult<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

/// Rebuild an element's start tag without some attributes
///
/// Attribute values are copied in their escaped form.
pub(crate) fn start_tag_without(e: &BytesStart<'_>, skip: &[&[u8]], self_closing: bool) -> String {
    let mut tag = format!("<{}", String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes().flatten() {
        if skip.contains(&attr.key.as_ref()) {
            continue;
        }
        tag.push_str(&format!(
            " {}=\"{}\"",
            String::from_utf8_lossy(attr.key.as_ref()),
            String::from_utf8_lossy(&attr.value)
        ));
    }
    tag.push_str(if self_closing { "/>" } else { ">" });
    tag
}

/// Capture a complete element as markup.
///
/// `start` is the reader position before the element's event was read and
/// `is_start` tells whether it was a start tag (the reader is then advanced
/// past the matching end tag).
pub(crate) fn capture_element(
    reader: &mut Reader<&[u8]>,
    xml: &str,
    start: usize,
    e: &BytesStart<'_>,
    is_start: bool,
) -> XlsxResult<String> {
    if is_start {
        let name = e.name().as_ref().to_vec();
        reader.read_to_end(QName(&name))?;
    }
    let end = reader.buffer_position();
    Ok(xml
        .get(start..end)
        .unwrap_or_default()
        .trim_start()
        .to_string())
}

/// Capture the markup between an element's start and end tags.
///
/// Must be called right after the start tag was read.
pub(crate) fn capture_inner(
    reader: &mut Reader<&[u8]>,
    xml: &str,
    e: &BytesStart<'_>,
) -> XlsxResult<String> {
    let name = e.name().as_ref().to_vec();
    let span = reader.read_to_end(QName(&name))?;
    Ok(xml.get(span).unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("Line1_x000d_Line2"), "Line1\rLine2");
        assert_eq!(decode_excel_escapes("A_x000A_B"), "A\nB");
        assert_eq!(decode_excel_escapes("Col1_x0009_Col2"), "Col1\tCol2");
        assert_eq!(decode_excel_escapes("test_x005f_value"), "test_value");
        assert_eq!(decode_excel_escapes("plain_text"), "plain_text");
        assert_eq!(decode_excel_escapes("_x00_short"), "_x00_short");
        assert_eq!(decode_excel_escapes("end_x"), "end_x");
    }

    #[test]
    fn test_encode_cell_text() {
        assert_eq!(encode_cell_text("a\r\nb"), "a_x000D_\nb");
        assert_eq!(encode_cell_text("keep_x0041_"), "keep_x005F_x0041_");
        assert_eq!(encode_cell_text("<&>"), "&lt;&amp;&gt;");
        for s in ["a\r\nb", "keep_x0041_", "tab\there", "under_score"] {
            let encoded = encode_cell_text(s);
            let unescaped = quick_xml::escape::unescape(&encoded).unwrap();
            assert_eq!(decode_excel_escapes(&unescaped), s);
        }
    }

    #[test]
    fn test_capture_element_and_inner() {
        let xml = r#"<root>  <keep a="1"><x/></keep><other/></root>"#;
        let mut reader = Reader::from_str(xml);
        let mut captured = None;
        let mut inner = None;
        loop {
            let pos = reader.buffer_position();
            match reader.read_event().unwrap() {
                quick_xml::events::Event::Start(e) if e.name().as_ref() == b"keep" => {
                    captured = Some(capture_element(&mut reader, xml, pos, &e, true).unwrap());
                }
                quick_xml::events::Event::Start(e) if e.name().as_ref() == b"root" => {}
                quick_xml::events::Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(captured.as_deref(), Some(r#"<keep a="1"><x/></keep>"#));

        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().unwrap() {
                quick_xml::events::Event::Start(e) if e.name().as_ref() == b"keep" => {
                    inner = Some(capture_inner(&mut reader, xml, &e).unwrap());
                }
                quick_xml::events::Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(inner.as_deref(), Some("<x/>"));
    }

    #[test]
    fn test_start_tag_without() {
        let xml = r#"<pageSetup orientation="landscape" r:id="rId1" fitToWidth="1"/>"#;
        let mut reader = Reader::from_str(xml);
        match reader.read_event().unwrap() {
            quick_xml::events::Event::Empty(e) => {
                assert_eq!(
                    start_tag_without(&e, &[b"r:id"], true),
                    r#"<pageSetup orientation="landscape" fitToWidth="1"/>"#
                );
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
