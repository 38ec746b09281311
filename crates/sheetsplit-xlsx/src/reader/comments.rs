//! Comment parts (`xl/commentsN.xml`)

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::decode_excel_escapes;
use sheetsplit_core::{CellAddress, CellComment, Worksheet};

/// A `<comment>` element being read
struct PendingComment {
    address: Option<CellAddress>,
    author_id: usize,
    text: String,
    has_runs: bool,
    text_start: usize,
    runs_xml: String,
}

/// Parse a comments part into `worksheet`.
///
/// Formatted comments keep their run markup verbatim, like rich shared
/// strings do.
pub(crate) fn read_comments_xml(xml: &str, worksheet: &mut Worksheet) -> XlsxResult<()> {
    let mut reader = Reader::from_str(xml);

    let mut authors: Vec<String> = Vec::new();
    let mut in_author = false;
    let mut in_t = false;
    let mut in_rph = false;
    let mut comment: Option<PendingComment> = None;

    loop {
        let pos = reader.buffer_position();
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"author" => {
                    in_author = true;
                    authors.push(String::new());
                }
                b"comment" => comment = Some(read_comment_start(&e)),
                b"text" => {
                    if let Some(comment) = comment.as_mut() {
                        comment.text_start = reader.buffer_position();
                    }
                }
                b"r" => {
                    if let Some(comment) = comment.as_mut() {
                        comment.has_runs = true;
                    }
                }
                b"rPh" => in_rph = true,
                b"t" => in_t = comment.is_some(),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"author" => {
                authors.push(String::new());
            }
            Event::Text(e) => {
                if in_author {
                    if let Some(author) = authors.last_mut() {
                        author.push_str(&e.unescape()?);
                    }
                } else if in_t && !in_rph {
                    if let Some(comment) = comment.as_mut() {
                        comment.text.push_str(&e.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"author" => in_author = false,
                b"t" => in_t = false,
                b"rPh" => in_rph = false,
                b"text" => {
                    if let Some(comment) = comment.as_mut().filter(|c| c.has_runs) {
                        comment.runs_xml = xml
                            .get(comment.text_start..pos)
                            .unwrap_or_default()
                            .to_string();
                    }
                }
                b"comment" => {
                    if let Some(pending) = comment.take() {
                        store_comment(worksheet, pending, &authors)?;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn read_comment_start(e: &BytesStart<'_>) -> PendingComment {
    let mut pending = PendingComment {
        address: None,
        author_id: 0,
        text: String::new(),
        has_runs: false,
        text_start: 0,
        runs_xml: String::new(),
    };
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"ref" => pending.address = CellAddress::parse(&value).ok(),
            b"authorId" => pending.author_id = value.parse().unwrap_or(0),
            _ => {}
        }
    }
    pending
}

fn store_comment(
    worksheet: &mut Worksheet,
    pending: PendingComment,
    authors: &[String],
) -> XlsxResult<()> {
    let Some(address) = pending.address else {
        log::warn!("Ignoring comment without a valid ref");
        return Ok(());
    };
    let comment = CellComment {
        author: authors.get(pending.author_id).cloned().unwrap_or_default(),
        text: decode_excel_escapes(&pending.text),
        runs_xml: pending.runs_xml,
    };
    worksheet.set_comment_at(address.row, address.col, comment)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_comments() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <authors><author>Dana</author><author>Lee</author></authors>
  <commentList>
    <comment ref="B2" authorId="1"><text><t>Check this</t></text></comment>
    <comment ref="A1" authorId="0"><text><r><rPr><b/></rPr><t>Dana:</t></r><r><t xml:space="preserve"> bold note</t></r></text></comment>
    <comment ref="not-a-cell" authorId="0"><text><t>lost</t></text></comment>
  </commentList>
</comments>"#;

        let mut sheet = Worksheet::new("Q1");
        read_comments_xml(xml, &mut sheet).unwrap();

        assert_eq!(sheet.comment_count(), 2);
        let plain = sheet.comment("B2").unwrap().unwrap();
        assert_eq!(plain.author, "Lee");
        assert_eq!(plain.text, "Check this");
        assert!(plain.runs_xml.is_empty());

        let rich = sheet.comment("A1").unwrap().unwrap();
        assert_eq!(rich.author, "Dana");
        assert_eq!(rich.text, "Dana: bold note");
        assert!(rich.runs_xml.starts_with("<r><rPr><b/></rPr><t>Dana:</t></r>"));
        assert!(rich.runs_xml.ends_with("</r>"));
    }
}
