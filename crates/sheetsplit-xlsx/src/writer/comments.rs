//! Comment parts and their note drawings

use crate::xml::{encode_cell_text, escape_xml};
use sheetsplit_core::{CellAddress, Worksheet};

/// Serialize a sheet's comments (`xl/commentsN.xml`)
pub(crate) fn comments_xml(sheet: &Worksheet) -> String {
    let authors = sheet.comment_authors();

    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <authors>"#,
    );
    for author in &authors {
        content.push_str(&format!("<author>{}</author>", escape_xml(author)));
    }
    content.push_str("</authors>\n    <commentList>");

    for (row, col, comment) in sheet.comments() {
        let author_id = authors
            .iter()
            .position(|a| *a == comment.author)
            .unwrap_or(0);
        content.push_str(&format!(
            "\n        <comment ref=\"{}\" authorId=\"{}\"><text>",
            CellAddress::new(row, col),
            author_id
        ));
        if comment.runs_xml.is_empty() {
            content.push_str(&format!(
                "<t xml:space=\"preserve\">{}</t>",
                encode_cell_text(&comment.text)
            ));
        } else {
            content.push_str(&comment.runs_xml);
        }
        content.push_str("</text></comment>");
    }

    content.push_str("\n    </commentList>\n</comments>");
    content
}

/// Serialize the VML drawing holding one hidden note shape per comment
/// (`xl/drawings/vmlDrawingN.vml`).
///
/// `sheet_number` is 1-based and keeps shape ids unique across sheets.
pub(crate) fn vml_drawing_xml(sheet: &Worksheet, sheet_number: usize) -> String {
    let mut content = format!(
        r#"<xml xmlns:v="urn:schemas-microsoft-com:vml" xmlns:o="urn:schemas-microsoft-com:office:office" xmlns:x="urn:schemas-microsoft-com:office:excel">
 <o:shapelayout v:ext="edit"><o:idmap v:ext="edit" data="{}"/></o:shapelayout>
 <v:shapetype id="_x0000_t202" coordsize="21600,21600" o:spt="202" path="m,l,21600r21600,l21600,xe"><v:stroke joinstyle="miter"/><v:path gradientshapeok="t" o:connecttype="rect"/></v:shapetype>"#,
        sheet_number
    );

    for (k, (row, col, _)) in sheet.comments().enumerate() {
        let shape_id = sheet_number * 1024 + k + 1;
        let top = row.saturating_sub(1);
        content.push_str(&format!(
            r##"
 <v:shape id="_x0000_s{}" type="#_x0000_t202" style="position:absolute;margin-left:{:.2}pt;margin-top:{:.2}pt;width:108pt;height:59.25pt;z-index:{};visibility:hidden" fillcolor="#ffffe1" o:insetmode="auto"><v:fill color2="#ffffe1"/><v:shadow on="t" color="black" obscured="t"/><v:path o:connecttype="none"/><v:textbox style="mso-direction-alt:auto"><div style="text-align:left"></div></v:textbox><x:ClientData ObjectType="Note"><x:MoveWithCells/><x:SizeWithCells/><x:Anchor>{}, 15, {}, 2, {}, 15, {}, 16</x:Anchor><x:AutoFill>False</x:AutoFill><x:Row>{}</x:Row><x:Column>{}</x:Column></x:ClientData></v:shape>"##,
            shape_id,
            48.0 + f64::from(col) * 63.0,
            12.0 + f64::from(row) * 15.75,
            k + 1,
            u32::from(col) + 1,
            top,
            u32::from(col) + 3,
            top + 4,
            row,
            col
        ));
    }

    content.push_str("\n</xml>");
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsplit_core::CellComment;

    fn sheet() -> Worksheet {
        let mut sheet = Worksheet::new("Q1");
        sheet
            .set_comment("C4", CellComment::new("Lee", "a < b"))
            .unwrap();
        sheet
            .set_comment("A1", CellComment::new("Dana", "first"))
            .unwrap();
        let mut rich = CellComment::new("Lee", "Bold");
        rich.runs_xml = "<r><rPr><b/></rPr><t>Bold</t></r>".into();
        sheet.set_comment("B2", rich).unwrap();
        sheet
    }

    #[test]
    fn test_comments_xml() {
        let xml = comments_xml(&sheet());

        assert!(xml.contains("<authors><author>Dana</author><author>Lee</author></authors>"));
        assert!(xml.contains(
            r#"<comment ref="A1" authorId="0"><text><t xml:space="preserve">first</t></text></comment>"#
        ));
        assert!(xml.contains(
            r#"<comment ref="B2" authorId="1"><text><r><rPr><b/></rPr><t>Bold</t></r></text></comment>"#
        ));
        assert!(xml.contains("a &lt; b"));

        let a1 = xml.find("ref=\"A1\"").unwrap();
        let c4 = xml.find("ref=\"C4\"").unwrap();
        assert!(a1 < c4);
    }

    #[test]
    fn test_vml_drawing_has_one_note_per_comment() {
        let xml = vml_drawing_xml(&sheet(), 2);

        assert!(xml.contains(r#"<o:idmap v:ext="edit" data="2"/>"#));
        assert_eq!(xml.matches("ObjectType=\"Note\"").count(), 3);
        assert!(xml.contains(r#"id="_x0000_s2049""#));
        assert!(xml.contains("<x:Row>3</x:Row><x:Column>2</x:Column>"));
    }
}
