//! Package-level plumbing: part access and relationship resolution

use std::io::{Read, Seek};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;

/// Relationship type suffixes the reader resolves
pub(crate) mod rel_type {
    pub const OFFICE_DOCUMENT: &str = "/officeDocument";
    pub const CORE_PROPERTIES: &str = "/core-properties";
    pub const EXTENDED_PROPERTIES: &str = "/extended-properties";
    pub const CUSTOM_PROPERTIES: &str = "/custom-properties";
    pub const WORKSHEET: &str = "/worksheet";
    pub const CHARTSHEET: &str = "/chartsheet";
    pub const STYLES: &str = "/styles";
    pub const THEME: &str = "/theme";
    pub const SHARED_STRINGS: &str = "/sharedStrings";
    pub const TABLE: &str = "/table";
    pub const HYPERLINK: &str = "/hyperlink";
    pub const COMMENTS: &str = "/comments";
}

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    pub fn is(&self, suffix: &str) -> bool {
        self.rel_type.ends_with(suffix)
    }
}

/// Read a part as UTF-8 text. Missing parts are `None`.
pub(crate) fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
) -> XlsxResult<Option<String>> {
    let mut file = match archive.by_name(path) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::with_capacity(file.size() as usize);
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Parse a relationships part
pub(crate) fn parse_relationships(xml: &str) -> XlsxResult<Vec<Relationship>> {
    let mut xml_reader = Reader::from_str(xml);
    xml_reader.trim_text(true);

    let mut rels = Vec::new();

    loop {
        match xml_reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;
                let mut external = false;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"Target" => target = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"Type" => rel_type = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"TargetMode" => {
                            external = attr.value.as_ref() == b"External";
                        }
                        _ => {}
                    }
                }

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Read and parse the relationships of `part`. A part without a
/// relationships part has no relationships.
pub(crate) fn read_relationships<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    part: &str,
) -> XlsxResult<Vec<Relationship>> {
    match read_part(archive, &rels_path_for(part))? {
        Some(xml) => parse_relationships(&xml),
        None => Ok(Vec::new()),
    }
}

/// `xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship.
///
/// Absolute targets start at the package root; relative targets are resolved
/// against the owning part's directory, honoring `..` segments.
pub(crate) fn resolve_target(owner: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match owner.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(
            rels_path_for("xl/worksheets/sheet2.xml"),
            "xl/worksheets/_rels/sheet2.xml.rels"
        );
        assert_eq!(rels_path_for(""), "_rels/.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../tables/table1.xml"),
            "xl/tables/table1.xml"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "/xl/styles.xml"),
            "xl/styles.xml"
        );
        assert_eq!(resolve_target("", "xl/workbook.xml"), "xl/workbook.xml");
    }

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert!(rels[0].is(rel_type::WORKSHEET));
        assert_eq!(rels[0].target, "worksheets/sheet1.xml");
        assert!(!rels[0].external);
        assert!(rels[1].external);
    }
}
