//! Document property parts (`docProps/core.xml`, `app.xml`, `custom.xml`)

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::parse_bool;
use sheetsplit_core::{CustomProperties, CustomProperty, CustomValue, DocumentProperties};

/// Collect `(local name, text)` for every element that directly holds text
fn leaf_texts(xml: &str) -> XlsxResult<Vec<(String, String)>> {
    let mut xml_reader = Reader::from_str(xml);
    let mut leaves = Vec::new();
    let mut current: Option<(String, String)> = None;

    loop {
        match xml_reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                current = Some((name, String::new()));
            }
            Event::Text(e) => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => {
                if let Some((name, text)) = current.take() {
                    if name.as_bytes() == e.local_name().as_ref() {
                        leaves.push((name, text));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(leaves)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s.trim()) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            log::warn!("Ignoring unparseable document timestamp {:?}: {}", s, e);
            None
        }
    }
}

/// Merge the core properties into `props`
pub(crate) fn read_core_properties(xml: &str, props: &mut DocumentProperties) -> XlsxResult<()> {
    for (name, text) in leaf_texts(xml)? {
        let slot = match name.as_str() {
            "title" => &mut props.title,
            "subject" => &mut props.subject,
            "creator" => &mut props.creator,
            "keywords" => &mut props.keywords,
            "description" => &mut props.description,
            "lastModifiedBy" => &mut props.last_modified_by,
            "category" => &mut props.category,
            "contentStatus" => &mut props.content_status,
            "language" => &mut props.language,
            "revision" => &mut props.revision,
            "created" => {
                props.created = parse_datetime(&text);
                continue;
            }
            "modified" => {
                props.modified = parse_datetime(&text);
                continue;
            }
            _ => continue,
        };
        *slot = Some(text);
    }
    Ok(())
}

/// Merge the extended (application) properties into `props`
///
/// Sheet titles and heading pairs are not kept; the writer derives them.
pub(crate) fn read_app_properties(xml: &str, props: &mut DocumentProperties) -> XlsxResult<()> {
    for (name, text) in leaf_texts(xml)? {
        match name.as_str() {
            "Application" => props.application = Some(text),
            "AppVersion" => props.app_version = Some(text),
            "Company" => props.company = Some(text),
            "Manager" => props.manager = Some(text),
            "HyperlinkBase" => props.hyperlink_base = Some(text),
            _ => {}
        }
    }
    Ok(())
}

fn custom_value(kind: &str, raw: String) -> CustomValue {
    let local = kind.rsplit(':').next().unwrap_or(kind);
    let parsed = match local {
        "lpwstr" | "lpstr" | "bstr" => Some(CustomValue::Text(raw.clone())),
        "i1" | "i2" | "i4" | "i8" | "int" | "ui1" | "ui2" | "ui4" | "ui8" | "uint" => {
            raw.trim().parse().ok().map(CustomValue::Integer)
        }
        "r4" | "r8" | "decimal" => raw.trim().parse().ok().map(CustomValue::Number),
        "bool" => Some(CustomValue::Bool(parse_bool(raw.trim()))),
        "filetime" | "date" => DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| CustomValue::DateTime(dt.with_timezone(&Utc))),
        _ => None,
    };
    parsed.unwrap_or(CustomValue::Other {
        kind: kind.to_string(),
        raw,
    })
}

pub(crate) fn read_custom_properties(xml: &str) -> XlsxResult<CustomProperties> {
    let mut xml_reader = Reader::from_str(xml);
    let mut properties = CustomProperties::new();

    let mut current: Option<(String, Option<String>)> = None;
    let mut value: Option<(String, String)> = None;

    loop {
        match xml_reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"property" => {
                let mut name = None;
                let mut link_target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"linkTarget" => {
                            link_target = attr.unescape_value().ok().map(|s| s.to_string())
                        }
                        _ => {}
                    }
                }
                current = name.map(|n| (n, link_target));
            }
            Event::Start(e) if current.is_some() => {
                let kind = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                value = Some((kind, String::new()));
            }
            Event::Empty(e) if current.is_some() => {
                let kind = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                value = Some((kind, String::new()));
            }
            Event::Text(e) => {
                if let Some((_, raw)) = value.as_mut() {
                    raw.push_str(&e.unescape()?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"property" => {
                match (current.take(), value.take()) {
                    (Some((name, link_target)), Some((kind, raw))) => {
                        let mut property = CustomProperty::new(name, custom_value(&kind, raw));
                        property.link_target = link_target;
                        properties.set(property);
                    }
                    (Some((name, _)), None) => {
                        log::warn!("Ignoring custom property {:?} without a value", name)
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_read_core_and_app_properties() {
        let core = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>Quarterly &amp; Annual</dc:title>
  <dc:creator>Finance</dc:creator>
  <cp:lastModifiedBy>Analyst</cp:lastModifiedBy>
  <dcterms:created xsi:type="dcterms:W3CDTF">2024-01-15T09:30:00Z</dcterms:created>
  <dcterms:modified xsi:type="dcterms:W3CDTF">not a date</dcterms:modified>
</cp:coreProperties>"#;
        let app = r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <Application>Microsoft Excel</Application>
  <TitlesOfParts><vt:vector size="1" baseType="lpstr"><vt:lpstr>Sheet1</vt:lpstr></vt:vector></TitlesOfParts>
  <Company>Acme</Company>
</Properties>"#;

        let mut props = DocumentProperties::default();
        read_core_properties(core, &mut props).unwrap();
        read_app_properties(app, &mut props).unwrap();

        assert_eq!(props.title.as_deref(), Some("Quarterly & Annual"));
        assert_eq!(props.creator.as_deref(), Some("Finance"));
        assert_eq!(props.last_modified_by.as_deref(), Some("Analyst"));
        assert_eq!(
            props.created,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap())
        );
        assert_eq!(props.modified, None);
        assert_eq!(props.application.as_deref(), Some("Microsoft Excel"));
        assert_eq!(props.company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_read_custom_properties() {
        let xml = r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="2" name="Department"><vt:lpwstr>Finance</vt:lpwstr></property>
  <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="3" name="Year"><vt:i4>2024</vt:i4></property>
  <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="4" name="Approved"><vt:bool>true</vt:bool></property>
  <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="5" name="Budget"><vt:cy>1000.5000</vt:cy></property>
</Properties>"#;

        let props = read_custom_properties(xml).unwrap();
        assert_eq!(props.len(), 4);
        assert_eq!(
            props.get("Department").unwrap().value,
            CustomValue::Text("Finance".into())
        );
        assert_eq!(props.get("year").unwrap().value, CustomValue::Integer(2024));
        assert_eq!(props.get("Approved").unwrap().value, CustomValue::Bool(true));
        assert_eq!(
            props.get("Budget").unwrap().value,
            CustomValue::Other {
                kind: "vt:cy".into(),
                raw: "1000.5000".into()
            }
        );
    }
}
