//! Document property parts (`docProps/core.xml`, `app.xml`, `custom.xml`)

use chrono::{DateTime, SecondsFormat, Utc};

use crate::xml::escape_xml;
use sheetsplit_core::{CustomProperties, CustomValue, DocumentProperties};

/// Format id every custom property carries
const CUSTOM_FMTID: &str = "{D5CDD505-2E9C-101B-9397-08002B2CF9AE}";

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn push_element(content: &mut String, tag: &str, value: Option<&str>) {
    if let Some(value) = value {
        content.push_str(&format!("\n  <{0}>{1}</{0}>", tag, escape_xml(value)));
    }
}

pub(crate) fn core_xml(props: &DocumentProperties) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    );

    push_element(&mut content, "dc:title", props.title.as_deref());
    push_element(&mut content, "dc:subject", props.subject.as_deref());
    push_element(&mut content, "dc:creator", props.creator.as_deref());
    push_element(&mut content, "cp:keywords", props.keywords.as_deref());
    push_element(&mut content, "dc:description", props.description.as_deref());
    push_element(&mut content, "cp:lastModifiedBy", props.last_modified_by.as_deref());
    push_element(&mut content, "cp:revision", props.revision.as_deref());
    push_element(&mut content, "cp:category", props.category.as_deref());
    push_element(&mut content, "cp:contentStatus", props.content_status.as_deref());
    push_element(&mut content, "dc:language", props.language.as_deref());

    if let Some(created) = &props.created {
        content.push_str(&format!(
            "\n  <dcterms:created xsi:type=\"dcterms:W3CDTF\">{}</dcterms:created>",
            timestamp(created)
        ));
    }
    if let Some(modified) = &props.modified {
        content.push_str(&format!(
            "\n  <dcterms:modified xsi:type=\"dcterms:W3CDTF\">{}</dcterms:modified>",
            timestamp(modified)
        ));
    }

    content.push_str("\n</cp:coreProperties>");
    content
}

/// Extended properties; sheet titles are derived from `sheet_names`
pub(crate) fn app_xml(props: &DocumentProperties, sheet_names: &[&str]) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
    );

    push_element(
        &mut content,
        "Application",
        Some(props.application.as_deref().unwrap_or("sheetsplit")),
    );
    content.push_str("\n  <DocSecurity>0</DocSecurity>\n  <ScaleCrop>false</ScaleCrop>");

    content.push_str(&format!(
        "\n  <HeadingPairs><vt:vector size=\"2\" baseType=\"variant\"><vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant><vt:i4>{}</vt:i4></vt:variant></vt:vector></HeadingPairs>",
        sheet_names.len()
    ));
    content.push_str(&format!(
        "\n  <TitlesOfParts><vt:vector size=\"{}\" baseType=\"lpstr\">",
        sheet_names.len()
    ));
    for name in sheet_names {
        content.push_str(&format!("<vt:lpstr>{}</vt:lpstr>", escape_xml(name)));
    }
    content.push_str("</vt:vector></TitlesOfParts>");

    push_element(&mut content, "Manager", props.manager.as_deref());
    push_element(&mut content, "Company", props.company.as_deref());
    content.push_str("\n  <LinksUpToDate>false</LinksUpToDate>\n  <SharedDoc>false</SharedDoc>");
    push_element(&mut content, "HyperlinkBase", props.hyperlink_base.as_deref());
    content.push_str("\n  <HyperlinksChanged>false</HyperlinksChanged>");
    push_element(&mut content, "AppVersion", props.app_version.as_deref());

    content.push_str("\n</Properties>");
    content
}

fn custom_value_xml(value: &CustomValue) -> String {
    match value {
        CustomValue::Text(s) => format!("<vt:lpwstr>{}</vt:lpwstr>", escape_xml(s)),
        CustomValue::Integer(i) => match i32::try_from(*i) {
            Ok(small) => format!("<vt:i4>{}</vt:i4>", small),
            Err(_) => format!("<vt:i8>{}</vt:i8>", i),
        },
        CustomValue::Number(n) => format!("<vt:r8>{}</vt:r8>", n),
        CustomValue::Bool(b) => format!("<vt:bool>{}</vt:bool>", if *b { "true" } else { "false" }),
        CustomValue::DateTime(dt) => format!("<vt:filetime>{}</vt:filetime>", timestamp(dt)),
        CustomValue::Other { kind, raw } if raw.is_empty() => format!("<{}/>", kind),
        CustomValue::Other { kind, raw } => format!("<{0}>{1}</{0}>", kind, escape_xml(raw)),
    }
}

pub(crate) fn custom_xml(custom: &CustomProperties) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
    );

    // pids 0 and 1 are reserved
    for (pid, property) in (2..).zip(custom.iter()) {
        content.push_str(&format!(
            "\n  <property fmtid=\"{}\" pid=\"{}\" name=\"{}\"",
            CUSTOM_FMTID,
            pid,
            escape_xml(&property.name)
        ));
        if let Some(target) = &property.link_target {
            content.push_str(&format!(" linkTarget=\"{}\"", escape_xml(target)));
        }
        content.push('>');
        content.push_str(&custom_value_xml(&property.value));
        content.push_str("</property>");
    }

    content.push_str("\n</Properties>");
    content
}
