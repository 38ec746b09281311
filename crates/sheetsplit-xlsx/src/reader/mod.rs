//! XLSX reader

pub(crate) mod comments;
pub(crate) mod package;
pub(crate) mod properties;
pub(crate) mod shared_strings;
pub(crate) mod table;
pub(crate) mod workbook;
pub(crate) mod worksheet;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::options::ReadOptions;
use crate::styles::read_styles_xml;
use package::{read_part, read_relationships, rel_type, resolve_target, Relationship};
use sheetsplit_core::{
    DocumentProperties, NameScope, NamedRange, StyleSheet, Theme, Workbook, Worksheet,
};
use worksheet::{read_worksheet_xml, SheetContext, SheetRelRefs};

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from a reader, retaining everything the reader understands
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        Self::read_with(reader, &ReadOptions::default())
    }

    /// Read a workbook from a reader
    pub fn read_with<R: Read + Seek>(reader: R, options: &ReadOptions) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let root_rels = read_relationships(&mut archive, "")?;
        let workbook_path = find_target(&root_rels, "", rel_type::OFFICE_DOCUMENT)
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());

        let workbook_xml = read_part(&mut archive, &workbook_path)?
            .ok_or_else(|| XlsxError::MissingPart(workbook_path.clone()))?;
        let part = workbook::read_workbook_xml(&workbook_xml)?;
        let workbook_rels = read_relationships(&mut archive, &workbook_path)?;

        let mut workbook = Workbook::empty();

        // Shared resources
        let shared_strings = match find_target(&workbook_rels, &workbook_path, rel_type::SHARED_STRINGS) {
            Some(path) => match read_part(&mut archive, &path)? {
                Some(xml) => shared_strings::read_shared_strings(&xml)?,
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        log::debug!("Read {} shared strings", shared_strings.len());

        if options.cell_styles || options.number_formats {
            if let Some(path) = find_target(&workbook_rels, &workbook_path, rel_type::STYLES) {
                if let Some(xml) = read_part(&mut archive, &path)? {
                    let parsed = read_styles_xml(&xml)?;
                    if options.number_formats && !parsed.number_formats.is_empty() {
                        workbook.set_number_formats(Some(Arc::new(parsed.number_formats)));
                    }
                    if options.cell_styles {
                        workbook.set_styles(Some(Arc::new(StyleSheet::new(
                            xml,
                            parsed.cell_xfs_count,
                            parsed.dxf_count,
                        ))));
                    }
                }
            }
        }

        if options.cell_styles {
            if let Some(path) = find_target(&workbook_rels, &workbook_path, rel_type::THEME) {
                if let Some(xml) = read_part(&mut archive, &path)? {
                    let name = theme_name(&xml);
                    workbook.set_theme(Some(Arc::new(Theme::new(name, xml))));
                }
            }
        }

        // Worksheets, remembering where each source sheet landed
        let ctx = SheetContext {
            shared_strings: &shared_strings,
            options,
            date_1904: part.settings.date_1904,
        };
        let mut sheet_positions: Vec<Option<usize>> = Vec::with_capacity(part.sheets.len());

        for entry in &part.sheets {
            let rel = workbook_rels
                .iter()
                .find(|r| r.id == entry.r_id)
                .ok_or_else(|| {
                    XlsxError::MissingPart(format!(
                        "relationship {} for sheet '{}'",
                        entry.r_id, entry.name
                    ))
                })?;

            if rel.is(rel_type::CHARTSHEET) {
                log::warn!("Skipping chartsheet '{}'", entry.name);
                sheet_positions.push(None);
                continue;
            }
            if !rel.is(rel_type::WORKSHEET) {
                log::debug!("Skipping sheet '{}' of type {}", entry.name, rel.rel_type);
                sheet_positions.push(None);
                continue;
            }

            let path = resolve_target(&workbook_path, &rel.target);
            let xml = read_part(&mut archive, &path)?
                .ok_or_else(|| XlsxError::MissingPart(path.clone()))?;

            let mut worksheet = Worksheet::new(entry.name.as_str());
            worksheet.set_state(entry.state);
            let refs = read_worksheet_xml(&xml, &ctx, &mut worksheet)?;
            if options.structure {
                Self::read_sheet_parts(&mut archive, &path, &refs, &mut worksheet)?;
            }

            log::debug!(
                "Read sheet '{}': {} cells, {} tables, {} comments",
                entry.name,
                worksheet.cell_count(),
                worksheet.table_count(),
                worksheet.comment_count()
            );
            sheet_positions.push(Some(workbook.add_existing_worksheet(worksheet)?));
        }

        // Defined names, re-scoped to the sheets actually read
        for entry in part.defined_names {
            let scope = match entry.local_sheet_id {
                None => NameScope::Workbook,
                Some(source) => match sheet_positions.get(source).copied().flatten() {
                    Some(index) => NameScope::Sheet(index),
                    None => {
                        log::debug!("Dropping name '{}' scoped to a skipped sheet", entry.name);
                        continue;
                    }
                },
            };
            let mut range = NamedRange::new(entry.name, entry.refers_to, scope);
            range.comment = entry.comment;
            range.hidden = entry.hidden;
            if let Err(e) = workbook.define_name(range) {
                log::warn!("Skipping defined name: {}", e);
            }
        }

        *workbook.settings_mut() = part.settings;
        workbook.set_views(part.views);
        workbook.set_calculation(part.calculation);

        Self::read_properties(&mut archive, &root_rels, &mut workbook)?;

        Ok(workbook)
    }

    /// Read what a worksheet reaches through its relationships: table parts,
    /// hyperlink targets and the comments part
    fn read_sheet_parts<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        sheet_path: &str,
        refs: &SheetRelRefs,
        worksheet: &mut Worksheet,
    ) -> XlsxResult<()> {
        let sheet_rels = read_relationships(archive, sheet_path)?;
        if sheet_rels.is_empty() {
            if !refs.is_empty() {
                log::warn!("No relationships found for {}", sheet_path);
            }
            return Ok(());
        }

        Self::read_tables(archive, sheet_path, &sheet_rels, &refs.tables, worksheet)?;

        for (index, rel_id) in &refs.hyperlinks {
            let target = sheet_rels
                .iter()
                .find(|r| &r.id == rel_id && r.is(rel_type::HYPERLINK))
                .map(|r| r.target.clone());
            match (target, worksheet.hyperlink_mut(*index)) {
                (Some(target), Some(link)) => link.target = Some(target),
                _ => log::warn!("Hyperlink relationship {} not found for {}", rel_id, sheet_path),
            }
        }

        if let Some(path) = find_target(&sheet_rels, sheet_path, rel_type::COMMENTS) {
            match read_part(archive, &path)? {
                Some(xml) => comments::read_comments_xml(&xml, worksheet)?,
                None => log::warn!("Missing comments part {}", path),
            }
        }

        Ok(())
    }

    /// Read the table parts referenced by a worksheet
    fn read_tables<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        sheet_path: &str,
        sheet_rels: &[Relationship],
        rel_ids: &[String],
        worksheet: &mut Worksheet,
    ) -> XlsxResult<()> {
        for rel_id in rel_ids {
            let Some(rel) = sheet_rels
                .iter()
                .find(|r| &r.id == rel_id && r.is(rel_type::TABLE))
            else {
                log::warn!("Table relationship {} not found for {}", rel_id, sheet_path);
                continue;
            };

            let path = resolve_target(sheet_path, &rel.target);
            let Some(xml) = read_part(archive, &path)? else {
                log::warn!("Missing table part {}", path);
                continue;
            };

            let table = table::read_table_xml(&xml)?;
            if let Err(e) = worksheet.add_table(table) {
                log::warn!("Skipping table in {}: {}", sheet_path, e);
            }
        }

        Ok(())
    }

    /// Read core, extended and custom document properties
    fn read_properties<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        root_rels: &[Relationship],
        workbook: &mut Workbook,
    ) -> XlsxResult<()> {
        let mut props = DocumentProperties::default();
        let mut found = false;

        if let Some(path) = find_target(root_rels, "", rel_type::CORE_PROPERTIES) {
            if let Some(xml) = read_part(archive, &path)? {
                properties::read_core_properties(&xml, &mut props)?;
                found = true;
            }
        }
        if let Some(path) = find_target(root_rels, "", rel_type::EXTENDED_PROPERTIES) {
            if let Some(xml) = read_part(archive, &path)? {
                properties::read_app_properties(&xml, &mut props)?;
                found = true;
            }
        }
        if found {
            workbook.set_properties(Some(props));
        }

        if let Some(path) = find_target(root_rels, "", rel_type::CUSTOM_PROPERTIES) {
            if let Some(xml) = read_part(archive, &path)? {
                workbook.set_custom_properties(Some(properties::read_custom_properties(&xml)?));
            }
        }

        Ok(())
    }
}

/// Resolved path of the first internal relationship of a type
fn find_target(rels: &[Relationship], owner: &str, suffix: &str) -> Option<String> {
    rels.iter()
        .find(|r| r.is(suffix) && !r.external)
        .map(|r| resolve_target(owner, &r.target))
}

/// The `name` attribute of the theme's root element
fn theme_name(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"name")
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsplit_core::{CellRange, CellValue, SheetState};
    use std::io::{Cursor, Write};

    const CONTENT_TYPES: &str = r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#;
    const ROOT_RELS: &str = r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

    fn build_package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in parts {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_read_minimal_xlsx() {
        let buf = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
            ("xl/_rels/workbook.xml.rels", r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#),
            ("xl/worksheets/sheet1.xml", r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData></sheetData></worksheet>"#),
        ]);

        let workbook = XlsxReader::read(Cursor::new(buf)).unwrap();

        assert_eq!(workbook.sheet_count(), 1);
        assert_eq!(workbook.worksheet(0).unwrap().name(), "Sheet1");
        assert!(workbook.worksheet(0).unwrap().used_range().is_none());
        assert!(workbook.styles().is_none());
        assert!(workbook.theme().is_none());
        // core.xml is referenced but absent
        assert!(workbook.properties().is_none());
    }

    #[test]
    fn test_missing_content_types_is_invalid() {
        let buf = build_package(&[("_rels/.rels", ROOT_RELS)]);
        match XlsxReader::read(Cursor::new(buf)) {
            Err(XlsxError::InvalidFormat(_)) => {}
            other => panic!("expected InvalidFormat, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_not_a_zip() {
        let result = XlsxReader::read(Cursor::new(b"definitely not a zip".to_vec()));
        assert!(matches!(result, Err(XlsxError::Zip(_))));
    }

    #[test]
    fn test_missing_worksheet_part() {
        let buf = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", r#"<workbook xmlns:r="r"><sheets><sheet name="A" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
            ("xl/_rels/workbook.xml.rels", r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#),
        ]);
        assert!(matches!(
            XlsxReader::read(Cursor::new(buf)),
            Err(XlsxError::MissingPart(_))
        ));
    }

    #[test]
    fn test_full_package() {
        let buf = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("docProps/core.xml", r#"<cp:coreProperties xmlns:cp="cp" xmlns:dc="dc"><dc:title>Report</dc:title></cp:coreProperties>"#),
            ("xl/workbook.xml", r#"<workbook xmlns:r="r">
                <sheets>
                  <sheet name="Chart" sheetId="1" r:id="rId9"/>
                  <sheet name="Data" sheetId="2" state="hidden" r:id="rId1"/>
                </sheets>
                <definedNames>
                  <definedName name="OnChart" localSheetId="0">Chart!$A$1</definedName>
                  <definedName name="Local" localSheetId="1">Data!$A$1</definedName>
                  <definedName name="Global">Data!$A$1:$B$2</definedName>
                </definedNames>
              </workbook>"#),
            ("xl/_rels/workbook.xml.rels", r#"<Relationships>
                <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet1.xml"/>
                <Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartsheet" Target="chartsheets/sheet1.xml"/>
                <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
                <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
                <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>
              </Relationships>"#),
            ("xl/sharedStrings.xml", r#"<sst><si><t>Region</t></si><si><t>Amount</t></si></sst>"#),
            ("xl/styles.xml", r#"<styleSheet><numFmts count="1"><numFmt numFmtId="164" formatCode="0.0%"/></numFmts><cellXfs count="2"><xf/><xf numFmtId="164"/></cellXfs></styleSheet>"#),
            ("xl/theme/theme1.xml", r#"<a:theme xmlns:a="a" name="Office Theme"><a:themeElements/></a:theme>"#),
            ("xl/worksheets/sheet1.xml", r#"<worksheet xmlns:r="r"><sheetData>
                <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
                <row r="2"><c r="A2" t="inlineStr"><is><t>North</t></is></c><c r="B2" s="1"><v>0.25</v></c></row>
              </sheetData><tableParts count="1"><tablePart r:id="rId1"/></tableParts></worksheet>"#),
            ("xl/worksheets/_rels/sheet1.xml.rels", r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/table" Target="../tables/table1.xml"/></Relationships>"#),
            ("xl/tables/table1.xml", r#"<table id="1" name="Sales" displayName="Sales" ref="A1:B2"><tableColumns count="2"><tableColumn id="1" name="Region"/><tableColumn id="2" name="Amount"/></tableColumns></table>"#),
        ]);

        let workbook = XlsxReader::read(Cursor::new(buf)).unwrap();

        assert_eq!(workbook.sheet_names(), vec!["Data"]);
        let sheet = workbook.worksheet(0).unwrap();
        assert_eq!(sheet.state(), SheetState::Hidden);
        assert_eq!(sheet.get_value_at(0, 1), CellValue::string("Amount"));
        assert_eq!(sheet.get_value_at(1, 0), CellValue::string("North"));
        assert_eq!(sheet.cell_style_index_at(1, 1), 1);
        assert_eq!(sheet.tables().len(), 1);
        assert_eq!(sheet.tables()[0].range, CellRange::parse("A1:B2").unwrap());

        let names: Vec<_> = workbook.named_ranges().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Local", "Global"]);
        assert_eq!(
            workbook.named_ranges().get_exact("Local", NameScope::Sheet(0)).unwrap().refers_to,
            "Data!$A$1"
        );

        assert_eq!(workbook.styles().unwrap().cell_xfs_count, 2);
        assert_eq!(workbook.number_formats().unwrap().len(), 1);
        assert_eq!(workbook.theme().unwrap().name.as_deref(), Some("Office Theme"));
        assert_eq!(
            workbook.properties().unwrap().title.as_deref(),
            Some("Report")
        );
        assert!(workbook.custom_properties().is_none());
    }

    #[test]
    fn test_comments_and_hyperlinks_through_sheet_rels() {
        let buf = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", r#"<workbook xmlns:r="r"><sheets><sheet name="Q1" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
            ("xl/_rels/workbook.xml.rels", r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#),
            ("xl/worksheets/sheet1.xml", r#"<worksheet xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Docs</t></is></c></row></sheetData>
                <hyperlinks><hyperlink ref="A1" r:id="rId1"/><hyperlink ref="A2" r:id="rId7" display="Broken"/></hyperlinks>
                <legacyDrawing r:id="rId3"/></worksheet>"#),
            ("xl/worksheets/_rels/sheet1.xml.rels", r#"<Relationships>
                <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/docs?a=1&amp;b=2" TargetMode="External"/>
                <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments1.xml"/>
                <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing" Target="../drawings/vmlDrawing1.vml"/>
              </Relationships>"#),
            ("xl/comments1.xml", r#"<comments><authors><author>Dana</author></authors><commentList><comment ref="A1" authorId="0"><text><t>Source of the numbers</t></text></comment></commentList></comments>"#),
        ]);

        let workbook = XlsxReader::read(Cursor::new(buf)).unwrap();
        let sheet = workbook.worksheet(0).unwrap();

        assert_eq!(sheet.hyperlinks().len(), 2);
        assert_eq!(
            sheet.hyperlinks()[0].target.as_deref(),
            Some("https://example.com/docs?a=1&b=2")
        );
        // unresolvable relationship keeps the link without a target
        assert_eq!(sheet.hyperlinks()[1].target, None);
        assert_eq!(sheet.hyperlinks()[1].display.as_deref(), Some("Broken"));

        let comment = sheet.comment("A1").unwrap().unwrap();
        assert_eq!(comment.author, "Dana");
        assert_eq!(comment.text, "Source of the numbers");
    }
}
