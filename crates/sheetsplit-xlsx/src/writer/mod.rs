//! XLSX writer

mod comments;
mod properties;
mod shared_strings;
mod table;
mod worksheet;

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use ahash::AHashSet;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{XlsxError, XlsxResult};
use crate::options::WriteOptions;
use crate::styles::default_styles_xml;
use crate::xml::{bool_attr, escape_xml};
use shared_strings::SharedStringTable;
use worksheet::SheetRelIds;
use sheetsplit_core::{NameScope, SheetState, StyleSheet, Workbook};

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Decides which style references survive serialization.
///
/// Without a retained style sheet every reference is dropped, since the
/// generated default sheet only defines format 0.
pub(crate) struct StyleFilter<'a> {
    styles: Option<&'a StyleSheet>,
}

impl<'a> StyleFilter<'a> {
    pub(crate) fn new(styles: Option<&'a StyleSheet>) -> Self {
        Self { styles }
    }

    /// Row/column style references
    pub(crate) fn keeps_xf(&self, index: u32) -> bool {
        self.styles.map_or(false, |s| s.has_cell_xf(index))
    }

    /// Cell style attribute; the default format is implied
    pub(crate) fn cell_xf(&self, index: u32) -> Option<u32> {
        (index != 0 && self.keeps_xf(index)).then_some(index)
    }

    pub(crate) fn keeps_dxf(&self, id: u32) -> bool {
        self.styles.map_or(false, |s| id < s.dxf_count)
    }
}

/// A worksheet relationship; its id is `rId` plus its 1-based position
struct SheetRel {
    kind: &'static str,
    target: String,
    external: bool,
}

/// A worksheet rendered to XML together with the parts it refers to
struct RenderedSheet {
    xml: String,
    /// `(table part number, xml)`
    tables: Vec<(usize, String)>,
    /// `(comments part, note drawing)`
    comments: Option<(String, String)>,
    rels: Vec<SheetRel>,
}

/// Add a relationship and return its id
fn push_rel(rels: &mut Vec<SheetRel>, kind: &'static str, target: String, external: bool) -> String {
    rels.push(SheetRel {
        kind,
        target,
        external,
    });
    format!("rId{}", rels.len())
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, BufWriter::new(file))
    }

    /// Write a workbook to a writer with default options
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        Self::write_with(workbook, writer, &WriteOptions::default())
    }

    /// Serialize a workbook into an in-memory package
    pub fn write_to_vec(workbook: &Workbook, options: &WriteOptions) -> XlsxResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        Self::write_with(workbook, &mut cursor, options)?;
        Ok(cursor.into_inner())
    }

    /// Write a workbook to a writer
    pub fn write_with<W: Write + Seek>(
        workbook: &Workbook,
        writer: W,
        options: &WriteOptions,
    ) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "a workbook needs at least one worksheet".to_string(),
            ));
        }

        let retained_styles = if options.cell_styles {
            workbook.styles().map(Arc::as_ref)
        } else {
            None
        };
        let filter = StyleFilter::new(retained_styles);

        // Render sheets first so the shared string table is complete
        let mut sst = SharedStringTable::new();
        let sheets = Self::render_sheets(workbook, &filter, &mut sst);

        let file_options = options.file_options();
        let mut zip = ZipWriter::new(writer);

        Self::write_content_types(&mut zip, file_options, workbook, &sheets, &sst)?;
        Self::write_root_rels(&mut zip, file_options, workbook)?;
        Self::write_workbook_xml(&mut zip, file_options, workbook)?;
        Self::write_workbook_rels(&mut zip, file_options, workbook, &sst)?;

        let styles_xml = match retained_styles {
            Some(styles) => styles.xml.clone(),
            None => default_styles_xml(if options.number_formats {
                workbook.number_formats().map(Arc::as_ref)
            } else {
                None
            }),
        };
        write_part(&mut zip, file_options, "xl/styles.xml", &styles_xml)?;

        if let Some(theme) = workbook.theme() {
            write_part(&mut zip, file_options, "xl/theme/theme1.xml", &theme.xml)?;
        }
        if !sst.is_empty() {
            log::debug!("Writing {} shared strings", sst.len());
            write_part(&mut zip, file_options, "xl/sharedStrings.xml", &sst.to_xml())?;
        }

        for (i, sheet) in sheets.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", i + 1);
            write_part(&mut zip, file_options, &path, &sheet.xml)?;

            if !sheet.rels.is_empty() {
                Self::write_worksheet_rels(&mut zip, file_options, i, sheet)?;
            }
            for (number, xml) in &sheet.tables {
                let path = format!("xl/tables/table{}.xml", number);
                write_part(&mut zip, file_options, &path, xml)?;
            }
            if let Some((comments_xml, vml_xml)) = &sheet.comments {
                let path = format!("xl/comments{}.xml", i + 1);
                write_part(&mut zip, file_options, &path, comments_xml)?;
                let path = format!("xl/drawings/vmlDrawing{}.vml", i + 1);
                write_part(&mut zip, file_options, &path, vml_xml)?;
            }
        }

        if let Some(props) = workbook.properties() {
            write_part(
                &mut zip,
                file_options,
                "docProps/core.xml",
                &properties::core_xml(props),
            )?;
            write_part(
                &mut zip,
                file_options,
                "docProps/app.xml",
                &properties::app_xml(props, &workbook.sheet_names()),
            )?;
        }
        if let Some(custom) = workbook.custom_properties().filter(|c| !c.is_empty()) {
            write_part(
                &mut zip,
                file_options,
                "docProps/custom.xml",
                &properties::custom_xml(custom),
            )?;
        }

        zip.finish()?;
        Ok(())
    }

    fn render_sheets(
        workbook: &Workbook,
        filter: &StyleFilter<'_>,
        sst: &mut SharedStringTable,
    ) -> Vec<RenderedSheet> {
        let table_ids = assign_table_ids(workbook);
        let mut part_number = 0;

        workbook
            .worksheets()
            .zip(table_ids)
            .enumerate()
            .map(|(i, (sheet, ids))| {
                let mut rels = Vec::new();
                let mut rel_ids = SheetRelIds::default();

                let mut tables = Vec::with_capacity(ids.len());
                for (table, id) in sheet.tables().iter().zip(ids) {
                    part_number += 1;
                    let xml = table::table_xml(table, id, |dxf| filter.keeps_dxf(dxf));
                    tables.push((part_number, xml));
                    let target = format!("../tables/table{}.xml", part_number);
                    rel_ids.tables.push(push_rel(&mut rels, "table", target, false));
                }

                for link in sheet.hyperlinks() {
                    let id = link
                        .target
                        .as_ref()
                        .map(|target| push_rel(&mut rels, "hyperlink", target.clone(), true));
                    rel_ids.hyperlinks.push(id);
                }

                let mut notes = None;
                if sheet.comment_count() > 0 {
                    let target = format!("../comments{}.xml", i + 1);
                    push_rel(&mut rels, "comments", target, false);
                    let target = format!("../drawings/vmlDrawing{}.vml", i + 1);
                    rel_ids.legacy_drawing = Some(push_rel(&mut rels, "vmlDrawing", target, false));
                    notes = Some((
                        comments::comments_xml(sheet),
                        comments::vml_drawing_xml(sheet, i + 1),
                    ));
                }

                let xml = worksheet::worksheet_xml(sheet, filter, sst, &rel_ids);
                RenderedSheet {
                    xml,
                    tables,
                    comments: notes,
                    rels,
                }
            })
            .collect()
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
        workbook: &Workbook,
        sheets: &[RenderedSheet],
        sst: &SharedStringTable,
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>"#,
        );
        if sheets.iter().any(|s| s.comments.is_some()) {
            content.push_str(
                r#"
    <Default Extension="vml" ContentType="application/vnd.openxmlformats-officedocument.vmlDrawing"/>"#,
            );
        }
        content.push_str(
            r#"
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        if workbook.theme().is_some() {
            content.push_str(
                r#"
    <Override PartName="/xl/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            );
        }
        if !sst.is_empty() {
            content.push_str(
                r#"
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
            );
        }

        for (i, sheet) in sheets.iter().enumerate() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
            for (number, _) in &sheet.tables {
                content.push_str(&format!(
                    r#"
    <Override PartName="/xl/tables/table{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml"/>"#,
                    number
                ));
            }
            if sheet.comments.is_some() {
                content.push_str(&format!(
                    r#"
    <Override PartName="/xl/comments{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml"/>"#,
                    i + 1
                ));
            }
        }

        if workbook.properties().is_some() {
            content.push_str(
                r#"
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
            );
        }
        if workbook.custom_properties().map_or(false, |c| !c.is_empty()) {
            content.push_str(
                r#"
    <Override PartName="/docProps/custom.xml" ContentType="application/vnd.openxmlformats-officedocument.custom-properties+xml"/>"#,
            );
        }

        content.push_str("\n</Types>");
        write_part(zip, options, "[Content_Types].xml", &content)
    }

    fn write_root_rels<W: Write + Seek>(
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">
    <Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/>"#,
            PKG_REL_NS, REL_NS
        );

        if workbook.properties().is_some() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId2" Type="{}/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="{}/extended-properties" Target="docProps/app.xml"/>"#,
                PKG_REL_NS, REL_NS
            ));
        }
        if workbook.custom_properties().map_or(false, |c| !c.is_empty()) {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId4" Type="{}/custom-properties" Target="docProps/custom.xml"/>"#,
                REL_NS
            ));
        }

        content.push_str("\n</Relationships>");
        write_part(zip, options, "_rels/.rels", &content)
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{}">"#,
            REL_NS
        );

        let settings = workbook.settings();
        content.push_str("\n    <workbookPr");
        if settings.date_1904 {
            content.push_str(" date1904=\"1\"");
        }
        if let Some(code_name) = &settings.code_name {
            content.push_str(&format!(" codeName=\"{}\"", escape_xml(code_name)));
        }
        if let Some(version) = settings.default_theme_version {
            content.push_str(&format!(" defaultThemeVersion=\"{}\"", version));
        }
        content.push_str("/>");

        if let Some(protection) = &settings.protection {
            content.push_str("\n    <workbookProtection");
            let text_attrs = [
                ("workbookPassword", protection.password.as_deref()),
                ("workbookAlgorithmName", protection.algorithm_name.as_deref()),
                ("workbookHashValue", protection.hash_value.as_deref()),
                ("workbookSaltValue", protection.salt_value.as_deref()),
            ];
            for (name, value) in text_attrs {
                if let Some(value) = value {
                    content.push_str(&format!(" {}=\"{}\"", name, escape_xml(value)));
                }
            }
            if let Some(spin) = protection.spin_count {
                content.push_str(&format!(" workbookSpinCount=\"{}\"", spin));
            }
            if protection.lock_structure {
                content.push_str(" lockStructure=\"1\"");
            }
            if protection.lock_windows {
                content.push_str(" lockWindows=\"1\"");
            }
            content.push_str("/>");
        }

        let last_sheet = workbook.sheet_count() - 1;
        if !workbook.views().is_empty() {
            content.push_str("\n    <bookViews>");
            for view in workbook.views() {
                content.push_str("\n        <workbookView");
                let numeric = [
                    ("xWindow", view.x_window.map(i64::from)),
                    ("yWindow", view.y_window.map(i64::from)),
                    ("windowWidth", view.window_width.map(i64::from)),
                    ("windowHeight", view.window_height.map(i64::from)),
                    ("tabRatio", view.tab_ratio.map(i64::from)),
                ];
                for (name, value) in numeric {
                    if let Some(value) = value {
                        content.push_str(&format!(" {}=\"{}\"", name, value));
                    }
                }
                let first_sheet = view.first_sheet.min(last_sheet);
                let active_tab = view.active_tab.min(last_sheet);
                if first_sheet > 0 {
                    content.push_str(&format!(" firstSheet=\"{}\"", first_sheet));
                }
                if active_tab > 0 {
                    content.push_str(&format!(" activeTab=\"{}\"", active_tab));
                }
                push_extra_attributes(&mut content, &view.extra_attributes);
                content.push_str("/>");
            }
            content.push_str("\n    </bookViews>");
        }

        content.push_str("\n    <sheets>");
        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                "\n        <sheet name=\"{}\" sheetId=\"{}\"",
                escape_xml(sheet.name()),
                i + 1
            ));
            if sheet.state() != SheetState::Visible {
                content.push_str(&format!(" state=\"{}\"", sheet.state().as_str()));
            }
            content.push_str(&format!(" r:id=\"rId{}\"/>", i + 1));
        }
        content.push_str("\n    </sheets>");

        let names = workbook.named_ranges();
        if !names.is_empty() {
            content.push_str("\n    <definedNames>");
            for name in names.iter() {
                let local_sheet = match name.scope {
                    NameScope::Workbook => None,
                    NameScope::Sheet(idx) if idx <= last_sheet => Some(idx),
                    NameScope::Sheet(idx) => {
                        log::warn!(
                            "Dropping defined name '{}' scoped to missing sheet {}",
                            name.name,
                            idx
                        );
                        continue;
                    }
                };

                content.push_str(&format!(
                    "\n        <definedName name=\"{}\"",
                    escape_xml(&name.name)
                ));
                if let Some(comment) = &name.comment {
                    content.push_str(&format!(" comment=\"{}\"", escape_xml(comment)));
                }
                if let Some(idx) = local_sheet {
                    content.push_str(&format!(" localSheetId=\"{}\"", idx));
                }
                if name.hidden {
                    content.push_str(&format!(" hidden=\"{}\"", bool_attr(true)));
                }
                content.push_str(&format!(
                    ">{}</definedName>",
                    escape_xml(&name.refers_to)
                ));
            }
            content.push_str("\n    </definedNames>");
        }

        if let Some(calc) = workbook.calculation() {
            content.push_str("\n    <calcPr");
            if let Some(id) = calc.calc_id {
                content.push_str(&format!(" calcId=\"{}\"", id));
            }
            if let Some(mode) = &calc.calc_mode {
                content.push_str(&format!(" calcMode=\"{}\"", escape_xml(mode)));
            }
            if let Some(full) = calc.full_calc_on_load {
                content.push_str(&format!(" fullCalcOnLoad=\"{}\"", bool_attr(full)));
            }
            if let Some(mode) = &calc.ref_mode {
                content.push_str(&format!(" refMode=\"{}\"", escape_xml(mode)));
            }
            if let Some(iterate) = calc.iterate {
                content.push_str(&format!(" iterate=\"{}\"", bool_attr(iterate)));
            }
            if let Some(count) = calc.iterate_count {
                content.push_str(&format!(" iterateCount=\"{}\"", count));
            }
            if let Some(delta) = calc.iterate_delta {
                content.push_str(&format!(" iterateDelta=\"{}\"", delta));
            }
            push_extra_attributes(&mut content, &calc.extra_attributes);
            content.push_str("/>");
        }

        content.push_str("\n</workbook>");
        write_part(zip, options, "xl/workbook.xml", &content)
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
        workbook: &Workbook,
        sst: &SharedStringTable,
    ) -> XlsxResult<()> {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
            PKG_REL_NS
        );

        let sheet_count = workbook.sheet_count();
        for i in 0..sheet_count {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                REL_NS,
                i + 1
            ));
        }

        let mut next_id = sheet_count + 1;
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
            next_id, REL_NS
        ));
        next_id += 1;

        if workbook.theme().is_some() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}/theme" Target="theme/theme1.xml"/>"#,
                next_id, REL_NS
            ));
            next_id += 1;
        }
        if !sst.is_empty() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}/sharedStrings" Target="sharedStrings.xml"/>"#,
                next_id, REL_NS
            ));
        }

        content.push_str("\n</Relationships>");
        write_part(zip, options, "xl/_rels/workbook.xml.rels", &content)
    }

    fn write_worksheet_rels<W: Write + Seek>(
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
        sheet_idx: usize,
        sheet: &RenderedSheet,
    ) -> XlsxResult<()> {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
            PKG_REL_NS
        );
        for (k, rel) in sheet.rels.iter().enumerate() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}/{}" Target="{}""#,
                k + 1,
                REL_NS,
                rel.kind,
                escape_xml(&rel.target)
            ));
            if rel.external {
                content.push_str(r#" TargetMode="External""#);
            }
            content.push_str("/>");
        }
        content.push_str("\n</Relationships>");

        let path = format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_idx + 1);
        write_part(zip, options, &path, &content)
    }
}

fn write_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: SimpleFileOptions,
    path: &str,
    content: &str,
) -> XlsxResult<()> {
    zip.start_file(path, options)?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

/// Unprefixed attributes only; prefixed ones would need namespace
/// declarations the root does not carry.
fn push_extra_attributes(content: &mut String, attrs: &[(String, String)]) {
    for (key, value) in attrs {
        if key.contains(':') {
            log::debug!("Dropping namespaced attribute {}", key);
            continue;
        }
        content.push_str(&format!(" {}=\"{}\"", key, escape_xml(value)));
    }
}

/// Workbook-unique table ids, per sheet in table order.
///
/// Source ids are kept; zero and repeated ids are renumbered past the
/// largest one in use, or into the lowest free ids once that would pass
/// `u32::MAX`.
fn assign_table_ids(workbook: &Workbook) -> Vec<Vec<u32>> {
    let mut reserved: AHashSet<u32> = workbook
        .worksheets()
        .flat_map(|s| s.tables())
        .map(|t| t.id)
        .filter(|&id| id != 0)
        .collect();
    let mut next = reserved.iter().copied().max().unwrap_or(0).checked_add(1);
    let mut lowest_free = 1u32;
    let mut used = AHashSet::new();

    workbook
        .worksheets()
        .map(|sheet| {
            sheet
                .tables()
                .iter()
                .map(|table| {
                    if table.id != 0 && used.insert(table.id) {
                        return table.id;
                    }
                    let id = match next {
                        Some(id) => {
                            next = id.checked_add(1);
                            id
                        }
                        None => {
                            lowest_free = (lowest_free..=u32::MAX)
                                .find(|id| !reserved.contains(id))
                                .unwrap_or(u32::MAX);
                            lowest_free
                        }
                    };
                    reserved.insert(id);
                    used.insert(id);
                    id
                })
                .collect()
        })
        .collect()
}
