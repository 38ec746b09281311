//! Workbook part (`xl/workbook.xml`)

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::{attributes, parse_bool};
use sheetsplit_core::{
    CalculationSettings, SheetState, WorkbookProtection, WorkbookSettings, WorkbookView,
};

/// A `<sheet>` entry
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub state: SheetState,
    pub r_id: String,
}

/// A `<definedName>` entry, scope still expressed as the source sheet position
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct DefinedNameEntry {
    pub name: String,
    pub local_sheet_id: Option<usize>,
    pub hidden: bool,
    pub comment: Option<String>,
    pub refers_to: String,
}

#[derive(Debug, Default)]
pub(crate) struct WorkbookPart {
    pub sheets: Vec<SheetEntry>,
    pub defined_names: Vec<DefinedNameEntry>,
    pub views: Vec<WorkbookView>,
    pub calculation: Option<CalculationSettings>,
    pub settings: WorkbookSettings,
}

pub(crate) fn read_workbook_xml(xml: &str) -> XlsxResult<WorkbookPart> {
    let mut xml_reader = Reader::from_str(xml);

    let mut part = WorkbookPart::default();
    let mut current_name: Option<DefinedNameEntry> = None;

    loop {
        match xml_reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"definedName" => {
                current_name = Some(read_defined_name(&e));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"definedName" => {
                log::warn!("Ignoring defined name without a formula");
            }
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sheet" => {
                    let mut name = None;
                    let mut r_id = None;
                    let mut state = SheetState::Visible;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                name = attr.unescape_value().ok().map(|s| s.to_string());
                            }
                            b"r:id" => {
                                r_id = attr.unescape_value().ok().map(|s| s.to_string());
                            }
                            b"state" => {
                                if let Ok(v) = attr.unescape_value() {
                                    state = SheetState::parse(&v);
                                }
                            }
                            _ => {}
                        }
                    }

                    match (name, r_id) {
                        (Some(name), Some(r_id)) => {
                            part.sheets.push(SheetEntry { name, state, r_id })
                        }
                        _ => log::warn!("Ignoring <sheet> without name or r:id"),
                    }
                }
                b"workbookPr" => read_workbook_pr(&e, &mut part.settings),
                b"workbookProtection" => {
                    part.settings.protection = Some(read_workbook_protection(&e))
                }
                b"workbookView" => part.views.push(read_workbook_view(&e)?),
                b"calcPr" => part.calculation = Some(read_calc_pr(&e)?),
                _ => {}
            },
            Event::Text(e) => {
                if let Some(entry) = current_name.as_mut() {
                    entry.refers_to.push_str(&e.unescape()?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"definedName" => {
                if let Some(entry) = current_name.take() {
                    if entry.name.is_empty() {
                        log::warn!("Ignoring defined name without a name");
                    } else {
                        part.defined_names.push(entry);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(part)
}

fn read_defined_name(e: &BytesStart<'_>) -> DefinedNameEntry {
    let mut entry = DefinedNameEntry::default();
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().ok().map(|s| s.to_string());
        match attr.key.as_ref() {
            b"name" => entry.name = value.unwrap_or_default(),
            b"localSheetId" => entry.local_sheet_id = value.and_then(|v| v.parse().ok()),
            b"hidden" => entry.hidden = value.map_or(false, |v| parse_bool(&v)),
            b"comment" => entry.comment = value,
            _ => {}
        }
    }
    entry
}

fn read_workbook_pr(e: &BytesStart<'_>, settings: &mut WorkbookSettings) {
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"date1904" => settings.date_1904 = parse_bool(&value),
            b"codeName" => settings.code_name = Some(value.to_string()),
            b"defaultThemeVersion" => settings.default_theme_version = value.parse().ok(),
            _ => {}
        }
    }
}

fn read_workbook_protection(e: &BytesStart<'_>) -> WorkbookProtection {
    let mut protection = WorkbookProtection::default();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"lockStructure" => protection.lock_structure = parse_bool(&value),
            b"lockWindows" => protection.lock_windows = parse_bool(&value),
            b"workbookPassword" => protection.password = Some(value.to_string()),
            b"workbookAlgorithmName" => protection.algorithm_name = Some(value.to_string()),
            b"workbookHashValue" => protection.hash_value = Some(value.to_string()),
            b"workbookSaltValue" => protection.salt_value = Some(value.to_string()),
            b"workbookSpinCount" => protection.spin_count = value.parse().ok(),
            _ => {}
        }
    }
    protection
}

fn read_workbook_view(e: &BytesStart<'_>) -> XlsxResult<WorkbookView> {
    let mut view = WorkbookView::default();
    for (key, value) in attributes(e)? {
        match key.as_str() {
            "xWindow" => view.x_window = value.parse().ok(),
            "yWindow" => view.y_window = value.parse().ok(),
            "windowWidth" => view.window_width = value.parse().ok(),
            "windowHeight" => view.window_height = value.parse().ok(),
            "tabRatio" => view.tab_ratio = value.parse().ok(),
            "firstSheet" => view.first_sheet = value.parse().unwrap_or(0),
            "activeTab" => view.active_tab = value.parse().unwrap_or(0),
            _ => view.extra_attributes.push((key, value)),
        }
    }
    Ok(view)
}

fn read_calc_pr(e: &BytesStart<'_>) -> XlsxResult<CalculationSettings> {
    let mut calc = CalculationSettings::default();
    for (key, value) in attributes(e)? {
        match key.as_str() {
            "calcId" => calc.calc_id = value.parse().ok(),
            "calcMode" => calc.calc_mode = Some(value),
            "fullCalcOnLoad" => calc.full_calc_on_load = Some(parse_bool(&value)),
            "refMode" => calc.ref_mode = Some(value),
            "iterate" => calc.iterate = Some(parse_bool(&value)),
            "iterateCount" => calc.iterate_count = value.parse().ok(),
            "iterateDelta" => calc.iterate_delta = value.parse().ok(),
            _ => calc.extra_attributes.push((key, value)),
        }
    }
    Ok(calc)
}
