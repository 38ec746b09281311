//! Shared string table builder

use ahash::AHashMap;

use crate::xml::encode_cell_text;
use sheetsplit_core::RichText;

/// A distinct shared string entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Entry {
    Plain(String),
    Rich(String),
}

/// Deduplicating shared string table
#[derive(Debug, Default)]
pub(crate) struct SharedStringTable {
    entries: Vec<Entry>,
    index: AHashMap<Entry, usize>,
    references: usize,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of a plain string, adding it when new
    pub fn plain(&mut self, text: &str) -> usize {
        self.intern(Entry::Plain(text.to_string()))
    }

    /// Index of a rich-text string, adding it when new
    pub fn rich(&mut self, rich: &RichText) -> usize {
        if rich.runs_xml.is_empty() {
            return self.plain(&rich.text);
        }
        self.intern(Entry::Rich(rich.runs_xml.clone()))
    }

    fn intern(&mut self, entry: Entry) -> usize {
        self.references += 1;
        if let Some(&idx) = self.index.get(&entry) {
            return idx;
        }
        let idx = self.entries.len();
        self.entries.push(entry.clone());
        self.index.insert(entry, idx);
        idx
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn to_xml(&self) -> String {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.len()
        );

        for entry in &self.entries {
            match entry {
                Entry::Plain(text) => {
                    let space = if needs_preserve(text) {
                        " xml:space=\"preserve\""
                    } else {
                        ""
                    };
                    content.push_str(&format!(
                        "<si><t{}>{}</t></si>",
                        space,
                        encode_cell_text(text)
                    ));
                }
                Entry::Rich(runs) => {
                    content.push_str("<si>");
                    content.push_str(runs);
                    content.push_str("</si>");
                }
            }
        }

        content.push_str("</sst>");
        content
    }
}

/// Whitespace that XML processors would otherwise be free to drop
pub(crate) fn needs_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
        || text.contains('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduplication() {
        let mut sst = SharedStringTable::new();
        assert_eq!(sst.plain("North"), 0);
        assert_eq!(sst.plain("South"), 1);
        assert_eq!(sst.plain("North"), 0);
        let rich = RichText {
            text: "North".into(),
            runs_xml: "<r><t>North</t></r>".into(),
        };
        assert_eq!(sst.rich(&rich), 2);
        assert_eq!(sst.len(), 3);

        let xml = sst.to_xml();
        assert!(xml.contains(r#"count="4" uniqueCount="3""#));
        assert!(xml.contains("<si><r><t>North</t></r></si>"));
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let mut sst = SharedStringTable::new();
        sst.plain(" padded ");
        sst.plain("plain");
        let xml = sst.to_xml();
        assert!(xml.contains(r#"<si><t xml:space="preserve"> padded </t></si>"#));
        assert!(xml.contains("<si><t>plain</t></si>"));
    }
}
