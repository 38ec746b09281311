//! Document and custom properties

use chrono::{DateTime, Utc};

/// Core and extended document properties
///
/// Core fields come from the Dublin Core part, the rest from the extended
/// (application) properties part. Sheet titles and counts are not kept here
/// because they are derived from the workbook on write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentProperties {
    /// Title
    pub title: Option<String>,
    /// Subject
    pub subject: Option<String>,
    /// Author
    pub creator: Option<String>,
    /// Keywords
    pub keywords: Option<String>,
    /// Description / comments
    pub description: Option<String>,
    /// Last modified by
    pub last_modified_by: Option<String>,
    /// Category
    pub category: Option<String>,
    /// Content status (e.g. "Draft")
    pub content_status: Option<String>,
    /// Language tag
    pub language: Option<String>,
    /// Revision number
    pub revision: Option<String>,
    /// Creation time
    pub created: Option<DateTime<Utc>>,
    /// Last modification time
    pub modified: Option<DateTime<Utc>>,
    /// Producing application
    pub application: Option<String>,
    /// Producing application version
    pub app_version: Option<String>,
    /// Company
    pub company: Option<String>,
    /// Manager
    pub manager: Option<String>,
    /// Base for relative hyperlinks
    pub hyperlink_base: Option<String>,
}

impl DocumentProperties {
    /// Check if no property is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Value of a custom property
#[derive(Debug, Clone, PartialEq)]
pub enum CustomValue {
    /// `vt:lpwstr` / `vt:lpstr`
    Text(String),
    /// `vt:i4` and other integer kinds
    Integer(i64),
    /// `vt:r8` / `vt:r4` / `vt:decimal`
    Number(f64),
    /// `vt:bool`
    Bool(bool),
    /// `vt:filetime`
    DateTime(DateTime<Utc>),
    /// Any other variant type, kept verbatim
    Other {
        /// Variant element, including its prefix (e.g. `vt:cy`)
        kind: String,
        /// Element text
        raw: String,
    },
}

/// A user-defined document property
#[derive(Debug, Clone, PartialEq)]
pub struct CustomProperty {
    /// Property name
    pub name: String,
    /// Property value
    pub value: CustomValue,
    /// Linked content target, if the property is bound to a name
    pub link_target: Option<String>,
}

impl CustomProperty {
    /// Create a custom property
    pub fn new(name: impl Into<String>, value: CustomValue) -> Self {
        Self {
            name: name.into(),
            value,
            link_target: None,
        }
    }
}

/// Ordered list of custom properties
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomProperties {
    properties: Vec<CustomProperty>,
}

impl CustomProperties {
    /// Create an empty property list
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property (names compare case-insensitively)
    pub fn set(&mut self, property: CustomProperty) {
        match self
            .properties
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&property.name))
        {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    /// Look up a property by name
    pub fn get(&self, name: &str) -> Option<&CustomProperty> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CustomProperty> {
        self.properties.iter()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if there are no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
