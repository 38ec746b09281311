//! Cell value types

use std::fmt;

use super::CellRange;

/// Represents the value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value, possibly still styled)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value (all numbers stored as f64, including dates)
    Number(f64),

    /// Plain string value
    String(String),

    /// String with formatting runs
    RichText(RichText),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Formula with its last cached result
    Formula(Formula),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Create a new formula value without a cached result
    pub fn formula<S: Into<String>>(text: S) -> Self {
        CellValue::Formula(Formula::new(text))
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Formula(f) => f.cached.as_deref().and_then(CellValue::as_number),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Formula(f) => f.cached.as_deref().and_then(CellValue::as_bool),
            _ => None,
        }
    }

    /// Try to get the value as text (rich text yields its plain text)
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            CellValue::RichText(r) => Some(&r.text),
            CellValue::Formula(f) => f.cached.as_deref().and_then(CellValue::as_string),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s),
            CellValue::RichText(r) => f.write_str(&r.text),
            CellValue::Error(e) => write!(f, "{}", e),
            CellValue::Formula(formula) => match &formula.cached {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "={}", formula.text),
            },
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// A shared string that carries formatting runs.
///
/// `runs_xml` is the inner markup of the `<si>` element (`<r>`, `<rPh>`,
/// `<phoneticPr>` children) exactly as it appeared in the source package.
/// `text` is the concatenated plain text of all runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RichText {
    /// Plain text of all runs
    pub text: String,
    /// Verbatim run markup
    pub runs_xml: String,
}

/// A formula cell.
///
/// `text` is the formula body as stored in the container, without a leading
/// `=`. Shared-formula dependents carry an empty `text` and reference the
/// anchor through [`FormulaKind::Shared`].
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    /// Formula body
    pub text: String,
    /// Normal, shared or array formula
    pub kind: FormulaKind,
    /// Last calculated value, if the file recorded one
    pub cached: Option<Box<CellValue>>,
}

impl Formula {
    /// Create a normal formula. A leading `=` is stripped.
    pub fn new<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let text = match text.strip_prefix('=') {
            Some(body) => body.to_string(),
            None => text,
        };
        Self {
            text,
            kind: FormulaKind::Normal,
            cached: None,
        }
    }

    /// Attach a cached result
    pub fn with_cached(mut self, value: CellValue) -> Self {
        self.cached = Some(Box::new(value));
        self
    }
}

/// How a formula is stored in the container
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormulaKind {
    /// Ordinary single-cell formula
    #[default]
    Normal,
    /// Member of a shared formula group; the anchor cell carries `range`
    Shared {
        /// Shared group index (`si`)
        index: u32,
        /// Range covered by the group (only on the anchor cell)
        range: Option<CellRange>,
    },
    /// Legacy array (CSE) formula covering `range`
    Array {
        /// Range the array result occupies
        range: CellRange,
    },
}

/// Excel error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
    /// #GETTING_DATA - External data is loading
    GettingData,
    /// #SPILL! - Dynamic array cannot spill
    Spill,
    /// #CALC! - Calculation error
    Calc,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::GettingData => "#GETTING_DATA",
            CellError::Spill => "#SPILL!",
            CellError::Calc => "#CALC!",
        }
    }

    /// Parse an error literal as stored in a `<v>` element
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            "#GETTING_DATA" => Some(CellError::GettingData),
            "#SPILL!" => Some(CellError::Spill),
            "#CALC!" => Some(CellError::Calc),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_strips_equals() {
        let f = Formula::new("=SUM(A1:A3)");
        assert_eq!(f.text, "SUM(A1:A3)");
        assert_eq!(f.kind, FormulaKind::Normal);
        assert_eq!(Formula::new("A1*2").text, "A1*2");
    }

    #[test]
    fn test_cached_value_accessors() {
        let value = CellValue::Formula(Formula::new("1+1").with_cached(CellValue::Number(2.0)));
        assert_eq!(value.as_number(), Some(2.0));
        assert_eq!(value.to_string(), "2");
        assert_eq!(CellValue::formula("A1").to_string(), "=A1");
    }

    #[test]
    fn test_rich_text_plain_text() {
        let value = CellValue::RichText(RichText {
            text: "Bold plain".into(),
            runs_xml: "<r><rPr><b/></rPr><t>Bold</t></r><r><t xml:space=\"preserve\"> plain</t></r>"
                .into(),
        });
        assert_eq!(value.as_string(), Some("Bold plain"));
    }

    #[test]
    fn test_error_literals() {
        assert_eq!(CellError::parse("#div/0!"), Some(CellError::Div0));
        assert_eq!(CellError::parse("#BOGUS"), None);
        assert_eq!(CellError::Na.to_string(), "#N/A");
    }
}
