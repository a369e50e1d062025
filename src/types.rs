//! Value and cell type definitions

use chrono::{NaiveDate, NaiveDateTime};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Horizontal alignment of a data column
///
/// Declared as a numeric code in column metadata: 1 left, 2 center,
/// 3 right. Any other code means unaligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alignment {
    /// Use the unaligned data template
    #[default]
    None = 0,
    /// Left aligned
    Left = 1,
    /// Centered
    Center = 2,
    /// Right aligned
    Right = 3,
}

impl Alignment {
    /// Map a metadata alignment code, falling back to [`Alignment::None`]
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Alignment::Left,
            2 => Alignment::Center,
            3 => Alignment::Right,
            _ => Alignment::None,
        }
    }

    /// Numeric code of this alignment
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// A caller-defined scalar kind not covered by [`Value`]'s built-in variants
///
/// Values of such kinds are formatted through the
/// [`crate::format::FormatterRegistry`] entry registered under
/// [`CustomScalar::type_tag`], or through their `Display` text when no entry
/// exists.
pub trait CustomScalar: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Registry key for this kind, e.g. `"Money"`
    fn type_tag(&self) -> &str;

    /// Downcast support for registered formatters
    fn as_any(&self) -> &dyn Any;
}

/// A raw property value resolved from a record
#[derive(Debug, Clone)]
pub enum Value {
    /// Missing or null value
    Null,
    /// Character sequence
    Text(String),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Boolean; has no built-in cell kind and goes through the registry
    Bool(bool),
    /// Date and time without zone
    DateTime(NaiveDateTime),
    /// Caller-defined scalar
    Custom(Arc<dyn CustomScalar>),
}

impl Value {
    /// Type tag used for registry lookups
    pub fn type_tag(&self) -> &str {
        match self {
            Value::Null => "Null",
            Value::Text(_) => "String",
            Value::Int(_) => "Integer",
            Value::Long(_) => "Long",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::Bool(_) => "Boolean",
            Value::DateTime(_) => "DateTime",
            Value::Custom(c) => c.type_tag(),
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wrap a custom scalar
    pub fn custom<C: CustomScalar>(value: C) -> Self {
        Value::Custom(Arc::new(value))
    }
}

impl fmt::Display for Value {
    /// Default text representation, used whenever no formatter applies
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Value::Long(l) => f.write_str(itoa::Buffer::new().format(*l)),
            Value::Float(x) => write!(f, "{}", x),
            Value::Double(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Custom(c) => write!(f, "{}", c),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Long(i)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::DateTime(d.and_time(chrono::NaiveTime::MIN))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Fully resolved content of one cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell, written without a data style
    Empty,
    /// Text value
    Text(String),
    /// 32-bit integer
    Integer(i32),
    /// 64-bit integer
    Long(i64),
    /// Floating point value
    Real(f64),
    /// Date and time
    Timestamp(NaiveDateTime),
    /// Text produced by a custom or registered formatter
    CustomText(String),
}

impl CellValue {
    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) | CellValue::CustomText(s) => s.clone(),
            CellValue::Integer(i) => itoa::Buffer::new().format(*i).to_string(),
            CellValue::Long(l) => itoa::Buffer::new().format(*l).to_string(),
            CellValue::Real(f) => f.to_string(),
            CellValue::Timestamp(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric payload as written to the sheet, if the cell is a number
    ///
    /// Timestamps are not numbers here; the backend converts them itself.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(f64::from(*i)),
            CellValue::Long(l) => Some(*l as f64),
            CellValue::Real(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// Get Excel-style cell reference (e.g., "A1", "B2") for 0-based indices
pub fn cell_reference(row: u32, col: u16) -> String {
    let mut reference = col_to_letter(col);
    reference.push_str(itoa::Buffer::new().format(u64::from(row) + 1));
    reference
}

/// Convert column index to Excel letter (0 -> A, 25 -> Z, 26 -> AA)
fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut col = u32::from(col) + 1;

    while col > 0 {
        col -= 1;
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_reference() {
        assert_eq!(cell_reference(0, 0), "A1");
        assert_eq!(cell_reference(0, 25), "Z1");
        assert_eq!(cell_reference(9, 26), "AA10");
    }

    #[test]
    fn test_alignment_codes() {
        assert_eq!(Alignment::from_code(1), Alignment::Left);
        assert_eq!(Alignment::from_code(3), Alignment::Right);
        assert_eq!(Alignment::from_code(7), Alignment::None);
        assert_eq!(Alignment::from_code(-1), Alignment::None);
        assert_eq!(Alignment::Center.code(), 2);
    }

    #[test]
    fn test_value_default_text() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int(-42).to_string(), "-42");
        assert_eq!(Value::Bool(true).to_string(), "true");
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        assert_eq!(Value::from(dt).to_string(), "2024-03-09 08:05:00");
        assert!(Value::from(None::<String>).is_null());
    }

    #[test]
    fn test_numeric_payload() {
        let dt = NaiveDate::from_ymd_opt(1900, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(CellValue::Timestamp(dt).as_f64(), None);
        assert_eq!(CellValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(CellValue::Long(1 << 40).as_f64(), Some((1u64 << 40) as f64));
        assert_eq!(CellValue::Text("x".into()).as_f64(), None);
    }
}
