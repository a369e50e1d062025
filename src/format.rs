//! Value formatting and runtime type dispatch
//!
//! [`format_value`] turns a resolved [`Value`] into a [`FormattedCell`]: the
//! typed cell content plus the number format its column style should carry.
//! Kinds without a built-in cell representation (booleans, custom scalars)
//! are looked up by type tag in a [`FormatterRegistry`] populated at startup.
//! Every path ends in a rendered cell; formatter failures fall back to the
//! value's default text.

use crate::error::FormatError;
use crate::types::{CellValue, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Number format for text cells
pub const TEXT_FORMAT: &str = "@";
/// Number format for integer cells
pub const INTEGER_FORMAT: &str = "0";
/// Number format for floating point cells
pub const REAL_FORMAT: &str = "0.00";
/// Number format for date/time cells
pub const TIMESTAMP_FORMAT: &str = "yyyy-MM-dd HH:mm";
/// Longest text a worksheet cell can hold, in characters
pub const MAX_TEXT_CHARS: usize = 32_767;

type FormatFn = dyn Fn(&Value) -> Result<String, FormatError> + Send + Sync;

/// A value-to-text conversion function
#[derive(Clone)]
pub struct CellFormatter {
    name: String,
    func: Arc<FormatFn>,
}

impl CellFormatter {
    /// Wrap a conversion function under a diagnostic name
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        CellFormatter {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Diagnostic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convert a value to text
    pub fn format(&self, value: &Value) -> Result<String, FormatError> {
        (self.func)(value)
    }
}

impl fmt::Debug for CellFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellFormatter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Type tag → formatter table, the extension point for new scalar kinds
#[derive(Debug, Clone, Default)]
pub struct FormatterRegistry {
    formatters: IndexMap<String, CellFormatter>,
}

impl FormatterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formatter for a type tag, replacing any previous entry
    pub fn register<F>(&mut self, type_tag: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        let type_tag = type_tag.into();
        let formatter = CellFormatter::new(type_tag.clone(), func);
        self.formatters.insert(type_tag, formatter);
        self
    }

    /// Builder-style [`FormatterRegistry::register`]
    pub fn with<F>(mut self, type_tag: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        self.register(type_tag, func);
        self
    }

    /// Formatter registered for a type tag
    pub fn get(&self, type_tag: &str) -> Option<&CellFormatter> {
        self.formatters.get(type_tag)
    }

    /// Number of registered formatters
    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }
}

/// Cell content plus the number format for its column style
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedCell {
    pub value: CellValue,
    pub format: &'static str,
}

impl FormattedCell {
    /// An empty cell
    pub fn empty() -> Self {
        FormattedCell {
            value: CellValue::Empty,
            format: TEXT_FORMAT,
        }
    }

    fn text(s: String) -> Self {
        FormattedCell {
            value: CellValue::Text(s),
            format: TEXT_FORMAT,
        }
    }

    fn custom(s: String) -> Self {
        FormattedCell {
            value: CellValue::CustomText(s),
            format: TEXT_FORMAT,
        }
    }
}

/// Column-level formatting directives
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatHints<'a> {
    /// Formatter attached to the column; takes precedence over dispatch
    pub formatter: Option<&'a CellFormatter>,
    /// Declared scalar type tag; selects a registry entry for every value
    pub type_tag: Option<&'a str>,
}

/// Format one resolved value
///
/// # Examples
///
/// ```
/// use record_export::format::{format_value, FormatHints, FormatterRegistry, REAL_FORMAT};
/// use record_export::{CellValue, Value};
///
/// let cell = format_value(Value::Double(3.14159), FormatHints::default(), &FormatterRegistry::new());
/// assert_eq!(cell.value, CellValue::Real(3.14159));
/// assert_eq!(cell.format, REAL_FORMAT);
/// ```
///
/// Text longer than [`MAX_TEXT_CHARS`], whether the value itself or a
/// formatter's output, cannot be stored and degrades to an empty cell.
pub fn format_value(
    value: Value,
    hints: FormatHints<'_>,
    registry: &FormatterRegistry,
) -> FormattedCell {
    let cell = dispatch(value, hints, registry);
    match &cell.value {
        CellValue::Text(s) | CellValue::CustomText(s) if exceeds_cell_limit(s) => {
            tracing::debug!(
                chars = s.chars().count(),
                limit = MAX_TEXT_CHARS,
                "text too long for a cell, writing empty"
            );
            FormattedCell::empty()
        }
        _ => cell,
    }
}

fn exceeds_cell_limit(s: &str) -> bool {
    // byte length bounds char count from above
    s.len() > MAX_TEXT_CHARS && s.chars().count() > MAX_TEXT_CHARS
}

fn dispatch(value: Value, hints: FormatHints<'_>, registry: &FormatterRegistry) -> FormattedCell {
    if value.is_null() {
        return FormattedCell::empty();
    }

    if let Some(formatter) = hints.formatter {
        return apply_formatter(formatter, value);
    }

    if let Some(formatter) = hints.type_tag.and_then(|tag| registry.get(tag)) {
        return apply_formatter(formatter, value);
    }

    match value {
        Value::Null => FormattedCell::empty(),
        Value::Text(s) => FormattedCell::text(s),
        Value::Int(i) => FormattedCell {
            value: CellValue::Integer(i),
            format: INTEGER_FORMAT,
        },
        Value::Long(l) => FormattedCell {
            value: CellValue::Long(l),
            format: INTEGER_FORMAT,
        },
        Value::Float(f) => real_cell(f64::from(f)),
        Value::Double(f) => real_cell(f),
        Value::DateTime(dt) => FormattedCell {
            value: CellValue::Timestamp(dt),
            format: TIMESTAMP_FORMAT,
        },
        other => match registry.get(other.type_tag()) {
            Some(formatter) => apply_formatter(formatter, other),
            None => FormattedCell::text(other.to_string()),
        },
    }
}

fn real_cell(f: f64) -> FormattedCell {
    // NaN and infinities have no cell representation
    if !f.is_finite() {
        return FormattedCell::text(f.to_string());
    }
    FormattedCell {
        value: CellValue::Real(f),
        format: REAL_FORMAT,
    }
}

fn apply_formatter(formatter: &CellFormatter, value: Value) -> FormattedCell {
    match formatter.format(&value) {
        Ok(text) => FormattedCell::custom(text),
        Err(err) => {
            tracing::debug!(
                formatter = formatter.name(),
                error = %err,
                "formatter failed, using default text"
            );
            FormattedCell::text(value.to_string())
        }
    }
}
