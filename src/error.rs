//! Error types for record exports
//!
//! Two tiers exist. [`ExportError`] is fatal for one export and is returned to
//! the caller. [`AccessError`] and [`FormatError`] are per-cell and never leave
//! the row builder: the affected cell degrades to empty or default text.

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Fatal error for one export instance
#[derive(Error, Debug)]
pub enum ExportError {
    /// An explicit header list was supplied without any headers
    #[error("Export requires at least one header column")]
    MissingHeaders,

    /// The column plan is wider than a worksheet allows
    #[error("Column plan has {0} columns, worksheets allow at most 16384")]
    TooManyColumns(usize),

    /// A low-level row carried more values than the plan has columns
    #[error("Row {row} has {actual} values but the column plan has {expected} columns")]
    RowTooWide {
        row: u32,
        expected: usize,
        actual: usize,
    },

    /// Error while writing buffered rows to the backing worksheet
    #[error("Failed to flush row {row} of sheet '{sheet}': {source}")]
    FlushError {
        row: u32,
        sheet: String,
        #[source]
        source: Box<ExportError>,
    },

    /// Operation attempted after [`crate::ExcelExport::dispose`]
    #[error("Export has been disposed")]
    Disposed,

    /// The workbook was already serialized to a sink
    #[error("Workbook has already been written")]
    AlreadyWritten,

    /// An earlier flush or serialization failure left the workbook incomplete
    #[error("Export aborted after an earlier failure: {cause}")]
    Aborted { cause: String },

    /// Spreadsheet backend error
    #[error("Spreadsheet backend error: {0}")]
    Xlsx(#[from] XlsxError),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable failure while resolving a property on a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No accessor with this name exists on the record or its ancestors
    #[error("No property '{member}' on {type_name}")]
    MissingMember { member: String, type_name: String },

    /// An intermediate segment of a path resolved to nothing
    #[error("Property '{segment}' is null in path '{path}'")]
    NullIntermediate { segment: String, path: String },

    /// An intermediate segment resolved to a scalar instead of a record
    #[error("Property '{segment}' is not a record in path '{path}'")]
    NotARecord { segment: String, path: String },

    /// The final segment resolved to a record instead of a scalar
    #[error("Property '{segment}' is a record, not a value")]
    NotAValue { segment: String },

    /// Blank path or empty segment between dots
    #[error("Empty segment in property path '{path}'")]
    EmptySegment { path: String },

    /// The accessor itself reported a failure
    #[error("Accessor '{member}' failed: {message}")]
    Invocation { member: String, message: String },
}

/// Recoverable failure inside a value-to-text formatter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Formatter '{formatter}' failed: {message}")]
pub struct FormatError {
    pub formatter: String,
    pub message: String,
}

impl FormatError {
    /// Create a formatter failure
    pub fn new(formatter: impl Into<String>, message: impl Into<String>) -> Self {
        FormatError {
            formatter: formatter.into(),
            message: message.into(),
        }
    }
}
