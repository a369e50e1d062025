//! Streaming sheet builder and output sinks
//!
//! - [`StreamingSheet`]: bounded row window over a constant-memory worksheet
//! - [`StreamingWorkbook`]: sheet switching, one-shot serialization, disposal
//! - [`ResponseSink`]: HTTP-response style destination for the artifact

pub mod sheet;
pub mod sink;
pub mod workbook;

pub use sheet::{SheetStats, StreamingSheet, MAX_COLUMNS};
pub use sink::{content_disposition, BufferedResponse, ResponseSink, CONTENT_DISPOSITION, CONTENT_TYPE};
pub use workbook::StreamingWorkbook;
