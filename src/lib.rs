//! # record-export
//!
//! Streaming XLSX export of typed records driven by declarative column
//! metadata.
//!
//! ## Features
//!
//! - **Declarative columns**: titles, sort order, groups, modes and alignment
//!   declared once per record type
//! - **Property paths**: columns can read nested values such as `owner.name`
//! - **Bounded memory**: only the most recent rows stay in memory; older rows
//!   spill to a constant-memory worksheet
//! - **Pluggable formatting**: caller-registered formatters for custom scalar
//!   kinds
//! - **Response sinks**: write straight to an HTTP-style download
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use record_export::accessor::{AccessorTable, Property, Record};
//! use record_export::metadata::{ExcelField, RecordDescriptor};
//! use record_export::{AccessError, ExcelExport, Exportable, Value};
//! use std::sync::LazyLock;
//!
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! static USER: LazyLock<AccessorTable<User>> = LazyLock::new(|| {
//!     AccessorTable::<User>::new("User")
//!         .value("id", |u| Value::from(u.id))
//!         .value("name", |u| Value::from(u.name.as_str()))
//! });
//!
//! impl Record for User {
//!     fn property(&self, name: &str) -> Result<Property<'_>, AccessError> {
//!         USER.resolve(self, name)
//!     }
//! }
//!
//! impl Exportable for User {
//!     fn descriptor() -> RecordDescriptor {
//!         RecordDescriptor::new("User")
//!             .field("id", ExcelField::new("ID").sort(1))
//!             .field("name", ExcelField::new("Name**Display name").sort(2))
//!     }
//! }
//!
//! # fn main() -> record_export::Result<()> {
//! let users = vec![User { id: 1, name: "Ada".into() }];
//!
//! let mut export = ExcelExport::new::<User>("Users")?;
//! export.set_data_list(&users)?.write_file("users.xlsx")?;
//! export.dispose();
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod metadata;
pub mod stream;
pub mod style;
pub mod types;

pub use accessor::{AccessorRef, AccessorTable, Property, Record};
pub use config::{ExportOptions, MemoryProfile};
pub use error::{AccessError, ExportError, FormatError, Result};
pub use export::{ExcelExport, ExcelExportBuilder};
pub use format::{CellFormatter, FormattedCell, FormatterRegistry};
pub use metadata::{ColumnPlan, ColumnSpec, ExcelField, ExportMode, Exportable, RecordDescriptor};
pub use stream::{BufferedResponse, ResponseSink, SheetStats};
pub use types::{Alignment, CellValue, CustomScalar, Value};
