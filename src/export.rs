//! Record export facade
//!
//! [`ExcelExport`] ties the pieces together: the column plan is resolved
//! once at construction, every record is read through the plan's accessors,
//! each value is formatted and styled, and the row is handed to the
//! streaming workbook. Per-cell failures become empty cells; only backend
//! and lifecycle errors reach the caller.

use crate::accessor::Record;
use crate::config::{ExportOptions, MemoryProfile};
use crate::error::{ExportError, FormatError, Result};
use crate::format::{format_value, FormattedCell, FormatterRegistry};
use crate::metadata::{ColumnPlan, ExportMode, Exportable};
use crate::stream::{content_disposition, ResponseSink, SheetStats, StreamingWorkbook};
use crate::stream::{CONTENT_DISPOSITION, CONTENT_TYPE};
use crate::types::{cell_reference, Value};
use std::io::{self, Write};
use std::path::Path;

/// Streaming export of records into one XLSX workbook
///
/// # Examples
///
/// ```no_run
/// use record_export::{ExcelExport, Value};
///
/// # fn main() -> record_export::Result<()> {
/// let mut export = ExcelExport::with_headers("Inventory", ["SKU", "Qty**Units on hand"])?;
/// export.add_row([Value::from("A-100"), Value::from(12)])?;
/// export.add_row([Value::from("B-200"), Value::from(0)])?;
/// export.write_file("inventory.xlsx")?;
/// export.dispose();
/// # Ok(())
/// # }
/// ```
pub struct ExcelExport {
    workbook: StreamingWorkbook,
    plan: ColumnPlan,
    registry: FormatterRegistry,
}

impl ExcelExport {
    /// Export the export-eligible columns of `T` under a title
    pub fn new<T: Exportable>(title: &str) -> Result<Self> {
        Self::for_record::<T>(title, ExportMode::Export, &[])
    }

    /// Export the columns of `T` admitted by a mode and group filter
    pub fn for_record<T: Exportable>(title: &str, mode: ExportMode, groups: &[i32]) -> Result<Self> {
        Self::builder().title(title).build_for::<T>(mode, groups)
    }

    /// Export with a literal header list; each title may carry a `**` comment
    pub fn with_headers<I, S>(title: &str, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().title(title).build_with_headers(headers)
    }

    /// Start a configured export
    pub fn builder() -> ExcelExportBuilder {
        ExcelExportBuilder::new()
    }

    fn open(
        title: Option<&str>,
        plan: ColumnPlan,
        options: ExportOptions,
        registry: FormatterRegistry,
    ) -> Result<Self> {
        let sheet_name = options.sheet_name.clone();
        let mut workbook = StreamingWorkbook::new(options);
        workbook.start_sheet(&sheet_name, title, &plan)?;

        Ok(ExcelExport {
            workbook,
            plan,
            registry,
        })
    }

    /// Column plan of the active sheet
    pub fn plan(&self) -> &ColumnPlan {
        &self.plan
    }

    /// Counters of the active sheet
    pub fn stats(&self) -> SheetStats {
        self.workbook.stats()
    }

    /// Number of sheets in the workbook
    pub fn sheet_count(&self) -> usize {
        self.workbook.sheet_count()
    }

    /// Check if [`ExcelExport::dispose`] was called
    pub fn is_disposed(&self) -> bool {
        self.workbook.is_disposed()
    }

    /// Append one row per record
    pub fn set_data_list<'r, I, R>(&mut self, records: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = &'r R>,
        R: Record + 'r,
    {
        for record in records {
            self.add_record(record)?;
        }
        Ok(self)
    }

    /// Append one row read from a record through the plan's accessors
    ///
    /// A property that cannot be read yields an empty cell.
    pub fn add_record(&mut self, record: &dyn Record) -> Result<()> {
        let row = self.workbook.next_row();
        let registry = &self.registry;

        let cells: Vec<FormattedCell> = self
            .plan
            .iter()
            .enumerate()
            .map(|(col, column)| {
                let value = match &column.accessor {
                    Some(accessor) => accessor.resolve(record).unwrap_or_else(|err| {
                        tracing::debug!(
                            cell = %cell_reference(row, col as u16),
                            record = record.type_name(),
                            error = %err,
                            "property unavailable, writing empty cell"
                        );
                        Value::Null
                    }),
                    None => Value::Null,
                };
                format_value(value, column.format_hints(), registry)
            })
            .collect();

        self.workbook.append(&self.plan, cells)
    }

    /// Append a row of raw values in column order
    ///
    /// Short rows are padded with empty cells; a row wider than the plan is
    /// rejected.
    pub fn add_row<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() > self.plan.len() {
            return Err(ExportError::RowTooWide {
                row: self.workbook.next_row(),
                expected: self.plan.len(),
                actual: values.len(),
            });
        }
        values.resize(self.plan.len(), Value::Null);

        let cells = values
            .into_iter()
            .zip(self.plan.iter())
            .map(|(value, column)| format_value(value, column.format_hints(), &self.registry))
            .collect();

        self.workbook.append(&self.plan, cells)
    }

    /// Finish the active sheet and continue on a new one with its own plan
    pub fn add_sheet(&mut self, name: &str, title: &str, plan: ColumnPlan) -> Result<()> {
        self.workbook.start_sheet(name, Some(title), &plan)?;
        self.plan = plan;
        Ok(())
    }

    /// [`ExcelExport::add_sheet`] with the plan resolved from `T`
    pub fn add_sheet_for<T: Exportable>(
        &mut self,
        name: &str,
        title: &str,
        mode: ExportMode,
        groups: &[i32],
    ) -> Result<()> {
        self.add_sheet(name, title, ColumnPlan::for_record::<T>(mode, groups))
    }

    /// Serialize the workbook into a byte sink
    ///
    /// The artifact is spooled to a temporary file first and then streamed,
    /// so it is never held in memory as a whole.
    pub fn write<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        let mut spool = self.workbook.save_to_spool()?;
        io::copy(&mut spool, out)?;
        out.flush()?;
        Ok(())
    }

    /// Serialize the workbook to a file
    pub fn write_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.workbook.save(path)
    }

    /// Serialize the workbook as a download on a response sink
    ///
    /// The sink is reset, given the binary content type and an attachment
    /// disposition carrying the percent-encoded `file_name`, then receives
    /// the body. A failure before the body is produced leaves the sink
    /// untouched.
    pub fn write_response<S: ResponseSink + ?Sized>(
        &mut self,
        response: &mut S,
        file_name: &str,
    ) -> Result<()> {
        let mut spool = self.workbook.save_to_spool()?;

        response.reset();
        response.set_content_type(CONTENT_TYPE);
        response.set_header(CONTENT_DISPOSITION, &content_disposition(file_name));

        let body = response.body();
        io::copy(&mut spool, body)?;
        body.flush()?;
        Ok(())
    }

    /// Release buffered rows and the backend's temporary files
    ///
    /// Safe to call more than once; later writes fail with
    /// [`ExportError::Disposed`].
    pub fn dispose(&mut self) {
        self.workbook.dispose();
    }
}

/// Builder for configured exports
#[derive(Debug, Clone, Default)]
pub struct ExcelExportBuilder {
    title: Option<String>,
    options: ExportOptions,
    registry: FormatterRegistry,
}

impl ExcelExportBuilder {
    /// Create a builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Title row text; blank means no title row
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Name of the first sheet
    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.options.sheet_name = name.into();
        self
    }

    /// Rows kept in memory before older rows are flushed
    pub fn flush_threshold(mut self, rows: usize) -> Self {
        self.options.flush_threshold = rows;
        self
    }

    /// Take the flush threshold from a memory profile
    pub fn memory_profile(mut self, profile: MemoryProfile) -> Self {
        profile.apply(&mut self.options);
        self
    }

    /// Replace all options
    pub fn options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a prepared formatter registry
    pub fn registry(mut self, registry: FormatterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a formatter for a type tag
    pub fn formatter<F>(mut self, type_tag: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<String, FormatError> + Send + Sync + 'static,
    {
        self.registry.register(type_tag, func);
        self
    }

    /// Build an export of `T` for a mode and group filter
    pub fn build_for<T: Exportable>(self, mode: ExportMode, groups: &[i32]) -> Result<ExcelExport> {
        let plan = ColumnPlan::for_record::<T>(mode, groups);
        self.build_with_plan(plan)
    }

    /// Build an export with a literal header list
    pub fn build_with_headers<I, S>(self, headers: I) -> Result<ExcelExport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let plan = ColumnPlan::from_headers(headers)?;
        self.build_with_plan(plan)
    }

    /// Build an export with a prepared plan
    pub fn build_with_plan(self, plan: ColumnPlan) -> Result<ExcelExport> {
        ExcelExport::open(self.title.as_deref(), plan, self.options, self.registry)
    }
}
