//! Workbook lifecycle: sheets, serialization and disposal

use super::sheet::{SheetStats, StreamingSheet};
use crate::config::ExportOptions;
use crate::error::{ExportError, Result};
use crate::format::FormattedCell;
use crate::metadata::ColumnPlan;
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

/// A constant-memory workbook with one active sheet at a time
///
/// The workbook is serialized at most once. A flush or serialization failure
/// is sticky: every later operation except [`StreamingWorkbook::dispose`]
/// returns [`ExportError::Aborted`], since rows may already be missing.
/// `dispose` drops the backend and its temporary files whether or not it was
/// written.
pub struct StreamingWorkbook {
    workbook: Option<Workbook>,
    sheet: Option<StreamingSheet>,
    options: ExportOptions,
    sheet_count: usize,
    written: bool,
    failure: Option<String>,
}

impl StreamingWorkbook {
    /// Create an empty workbook
    pub fn new(options: ExportOptions) -> Self {
        StreamingWorkbook {
            workbook: Some(Workbook::new()),
            sheet: None,
            options,
            sheet_count: 0,
            written: false,
            failure: None,
        }
    }

    /// Options this workbook was created with
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Number of sheets started so far
    pub fn sheet_count(&self) -> usize {
        self.sheet_count
    }

    /// Check if [`StreamingWorkbook::dispose`] was called
    pub fn is_disposed(&self) -> bool {
        self.workbook.is_none()
    }

    /// Check if an earlier failure aborted this workbook
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Counters of the active sheet
    pub fn stats(&self) -> SheetStats {
        self.sheet.as_ref().map(StreamingSheet::stats).unwrap_or_default()
    }

    /// Zero-based index of the next row on the active sheet
    pub fn next_row(&self) -> u32 {
        self.sheet.as_ref().map_or(0, StreamingSheet::next_row)
    }

    /// Finish the active sheet and start a new one with title and header rows
    ///
    /// A blank title skips the title row.
    pub fn start_sheet(&mut self, name: &str, title: Option<&str>, plan: &ColumnPlan) -> Result<()> {
        let result = self.open_sheet(name, title, plan);
        self.track(result)
    }

    fn open_sheet(&mut self, name: &str, title: Option<&str>, plan: &ColumnPlan) -> Result<()> {
        let workbook = live(&mut self.workbook, self.failure.as_deref(), self.written)?;

        if let Some(previous) = self.sheet.as_mut() {
            previous.flush_all(workbook)?;
            tracing::debug!(from = previous.name(), to = name, "switching sheet");
        }

        let mut sheet = StreamingSheet::new(workbook, self.sheet_count, name, plan, &self.options)?;
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            sheet.append_title(workbook, title, self.options.title_row_height)?;
        }
        sheet.append_header(workbook, plan, self.options.header_row_height)?;

        self.sheet = Some(sheet);
        self.sheet_count += 1;
        Ok(())
    }

    /// Append a formatted data row to the active sheet
    pub fn append(&mut self, plan: &ColumnPlan, cells: Vec<FormattedCell>) -> Result<()> {
        let workbook = live(&mut self.workbook, self.failure.as_deref(), self.written)?;
        let sheet = self.sheet.as_mut().ok_or(ExportError::Disposed)?;
        let result = sheet.append_data(workbook, plan, cells);
        self.track(result)
    }

    fn finish(&mut self) -> Result<&mut Workbook> {
        let workbook = live(&mut self.workbook, self.failure.as_deref(), self.written)?;
        if let Some(sheet) = self.sheet.as_mut() {
            sheet.flush_all(workbook)?;
            let stats = sheet.stats();
            tracing::info!(
                sheets = self.sheet_count,
                rows = stats.rows_appended,
                data_rows = stats.data_rows,
                flushes = stats.flush_count,
                "serializing workbook"
            );
        }
        self.written = true;
        Ok(workbook)
    }

    /// Serialize every sheet into an anonymous temporary file
    ///
    /// The returned file is rewound to its start, ready to be copied into a
    /// sink. It is deleted by the OS once dropped.
    pub fn save_to_spool(&mut self) -> Result<File> {
        let result = self.spool();
        self.track(result)
    }

    fn spool(&mut self) -> Result<File> {
        let workbook = self.finish()?;
        let mut file = tempfile::tempfile()?;
        workbook.save_to_writer(&mut file)?;
        file.seek(SeekFrom::Start(0))?;
        Ok(file)
    }

    /// Serialize every sheet to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let result = self.finish().and_then(|workbook| Ok(workbook.save(path.as_ref())?));
        self.track(result)
    }

    /// Record a fatal failure so later operations refuse to continue
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            let lifecycle = matches!(
                err,
                ExportError::Disposed | ExportError::AlreadyWritten | ExportError::Aborted { .. }
            );
            if !lifecycle && self.failure.is_none() {
                tracing::debug!(error = %err, "workbook aborted");
                self.failure = Some(err.to_string());
            }
        }
        result
    }

    /// Release the window and backend; idempotent
    pub fn dispose(&mut self) {
        self.sheet = None;
        if self.workbook.take().is_some() {
            tracing::debug!(sheets = self.sheet_count, "workbook disposed");
        }
    }
}

fn live<'a>(
    workbook: &'a mut Option<Workbook>,
    failure: Option<&str>,
    written: bool,
) -> Result<&'a mut Workbook> {
    let workbook = workbook.as_mut().ok_or(ExportError::Disposed)?;
    if let Some(cause) = failure {
        return Err(ExportError::Aborted {
            cause: cause.to_string(),
        });
    }
    if written {
        return Err(ExportError::AlreadyWritten);
    }
    Ok(workbook)
}
