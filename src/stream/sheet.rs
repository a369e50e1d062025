//! Bounded-memory sheet builder
//!
//! Rows are first staged in a FIFO window. When the window grows past the
//! flush threshold the oldest rows are written to a constant-memory backend
//! worksheet, which spills them to a temporary file. Peak memory therefore
//! depends on the threshold, not on the number of rows appended.

use crate::config::ExportOptions;
use crate::error::{ExportError, Result};
use crate::format::FormattedCell;
use crate::metadata::ColumnPlan;
use crate::style::{StyleCache, StyleHandle, StyleKey};
use crate::types::CellValue;
use rust_xlsxwriter::{Format, Note, Workbook, Worksheet, XlsxError};
use std::collections::VecDeque;

/// Widest column plan a worksheet can hold
pub const MAX_COLUMNS: usize = 16_384;

/// Counters for one sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetStats {
    /// Rows appended so far, title and header included
    pub rows_appended: u64,
    /// Data rows appended so far
    pub data_rows: u64,
    /// Rows already written to the backend
    pub rows_flushed: u64,
    /// Threshold-triggered flushes; the final flush is not counted
    pub flush_count: u64,
    /// Rows currently held in the window
    pub rows_buffered: usize,
}

#[derive(Debug)]
struct BufferedCell {
    value: CellValue,
    style: Option<StyleHandle>,
    note: Option<String>,
}

#[derive(Debug)]
struct BufferedRow {
    index: u32,
    height: Option<f64>,
    cells: Vec<BufferedCell>,
    // last column of a merge starting at column 0
    merge_to: Option<u16>,
}

/// One worksheet being built row by row
#[derive(Debug)]
pub struct StreamingSheet {
    name: String,
    index: usize,
    columns: u16,
    window: VecDeque<BufferedRow>,
    flush_threshold: usize,
    next_row: u32,
    stats: SheetStats,
    styles: StyleCache,
}

impl StreamingSheet {
    /// Add a constant-memory worksheet at `index` sized for `plan`
    pub fn new(
        workbook: &mut Workbook,
        index: usize,
        name: &str,
        plan: &ColumnPlan,
        options: &ExportOptions,
    ) -> Result<Self> {
        if plan.len() > MAX_COLUMNS {
            return Err(ExportError::TooManyColumns(plan.len()));
        }
        let columns = plan.len() as u16;

        let worksheet = workbook.add_worksheet_with_constant_memory();
        worksheet.set_name(name)?;
        for col in 0..columns {
            worksheet.set_column_width(col, options.column_width)?;
        }

        let flush_threshold = options.flush_threshold.max(1);
        tracing::debug!(sheet = name, index, columns, flush_threshold, "sheet initialized");

        Ok(StreamingSheet {
            name: name.to_string(),
            index,
            columns,
            window: VecDeque::with_capacity(flush_threshold + 1),
            flush_threshold,
            next_row: 0,
            stats: SheetStats::default(),
            styles: StyleCache::new(&options.font_name),
        })
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based index of the next row to be appended
    pub fn next_row(&self) -> u32 {
        self.next_row
    }

    /// Number of columns in this sheet's plan
    pub fn columns(&self) -> u16 {
        self.columns
    }

    /// Current counters
    pub fn stats(&self) -> SheetStats {
        SheetStats {
            rows_buffered: self.window.len(),
            ..self.stats
        }
    }

    /// Append the title row, merged over the plan when it spans several columns
    pub fn append_title(&mut self, workbook: &mut Workbook, title: &str, height: f64) -> Result<()> {
        let merge_to = (self.columns > 1).then(|| self.columns - 1);
        let cell = BufferedCell {
            value: CellValue::Text(title.to_string()),
            style: Some(self.styles.title().clone()),
            note: None,
        };
        self.push(workbook, vec![cell], Some(height), merge_to)
    }

    /// Append the header row, attaching each column's comment as a note
    pub fn append_header(&mut self, workbook: &mut Workbook, plan: &ColumnPlan, height: f64) -> Result<()> {
        let header = self.styles.header().clone();
        let cells = plan
            .iter()
            .map(|column| BufferedCell {
                value: CellValue::Text(column.header.clone()),
                style: Some(header.clone()),
                note: column.comment.clone(),
            })
            .collect();
        self.push(workbook, cells, Some(height), None)
    }

    /// Append one data row of already formatted cells
    ///
    /// `cells` must hold exactly one entry per plan column. The style of a
    /// column is fixed by the first non-empty cell written to it.
    pub fn append_data(
        &mut self,
        workbook: &mut Workbook,
        plan: &ColumnPlan,
        cells: Vec<FormattedCell>,
    ) -> Result<()> {
        debug_assert_eq!(cells.len(), plan.len());

        let row = cells
            .into_iter()
            .zip(plan.iter())
            .enumerate()
            .map(|(col, (cell, column))| {
                let style = (!cell.value.is_empty()).then(|| {
                    let key = StyleKey::new(col as u16, column.alignment);
                    self.styles.get_or_create(key, cell.format)
                });
                BufferedCell {
                    value: cell.value,
                    style,
                    note: None,
                }
            })
            .collect();

        self.stats.data_rows += 1;
        self.push(workbook, row, None, None)
    }

    fn push(
        &mut self,
        workbook: &mut Workbook,
        cells: Vec<BufferedCell>,
        height: Option<f64>,
        merge_to: Option<u16>,
    ) -> Result<()> {
        let index = self.next_row;
        tracing::trace!(sheet = %self.name, row = index, "row appended");

        self.window.push_back(BufferedRow {
            index,
            height,
            cells,
            merge_to,
        });
        self.next_row += 1;
        self.stats.rows_appended += 1;

        if self.window.len() > self.flush_threshold {
            let overflow = self.window.len() - self.flush_threshold;
            self.flush_rows(workbook, overflow)?;
            self.stats.flush_count += 1;
            tracing::debug!(
                sheet = %self.name,
                rows = overflow,
                flushed = self.stats.rows_flushed,
                "flushed oldest rows"
            );
        }
        Ok(())
    }

    /// Write every buffered row to the backend
    pub fn flush_all(&mut self, workbook: &mut Workbook) -> Result<()> {
        let pending = self.window.len();
        self.flush_rows(workbook, pending)
    }

    fn flush_rows(&mut self, workbook: &mut Workbook, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        let worksheet = workbook
            .worksheet_from_index(self.index)
            .map_err(|e| self.flush_error(self.next_row, e))?;

        for _ in 0..count {
            let Some(row) = self.window.front() else {
                break;
            };
            // a row leaves the window only once the backend accepted it
            if let Err(e) = write_row(worksheet, row) {
                return Err(self.flush_error(row.index, e));
            }
            self.window.pop_front();
            self.stats.rows_flushed += 1;
        }
        Ok(())
    }

    fn flush_error(&self, row: u32, err: XlsxError) -> ExportError {
        ExportError::FlushError {
            row,
            sheet: self.name.clone(),
            source: Box::new(ExportError::Xlsx(err)),
        }
    }
}

fn write_row(worksheet: &mut Worksheet, row: &BufferedRow) -> std::result::Result<(), XlsxError> {
    if let Some(height) = row.height {
        worksheet.set_row_height(row.index, height)?;
    }

    if let (Some(last), Some(cell)) = (row.merge_to, row.cells.first()) {
        let unstyled = Format::new();
        let format = cell.style.as_ref().map_or(&unstyled, StyleHandle::format);
        worksheet.merge_range(row.index, 0, row.index, last, &cell.value.as_string(), format)?;
        return Ok(());
    }

    for (col, cell) in row.cells.iter().enumerate() {
        let col = col as u16;
        write_cell(
            worksheet,
            row.index,
            col,
            &cell.value,
            cell.style.as_ref().map(StyleHandle::format),
        )?;
        if let Some(note) = &cell.note {
            worksheet.insert_note(row.index, col, &Note::new(note.as_str()))?;
        }
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: Option<&Format>,
) -> std::result::Result<(), XlsxError> {
    match value {
        // empty cells are never materialized
        CellValue::Empty => {}
        CellValue::Text(s) | CellValue::CustomText(s) => {
            match format {
                Some(format) => worksheet.write_string_with_format(row, col, s.as_str(), format)?,
                None => worksheet.write_string(row, col, s.as_str())?,
            };
        }
        CellValue::Timestamp(dt) => {
            match format {
                Some(format) => worksheet.write_datetime_with_format(row, col, dt, format)?,
                None => worksheet.write_datetime(row, col, dt)?,
            };
        }
        numeric => {
            let number = numeric.as_f64().unwrap_or_default();
            match format {
                Some(format) => worksheet.write_number_with_format(row, col, number, format)?,
                None => worksheet.write_number(row, col, number)?,
            };
        }
    }
    Ok(())
}
