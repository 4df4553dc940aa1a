//! Range extraction: open a workbook, resolve the target sheet, clamp the
//! requested rectangle to the sheet's used range and materialize it as
//! display text.

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{ConvertError, Result};

/// A resolved request for a rectangular block of cells. All indices are
/// 1-based and inclusive.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub path: PathBuf,
    pub sheet: Option<String>,
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
}

/// Rectangular grid of cell display text. Every row has the same length;
/// missing cells are empty strings, never a sentinel.
#[derive(Debug, Clone, Default)]
pub struct CellGrid {
    rows: Vec<Vec<String>>,
}

impl CellGrid {
    pub fn from_rows(rows: Vec<Vec<String>>) -> CellGrid {
        debug_assert!(rows.windows(2).all(|w| w[0].len() == w[1].len()));
        CellGrid { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.col_count() == 0
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Result of an extraction: the grid plus any non-fatal clamp warnings.
#[derive(Debug)]
pub struct Extraction {
    pub grid: CellGrid,
    pub warnings: Vec<String>,
    /// Name of the sheet that was actually read
    pub sheet_used: String,
}

/// Extract the requested rectangle from the spreadsheet at `request.path`.
///
/// The file is opened read-only; formulas come back as their last-calculated
/// values. A request extending past the sheet's used range is clamped with a
/// warning; a request starting past it yields an empty grid.
pub fn extract(request: &ExtractionRequest) -> Result<Extraction> {
    if !request.path.exists() {
        return Err(ConvertError::FileNotFound {
            path: request.path.clone(),
        });
    }

    let mut workbook: Sheets<_> =
        open_workbook_auto(&request.path).map_err(|e| open_error(request, e))?;

    let sheet_names = workbook.sheet_names().to_vec();

    let target_sheet = match &request.sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(ConvertError::SheetNotFound {
                    sheet: name.clone(),
                    available: sheet_names.join(", "),
                });
            }
            name.clone()
        }
        None => sheet_names.first().cloned().unwrap_or_default(),
    };

    let range = workbook
        .worksheet_range(&target_sheet)
        .map_err(|e| ConvertError::UnsupportedFormat {
            path: request.path.clone(),
            reason: format!("failed to read sheet '{}': {}", target_sheet, e),
        })?;

    // Used-range bounds, 1-based inclusive. An empty sheet has no end.
    let (max_row, max_col) = match range.end() {
        Some((row, col)) => (row + 1, col + 1),
        None => (0, 0),
    };

    let mut warnings = Vec::new();
    let (row_start, row_end) = clamp_axis(request.start_row, request.end_row, max_row);
    if request.end_row > max_row {
        warnings.push(format!("Specified rows exceed sheet maximum ({})", max_row));
    }
    let (col_start, col_end) = clamp_axis(request.start_col, request.end_col, max_col);
    if request.end_col > max_col {
        warnings.push(format!(
            "Specified columns exceed sheet maximum ({})",
            max_col
        ));
    }

    let mut rows = Vec::new();
    if row_start <= row_end && col_start <= col_end && row_end >= 1 && col_end >= 1 {
        for row in row_start..=row_end {
            let mut row_data = Vec::new();
            for col in col_start..=col_end {
                let cell = range.get_value((row - 1, col - 1));
                row_data.push(display_value(cell));
            }
            rows.push(row_data);
        }
    }

    Ok(Extraction {
        grid: CellGrid::from_rows(rows),
        warnings,
        sheet_used: target_sheet,
    })
}

/// Clamp a 1-based inclusive axis range to `max`. A start beyond `max`
/// produces an inverted (empty) range.
fn clamp_axis(start: u32, end: u32, max: u32) -> (u32, u32) {
    (start, end.min(max))
}

fn open_error(request: &ExtractionRequest, err: calamine::Error) -> ConvertError {
    match err {
        calamine::Error::Io(e) if e.kind() == ErrorKind::PermissionDenied => {
            ConvertError::PermissionDenied {
                path: request.path.clone(),
                action: "read",
            }
        }
        other => ConvertError::UnsupportedFormat {
            path: request.path.clone(),
            reason: format!("failed to open workbook: {}", other),
        },
    }
}

/// Convert a cell to its display text. Empty cells become the empty string.
fn display_value(cell: Option<&Data>) -> String {
    match cell {
        None => String::new(),
        Some(data) => match data {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => display_float(*f),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Data::DateTime(dt) => format_excel_datetime(dt.as_f64()),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
            Data::Error(e) => e.to_string(),
        },
    }
}

/// Integral floats display without a trailing ".0", matching how the
/// spreadsheet UI shows them.
fn display_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Format an Excel serial datetime (days since 1899-12-30) as display text.
/// Pure dates (no time fraction) omit the midnight time.
fn format_excel_datetime(value: f64) -> String {
    let mut days = value.floor() as i64;
    let time_fraction = value.fract();

    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();

    if time_fraction == 0.0 {
        let date = epoch + chrono::Duration::days(days);
        return date.format("%Y-%m-%d").to_string();
    }

    // A fraction close enough to 1.0 rounds up to a full day; carry it.
    let mut total_seconds = (time_fraction * 86400.0).round() as u32;
    days += i64::from(total_seconds / 86400);
    total_seconds %= 86400;
    let date = epoch + chrono::Duration::days(days);

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let time = chrono::NaiveTime::from_hms_opt(hours, minutes, seconds).unwrap_or_default();
    chrono::NaiveDateTime::new(date, time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
