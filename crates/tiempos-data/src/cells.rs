//! Thin adapter between `calamine` cells and the core value types.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use tiempos_core::time_utils::{excel_serial_to_date, parse_date_text};
use tiempos_core::values::RawValue;
use tiempos_core::{Result, TiemposError};

pub type WorkbookHandle = Xlsx<BufReader<File>>;

/// Open an `.xlsx` workbook regardless of the extension's case.
pub fn open_workbook(path: &Path) -> Result<WorkbookHandle> {
    if !path.exists() {
        return Err(TiemposError::FileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
        });
    }
    calamine::open_workbook::<WorkbookHandle, _>(path).map_err(|e| TiemposError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read one worksheet by name.
pub fn read_sheet(workbook: &mut WorkbookHandle, path: &Path, name: &str) -> Result<Range<Data>> {
    workbook
        .worksheet_range(name)
        .map_err(|e| TiemposError::Workbook {
            path: path.to_path_buf(),
            message: format!("sheet '{}': {}", name, e),
        })
}

/// Convert a cell into the value normalizer's input type.
pub fn to_raw(cell: &Data) -> RawValue {
    match cell {
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Float(f) => RawValue::Number(*f),
        Data::Bool(b) => RawValue::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
        _ => RawValue::Missing,
    }
}

/// Header text of a cell: trimmed, empty for blank cells.
pub fn to_header(cell: &Data) -> String {
    to_raw(cell).as_identifier().unwrap_or_default()
}

/// Interpret a cell as a calendar date.
pub fn to_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::String(s) | Data::DateTimeIso(s) => parse_date_text(s),
        _ => None,
    }
}
