//! Type coercion for the numeric and date columns.
//!
//! Coercion never fails: anything that does not parse becomes a null cell.

use crate::error::Result;
use crate::role::Role;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use ventas_sheet::{CellValue, Sheet};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Month-first wins for ambiguous dates such as 03/04/2024
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Last Excel serial day (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Coerce one cell to a number.
#[must_use]
pub fn to_numeric(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Int(i) => CellValue::Int(*i),
        CellValue::Float(f) if f.is_nan() => CellValue::Null,
        CellValue::Float(f) => CellValue::Float(*f),
        CellValue::Bool(b) => CellValue::Int(i64::from(*b)),
        CellValue::String(s) => parse_number(s),
        CellValue::Null | CellValue::DateTime(_) => CellValue::Null,
    }
}

fn parse_number(s: &str) -> CellValue {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if !f.is_nan() => CellValue::Float(f),
        _ => CellValue::Null,
    }
}

/// Coerce one cell to a date-time.
///
/// Numbers are read as Excel serial day numbers.
#[must_use]
pub fn to_datetime(cell: &CellValue) -> CellValue {
    let parsed = match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::String(s) => parse_datetime(s),
        CellValue::Int(i) => from_excel_serial(*i as f64),
        CellValue::Float(f) => from_excel_serial(*f),
        CellValue::Null | CellValue::Bool(_) => None,
    };
    CellValue::from(parsed)
}

/// Parse a text date-time in one of the accepted layouts.
#[must_use]
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// Coerce a column of cells to numbers.
#[must_use]
pub fn coerce_numeric(column: &[CellValue]) -> Vec<CellValue> {
    column.iter().map(to_numeric).collect()
}

/// Coerce a column of cells to date-times.
#[must_use]
pub fn coerce_datetime(column: &[CellValue]) -> Vec<CellValue> {
    column.iter().map(to_datetime).collect()
}

/// Coerce `unidades` and `ventas` to numbers and `fecha` (if present) to date-times.
pub fn normalize(sheet: &mut Sheet) -> Result<()> {
    sheet.column_map_by_name(Role::Unidades.canonical_name(), to_numeric)?;
    sheet.column_map_by_name(Role::Ventas.canonical_name(), to_numeric)?;
    if sheet.has_column(Role::Fecha.canonical_name()) {
        sheet.column_map_by_name(Role::Fecha.canonical_name(), to_datetime)?;
    }
    Ok(())
}
