//! Positional rows and the text coercion applied to every cell.
//!
//! The executor decodes each column into a [`CellValue`]; records are then
//! built from a [`RawRow`] by position. Coercion to text never fails, a NULL
//! renders as `None`. Floats and clock times use the same text as Python's
//! `str()`, which existing consumers of the listings expect.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use sqlx::types::Decimal;

use crate::errors::{AppError, AppResult};

/// Placeholder text for a NULL column.
pub const NULL_TEXT: &str = "None";

/// A single decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(NULL_TEXT),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write_float(f, *v),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Time(v) => write_clock(f, v),
            Self::Timestamp(v) => write_timestamp(f, v),
            Self::TimestampTz(v) => {
                write_timestamp(f, &v.naive_utc())?;
                f.write_str("+00:00")
            }
            Self::Bytes(bytes) => bytes.iter().try_for_each(|b| write!(f, "{b:02x}")),
        }
    }
}

/// Shortest round-trip digits, positional for exponents in `-4..16` (with a
/// trailing `.0` when integral) and `1e+16` style outside it.
fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        return f.write_str("nan");
    }
    if v.is_infinite() {
        return f.write_str(if v > 0.0 { "inf" } else { "-inf" });
    }

    let scientific = format!("{v:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return write!(f, "{v}");
    };
    let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;
    if (-4..16).contains(&exponent) {
        let positional = v.to_string();
        if positional.contains('.') {
            f.write_str(&positional)
        } else {
            write!(f, "{positional}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exponent.abs())
    }
}

/// `HH:MM:SS`, followed by six-digit microseconds when they are non-zero.
fn write_clock(f: &mut fmt::Formatter<'_>, time: &NaiveTime) -> fmt::Result {
    write!(f, "{}", time.format("%H:%M:%S"))?;
    let micros = time.nanosecond() % 1_000_000_000 / 1_000;
    if micros != 0 {
        write!(f, ".{micros:06}")?;
    }
    Ok(())
}

fn write_timestamp(f: &mut fmt::Formatter<'_>, ts: &NaiveDateTime) -> fmt::Result {
    write!(f, "{} ", ts.format("%Y-%m-%d"))?;
    write_clock(f, &ts.time())
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One positional tuple returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow(pub Vec<CellValue>);

impl RawRow {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<CellValue>> for RawRow {
    fn from(cells: Vec<CellValue>) -> Self {
        Self(cells)
    }
}

/// Sequential reader over the cells of a row, yielding their text form.
pub struct Fields<'a> {
    cells: std::slice::Iter<'a, CellValue>,
}

impl Fields<'_> {
    /// Text of the next cell.
    pub fn take(&mut self) -> String {
        self.cells
            .next()
            .map(ToString::to_string)
            .unwrap_or_else(|| NULL_TEXT.to_string())
    }
}

/// Records that can be built from a positional row.
///
/// The field order of an implementation must match the column order of the
/// statement that feeds it.
pub trait FromRawRow: Sized {
    /// Record name used in mapping errors.
    const RECORD: &'static str;

    /// Number of leading columns the record reads.
    const FIELD_COUNT: usize;

    /// Builds the record by taking fields from `fields` in column order.
    /// Only called once the row is known to be wide enough.
    fn from_fields(fields: Fields<'_>) -> Self;

    /// Maps one row, failing with `AppError::RowMapping` when it is too short.
    /// Columns past [`Self::FIELD_COUNT`] are ignored.
    fn from_raw_row(row: &RawRow) -> AppResult<Self> {
        if row.len() < Self::FIELD_COUNT {
            return Err(AppError::RowMapping {
                record: Self::RECORD,
                expected: Self::FIELD_COUNT,
                actual: row.len(),
            });
        }
        Ok(Self::from_fields(Fields {
            cells: row.0.iter(),
        }))
    }
}

/// Maps every row in order, stopping at the first malformed one.
pub fn map_rows<T: FromRawRow>(rows: &[RawRow]) -> AppResult<Vec<T>> {
    rows.iter().map(T::from_raw_row).collect()
}
