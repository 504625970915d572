use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use models::{Bank, StatementError};
use serde_json::Value;

/// The first worksheet of a statement workbook: header row 0 plus data
/// rows, with cells already converted to JSON values.
///
/// Parsers run their column-mapping rules against this, so the rules stay
/// testable without binary workbook fixtures.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawSheet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Open a workbook from raw statement bytes. The container is chosen
    /// by file extension: `.xls` uses the legacy binary reader, everything
    /// else is read as XLSX.
    pub fn from_bytes(bytes: &[u8], file_name: &str) -> Result<Self> {
        let cursor = Cursor::new(bytes.to_vec());
        if file_name.to_lowercase().ends_with(".xls") {
            let mut workbook =
                Xls::new(cursor).with_context(|| format!("cannot open {} as xls", file_name))?;
            let sheet_name = first_sheet_name(workbook.sheet_names().first().cloned(), file_name)?;
            let range = workbook
                .worksheet_range(&sheet_name)
                .with_context(|| format!("cannot read sheet '{}' in {}", sheet_name, file_name))?;
            Self::from_range(&range, file_name)
        } else {
            let mut workbook =
                Xlsx::new(cursor).with_context(|| format!("cannot open {} as xlsx", file_name))?;
            let sheet_name = first_sheet_name(workbook.sheet_names().first().cloned(), file_name)?;
            let range = workbook
                .worksheet_range(&sheet_name)
                .with_context(|| format!("cannot read sheet '{}' in {}", sheet_name, file_name))?;
            Self::from_range(&range, file_name)
        }
    }

    /// Header row 0, data rows below; single point of cell conversion.
    pub fn from_range(range: &Range<Data>, file_name: &str) -> Result<Self> {
        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| anyhow!("no header row in {}", file_name))?;
        let columns: Vec<String> = header.iter().map(|c| cell_str(c).trim().to_string()).collect();

        let data = rows
            .map(|r| {
                let mut row: Vec<Value> = r.iter().map(cell_value).collect();
                row.resize(columns.len(), Value::Null);
                row
            })
            .collect();

        Ok(Self {
            columns,
            rows: data,
        })
    }

    /// Index of the first column with this exact header text.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

fn first_sheet_name(name: Option<String>, file_name: &str) -> Result<String> {
    name.ok_or_else(|| anyhow!("no sheets found in {}", file_name))
}

/// Resolve every required column or fail naming the first missing one.
pub fn require_columns(
    sheet: &RawSheet,
    bank: Bank,
    names: &[&str],
) -> Result<Vec<usize>, StatementError> {
    names
        .iter()
        .map(|name| {
            sheet.column(name).ok_or_else(|| StatementError::MissingColumn {
                bank: bank.name(),
                column: name.to_string(),
            })
        })
        .collect()
}

/// Lossy text view of a workbook cell, used for headers and free text.
pub fn cell_str(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// JSON value view of a workbook cell. Typed date cells become ISO
/// date-time strings so the day-first parsers treat typed and text dates
/// the same way.
pub fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) => Value::String(cell_str(cell)),
        other => Value::String(other.to_string()),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y", "%Y-%m-%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Day-first date-time parse, tolerant of the formats the bank templates
/// actually ship. Date-only inputs land on midnight.
pub fn parse_datetime_dayfirst(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Day-first calendar date parse.
pub fn parse_date_dayfirst(raw: &str) -> Option<NaiveDate> {
    parse_datetime_dayfirst(raw).map(|dt| dt.date())
}

/// Time-of-day parse; accepts bare times and full date-times.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    parse_datetime_dayfirst(s).map(|dt| dt.time())
}

/// Decimal parse with thousands-separator commas stripped.
/// Returns None for anything non-numeric; callers decide the fallback.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.replace(',', "").parse::<f64>().ok()
}

/// Decimal view of a JSON cell: numbers pass through, strings are parsed.
pub fn decimal_cell(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_datetime_dayfirst_prefers_day_first() {
        let dt = parse_datetime_dayfirst("02/03/2024 14:05:09").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(dt.time(), NaiveTime::from_hms_opt(14, 5, 9).unwrap());
    }

    #[test]
    fn test_parse_datetime_accepts_iso_from_typed_cells() {
        let dt = parse_datetime_dayfirst("2024-03-02 01:07:53").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn test_parse_date_only_input_lands_on_midnight() {
        let dt = parse_datetime_dayfirst("31/12/2024").unwrap();
        assert_eq!(dt.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime_dayfirst("").is_none());
        assert!(parse_datetime_dayfirst("-").is_none());
        assert!(parse_datetime_dayfirst("not a date").is_none());
    }

    #[test]
    fn test_parse_time_variants() {
        assert_eq!(
            parse_time("14:05:09"),
            NaiveTime::from_hms_opt(14, 5, 9)
        );
        assert_eq!(parse_time("14:05"), NaiveTime::from_hms_opt(14, 5, 0));
        assert_eq!(
            parse_time("2024-03-02 01:07:53"),
            NaiveTime::from_hms_opt(1, 7, 53)
        );
        assert_eq!(parse_time("soon"), None);
    }

    #[test]
    fn test_parse_decimal_strips_thousands_separators() {
        assert_eq!(parse_decimal("1,234.50"), Some(1234.50));
        assert_eq!(parse_decimal(" 42 "), Some(42.0));
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_decimal_cell_handles_numbers_and_strings() {
        assert_eq!(decimal_cell(&json!(12.5)), Some(12.5));
        assert_eq!(decimal_cell(&json!("1,000")), Some(1000.0));
        assert_eq!(decimal_cell(&json!("x")), None);
        assert_eq!(decimal_cell(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_require_columns_names_the_missing_column() {
        let sheet = RawSheet::new(
            vec!["A".to_string(), "B".to_string()],
            vec![],
        );
        let err = require_columns(&sheet, Bank::Ttb, &["A", "Amount"]).unwrap_err();
        match err {
            StatementError::MissingColumn { bank, column } => {
                assert_eq!(bank, "TTB");
                assert_eq!(column, "Amount");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
