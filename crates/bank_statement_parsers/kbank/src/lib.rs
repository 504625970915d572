use anyhow::Result;
use general_parser::{
    decimal_cell, parse_date_dayfirst, parse_time, require_columns, RawSheet,
};
use models::{account_key, cell_to_string, number, Bank, Table, CANONICAL_COLUMNS};
use serde_json::Value;

pub const PARSER_NAME: &str = "kbank";

/// Raw columns the KBank export must carry, by exact header text.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "วันที่",
    "เวลา/วันที่ทำรายการ",
    "รายการ",
    "ถอนเงิน",
    "ฝากเงิน",
    "สกุลเงิน",
];

/// Literal prefix of the generated account name; the KBank template has no
/// account number, so the currency stands in as the identifier.
const ACCOUNT_NAME_PREFIX: &str = "KBank_";

/// Parse a KBank statement workbook into the canonical transaction table.
pub fn parse_bytes(bytes: &[u8], file_name: &str) -> Result<Table> {
    let sheet = RawSheet::from_bytes(bytes, file_name)?;
    parse_sheet(&sheet)
}

/// Map an extracted sheet. Separate from the workbook plumbing so the
/// column rules are testable without binary fixtures.
pub fn parse_sheet(sheet: &RawSheet) -> Result<Table> {
    let idx = require_columns(sheet, Bank::KBank, &REQUIRED_COLUMNS)?;
    let (c_date, c_time, c_desc, c_withdrawal, c_deposit, c_currency) =
        (idx[0], idx[1], idx[2], idx[3], idx[4], idx[5]);

    let mut columns: Vec<String> = CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(sheet.columns.iter().cloned());
    let mut table = Table::new(columns);

    for row in &sheet.rows {
        let date = parse_date_dayfirst(&cell_to_string(&row[c_date]))
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
        let time = parse_time(&cell_to_string(&row[c_time]))
            .map(|t| Value::String(t.format("%H:%M:%S").to_string()))
            .unwrap_or(Value::Null);

        // Deposit and withdrawal fall back to 0 independently.
        let deposit = decimal_cell(&row[c_deposit]).unwrap_or(0.0);
        let withdrawal = decimal_cell(&row[c_withdrawal]).unwrap_or(0.0);
        let amount = deposit - withdrawal;

        let account_name = format!("{}{}", ACCOUNT_NAME_PREFIX, cell_to_string(&row[c_currency]));
        let account_number = "N/A".to_string();
        let account = account_key(&account_name, &account_number);

        let mut out = vec![
            date,
            time,
            number(amount),
            Value::String(Bank::KBank.name().to_string()),
            Value::String(account),
            Value::String(cell_to_string(&row[c_desc])),
            Value::String(account_name),
            Value::String(account_number),
        ];
        out.extend(row.iter().cloned());
        table.push_row(out);
    }

    Ok(table)
}
