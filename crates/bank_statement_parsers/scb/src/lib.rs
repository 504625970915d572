use anyhow::Result;
use general_parser::{decimal_cell, parse_datetime_dayfirst, require_columns, RawSheet};
use models::{account_key, cell_to_string, number, Bank, Table, CANONICAL_COLUMNS};
use serde_json::Value;

pub const PARSER_NAME: &str = "scb";

// The SCB payment report ships bilingual multi-line headers; matching is
// by the exact text including the embedded newline.
pub const COL_ACCOUNT_NO: &str = "เลขที่บัญชี/\nAccount No.";
pub const COL_ACCOUNT_NAME: &str = "ชื่อ/\nName";
pub const COL_LAST_UPDATED: &str = "อัปเดตล่าสุด/\nLast Updated";
pub const COL_AMOUNT_PAID: &str = "จำนวนเงินที่จ่ายทั้งหมด/\nTotal Amount Paid";
pub const COL_RECIPIENT: &str = "ชื่อผู้รับเงิน/\nRecipient Name";

pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_ACCOUNT_NO,
    COL_ACCOUNT_NAME,
    COL_LAST_UPDATED,
    COL_AMOUNT_PAID,
    COL_RECIPIENT,
];

const DESCRIPTION_PREFIX: &str = "Payment to ";

/// Parse an SCB payment report workbook into the canonical transaction
/// table. Every row of this report is an outflow.
pub fn parse_bytes(bytes: &[u8], file_name: &str) -> Result<Table> {
    let sheet = RawSheet::from_bytes(bytes, file_name)?;
    parse_sheet(&sheet)
}

/// Map an extracted sheet. Separate from the workbook plumbing so the
/// column rules are testable without binary fixtures.
pub fn parse_sheet(sheet: &RawSheet) -> Result<Table> {
    let idx = require_columns(sheet, Bank::Scb, &REQUIRED_COLUMNS)?;
    let (c_account_no, c_account_name, c_updated, c_amount, c_recipient) =
        (idx[0], idx[1], idx[2], idx[3], idx[4]);

    let mut columns: Vec<String> = CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(sheet.columns.iter().cloned());
    let mut table = Table::new(columns);

    for row in &sheet.rows {
        // One combined date-time column, split after a day-first parse.
        let parsed = parse_datetime_dayfirst(&cell_to_string(&row[c_updated]));
        let date = parsed
            .map(|dt| Value::String(dt.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
        let time = parsed
            .map(|dt| Value::String(dt.format("%H:%M:%S").to_string()))
            .unwrap_or(Value::Null);

        let paid = decimal_cell(&row[c_amount]).unwrap_or(0.0);
        let amount = -paid;

        let description = format!(
            "{}{}",
            DESCRIPTION_PREFIX,
            cell_to_string(&row[c_recipient])
        );
        let account_name = cell_to_string(&row[c_account_name]);
        let account_number = cell_to_string(&row[c_account_no]);
        let account = account_key(&account_name, &account_number);

        let mut out = vec![
            date,
            time,
            number(amount),
            Value::String(Bank::Scb.name().to_string()),
            Value::String(account),
            Value::String(description),
            Value::String(account_name),
            Value::String(account_number),
        ];
        out.extend(row.iter().cloned());
        table.push_row(out);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::StatementError;
    use serde_json::json;

    fn fixture() -> RawSheet {
        RawSheet::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![vec![
                json!("111-222333-4"),
                json!("Acme Trading"),
                json!("02/03/2024 18:45:10"),
                json!("1,234.50"),
                json!("Somchai Supplies"),
            ]],
        )
    }

    #[test]
    fn test_minimal_fixture_produces_canonical_schema() {
        let table = parse_sheet(&fixture()).unwrap();
        assert_eq!(&table.columns()[..8], &CANONICAL_COLUMNS);
        assert_eq!(&table.columns()[8..], &REQUIRED_COLUMNS);

        let row = &table.rows()[0];
        assert_eq!(row[0], json!("2024-03-02"));
        assert_eq!(row[1], json!("18:45:10"));
        assert_eq!(row[3], json!("SCB"));
        assert_eq!(row[4], json!("Acme Trading_111-222333-4"));
        assert_eq!(row[5], json!("Payment to Somchai Supplies"));
        assert_eq!(row[6], json!("Acme Trading"));
        assert_eq!(row[7], json!("111-222333-4"));
    }

    #[test]
    fn test_amount_paid_is_negated_with_commas_stripped() {
        let table = parse_sheet(&fixture()).unwrap();
        assert_eq!(table.rows()[0][2].as_f64(), Some(-1234.50));
    }

    #[test]
    fn test_unparsable_amount_becomes_zero_not_negative_zero() {
        let mut sheet = fixture();
        sheet.rows[0][3] = json!("pending");
        let table = parse_sheet(&sheet).unwrap();
        assert_eq!(table.rows()[0][2].as_f64(), Some(0.0));
        assert_eq!(models::cell_to_string(&table.rows()[0][2]), "0");
    }

    #[test]
    fn test_unparsable_datetime_nulls_both_halves() {
        let mut sheet = fixture();
        sheet.rows[0][2] = json!("n/a");
        let table = parse_sheet(&sheet).unwrap();
        assert!(table.rows()[0][0].is_null());
        assert!(table.rows()[0][1].is_null());
    }

    #[test]
    fn test_each_missing_required_column_is_reported() {
        for missing in REQUIRED_COLUMNS {
            let sheet = RawSheet::new(
                REQUIRED_COLUMNS
                    .iter()
                    .filter(|c| **c != missing)
                    .map(|c| c.to_string())
                    .collect(),
                vec![],
            );
            let err = parse_sheet(&sheet).unwrap_err();
            match err.downcast_ref::<StatementError>() {
                Some(StatementError::MissingColumn { bank, column }) => {
                    assert_eq!(*bank, "SCB");
                    assert_eq!(column, missing);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
