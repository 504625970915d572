use anyhow::Result;
use general_parser::{decimal_cell, parse_datetime_dayfirst, require_columns, RawSheet};
use models::{account_key, cell_to_string, number, Bank, Table, CANONICAL_COLUMNS};
use serde_json::Value;

pub const PARSER_NAME: &str = "ttb";

/// Raw columns the TTB export must carry. Note the collision with the
/// canonical `Date`/`Time`/`Amount` names; the aggregator's column
/// de-duplication keeps the canonical (first) occurrence.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Date",
    "Time",
    "Debit/Credit",
    "Transaction description",
    "Company name",
    "Company account",
    "Amount",
];

/// Parse a TTB statement workbook into the canonical transaction table.
pub fn parse_bytes(bytes: &[u8], file_name: &str) -> Result<Table> {
    let sheet = RawSheet::from_bytes(bytes, file_name)?;
    parse_sheet(&sheet)
}

/// Map an extracted sheet. Separate from the workbook plumbing so the
/// column rules are testable without binary fixtures.
pub fn parse_sheet(sheet: &RawSheet) -> Result<Table> {
    let idx = require_columns(sheet, Bank::Ttb, &REQUIRED_COLUMNS)?;
    let (c_date, c_time, c_indicator, c_desc, c_name, c_account, c_amount) =
        (idx[0], idx[1], idx[2], idx[3], idx[4], idx[5], idx[6]);

    let mut columns: Vec<String> = CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(sheet.columns.iter().cloned());
    let mut table = Table::new(columns);

    for row in &sheet.rows {
        // Source date and time are concatenated and reparsed as one
        // day-first date-time, then split back apart.
        let combined = format!(
            "{} {}",
            cell_to_string(&row[c_date]).trim(),
            cell_to_string(&row[c_time]).trim()
        );
        let parsed = parse_datetime_dayfirst(&combined);
        let date = parsed
            .map(|dt| Value::String(dt.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
        let time = parsed
            .map(|dt| Value::String(dt.format("%H:%M:%S").to_string()))
            .unwrap_or(Value::Null);

        let mut amount = decimal_cell(&row[c_amount]).unwrap_or(0.0).abs();
        if is_debit(&cell_to_string(&row[c_indicator])) {
            amount = -amount;
        }

        let account_name = cell_to_string(&row[c_name]);
        let account_number = cell_to_string(&row[c_account]);
        let account = account_key(&account_name, &account_number);

        let mut out = vec![
            date,
            time,
            number(amount),
            Value::String(Bank::Ttb.name().to_string()),
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

/// Debit/credit indicator match is case- and whitespace-insensitive.
fn is_debit(indicator: &str) -> bool {
    indicator.trim().eq_ignore_ascii_case("debit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::StatementError;
    use serde_json::json;

    fn fixture_row(amount: Value, indicator: &str) -> Vec<Value> {
        vec![
            json!("02/03/2024"),
            json!("09:15:00"),
            json!(indicator),
            json!("Invoice 881"),
            json!("Acme Trading"),
            json!("987-654321-0"),
            amount,
        ]
    }

    fn fixture(rows: Vec<Vec<Value>>) -> RawSheet {
        RawSheet::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        )
    }

    #[test]
    fn test_minimal_fixture_produces_canonical_schema() {
        let table = parse_sheet(&fixture(vec![fixture_row(json!(50.0), "Credit")])).unwrap();
        assert_eq!(&table.columns()[..8], &CANONICAL_COLUMNS);
        assert_eq!(&table.columns()[8..], &REQUIRED_COLUMNS);

        let row = &table.rows()[0];
        assert_eq!(row[0], json!("2024-03-02"));
        assert_eq!(row[1], json!("09:15:00"));
        assert_eq!(row[2], json!(50.0));
        assert_eq!(row[3], json!("TTB"));
        assert_eq!(row[4], json!("Acme Trading_987-654321-0"));
        assert_eq!(row[5], json!("Invoice 881"));
    }

    #[test]
    fn test_debit_indicator_flips_sign() {
        let table = parse_sheet(&fixture(vec![
            fixture_row(json!(50.0), "Debit"),
            fixture_row(json!(50.0), "Credit"),
            fixture_row(json!(50.0), "  DEBIT  "),
            fixture_row(json!(-50.0), "Credit"),
        ]))
        .unwrap();
        let amounts: Vec<f64> = table
            .rows()
            .iter()
            .map(|r| r[2].as_f64().unwrap())
            .collect();
        // The amount column is folded to its absolute value first.
        assert_eq!(amounts, vec![-50.0, 50.0, -50.0, 50.0]);
    }

    #[test]
    fn test_unparsable_amount_defaults_to_zero() {
        let table = parse_sheet(&fixture(vec![fixture_row(json!("??"), "Debit")])).unwrap();
        assert_eq!(table.rows()[0][2].as_f64(), Some(0.0));
    }

    #[test]
    fn test_source_columns_follow_canonical_ones_even_when_names_collide() {
        let table = parse_sheet(&fixture(vec![fixture_row(json!(50.0), "Credit")])).unwrap();
        // Two `Date` columns: the canonical ISO one and the raw source one.
        let date_columns: Vec<usize> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| *c == "Date")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(date_columns, vec![0, 8]);
        assert_eq!(table.rows()[0][8], json!("02/03/2024"));
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
                    assert_eq!(*bank, "TTB");
                    assert_eq!(column, missing);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
