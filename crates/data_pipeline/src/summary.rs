use models::{number, Table};
use serde_json::Value;

/// Columns of the deposit/withdrawal view, in published order.
pub const SUMMARY_COLUMNS: [&str; 7] = [
    "Account Number",
    "Account Name",
    "Date",
    "Withdrawal",
    "Deposit",
    "Company",
    "Month",
];

const PASS_THROUGH: [&str; 5] = ["Account Number", "Account Name", "Date", "Company", "Month"];

/// Project the master table into the deposit/withdrawal summary view.
///
/// `Deposit` carries positive amounts, `Withdrawal` the magnitude of
/// negative ones; the signed `Amount` itself is not emitted. Columns
/// missing from the master are filled with the literal `"N/A"` and
/// reported on the run log, so upstream schema drift stays visible
/// instead of being silently masked.
pub fn summary_view(master: &Table) -> Table {
    let pass_through: Vec<Option<usize>> = PASS_THROUGH
        .iter()
        .map(|name| {
            let idx = master.column_index(name);
            if idx.is_none() {
                println!(
                    "⚠️ Summary: column '{}' missing from master table, filling with N/A",
                    name
                );
            }
            idx
        })
        .collect();

    let amount = master.column_index("Amount");
    if amount.is_none() {
        println!("⚠️ Summary: column 'Amount' missing from master table, Withdrawal/Deposit filled with N/A");
    }

    let mut view = Table::new(SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect());
    for row in master.rows() {
        let lookup = |idx: Option<usize>| {
            idx.map(|i| row[i].clone())
                .unwrap_or_else(|| Value::String("N/A".to_string()))
        };
        let (withdrawal, deposit) = match amount {
            Some(i) => {
                let a = row[i].as_f64().unwrap_or(0.0);
                (
                    number(if a < 0.0 { -a } else { 0.0 }),
                    number(if a > 0.0 { a } else { 0.0 }),
                )
            }
            None => (
                Value::String("N/A".to_string()),
                Value::String("N/A".to_string()),
            ),
        };
        view.push_row(vec![
            lookup(pass_through[0]),
            lookup(pass_through[1]),
            lookup(pass_through[2]),
            withdrawal,
            deposit,
            lookup(pass_through[3]),
            lookup(pass_through[4]),
        ]);
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn master(amounts: &[f64]) -> Table {
        let mut t = Table::new(
            ["Account Number", "Account Name", "Date", "Amount", "Company", "Month"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        for a in amounts {
            t.push_row(vec![
                json!("111"),
                json!("Acme"),
                json!("2024-03-01"),
                json!(*a),
                json!("Acme Co"),
                json!("2024-03"),
            ]);
        }
        t
    }

    #[test]
    fn test_signed_amount_splits_into_deposit_and_withdrawal() {
        let view = summary_view(&master(&[75.0, -30.0, 0.0]));
        assert_eq!(view.columns(), &SUMMARY_COLUMNS);

        let cells: Vec<(f64, f64)> = view
            .rows()
            .iter()
            .map(|r| (r[3].as_f64().unwrap(), r[4].as_f64().unwrap()))
            .collect();
        // (withdrawal, deposit)
        assert_eq!(cells, vec![(0.0, 75.0), (30.0, 0.0), (0.0, 0.0)]);
    }

    #[test]
    fn test_amount_never_appears_in_the_view() {
        let view = summary_view(&master(&[75.0]));
        assert!(view.column_index("Amount").is_none());
    }

    #[test]
    fn test_missing_pass_through_column_fills_na() {
        let mut t = Table::new(
            ["Account Name", "Date", "Amount"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        t.push_row(vec![json!("Acme"), json!("2024-03-01"), json!(10.0)]);

        let view = summary_view(&t);
        let row = &view.rows()[0];
        assert_eq!(row[0], json!("N/A")); // Account Number
        assert_eq!(row[5], json!("N/A")); // Company
        assert_eq!(row[6], json!("N/A")); // Month
        assert_eq!(row[4], json!(10.0)); // Deposit still computed
    }

    #[test]
    fn test_missing_amount_column_fills_na_in_both_movement_columns() {
        let mut t = Table::new(["Account Name"].iter().map(|c| c.to_string()).collect());
        t.push_row(vec![json!("Acme")]);

        let view = summary_view(&t);
        let row = &view.rows()[0];
        assert_eq!(row[3], json!("N/A"));
        assert_eq!(row[4], json!("N/A"));
    }
}
