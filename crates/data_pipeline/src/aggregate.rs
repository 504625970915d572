use anyhow::Result;
use models::{StatementError, Table};

/// Sort key of the master table, most significant first.
pub const SORT_KEY: [&str; 4] = ["Company", "Account", "Date", "Time"];

/// Concatenate per-file tables into the period's master table.
///
/// Stable ascending sort by (Company, Account, Date, Time), then collapse
/// duplicate column names keeping the first occurrence. An empty batch is
/// fatal: the caller must not publish anything for the period.
pub fn aggregate(tables: &[Table], period: &str) -> Result<Table> {
    if tables.is_empty() {
        return Err(StatementError::EmptyBatch {
            period: period.to_string(),
        }
        .into());
    }

    let mut master = Table::concat(tables);
    master.sort_rows_by(&SORT_KEY);
    master.dedup_columns();
    Ok(master)
}
