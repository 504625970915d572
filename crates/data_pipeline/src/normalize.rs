use anyhow::Result;
use models::{Bank, StatementError, Table};
use serde_json::Value;

/// Folder-derived context stamped onto every row of one parsed file.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub company: String,
    /// Processing period label, `"YYYY-MM"`.
    pub month: String,
}

/// Parse one downloaded statement with the layout selected by `bank_tag`
/// and append the caller's context columns.
///
/// Failures here are per-file: the run driver logs and skips, so one bad
/// file never aborts the batch.
pub fn normalize_statement(
    bytes: &[u8],
    file_name: &str,
    bank_tag: &str,
    ctx: &FileContext,
) -> Result<Table> {
    let bank = Bank::from_tag(bank_tag).ok_or_else(|| StatementError::UnsupportedBank {
        tag: bank_tag.to_string(),
    })?;

    let mut table = match bank {
        Bank::KBank => kbank::parse_bytes(bytes, file_name)?,
        Bank::Scb => scb::parse_bytes(bytes, file_name)?,
        Bank::Ttb => ttb::parse_bytes(bytes, file_name)?,
    };

    attach_context(&mut table, ctx);
    Ok(table)
}

/// The context columns trail everything the parser emitted.
fn attach_context(table: &mut Table, ctx: &FileContext) {
    table.push_constant_column("Company", Value::String(ctx.company.clone()));
    table.push_constant_column("Month", Value::String(ctx.month.clone()));
}
