use document_store::{with_retry, DocumentStore, RetryPolicy};
use models::{StatementError, Table};

/// Sheet names may not contain path separators and are clamped to the
/// store's 100-character limit (character, not byte, boundary).
pub fn sanitize_sheet_name(account: &str) -> String {
    account
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .take(100)
        .collect()
}

/// Outcome of one publication pass.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub written: Vec<String>,
    pub failed: Vec<StatementError>,
}

impl PublishReport {
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Write the summary view, the full master table, and one sheet per
/// account to the spreadsheet document.
///
/// Sheets fail independently: an error is logged and recorded, and the
/// remaining sheets are still written. Nothing already published is rolled
/// back.
pub fn publish_views(
    store: &dyn DocumentStore,
    retry: &RetryPolicy,
    spreadsheet_id: &str,
    master: &Table,
    summary: &Table,
) -> PublishReport {
    let mut report = PublishReport::default();

    write_one(store, retry, spreadsheet_id, "Summary", summary, &mut report);
    write_one(
        store,
        retry,
        spreadsheet_id,
        "All_Transactions",
        master,
        &mut report,
    );

    for (account, group) in master.group_by("Account") {
        let sheet = sanitize_sheet_name(&account);
        write_one(store, retry, spreadsheet_id, &sheet, &group, &mut report);
    }

    report
}

fn write_one(
    store: &dyn DocumentStore,
    retry: &RetryPolicy,
    spreadsheet_id: &str,
    sheet: &str,
    table: &Table,
    report: &mut PublishReport,
) {
    let rows = table.to_text_rows();
    match with_retry(retry, || store.write_sheet(spreadsheet_id, sheet, &rows)) {
        Ok(()) => {
            println!("✅ Successfully wrote data to sheet: {}", sheet);
            report.written.push(sheet.to_string());
        }
        Err(err) => {
            println!("⚠️ CRITICAL ERROR writing to sheet '{}': {:#}", sheet, err);
            report.failed.push(StatementError::Publish {
                sheet: sheet.to_string(),
                message: err.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_store::MemoryDocumentStore;
    use serde_json::json;

    fn master() -> Table {
        let mut t = Table::new(
            ["Company", "Account", "Date", "Amount"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        t.push_row(vec![json!("Acme"), json!("Acme_111"), json!("2024-03-01"), json!(10.0)]);
        t.push_row(vec![json!("Acme"), json!("Acme_222"), json!("2024-03-02"), json!(-4.0)]);
        t
    }

    fn summary() -> Table {
        Table::new(vec!["Account Number".to_string()])
    }

    #[test]
    fn test_sanitize_replaces_separators_and_truncates() {
        let account = format!("A/B\\C{}", "x".repeat(120));
        let sheet = sanitize_sheet_name(&account);
        assert_eq!(sheet.chars().count(), 100);
        assert!(!sheet.contains('/'));
        assert!(!sheet.contains('\\'));
        assert!(sheet.starts_with("A-B-C"));
    }

    #[test]
    fn test_sanitize_counts_characters_not_bytes() {
        let account = "บัญชี".repeat(30); // 150 Thai characters
        assert_eq!(sanitize_sheet_name(&account).chars().count(), 100);
    }

    #[test]
    fn test_publishes_summary_master_and_per_account_sheets() {
        let store = MemoryDocumentStore::new();
        let doc = store.ensure_spreadsheet("", "Bank_Summary_2024-03").unwrap();

        let report = publish_views(
            &store,
            &RetryPolicy::immediate(1),
            &doc,
            &master(),
            &summary(),
        );

        assert!(report.all_ok());
        assert_eq!(
            store.sheet_names(&doc),
            vec!["Acme_111", "Acme_222", "All_Transactions", "Summary"]
        );
        // group sheets keep the master's header and only their own rows
        let sheet = store.sheet(&doc, "Acme_111").unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet[1][1], "Acme_111");
    }

    #[test]
    fn test_one_failed_sheet_does_not_block_the_others() {
        let store = MemoryDocumentStore::new();
        let doc = store.ensure_spreadsheet("", "Bank_Summary_2024-03").unwrap();
        store.fail_sheet("Summary");

        let report = publish_views(
            &store,
            &RetryPolicy::immediate(1),
            &doc,
            &master(),
            &summary(),
        );

        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0],
            StatementError::Publish { ref sheet, .. } if sheet == "Summary"
        ));
        assert_eq!(
            store.sheet_names(&doc),
            vec!["Acme_111", "Acme_222", "All_Transactions"]
        );
    }
}
