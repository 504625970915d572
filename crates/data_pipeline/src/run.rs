use anyhow::{Context, Result};
use document_store::{with_retry, DocumentStore, Entry, EntryKind, RetryPolicy};
use models::{Period, StatementError, Table};

use crate::aggregate::aggregate;
use crate::normalize::{normalize_statement, FileContext};
use crate::publish::{publish_views, PublishReport};
use crate::summary::summary_view;

/// One monthly consolidation pass.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Folder holding the Year/Month hierarchy.
    pub root_folder_id: String,
    pub period: Period,
    pub retry: RetryPolicy,
}

/// What a run produced.
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing parsed for the period; publication was skipped.
    EmptyPeriod,
    Published {
        files_processed: usize,
        files_skipped: usize,
        report: PublishReport,
    },
}

/// Walk the Year/Month/Company/Bank hierarchy, normalize every statement
/// file, aggregate, and publish the consolidated views.
///
/// Progress is reported as stdout lines; the web relay forwards them
/// verbatim. Per-file failures are logged and skipped, so one bad file
/// never aborts the batch.
pub fn run(store: &dyn DocumentStore, cfg: &RunConfig) -> Result<RunOutcome> {
    let period = cfg.period.label();
    println!("🚀 Starting process for {}...", period);

    let year_id = with_retry(&cfg.retry, || {
        store.ensure_folder(&cfg.root_folder_id, &cfg.period.year_segment())
    })
    .context("resolving year folder")?;
    let month_id = with_retry(&cfg.retry, || {
        store.ensure_folder(&year_id, &cfg.period.month_segment())
    })
    .context("resolving month folder")?;

    let mut tables: Vec<Table> = Vec::new();
    let mut files_processed = 0usize;
    let mut files_skipped = 0usize;

    let companies =
        with_retry(&cfg.retry, || store.list_children(&month_id)).context("listing companies")?;
    for company in companies.iter().filter(|e| e.kind == EntryKind::Folder) {
        println!("Processing company: {}", company.name);
        let banks = with_retry(&cfg.retry, || store.list_children(&company.id))
            .with_context(|| format!("listing banks of {}", company.name))?;
        for bank in banks.iter().filter(|e| e.kind == EntryKind::Folder) {
            let files = with_retry(&cfg.retry, || store.list_children(&bank.id))
                .with_context(|| format!("listing files of {}/{}", company.name, bank.name))?;
            for file in files.iter().filter(|e| e.kind == EntryKind::File) {
                let ctx = FileContext {
                    company: company.name.clone(),
                    month: period.clone(),
                };
                match process_file(store, &cfg.retry, file, &bank.name, &ctx) {
                    Ok(table) => {
                        tables.push(table);
                        files_processed += 1;
                        println!("  > Processed file: {}", file.name);
                    }
                    Err(err) => {
                        files_skipped += 1;
                        println!("  > ❌ Error reading file '{}': {:#}", file.name, err);
                    }
                }
            }
        }
    }

    let master = match aggregate(&tables, &period) {
        Ok(master) => master,
        Err(err) => {
            if matches!(
                err.downcast_ref::<StatementError>(),
                Some(StatementError::EmptyBatch { .. })
            ) {
                println!("⚠️ No data found for {}. Exiting.", period);
                return Ok(RunOutcome::EmptyPeriod);
            }
            return Err(err);
        }
    };
    println!(
        "📊 Master table: {} row(s), {} column(s)",
        master.len(),
        master.columns().len()
    );

    let summary = summary_view(&master);

    let target = format!("Bank_Summary_{}", period);
    let spreadsheet_id = with_retry(&cfg.retry, || store.ensure_spreadsheet(&month_id, &target))
        .with_context(|| format!("opening spreadsheet {}", target))?;
    println!("🔄 Writing consolidated views to: {}", target);

    let report = publish_views(store, &cfg.retry, &spreadsheet_id, &master, &summary);

    println!();
    println!("🎉 Process complete!");
    Ok(RunOutcome::Published {
        files_processed,
        files_skipped,
        report,
    })
}

fn process_file(
    store: &dyn DocumentStore,
    retry: &RetryPolicy,
    file: &Entry,
    bank_tag: &str,
    ctx: &FileContext,
) -> Result<Table> {
    let bytes = with_retry(retry, || store.download(&file.id))
        .with_context(|| format!("downloading {}", file.name))?;
    normalize_statement(&bytes, &file.name, bank_tag, ctx)
}
