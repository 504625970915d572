use anyhow::{anyhow, Result};
use chrono::Local;
use clap::Parser;
use data_pipeline::{run, RunConfig, RunOutcome};
use document_store::{FsDocumentStore, RetryPolicy};
use models::Period;

#[derive(Parser, Debug)]
#[command(
    name = "consolidate",
    about = "Normalize one month of bank statements and publish the summary sheets."
)]
struct Args {
    /// Root directory of the document store hierarchy (env: STORE_ROOT)
    #[arg(long)]
    store_root: Option<String>,

    /// Processing period as YYYY-MM; defaults to the current month
    #[arg(long)]
    month: Option<String>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let store_root = args
        .store_root
        .or_else(|| std::env::var("STORE_ROOT").ok())
        .unwrap_or_else(|| "drive".to_string());

    let period = match &args.month {
        Some(raw) => Period::parse(raw)
            .ok_or_else(|| anyhow!("invalid month '{}', expected YYYY-MM", raw))?,
        None => Period::from_date(Local::now().date_naive()),
    };

    let store = FsDocumentStore::new(&store_root)?;
    let cfg = RunConfig {
        root_folder_id: String::new(),
        period,
        retry: RetryPolicy::default(),
    };

    match run(&store, &cfg)? {
        RunOutcome::EmptyPeriod => {}
        RunOutcome::Published {
            files_processed,
            files_skipped,
            report,
        } => {
            println!(
                "Processed {} file(s), skipped {}; wrote {} sheet(s), {} failed.",
                files_processed,
                files_skipped,
                report.written.len(),
                report.failed.len()
            );
        }
    }
    Ok(())
}
