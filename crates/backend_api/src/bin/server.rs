use std::env;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use backend_api::{run_server, AppState};
use document_store::{FsDocumentStore, RetryPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables with sane defaults
    let store_root = env::var("STORE_ROOT").unwrap_or_else(|_| "drive".to_string());
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let consolidate_cmd =
        env::var("CONSOLIDATE_CMD").unwrap_or_else(|_| "consolidate".to_string());

    println!("Bank Statement Uploader");
    println!("=======================");
    println!("Store root: {}", store_root);
    println!("Pipeline command: {}", consolidate_cmd);
    println!("Listening on: {}:{}", host, port);
    println!();

    let store = Arc::new(FsDocumentStore::new(&store_root)?);

    // The run log endpoint spawns the consolidation binary against the
    // same store the uploads land in.
    let mut pipeline_command: Vec<String> =
        consolidate_cmd.split_whitespace().map(String::from).collect();
    pipeline_command.push("--store-root".to_string());
    pipeline_command.push(store_root.clone());

    let state = Arc::new(AppState {
        store,
        retry: RetryPolicy::default(),
        root_folder_id: String::new(),
        pipeline_command,
        run_active: AtomicBool::new(false),
    });

    run_server(state, &host, port).await
}
