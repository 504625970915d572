use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use document_store::{DocumentStore, RetryPolicy};

/// Shared server state: the upload target store and the consolidation
/// subprocess the log stream spawns.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub retry: RetryPolicy,
    /// Folder holding the Year/Month hierarchy inside the store.
    pub root_folder_id: String,
    /// Command line of the consolidation subprocess (program + args).
    pub pipeline_command: Vec<String>,
    /// One run at a time; set while a child process is alive.
    pub run_active: AtomicBool,
}

pub type SharedState = Arc<AppState>;
