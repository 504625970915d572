pub mod fs;
pub mod memory;
pub mod retry;

// Re-export commonly used items
pub use crate::fs::FsDocumentStore;
pub use crate::memory::MemoryDocumentStore;
pub use crate::retry::{with_retry, RetryPolicy};

use anyhow::Result;

/// What a folder listing entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
    Spreadsheet,
}

/// One child of a folder.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
}

/// External document store collaborator: folder hierarchy, file transfer,
/// named-sheet publication. Every operation is a blocking round trip.
///
/// Writing a sheet that already exists overwrites it, so consolidation
/// runs stay idempotent.
pub trait DocumentStore: Send + Sync {
    /// Immediate children of a folder.
    fn list_children(&self, folder_id: &str) -> Result<Vec<Entry>>;

    /// Find a child folder by name, creating it if absent.
    fn ensure_folder(&self, parent_id: &str, name: &str) -> Result<String>;

    /// Full contents of a file.
    fn download(&self, file_id: &str) -> Result<Vec<u8>>;

    /// Store a file under a folder, replacing any previous version.
    fn upload_file(&self, parent_id: &str, name: &str, bytes: &[u8]) -> Result<String>;

    /// Find a spreadsheet document by name, creating an empty one if absent.
    fn ensure_spreadsheet(&self, parent_id: &str, name: &str) -> Result<String>;

    /// Overwrite the named sheet with header + data rows of text cells.
    fn write_sheet(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        rows: &[Vec<String>],
    ) -> Result<()>;
}
