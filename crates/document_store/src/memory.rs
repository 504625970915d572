use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};

use crate::{DocumentStore, Entry, EntryKind};

/// In-memory document store.
///
/// The stand-in collaborator for tests: seedable with a folder hierarchy,
/// inspectable after a run, and able to inject per-sheet write failures to
/// exercise the publisher's error scoping.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    folders: BTreeSet<String>,
    files: HashMap<String, Vec<u8>>,
    spreadsheets: HashMap<String, BTreeMap<String, Vec<Vec<String>>>>,
    fail_sheets: HashSet<String>,
}

fn parent_and_name(id: &str) -> (&str, &str) {
    match id.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", id),
    }
}

fn child_id(parent_id: &str, name: &str) -> String {
    if parent_id.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent_id, name)
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to this sheet name fail, for error-path tests.
    pub fn fail_sheet(&self, sheet_name: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_sheets
            .insert(sheet_name.to_string());
    }

    /// Seed a file at a `/`-separated path, creating its ancestor folders.
    pub fn seed_file(&self, id: &str, bytes: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        let (parent, _) = parent_and_name(id);
        let mut ancestor = String::new();
        for segment in parent.split('/').filter(|s| !s.is_empty()) {
            ancestor = child_id(&ancestor, segment);
            inner.folders.insert(ancestor.clone());
        }
        inner.files.insert(id.to_string(), bytes.to_vec());
    }

    /// Ids of every spreadsheet document created so far.
    pub fn spreadsheet_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .spreadsheets
            .keys()
            .cloned()
            .collect()
    }

    /// Sheet names written to a spreadsheet, sorted.
    pub fn sheet_names(&self, spreadsheet_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .spreadsheets
            .get(spreadsheet_id)
            .map(|sheets| sheets.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Rows of one written sheet.
    pub fn sheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Option<Vec<Vec<String>>> {
        self.inner
            .lock()
            .unwrap()
            .spreadsheets
            .get(spreadsheet_id)
            .and_then(|sheets| sheets.get(sheet_name))
            .cloned()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn list_children(&self, folder_id: &str) -> Result<Vec<Entry>> {
        let inner = self.inner.lock().unwrap();
        let mut entries = Vec::new();

        for id in &inner.folders {
            let (parent, name) = parent_and_name(id);
            if parent == folder_id {
                entries.push(Entry {
                    id: id.clone(),
                    name: name.to_string(),
                    kind: EntryKind::Folder,
                });
            }
        }
        for id in inner.files.keys() {
            let (parent, name) = parent_and_name(id);
            if parent == folder_id {
                entries.push(Entry {
                    id: id.clone(),
                    name: name.to_string(),
                    kind: EntryKind::File,
                });
            }
        }
        for id in inner.spreadsheets.keys() {
            let (parent, name) = parent_and_name(id);
            if parent == folder_id {
                entries.push(Entry {
                    id: id.clone(),
                    name: name.to_string(),
                    kind: EntryKind::Spreadsheet,
                });
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn ensure_folder(&self, parent_id: &str, name: &str) -> Result<String> {
        let id = child_id(parent_id, name);
        self.inner.lock().unwrap().folders.insert(id.clone());
        Ok(id)
    }

    fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.inner
            .lock()
            .unwrap()
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| anyhow!("file not found: {}", file_id))
    }

    fn upload_file(&self, parent_id: &str, name: &str, bytes: &[u8]) -> Result<String> {
        let id = child_id(parent_id, name);
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(id.clone(), bytes.to_vec());
        Ok(id)
    }

    fn ensure_spreadsheet(&self, parent_id: &str, name: &str) -> Result<String> {
        let id = child_id(parent_id, name);
        self.inner
            .lock()
            .unwrap()
            .spreadsheets
            .entry(id.clone())
            .or_default();
        Ok(id)
    }

    fn write_sheet(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_sheets.contains(sheet_name) {
            bail!("injected failure writing sheet '{}'", sheet_name);
        }
        inner
            .spreadsheets
            .get_mut(spreadsheet_id)
            .ok_or_else(|| anyhow!("spreadsheet not found: {}", spreadsheet_id))?
            .insert(sheet_name.to_string(), rows.to_vec());
        Ok(())
    }
}
