use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::{DocumentStore, Entry, EntryKind};

/// Directory suffix marking a spreadsheet document on disk.
const SHEET_DIR_SUFFIX: &str = ".sheets";

/// Filesystem-backed document store.
///
/// Entry ids are store-relative paths with `/` separators; a spreadsheet
/// document is a `<name>.sheets/` directory holding one CSV per sheet.
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating store root {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, id: &str) -> Result<PathBuf> {
        if id.split('/').any(|segment| segment == "..") {
            bail!("invalid entry id: {}", id);
        }
        Ok(if id.is_empty() {
            self.root.clone()
        } else {
            self.root.join(id)
        })
    }

    fn child_id(parent_id: &str, name: &str) -> String {
        if parent_id.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent_id, name)
        }
    }
}

impl DocumentStore for FsDocumentStore {
    fn list_children(&self, folder_id: &str) -> Result<Vec<Entry>> {
        let dir = self.resolve(folder_id)?;
        let mut entries = Vec::new();
        for entry in
            fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))?
        {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let id = Self::child_id(folder_id, &file_name);
            if entry.path().is_dir() {
                if let Some(name) = file_name.strip_suffix(SHEET_DIR_SUFFIX) {
                    entries.push(Entry {
                        id,
                        name: name.to_string(),
                        kind: EntryKind::Spreadsheet,
                    });
                } else {
                    entries.push(Entry {
                        id,
                        name: file_name,
                        kind: EntryKind::Folder,
                    });
                }
            } else {
                entries.push(Entry {
                    id,
                    name: file_name,
                    kind: EntryKind::File,
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn ensure_folder(&self, parent_id: &str, name: &str) -> Result<String> {
        let id = Self::child_id(parent_id, name);
        let path = self.resolve(&id)?;
        fs::create_dir_all(&path)
            .with_context(|| format!("creating folder {}", path.display()))?;
        Ok(id)
    }

    fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let path = self.resolve(file_id)?;
        fs::read(&path).with_context(|| format!("downloading {}", path.display()))
    }

    fn upload_file(&self, parent_id: &str, name: &str, bytes: &[u8]) -> Result<String> {
        let id = Self::child_id(parent_id, name);
        let path = self.resolve(&id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating folder {}", parent.display()))?;
        }
        fs::write(&path, bytes).with_context(|| format!("uploading {}", path.display()))?;
        Ok(id)
    }

    fn ensure_spreadsheet(&self, parent_id: &str, name: &str) -> Result<String> {
        let id = Self::child_id(parent_id, &format!("{}{}", name, SHEET_DIR_SUFFIX));
        let path = self.resolve(&id)?;
        fs::create_dir_all(&path)
            .with_context(|| format!("creating spreadsheet {}", path.display()))?;
        Ok(id)
    }

    fn write_sheet(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let dir = self.resolve(spreadsheet_id)?;
        if !dir.is_dir() {
            bail!("spreadsheet does not exist: {}", spreadsheet_id);
        }
        let path = dir.join(format!("{}.csv", sheet_name));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("opening sheet {}", path.display()))?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("flushing sheet {}", path.display()))?;
        Ok(())
    }
}
