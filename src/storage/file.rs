//! On-disk durable store.
//!
//! Keeps the whole medium as one JSON object of string keys to string values.
//! Every mutation re-reads the document, applies its one change and rewrites
//! it through a temporary file and a rename, so a crash mid-write leaves the
//! previous contents intact and keys written by another handle are kept.
//! Two writers racing on the same file are not locked against each other.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::{Result, StorageError};
use crate::storage::{item_size, DurableStore};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl FileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = read_document(&path)?;
        debug!("Opened file store {} with {} items", path.display(), items.len());

        Ok(Self {
            path,
            items: Mutex::new(items),
            quota_bytes: None,
        })
    }

    /// Rejects writes once keys and values exceed `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| StorageError::Unavailable("file store lock poisoned".to_string()))
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn check_quota(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            let used: usize = items.iter().map(|(k, v)| item_size(k, v)).sum();
            if used > quota {
                return Err(StorageError::QuotaExceeded { used, quota });
            }
        }
        Ok(())
    }
}

impl DurableStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.lock()?;
        let mut next = read_document(&self.path)?;
        next.insert(key.to_string(), value.to_string());
        self.check_quota(&next)?;
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.lock()?;
        let mut next = read_document(&self.path)?;
        if next.remove(key).is_some() {
            self.persist(&next)?;
        }
        *items = next;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn key(&self, index: usize) -> Result<Option<String>> {
        Ok(self.lock()?.keys().nth(index).cloned())
    }
}

/// Current on-disk contents, empty when the file does not exist yet.
fn read_document(path: &Path) -> Result<BTreeMap<String, String>> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}
