//! Durable record of approved requests.

use crate::error::StoreError;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashSet},
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Key to boolean approval entries. Entries never expire; they live until [`clear`].
///
/// [`clear`]: ApprovalStore::clear
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait ApprovalStore: Send + Sync + fmt::Debug {
    fn is_approved(&self, key: &str) -> Result<bool, StoreError>;

    fn record(&self, key: &str) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryApprovalStore {
    approved: Mutex<HashSet<String>>,
}

impl MemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.approved.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.approved.lock().is_empty()
    }
}

impl ApprovalStore for MemoryApprovalStore {
    fn is_approved(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.approved.lock().contains(key))
    }

    fn record(&self, key: &str) -> Result<(), StoreError> {
        self.approved.lock().insert(key.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.approved.lock().clear();
        Ok(())
    }
}

/// Approvals persisted as a JSON object, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileApprovalStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, bool>>,
}

impl JsonFileApprovalStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = fs::read(&path)?;
            if contents.is_empty() { BTreeMap::new() } else { serde_json::from_slice(&contents)? }
        } else {
            BTreeMap::new()
        };
        trace!(target: "session::store", path = %path.display(), entries = entries.len(), "opened approval store");
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a sibling temp file and renames it over the store, so readers never see a
    /// partial write.
    fn flush(&self, entries: &BTreeMap<String, bool>) -> Result<(), StoreError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(io::Error::from)?;
        Ok(())
    }
}

impl ApprovalStore for JsonFileApprovalStore {
    fn is_approved(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.lock().get(key).copied().unwrap_or_default())
    }

    fn record(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), true);
        self.flush(&entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.clear();
        self.flush(&entries)
    }
}
