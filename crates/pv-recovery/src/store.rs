//! Record persistence seam
//!
//! The engine reads records and writes exactly one field, the escrow copy.
//! Two backends:
//!   - **Memory**: a locked map, for tests and embedding.
//!   - **JSON file**: loaded entirely into memory, flushed atomically via
//!     temp+rename after every write.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use anyhow::Context;
use pv_core::{VaultError, VaultResult};
use tracing::debug;

use crate::record::EncryptedRecord;

/// Persistence collaborator consumed by the engine.
pub trait RecordStore: Send + Sync {
    /// `Ok(None)` when no record has this id.
    fn load_record(&self, record_id: &str) -> VaultResult<Option<EncryptedRecord>>;

    /// Unconditionally set the record's escrow copy. Last write wins.
    fn store_escrow(&self, record_id: &str, escrow_ciphertext: &str) -> VaultResult<()>;
}

fn poisoned() -> VaultError {
    VaultError::Store("record map lock poisoned".into())
}

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, EncryptedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record_id: impl Into<String>, record: EncryptedRecord) -> VaultResult<()> {
        self.records
            .write()
            .map_err(|_| poisoned())?
            .insert(record_id.into(), record);
        Ok(())
    }

    pub fn get(&self, record_id: &str) -> VaultResult<Option<EncryptedRecord>> {
        Ok(self
            .records
            .read()
            .map_err(|_| poisoned())?
            .get(record_id)
            .cloned())
    }
}

impl RecordStore for MemoryStore {
    fn load_record(&self, record_id: &str) -> VaultResult<Option<EncryptedRecord>> {
        self.get(record_id)
    }

    fn store_escrow(&self, record_id: &str, escrow_ciphertext: &str) -> VaultResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .get_mut(record_id)
            .ok_or_else(|| VaultError::NotFound(record_id.to_string()))?;
        record.escrow_ciphertext = Some(escrow_ciphertext.to_string());
        Ok(())
    }
}

/// Record store persisted as a JSON map `id -> record`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, EncryptedRecord>>,
}

impl JsonFileStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> VaultResult<Self> {
        let records = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading record store: {}", path.display()))
                .map_err(store_err)?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing record store: {}", path.display()))
                .map_err(store_err)?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), records = records.len(), "record store opened");
        Ok(Self {
            path: path.to_path_buf(),
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> VaultResult<usize> {
        Ok(self.records.lock().map_err(|_| poisoned())?.len())
    }

    pub fn is_empty(&self) -> VaultResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Insert or replace a record and flush.
    pub fn insert(&self, record_id: impl Into<String>, record: EncryptedRecord) -> VaultResult<()> {
        let mut records = self.records.lock().map_err(|_| poisoned())?;
        let record_id = record_id.into();
        let previous = records.insert(record_id.clone(), record);

        if let Err(e) = self.flush(&records) {
            match previous {
                Some(previous) => {
                    records.insert(record_id, previous);
                }
                None => {
                    records.remove(&record_id);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Atomic write: temp file in the same directory, then rename.
    fn flush(&self, records: &BTreeMap<String, EncryptedRecord>) -> VaultResult<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .with_context(|| format!("creating store dir: {}", parent.display()))
            .map_err(store_err)?;

        let json = serde_json::to_string_pretty(records)
            .context("serializing record store")
            .map_err(store_err)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records.json".into());
        let tmp_path = parent.join(format!(".{file_name}.tmp"));

        std::fs::write(&tmp_path, json)
            .with_context(|| format!("writing record store temp: {}", tmp_path.display()))
            .map_err(store_err)?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("renaming record store: {}", self.path.display()))
            .map_err(store_err)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn load_record(&self, record_id: &str) -> VaultResult<Option<EncryptedRecord>> {
        Ok(self
            .records
            .lock()
            .map_err(|_| poisoned())?
            .get(record_id)
            .cloned())
    }

    fn store_escrow(&self, record_id: &str, escrow_ciphertext: &str) -> VaultResult<()> {
        let mut records = self.records.lock().map_err(|_| poisoned())?;
        let record = records
            .get_mut(record_id)
            .ok_or_else(|| VaultError::NotFound(record_id.to_string()))?;
        let previous = record.escrow_ciphertext.replace(escrow_ciphertext.to_string());

        if let Err(e) = self.flush(&records) {
            // keep memory and disk in agreement
            if let Some(record) = records.get_mut(record_id) {
                record.escrow_ciphertext = previous;
            }
            return Err(e);
        }
        Ok(())
    }
}

fn store_err(e: anyhow::Error) -> VaultError {
    VaultError::Store(format!("{e:#}"))
}
