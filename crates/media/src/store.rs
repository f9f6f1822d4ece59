//! Attachment stores.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use webpopt_image::AttachmentId;

use crate::{AttachmentRecord, MediaError, Result};

/// Where attachment records live.
pub trait AttachmentStore: Send + Sync {
    /// Look up a record.
    fn get(&self, id: AttachmentId) -> Result<Option<AttachmentRecord>>;

    /// Insert a record, replacing any record with the same id.
    fn insert(&self, record: AttachmentRecord) -> Result<()>;

    /// Replace an existing record. Fails with [`MediaError::NotFound`] when
    /// there is nothing to replace.
    fn update(&self, record: AttachmentRecord) -> Result<()>;

    /// Smallest id greater than every stored id.
    fn next_id(&self) -> Result<AttachmentId>;
}

fn next_after(records: &BTreeMap<u64, AttachmentRecord>) -> AttachmentId {
    AttachmentId(records.keys().next_back().map_or(1, |last| last + 1))
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<u64, AttachmentRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttachmentStore for MemoryStore {
    fn get(&self, id: AttachmentId) -> Result<Option<AttachmentRecord>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(&id.0).cloned())
    }

    fn insert(&self, record: AttachmentRecord) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(record.id.0, record);
        Ok(())
    }

    fn update(&self, record: AttachmentRecord) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        match records.get_mut(&record.id.0) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(MediaError::NotFound(record.id)),
        }
    }

    fn next_id(&self) -> Result<AttachmentId> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(next_after(&records))
    }
}

/// Records kept in one JSON file.
///
/// Every write goes to a temporary file in the same directory which is then
/// renamed over the old one, so readers never see a half-written file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, ordered by id.
    pub fn list(&self) -> Result<Vec<AttachmentRecord>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.into_values().collect())
    }

    fn load(&self) -> Result<BTreeMap<u64, AttachmentRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let list: Vec<AttachmentRecord> = serde_json::from_str(&content)
            .map_err(|e| MediaError::Corrupt(format!("{}: {e}", self.path.display())))?;
        Ok(list.into_iter().map(|r| (r.id.0, r)).collect())
    }

    fn save(&self, records: &BTreeMap<u64, AttachmentRecord>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let list: Vec<&AttachmentRecord> = records.values().collect();
        let mut tmp = tempfile::Builder::new()
            .prefix(".attachments.")
            .suffix(".json.tmp")
            .tempfile_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &list)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| MediaError::IoError(e.error))?;
        Ok(())
    }
}

impl AttachmentStore for JsonFileStore {
    fn get(&self, id: AttachmentId) -> Result<Option<AttachmentRecord>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(&id.0))
    }

    fn insert(&self, record: AttachmentRecord) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut records = self.load()?;
        records.insert(record.id.0, record);
        self.save(&records)
    }

    fn update(&self, record: AttachmentRecord) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut records = self.load()?;
        if !records.contains_key(&record.id.0) {
            return Err(MediaError::NotFound(record.id));
        }
        records.insert(record.id.0, record);
        self.save(&records)
    }

    fn next_id(&self) -> Result<AttachmentId> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(next_after(&self.load()?))
    }
}
