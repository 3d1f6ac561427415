//! Durable key/value storage and the single-slot delivery record.
//!
//! `FileStore` keeps every key in one JSON object on disk, e.g.
//! `~/.local/share/image-cropper/storage.json`. Writes go to a temp file
//! that is renamed over the original, so a reader sees either the old or
//! the new object, never a partial one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Well-known key holding the most recent extracted payload.
pub const DELIVERY_RECORD_KEY: &str = "lastCroppedImage";

const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON-file store shared by every process that points at the same dir.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(STORAGE_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Per-process scratch file, so concurrent writers never share one.
    fn temp_path(&self) -> PathBuf {
        self.path
            .with_extension(format!("json.{}.tmp", std::process::id()))
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(map)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        // Corrupted contents are overwritten.
        let mut map = self.read_all().unwrap_or_default();
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut map = self.read_all().unwrap_or_default();
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

/// In-process store. Both contexts must share the same `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// The single-slot record of the last extracted payload.
/// Every `save` overwrites; `clear` removes it wholesale.
#[derive(Clone)]
pub struct DeliveryRecord {
    store: Arc<dyn KeyValueStore>,
}

impl DeliveryRecord {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, data_url: &str) -> Result<(), StoreError> {
        self.store.set(DELIVERY_RECORD_KEY, data_url)
    }

    pub fn load(&self) -> Result<Option<String>, StoreError> {
        self.store.get(DELIVERY_RECORD_KEY)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(DELIVERY_RECORD_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "image-cropper-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = temp_dir("missing");
        let store = FileStore::new(&dir);
        assert_eq!(store.get(DELIVERY_RECORD_KEY).unwrap(), None);
    }

    #[test]
    fn record_overwrites_single_slot() {
        let dir = temp_dir("overwrite");
        let record = DeliveryRecord::new(Arc::new(FileStore::new(&dir)));

        record.save("data:image/png;base64,AAAA").unwrap();
        record.save("data:image/png;base64,BBBB").unwrap();
        assert_eq!(record.load().unwrap().as_deref(), Some("data:image/png;base64,BBBB"));

        // Other processes see the same file
        let other = DeliveryRecord::new(Arc::new(FileStore::new(&dir)));
        assert_eq!(other.load().unwrap().as_deref(), Some("data:image/png;base64,BBBB"));

        record.clear().unwrap();
        assert_eq!(other.load().unwrap(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupted_file_is_an_error_until_rewritten() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let store = FileStore::new(&dir);
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.get(DELIVERY_RECORD_KEY), Err(StoreError::Json(_))));
        store.set(DELIVERY_RECORD_KEY, "data:image/png;base64,AAAA").unwrap();
        assert!(store.get(DELIVERY_RECORD_KEY).unwrap().is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn writes_use_a_per_process_scratch_file() {
        let dir = temp_dir("scratch");
        let store = FileStore::new(&dir);

        let tmp = store.temp_path();
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("storage.json.{}.tmp", std::process::id()));
        assert_ne!(tmp, store.path());

        store.set(DELIVERY_RECORD_KEY, "data:image/png;base64,AAAA").unwrap();
        assert!(!tmp.exists());
        assert!(store.path().exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn memory_store_roundtrip() {
        let record = DeliveryRecord::new(Arc::new(MemoryStore::new()));
        assert_eq!(record.load().unwrap(), None);
        record.save("x").unwrap();
        assert_eq!(record.load().unwrap().as_deref(), Some("x"));
        record.clear().unwrap();
        assert_eq!(record.load().unwrap(), None);
    }
}
