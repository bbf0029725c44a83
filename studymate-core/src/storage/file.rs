//! JSON-file backed store

use super::KeyValueStore;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const STORE_FILE: &str = "store.json";

static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Key-value store persisted as a single JSON object on disk.
///
/// Every operation re-reads the file, so two processes sharing a directory
/// see each other's writes. Each write goes through its own scratch file and
/// an atomic rename; concurrent writers race and the last one wins.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) the store in `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scratch file unique to this process and write
    fn tmp_path(&self) -> PathBuf {
        let seq = TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_extension(format!("json.{}.{}.tmp", std::process::id(), seq))
    }

    fn read_all(&self) -> crate::Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(crate::Error::Storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            crate::utils::ensure_dir(parent)?;
        }

        let tmp = self.tmp_path();
        std::fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Wrote {} keys to {}", map.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        let map = self.read_all()?;
        Ok(map.get(key).and_then(|v| v.as_str()).map(ToString::to_string))
    }

    fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_all()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_all(&map)
    }

    fn remove(&self, key: &str) -> crate::Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}
