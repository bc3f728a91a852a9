//! Durable key-value backends for saved layouts

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

use crate::constants::persistence::FILE_EXTENSION;

/// String key to string value storage. Writers outside the engine are not
/// coordinated with; the last write wins.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", encode_key(key), FILE_EXTENSION))
    }
}

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// File name for a key. Every other byte is written as `%XX` so distinct keys
/// never share a file.
fn encode_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        if is_plain(byte) {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    name
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut key = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            key.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            key.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(key).ok()
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read layout file: {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create layout directory: {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("Failed to write layout file: {}", path.display()))?;
        debug!(key = %key, path = %path.display(), bytes = value.len(), "Wrote layout file");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove layout file: {}", path.display())),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list layout directory: {}", self.dir.display()));
            }
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.context("Failed to read layout directory entry")?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match decode_key(stem) {
                Some(key) => keys.push(key),
                None => debug!(path = %path.display(), "Skipping file that is not an encoded layout key"),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-memory store. Clones share the same entries, so a host can hand one
/// clone to the engine and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("map-label-layout-store-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = temp_dir("roundtrip");
        let mut store = FileStore::new(&dir);

        assert_eq!(store.get("label_layout_config_7").unwrap(), None);
        store.set("label_layout_config_7", "{}").unwrap();
        assert_eq!(store.get("label_layout_config_7").unwrap(), Some("{}".to_string()));
        assert_eq!(store.keys().unwrap(), vec!["label_layout_config_7".to_string()]);

        store.remove("label_layout_config_7").unwrap();
        assert_eq!(store.get("label_layout_config_7").unwrap(), None);
        // Removing a missing key is not an error
        store.remove("label_layout_config_7").unwrap();

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = temp_dir("sanitize");
        let store = FileStore::new(&dir);
        let path = store.path_for("label_layout_type_../etc");
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert!(path.ends_with("label_layout_type_%2E%2E%2Fetc.json"));
    }

    #[test]
    fn test_file_store_distinct_keys_get_distinct_files() {
        let dir = temp_dir("distinct");
        let mut store = FileStore::new(&dir);
        let spaced = "label_layout_type_dot density";
        let joined = "label_layout_type_dot_density";
        assert_ne!(store.path_for(spaced), store.path_for(joined));
        assert_ne!(store.path_for("label_layout_config_1.0"), store.path_for("label_layout_config_1_0"));

        store.set(spaced, "a").unwrap();
        store.set(joined, "b").unwrap();
        assert_eq!(store.get(spaced).unwrap().as_deref(), Some("a"));
        assert_eq!(store.get(joined).unwrap().as_deref(), Some("b"));
        assert_eq!(store.keys().unwrap(), vec![spaced.to_string(), joined.to_string()]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_missing_dir_has_no_keys() {
        let store = FileStore::new(temp_dir("missing"));
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let mut store = MemoryStore::new();
        let observer = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(observer.get("k").unwrap(), Some("v".to_string()));
        assert_eq!(observer.len(), 1);
    }
}
