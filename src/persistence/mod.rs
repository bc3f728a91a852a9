//! Scope-keyed layout persistence
//!
//! Each scope key holds one JSON object mapping label id to its placement
//! record. Saving is a read-modify-write merge: records are written under the
//! key of their own scope and nothing else at that key is dropped.

pub mod store;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::identity::LabelId;
use crate::scope::Scope;
use crate::types::{BackgroundStyle, FontWeight, LabelStyle, Offset};

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Persisted placement and style of one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    pub label_id: LabelId,
    pub offset: Offset,
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub background_style: BackgroundStyle,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub last_edited_timestamp: u64,
    #[serde(default)]
    pub scope: Scope,
}

fn default_visible() -> bool {
    true
}

/// Wall-clock milliseconds for `last_edited_timestamp`
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl PlacementRecord {
    pub fn new(label_id: LabelId, offset: Offset, style: &LabelStyle, scope: Scope) -> Self {
        Self {
            label_id,
            offset,
            font_size: style.font_size,
            font_weight: style.font_weight,
            background_style: style.background.clone(),
            visible: true,
            last_edited_timestamp: timestamp_millis(),
            scope,
        }
    }

    pub fn style(&self) -> LabelStyle {
        LabelStyle::new(self.font_size, self.font_weight, self.background_style.clone())
    }

    /// Refresh the edit timestamp
    pub fn touch(&mut self) {
        self.last_edited_timestamp = timestamp_millis();
    }
}

/// Record set stored under one key
pub type RecordSet = BTreeMap<LabelId, PlacementRecord>;

/// Reads and writes record sets through a [`KeyValueStore`]
pub struct PersistenceStore {
    backend: Box<dyn KeyValueStore>,
    base_key: String,
}

impl std::fmt::Debug for PersistenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceStore").field("base_key", &self.base_key).finish()
    }
}

impl PersistenceStore {
    pub fn new(backend: Box<dyn KeyValueStore>, base_key: impl Into<String>) -> Self {
        Self {
            backend,
            base_key: base_key.into(),
        }
    }

    pub fn storage_key(&self, scope: &Scope) -> String {
        scope.storage_key(&self.base_key)
    }

    fn read_set(&self, key: &str) -> Result<RecordSet> {
        let Some(contents) = self.backend.get(key).with_context(|| format!("Failed to read layout '{}'", key))? else {
            return Ok(RecordSet::new());
        };
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse layout '{}'", key))
    }

    fn write_set(&mut self, key: &str, set: &RecordSet) -> Result<()> {
        if set.is_empty() {
            return self
                .backend
                .remove(key)
                .with_context(|| format!("Failed to remove empty layout '{}'", key));
        }
        let contents = serde_json::to_string(set).context("Failed to serialize layout records")?;
        self.backend
            .set(key, &contents)
            .with_context(|| format!("Failed to write layout '{}'", key))
    }

    /// Merge `records` into storage, each under its own scope's key.
    /// Returns the number of records written.
    pub fn save<'a>(&mut self, records: impl IntoIterator<Item = &'a PlacementRecord>) -> Result<usize> {
        let mut by_key: BTreeMap<String, Vec<&PlacementRecord>> = BTreeMap::new();
        for record in records {
            by_key.entry(self.storage_key(&record.scope)).or_default().push(record);
        }

        let mut written = 0;
        for (key, records) in by_key {
            // A corrupt value aborts the save instead of being replaced
            let mut set = self.read_set(&key)?;
            for record in records {
                // Keys don't carry the project, so the same id can already
                // belong to another project here
                if let Some(stored) = set.get(&record.label_id)
                    && !stored.scope.matches(&record.scope)
                {
                    warn!(key = %key, label = %record.label_id, stored = %stored.scope, "Skipping record owned by another scope");
                    continue;
                }
                set.insert(record.label_id.clone(), record.clone());
                written += 1;
            }
            self.write_set(&key, &set)?;
            debug!(key = %key, records = set.len(), "Merged layout records");
        }
        Ok(written)
    }

    /// Records stored for `scope` whose own scope matches it. Non-matching
    /// records are skipped and left in storage.
    pub fn load(&self, scope: &Scope) -> Result<Vec<PlacementRecord>> {
        let key = self.storage_key(scope);
        let set = self.read_set(&key)?;
        let total = set.len();
        let records: Vec<PlacementRecord> = set.into_values().filter(|r| r.scope.matches(scope)).collect();
        if records.len() != total {
            debug!(key = %key, skipped = total - records.len(), "Ignored records from another scope");
        }
        info!(key = %key, records = records.len(), "Loaded layout records");
        Ok(records)
    }

    /// Delete the given labels' records in `scope`. Returns how many existed.
    pub fn remove(&mut self, scope: &Scope, ids: &[LabelId]) -> Result<usize> {
        let key = self.storage_key(scope);
        let mut set = self.read_set(&key)?;
        let before = set.len();
        set.retain(|id, record| !(ids.contains(id) && record.scope.matches(scope)));
        let removed = before - set.len();
        if removed > 0 {
            self.write_set(&key, &set)?;
        }
        Ok(removed)
    }

    /// Delete every record belonging to `scope`
    pub fn clear_scope(&mut self, scope: &Scope) -> Result<usize> {
        let key = self.storage_key(scope);
        let mut set = self.read_set(&key)?;
        let before = set.len();
        set.retain(|_, record| !record.scope.matches(scope));
        let removed = before - set.len();
        if removed > 0 {
            self.write_set(&key, &set)?;
        }
        info!(key = %key, removed = removed, "Cleared layout records");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::persistence::BASE_KEY;

    fn scope(config: &str, map_type: &str) -> Scope {
        Scope::new(None, Some(config.to_string()), Some(map_type.to_string()))
    }

    fn record(id: &str, x: f32, y: f32, scope: &Scope) -> PlacementRecord {
        let style = LabelStyle::new(10.0, FontWeight::Bold, BackgroundStyle::enabled());
        PlacementRecord::new(LabelId::new(id), Offset::new(x, y), &style, scope.clone())
    }

    fn store() -> (PersistenceStore, MemoryStore) {
        let backend = MemoryStore::new();
        (PersistenceStore::new(Box::new(backend.clone()), BASE_KEY), backend)
    }

    #[test]
    fn test_storage_key_layout() {
        let (store, _) = store();
        assert_eq!(store.storage_key(&scope("12", "dots")), "label_layout_config_12_type_dots");
        assert_eq!(store.storage_key(&Scope::unscoped()), "label_layout");
    }

    #[test]
    fn test_save_load_roundtrip_keeps_every_field() {
        let (mut store, _) = store();
        let a = scope("1", "dots");
        let mut saved = record("feature_1", 20.0, 5.0, &a);
        saved.visible = false;
        saved.last_edited_timestamp = 1_700_000_000_000;

        assert_eq!(store.save([&saved]).unwrap(), 1);
        let loaded = store.load(&a).unwrap();
        assert_eq!(loaded, vec![saved]);
    }

    #[test]
    fn test_same_id_different_scope_isolated() {
        let (mut store, backend) = store();
        let a = scope("1", "dots");
        let b = scope("2", "dots");
        store.save([&record("feature_1", 1.0, 1.0, &a)]).unwrap();
        store.save([&record("feature_1", 9.0, 9.0, &b)]).unwrap();

        assert_eq!(store.load(&a).unwrap()[0].offset, Offset::new(1.0, 1.0));
        assert_eq!(store.load(&b).unwrap()[0].offset, Offset::new(9.0, 9.0));
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_save_merges_into_existing_set() {
        let (mut store, _) = store();
        let a = scope("1", "dots");
        store.save([&record("one", 1.0, 0.0, &a)]).unwrap();
        store.save([&record("two", 2.0, 0.0, &a)]).unwrap();
        store.save([&record("one", 3.0, 0.0, &a)]).unwrap();

        let loaded = store.load(&a).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].offset, Offset::new(3.0, 0.0));
        assert_eq!(loaded[1].offset, Offset::new(2.0, 0.0));
    }

    #[test]
    fn test_load_ignores_but_keeps_foreign_records() {
        let (mut store, backend) = store();
        let a = scope("1", "dots");
        // Planted by another writer under A's key with a conflicting scope
        let mut set = RecordSet::new();
        set.insert(LabelId::new("mine"), record("mine", 1.0, 1.0, &a));
        set.insert(LabelId::new("theirs"), record("theirs", 2.0, 2.0, &scope("1", "heatmap")));
        let key = store.storage_key(&a);
        let mut raw = backend.clone();
        raw.set(&key, &serde_json::to_string(&set).unwrap()).unwrap();

        let loaded = store.load(&a).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].label_id, LabelId::new("mine"));

        // Saving and clearing A leaves the foreign record in place
        store.save([&record("mine", 5.0, 5.0, &a)]).unwrap();
        store.clear_scope(&a).unwrap();
        let remaining: RecordSet = serde_json::from_str(&backend.get(&key).unwrap().unwrap()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains_key(&LabelId::new("theirs")));
    }

    #[test]
    fn test_remove_single_record() {
        let (mut store, backend) = store();
        let a = scope("1", "dots");
        store.save([&record("one", 1.0, 0.0, &a), &record("two", 2.0, 0.0, &a)]).unwrap();

        assert_eq!(store.remove(&a, &[LabelId::new("one")]).unwrap(), 1);
        assert_eq!(store.remove(&a, &[LabelId::new("missing")]).unwrap(), 0);
        let loaded = store.load(&a).unwrap();
        assert_eq!(loaded.len(), 1);

        store.remove(&a, &[LabelId::new("two")]).unwrap();
        // Empty sets drop their key
        assert!(backend.is_empty());
    }

    #[test]
    fn test_corrupt_value_is_reported_not_overwritten() {
        let (mut store, backend) = store();
        let a = scope("1", "dots");
        let key = store.storage_key(&a);
        let mut raw = backend.clone();
        raw.set(&key, "not json").unwrap();

        assert!(store.load(&a).is_err());
        assert!(store.save([&record("one", 1.0, 0.0, &a)]).is_err());
        assert_eq!(backend.get(&key).unwrap(), Some("not json".to_string()));
    }

    #[test]
    fn test_record_json_field_names() {
        let a = scope("1", "dots");
        let json = serde_json::to_value(record("feature_1", 20.0, 5.0, &a)).unwrap();
        for field in ["labelId", "offset", "fontSize", "fontWeight", "backgroundStyle", "visible", "lastEditedTimestamp", "scope"] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(json["scope"]["mapConfigurationId"], "1");
    }

    #[test]
    fn test_projects_sharing_a_key_keep_their_own_records() {
        let (mut store, backend) = store();
        let p1 = Scope::new(Some("p1".into()), Some("1".into()), Some("dots".into()));
        let p2 = Scope::new(Some("p2".into()), Some("1".into()), Some("dots".into()));
        assert_eq!(store.storage_key(&p1), store.storage_key(&p2));

        assert_eq!(store.save([&record("feature_1", 1.0, 1.0, &p1)]).unwrap(), 1);
        assert_eq!(store.save([&record("feature_1", 9.0, 9.0, &p2)]).unwrap(), 0);
        assert_eq!(store.save([&record("feature_2", 4.0, 4.0, &p2)]).unwrap(), 1);
        assert_eq!(backend.len(), 1);

        let first = store.load(&p1).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].offset, Offset::new(1.0, 1.0));
        let second = store.load(&p2).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].label_id, LabelId::new("feature_2"));
    }
}
