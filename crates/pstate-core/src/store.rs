//! Saved object storage
//!
//! The protocol only needs keyed reads and whole-record writes. A record's
//! `(attributes, references)` pair is always written in one operation, so
//! readers never see one without the other.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pstate_model::{ContentHash, Reference, SavedObject, SchemaVersion, StateBlob};
use uuid::Uuid;

/// Everything a writer supplies for one record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    /// Sanitized state
    pub state: StateBlob,
    /// References extracted from `state`
    pub references: Vec<Reference>,
    /// Version `state` is shaped for
    pub schema_version: SchemaVersion,
}

impl RecordDraft {
    fn into_record(self, id: String) -> SavedObject {
        SavedObject::from_sanitized(id, self.state, self.references, self.schema_version)
            .stamped(Utc::now())
    }
}

/// Storage backend for saved objects
pub trait SavedObjectStore: Send + Sync {
    /// Read one record
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if there is no such record
    fn get(&self, kind: &str, id: &str) -> Result<SavedObject, StoreError>;

    /// Write a new record, generating an id when none is given
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] if the id is taken
    fn create(&self, id: Option<&str>, draft: RecordDraft) -> Result<SavedObject, StoreError>;

    /// Replace an existing record
    ///
    /// With `expected_version`, the write only succeeds if the stored record
    /// still carries that token.
    ///
    /// # Errors
    /// Returns error if the record is missing or was changed concurrently
    fn update(
        &self,
        id: &str,
        draft: RecordDraft,
        expected_version: Option<ContentHash>,
    ) -> Result<SavedObject, StoreError>;

    /// Every record of a kind, ordered by id
    fn find(&self, kind: &str) -> Vec<SavedObject>;
}

/// Errors from storage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No such record
    #[error("saved object {kind}/{id} not found")]
    NotFound { kind: String, id: String },

    /// The id is already taken
    #[error("saved object {kind}/{id} already exists")]
    Conflict { kind: String, id: String },

    /// The record changed since it was read
    #[error("saved object {kind}/{id} was modified concurrently")]
    VersionConflict {
        kind: String,
        id: String,
        expected: ContentHash,
        actual: Option<ContentHash>,
    },
}

type RecordKey = (String, String);

/// Concurrent in-memory store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<RecordKey, SavedObject>,
}

impl InMemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a record as-is, replacing any existing one
    ///
    /// Used to seed records written by other versions.
    pub fn insert_raw(&self, record: SavedObject) {
        self.records
            .insert((record.kind.clone(), record.id.clone()), record);
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SavedObjectStore for InMemoryStore {
    fn get(&self, kind: &str, id: &str) -> Result<SavedObject, StoreError> {
        self.records
            .get(&(kind.to_string(), id.to_string()))
            .map(|record| record.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            })
    }

    fn create(&self, id: Option<&str>, draft: RecordDraft) -> Result<SavedObject, StoreError> {
        let id = id.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
        let kind = draft.state.kind().to_string();

        match self.records.entry((kind.clone(), id.clone())) {
            Entry::Occupied(_) => Err(StoreError::Conflict { kind, id }),
            Entry::Vacant(slot) => {
                let record = draft.into_record(id);
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    fn update(
        &self,
        id: &str,
        draft: RecordDraft,
        expected_version: Option<ContentHash>,
    ) -> Result<SavedObject, StoreError> {
        let kind = draft.state.kind().to_string();
        let key = (kind.clone(), id.to_string());

        let Some(mut current) = self.records.get_mut(&key) else {
            return Err(StoreError::NotFound {
                kind,
                id: id.to_string(),
            });
        };

        if let Some(expected) = expected_version {
            if current.version != Some(expected) {
                return Err(StoreError::VersionConflict {
                    kind,
                    id: id.to_string(),
                    expected,
                    actual: current.version,
                });
            }
        }

        let record = draft.into_record(id.to_string());
        *current = record.clone();
        Ok(record)
    }

    fn find(&self, kind: &str) -> Vec<SavedObject> {
        let mut records: Vec<SavedObject> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(title: &str) -> RecordDraft {
        RecordDraft {
            state: StateBlob::new("options-list").with_field("title", json!(title)),
            references: vec![Reference::new("optionsListDataView", "index-pattern", "dv-1")],
            schema_version: SchemaVersion::new(2),
        }
    }

    #[test]
    fn create_then_get() {
        let store = InMemoryStore::new();
        let created = store.create(Some("ctrl-1"), draft("Hosts")).unwrap();
        assert!(created.version.is_some());
        assert!(created.updated_at.is_some());

        let loaded = store.get("options-list", "ctrl-1").unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.references.len(), 1);
    }

    #[test]
    fn create_generates_ids() {
        let store = InMemoryStore::new();
        let a = store.create(None, draft("a")).unwrap();
        let b = store.create(None, draft("b")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn create_rejects_taken_id() {
        let store = InMemoryStore::new();
        store.create(Some("x"), draft("a")).unwrap();
        assert!(matches!(
            store.create(Some("x"), draft("b")),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn update_checks_version() {
        let store = InMemoryStore::new();
        let created = store.create(Some("x"), draft("a")).unwrap();

        let updated = store.update("x", draft("b"), created.version).unwrap();
        assert_ne!(updated.version, created.version);

        let stale = store.update("x", draft("c"), created.version);
        assert!(matches!(stale, Err(StoreError::VersionConflict { .. })));

        let forced = store.update("x", draft("d"), None).unwrap();
        assert_eq!(forced.attributes.get("title"), Some(&json!("d")));
    }

    #[test]
    fn update_missing_record() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.update("nope", draft("a"), None),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn find_filters_by_kind() {
        let store = InMemoryStore::new();
        store.create(Some("b"), draft("b")).unwrap();
        store.create(Some("a"), draft("a")).unwrap();
        store.insert_raw(SavedObject::from_sanitized(
            "r",
            StateBlob::new("rule"),
            Vec::new(),
            SchemaVersion::INITIAL,
        ));

        let ids: Vec<String> = store.find("options-list").into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
