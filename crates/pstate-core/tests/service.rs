use std::sync::atomic::{AtomicBool, Ordering};

use pretty_assertions::assert_eq;
use pstate_core::{
    InMemoryStore, LoadError, PersistableStateService, ProtocolConfig, RecordDraft, SaveError,
    SavedObjectStore, StoreError,
};
use pstate_model::{ContentHash, SavedObject, SchemaVersion};
use pstate_test_utils::{
    blob, legacy_rule_record, options_list, registry, rule, service, service_with,
};
use serde_json::json;

/// Store whose first read misses, as if another writer created the record
/// right after it
#[derive(Default)]
struct LateWriterStore {
    inner: InMemoryStore,
    missed: AtomicBool,
}

impl SavedObjectStore for LateWriterStore {
    fn get(&self, kind: &str, id: &str) -> Result<SavedObject, StoreError> {
        if !self.missed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            });
        }
        self.inner.get(kind, id)
    }

    fn create(&self, id: Option<&str>, draft: RecordDraft) -> Result<SavedObject, StoreError> {
        self.inner.create(id, draft)
    }

    fn update(
        &self,
        id: &str,
        draft: RecordDraft,
        expected_version: Option<ContentHash>,
    ) -> Result<SavedObject, StoreError> {
        self.inner.update(id, draft, expected_version)
    }

    fn find(&self, kind: &str) -> Vec<SavedObject> {
        self.inner.find(kind)
    }
}

fn newer_rule_with_bad_revision() -> SavedObject {
    SavedObject::from_sanitized(
        "r-7",
        blob(json!({"type": "rule", "name": "future", "revision": "x"})),
        Vec::new(),
        SchemaVersion::new(7),
    )
}

#[test]
fn save_then_load_round_trips() {
    let service = service();

    let saved = service.create(Some("ctrl-1"), options_list()).unwrap();
    assert_eq!(saved.record.schema_version, SchemaVersion::new(2));
    assert_eq!(saved.record.attributes.get("title"), Some(&json!("Hosts")));
    assert!(!saved.record.attributes.contains_key("dataViewId"));
    assert_eq!(saved.record.references.len(), 1);

    let loaded = service.load("options-list", "ctrl-1").unwrap();
    assert_eq!(loaded.state, options_list());
    assert!(!loaded.was_migrated());
    assert_eq!(loaded.version, saved.record.version);
}

#[test]
fn legacy_record_is_migrated_on_load() {
    let service = service();
    service.store().insert_raw(legacy_rule_record("r-1"));

    let loaded = service.load("rule", "r-1").unwrap();

    assert!(loaded.was_migrated());
    assert_eq!(loaded.stored_version, SchemaVersion::INITIAL);
    assert_eq!(loaded.schema_version, SchemaVersion::new(5));
    assert_eq!(
        loaded.state,
        blob(json!({
            "type": "rule",
            "name": "legacy",
            "enabled": false,
            "params": {"searchConfiguration": {"query": "*", "index": "dv-logs"}},
            "notifyWhen": "onThrottleInterval",
            "revision": 0
        }))
    );
}

#[test]
fn record_from_newer_writer_drops_unknown_fields() {
    let service = service();
    let mut record = SavedObject::from_sanitized(
        "r-9",
        blob(json!({"type": "rule", "name": "future", "futureSetting": {"x": 1}})),
        Vec::new(),
        SchemaVersion::new(7),
    );
    record.version = Some(record.compute_version());
    service.store().insert_raw(record);

    let loaded = service.load("rule", "r-9").unwrap();
    assert_eq!(loaded.schema_version, SchemaVersion::new(5));
    assert_eq!(loaded.state, blob(json!({"type": "rule", "name": "future"})));
}

#[test]
fn newer_fields_kept_when_configured() {
    let service = service_with(ProtocolConfig::default().with_drop_unknown_fields_on_read(false));
    service.store().insert_raw(SavedObject::from_sanitized(
        "r-9",
        blob(json!({"type": "rule", "name": "future", "futureSetting": 1})),
        Vec::new(),
        SchemaVersion::new(7),
    ));

    let loaded = service.load("rule", "r-9").unwrap();
    assert_eq!(loaded.state.get("futureSetting"), Some(&json!(1)));
}

#[test]
fn broken_legacy_record_fails_with_user_message() {
    let service = service();
    service.store().insert_raw(SavedObject::from_sanitized(
        "r-bad",
        blob(json!({"type": "rule", "name": 42})),
        Vec::new(),
        SchemaVersion::INITIAL,
    ));

    let err = service.load("rule", "r-bad").unwrap_err();
    assert!(matches!(err, LoadError::Migration(_)));
    assert_eq!(err.user_message(), "this saved item could not be loaded");
}

#[test]
fn missing_record_is_not_found() {
    let err = service().load("rule", "nope").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "this saved item could not be loaded");
}

#[test]
fn save_rejects_invalid_state() {
    let service = service();
    let result = service.create(None, blob(json!({"type": "rule", "enabled": true})));
    assert!(matches!(result, Err(SaveError::Validation { .. })));
    assert!(service.store().is_empty());
}

#[test]
fn update_uses_optimistic_concurrency() {
    let service = service();
    let saved = service.create(Some("r-1"), rule()).unwrap();

    let renamed = rule().with_field("name", json!("cpu very high"));
    let updated = service
        .update("r-1", renamed.clone(), saved.record.version)
        .unwrap();
    assert_ne!(updated.record.version, saved.record.version);

    let stale = service.update("r-1", renamed, saved.record.version);
    assert!(matches!(
        stale,
        Err(SaveError::Store(StoreError::VersionConflict { .. }))
    ));
}

#[test]
fn unknown_kind_is_stored_and_loaded_unchanged() {
    let service = service();
    let state = blob(json!({"type": "unknown-x", "a": 1}));

    let saved = service.create(Some("u-1"), state.clone()).unwrap();
    assert_eq!(saved.record.schema_version, SchemaVersion::INITIAL);

    let loaded = service.load("unknown-x", "u-1").unwrap();
    assert_eq!(loaded.state, state);
    assert_eq!(loaded.warnings.len(), 1);
}

#[test]
fn usage_collection_over_store() {
    let service = service();
    service.create(Some("a"), options_list()).unwrap();
    service
        .create(
            Some("b"),
            options_list().with_field("singleSelect", json!(true)),
        )
        .unwrap();
    service.store().insert_raw(legacy_rule_record("r-1"));

    let report = service.collect_usage("options-list");
    assert_eq!(report.sampled, 2);
    assert_eq!(report.metrics.count("options-list.total"), 2);
    assert_eq!(report.metrics.count("options-list.singleSelect"), 1);

    let all = service.collect_all_usage();
    assert_eq!(all.sampled, 3);
    assert_eq!(all.metrics.count("rule.total"), 1);
    assert!(!serde_json::to_string(&all).unwrap().contains("dv-"));
}

#[test]
fn store_is_shared_through_trait() {
    let service = service();
    service.create(Some("a"), options_list()).unwrap();
    assert_eq!(service.store().find("options-list").len(), 1);
    assert_eq!(
        service.store().get("options-list", "a").unwrap().references.len(),
        1
    );
}

#[test]
fn save_creates_then_overwrites() {
    let service = service();

    let first = service.save("ctrl-1", options_list()).unwrap();
    let second = service
        .save("ctrl-1", options_list().with_field("title", json!("Services")))
        .unwrap();

    assert_eq!(first.record.id, second.record.id);
    assert_eq!(service.store().len(), 1);
    assert_eq!(
        service.load("options-list", "ctrl-1").unwrap().state.get("title"),
        Some(&json!("Services"))
    );
}

#[test]
fn save_overwrites_record_created_after_its_read() {
    let store = LateWriterStore::default();
    store.inner.insert_raw(SavedObject::from_sanitized(
        "ctrl-1",
        options_list(),
        Vec::new(),
        SchemaVersion::new(2),
    ));
    let service = PersistableStateService::new(registry(), ProtocolConfig::default(), store);

    service
        .save("ctrl-1", options_list().with_field("title", json!("Services")))
        .unwrap();

    assert_eq!(
        service.load("options-list", "ctrl-1").unwrap().state.get("title"),
        Some(&json!("Services"))
    );
}

#[test]
fn newer_record_violating_latest_shape_is_incompatible() {
    let service = service();
    service.store().insert_raw(newer_rule_with_bad_revision());

    let err = service.load("rule", "r-7").unwrap_err();
    match &err {
        LoadError::Incompatible { written, latest, .. } => {
            assert_eq!(*written, SchemaVersion::new(7));
            assert_eq!(*latest, SchemaVersion::new(5));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.user_message(), "this saved item could not be loaded");
}

#[test]
fn newer_record_loads_without_boundary_validation() {
    let service = service_with(ProtocolConfig::default().with_validate_boundaries(false));
    service.store().insert_raw(newer_rule_with_bad_revision());

    let loaded = service.load("rule", "r-7").unwrap();
    assert_eq!(loaded.schema_version, SchemaVersion::new(5));
    assert_eq!(loaded.state.get("revision"), Some(&json!("x")));
}

#[test]
fn usage_counts_records_that_fail_to_migrate() {
    let service = service();
    service.store().insert_raw(SavedObject::from_sanitized(
        "r-bad",
        blob(json!({"type": "rule", "name": 42, "enabled": true})),
        Vec::new(),
        SchemaVersion::INITIAL,
    ));

    let report = service.collect_usage("rule");

    assert_eq!(report.sampled, 1);
    assert_eq!(report.metrics.count("rule.total"), 1);
    assert_eq!(report.metrics.count("rule.enabled"), 1);
}

#[test]
fn null_data_view_is_accepted_on_save() {
    let service = service();
    let saved = service
        .create(
            Some("ctrl-null"),
            options_list().with_field("dataViewId", json!(null)),
        )
        .unwrap();
    assert!(saved.record.references.is_empty());
}
