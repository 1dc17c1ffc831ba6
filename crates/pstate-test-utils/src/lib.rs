//! Testing utilities for the persistable state workspace
//!
//! Shared fixtures for blobs, legacy records and services.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use pstate_core::{InMemoryStore, KindRegistry, PersistableStateService, ProtocolConfig};
use pstate_model::{Reference, SavedObject, SchemaVersion, StateBlob};
use serde_json::{json, Value};

pub const DATA_VIEW_ID: &str = "dv-1";

pub fn blob(value: Value) -> StateBlob {
    StateBlob::from_value(value).unwrap()
}

/// `{type: "options-list", dataViewId: "dv-1", title: "Hosts"}`
pub fn options_list() -> StateBlob {
    blob(json!({
        "type": "options-list",
        "dataViewId": DATA_VIEW_ID,
        "title": "Hosts"
    }))
}

pub fn options_list_reference() -> Reference {
    Reference::new("optionsListDataView", "index-pattern", DATA_VIEW_ID)
}

pub fn rule() -> StateBlob {
    blob(json!({
        "type": "rule",
        "name": "cpu high",
        "enabled": true,
        "ruleTypeId": ".es-query",
        "params": {
            "searchConfiguration": {"index": "dv-logs", "query": "host:*"},
            "threshold": [90]
        },
        "tags": ["infra"],
        "notifyWhen": "onActiveAlert"
    }))
}

/// A rule as a version 1 writer stored it, already sanitized
pub fn legacy_rule_record(id: &str) -> SavedObject {
    let state = blob(json!({
        "type": "rule",
        "name": "legacy",
        "enabled": false,
        "params": {"searchConfiguration": {"query": "*"}},
        "notify_when": "onThrottleInterval",
        "legacyId": "old-123"
    }));
    SavedObject::from_sanitized(
        id,
        state,
        vec![Reference::new(
            "param:kibanaSavedObjectMeta.searchSourceJSON.index",
            "index-pattern",
            "dv-logs",
        )],
        SchemaVersion::INITIAL,
    )
}

pub fn registry() -> KindRegistry {
    KindRegistry::with_builtin_kinds().unwrap()
}

pub fn service() -> PersistableStateService<InMemoryStore> {
    service_with(ProtocolConfig::default())
}

pub fn service_with(config: ProtocolConfig) -> PersistableStateService<InMemoryStore> {
    PersistableStateService::new(registry(), config, InMemoryStore::new())
}
