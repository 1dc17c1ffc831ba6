//! Alerting rules
//!
//! The rule's data view id lives inside its params, so the reference path
//! is nested and the reference name carries the `param:` prefix.

use pstate_migrations::{ModelChange, ModelVersion};
use pstate_model::{FieldClass, FieldPath};
use serde_json::json;

use super::{field, schema, INDEX_PATTERN};
use crate::kind::KindDefinition;
use crate::registry::RegistryError;

/// Alerting rule
pub const RULE: &str = "rule";

const NOTIFY_WHEN: &[&str] = &["onActiveAlert", "onThrottleInterval", "onActionGroupChange"];

pub(super) fn rule() -> Result<KindDefinition, RegistryError> {
    let properties = json!({
        "name": {"type": "string"},
        "tags": {"type": "array", "items": {"type": "string"}},
        "enabled": {"type": "boolean"},
        "ruleTypeId": {"type": "string"},
        "consumer": {"type": "string"},
        "schedule": {"type": "object"},
        "params": {"type": "object"},
        "actions": {"type": "array"},
        "throttle": {"type": ["string", "null"]},
        "revision": {"type": "integer", "minimum": 0},
        "notifyWhen": {"type": ["string", "null"]},
        "artifacts": {
            "type": "object",
            "properties": {
                "dashboards": {"type": "array"},
                "investigation_guide": {"type": "object"}
            }
        }
    });

    Ok(KindDefinition::builder(RULE)
        .reference(
            field("params.searchConfiguration.index")?,
            "param:kibanaSavedObjectMeta.searchSourceJSON.index",
            INDEX_PATTERN,
        )
        .field(field("name")?, FieldClass::FreeText)
        .field(field("tags")?, FieldClass::Collection)
        .field(field("enabled")?, FieldClass::Flag)
        .field(
            field("ruleTypeId")?,
            FieldClass::enumerated(&[".es-query", ".index-threshold", ".geo-containment"]),
        )
        .field(field("schedule.interval")?, FieldClass::Opaque)
        .field(field("actions")?, FieldClass::Collection)
        .field(field("revision")?, FieldClass::Numeric)
        .field(field("notifyWhen")?, FieldClass::enumerated(NOTIFY_WHEN))
        .field(field("artifacts")?, FieldClass::Opaque)
        .model_version(
            ModelVersion::new(2u32)
                .with_change(ModelChange::backfill_defaults(vec![("revision".to_string(), json!(0))])),
        )
        .model_version(ModelVersion::new(3u32).with_change(ModelChange::FieldRename {
            from: FieldPath::single("notify_when"),
            to: FieldPath::single("notifyWhen"),
        }))
        .model_version(ModelVersion::new(4u32).with_change(ModelChange::DataRemoval {
            fields: vec![FieldPath::single("legacyId")],
        }))
        .model_version(
            ModelVersion::new(5u32)
                .with_change(ModelChange::MappingsAddition {
                    fields: vec![FieldPath::single("artifacts")],
                })
                .with_forward_compatibility(schema(json!({
                    "type": "object",
                    "properties": properties.clone()
                }))?)
                .with_create(schema(json!({
                    "type": "object",
                    "properties": properties,
                    "required": ["name"]
                }))?),
        )
        .build()?)
}
