//! Dashboard controls

use pstate_migrations::{ModelChange, ModelVersion};
use pstate_model::FieldClass;
use serde_json::json;

use super::{field, schema, INDEX_PATTERN};
use crate::kind::KindDefinition;
use crate::registry::RegistryError;

/// Options list control
pub const OPTIONS_LIST: &str = "options-list";
/// Range slider control
pub const RANGE_SLIDER: &str = "range-slider";
/// Time slider control
pub const TIME_SLIDER: &str = "time-slider";

const SEARCH_TECHNIQUES: &[&str] = &["prefix", "wildcard", "exact"];

pub(super) fn options_list() -> Result<KindDefinition, RegistryError> {
    let v2_shape = json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "fieldName": {"type": "string"},
            "selectedOptions": {"type": "array"},
            "singleSelect": {"type": "boolean"},
            "exclude": {"type": "boolean"},
            "existsSelected": {"type": "boolean"},
            "runPastTimeout": {"type": "boolean"},
            "searchTechnique": {"type": "string", "enum": SEARCH_TECHNIQUES},
            "dataViewId": {"type": ["string", "null"]}
        }
    });

    Ok(KindDefinition::builder(OPTIONS_LIST)
        .reference(field("dataViewId")?, "optionsListDataView", INDEX_PATTERN)
        .field(field("title")?, FieldClass::FreeText)
        .field(field("fieldName")?, FieldClass::FreeText)
        .field(field("selectedOptions")?, FieldClass::Collection)
        .field(field("singleSelect")?, FieldClass::Flag)
        .field(field("exclude")?, FieldClass::Flag)
        .field(field("existsSelected")?, FieldClass::Flag)
        .field(field("runPastTimeout")?, FieldClass::Flag)
        .field(field("searchTechnique")?, FieldClass::enumerated(SEARCH_TECHNIQUES))
        .model_version(
            ModelVersion::new(2u32)
                .with_change(ModelChange::backfill_defaults(vec![(
                    "searchTechnique".to_string(),
                    json!("prefix"),
                )]))
                .with_forward_compatibility(schema(v2_shape.clone())?)
                .with_create(schema(v2_shape)?),
        )
        .build()?)
}

pub(super) fn range_slider() -> Result<KindDefinition, RegistryError> {
    Ok(KindDefinition::builder(RANGE_SLIDER)
        .reference(field("dataViewId")?, "rangeSliderDataView", INDEX_PATTERN)
        .field(field("title")?, FieldClass::FreeText)
        .field(field("fieldName")?, FieldClass::FreeText)
        .field(field("value")?, FieldClass::Opaque)
        .field(field("step")?, FieldClass::Numeric)
        .build()?)
}

pub(super) fn time_slider() -> Result<KindDefinition, RegistryError> {
    Ok(KindDefinition::builder(TIME_SLIDER)
        .field(field("title")?, FieldClass::FreeText)
        .field(field("timesliceStartAsPercentageOfTimeRange")?, FieldClass::Numeric)
        .field(field("timesliceEndAsPercentageOfTimeRange")?, FieldClass::Numeric)
        .field(field("isAnchored")?, FieldClass::Flag)
        .build()?)
}
