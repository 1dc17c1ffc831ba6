//! Subcommand implementations
//!
//! Each command returns the JSON document to print on stdout.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use pstate_core::{InMemoryStore, KindRegistry, PersistableStateService, ProtocolConfig, LOAD_FAILURE_MESSAGE};
use pstate_model::{SavedObject, SchemaVersion, StateBlob};
use pstate_telemetry::UsageCollector;
use serde_json::{json, Value};

use crate::input::read_document;

/// Registry and configuration shared by every command
pub(crate) struct Protocol {
    registry: KindRegistry,
    config: ProtocolConfig,
}

impl Protocol {
    /// Build from an optional TOML config file
    pub(crate) fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ProtocolConfig::from_path(path)?,
            None => ProtocolConfig::default(),
        };
        let registry = KindRegistry::with_builtin_kinds().context("built-in kinds are invalid")?;
        tracing::debug!(kinds = registry.len(), ?config, "protocol ready");
        Ok(Self { registry, config })
    }

    pub(crate) fn extract(&self, path: &Path) -> Result<Value> {
        let state: StateBlob = read_document(path)?;
        let extracted = self.registry.extractor(&self.config).extract(state);
        Ok(json!({
            "state": extracted.state,
            "references": extracted.references,
            "warnings": render_warnings(&extracted.warnings),
        }))
    }

    pub(crate) fn inject(&self, path: &Path) -> Result<Value> {
        let record: SavedObject = read_document(path)?;
        let injected = self
            .registry
            .injector(&self.config)
            .inject(record.state(), &record.references);
        Ok(injected.into())
    }

    /// Migrate, then inject, exactly as a load from storage would
    pub(crate) fn load(&self, path: &Path) -> Result<Value> {
        let record: SavedObject = read_document(path)?;
        let service = PersistableStateService::new(
            self.registry.clone(),
            self.config.clone(),
            InMemoryStore::new(),
        );
        let loaded = service
            .load_record(&record)
            .context(LOAD_FAILURE_MESSAGE)?;
        Ok(json!({
            "state": loaded.state,
            "schemaVersion": loaded.schema_version,
            "migratedFrom": loaded.was_migrated().then_some(loaded.stored_version),
            "warnings": render_warnings(&loaded.warnings),
        }))
    }

    pub(crate) fn migrate(&self, path: &Path, to: Option<u32>) -> Result<Value> {
        let mut record: SavedObject = read_document(path)?;
        let migrator = self.registry.migrator(&self.config);

        let to = match to {
            Some(to) => SchemaVersion::new(to),
            None => migrator
                .latest_version(&record.kind)
                .ok_or_else(|| anyhow!("unrecognized type '{}'; pass --to", record.kind))?,
        };

        let migrated = migrator.migrate(record.state(), record.schema_version, to)?;
        record.attributes = migrated.into_fields();
        record.schema_version = to;
        record.version = None;
        Ok(serde_json::to_value(record)?)
    }

    pub(crate) fn telemetry(&self, paths: &[PathBuf]) -> Result<Value> {
        let reducer = self.registry.reducer(&self.config);
        let mut collector = UsageCollector::new();
        for path in paths {
            let state: StateBlob = read_document(path)?;
            collector.add(&reducer.reduce(&state));
        }
        Ok(serde_json::to_value(collector.into_report())?)
    }

    pub(crate) fn kinds(&self) -> Value {
        self.registry
            .names()
            .into_iter()
            .filter_map(|name| self.registry.get(name))
            .map(|kind| {
                json!({
                    "type": kind.kind(),
                    "latestVersion": kind.latest_version(),
                    "references": kind
                        .classification()
                        .reference_slots()
                        .map(|slot| json!({
                            "path": slot.path.to_string(),
                            "name": slot.name,
                            "type": slot.target_type,
                        }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect()
    }
}

fn render_warnings<W: ToString>(warnings: &[W]) -> Vec<String> {
    warnings.iter().map(ToString::to_string).collect()
}
