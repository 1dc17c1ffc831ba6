//! Save/load service
//!
//! Wires the protocol to a [`SavedObjectStore`]:
//! - save: validate, extract references, write at the latest version
//! - load: read, migrate or prune to the latest version, inject references
//! - usage: reduce every stored record of a kind

use pstate_migrations::ValidationMode;
use pstate_model::{ContentHash, SavedObject, SchemaVersion, StateBlob};
use pstate_references::ProtocolWarning;
use pstate_telemetry::{TelemetryReducer, UsageCollector, UsageReport};

use crate::config::ProtocolConfig;
use crate::error::{LoadError, SaveError};
use crate::kind::KindDefinition;
use crate::registry::KindRegistry;
use crate::store::{RecordDraft, SavedObjectStore, StoreError};

/// Result of a successful save
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    /// The record as written
    pub record: SavedObject,
    /// What extraction tolerated
    pub warnings: Vec<ProtocolWarning>,
}

/// Result of a successful load
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    /// Usable state with references injected
    pub state: StateBlob,
    /// Version `state` is now shaped for
    pub schema_version: SchemaVersion,
    /// Version the record was stored at
    pub stored_version: SchemaVersion,
    /// Concurrency token of the stored record
    pub version: Option<ContentHash>,
    /// What injection tolerated
    pub warnings: Vec<ProtocolWarning>,
}

impl Loaded {
    /// Whether the stored record was at an older version
    #[inline]
    #[must_use]
    pub fn was_migrated(&self) -> bool {
        self.stored_version < self.schema_version
    }
}

/// Persistable state service over a store
#[derive(Debug)]
pub struct PersistableStateService<S> {
    registry: KindRegistry,
    config: ProtocolConfig,
    store: S,
}

impl<S: SavedObjectStore> PersistableStateService<S> {
    /// Create a service
    #[must_use]
    pub fn new(registry: KindRegistry, config: ProtocolConfig, store: S) -> Self {
        Self {
            registry,
            config,
            store,
        }
    }

    /// The kind registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// The backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save a new record
    ///
    /// # Errors
    /// Returns error if the state fails the kind's `create` schema or the
    /// id is taken
    pub fn create(&self, id: Option<&str>, state: StateBlob) -> Result<Saved, SaveError> {
        let (draft, warnings) = self.prepare(state)?;
        let record = self.store.create(id, draft)?;
        tracing::info!(kind = %record.kind, id = %record.id, version = %record.schema_version, "created saved object");
        Ok(Saved { record, warnings })
    }

    /// Write `state` under `id`, creating the record or overwriting it
    ///
    /// # Errors
    /// Returns error if the state fails the kind's `create` schema or the
    /// store refuses the write
    pub fn save(&self, id: &str, state: StateBlob) -> Result<Saved, SaveError> {
        match self.store.get(state.kind(), id) {
            Ok(_) => self.update(id, state, None),
            Err(StoreError::NotFound { .. }) => match self.create(Some(id), state.clone()) {
                // Another writer created it first; overwrite.
                Err(SaveError::Store(StoreError::Conflict { .. })) => self.update(id, state, None),
                result => result,
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Replace an existing record
    ///
    /// # Errors
    /// Returns error if the state fails validation, the record is missing,
    /// or `expected_version` no longer matches
    pub fn update(
        &self,
        id: &str,
        state: StateBlob,
        expected_version: Option<ContentHash>,
    ) -> Result<Saved, SaveError> {
        let (draft, warnings) = self.prepare(state)?;
        let record = self.store.update(id, draft, expected_version)?;
        tracing::info!(kind = %record.kind, id = %record.id, version = %record.schema_version, "updated saved object");
        Ok(Saved { record, warnings })
    }

    fn prepare(&self, state: StateBlob) -> Result<(RecordDraft, Vec<ProtocolWarning>), SaveError> {
        let definition = self.registry.get(state.kind());
        if let Some(definition) = definition {
            definition
                .validate_for_create(&state)
                .map_err(|violation| SaveError::Validation {
                    kind: state.kind().to_string(),
                    violation,
                })?;
        }

        let extracted = self.registry.extractor(&self.config).extract(state);
        let schema_version = definition.map_or(SchemaVersion::INITIAL, KindDefinition::latest_version);

        Ok((
            RecordDraft {
                state: extracted.state,
                references: extracted.references,
                schema_version,
            },
            extracted.warnings,
        ))
    }

    /// Load a record as usable state
    ///
    /// # Errors
    /// Returns error if the record is missing or cannot be brought to the
    /// current version; [`LoadError::user_message`] is what end users see
    pub fn load(&self, kind: &str, id: &str) -> Result<Loaded, LoadError> {
        let record = self.store.get(kind, id)?;
        self.load_record(&record).map_err(|err| {
            tracing::warn!(kind, id, error = %err, "saved object could not be loaded");
            err
        })
    }

    /// Bring an already-read record to usable state
    ///
    /// # Errors
    /// Same as [`Self::load`], minus storage errors
    pub fn load_record(&self, record: &SavedObject) -> Result<Loaded, LoadError> {
        let stored_version = record.schema_version;
        let (state, schema_version) = self.upgrade(record.state(), stored_version)?;
        let injected = self
            .registry
            .injector(&self.config)
            .inject_with_report(state, &record.references);

        tracing::info!(
            kind = %record.kind,
            id = %record.id,
            from = %stored_version,
            to = %schema_version,
            "loaded saved object"
        );

        Ok(Loaded {
            state: injected.state,
            schema_version,
            stored_version,
            version: record.version,
            warnings: injected.warnings,
        })
    }

    fn upgrade(
        &self,
        state: StateBlob,
        stored: SchemaVersion,
    ) -> Result<(StateBlob, SchemaVersion), LoadError> {
        let Some(definition) = self.registry.get(state.kind()) else {
            return Ok((state, stored));
        };
        let latest = definition.latest_version();

        if stored <= latest {
            return Ok(self.registry.migrator(&self.config).migrate_to_latest(state, stored)?);
        }

        // Written by a newer version: read through the latest tolerant shape.
        let state = if self.config.store.drop_unknown_fields_on_read {
            definition.prune_for_read(state)
        } else {
            state
        };
        if self.config.migrations.validate_boundaries {
            definition
                .validate(&state, latest, ValidationMode::ForwardCompatibility)
                .map_err(|violation| LoadError::Incompatible {
                    kind: state.kind().to_string(),
                    written: stored,
                    latest,
                    violation,
                })?;
        }
        Ok((state, latest))
    }

    /// Aggregate usage over every stored record of a kind
    ///
    /// Records are reduced at the latest version when they can be brought
    /// there; otherwise their stored state is reduced as is.
    #[must_use]
    pub fn collect_usage(&self, kind: &str) -> UsageReport {
        let reducer = self.registry.reducer(&self.config);
        let mut collector = UsageCollector::new();
        self.collect_kind(&reducer, &mut collector, kind);
        collector.into_report()
    }

    /// Aggregate usage over every registered kind
    #[must_use]
    pub fn collect_all_usage(&self) -> UsageReport {
        let reducer = self.registry.reducer(&self.config);
        let mut collector = UsageCollector::new();
        for kind in self.registry.names() {
            self.collect_kind(&reducer, &mut collector, kind);
        }
        collector.into_report()
    }

    fn collect_kind(&self, reducer: &TelemetryReducer<'_>, collector: &mut UsageCollector, kind: &str) {
        for record in self.store.find(kind) {
            let state = match self.upgrade(record.state(), record.schema_version) {
                Ok((state, _)) => state,
                Err(err) => {
                    tracing::warn!(kind, id = %record.id, error = %err, "reducing stored state of unloadable record");
                    record.state()
                }
            };
            collector.add(&reducer.reduce(&state));
        }
    }
}
