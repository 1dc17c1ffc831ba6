//! Protocol configuration
//!
//! Built once at startup and passed by reference; there is no global
//! instance. Every section and key is optional in TOML and falls back to
//! its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level protocol configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Migration behaviour
    pub migrations: MigrationSettings,
    /// Reference extraction and injection
    pub references: ReferenceSettings,
    /// Usage telemetry
    pub telemetry: TelemetrySettings,
    /// Save/load behaviour
    pub store: StoreSettings,
}

/// Migration behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Check each step against its `forward_compatibility` schema
    pub validate_boundaries: bool,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            validate_boundaries: true,
        }
    }
}

/// Reference extraction and injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSettings {
    /// Log blobs of unregistered kinds
    pub warn_on_unknown_type: bool,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            warn_on_unknown_type: true,
        }
    }
}

/// Usage telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Count unregistered kinds under `unknown.total`
    pub include_unknown_kinds: bool,
}

/// Save/load behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Drop undeclared top-level fields from records written by newer versions
    pub drop_unknown_fields_on_read: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            drop_unknown_fields_on_read: true,
        }
    }
}

impl ProtocolConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML document
    ///
    /// # Errors
    /// Returns error if the TOML is malformed or a key has the wrong type
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(ConfigError::InvalidToml)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&toml)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// With boundary validation on or off
    #[inline]
    #[must_use]
    pub fn with_validate_boundaries(mut self, validate: bool) -> Self {
        self.migrations.validate_boundaries = validate;
        self
    }

    /// With unknown-type warnings on or off
    #[inline]
    #[must_use]
    pub fn with_warn_on_unknown_type(mut self, warn: bool) -> Self {
        self.references.warn_on_unknown_type = warn;
        self
    }

    /// With unknown kinds counted in telemetry
    #[inline]
    #[must_use]
    pub fn with_include_unknown_kinds(mut self, include: bool) -> Self {
        self.telemetry.include_unknown_kinds = include;
        self
    }

    /// With undeclared fields kept or dropped on read
    #[inline]
    #[must_use]
    pub fn with_drop_unknown_fields_on_read(mut self, drop: bool) -> Self {
        self.store.drop_unknown_fields_on_read = drop;
        self
    }
}

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid configuration
    #[error("invalid config: {0}")]
    InvalidToml(#[source] toml::de::Error),

    /// The configuration could not be rendered
    #[error("cannot serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ProtocolConfig::default();
        assert!(config.migrations.validate_boundaries);
        assert!(config.references.warn_on_unknown_type);
        assert!(!config.telemetry.include_unknown_kinds);
        assert!(config.store.drop_unknown_fields_on_read);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ProtocolConfig::from_toml_str("").unwrap(), ProtocolConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let config = ProtocolConfig::from_toml_str(
            r"
            [telemetry]
            include_unknown_kinds = true
            ",
        )
        .unwrap();
        assert!(config.telemetry.include_unknown_kinds);
        assert!(config.migrations.validate_boundaries);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let result = ProtocolConfig::from_toml_str("[migrations]\nvalidate_boundaries = \"yes\"");
        assert!(matches!(result, Err(ConfigError::InvalidToml(_))));
    }

    #[test]
    fn builders_and_round_trip() {
        let config = ProtocolConfig::new()
            .with_validate_boundaries(false)
            .with_warn_on_unknown_type(false)
            .with_include_unknown_kinds(true)
            .with_drop_unknown_fields_on_read(false);
        let toml = config.to_toml_string().unwrap();
        assert_eq!(ProtocolConfig::from_toml_str(&toml).unwrap(), config);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\ndrop_unknown_fields_on_read = false").unwrap();
        let config = ProtocolConfig::from_path(file.path()).unwrap();
        assert!(!config.store.drop_unknown_fields_on_read);

        let missing = ProtocolConfig::from_path("/nonexistent/pstate.toml");
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
