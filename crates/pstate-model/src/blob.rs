//! State blobs
//!
//! A [`StateBlob`] is the opaque, JSON-shaped configuration of one UI entity,
//! tagged with the `type` discriminator naming its kind.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::path::FieldPath;

/// Key holding the kind discriminator in the flat JSON form
pub const TYPE_KEY: &str = "type";

/// Versioned, typed, serializable state of one UI entity
///
/// The discriminator is kept apart from the other fields so that no field
/// operation can change it.
#[derive(Debug, Clone, PartialEq)]
pub struct StateBlob {
    kind: String,
    fields: Map<String, Value>,
}

impl StateBlob {
    /// Create an empty blob of the given kind
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Create from a kind and its attribute map
    ///
    /// A stray `type` key inside `fields` is dropped.
    #[must_use]
    pub fn from_parts(kind: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove(TYPE_KEY);
        Self {
            kind: kind.into(),
            fields,
        }
    }

    /// Build from the flat JSON form `{ "type": ..., ...fields }`
    ///
    /// # Errors
    /// Returns error if the value is not an object or has no string `type`
    pub fn from_value(value: Value) -> Result<Self, BlobError> {
        let Value::Object(mut fields) = value else {
            return Err(BlobError::NotAnObject);
        };
        match fields.remove(TYPE_KEY) {
            Some(Value::String(kind)) => Ok(Self { kind, fields }),
            Some(_) => Err(BlobError::InvalidType),
            None => Err(BlobError::MissingType),
        }
    }

    /// Parse from a JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or not a valid blob
    pub fn from_json(json: &str) -> Result<Self, BlobError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// The kind discriminator
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// All fields except the discriminator
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume into the attribute map (no discriminator)
    #[inline]
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Get a top-level field
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a value by field path
    #[inline]
    #[must_use]
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.fields)
    }

    /// Check whether a path holds a value
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get_path(path).is_some()
    }

    /// Set a value by field path, creating intermediate objects
    #[inline]
    pub fn set_path(&mut self, path: &FieldPath, value: Value) {
        path.set(&mut self.fields, value);
    }

    /// Remove a value by field path
    #[inline]
    pub fn remove_path(&mut self, path: &FieldPath) -> Option<Value> {
        path.remove(&mut self.fields)
    }

    /// Set a top-level field, returning the updated blob
    ///
    /// Writing the discriminator key is ignored.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key != TYPE_KEY {
            self.fields.insert(key, value);
        }
        self
    }

    /// Flat JSON form including the discriminator
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert(TYPE_KEY.to_string(), Value::String(self.kind.clone()));
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    /// Attribute object without the discriminator
    #[inline]
    #[must_use]
    pub fn attributes_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Get canonical JSON string
    #[inline]
    #[must_use]
    pub fn to_canonical_json(&self) -> String {
        canonical_json(&self.to_value())
    }
}

impl TryFrom<Value> for StateBlob {
    type Error = BlobError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<StateBlob> for Value {
    fn from(blob: StateBlob) -> Self {
        blob.to_value()
    }
}

impl Serialize for StateBlob {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StateBlob {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Errors when building a blob from JSON
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("state blob must be a JSON object")]
    NotAnObject,

    #[error("state blob has no '{TYPE_KEY}' discriminator")]
    MissingType,

    #[error("state blob '{TYPE_KEY}' discriminator must be a string")]
    InvalidType,
}

/// Generate canonical JSON (sorted keys, escaped strings)
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();

            let mut parts = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(val) = map.get(key) {
                    parts.push(format!("{}:{}", Value::String(key.clone()), canonical_json(val)));
                }
            }
            format!("{{{}}}", parts.join(","))
        }
        Value::Array(arr) => {
            let parts: Vec<_> = arr.iter().map(canonical_json).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}
