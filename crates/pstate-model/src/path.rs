//! Field paths for addressing values inside a state blob
//!
//! Provides [`FieldPath`], a dot-separated path into nested JSON objects.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::blob::TYPE_KEY;

/// Path to a field within a state blob
///
/// # Examples
/// - `dataViewId` addresses a top-level field
/// - `params.searchConfiguration.index` addresses a nested field
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create path from a single top-level field name
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First segment, i.e. the top-level field this path lives under
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Check if paths overlap (one is prefix of other)
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Read the value at this path
    ///
    /// Missing intermediates and non-object intermediates yield `None`.
    #[must_use]
    pub fn get<'a>(&self, fields: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let mut current = fields.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Remove the value at this path, leaving intermediate objects in place
    pub fn remove(&self, fields: &mut Map<String, Value>) -> Option<Value> {
        let (last, parents) = self.0.split_last()?;
        let mut current = fields;
        for segment in parents {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        current.remove(last)
    }

    /// Write a value at this path
    ///
    /// Creates intermediate objects as needed; a non-object intermediate is
    /// replaced by an object.
    pub fn set(&self, fields: &mut Map<String, Value>, value: Value) {
        let Some((last, parents)) = self.0.split_last() else {
            return;
        };

        let mut current = fields;
        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(map) = slot else {
                return;
            };
            current = map;
        }
        current.insert(last.clone(), value);
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    /// Parse a dotted path
    ///
    /// The discriminator key can never be addressed, so `type` as a first
    /// segment is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(s.to_string()));
        }
        if segments[0] == TYPE_KEY {
            return Err(PathError::Discriminator);
        }
        Ok(Self(segments))
    }
}

/// Errors when parsing field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty field path")]
    Empty,

    #[error("empty segment in field path: '{0}'")]
    EmptySegment(String),

    #[error("the '{TYPE_KEY}' discriminator cannot be addressed by a field path")]
    Discriminator,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parse_dotted() {
        let path: FieldPath = "params.searchConfiguration.index".parse().unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.root(), Some("params"));
        assert_eq!(path.to_string(), "params.searchConfiguration.index");
    }

    #[test]
    fn parse_rejects_bad_paths() {
        assert_eq!("".parse::<FieldPath>(), Err(PathError::Empty));
        assert!(matches!(
            "a..b".parse::<FieldPath>(),
            Err(PathError::EmptySegment(_))
        ));
        assert_eq!("type".parse::<FieldPath>(), Err(PathError::Discriminator));
        assert_eq!("type.x".parse::<FieldPath>(), Err(PathError::Discriminator));
    }

    #[test]
    fn get_nested_and_missing() {
        let map = fields(json!({"params": {"index": "dv"}, "flat": 1}));
        let nested: FieldPath = "params.index".parse().unwrap();
        let missing: FieldPath = "params.other".parse().unwrap();
        let through_scalar: FieldPath = "flat.x".parse().unwrap();

        assert_eq!(nested.get(&map), Some(&json!("dv")));
        assert_eq!(missing.get(&map), None);
        assert_eq!(through_scalar.get(&map), None);
    }

    #[test]
    fn remove_keeps_parents() {
        let mut map = fields(json!({"params": {"index": "dv"}}));
        let path: FieldPath = "params.index".parse().unwrap();

        assert_eq!(path.remove(&mut map), Some(json!("dv")));
        assert_eq!(Value::Object(map), json!({"params": {}}));
    }

    #[test]
    fn set_creates_intermediates() {
        let mut map = Map::new();
        let path: FieldPath = "params.searchConfiguration.index".parse().unwrap();
        path.set(&mut map, json!("dv-9"));

        assert_eq!(
            Value::Object(map),
            json!({"params": {"searchConfiguration": {"index": "dv-9"}}})
        );
    }

    #[test]
    fn set_replaces_scalar_intermediate() {
        let mut map = fields(json!({"params": 3}));
        let path: FieldPath = "params.index".parse().unwrap();
        path.set(&mut map, json!("x"));
        assert_eq!(Value::Object(map), json!({"params": {"index": "x"}}));
    }

    #[test]
    fn overlap_detection() {
        let a: FieldPath = "params".parse().unwrap();
        let b: FieldPath = "params.index".parse().unwrap();
        let c = FieldPath::single("title");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }
}
