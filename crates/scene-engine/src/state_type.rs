//! State types and structural compatibility
//!
//! A `StateType` describes the named fields a value carries. Two types are
//! compatible when the consumer's required field names are a subset of the
//! producer's field names; the type names themselves never take part in the
//! check, so components can add extra fields without breaking consumers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of value held by a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Accepts any value
    Any,
    /// Boolean value
    Boolean,
    /// Numeric value
    Number,
    /// Text string
    String,
    /// Ordered sequence (also used for sets)
    List,
    /// Keyed collection with dynamic keys
    Map,
    /// Nested structured value
    Object,
}

impl FieldType {
    /// Infer the field type of a JSON value
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => FieldType::Any,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
            Value::Array(_) => FieldType::List,
            Value::Object(_) => FieldType::Object,
        }
    }
}

/// Named-field shape of a state type
pub type Shape = BTreeMap<String, FieldType>;

/// Describes a value's named-field shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateType {
    /// Human-readable name (informational only)
    pub name: String,
    /// Field names and their types
    pub shape: Shape,
}

impl StateType {
    /// Create a state type with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: Shape::new(),
        }
    }

    /// Add a field to the shape
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.shape.insert(name.into(), field_type);
        self
    }

    /// Infer a state type from the top-level fields of a JSON object
    ///
    /// Non-object values produce an empty shape.
    pub fn of_value(name: impl Into<String>, value: &Value) -> Self {
        let shape = value
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), FieldType::of_value(v)))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: name.into(),
            shape,
        }
    }

    /// Iterate over field names in sorted order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.shape.keys().map(|k| k.as_str())
    }

    /// Check whether this type declares a field
    pub fn has_field(&self, name: &str) -> bool {
        self.shape.contains_key(name)
    }

    /// Required field names of `self` that `produced` does not provide
    pub fn missing_fields(&self, produced: &StateType) -> Vec<String> {
        self.shape
            .keys()
            .filter(|name| !produced.shape.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Whether a producer of type `produced` satisfies this (consumer) type
    pub fn is_satisfied_by(&self, produced: &StateType) -> bool {
        self.shape
            .keys()
            .all(|name| produced.shape.contains_key(name))
    }

    /// Required field names absent from a concrete value
    ///
    /// A non-object value is missing every required field.
    pub fn missing_in_value(&self, value: &Value) -> Vec<String> {
        match value.as_object() {
            Some(fields) => self
                .shape
                .keys()
                .filter(|name| !fields.contains_key(*name))
                .cloned()
                .collect(),
            None => self.shape.keys().cloned().collect(),
        }
    }
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.field_names().collect();
        write!(f, "{} {{{}}}", self.name, fields.join(", "))
    }
}
