//! # Schema Model
//!
//! Typed view over a JSON-Schema-like description. Only the keywords the
//! normalizer consults are lifted into fields: `type`, `properties`,
//! `required`, `default`, `items`, `allOf` and `additionalProperties`.
//! Everything else (`minLength`, `maxItems`, `format`, `description`, ...)
//! stays in the retained raw value and is consumed by the constraint pass
//! in [`crate::validate`].
//!
//! ## Leniency
//!
//! [`Schema::from_value`] never fails. A keyword with an unexpected shape is
//! ignored rather than reported, so a malformed schema degrades into an
//! emptier one. This keeps normalization total: a request can always be
//! normalized, whatever the schema tables contain.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The normalization case selected by a schema's `type` keyword.
///
/// Only `object` and `array` get structural handling. Every other type name,
/// including ones this crate has never heard of, lands in [`SchemaType::Other`]
/// and is handled as a scalar leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaType {
    /// `type: object`, also the implied type when `type` is absent.
    Object,
    /// `type: array`.
    Array,
    /// Any other type name (`string`, `integer`, `boolean`, ...).
    Other(String),
}

impl SchemaType {
    /// Classify a type name.
    pub fn parse(name: &str) -> Self {
        match name {
            "object" => Self::Object,
            "array" => Self::Array,
            other => Self::Other(other.to_string()),
        }
    }

    /// The type name as written in the schema.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handling of data keys not consumed by `properties`.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// `false`, absent, or an empty schema: extra keys are dropped.
    Dropped,
    /// `true`: extra keys are copied through unchanged.
    Passthrough,
    /// A schema every extra key's value is normalized against.
    Schema(Box<Schema>),
}

/// A parsed schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaType,
    properties: BTreeMap<String, Schema>,
    required: Vec<String>,
    default: Option<Value>,
    items: Option<Box<Schema>>,
    all_of: Vec<Schema>,
    additional_properties: AdditionalProperties,
    raw: Value,
}

impl Schema {
    /// Parse a schema value. Never fails; see the module docs.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::empty_with_raw(value.clone());
        };

        let kind = match obj.get("type") {
            None => SchemaType::Object,
            Some(Value::String(name)) => SchemaType::parse(name),
            // Union types (`["string", "null"]`) are not modeled; route them
            // to the scalar case under their literal spelling.
            Some(other) => SchemaType::Other(other.to_string()),
        };

        let properties = obj
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, sub)| (name.clone(), Schema::from_value(sub)))
                    .collect()
            })
            .unwrap_or_default();

        // Draft 3 put `required: true|false` on the property itself. Only the
        // Draft 4 array form names required properties.
        let required = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let items = obj
            .get("items")
            .filter(|v| v.is_object())
            .map(|v| Box::new(Schema::from_value(v)));

        let all_of = obj
            .get("allOf")
            .and_then(Value::as_array)
            .map(|subs| subs.iter().map(Schema::from_value).collect())
            .unwrap_or_default();

        let additional_properties = match obj.get("additionalProperties") {
            Some(Value::Bool(true)) => AdditionalProperties::Passthrough,
            Some(v) if v.as_object().is_some_and(|m| !m.is_empty()) => {
                AdditionalProperties::Schema(Box::new(Schema::from_value(v)))
            }
            _ => AdditionalProperties::Dropped,
        };

        Self {
            kind,
            properties,
            required,
            default: obj.get("default").cloned(),
            items,
            all_of,
            additional_properties,
            raw: value.clone(),
        }
    }

    /// A schema with no keywords at all.
    pub fn empty() -> Self {
        Self::empty_with_raw(Value::Object(Map::new()))
    }

    fn empty_with_raw(raw: Value) -> Self {
        Self {
            kind: SchemaType::Object,
            properties: BTreeMap::new(),
            required: Vec::new(),
            default: None,
            items: None,
            all_of: Vec::new(),
            additional_properties: AdditionalProperties::Dropped,
            raw,
        }
    }

    /// True when the schema carries no keywords (or was not an object).
    /// Normalizing against an empty schema yields `null`.
    pub fn is_empty(&self) -> bool {
        self.raw.as_object().map_or(true, Map::is_empty)
    }

    pub fn kind(&self) -> &SchemaType {
        &self.kind
    }

    pub fn properties(&self) -> &BTreeMap<String, Schema> {
        &self.properties
    }

    /// Look up a declared property's schema.
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.get(name)
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// The schema's `default`. An explicit `"default": null` is `Some(Null)`.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn items(&self) -> Option<&Schema> {
        self.items.as_deref()
    }

    pub fn all_of(&self) -> &[Schema] {
        &self.all_of
    }

    pub fn additional_properties(&self) -> &AdditionalProperties {
        &self.additional_properties
    }

    /// The schema exactly as it was written, including keywords the
    /// normalizer ignores.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Schema {
    fn from(value: Value) -> Self {
        Schema::from_value(&value)
    }
}

impl From<&Value> for Schema {
    fn from(value: &Value) -> Self {
        Schema::from_value(value)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Schema::from_value(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_type_means_object() {
        let schema = Schema::from_value(&json!({"properties": {}}));
        assert_eq!(schema.kind(), &SchemaType::Object);
    }

    #[test]
    fn unknown_type_routes_to_other() {
        let schema = Schema::from_value(&json!({"type": "uuid"}));
        assert_eq!(schema.kind(), &SchemaType::Other("uuid".to_string()));
        assert_eq!(schema.kind().as_str(), "uuid");
    }

    #[test]
    fn union_type_is_other() {
        let schema = Schema::from_value(&json!({"type": ["string", "null"]}));
        assert!(matches!(schema.kind(), SchemaType::Other(_)));
    }

    #[test]
    fn explicit_null_default_is_kept() {
        let schema = Schema::from_value(&json!({"type": "string", "default": null}));
        assert_eq!(schema.default_value(), Some(&Value::Null));

        let schema = Schema::from_value(&json!({"type": "string"}));
        assert_eq!(schema.default_value(), None);
    }

    #[test]
    fn draft3_boolean_required_is_ignored() {
        let schema = Schema::from_value(&json!({
            "required": [],
            "properties": {"page": {"type": "integer", "required": false}}
        }));
        let page = schema.property("page").unwrap();
        assert!(page.required().is_empty());
        assert!(!schema.is_required("page"));
    }

    #[test]
    fn malformed_keywords_degrade_to_empty() {
        let schema = Schema::from_value(&json!({
            "type": "array",
            "items": "not-a-schema",
            "allOf": {"nope": true},
            "properties": [1, 2],
            "required": "content"
        }));
        assert!(schema.items().is_none());
        assert!(schema.all_of().is_empty());
        assert!(schema.properties().is_empty());
        assert!(schema.required().is_empty());
    }

    #[test]
    fn additional_properties_variants() {
        let dropped = Schema::from_value(&json!({"additionalProperties": false}));
        assert_eq!(dropped.additional_properties(), &AdditionalProperties::Dropped);

        let empty = Schema::from_value(&json!({"additionalProperties": {}}));
        assert_eq!(empty.additional_properties(), &AdditionalProperties::Dropped);

        let any = Schema::from_value(&json!({"additionalProperties": true}));
        assert_eq!(any.additional_properties(), &AdditionalProperties::Passthrough);

        let typed = Schema::from_value(&json!({"additionalProperties": {"type": "string"}}));
        assert!(matches!(
            typed.additional_properties(),
            AdditionalProperties::Schema(_)
        ));
    }

    #[test]
    fn emptiness() {
        assert!(Schema::empty().is_empty());
        assert!(Schema::from_value(&Value::Null).is_empty());
        assert!(!Schema::from_value(&json!({"description": "x"})).is_empty());
    }

    #[test]
    fn serializes_back_to_raw() {
        let raw = json!({"type": "string", "minLength": 2, "maxLength": 1024});
        let schema = Schema::from_value(&raw);
        assert_eq!(serde_json::to_value(&schema).unwrap(), raw);

        let parsed: Schema = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed, schema);
    }
}
