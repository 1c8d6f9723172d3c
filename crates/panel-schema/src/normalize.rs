//! # Default Normalization
//!
//! Walks a [`Schema`] together with candidate data and builds a new value
//! in which every declared property has been filled from the data, from the
//! property's `default`, or (for required properties) from a per-type
//! fallback table.
//!
//! ## Cases
//!
//! The case is picked from the schema's type (absent means `object`):
//!
//! - `object`: per declared property: the normalized data value if the key
//!   is present, else the raw `default`, else for required keys the
//!   type fallback, else nothing. Then `allOf` results are merged under the
//!   direct result, in order, so earlier `allOf` entries take precedence
//!   over later ones. Then `additionalProperties` picks up leftover data
//!   keys.
//! - `array`: each element normalized against `items`; non-array data
//!   yields the raw `default` or `[]`.
//! - anything else: the data unchanged, or the `default` when the data is
//!   `null`.
//!
//! ## Errors
//!
//! The walk never fails. The only reported problem is a required property
//! with nothing to fill it, collected as [`PropertyMissing`]. Shape
//! mismatches between schema and data quietly produce `null`, `[]` or an
//! empty object.
//!
//! Normalization is not validation: `minLength`, `maxItems` and the like
//! are left to [`crate::validate`].

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::accessor::{Accessor, Data};
use crate::schema::{AdditionalProperties, Schema, SchemaType};

/// Error record name for a required property with no value and no default.
pub const PROPERTY_MISSING: &str = "property_missing";

/// A required property that could not be filled.
///
/// Serializes as `{"name": "property_missing", "message": "`key` is required"}`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct PropertyMissing {
    /// Always [`PROPERTY_MISSING`].
    pub name: &'static str,
    /// Human-readable message naming the property.
    pub message: String,
    /// The missing property's key.
    #[serde(skip)]
    pub property: String,
}

impl PropertyMissing {
    pub fn new(property: impl Into<String>) -> Self {
        let property = property.into();
        Self {
            name: PROPERTY_MISSING,
            message: format!("`{property}` is required"),
            property,
        }
    }
}

/// Fallback literals for required properties, keyed by type name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefaults {
    defaults: BTreeMap<String, Value>,
}

impl TypeDefaults {
    /// An empty table: every missing required property is an error.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed table used by [`merge_default`].
    pub fn standard() -> &'static TypeDefaults {
        static STANDARD: OnceLock<TypeDefaults> = OnceLock::new();
        STANDARD.get_or_init(|| {
            TypeDefaults::new()
                .with("integer", json!(9573))
                .with("string", json!("something"))
                .with("object", json!({}))
                .with("array", json!([]))
                .with("boolean", json!(false))
        })
    }

    /// Add or replace the fallback for a type name.
    pub fn with(mut self, type_name: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(type_name.into(), value);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&Value> {
        self.defaults.get(type_name)
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for TypeDefaults {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            defaults: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Result of a normalization walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized {
    /// The defaulted value.
    pub value: Value,
    /// Required properties that could not be filled, in walk order.
    pub errors: Vec<PropertyMissing>,
}

impl Normalized {
    /// True when no required property was missing.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_parts(self) -> (Value, Vec<PropertyMissing>) {
        (self.value, self.errors)
    }
}

/// Normalize `data` against `schema`.
///
/// `required_defaults` is consulted only for required properties that are
/// absent from the data and have no `default` of their own. With `None`,
/// every such property is reported as [`PropertyMissing`] and omitted.
///
/// An empty schema yields `null`.
pub fn normalize<'a>(
    schema: &Schema,
    data: impl Into<Data<'a>>,
    required_defaults: Option<&TypeDefaults>,
) -> Normalized {
    let empty = TypeDefaults::new();
    let mut walker = Walker {
        required_defaults: required_defaults.unwrap_or(&empty),
        errors: Vec::new(),
    };
    let value = walker.normalize(schema, data.into());
    Normalized {
        value,
        errors: walker.errors,
    }
}

/// Normalize with the [standard](TypeDefaults::standard) fallback table and
/// return only the value.
pub fn merge_default<'a>(schema: &Schema, value: impl Into<Data<'a>>) -> Value {
    merge_default_with_errors(schema, value).value
}

/// Normalize with the standard fallback table, keeping the error list.
pub fn merge_default_with_errors<'a>(schema: &Schema, value: impl Into<Data<'a>>) -> Normalized {
    normalize(schema, value, Some(TypeDefaults::standard()))
}

struct Walker<'t> {
    required_defaults: &'t TypeDefaults,
    errors: Vec<PropertyMissing>,
}

impl Walker<'_> {
    fn normalize(&mut self, schema: &Schema, data: Data<'_>) -> Value {
        if schema.is_empty() {
            return Value::Null;
        }
        match schema.kind() {
            SchemaType::Object => self.normalize_object(schema, data),
            SchemaType::Array => self.normalize_array(schema, data),
            SchemaType::Other(_) => normalize_scalar(schema, data),
        }
    }

    fn normalize_object(&mut self, schema: &Schema, data: Data<'_>) -> Value {
        let accessor = Accessor::new(data);
        let mut result = Map::new();

        for (key, property) in schema.properties() {
            if let Some(value) = accessor.get(key) {
                let normalized = self.normalize(property, Data::Json(&value));
                result.insert(key.clone(), normalized);
            } else if let Some(default) = property.default_value() {
                result.insert(key.clone(), default.clone());
            } else if schema.is_required(key) {
                match self.required_defaults.get(property.kind().as_str()) {
                    Some(fallback) => {
                        result.insert(key.clone(), fallback.clone());
                    }
                    None => {
                        tracing::debug!(property = %key, "required property missing");
                        self.errors.push(PropertyMissing::new(key.as_str()));
                    }
                }
            }
        }

        for component in schema.all_of() {
            // A non-object component (e.g. a bare `type: string`) has no
            // keys to contribute.
            if let Value::Object(mut merged) = self.normalize(component, data) {
                merged.extend(result);
                result = merged;
            }
        }

        match schema.additional_properties() {
            AdditionalProperties::Schema(extra) => {
                for key in accessor.keys() {
                    if result.contains_key(&key) {
                        continue;
                    }
                    let raw = accessor.get(&key).unwrap_or_default();
                    let normalized = self.normalize(extra, Data::Json(&raw));
                    result.insert(key, normalized);
                }
            }
            AdditionalProperties::Passthrough => {
                for key in accessor.keys() {
                    if result.contains_key(&key) {
                        continue;
                    }
                    if let Some(raw) = accessor.get(&key) {
                        result.insert(key, raw.into_owned());
                    }
                }
            }
            AdditionalProperties::Dropped => {}
        }

        Value::Object(result)
    }

    fn normalize_array(&mut self, schema: &Schema, data: Data<'_>) -> Value {
        match data {
            Data::Json(Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| match schema.items() {
                        Some(item_schema) => self.normalize(item_schema, Data::Json(item)),
                        None => Value::Null,
                    })
                    .collect(),
            ),
            _ => schema
                .default_value()
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        }
    }
}

fn normalize_scalar(schema: &Schema, data: Data<'_>) -> Value {
    if data.is_null() {
        schema.default_value().cloned().unwrap_or(Value::Null)
    } else {
        data.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::Attributes;
    use crate::definitions::{content_schema, create_question_schema};

    fn schema(v: Value) -> Schema {
        Schema::from_value(&v)
    }

    #[test]
    fn required_without_default_reports_missing() {
        let s = schema(json!({
            "type": "object",
            "required": ["k"],
            "properties": {"k": {"type": "widget"}}
        }));
        let out = normalize(&s, &json!({}), None);
        assert_eq!(out.value, json!({}));
        assert_eq!(out.errors, vec![PropertyMissing::new("k")]);
        assert_eq!(out.errors[0].property, "k");
        assert_eq!(out.errors[0].message, "`k` is required");

        // A fallback table without an entry for the type changes nothing.
        let out = normalize(&s, &json!({}), Some(TypeDefaults::standard()));
        assert_eq!(out.value, json!({}));
        assert_eq!(out.errors.len(), 1);
    }

    #[test]
    fn create_question_with_content_only() {
        let out = normalize(create_question_schema(), &json!({"content": "hello"}), None);
        assert_eq!(out.value, json!({"content": "hello"}));
        assert!(out.is_complete());
    }

    #[test]
    fn create_question_empty_raw_vs_merge_default() {
        let out = normalize(create_question_schema(), &json!({}), None);
        assert_eq!(out.value, json!({}));
        assert_eq!(
            serde_json::to_value(&out.errors).unwrap(),
            json!([{"name": "property_missing", "message": "`content` is required"}])
        );

        let merged = merge_default_with_errors(create_question_schema(), &json!({}));
        assert_eq!(merged.value, json!({"content": "something"}));
        assert!(merged.errors.is_empty());
    }

    #[test]
    fn merge_default_on_optional_string_is_null() {
        assert_eq!(merge_default(content_schema(), &Value::Null), Value::Null);
    }

    #[test]
    fn merge_default_on_required_string_is_placeholder() {
        let wrapper = schema(json!({
            "required": ["content"],
            "properties": {"content": content_schema().raw().clone()}
        }));
        assert_eq!(
            merge_default(&wrapper, &json!({})),
            json!({"content": "something"})
        );
    }

    #[test]
    fn standard_table_contents() {
        let t = TypeDefaults::standard();
        assert_eq!(t.get("integer"), Some(&json!(9573)));
        assert_eq!(t.get("string"), Some(&json!("something")));
        assert_eq!(t.get("object"), Some(&json!({})));
        assert_eq!(t.get("array"), Some(&json!([])));
        assert_eq!(t.get("boolean"), Some(&json!(false)));
        assert_eq!(t.get("number"), None);
    }

    #[test]
    fn array_items_normalized_independently() {
        let s = schema(json!({"type": "array", "items": {"type": "string", "default": "x"}}));
        let out = normalize(&s, &json!(["a", null]), None);
        assert_eq!(out.value, json!(["a", "x"]));
    }

    #[test]
    fn array_fallbacks() {
        let s = schema(json!({"type": "array", "items": {"type": "string"}}));
        assert_eq!(normalize(&s, &Value::Null, None).value, json!([]));
        assert_eq!(normalize(&s, &json!({"a": 1}), None).value, json!([]));
        // Strings are scalars here, not sequences of characters.
        assert_eq!(normalize(&s, &json!("abc"), None).value, json!([]));

        let with_default = schema(json!({"type": "array", "default": ["d"]}));
        assert_eq!(normalize(&with_default, &json!(7), None).value, json!(["d"]));

        // No `items`: every element degrades to null.
        let no_items = schema(json!({"type": "array"}));
        assert_eq!(
            normalize(&no_items, &json!([1, 2]), None).value,
            json!([null, null])
        );
    }

    #[test]
    fn all_of_direct_properties_win() {
        let s = schema(json!({
            "allOf": [{"properties": {"a": {"default": 1}}}],
            "properties": {"a": {"default": 2}}
        }));
        assert_eq!(normalize(&s, &json!({}), None).value, json!({"a": 2}));
    }

    #[test]
    fn all_of_earlier_entries_win_over_later() {
        let s = schema(json!({
            "allOf": [
                {"properties": {"a": {"default": 1}, "b": {"default": 1}}},
                {"properties": {"b": {"default": 2}, "c": {"default": 2}}},
                {"type": "string"}
            ],
            "properties": {"c": {"default": 3}}
        }));
        assert_eq!(
            normalize(&s, &json!({}), None).value,
            json!({"a": 1, "b": 1, "c": 3})
        );
    }

    #[test]
    fn all_of_errors_are_collected() {
        let s = schema(json!({
            "allOf": [{"required": ["id"], "properties": {"id": {"type": "integer"}}}],
            "properties": {"name": {"type": "string"}}
        }));
        let out = normalize(&s, &json!({"name": "n"}), None);
        assert_eq!(out.value, json!({"name": "n"}));
        assert_eq!(out.errors, vec![PropertyMissing::new("id")]);
    }

    #[test]
    fn additional_properties_schema_applies_to_leftovers() {
        let s = schema(json!({
            "properties": {"a": {"type": "integer"}},
            "additionalProperties": {"type": "string", "default": "fill"}
        }));
        let out = normalize(&s, &json!({"a": 1, "b": "x", "c": null}), None);
        assert_eq!(out.value, json!({"a": 1, "b": "x", "c": "fill"}));
    }

    #[test]
    fn additional_properties_false_drops_leftovers() {
        let s = schema(json!({
            "properties": {"a": {"type": "integer"}},
            "additionalProperties": false
        }));
        let out = normalize(&s, &json!({"a": 1, "b": 2}), None);
        assert_eq!(out.value, json!({"a": 1}));
    }

    #[test]
    fn additional_properties_true_passes_through() {
        let s = schema(json!({
            "properties": {"a": {"type": "integer"}},
            "additionalProperties": true
        }));
        let out = normalize(&s, &json!({"a": 1, "b": {"deep": [1]}}), None);
        assert_eq!(out.value, json!({"a": 1, "b": {"deep": [1]}}));
    }

    #[test]
    fn present_null_is_normalized_not_defaulted_at_object_level() {
        // `form_id` present with null goes through the scalar case, which
        // substitutes the property's own default.
        let s = schema(json!({
            "properties": {
                "form_id": {"type": "string", "default": "f0"},
                "note": {"type": "string"}
            }
        }));
        let out = normalize(&s, &json!({"form_id": null, "note": null}), None);
        assert_eq!(out.value, json!({"form_id": "f0", "note": null}));
    }

    #[test]
    fn default_is_used_verbatim() {
        // The default is not itself normalized against the nested schema.
        let s = schema(json!({
            "properties": {
                "meta": {
                    "type": "object",
                    "properties": {"x": {"default": 1}},
                    "default": {"y": 2}
                }
            }
        }));
        assert_eq!(
            normalize(&s, &json!({}), None).value,
            json!({"meta": {"y": 2}})
        );
    }

    #[test]
    fn nested_objects_recurse() {
        let s = schema(json!({
            "properties": {
                "outer": {
                    "type": "object",
                    "required": ["inner"],
                    "properties": {"inner": {"type": "integer"}, "flag": {"type": "boolean", "default": true}}
                }
            }
        }));
        let out = normalize(&s, &json!({"outer": {}}), None);
        assert_eq!(out.value, json!({"outer": {"flag": true}}));
        assert_eq!(out.errors, vec![PropertyMissing::new("inner")]);

        let merged = merge_default(&s, &json!({"outer": {}}));
        assert_eq!(merged, json!({"outer": {"flag": true, "inner": 9573}}));
    }

    #[test]
    fn required_missing_type_uses_object_fallback() {
        let s = schema(json!({"required": ["cfg"], "properties": {"cfg": {"properties": {}}}}));
        assert_eq!(merge_default(&s, &json!({})), json!({"cfg": {}}));
    }

    #[test]
    fn empty_schema_yields_null() {
        assert_eq!(normalize(&Schema::empty(), &json!({"a": 1}), None).value, Value::Null);
        let s = schema(json!({"properties": {"anything": {}}}));
        assert_eq!(
            normalize(&s, &json!({"anything": 5}), None).value,
            json!({"anything": null})
        );
    }

    #[test]
    fn scalar_case_returns_data_unchanged() {
        let s = schema(json!({"type": "integer", "default": 1}));
        assert_eq!(normalize(&s, &json!("not an int"), None).value, json!("not an int"));
        assert_eq!(normalize(&s, &json!(0), None).value, json!(0));
        assert_eq!(normalize(&s, &Value::Null, None).value, json!(1));
    }

    #[test]
    fn object_case_on_non_object_data() {
        let s = schema(json!({"properties": {"a": {"default": 1}}}));
        assert_eq!(normalize(&s, &json!([1, 2]), None).value, json!({"a": 1}));
        assert_eq!(normalize(&s, &json!("str"), None).value, json!({"a": 1}));
    }

    #[test]
    fn input_is_not_mutated() {
        let data = json!({"content": "hello", "extra": 1});
        let before = data.clone();
        let _ = merge_default(create_question_schema(), &data);
        assert_eq!(data, before);
    }

    #[test]
    fn repeated_normalization_is_stable() {
        let data = json!({"content": "x", "images": ["a", null]});
        let a = normalize(create_question_schema(), &data, None);
        let b = normalize(create_question_schema(), &data, None);
        assert_eq!(a, b);
    }

    struct Headers(Vec<(&'static str, &'static str)>);

    impl Attributes for Headers {
        fn attribute(&self, name: &str) -> Option<Value> {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| json!(v))
        }

        fn attribute_names(&self) -> Vec<String> {
            self.0.iter().map(|(k, _)| k.to_string()).collect()
        }
    }

    #[test]
    fn attribute_like_data_normalizes() {
        let s = schema(json!({
            "required": ["Authorization"],
            "properties": {"Authorization": {"type": "string"}},
            "additionalProperties": {"type": "string"}
        }));
        let headers = Headers(vec![("authorization", "Bearer t"), ("x-trace", "1")]);
        let out = normalize(&s, Data::attributes(&headers), None);
        assert!(out.is_complete());
        assert_eq!(
            out.value,
            json!({"Authorization": "Bearer t", "authorization": "Bearer t", "x-trace": "1"})
        );
    }

    #[test]
    fn attribute_like_data_in_scalar_position_materializes() {
        let headers = Headers(vec![("a", "1")]);
        let s = schema(json!({"type": "string"}));
        assert_eq!(
            normalize(&s, Data::attributes(&headers), None).value,
            json!({"a": "1"})
        );
    }

    #[test]
    fn custom_type_defaults() {
        let table: TypeDefaults = [("string", json!("n/a"))].into_iter().collect();
        let out = normalize(create_question_schema(), &json!({}), Some(&table));
        assert_eq!(out.value, json!({"content": "n/a"}));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn json_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(|n| json!(n)),
                "[a-z_]{0,8}".prop_map(Value::String),
            ];
            leaf.prop_recursive(3, 32, 6, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                    prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            /// Any data against the shipped schema normalizes without panicking,
            /// and twice gives the same answer.
            #[test]
            fn normalization_is_total_and_deterministic(data in json_value()) {
                let a = normalize(create_question_schema(), &data, None);
                let b = normalize(create_question_schema(), &data, None);
                prop_assert_eq!(a, b);
            }

            /// Arbitrary values used as schemas never make the walk fail.
            #[test]
            fn arbitrary_schemas_never_panic(s in json_value(), data in json_value()) {
                let schema = Schema::from_value(&s);
                let _ = merge_default_with_errors(&schema, &data);
            }

            /// Missing required keys are reported exactly once and omitted.
            #[test]
            fn missing_required_reported_once(key in "[a-z]{1,8}") {
                let s = Schema::from_value(&json!({
                    "type": "object",
                    "required": [key.clone()],
                    "properties": {key.clone(): {"type": "thing"}}
                }));
                let out = normalize(&s, &json!({}), None);
                prop_assert_eq!(out.errors.len(), 1);
                prop_assert_eq!(&out.errors[0].property, &key);
                prop_assert!(out.value.get(&key).is_none());
            }
        }
    }
}
