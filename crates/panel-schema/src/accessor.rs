//! # Data Accessor
//!
//! The normalizer reads candidate data through one small interface no
//! matter what shape the data has. Two shapes are supported:
//!
//! - **Map-like**: a JSON object. Keys are map keys.
//! - **Attribute-like**: any type implementing [`Attributes`], such as a
//!   record struct or a header map wrapper. Keys are attribute names.
//!
//! Everything else (arrays, scalars, `null`) reads as having no keys.
//!
//! Presence is never conflated with nullness: a key that is present with a
//! `null` value is reported as `Some(Value::Null)`, an absent key as `None`.

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Named-attribute access for data that is not a JSON object.
pub trait Attributes {
    /// The attribute's value, or `None` if the attribute does not exist.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Names of all attributes that exist.
    fn attribute_names(&self) -> Vec<String>;
}

impl<T: Attributes + ?Sized> Attributes for &T {
    fn attribute(&self, name: &str) -> Option<Value> {
        (**self).attribute(name)
    }

    fn attribute_names(&self) -> Vec<String> {
        (**self).attribute_names()
    }
}

/// Candidate data handed to the normalizer.
#[derive(Clone, Copy)]
pub enum Data<'a> {
    /// A JSON value of any shape.
    Json(&'a Value),
    /// An attribute-bearing object.
    Attributes(&'a dyn Attributes),
}

static NULL: Value = Value::Null;

impl<'a> Data<'a> {
    /// Absent data.
    pub fn null() -> Data<'static> {
        Data::Json(&NULL)
    }

    /// Wrap an attribute-bearing object.
    pub fn attributes(attrs: &'a dyn Attributes) -> Self {
        Data::Attributes(attrs)
    }

    /// True for `null` JSON data.
    pub fn is_null(&self) -> bool {
        matches!(self, Data::Json(Value::Null))
    }

    /// Materialize the data as JSON. Attribute-like data becomes an object
    /// of its attributes.
    pub fn to_value(&self) -> Value {
        match self {
            Data::Json(v) => (*v).clone(),
            Data::Attributes(attrs) => {
                let mut map = Map::new();
                for name in attrs.attribute_names() {
                    if let Some(v) = attrs.attribute(&name) {
                        map.insert(name, v);
                    }
                }
                Value::Object(map)
            }
        }
    }
}

impl<'a> From<&'a Value> for Data<'a> {
    fn from(value: &'a Value) -> Self {
        Data::Json(value)
    }
}

impl std::fmt::Debug for Data<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Data::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Data::Attributes(attrs) => f
                .debug_tuple("Attributes")
                .field(&attrs.attribute_names())
                .finish(),
        }
    }
}

/// Uniform key access over a [`Data`] value, selected once per object.
pub enum Accessor<'a> {
    MapLike(&'a Map<String, Value>),
    AttributeLike(&'a dyn Attributes),
    /// Arrays, scalars and `null`: no keys.
    Empty,
}

impl<'a> Accessor<'a> {
    pub fn new(data: Data<'a>) -> Self {
        match data {
            Data::Json(Value::Object(map)) => Accessor::MapLike(map),
            Data::Json(_) => Accessor::Empty,
            Data::Attributes(attrs) => Accessor::AttributeLike(attrs),
        }
    }

    /// The value under `key`, or `None` when the key is absent.
    pub fn get(&self, key: &str) -> Option<Cow<'a, Value>> {
        match self {
            Accessor::MapLike(map) => map.get(key).map(Cow::Borrowed),
            Accessor::AttributeLike(attrs) => attrs.attribute(key).map(Cow::Owned),
            Accessor::Empty => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        match self {
            Accessor::MapLike(map) => map.contains_key(key),
            Accessor::AttributeLike(attrs) => attrs.attribute(key).is_some(),
            Accessor::Empty => false,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        match self {
            Accessor::MapLike(map) => map.keys().cloned().collect(),
            Accessor::AttributeLike(attrs) => attrs.attribute_names(),
            Accessor::Empty => Vec::new(),
        }
    }
}
