//! Schema model
//!
//! A schema is plain data describing the shape of the output:
//! - a selector string (`"a[href] | trim"`) yields one leaf value
//! - an object maps output keys to nested schemas, with an optional `$root`
//!   selector narrowing the scope for its siblings
//! - a single-element array asks for one result per matching element

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, SchemaError};

/// Reserved key narrowing the scope of a field mapping.
pub const ROOT_KEY: &str = "$root";

/// A parsed schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Field expression: selector, optional attribute, optional filters.
    Selector(String),
    /// Named fields, resolved in declaration order.
    Fields(FieldMapping),
    /// One result per matching element.
    Collection(Box<Schema>),
}

/// Object schema with `$root` lifted out of the field list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMapping {
    pub root: Option<String>,
    pub fields: Vec<(String, Schema)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, selector: impl Into<String>) -> Self {
        self.root = Some(selector.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.fields.push((name.into(), schema.into()));
        self
    }

    /// Look up a field schema by name.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Same fields without the `$root` scope.
    pub fn without_root(&self) -> FieldMapping {
        FieldMapping {
            root: None,
            fields: self.fields.clone(),
        }
    }
}

impl Schema {
    pub fn selector(expr: impl Into<String>) -> Self {
        Schema::Selector(expr.into())
    }

    pub fn collection(inner: impl Into<Schema>) -> Self {
        Schema::Collection(Box::new(inner.into()))
    }

    /// Convert plain JSON data into a schema, validating its shape.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        from_value_at(value, "$")
    }
}

fn from_value_at(value: &Value, path: &str) -> Result<Schema, SchemaError> {
    match value {
        Value::String(s) => Ok(Schema::Selector(s.clone())),
        Value::Object(map) => {
            let mut mapping = FieldMapping::new();
            for (key, v) in map {
                if key == ROOT_KEY {
                    match v {
                        Value::String(s) => mapping.root = Some(s.clone()),
                        _ => {
                            return Err(SchemaError::RootNotString {
                                path: path.to_string(),
                            })
                        }
                    }
                    continue;
                }
                let child = from_value_at(v, &format!("{}.{}", path, key))?;
                mapping.fields.push((key.clone(), child));
            }
            Ok(Schema::Fields(mapping))
        }
        Value::Array(items) => {
            if items.len() != 1 {
                return Err(SchemaError::CollectionArity {
                    path: path.to_string(),
                    len: items.len(),
                });
            }
            if items[0].is_array() {
                return Err(SchemaError::NestedCollection {
                    path: path.to_string(),
                });
            }
            let inner = from_value_at(&items[0], &format!("{}[0]", path))?;
            Ok(Schema::Collection(Box::new(inner)))
        }
        Value::Null => Err(unsupported(path, "null")),
        Value::Bool(_) => Err(unsupported(path, "boolean")),
        Value::Number(_) => Err(unsupported(path, "number")),
    }
}

fn unsupported(path: &str, found: &'static str) -> SchemaError {
    SchemaError::UnsupportedValue {
        path: path.to_string(),
        found,
    }
}

impl From<&str> for Schema {
    fn from(expr: &str) -> Self {
        Schema::Selector(expr.to_string())
    }
}

impl From<String> for Schema {
    fn from(expr: String) -> Self {
        Schema::Selector(expr)
    }
}

impl From<FieldMapping> for Schema {
    fn from(mapping: FieldMapping) -> Self {
        Schema::Fields(mapping)
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Schema::from_value(&value)
    }
}

impl TryFrom<&Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Schema::from_value(value)
    }
}

impl FromStr for Schema {
    type Err = Error;

    /// Parse a schema from JSON text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Schema::from_value(&value)?)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Schema::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_schema() {
        let schema = Schema::from_value(&json!([{
            "$root": ".item",
            "link": "a[href]",
            "content": { "$root": ".item-content", "title": "h2" },
            "tags": [".item-tags li"]
        }]))
        .unwrap();

        let Schema::Collection(inner) = schema else {
            panic!("expected collection");
        };
        let Schema::Fields(mapping) = *inner else {
            panic!("expected fields");
        };
        assert_eq!(mapping.root.as_deref(), Some(".item"));
        let names: Vec<&str> = mapping.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["link", "content", "tags"]);
        assert_eq!(
            mapping.get("tags"),
            Some(&Schema::collection(".item-tags li"))
        );
    }

    #[test]
    fn test_key_order_is_preserved() {
        let schema: Schema = r#"{"z": "a", "m": "b", "a": "c"}"#.parse().unwrap();
        let Schema::Fields(mapping) = schema else {
            panic!("expected fields");
        };
        let names: Vec<&str> = mapping.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["z", "m", "a"]);
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(matches!(
            Schema::from_value(&json!(["a", "b"])),
            Err(SchemaError::CollectionArity { len: 2, .. })
        ));
        assert!(matches!(
            Schema::from_value(&json!([])),
            Err(SchemaError::CollectionArity { len: 0, .. })
        ));
        assert!(matches!(
            Schema::from_value(&json!([["a"]])),
            Err(SchemaError::NestedCollection { .. })
        ));
        assert!(matches!(
            Schema::from_value(&json!({ "$root": 3, "a": "a" })),
            Err(SchemaError::RootNotString { .. })
        ));

        let err = Schema::from_value(&json!({ "links": { "count": 3 } })).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedValue {
                path: "$.links.count".to_string(),
                found: "number"
            }
        );
    }

    #[test]
    fn test_deserialize() {
        #[derive(Deserialize)]
        struct Request {
            schema: Schema,
        }

        let request: Request = serde_json::from_str(r#"{"schema": ["li"]}"#).unwrap();
        assert_eq!(request.schema, Schema::collection("li"));

        assert!(serde_json::from_str::<Request>(r#"{"schema": true}"#).is_err());
    }

    #[test]
    fn test_builders() {
        let built = Schema::collection(
            FieldMapping::new()
                .root(".item")
                .field("link", "a[href]"),
        );
        let parsed = Schema::from_value(&json!([{ "$root": ".item", "link": "a[href]" }])).unwrap();
        assert_eq!(built, parsed);
    }
}
