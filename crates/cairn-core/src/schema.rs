//! Generic schema IR
//!
//! `SchemaNode` mirrors a JSON Schema document as a typed tree. It is the
//! representation every other part of cairn works with: reference resolution
//! rewrites it, the merge/diff engine compares it, and each provisioner codec
//! translates it to and from native variable declarations.
//!
//! Two object keys carry synchronization semantics:
//! - `properties`: field name -> schema of that field
//! - `required`: list of field names
//!
//! Shape problems with either key surface as [`CoreError::SchemaShape`]
//! instead of being silently ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Object body of a schema node, in document order
pub type SchemaMap = IndexMap<String, SchemaNode>;

pub const REF_KEY: &str = "$ref";
pub const PROPERTIES_KEY: &str = "properties";
pub const REQUIRED_KEY: &str = "required";

/// A JSON-Schema-like value
///
/// Equality on objects ignores key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum SchemaNode {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<SchemaNode>),
    Object(SchemaMap),
}

impl SchemaNode {
    /// An object with no keys
    pub fn empty_object() -> Self {
        SchemaNode::Object(SchemaMap::new())
    }

    /// The default schema for an absent bundle schema: `{"properties": {}}`
    pub fn empty_schema() -> Self {
        let mut map = SchemaMap::new();
        map.insert(PROPERTIES_KEY.to_string(), SchemaNode::empty_object());
        SchemaNode::Object(map)
    }

    /// Build `{"properties": ..., "required": [...]}`
    ///
    /// `required` is omitted when empty.
    pub fn from_parts(properties: SchemaMap, required: &[String]) -> Self {
        let mut map = SchemaMap::new();
        map.insert(PROPERTIES_KEY.to_string(), SchemaNode::Object(properties));
        if !required.is_empty() {
            map.insert(
                REQUIRED_KEY.to_string(),
                SchemaNode::Array(required.iter().cloned().map(SchemaNode::String).collect()),
            );
        }
        SchemaNode::Object(map)
    }

    /// Parse a schema from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Ok(value.into())
    }

    /// Parse a schema from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(value.into())
    }

    /// Load a schema document, choosing the parser from the file extension
    ///
    /// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false);

        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Short name of the node's variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaNode::Null => "null",
            SchemaNode::Bool(_) => "boolean",
            SchemaNode::Number(_) => "number",
            SchemaNode::String(_) => "string",
            SchemaNode::Array(_) => "array",
            SchemaNode::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SchemaNode::Null)
    }

    pub fn as_object(&self) -> Option<&SchemaMap> {
        match self {
            SchemaNode::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut SchemaMap> {
        match self {
            SchemaNode::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[SchemaNode]> {
        match self {
            SchemaNode::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SchemaNode::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Look up a key on an object node
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// The `$ref` target of this node, if it has one
    ///
    /// A `$ref` whose value is not a string is a shape error.
    pub fn ref_target(&self) -> Result<Option<&str>> {
        match self.get(REF_KEY) {
            None => Ok(None),
            Some(SchemaNode::String(target)) => Ok(Some(target.as_str())),
            Some(other) => Err(CoreError::shape(
                REF_KEY,
                format!("expected a string, found {}", other.kind()),
            )),
        }
    }

    /// The `properties` map of an object schema
    ///
    /// Returns `None` when the node has no `properties` key (or is not an
    /// object at all).
    pub fn properties(&self) -> Result<Option<&SchemaMap>> {
        match self.get(PROPERTIES_KEY) {
            None | Some(SchemaNode::Null) => Ok(None),
            Some(SchemaNode::Object(map)) => Ok(Some(map)),
            Some(other) => Err(CoreError::shape(
                PROPERTIES_KEY,
                format!("expected an object, found {}", other.kind()),
            )),
        }
    }

    /// The `required` list of an object schema, empty when absent
    pub fn required(&self) -> Result<Vec<String>> {
        match self.get(REQUIRED_KEY) {
            None | Some(SchemaNode::Null) => Ok(Vec::new()),
            Some(SchemaNode::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        CoreError::shape(
                            REQUIRED_KEY,
                            format!("expected a list of strings, found {} entry", item.kind()),
                        )
                    })
                })
                .collect(),
            Some(other) => Err(CoreError::shape(
                REQUIRED_KEY,
                format!("expected an array, found {}", other.kind()),
            )),
        }
    }

    /// The declared JSON Schema `type` of a property
    ///
    /// For union types like `["string", "null"]` the first non-null entry
    /// wins.
    pub fn type_name(&self) -> Option<&str> {
        match self.get("type")? {
            SchemaNode::String(t) => Some(t.as_str()),
            SchemaNode::Array(types) => types
                .iter()
                .filter_map(SchemaNode::as_str)
                .find(|t| *t != "null"),
            _ => None,
        }
    }

    /// Convert into a `serde_json::Value`
    pub fn to_json(&self) -> JsonValue {
        self.clone().into()
    }
}

impl From<JsonValue> for SchemaNode {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => SchemaNode::Null,
            JsonValue::Bool(b) => SchemaNode::Bool(b),
            JsonValue::Number(n) => SchemaNode::Number(n),
            JsonValue::String(s) => SchemaNode::String(s),
            JsonValue::Array(items) => {
                SchemaNode::Array(items.into_iter().map(SchemaNode::from).collect())
            }
            JsonValue::Object(map) => SchemaNode::Object(
                map.into_iter()
                    .map(|(k, v)| (k, SchemaNode::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<SchemaNode> for JsonValue {
    fn from(node: SchemaNode) -> Self {
        match node {
            SchemaNode::Null => JsonValue::Null,
            SchemaNode::Bool(b) => JsonValue::Bool(b),
            SchemaNode::Number(n) => JsonValue::Number(n),
            SchemaNode::String(s) => JsonValue::String(s),
            SchemaNode::Array(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            SchemaNode::Object(map) => JsonValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for SchemaNode {
    fn from(s: &str) -> Self {
        SchemaNode::String(s.to_string())
    }
}

impl From<String> for SchemaNode {
    fn from(s: String) -> Self {
        SchemaNode::String(s)
    }
}

impl From<bool> for SchemaNode {
    fn from(b: bool) -> Self {
        SchemaNode::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_roundtrip_keeps_key_order() {
        let value = json!({"b": 1, "a": {"z": true, "y": null}, "c": ["x", 2.5]});
        let node = SchemaNode::from(value.clone());

        let keys: Vec<&str> = node.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(node.to_json(), value);
    }

    #[test]
    fn test_object_equality_ignores_order() {
        let a = SchemaNode::from(json!({"x": 1, "y": 2}));
        let b = SchemaNode::from(json!({"y": 2, "x": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_yaml_parse() {
        let node = SchemaNode::from_yaml_str(
            r#"
properties:
  size:
    type: string
required:
  - size
"#,
        )
        .unwrap();

        assert!(node.properties().unwrap().unwrap().contains_key("size"));
        assert_eq!(node.required().unwrap(), vec!["size".to_string()]);
    }

    #[test]
    fn test_properties_absent_is_none() {
        let node = SchemaNode::from(json!({"type": "object"}));
        assert!(node.properties().unwrap().is_none());
        assert!(node.required().unwrap().is_empty());
    }

    #[test]
    fn test_properties_wrong_shape() {
        let node = SchemaNode::from(json!({"properties": ["a"]}));
        let err = node.properties().unwrap_err();
        assert!(matches!(err, CoreError::SchemaShape { ref field, .. } if field == "properties"));
    }

    #[test]
    fn test_required_wrong_shape() {
        let node = SchemaNode::from(json!({"required": "a"}));
        assert!(node.required().is_err());

        let node = SchemaNode::from(json!({"required": ["a", 1]}));
        assert!(node.required().is_err());
    }

    #[test]
    fn test_ref_target() {
        let node = SchemaNode::from(json!({"$ref": "./a.json"}));
        assert_eq!(node.ref_target().unwrap(), Some("./a.json"));

        let node = SchemaNode::from(json!({"$ref": 42}));
        assert!(node.ref_target().is_err());

        let node = SchemaNode::from(json!("scalar"));
        assert_eq!(node.ref_target().unwrap(), None);
    }

    #[test]
    fn test_type_name_union() {
        let node = SchemaNode::from(json!({"type": ["null", "integer"]}));
        assert_eq!(node.type_name(), Some("integer"));
    }

    #[test]
    fn test_from_parts_omits_empty_required() {
        let node = SchemaNode::from_parts(SchemaMap::new(), &[]);
        assert_eq!(node, SchemaNode::empty_schema());
    }
}
