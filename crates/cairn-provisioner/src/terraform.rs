//! Terraform / OpenTofu variable codec
//!
//! Reads `variable` blocks from every `*.tf` file in the step directory and
//! appends new ones to `_cairn_variables.tf`. A variable with a `default`
//! attribute (even `default = null`) is optional, all others are required.

use hcl::{Body, Expression};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

use cairn_core::{MissingSet, SchemaMap, SchemaNode};

use crate::error::{ProvisionerError, Result};
use crate::provisioner::{Introspector, is_secret};
use crate::types::{TerraformTypeMapper, TypeMapper};

pub const VARIABLES_FILE: &str = "_cairn_variables.tf";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct TerraformIntrospector;

impl Introspector for TerraformIntrospector {
    fn read_declarations(&self, step_dir: &Path) -> Result<SchemaNode> {
        if !step_dir.is_dir() {
            return Err(ProvisionerError::StepNotFound {
                path: step_dir.to_path_buf(),
            });
        }

        let mut properties = SchemaMap::new();
        let mut required = Vec::new();

        for entry in WalkDir::new(step_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ProvisionerError::Io(e.into()))?;
            let path = entry.path();
            let is_tf = path.extension().and_then(|e| e.to_str()) == Some("tf");
            if !entry.file_type().is_file() || !is_tf {
                continue;
            }

            let content = std::fs::read_to_string(path)?;
            let body = hcl::parse(&content).map_err(|e| ProvisionerError::Hcl {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

            for block in body.blocks().filter(|b| b.identifier() == "variable") {
                let Some(label) = block.labels().first() else {
                    continue;
                };
                let name = label.as_str().to_string();
                let (schema, optional) = variable_schema(&name, block.body(), path)?;

                if !optional && !required.contains(&name) {
                    required.push(name.clone());
                }
                properties.insert(name, schema);
            }
        }

        tracing::debug!(
            step = %step_dir.display(),
            count = properties.len(),
            "read terraform variables"
        );
        Ok(SchemaNode::from_parts(properties, &required))
    }

    fn render_declarations(&self, missing: &MissingSet) -> Result<String> {
        let mapper = TerraformTypeMapper;
        let mut out = String::new();

        for (index, (name, schema)) in missing.properties.iter().enumerate() {
            if !IDENTIFIER.is_match(name) {
                return Err(ProvisionerError::Render {
                    backend: mapper.backend().to_string(),
                    property: name.clone(),
                    message: "not a valid variable name".to_string(),
                });
            }

            let mut attributes = vec![("type", mapper.native_type(schema.type_name()).to_string())];
            if let Some(description) = schema.get("description").and_then(SchemaNode::as_str) {
                attributes.push(("description", quote(description)));
            }
            if !missing.is_required(name) {
                attributes.push(("default", "null".to_string()));
            }
            if is_secret(schema) {
                attributes.push(("sensitive", "true".to_string()));
            }

            if index > 0 {
                out.push('\n');
            }
            out.push_str(&format!("variable \"{name}\" {{\n"));
            let width = attributes.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
            for (key, value) in attributes {
                out.push_str(&format!("  {key:<width$} = {value}\n"));
            }
            out.push_str("}\n");
        }

        Ok(out)
    }

    fn declarations_file(&self) -> &'static str {
        VARIABLES_FILE
    }
}

/// Schema for one `variable` block and whether it is optional
fn variable_schema(name: &str, body: &Body, path: &Path) -> Result<(SchemaNode, bool)> {
    let mapper = TerraformTypeMapper;
    let mut schema = SchemaMap::new();
    let mut optional = false;

    schema.insert("title".to_string(), SchemaNode::from(name));

    for attribute in body.attributes() {
        match attribute.key() {
            "type" => {
                let native = hcl::format::to_string(attribute.expr()).map_err(|e| {
                    ProvisionerError::Hcl {
                        path: path.to_path_buf(),
                        message: format!("variable `{name}`: {e}"),
                    }
                })?;
                if let Some(schema_type) = mapper.schema_type(native.trim()) {
                    schema.insert("type".to_string(), SchemaNode::from(schema_type));
                }
            }
            "description" => {
                if let Expression::String(description) = attribute.expr() {
                    schema.insert("description".to_string(), SchemaNode::from(description.as_str()));
                }
            }
            "default" => {
                optional = true;
                let value = serde_json::to_value(attribute.expr()).map_err(|e| ProvisionerError::Hcl {
                    path: path.to_path_buf(),
                    message: format!("variable `{name}` default: {e}"),
                })?;
                if !value.is_null() {
                    schema.insert("default".to_string(), SchemaNode::from(value));
                }
            }
            "sensitive" => {
                if matches!(attribute.expr(), Expression::Bool(true)) {
                    schema.insert("writeOnly".to_string(), SchemaNode::Bool(true));
                }
            }
            _ => {}
        }
    }

    Ok((SchemaNode::Object(schema), optional))
}

/// Quote a string as an HCL literal, escaping interpolation markers
fn quote(value: &str) -> String {
    let json = serde_json::Value::String(value.to_string()).to_string();
    json.replace("${", "$${").replace("%{", "%%{")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioner::{CodecProvisioner, Provisioner};
    use cairn_core::PropertySet;
    use serde_json::json;
    use tempfile::TempDir;

    fn provisioner() -> CodecProvisioner<TerraformIntrospector> {
        CodecProvisioner::new("terraform", TerraformIntrospector)
    }

    fn combined(value: serde_json::Value) -> PropertySet {
        PropertySet::from_node(&SchemaNode::from(value)).unwrap()
    }

    #[test]
    fn test_export_on_empty_backend() {
        let dir = TempDir::new().unwrap();
        let schema = combined(json!({
            "properties": {
                "foo": {"type": "string"},
                "bar": {"type": "object"}
            },
            "required": ["foo"]
        }));

        let written = provisioner().export_missing(dir.path(), &schema).unwrap();
        assert_eq!(written, vec!["foo", "bar"]);

        let content = std::fs::read_to_string(dir.path().join(VARIABLES_FILE)).unwrap();
        insta::assert_snapshot!(content, @r#"
        // Auto-generated variable declarations from bundle.yaml
        variable "foo" {
          type = string
        }

        variable "bar" {
          type    = any
          default = null
        }
        "#);
    }

    #[test]
    fn test_second_export_is_noop() {
        let dir = TempDir::new().unwrap();
        let schema = combined(json!({
            "properties": {"foo": {"type": "string"}, "bar": {"type": "object"}},
            "required": ["foo"]
        }));
        let provisioner = provisioner();

        provisioner.export_missing(dir.path(), &schema).unwrap();
        let first = std::fs::read_to_string(dir.path().join(VARIABLES_FILE)).unwrap();

        let written = provisioner.export_missing(dir.path(), &schema).unwrap();
        assert!(written.is_empty());
        let second = std::fs::read_to_string(dir.path().join(VARIABLES_FILE)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_declarations_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("variables.tf"),
            "variable \"foo\" {\n  type = string\n}\n",
        )
        .unwrap();

        let schema = combined(json!({
            "properties": {
                "foo": {"type": "string"},
                "count": {"type": "integer", "description": "How many ${things}"},
                "password": {"type": "string", "writeOnly": true}
            },
            "required": ["foo", "count", "password"]
        }));

        let written = provisioner().export_missing(dir.path(), &schema).unwrap();
        assert_eq!(written, vec!["count", "password"]);

        let content = std::fs::read_to_string(dir.path().join(VARIABLES_FILE)).unwrap();
        insta::assert_snapshot!(content, @r#"
        // Auto-generated variable declarations from bundle.yaml
        variable "count" {
          type        = number
          description = "How many $${things}"
        }

        variable "password" {
          type      = string
          sensitive = true
        }
        "#);
    }

    #[test]
    fn test_read_declared_maps_types() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("main.tf"),
            r#"
variable "name" {
  type        = string
  description = "Resource name"
}

variable "replicas" {
  type    = number
  default = 2
}

variable "tags" {
  type    = map(string)
  default = null
}

variable "zones" {
  type = list(string)
}

variable "enabled" {
  type = bool
}

variable "anything" {}

resource "null_resource" "x" {}
"#,
        )
        .unwrap();

        let declared = provisioner().read_declared(dir.path()).unwrap().unwrap();
        let properties = declared.properties().unwrap().unwrap();

        assert_eq!(
            properties["name"],
            SchemaNode::from(json!({
                "title": "name",
                "type": "string",
                "description": "Resource name"
            }))
        );
        assert_eq!(
            properties["replicas"],
            SchemaNode::from(json!({"title": "replicas", "type": "number", "default": 2}))
        );
        assert_eq!(properties["tags"].type_name(), Some("object"));
        assert_eq!(properties["zones"].type_name(), Some("array"));
        assert_eq!(properties["enabled"].type_name(), Some("boolean"));
        assert_eq!(properties["anything"].type_name(), None);

        assert_eq!(
            declared.required().unwrap(),
            vec!["name", "zones", "enabled", "anything"]
        );
    }

    #[test]
    fn test_read_sensitive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("main.tf"),
            "variable \"token\" {\n  type      = string\n  sensitive = true\n}\n",
        )
        .unwrap();

        let declared = provisioner().read_declared(dir.path()).unwrap().unwrap();
        let token = &declared.properties().unwrap().unwrap()["token"];
        assert!(is_secret(token));
    }

    #[test]
    fn test_read_missing_step() {
        let dir = TempDir::new().unwrap();
        let err = provisioner()
            .read_declared(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::StepNotFound { .. }));
    }

    #[test]
    fn test_read_invalid_hcl() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.tf"), "variable \"x\" {\n").unwrap();

        let err = provisioner().read_declared(dir.path()).unwrap_err();
        match err {
            ProvisionerError::Hcl { path, .. } => assert!(path.ends_with("broken.tf")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_variable_name() {
        let dir = TempDir::new().unwrap();
        let schema = combined(json!({"properties": {"has space": {}}}));

        let err = provisioner().export_missing(dir.path(), &schema).unwrap_err();
        assert!(matches!(err, ProvisionerError::Render { ref property, .. } if property == "has space"));
        assert!(!dir.path().join(VARIABLES_FILE).exists());
    }
}
