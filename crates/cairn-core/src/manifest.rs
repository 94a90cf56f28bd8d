//! Bundle manifest definition and loading

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::schema::SchemaNode;

/// File name of the bundle manifest inside a bundle directory
pub const MANIFEST_FILE: &str = "bundle.yaml";

/// A bundle manifest (`bundle.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// JSON Schema draft the bundle schemas are written against
    #[serde(default = "default_schema_draft")]
    pub schema: String,

    /// Bundle name (required)
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Bundle type
    #[serde(default = "default_bundle_type", rename = "type")]
    pub bundle_type: String,

    /// Source repository URL
    #[serde(default)]
    pub source_url: Option<String>,

    /// Visibility in the catalog
    #[serde(default)]
    pub access: Option<String>,

    /// IaC implementation steps
    #[serde(default)]
    pub steps: Vec<Step>,

    /// The four bundle schemas
    #[serde(flatten)]
    pub schemas: BundleSchemaSet,
}

fn default_schema_draft() -> String {
    "draft-07".to_string()
}

fn default_bundle_type() -> String {
    "infrastructure".to_string()
}

/// One IaC implementation directory and the backend that provisions it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Directory relative to the bundle root
    pub path: String,

    /// Provisioner name, e.g. `terraform`, `opentofu:1.10`, `bicep`, `helm`
    pub provisioner: String,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            path: "src".to_string(),
            provisioner: "terraform".to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.provisioner)
    }
}

/// The four named schemas owned by a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSchemaSet {
    #[serde(default = "SchemaNode::empty_schema")]
    pub params: SchemaNode,

    #[serde(default = "SchemaNode::empty_schema")]
    pub connections: SchemaNode,

    #[serde(default = "SchemaNode::empty_schema")]
    pub artifacts: SchemaNode,

    #[serde(default = "SchemaNode::empty_schema")]
    pub ui: SchemaNode,
}

impl Default for BundleSchemaSet {
    fn default() -> Self {
        Self {
            params: SchemaNode::empty_schema(),
            connections: SchemaNode::empty_schema(),
            artifacts: SchemaNode::empty_schema(),
            ui: SchemaNode::empty_schema(),
        }
    }
}

/// Which member of a [`BundleSchemaSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Params,
    Connections,
    Artifacts,
    Ui,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 4] = [
        SchemaKind::Params,
        SchemaKind::Connections,
        SchemaKind::Artifacts,
        SchemaKind::Ui,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Params => "params",
            SchemaKind::Connections => "connections",
            SchemaKind::Artifacts => "artifacts",
            SchemaKind::Ui => "ui",
        }
    }

    /// Name of the generated standalone schema file
    pub fn file_name(&self) -> String {
        format!("schema-{}.json", self.name())
    }

    /// Whether the generated file carries a `$schema`/`$id` header
    ///
    /// The UI schema is a form layout, not a JSON Schema, and is written
    /// as-is.
    pub fn has_header(&self) -> bool {
        !matches!(self, SchemaKind::Ui)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl BundleSchemaSet {
    pub fn get(&self, kind: SchemaKind) -> &SchemaNode {
        match kind {
            SchemaKind::Params => &self.params,
            SchemaKind::Connections => &self.connections,
            SchemaKind::Artifacts => &self.artifacts,
            SchemaKind::Ui => &self.ui,
        }
    }

    pub fn get_mut(&mut self, kind: SchemaKind) -> &mut SchemaNode {
        match kind {
            SchemaKind::Params => &mut self.params,
            SchemaKind::Connections => &mut self.connections,
            SchemaKind::Artifacts => &mut self.artifacts,
            SchemaKind::Ui => &mut self.ui,
        }
    }

    /// Replace explicit `null` schemas (`params:` with no body) by the default
    fn normalize(&mut self) {
        for kind in SchemaKind::ALL {
            let schema = self.get_mut(kind);
            if schema.is_null() {
                *schema = SchemaNode::empty_schema();
            }
        }
    }
}

impl BundleManifest {
    /// Parse a manifest from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut manifest: BundleManifest = serde_yaml::from_str(yaml)?;
        manifest.schemas.normalize();

        if manifest.name.trim().is_empty() {
            return Err(CoreError::InvalidManifest {
                message: "`name` must not be empty".to_string(),
            });
        }

        for kind in SchemaKind::ALL {
            let schema = manifest.schemas.get(kind);
            if schema.as_object().is_none() {
                return Err(CoreError::InvalidManifest {
                    message: format!("`{}` must be an object, found {}", kind, schema.kind()),
                });
            }
        }

        Ok(manifest)
    }

    /// Steps to process, with the implicit default when none are declared
    pub fn steps(&self) -> Vec<Step> {
        if self.steps.is_empty() {
            vec![Step::default()]
        } else {
            self.steps.clone()
        }
    }
}

/// A manifest together with where it lives on disk
#[derive(Debug, Clone)]
pub struct LoadedBundle {
    /// Manifest definition
    pub manifest: BundleManifest,

    /// Root directory of the bundle
    pub root: PathBuf,

    /// Path to `bundle.yaml`
    pub manifest_path: PathBuf,
}

impl LoadedBundle {
    /// Load a bundle from its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.exists() {
            return Err(CoreError::BundleNotFound { path: root });
        }

        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(CoreError::BundleNotFound {
                path: manifest_path,
            });
        }

        let content = std::fs::read_to_string(&manifest_path)?;
        let manifest = BundleManifest::from_yaml(&content)?;
        tracing::debug!(
            bundle = %manifest.name,
            file = %manifest_path.display(),
            steps = manifest.steps().len(),
            "loaded manifest"
        );

        Ok(Self {
            manifest,
            root,
            manifest_path,
        })
    }

    /// Absolute-or-relative directory of a step
    pub fn step_dir(&self, step: &Step) -> PathBuf {
        self.root.join(&step.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
schema: draft-07
name: aws-rds
description: Managed Postgres
steps:
  - path: src
    provisioner: opentofu:1.10
  - path: chart
    provisioner: helm
params:
  properties:
    size:
      type: string
  required:
    - size
connections:
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = BundleManifest::from_yaml(MANIFEST).unwrap();
        assert_eq!(manifest.name, "aws-rds");
        assert_eq!(manifest.bundle_type, "infrastructure");
        assert_eq!(manifest.steps().len(), 2);
        assert_eq!(manifest.steps()[0].provisioner, "opentofu:1.10");
        assert_eq!(manifest.schemas.params.required().unwrap(), vec!["size"]);
    }

    #[test]
    fn test_absent_and_null_schemas_default() {
        let manifest = BundleManifest::from_yaml(MANIFEST).unwrap();
        assert_eq!(manifest.schemas.connections, SchemaNode::empty_schema());
        assert_eq!(manifest.schemas.artifacts, SchemaNode::empty_schema());
        assert_eq!(manifest.schemas.ui, SchemaNode::empty_schema());
    }

    #[test]
    fn test_default_step() {
        let manifest = BundleManifest::from_yaml("name: bare\n").unwrap();
        assert_eq!(manifest.steps(), vec![Step::default()]);
        assert_eq!(manifest.steps()[0].path, "src");
        assert_eq!(manifest.steps()[0].provisioner, "terraform");
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = BundleManifest::from_yaml("name: ''\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidManifest { .. }));
    }

    #[test]
    fn test_scalar_params_rejected() {
        let err = BundleManifest::from_yaml("name: x\nparams: 3\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidManifest { .. }));
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = LoadedBundle::load(dir.path()).unwrap_err();
        match err {
            CoreError::BundleNotFound { path } => assert!(path.ends_with(MANIFEST_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_bundle() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), MANIFEST).unwrap();

        let bundle = LoadedBundle::load(dir.path()).unwrap();
        assert_eq!(bundle.manifest.name, "aws-rds");
        assert_eq!(
            bundle.step_dir(&bundle.manifest.steps()[1]),
            dir.path().join("chart")
        );
    }

    #[test]
    fn test_schema_file_names() {
        assert_eq!(SchemaKind::Params.file_name(), "schema-params.json");
        assert_eq!(SchemaKind::Ui.file_name(), "schema-ui.json");
        assert!(!SchemaKind::Ui.has_header());
    }
}
