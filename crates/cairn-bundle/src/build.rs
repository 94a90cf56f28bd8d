//! Build pipeline
//!
//! resolve the four bundle schemas, write them as standalone schema files,
//! combine params, connections and metadata, then let every step's
//! provisioner append the declarations it is missing.
//!
//! Failures abort the build. Files written before the failure stay on disk.

use std::path::PathBuf;

use cairn_core::{
    BundleManifest, BundleSchemaSet, CombinedSchema, LoadedBundle, SchemaKind, SchemaMap,
    SchemaNode, Step, combine, metadata_schema,
};
use cairn_provisioner::ProvisionerRegistry;
use cairn_resolve::{ResolveContext, resolve};

use crate::error::{BundleError, Result};

pub const DEFAULT_ID_BASE: &str = "https://schemas.cairn.dev";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Prefix of the generated `$id` values
    pub id_base: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            id_base: DEFAULT_ID_BASE.to_string(),
        }
    }
}

/// What a build produced
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub schema_files: Vec<PathBuf>,
    pub exports: Vec<StepExport>,
}

/// Declarations appended to one step
#[derive(Debug, Clone)]
pub struct StepExport {
    pub step: Step,
    pub provisioner: String,
    pub written: Vec<String>,
}

impl BuildReport {
    pub fn total_written(&self) -> usize {
        self.exports.iter().map(|e| e.written.len()).sum()
    }
}

/// Run the build pipeline for a loaded bundle
///
/// `ctx` should be rooted at the bundle directory so relative references
/// resolve against it.
pub async fn run_build(
    bundle: &LoadedBundle,
    ctx: &ResolveContext,
    registry: &ProvisionerRegistry,
    options: &BuildOptions,
) -> Result<BuildReport> {
    let manifest = &bundle.manifest;
    let resolved = resolve_schema_set(&manifest.schemas, ctx).await?;

    let mut report = BuildReport::default();

    for kind in SchemaKind::ALL {
        let document = schema_document(manifest, kind, resolved.get(kind), options)?;
        let path = bundle.root.join(kind.file_name());

        let mut content = serde_json::to_string_pretty(&document).map_err(cairn_core::CoreError::from)?;
        content.push('\n');
        std::fs::write(&path, content).map_err(|source| BundleError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!(file = %path.display(), "wrote schema");
        report.schema_files.push(path);
    }

    let metadata = metadata_schema();
    let combined = combine(&[&resolved.params, &resolved.connections, &metadata])?;

    for step in manifest.steps() {
        let provisioner = registry.get(&step.provisioner);
        let written = provisioner.export_missing(&bundle.step_dir(&step), &combined)?;

        report.exports.push(StepExport {
            provisioner: provisioner.name().to_string(),
            step,
            written,
        });
    }

    Ok(report)
}

/// Resolve all four schemas of a set concurrently
pub async fn resolve_schema_set(schemas: &BundleSchemaSet, ctx: &ResolveContext) -> Result<BundleSchemaSet> {
    let (params, connections, artifacts, ui) = futures::try_join!(
        resolve(&schemas.params, ctx),
        resolve(&schemas.connections, ctx),
        resolve(&schemas.artifacts, ctx),
        resolve(&schemas.ui, ctx),
    )?;

    Ok(BundleSchemaSet {
        params,
        connections,
        artifacts,
        ui,
    })
}

/// The combined schema of a manifest's (unresolved) params and connections
pub fn combined_schema(manifest: &BundleManifest) -> Result<CombinedSchema> {
    let metadata = metadata_schema();
    Ok(combine(&[
        &manifest.schemas.params,
        &manifest.schemas.connections,
        &metadata,
    ])?)
}

/// A standalone schema file body, with the generated header where applicable
///
/// Header keys win over keys of the same name in the schema itself.
fn schema_document(
    manifest: &BundleManifest,
    kind: SchemaKind,
    schema: &SchemaNode,
    options: &BuildOptions,
) -> Result<serde_json::Value> {
    if !kind.has_header() {
        return Ok(schema.to_json());
    }

    let mut document = SchemaMap::new();
    document.insert(
        "$schema".to_string(),
        SchemaNode::from(format!("http://json-schema.org/{}/schema#", manifest.schema)),
    );
    document.insert(
        "$id".to_string(),
        SchemaNode::from(format!(
            "{}/{}/{}",
            options.id_base.trim_end_matches('/'),
            manifest.name,
            kind.file_name()
        )),
    );
    document.insert("title".to_string(), SchemaNode::from(manifest.name.as_str()));
    document.insert(
        "description".to_string(),
        SchemaNode::from(manifest.description.as_str()),
    );

    if let Some(body) = schema.as_object() {
        for (key, value) in body {
            if !document.contains_key(key) {
                document.insert(key.clone(), value.clone());
            }
        }
    }

    let json = SchemaNode::Object(document).to_json();
    jsonschema::validator_for(&json).map_err(|e| BundleError::SchemaShape {
        file: kind.file_name(),
        message: e.to_string(),
    })?;

    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> BundleManifest {
        BundleManifest::from_yaml(
            "schema: draft-07\nname: demo\ndescription: Demo bundle\nparams:\n  title: ignored\n  properties:\n    size: {type: string}\n",
        )
        .unwrap()
    }

    #[test]
    fn test_header_generated() {
        let manifest = manifest();
        let document = schema_document(
            &manifest,
            SchemaKind::Params,
            &manifest.schemas.params,
            &BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(document["$schema"], "http://json-schema.org/draft-07/schema#");
        assert_eq!(document["$id"], "https://schemas.cairn.dev/demo/schema-params.json");
        assert_eq!(document["title"], "demo");
        assert_eq!(document["description"], "Demo bundle");
        assert_eq!(document["properties"], json!({"size": {"type": "string"}}));

        let keys: Vec<&str> = document.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["$schema", "$id", "title", "description", "properties"]);
    }

    #[test]
    fn test_ui_written_as_is() {
        let manifest = BundleManifest::from_yaml("name: demo\nui:\n  ui:order: [size]\n").unwrap();
        let document = schema_document(
            &manifest,
            SchemaKind::Ui,
            &manifest.schemas.ui,
            &BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(document, json!({"ui:order": ["size"]}));
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let manifest = BundleManifest::from_yaml("name: demo\nartifacts:\n  type: 12\n").unwrap();
        let err = schema_document(
            &manifest,
            SchemaKind::Artifacts,
            &manifest.schemas.artifacts,
            &BuildOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, BundleError::SchemaShape { ref file, .. } if file == "schema-artifacts.json"));
    }

    #[test]
    fn test_combined_schema_includes_metadata() {
        let combined = combined_schema(&manifest()).unwrap();
        assert_eq!(combined.names().collect::<Vec<_>>(), vec!["size", "md_metadata"]);
        assert_eq!(combined.required, vec!["md_metadata"]);
    }
}
