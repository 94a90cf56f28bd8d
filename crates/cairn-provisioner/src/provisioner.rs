//! Provisioner capability and the codec-backed implementation

use std::io::Write;
use std::path::Path;

use cairn_core::{CombinedSchema, MissingSet, PropertySet, SchemaNode, diff};

use crate::error::{ProvisionerError, Result};

/// Comment written before every appended batch of declarations
pub const BANNER: &str = "// Auto-generated variable declarations from bundle.yaml";

/// An IaC backend that can take part in schema synchronization
pub trait Provisioner: Send + Sync {
    /// Backend name (e.g. `terraform`, `bicep`)
    fn name(&self) -> &str;

    /// Append declarations for every property of `combined` the step lacks
    ///
    /// Existing declarations are never modified. Returns the names that
    /// were written, in order.
    fn export_missing(&self, step_dir: &Path, combined: &CombinedSchema) -> Result<Vec<String>>;

    /// Variables the step declares, as a schema
    ///
    /// `None` means the backend cannot be introspected. That is different
    /// from an empty schema and callers must not compare against it.
    fn read_declared(&self, step_dir: &Path) -> Result<Option<SchemaNode>>;
}

/// Reads and writes one backend's native variable declarations
pub trait Introspector: Send + Sync {
    /// Declarations currently present in `step_dir`
    fn read_declarations(&self, step_dir: &Path) -> Result<SchemaNode>;

    /// Native source text declaring every property of `missing`
    fn render_declarations(&self, missing: &MissingSet) -> Result<String>;

    /// File (relative to the step) that new declarations are appended to
    fn declarations_file(&self) -> &'static str;
}

/// A [`Provisioner`] driven by an [`Introspector`]
pub struct CodecProvisioner<I> {
    name: String,
    introspector: I,
}

impl<I: Introspector> CodecProvisioner<I> {
    pub fn new(name: impl Into<String>, introspector: I) -> Self {
        Self {
            name: name.into(),
            introspector,
        }
    }

    pub fn introspector(&self) -> &I {
        &self.introspector
    }
}

impl<I: Introspector> Provisioner for CodecProvisioner<I> {
    fn name(&self) -> &str {
        &self.name
    }

    fn export_missing(&self, step_dir: &Path, combined: &CombinedSchema) -> Result<Vec<String>> {
        let declared = PropertySet::from_node(&self.introspector.read_declarations(step_dir)?)?;
        let missing = diff(combined, &declared);

        if missing.is_empty() {
            tracing::debug!(
                provisioner = %self.name,
                step = %step_dir.display(),
                "no missing variables"
            );
            return Ok(Vec::new());
        }

        let rendered = self.introspector.render_declarations(&missing)?;
        let target = step_dir.join(self.introspector.declarations_file());
        append_block(&target, &rendered)?;

        let names: Vec<String> = missing.names().map(str::to_string).collect();
        tracing::info!(
            provisioner = %self.name,
            file = %target.display(),
            count = names.len(),
            "appended variable declarations"
        );
        Ok(names)
    }

    fn read_declared(&self, step_dir: &Path) -> Result<Option<SchemaNode>> {
        self.introspector.read_declarations(step_dir).map(Some)
    }
}

/// Append `BANNER` plus `body` to `path`, separated from existing content
fn append_block(path: &Path, body: &str) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ProvisionerError::Io(e)),
    };

    let mut block = String::new();
    if !existing.is_empty() {
        if !existing.ends_with('\n') {
            block.push('\n');
        }
        block.push('\n');
    }
    block.push_str(BANNER);
    block.push('\n');
    block.push_str(body);

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(block.as_bytes())?;
    Ok(())
}

/// `writeOnly: true` on a property schema
pub(crate) fn is_secret(schema: &SchemaNode) -> bool {
    matches!(schema.get("writeOnly"), Some(SchemaNode::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_block_to_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vars.tf");

        append_block(&path, "x\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), format!("{BANNER}\nx\n"));
    }

    #[test]
    fn test_append_block_separates_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vars.tf");
        std::fs::write(&path, "existing").unwrap();

        append_block(&path, "x\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("existing\n\n{BANNER}\nx\n")
        );
    }
}
