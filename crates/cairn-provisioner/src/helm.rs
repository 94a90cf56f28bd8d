//! Helm and fallback provisioners
//!
//! Neither can be introspected: reads return `None` and exports write
//! nothing.

use std::path::Path;

use cairn_core::{CombinedSchema, SchemaNode};

use crate::error::Result;
use crate::provisioner::Provisioner;

/// Helm charts take values through `values.yaml`, which is not a typed
/// declaration surface
#[derive(Debug, Clone, Copy, Default)]
pub struct HelmProvisioner;

impl Provisioner for HelmProvisioner {
    fn name(&self) -> &str {
        "helm"
    }

    fn export_missing(&self, step_dir: &Path, combined: &CombinedSchema) -> Result<Vec<String>> {
        tracing::debug!(
            step = %step_dir.display(),
            properties = combined.properties.len(),
            "helm charts have no variable declarations to generate"
        );
        Ok(Vec::new())
    }

    fn read_declared(&self, _step_dir: &Path) -> Result<Option<SchemaNode>> {
        Ok(None)
    }
}

/// Used for provisioner names no backend claims
#[derive(Debug, Clone, Default)]
pub struct NoopProvisioner {
    name: String,
}

impl NoopProvisioner {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Provisioner for NoopProvisioner {
    fn name(&self) -> &str {
        &self.name
    }

    fn export_missing(&self, step_dir: &Path, _combined: &CombinedSchema) -> Result<Vec<String>> {
        tracing::debug!(
            provisioner = %self.name,
            step = %step_dir.display(),
            "no codec for provisioner, skipping export"
        );
        Ok(Vec::new())
    }

    fn read_declared(&self, _step_dir: &Path) -> Result<Option<SchemaNode>> {
        Ok(None)
    }
}
