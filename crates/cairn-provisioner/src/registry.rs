//! Provisioner lookup by name
//!
//! Step manifests name provisioners loosely: `terraform`, `opentofu:1.10`,
//! `registry.example.com/org/terraform:1.5`. Names are normalized by taking
//! the last `/` segment and dropping any `:tag`, then matched against the
//! registered keys, exact match first, substring second. Names nothing
//! claims fall back to a no-op provisioner.

use std::path::Path;
use std::sync::Arc;

use cairn_core::SchemaNode;

use crate::bicep::BicepIntrospector;
use crate::error::{ProvisionerError, Result};
use crate::helm::{HelmProvisioner, NoopProvisioner};
use crate::provisioner::{CodecProvisioner, Provisioner};
use crate::terraform::TerraformIntrospector;

pub struct ProvisionerRegistry {
    backends: Vec<(String, Arc<dyn Provisioner>)>,
}

impl Default for ProvisionerRegistry {
    /// Registry with every built-in backend
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("terraform", Arc::new(CodecProvisioner::new("terraform", TerraformIntrospector)));
        registry.register("opentofu", Arc::new(CodecProvisioner::new("opentofu", TerraformIntrospector)));
        registry.register("bicep", Arc::new(CodecProvisioner::new("bicep", BicepIntrospector)));
        registry.register("helm", Arc::new(HelmProvisioner));
        registry
    }
}

impl ProvisionerRegistry {
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Register a backend; later registrations win exact-key collisions
    pub fn register(&mut self, key: impl Into<String>, provisioner: Arc<dyn Provisioner>) {
        let key = key.into().to_ascii_lowercase();
        self.backends.retain(|(existing, _)| *existing != key);
        self.backends.push((key, provisioner));
    }

    /// The backend claiming `name`, if any
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Provisioner>> {
        let normalized = normalize(name);

        self.backends
            .iter()
            .find(|(key, _)| *key == normalized)
            .or_else(|| {
                self.backends
                    .iter()
                    .find(|(key, _)| normalized.contains(key.as_str()))
            })
            .map(|(_, provisioner)| Arc::clone(provisioner))
    }

    /// The backend claiming `name`, or a no-op provisioner
    pub fn get(&self, name: &str) -> Arc<dyn Provisioner> {
        self.lookup(name).unwrap_or_else(|| {
            tracing::warn!(provisioner = name, "unknown provisioner, using no-op backend");
            Arc::new(NoopProvisioner::new(name))
        })
    }

    /// Declared variables of a step, failing for backends without introspection
    pub fn require_declared(&self, name: &str, step_dir: &Path) -> Result<SchemaNode> {
        self.get(name)
            .read_declared(step_dir)?
            .ok_or_else(|| ProvisionerError::UnsupportedBackend {
                name: name.to_string(),
            })
    }

    /// Registered keys, in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(|(key, _)| key.as_str())
    }
}

fn normalize(name: &str) -> String {
    let last = name.rsplit('/').next().unwrap_or(name);
    let base = last.split(':').next().unwrap_or(last);
    base.trim().to_ascii_lowercase()
}
