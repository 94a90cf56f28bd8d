//! Cairn Provisioner - per-backend variable declaration codecs
//!
//! Each IaC backend implements [`Provisioner`]:
//! - `export_missing` appends native declarations for properties a step lacks
//! - `read_declared` reads a step's declarations back as a schema
//!
//! Terraform/OpenTofu and Bicep are driven by an [`Introspector`]. Helm and
//! unknown backends cannot be introspected and return `None`.

pub mod bicep;
pub mod error;
pub mod helm;
pub mod provisioner;
pub mod registry;
pub mod terraform;
pub mod types;

pub use bicep::BicepIntrospector;
pub use error::{ProvisionerError, Result};
pub use helm::{HelmProvisioner, NoopProvisioner};
pub use provisioner::{BANNER, CodecProvisioner, Introspector, Provisioner};
pub use registry::ProvisionerRegistry;
pub use terraform::TerraformIntrospector;
pub use types::{BicepTypeMapper, TerraformTypeMapper, TypeMapper};
