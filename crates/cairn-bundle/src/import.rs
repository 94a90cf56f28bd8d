//! Import pipeline
//!
//! Reads every step's declared variables, keeps those the manifest's
//! combined schema lacks, confirms them one by one and merges the survivors
//! into `params` of `bundle.yaml`. The manifest text is edited in place
//! through [`ManifestDocument`], so unrelated content is left as it was.
//! Nothing is written until the whole merge has been computed.

use std::path::PathBuf;

use cairn_core::{LoadedBundle, ManifestDocument, MissingSet, PropertySet, diff};
use cairn_provisioner::ProvisionerRegistry;

use crate::build::combined_schema;
use crate::error::{BundleError, Result};
use crate::prompt::Confirm;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Accept every discovered property without asking
    pub skip_verify: bool,
    /// Compute the new manifest but do not write it
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// Every declared variable is already in the manifest (or was declined)
    NoMissing,
    Written { added: Vec<String>, path: PathBuf },
    DryRun { added: Vec<String>, rendered: String },
}

/// Run the import pipeline for a loaded bundle
pub fn run_import(
    bundle: &LoadedBundle,
    registry: &ProvisionerRegistry,
    confirm: &mut dyn Confirm,
    options: &ImportOptions,
) -> Result<ImportOutcome> {
    let mut document = ManifestDocument::from_file(&bundle.manifest_path)?;
    let mut missing = discover_missing(bundle, registry)?;

    if !options.skip_verify {
        let candidates: Vec<String> = missing.names().map(str::to_string).collect();
        for name in candidates {
            let accepted = match missing.properties.get(&name) {
                Some(schema) => confirm.confirm(&name, schema).map_err(BundleError::Prompt)?,
                None => continue,
            };
            if !accepted {
                tracing::debug!(property = %name, "declined");
                missing.remove(&name);
            }
        }
    }

    if missing.is_empty() {
        tracing::info!("no missing parameters");
        return Ok(ImportOutcome::NoMissing);
    }

    let added: Vec<String> = missing.names().map(str::to_string).collect();
    document.merge_params(&missing)?;

    if options.dry_run {
        return Ok(ImportOutcome::DryRun {
            added,
            rendered: document.render(),
        });
    }

    document.write_to(&bundle.manifest_path)?;
    tracing::info!(
        file = %bundle.manifest_path.display(),
        count = added.len(),
        "merged parameters into manifest"
    );

    Ok(ImportOutcome::Written {
        added,
        path: bundle.manifest_path.clone(),
    })
}

/// Variables declared by any step but absent from the combined schema
///
/// Steps whose backend cannot be introspected are skipped. When several
/// steps declare the same variable, the first step's declaration is kept.
pub fn discover_missing(bundle: &LoadedBundle, registry: &ProvisionerRegistry) -> Result<MissingSet> {
    let combined = combined_schema(&bundle.manifest)?;
    let mut missing = MissingSet::default();

    for step in bundle.manifest.steps() {
        let provisioner = registry.get(&step.provisioner);
        let Some(declared) = provisioner.read_declared(&bundle.step_dir(&step))? else {
            tracing::warn!(step = %step, "provisioner cannot be introspected, skipping step");
            continue;
        };

        let declared = PropertySet::from_node(&declared)?;
        missing.absorb(diff(&declared, &combined));
    }

    Ok(missing)
}
