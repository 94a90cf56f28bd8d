//! Import command - pull backend variables into bundle.yaml

use console::style;
use std::path::Path;

use cairn_bundle::{ConsoleConfirm, ImportOptions, ImportOutcome, run_import};
use cairn_core::LoadedBundle;
use cairn_provisioner::ProvisionerRegistry;

use crate::error::Result;

pub fn run(path: &Path, skip_verify: bool, dry_run: bool) -> Result<()> {
    let bundle = LoadedBundle::load(path)?;

    eprintln!(
        "{} Importing parameters into {}",
        style("→").blue(),
        bundle.manifest_path.display()
    );

    let registry = ProvisionerRegistry::default();
    let mut confirm = ConsoleConfirm::new();
    let options = ImportOptions {
        skip_verify,
        dry_run,
    };

    match run_import(&bundle, &registry, &mut confirm, &options)? {
        ImportOutcome::NoMissing => {
            eprintln!("  {} No missing parameters", style("✓").green());
        }
        ImportOutcome::Written { added, path } => {
            for name in &added {
                eprintln!("  {} {}", style("+").green(), name);
            }
            eprintln!();
            eprintln!(
                "{} Added {} parameter(s) to {}",
                style("✓").green().bold(),
                added.len(),
                path.display()
            );
        }
        ImportOutcome::DryRun { added, rendered } => {
            eprintln!(
                "  {} Dry run, {} parameter(s) would be added: {}",
                style("⚠").yellow(),
                added.len(),
                added.join(", ")
            );
            print!("{rendered}");
        }
    }

    Ok(())
}
