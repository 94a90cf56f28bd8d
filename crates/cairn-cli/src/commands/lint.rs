//! Lint command - check a bundle before building it

use console::style;
use std::path::Path;

use cairn_core::{LintSeverity, LoadedBundle, lint_manifest};
use cairn_provisioner::ProvisionerRegistry;

use crate::error::{CliError, Result};

pub fn run(path: &Path, strict: bool) -> Result<()> {
    println!(
        "{} Linting bundle at {}",
        style("→").blue(),
        path.display()
    );

    let bundle = match LoadedBundle::load(path) {
        Ok(bundle) => {
            println!(
                "  {} bundle.yaml is valid ({})",
                style("✓").green(),
                bundle.manifest.name
            );
            bundle
        }
        Err(e) => {
            println!("  {} bundle.yaml: {}", style("✗").red(), e);
            return Err(CliError::lint_failed(1, 0));
        }
    };

    let report = lint_manifest(&bundle.manifest)?;
    let mut errors = report.errors();
    let mut warnings = report.warnings();

    for finding in &report.findings {
        let marker = match finding.severity {
            LintSeverity::Error => style("✗").red(),
            LintSeverity::Warning => style("⚠").yellow(),
        };
        println!("  {} {}", marker, finding.message);
    }

    let registry = ProvisionerRegistry::default();
    for step in bundle.manifest.steps() {
        if !bundle.step_dir(&step).is_dir() {
            println!(
                "  {} step {}: directory not found",
                style("✗").red(),
                step
            );
            errors += 1;
            continue;
        }

        match registry.lookup(&step.provisioner) {
            Some(provisioner) => println!(
                "  {} step {} uses the {} backend",
                style("✓").green(),
                step.path,
                provisioner.name()
            ),
            None => {
                println!(
                    "  {} step {}: unknown provisioner, declarations will not be synchronized",
                    style("⚠").yellow(),
                    step
                );
                warnings += 1;
            }
        }
    }

    println!();
    if errors > 0 || (strict && warnings > 0) {
        println!(
            "{} Linting failed: {} error(s), {} warning(s)",
            style("✗").red().bold(),
            errors,
            warnings
        );
        return Err(CliError::lint_failed(errors, warnings));
    }

    println!(
        "{} Linting passed ({} warning(s))",
        style("✓").green().bold(),
        warnings
    );
    Ok(())
}
