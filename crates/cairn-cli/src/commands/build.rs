//! Build command - generate schema files and backend declarations

use console::style;
use std::path::Path;

use cairn_bundle::{BuildOptions, run_build};
use cairn_core::LoadedBundle;
use cairn_provisioner::ProvisionerRegistry;
use cairn_resolve::{ResolveContext, ResolverConfig};

use crate::error::Result;

pub fn run(path: &Path, id_base: &str, config: &ResolverConfig) -> Result<()> {
    println!(
        "{} Building bundle at {}",
        style("→").blue(),
        path.display()
    );

    let bundle = LoadedBundle::load(path)?;
    tracing::debug!(
        catalog = ?config.catalog_url,
        timeout = ?config.http_timeout,
        "resolver configuration"
    );
    let registry = ProvisionerRegistry::default();
    let options = BuildOptions {
        id_base: id_base.to_string(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let report = runtime.block_on(async {
        let ctx = ResolveContext::from_config(&bundle.root, config)?;
        run_build(&bundle, &ctx, &registry, &options).await
    })?;

    for file in &report.schema_files {
        println!("  {} Wrote {}", style("✓").green(), file.display());
    }

    for export in &report.exports {
        if export.written.is_empty() {
            println!(
                "  {} {} is up to date",
                style("✓").green(),
                export.step
            );
        } else {
            println!(
                "  {} {}: added {}",
                style("+").green(),
                export.step,
                export.written.join(", ")
            );
        }
    }

    println!();
    println!(
        "{} Built {} ({} declaration(s) added)",
        style("✓").green().bold(),
        bundle.manifest.name,
        report.total_written()
    );

    Ok(())
}
