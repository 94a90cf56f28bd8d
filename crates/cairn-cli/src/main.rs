//! Cairn CLI - keep bundle schemas and IaC variable declarations in sync

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cairn_bundle::DEFAULT_ID_BASE;
use cairn_resolve::ResolverConfig;

mod commands;
mod error;
mod exit_codes;

use error::Result;

#[derive(Parser)]
#[command(name = "cairn")]
#[command(author = "Cairn Contributors")]
#[command(version)]
#[command(about = "Keep IaC bundle schemas and backend variable declarations in sync", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Base URL of the definition catalog
    #[arg(long, global = true, env = "CAIRN_CATALOG_URL")]
    catalog_url: Option<String>,

    /// Bearer token for the definition catalog
    #[arg(long, global = true, env = "CAIRN_CATALOG_TOKEN", hide_env_values = true)]
    catalog_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve schemas, write schema files and export missing declarations
    Build {
        /// Bundle path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Prefix for generated `$id` values
        #[arg(long, default_value = DEFAULT_ID_BASE)]
        id_base: String,
    },

    /// Merge variables declared by IaC steps back into bundle.yaml
    Import {
        /// Bundle path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Add every discovered parameter without asking
        #[arg(long)]
        skip_verify: bool,

        /// Print the updated manifest instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Lint a bundle
    Lint {
        /// Bundle path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build { path, id_base } => {
            let config = resolver_config(cli.catalog_url, cli.catalog_token)?;
            commands::build::run(&path, &id_base, &config)
        }

        Commands::Import {
            path,
            skip_verify,
            dry_run,
        } => commands::import::run(&path, skip_verify, dry_run),

        Commands::Lint { path, strict } => commands::lint::run(&path, strict),
    }
}

/// `CAIRN_LOG` controls the filter; `--debug` forces debug level
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("CAIRN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file values, overridden by flags and environment
fn resolver_config(catalog_url: Option<String>, catalog_token: Option<String>) -> Result<ResolverConfig> {
    let config = ResolverConfig::load()?.with_overrides(catalog_url, catalog_token);
    config.validate()?;
    Ok(config)
}
