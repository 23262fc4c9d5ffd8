use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "acmq")]
#[command(about = "Artemis broker provisioning CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a change request into the broker artifacts of a checkout
    Provision {
        /// Checkout root holding the ledger, variables and topology artifacts
        #[arg(long)]
        workspace: PathBuf,

        /// Request JSON file, or `-` for stdin
        #[arg(long)]
        request: String,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Print the plan without writing any file
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Fail instead of warn when the config carries keys nothing reads
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Print the users/queues/topics catalog of a checkout as JSON
    Catalog {
        #[arg(long)]
        workspace: PathBuf,

        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> override)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Check a resource name and print the identifiers derived from it
    ValidateName { name: String },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Load .env.local if present. Silent when absent; deployments inject env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Provision {
            workspace,
            request,
            config_paths,
            dry_run,
            strict_config,
        } => commands::provision::run_provision(workspace, &request, &config_paths, dry_run, strict_config)?,

        Commands::Catalog {
            workspace,
            config_paths,
        } => commands::catalog::run_catalog(workspace, &config_paths)?,

        Commands::ConfigHash { paths } => {
            let loaded = acmq_config::load_layered_yaml(&paths[..])?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::ValidateName { name } => commands::validate_name(&name)?,
    }

    Ok(())
}
