//! page-checker CLI
//!
//! Checks every configured page once and prints what changed. Meant to be run
//! from cron or a login shell.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use page_checker::{
    config,
    error::Result,
    pipeline::{self, RunOptions},
    storage::{LocalStateStore, StateStore},
    utils::http::HttpFetcher,
};

/// page-checker - Web Page Update Checker
#[derive(Parser, Debug)]
#[command(
    name = "page-checker",
    version,
    about = "Checks whether comics or similar occasionally-updated pages have updated"
)]

struct Cli {
    /// Directory containing config.toml (or config.json) and the state file
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check all configured pages
    Check {
        /// Only show pages that changed (and new errors)
        #[arg(short = 'c', long)]
        only_show_changes: bool,

        /// Don't write hash/timestamp data back to the state file
        #[arg(short = 'n', long)]
        dont_save_changes: bool,

        /// User agent to send instead of the configured one
        #[arg(short = 'A', long)]
        user_agent: Option<String>,
    },

    /// Validate configuration and state files
    Validate,

    /// Show stored state for each configured page
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let loaded = config::load_all(&cli.storage_dir)?;
    log::info!("Loaded configuration from {}", loaded.config_path.display());

    let store = LocalStateStore::new(&loaded.data_path);

    match cli.command {
        Command::Check {
            only_show_changes,
            dont_save_changes,
            user_agent,
        } => {
            let mut checker = loaded.config.checker.clone();
            if let Some(user_agent) = user_agent {
                checker.user_agent = user_agent;
            }

            let fetcher = HttpFetcher::from_config(&checker)?;
            let options = RunOptions {
                only_show_changes,
                save_changes: !dont_save_changes,
            };

            let report =
                pipeline::run_checks(&checker, &loaded.targets, &fetcher, &store, &options)
                    .await?;

            for result in report.visible() {
                println!("{result}");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!("✓ Config OK ({} targets)", loaded.targets.len());

            let states = store.load().await?;
            log::info!(
                "✓ State OK ({} records in {})",
                states.len(),
                loaded.data_path.display()
            );

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Config: {}", loaded.config_path.display());
            log::info!("State file: {}", loaded.data_path.display());

            let states = store.load().await?;
            for target in &loaded.targets {
                match states.get(&target.name) {
                    Some(state) => log::info!(
                        "{} ({}): last_modified={} hash={} last_error={}",
                        target.name,
                        target.url,
                        state.last_modified.as_deref().unwrap_or("-"),
                        state.hash.as_deref().unwrap_or("-"),
                        state.last_error
                    ),
                    None => log::info!("{} ({}): never checked", target.name, target.url),
                }
            }
        }
    }

    Ok(())
}
