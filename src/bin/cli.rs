//! afisha-watch CLI
//!
//! Local and deployment entry point for the afisha watcher.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use afisha_watch::{
    config::{Config, EnvConfig},
    error::Result,
    fetch::HttpFetcher,
    notify::TelegramNotifier,
    pipeline::{self, Watcher},
    server,
};
use clap::{Parser, Subcommand};

/// afisha-watch - Theater afisha watcher
#[derive(Parser, Debug)]
#[command(name = "afisha-watch", version, about = "Theater afisha watcher")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the monitoring loop with the liveness endpoint
    Run,

    /// Run a single poll cycle and exit
    Check,

    /// Validate configuration files and environment
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Assemble the watcher with its production collaborators.
async fn build_watcher(config: &Config, env: &EnvConfig) -> Result<Watcher> {
    let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
    let store = Arc::new(pipeline::connect_store(&env.redis_url).await?);
    let notifier = Arc::new(TelegramNotifier::new(
        env.telegram_token.clone(),
        env.telegram_chat_id.clone(),
    ));
    Watcher::new(config, fetcher, store, notifier)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Validate => {
            log::info!("Validating configuration...");
            // config.validate() already passed above
            log::info!("✓ Config OK ({})", cli.config.display());
            match EnvConfig::from_env() {
                Ok(env) => {
                    log::info!(
                        "✓ Environment OK (chat id {}, store {})",
                        if env.telegram_chat_id.is_some() {
                            "set"
                        } else {
                            "NOT set"
                        },
                        env.redis_url
                    );
                }
                Err(e) => {
                    log::error!("Environment validation failed: {e}");
                    return Err(e);
                }
            }
            log::info!("All validations passed!");
        }

        Command::Check => {
            let env = EnvConfig::from_env()?;
            let watcher = build_watcher(&config, &env).await?;

            let outcome = watcher.run_cycle().await;
            log::info!(
                "Cycle finished: {} shows found{}, {} notified, {} failures",
                outcome.found,
                if outcome.from_fallback {
                    " (alternate page)"
                } else {
                    ""
                },
                outcome.notified,
                outcome.failures
            );
        }

        Command::Run => {
            let env = EnvConfig::from_env()?;
            let watcher = build_watcher(&config, &env).await?;

            let port = env.port;
            tokio::spawn(async move {
                if let Err(e) = server::serve_liveness(port).await {
                    log::error!("Liveness endpoint failed: {e}");
                }
            });

            let interval = Duration::from_secs(config.watcher.check_interval_secs);
            pipeline::run_monitor(&watcher, interval).await?;
        }
    }

    Ok(())
}
