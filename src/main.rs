//! Kimi Agent - chat agent CLI and HTTP server
//!
#![doc = "Kimi Agent - chat agent CLI and HTTP server"]
#![doc = "Main entry point for the Kimi Agent application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kimi_agent::cli::{Cli, Commands};
use kimi_agent::commands;
use kimi_agent::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Execute command
    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!("Starting HTTP server");
            commands::serve::run_serve(config, bind).await?;
            Ok(())
        }
        Commands::Chat {
            session,
            no_search,
            message,
        } => {
            tracing::debug!("Running single chat turn");
            commands::chat::run_chat(config, session, message, !no_search).await?;
            Ok(())
        }
        Commands::Upload { session, path } => {
            tracing::debug!("Uploading document: {}", path.display());
            commands::upload::run_upload(config, session, &path).await?;
            Ok(())
        }
        Commands::History { session, json } => {
            commands::history::show_history(config, session, json).await?;
            Ok(())
        }
        Commands::Delete { session } => {
            commands::history::delete_session(config, session).await?;
            Ok(())
        }
        Commands::NewSession => {
            commands::history::new_session()?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "kimi_agent=debug"
    } else {
        "kimi_agent=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
