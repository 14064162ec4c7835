use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod command;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Handshake {
            consumers,
            use_async,
            session,
        }) => {
            command::run_handshake(consumers, use_async, session).await?;
        }
        Some(Commands::Suite { name, session }) => {
            command::run_smoke_suite(name, session).await?;
        }
        None => {
            // No command specified, show help
            eprintln!("No command specified. Use --help for usage information.");
            eprintln!("Use 'readygate handshake' or 'readygate suite' to run a session.");
        }
    }

    Ok(())
}
