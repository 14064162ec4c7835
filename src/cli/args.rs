use clap::{Args, Parser, Subcommand};

/// readygate - drive a test session through its readiness handshake
#[derive(Parser)]
#[command(name = "readygate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags shared by every session-driving command
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Simulated environment load time in milliseconds
    #[arg(long)]
    pub load_delay_ms: Option<u64>,

    /// Give up waiting for the environment after this many milliseconds (0 waits forever)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a value after a delay and check every consumer sees it
    Handshake {
        /// Number of consumers (at least 2)
        #[arg(short = 'n', long, default_value_t = 3)]
        consumers: usize,

        /// Run consumers as tokio tasks instead of OS threads
        #[arg(long = "async")]
        use_async: bool,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Load the environment and run the built-in smoke cases against it
    Suite {
        /// Name of the environment to load
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        session: SessionArgs,
    },
}
