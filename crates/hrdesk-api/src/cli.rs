//! CLI argument definitions for the `hrdesk` binary.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "hrdesk",
    about = "Conversational HR assistant engine",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of styled output.
    #[arg(long, global = true)]
    pub json: bool,

    /// Bridge tracing spans to OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,
    },

    /// Ask a single question from the command line.
    Ask {
        /// The question to answer.
        question: String,

        /// Session identifier to continue; a fixed CLI session otherwise.
        #[arg(long)]
        session: Option<String>,
    },

    /// Show engine status: data directory, sessions, corpus size.
    Status,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
