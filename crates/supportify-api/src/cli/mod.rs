//! CLI command definitions for the `supportify` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod history;

use clap::{Parser, Subcommand, ValueEnum};

/// Relay support conversations to an external chat-completion service.
#[derive(Parser)]
#[command(name = "supportify", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Where structured conversation events are written.
    #[arg(long, value_enum, global = true)]
    pub log_sink: Option<LogSinkKind>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogSinkKind {
    /// One formatted line per event on stdout.
    Line,
    /// Forward events to the tracing subscriber.
    Tracing,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Host to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(long)]
        port: Option<u16>,

        /// Keep conversations in memory instead of SQLite.
        #[arg(long)]
        memory: bool,
    },

    /// Send one chat turn and print the assistant reply.
    Chat {
        #[arg(long)]
        user: String,

        #[arg(long)]
        agent: String,

        #[arg(long)]
        org: String,

        /// Message content.
        content: String,
    },

    /// Show (or clear) stored conversation history for a user.
    History {
        #[arg(long)]
        user: String,

        #[arg(long)]
        agent: Option<String>,

        #[arg(long)]
        org: Option<String>,

        /// Delete the matching messages instead of listing them.
        #[arg(long)]
        clear: bool,
    },
}

impl Commands {
    /// Commands that run a long-lived server log events as lines by default.
    pub fn default_log_sink(&self) -> LogSinkKind {
        match self {
            Commands::Serve { .. } => LogSinkKind::Line,
            _ => LogSinkKind::Tracing,
        }
    }
}
