//! Command-line interface definition for Kimi Agent
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the HTTP API and for driving single
//! turns, uploads, and session housekeeping from the terminal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kimi Agent - chat agent with web search, documents, and memory
#[derive(Parser, Debug, Clone)]
#[command(name = "kimi-agent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the transcript directory
    #[arg(long)]
    pub memory_dir: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Kimi Agent
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Socket address to bind (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Send one message and print the reply
    Chat {
        /// Session to continue; a new one is created when omitted
        #[arg(short, long)]
        session: Option<String>,

        /// Never augment this message with web search results
        #[arg(long)]
        no_search: bool,

        /// The message to send
        message: String,
    },

    /// Upload a document and print its summary
    Upload {
        /// Session to attach the document to
        #[arg(short, long)]
        session: String,

        /// Path of the document (.pdf, .docx, .txt, .md, .csv)
        path: PathBuf,
    },

    /// Print the transcript of a session
    History {
        /// Session to inspect
        #[arg(short, long)]
        session: String,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Delete a session and its stored transcript
    Delete {
        /// Session to delete
        #[arg(short, long)]
        session: String,
    },

    /// Print a fresh session identifier
    NewSession,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            memory_dir: None,
            command: Commands::NewSession,
        }
    }
}
