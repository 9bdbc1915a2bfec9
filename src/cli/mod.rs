//! CLI module for Lectern.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Lectern - Lecture Transcription Backend
///
/// Stores lecture transcriptions and generates study material from them.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check credentials and configuration
    Doctor,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Transcribe a local audio file
    Transcribe {
        /// Path to the audio file
        file: String,

        /// Store the transcription as a new lecture for this user
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Create a lecture from text
    Create {
        /// Owning user id
        #[arg(short, long)]
        user: String,

        /// Transcription text
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the transcription from a file
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Generate breakdown, steps, mind map and summary for a lecture
    Process {
        /// Lecture id
        id: String,
    },

    /// List lectures, newest first
    List {
        /// Only show lectures for this user
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show a lecture with its generated material
    Show {
        /// Lecture id
        id: String,
    },

    /// Delete a lecture
    Delete {
        /// Lecture id
        id: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}
