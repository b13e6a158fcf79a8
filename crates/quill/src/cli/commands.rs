//! CLI command definitions.

use clap::{Parser, Subcommand};
use quill::{IdeaField, IdeaSelection, IdeaStrategy};
use std::path::PathBuf;

/// quill - novel-writing assistant for local LLM servers
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Novel-writing assistant for local LLM servers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Settings file to use instead of the standard locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the assembled prompt for a context file
    Prompt {
        /// Path to the context TOML file
        #[arg(long)]
        context: PathBuf,

        /// Build an idea prompt for this field (or "all")
        #[arg(long)]
        idea: Option<IdeaSelection>,

        /// Use the fast idea strategy
        #[arg(long)]
        fast: bool,
    },

    /// Stream a story generation to stdout
    Generate {
        /// Path to the context TOML file
        #[arg(long)]
        context: PathBuf,

        /// Repeat N times (0 = until Ctrl-C)
        #[arg(long)]
        repeat: Option<usize>,
    },

    /// Generate idea output for one field or all of them
    Idea {
        /// Path to the context TOML file
        #[arg(long)]
        context: PathBuf,

        /// Field to generate (key or Japanese label), or "all"
        #[arg(long)]
        field: IdeaSelection,

        /// safe (collect and filter) or fast (suffix and stream)
        #[arg(long, default_value = "safe")]
        strategy: IdeaStrategy,

        /// Repeat N times (0 = until Ctrl-C)
        #[arg(long)]
        repeat: Option<usize>,
    },

    /// Evaluate {a|b} dynamic prompt expressions
    Eval {
        /// Text to evaluate
        text: String,

        /// Number of evaluations to print
        #[arg(long, default_value_t = 1)]
        times: usize,
    },

    /// Extract one field's value from idea output
    Extract {
        /// Field to extract
        #[arg(long)]
        field: IdeaField,

        /// File holding the output (stdin when omitted)
        input: Option<PathBuf>,

        /// Context file to store the extracted value in
        #[arg(long)]
        context: Option<PathBuf>,
    },

    /// Settings management
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Check that the configured server is reachable
    Health,
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the effective settings as TOML
    Show,

    /// Write a settings file with the defaults
    Init {
        /// Destination (defaults to ~/.config/quill/quill.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
