//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the quill binary.

mod commands;
mod context;
mod generate;
mod tools;

pub use commands::{Cli, Commands, SettingsCommands};
pub use generate::{print_prompt, run_generation};
pub use tools::{evaluate_text, extract, handle_settings_command, health};
