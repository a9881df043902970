//! CLI module - argument parsing and subcommands

mod args;
mod commands;
pub mod import;

pub use args::{Cli, Commands, TrainingArgs};
pub use commands::{run, SAVED_MESSAGE};
