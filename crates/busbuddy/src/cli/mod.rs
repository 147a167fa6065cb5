//! Command-line interface for busbuddy.
//!
//! This module provides the CLI structure for the `busbuddy` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DemoCommand, InteractiveCommand, RoutesCommand, SchoolsCommand,
};

/// busbuddy - School bus tracking demo
///
/// Pick a role, log in with a school code, then follow a simulated bus on
/// its route and chat with the driver.
#[derive(Debug, Parser)]
#[command(name = "busbuddy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive session
    Shell(InteractiveCommand),

    /// Run a scripted end-to-end session
    Demo(DemoCommand),

    /// Inspect or reset the schools registry
    #[command(subcommand)]
    Schools(SchoolsCommand),

    /// Add or remove routes
    #[command(subcommand)]
    Routes(RoutesCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
