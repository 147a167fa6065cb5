//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Interactive shell arguments.
#[derive(Debug, Args)]
pub struct InteractiveCommand {
    /// Do not redraw the screen after every command
    #[arg(long)]
    pub no_redraw: bool,
}

/// Scripted demo arguments.
#[derive(Debug, Args)]
pub struct DemoCommand {
    /// Number of location ticks to wait for while the shift is live
    #[arg(short, long, default_value = "3")]
    pub ticks: u32,
}

/// Schools registry commands.
#[derive(Debug, Subcommand)]
pub enum SchoolsCommand {
    /// List every school and its routes
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Replace the stored registry with the built-in schools
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Route editing commands.
#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// Add a route to a school
    Add {
        /// School access code
        code: String,
        /// Route name
        name: String,
    },

    /// Remove every route with this name from a school
    Remove {
        /// School access code
        code: String,
        /// Route name
        name: String,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schools_command_debug() {
        let cmd = SchoolsCommand::List { json: true };
        let debug = format!("{cmd:?}");
        assert!(debug.contains("List"));
    }

    #[test]
    fn test_routes_command_debug() {
        let cmd = RoutesCommand::Add {
            code: "SEL999".to_string(),
            name: "Night Owl".to_string(),
        };
        let debug = format!("{cmd:?}");
        assert!(debug.contains("SEL999"));
        assert!(debug.contains("Night Owl"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Validate { file: None };
        assert!(format!("{cmd:?}").contains("Validate"));
    }
}
