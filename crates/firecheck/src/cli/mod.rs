//! Command-line interface for firecheck.
//!
//! This module provides the CLI structure for the `firecheck` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddEquipment, CheckCommand, ConfigCommand, ConfirmCommand, EditEquipment, EquipmentCommand,
    FilterArg, ScanCommand, StatusCommand,
};

/// firecheck - Monthly fire extinguisher inspections
///
/// Keeps the fire extinguisher registry and records the two-stage monthly
/// inspection: an officer check followed by a technician confirmation.
#[derive(Debug, Parser)]
#[command(name = "firecheck")]
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
    /// Show this month's inspection progress
    Status(StatusCommand),

    /// Manage the fire extinguisher registry
    #[command(subcommand)]
    Equipment(EquipmentCommand),

    /// Show which inspection stage applies to a code
    Resolve {
        /// Code of the unit (as scanned or typed)
        code: String,
    },

    /// Scan a QR label and show which inspection stage applies
    Scan(ScanCommand),

    /// Record a stage 1 officer check
    Check(CheckCommand),

    /// Record a stage 2 technician confirmation
    Confirm(ConfirmCommand),

    /// Show the inspection history of a unit
    History {
        /// Code of the unit
        code: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
