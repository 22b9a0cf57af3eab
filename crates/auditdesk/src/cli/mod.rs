//! Command-line interface for auditdesk.
//!
//! This module provides the CLI structure for the `auditdesk` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AuditsCommand, ConfigCommand, OrgCommand, OrgFields, OutputFormat, SearchCommand, TrendCommand,
    WatchCommand,
};

/// auditdesk - Search and chart your audit workspace from the terminal
///
/// Talks to the audit management REST API to search across audits,
/// findings, organizations and projects, and to chart the daily findings
/// trend.
#[derive(Debug, Parser)]
#[command(name = "auditdesk")]
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
    /// Search audits, findings, organizations and projects
    Search(SearchCommand),

    /// Search interactively, one query per input line
    Watch(WatchCommand),

    /// Show the daily findings trend
    Trend(TrendCommand),

    /// List audits, optionally for one project
    Audits(AuditsCommand),

    /// Manage organizations
    #[command(subcommand)]
    Org(OrgCommand),

    /// View or check configuration
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
