//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::entity::OrganizationInput;

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in audits, findings, organizations and projects
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Override the debounce period in milliseconds
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Trend command arguments.
#[derive(Debug, Args)]
pub struct TrendCommand {
    /// Number of most recent days to show
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Anchor day of the trend (defaults to today, UTC)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Audits command arguments.
#[derive(Debug, Args)]
pub struct AuditsCommand {
    /// Only list the audits of this project
    #[arg(short, long, value_name = "ID")]
    pub project: Option<i64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Organization commands.
#[derive(Debug, Subcommand)]
pub enum OrgCommand {
    /// List organizations
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Create an organization
    Create(OrgFields),

    /// Update an organization
    Update {
        /// Organization to update
        id: i64,

        #[command(flatten)]
        fields: OrgFields,
    },

    /// Delete an organization after confirmation
    Delete {
        /// Organization to delete
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Editable organization fields.
#[derive(Debug, Args)]
pub struct OrgFields {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,

    /// Logo URL
    #[arg(long, value_name = "URL")]
    pub logo_url: Option<String>,
}

impl From<OrgFields> for OrganizationInput {
    fn from(fields: OrgFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            logo_url: fields.logo_url,
        }
    }
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
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
