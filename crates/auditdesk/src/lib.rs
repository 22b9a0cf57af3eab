//! `auditdesk` - client-side core of an audit and compliance management application
//!
//! This library searches the audits, findings, organizations and projects
//! served by the audit management REST API, buckets findings into a daily
//! severity trend, and manages organizations.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod client;
pub mod config;
pub mod debounce;
pub mod entity;
pub mod error;
pub mod logging;
pub mod search;
pub mod source;
pub mod state;
pub mod trend;

pub use client::ApiClient;
pub use config::Config;
pub use debounce::{Debouncer, SearchOutcome, SearchSession};
pub use entity::{
    Audit, EntityKind, Finding, Organization, OrganizationInput, Project, Searchable,
};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use search::{search, SearchAggregator, SearchOptions, SearchResult};
pub use source::{Collections, EntitySource, StaticSource};
pub use state::{ConfirmDialog, Theme, ThemeState};
pub use trend::{bucketize, bucketize_with, TrendBucket, TrendEvent, TrendOptions};
