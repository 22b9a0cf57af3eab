//! Sources of entity collections.
//!
//! The search aggregator and the trend view never talk to the network
//! directly; they go through an [`EntitySource`], which the REST client
//! implements and tests replace with a [`StaticSource`].

use crate::entity::{Audit, Finding, Organization, Project};
use crate::error::Result;

/// Read-only listing operations over the four entity collections.
///
/// Each call returns the complete collection. Failures are reported as
/// [`crate::Error`]; callers decide whether a failure is fatal.
#[async_trait::async_trait]
pub trait EntitySource: Send + Sync {
    /// List all audits.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be fetched or decoded.
    async fn list_audits(&self) -> Result<Vec<Audit>>;

    /// List all findings.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be fetched or decoded.
    async fn list_findings(&self) -> Result<Vec<Finding>>;

    /// List all organizations.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be fetched or decoded.
    async fn list_organizations(&self) -> Result<Vec<Organization>>;

    /// List all projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be fetched or decoded.
    async fn list_projects(&self) -> Result<Vec<Project>>;
}

#[async_trait::async_trait]
impl<T: EntitySource + ?Sized> EntitySource for std::sync::Arc<T> {
    async fn list_audits(&self) -> Result<Vec<Audit>> {
        (**self).list_audits().await
    }

    async fn list_findings(&self) -> Result<Vec<Finding>> {
        (**self).list_findings().await
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        (**self).list_organizations().await
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        (**self).list_projects().await
    }
}

/// The four collections, already fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collections {
    /// All audits.
    pub audits: Vec<Audit>,
    /// All findings.
    pub findings: Vec<Finding>,
    /// All organizations.
    pub organizations: Vec<Organization>,
    /// All projects.
    pub projects: Vec<Project>,
}

/// An in-memory source serving fixed collections.
///
/// Counts how many listing calls it has served so callers can assert that
/// no fetch happened.
#[derive(Debug, Default)]
pub struct StaticSource {
    collections: Collections,
    calls: std::sync::atomic::AtomicUsize,
}

impl StaticSource {
    /// Create a source serving the given collections.
    #[must_use]
    pub fn new(collections: Collections) -> Self {
        Self {
            collections,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of listing calls served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl EntitySource for StaticSource {
    async fn list_audits(&self) -> Result<Vec<Audit>> {
        self.record_call();
        Ok(self.collections.audits.clone())
    }

    async fn list_findings(&self) -> Result<Vec<Finding>> {
        self.record_call();
        Ok(self.collections.findings.clone())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.record_call();
        Ok(self.collections.organizations.clone())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.record_call();
        Ok(self.collections.projects.clone())
    }
}
