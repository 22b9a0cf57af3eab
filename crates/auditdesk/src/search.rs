//! Unified search across audits, findings, organizations and projects.
//!
//! A query is matched case-insensitively as a substring against a fixed set
//! of fields per entity kind. Hits are emitted block by block in the order
//! audits, findings, organizations, projects, each block keeping the order
//! the server returned, and the merged list is cut to the result budget.
//! There is no relevance ranking.
//!
//! [`search`] works on collections that are already in memory.
//! [`SearchAggregator`] fetches the four collections concurrently from an
//! [`EntitySource`] first, and fails as a whole if any fetch fails.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::entity::{EntityKind, Searchable};
use crate::error::Result;
use crate::source::{Collections, EntitySource};

/// Queries shorter than this (after trimming) return nothing.
pub const MIN_QUERY_LENGTH: usize = 2;

/// Maximum number of results returned by one search.
pub const MAX_RESULTS: usize = 10;

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Identifier within the collection named by `kind`.
    pub id: i64,
    /// Which collection the hit came from.
    pub kind: EntityKind,
    /// Primary display label.
    pub title: String,
    /// Secondary display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl SearchResult {
    /// Project a record into a search hit.
    #[must_use]
    pub fn from_entity<E: Searchable>(entity: &E) -> Self {
        Self {
            id: entity.id(),
            kind: E::KIND,
            title: entity.title().to_string(),
            subtitle: entity.subtitle().map(str::to_string),
        }
    }

    /// The `(kind, id)` pair identifying this hit.
    #[must_use]
    pub fn key(&self) -> (EntityKind, i64) {
        (self.kind, self.id)
    }
}

/// Limits applied to a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Minimum trimmed query length, in characters.
    pub min_query_length: usize,
    /// Maximum number of results.
    pub max_results: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_query_length: MIN_QUERY_LENGTH,
            max_results: MAX_RESULTS,
        }
    }
}

impl SearchOptions {
    /// Check whether a query is long enough to be searched.
    #[must_use]
    pub fn accepts(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.min_query_length
    }
}

/// Search in-memory collections with the default limits.
#[must_use]
pub fn search(query: &str, collections: &Collections) -> Vec<SearchResult> {
    search_with(query, collections, &SearchOptions::default())
}

/// Search in-memory collections.
///
/// Returns an empty list when the query is too short.
#[must_use]
pub fn search_with(
    query: &str,
    collections: &Collections,
    options: &SearchOptions,
) -> Vec<SearchResult> {
    if !options.accepts(query) {
        return Vec::new();
    }

    let needle = query.trim().to_lowercase();
    let mut seen = HashSet::new();

    let hits = matching(&collections.audits, &needle)
        .chain(matching(&collections.findings, &needle))
        .chain(matching(&collections.organizations, &needle))
        .chain(matching(&collections.projects, &needle))
        .filter(|hit| seen.insert(hit.key()))
        .take(options.max_results)
        .collect::<Vec<_>>();

    trace!(query = %needle, hits = hits.len(), "search complete");
    hits
}

fn matching<'a, E: Searchable>(
    records: &'a [E],
    needle: &'a str,
) -> impl Iterator<Item = SearchResult> + 'a {
    records
        .iter()
        .filter(move |record| matches(*record, needle))
        .map(SearchResult::from_entity)
}

fn matches<E: Searchable>(record: &E, needle: &str) -> bool {
    record
        .search_fields()
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Fetches the four collections and searches them.
#[derive(Debug)]
pub struct SearchAggregator<S> {
    source: S,
    options: SearchOptions,
}

impl<S: EntitySource> SearchAggregator<S> {
    /// Create an aggregator with the default limits.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_options(source, SearchOptions::default())
    }

    /// Create an aggregator with custom limits.
    #[must_use]
    pub fn with_options(source: S, options: SearchOptions) -> Self {
        Self { source, options }
    }

    /// The limits this aggregator applies.
    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// The underlying source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run a search.
    ///
    /// Short queries return an empty list without fetching anything.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error if any of the four collections cannot
    /// be listed. Results from the fetches that did succeed are discarded.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if !self.options.accepts(query) {
            trace!("query below minimum length, skipping fetch");
            return Ok(Vec::new());
        }

        let collections = self.fetch_all().await.inspect_err(|e| {
            warn!(error = %e, "search fan-out failed");
        })?;

        Ok(search_with(query, &collections, &self.options))
    }

    /// Fetch all four collections concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if any fetch fails.
    pub async fn fetch_all(&self) -> Result<Collections> {
        debug!("fetching audits, findings, organizations and projects");
        let (audits, findings, organizations, projects) = tokio::try_join!(
            self.source.list_audits(),
            self.source.list_findings(),
            self.source.list_organizations(),
            self.source.list_projects(),
        )?;

        debug!(
            audits = audits.len(),
            findings = findings.len(),
            organizations = organizations.len(),
            projects = projects.len(),
            "collections fetched"
        );

        Ok(Collections {
            audits,
            findings,
            organizations,
            projects,
        })
    }
}
