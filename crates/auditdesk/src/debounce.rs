//! Debounced, last-query-wins search sessions.
//!
//! Interactive search fires on every keystroke. [`Debouncer`] collapses a
//! burst of triggers into one action that runs once input has been quiet for
//! the configured delay. [`SearchSession`] stamps each query it issues with
//! an increasing sequence number and only publishes a result set if no newer
//! query has been issued in the meantime. In-flight requests are not
//! cancelled; their results are dropped on arrival.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::search::{SearchAggregator, SearchResult};
use crate::source::EntitySource;

/// Default quiet period before a search is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A cancellable one-shot timer.
///
/// Each [`trigger`](Self::trigger) replaces the pending action. Only the
/// wait is cancelled: once the delay has elapsed the action runs on its own
/// task and a later trigger no longer affects it.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    triggered: AtomicU64,
    pending: Mutex<Option<Pending>>,
}

#[derive(Debug)]
struct Pending {
    id: u64,
    timer: JoinHandle<()>,
    // Flips to `true` once the action has finished. Closed without a value
    // when the timer is aborted before the action starts.
    done: watch::Receiver<bool>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            triggered: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    /// The quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn slot(&self) -> MutexGuard<'_, Option<Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule `action` to run after the quiet period, replacing any
    /// action still waiting.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn trigger<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let (finished, done) = watch::channel(false);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(async move {
                action.await;
                finished.send_replace(true);
            });
        });

        let id = self.triggered.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.slot().replace(Pending { id, timer, done });
        if let Some(previous) = previous {
            previous.timer.abort();
        }
    }

    /// Drop the pending action, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.slot().take() {
            previous.timer.abort();
        }
    }

    /// Wait until the most recent action, if any, has run to completion.
    ///
    /// Returns immediately when nothing is pending. A cancelled action
    /// counts as complete. Triggers that arrive while waiting still replace
    /// the pending action, and the wait then follows the replacement.
    pub async fn flush(&self) {
        loop {
            let waiting = self.slot().as_ref().map(|p| (p.id, p.done.clone()));
            let Some((id, mut done)) = waiting else {
                return;
            };

            // An error means the action never started.
            let _ = done.wait_for(|finished| *finished).await;

            let replaced = self.slot().as_ref().is_some_and(|p| p.id != id);
            if !replaced {
                return;
            }
        }
    }

    /// Check whether an action is still waiting for the quiet period.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|p| !p.timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A result set published by a [`SearchSession`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    /// Sequence number of the query that produced this outcome.
    pub seq: u64,
    /// The query as submitted.
    pub query: String,
    /// Hits; empty on failure or for short queries.
    pub results: Vec<SearchResult>,
    /// Display message when the search failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchOutcome {
    /// Check whether the search behind this outcome failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug)]
struct SessionInner<S> {
    aggregator: SearchAggregator<S>,
    issued: AtomicU64,
    published: watch::Sender<SearchOutcome>,
}

impl<S: EntitySource> SessionInner<S> {
    fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn run(&self, query: String) -> Option<SearchOutcome> {
        let seq = self.next_seq();
        trace!(seq, query = %query, "search issued");

        let outcome = match self.aggregator.search(&query).await {
            Ok(results) => SearchOutcome {
                seq,
                query,
                results,
                error: None,
            },
            Err(e) => SearchOutcome {
                seq,
                query,
                results: Vec::new(),
                error: Some(e.to_string()),
            },
        };

        self.publish(outcome)
    }

    fn clear(&self, query: String) {
        let seq = self.next_seq();
        self.publish(SearchOutcome {
            seq,
            query,
            ..SearchOutcome::default()
        });
    }

    fn publish(&self, outcome: SearchOutcome) -> Option<SearchOutcome> {
        let latest = self.issued.load(Ordering::SeqCst);
        let published = self.published.send_if_modified(|current| {
            if outcome.seq == latest && outcome.seq > current.seq {
                *current = outcome.clone();
                true
            } else {
                false
            }
        });

        if published {
            Some(outcome)
        } else {
            debug!(seq = outcome.seq, latest, "discarding superseded search results");
            None
        }
    }
}

/// An interactive search over one [`EntitySource`].
///
/// The latest published outcome is available through
/// [`subscribe`](Self::subscribe) or [`latest`](Self::latest).
#[derive(Debug)]
pub struct SearchSession<S> {
    inner: Arc<SessionInner<S>>,
    debouncer: Debouncer,
}

impl<S: EntitySource + 'static> SearchSession<S> {
    /// Create a session with the given quiet period.
    #[must_use]
    pub fn new(aggregator: SearchAggregator<S>, debounce: Duration) -> Self {
        let (published, _) = watch::channel(SearchOutcome::default());
        Self {
            inner: Arc::new(SessionInner {
                aggregator,
                issued: AtomicU64::new(0),
                published,
            }),
            debouncer: Debouncer::new(debounce),
        }
    }

    /// Watch published outcomes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchOutcome> {
        self.inner.published.subscribe()
    }

    /// The most recently published outcome.
    #[must_use]
    pub fn latest(&self) -> SearchOutcome {
        self.inner.published.borrow().clone()
    }

    /// Feed a new input value.
    ///
    /// Short queries clear the results immediately and issue no request.
    /// Anything else is searched once input has been quiet for the session's
    /// debounce period.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn input(&self, query: impl Into<String>) {
        let query = query.into();
        if !self.inner.aggregator.options().accepts(&query) {
            self.debouncer.cancel();
            self.inner.clear(query);
            return;
        }

        let inner = Arc::clone(&self.inner);
        self.debouncer.trigger(async move {
            inner.run(query).await;
        });
    }

    /// Wait for a debounced search that is still pending or in flight.
    pub async fn flush(&self) {
        self.debouncer.flush().await;
    }

    /// Search immediately, without debouncing.
    ///
    /// Returns the outcome if it was published, or `None` when a newer query
    /// superseded it while it was in flight.
    pub async fn submit(&self, query: impl Into<String>) -> Option<SearchOutcome> {
        let query = query.into();
        if !self.inner.aggregator.options().accepts(&query) {
            self.debouncer.cancel();
            self.inner.clear(query);
            return Some(self.latest());
        }
        self.inner.run(query).await
    }
}
