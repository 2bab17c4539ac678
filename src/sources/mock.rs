/*!
 * Mock content source for testing.
 *
 * Serves prebuilt threads and listings from memory and records how often
 * each endpoint was hit, so tests can assert on traversal and widening
 * behavior without a network.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::content::{CandidateNode, ContentUnit, ListingScope, PaginationMarker, Thread};
use crate::errors::SourceError;
use crate::sources::ContentSource;

/// In-memory content source
#[derive(Debug, Default)]
pub struct MockSource {
    threads: Mutex<HashMap<String, Thread>>,
    listings: Mutex<HashMap<String, Vec<ContentUnit>>>,
    expansions: Mutex<HashMap<String, Vec<CandidateNode>>>,
    /// When set, every call fails with this error constructor
    failing: Option<fn() -> SourceError>,
    listing_calls: AtomicUsize,
    thread_calls: AtomicUsize,
    expand_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every call fails with a transient error
    pub fn failing_transient() -> Self {
        MockSource {
            failing: Some(|| SourceError::Transient("mock outage".into())),
            ..Self::default()
        }
    }

    /// A source whose every call fails with a not-found error
    pub fn failing_not_found() -> Self {
        MockSource {
            failing: Some(|| SourceError::NotFound("mock".into())),
            ..Self::default()
        }
    }

    /// Register a thread under its post id
    pub fn with_thread(self, thread: Thread) -> Self {
        self.threads.lock().insert(thread.post.id.clone(), thread);
        self
    }

    /// Register a listing for a scope
    pub fn with_listing(self, scope: &ListingScope, units: Vec<ContentUnit>) -> Self {
        self.listings.lock().insert(scope.to_string(), units);
        self
    }

    /// Register an expansion for a pagination marker id
    pub fn with_expansion(self, marker_id: &str, nodes: Vec<CandidateNode>) -> Self {
        self.expansions.lock().insert(marker_id.to_string(), nodes);
        self
    }

    /// Number of listing fetches made so far
    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    /// Number of thread fetches made so far
    pub fn thread_calls(&self) -> usize {
        self.thread_calls.load(Ordering::SeqCst)
    }

    /// Number of pagination expansions made so far
    pub fn expand_calls(&self) -> usize {
        self.expand_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn fetch_thread(&self, thread_id: &str) -> Result<Thread, SourceError> {
        self.thread_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = self.failing {
            return Err(make_error());
        }
        self.threads
            .lock()
            .get(thread_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(thread_id.to_string()))
    }

    async fn fetch_listing(
        &self,
        scope: &ListingScope,
    ) -> Result<Vec<ContentUnit>, SourceError> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = self.failing {
            return Err(make_error());
        }
        Ok(self
            .listings
            .lock()
            .get(&scope.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn expand_more(
        &self,
        marker: &PaginationMarker,
    ) -> Result<Vec<CandidateNode>, SourceError> {
        self.expand_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = self.failing {
            return Err(make_error());
        }
        Ok(self
            .expansions
            .lock()
            .get(&marker.id)
            .cloned()
            .unwrap_or_default())
    }
}
