/*!
 * Content source implementations.
 *
 * This module contains client implementations for content sources:
 * - Reddit: public JSON API client
 * - Mock: in-memory source for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::content::{CandidateNode, ContentUnit, ListingScope, PaginationMarker, Thread};
use crate::errors::SourceError;

/// Common trait for all content sources
///
/// A source hands back candidate material three ways: a full thread with
/// its reply tree, a flat listing of thread-level units, and on-demand
/// expansion of pagination markers found inside a tree. Failures are
/// distinguished errors, never empty results.
#[async_trait]
pub trait ContentSource: Send + Sync + Debug {
    /// Fetch a single thread with its reply tree
    async fn fetch_thread(&self, thread_id: &str) -> Result<Thread, SourceError>;

    /// Fetch a flat listing of thread-level candidates for a scope
    async fn fetch_listing(&self, scope: &ListingScope)
        -> Result<Vec<ContentUnit>, SourceError>;

    /// Expand a pagination marker into the nodes it hides
    async fn expand_more(&self, marker: &PaginationMarker)
        -> Result<Vec<CandidateNode>, SourceError>;
}

pub mod mock;
pub mod reddit;
