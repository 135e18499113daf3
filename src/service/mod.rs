//! # Retrieval Service Trait
//!
//! The contract between the link-ranking core and whatever answers its
//! queries. The analyzer, the storage engine, the document weighting and
//! the transport all live behind it.
//!
//! ## Implementations
//!
//! | Service | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryRetrieval` | `memory` | In-memory documents for testing/embedding |
//! | `FanOut` | `fanout` | Concurrent evaluation over N shards, merged by weight |

pub mod memory;
pub mod fanout;

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{Candidate, Term};
use crate::query::Query;
use crate::Result;

pub use fanout::{merge_candidates, FanOut};
pub use memory::MemoryRetrieval;

// ============================================================================
// RetrievalService Trait
// ============================================================================

/// The external retrieval contract.
///
/// Failures are opaque to the core: whatever error a service returns is
/// handed to the caller unchanged.
#[async_trait]
pub trait RetrievalService: Send + Sync + 'static {
    /// Analyze `text` as a phrase of `phrase_type`. May yield zero terms.
    async fn analyze(&self, phrase_type: &str, text: &str) -> Result<Vec<Term>>;

    /// Evaluate a query, returning candidates ordered by descending weight.
    ///
    /// Each candidate carries the `LINK` summary elements bound by the
    /// query's capturing expressions.
    async fn evaluate(&self, query: &Query) -> Result<Vec<Candidate>>;
}

#[async_trait]
impl<S: RetrievalService + ?Sized> RetrievalService for Arc<S> {
    async fn analyze(&self, phrase_type: &str, text: &str) -> Result<Vec<Term>> {
        (**self).analyze(phrase_type, text).await
    }

    async fn evaluate(&self, query: &Query) -> Result<Vec<Candidate>> {
        (**self).evaluate(query).await
    }
}
