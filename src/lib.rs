//! # linkrank: Proximity-based Link Ranking
//!
//! Ranks cross-reference targets ("links") for a free-text query. The query
//! terms become tiered proximity expressions that capture link mentions
//! near the matched terms; a retrieval service evaluates them; the captured
//! mentions are summed per link and the requested page is cut from a
//! bounded top-K tree.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `RetrievalService` is the contract between the core
//!    and the analyzer/storage/weighting stack
//! 2. **Pure stages**: building, accumulating and selecting are plain
//!    functions with no I/O
//! 3. **Fresh per query**: nothing is retained between evaluations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use linkrank::{LinkRanker, ResultWindow, SummaryElement};
//!
//! # async fn example() -> linkrank::Result<()> {
//! let ranker = LinkRanker::open_memory();
//! ranker.service().add_document(2.0, "the river delta", [SummaryElement::link("Nile", 1.5)]);
//!
//! let ranking = ranker.rank_links("river delta", ResultWindow::first(10)).await?;
//! for link in &ranking.links {
//!     println!("{} {:.3}", link.id, link.weight);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Entry point |
//! |-------|--------|-------------|
//! | Build | `query` | [`build_link_query`] |
//! | Evaluate | `service` | [`RetrievalService::evaluate`] |
//! | Accumulate | `rank` | [`accumulate_link_scores`] |
//! | Select | `rank` | [`select_top_links`] |

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod model;
pub mod query;
pub mod rank;
pub mod execution;
pub mod service;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{Bm25Params, LinkQueryConfig, TierRanges, TierWeights};
pub use model::{Candidate, DocNo, Link, ResultWindow, SummaryElement, Term};
pub use query::{
    build_link_query, Boundary, FeatureSet, ProximityExpr, Query, SelectionFeature, Tier,
    WeightedExpr,
};
pub use rank::{
    accumulate_link_scores, accumulate_with_stats, select_top_links, AccumulationStats,
    BoundedTopK, LinkScoreMap,
};
pub use execution::{EvaluationStats, LinkRanking};
pub use service::{merge_candidates, FanOut, MemoryRetrieval, RetrievalService};

// ============================================================================
// Top-level LinkRanker handle
// ============================================================================

/// The primary entry point. A `LinkRanker` wraps a retrieval service and
/// answers link queries against it.
pub struct LinkRanker<S: RetrievalService> {
    service: S,
    config: LinkQueryConfig,
}

impl<S: RetrievalService> LinkRanker<S> {
    /// Create a ranker with the default configuration.
    pub fn with_service(service: S) -> Self {
        Self {
            service,
            config: LinkQueryConfig::default(),
        }
    }

    /// Create a ranker with a validated configuration.
    pub fn with_config(service: S, config: LinkQueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { service, config })
    }

    /// Analyze `text` and rank the links for `window`.
    #[tracing::instrument(skip(self), fields(min_rank = window.min_rank, count = window.count))]
    pub async fn rank_links(&self, text: &str, window: ResultWindow) -> Result<LinkRanking> {
        let terms = self.service.analyze(&self.config.phrase_type, text).await?;
        execution::execute(&self.service, &terms, window, &self.config).await
    }

    /// Rank the links for already analyzed terms.
    pub async fn rank_terms(&self, terms: &[Term], window: ResultWindow) -> Result<LinkRanking> {
        execution::execute(&self.service, terms, window, &self.config).await
    }

    /// The query `rank_terms` would send for `terms`.
    pub fn build_query(&self, terms: &[Term]) -> Query {
        Query::new(build_link_query(terms, &self.config), &self.config)
    }

    pub fn config(&self) -> &LinkQueryConfig {
        &self.config
    }

    /// Access the underlying service (for advanced use).
    pub fn service(&self) -> &S {
        &self.service
    }
}

/// In-memory ranker for testing and embedding.
impl LinkRanker<MemoryRetrieval> {
    pub fn open_memory() -> Self {
        Self::with_service(MemoryRetrieval::new())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Retrieval service error: {0}")]
    Service(String),

    #[error("Retrieval timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Shard task failed: {0}")]
    Shard(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
