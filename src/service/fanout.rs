//! Sharded retrieval.
//!
//! `FanOut` evaluates one query on every shard concurrently and merges the
//! weight-sorted candidate lists into a single list, as if one service had
//! answered. A failing shard fails the whole evaluation; no partial result
//! is produced. Dropping the evaluation future aborts the outstanding shard
//! calls.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::model::{Candidate, Term};
use crate::query::Query;
use crate::{Error, Result};
use super::RetrievalService;

/// A `RetrievalService` spread over independent shards.
pub struct FanOut<S: RetrievalService> {
    shards: Vec<Arc<S>>,
}

impl<S: RetrievalService> FanOut<S> {
    pub fn new(shards: Vec<S>) -> Result<Self> {
        Self::from_shared(shards.into_iter().map(Arc::new).collect())
    }

    pub fn from_shared(shards: Vec<Arc<S>>) -> Result<Self> {
        if shards.is_empty() {
            return Err(Error::Config("fan-out needs at least one shard".into()));
        }
        Ok(Self { shards })
    }

    pub fn shards(&self) -> &[Arc<S>] {
        &self.shards
    }
}

#[async_trait]
impl<S: RetrievalService> RetrievalService for FanOut<S> {
    /// Shards share one analyzer configuration; the first one answers.
    async fn analyze(&self, phrase_type: &str, text: &str) -> Result<Vec<Term>> {
        self.shards[0].analyze(phrase_type, text).await
    }

    async fn evaluate(&self, query: &Query) -> Result<Vec<Candidate>> {
        let limit = query.min_rank.saturating_add(query.max_candidates);
        let shard_query = Arc::new(Query {
            min_rank: 0,
            max_candidates: limit,
            ..query.clone()
        });

        let mut tasks = JoinSet::new();
        for (shard, service) in self.shards.iter().enumerate() {
            let service = Arc::clone(service);
            let shard_query = Arc::clone(&shard_query);
            tasks.spawn(async move { (shard, service.evaluate(&shard_query).await) });
        }

        let mut lists = vec![Vec::new(); self.shards.len()];
        while let Some(joined) = tasks.join_next().await {
            let (shard, result) = joined.map_err(|e| Error::Shard(e.to_string()))?;
            match result {
                Ok(candidates) => {
                    debug!(shard, candidates = candidates.len(), "shard answered");
                    lists[shard] = candidates;
                }
                Err(e) => {
                    warn!(shard, error = %e, "shard evaluation failed");
                    return Err(e);
                }
            }
        }

        let mut merged = merge_candidates(lists, limit);
        merged.drain(..query.min_rank.min(merged.len()));
        Ok(merged)
    }
}

// ============================================================================
// k-way merge
// ============================================================================

/// Head of one shard's list inside the merge heap.
struct Head {
    weight: f64,
    shard: usize,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl Ord for Head {
    // Max-heap: heavier first, lower shard first among equal weights.
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| other.shard.cmp(&self.shard))
    }
}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Merge candidate lists, each sorted by descending weight, into one list
/// of at most `limit` candidates in descending weight order.
///
/// Equal weights from different lists are emitted in list order, so no list
/// is advanced past a tie before the others have emitted their tied items.
pub fn merge_candidates(lists: Vec<Vec<Candidate>>, limit: usize) -> Vec<Candidate> {
    let mut sources: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    let mut pending: Vec<Option<Candidate>> = Vec::with_capacity(sources.len());
    let mut heap = BinaryHeap::with_capacity(sources.len());

    for (shard, source) in sources.iter_mut().enumerate() {
        let next = source.next();
        if let Some(candidate) = &next {
            heap.push(Head { weight: candidate.weight, shard });
        }
        pending.push(next);
    }

    let mut merged = Vec::new();
    while merged.len() < limit {
        let Some(Head { shard, .. }) = heap.pop() else {
            break;
        };
        if let Some(candidate) = pending[shard].take() {
            merged.push(candidate);
        }
        if let Some(candidate) = sources[shard].next() {
            heap.push(Head { weight: candidate.weight, shard });
            pending[shard] = Some(candidate);
        }
    }
    merged
}
