//! In-memory retrieval service.
//!
//! This is the reference implementation of `RetrievalService`.
//! Documents live in a `Vec` behind a `RwLock`.
//!
//! ## Limitations
//!
//! - **No proximity matching**: documents are stored with the link mentions
//!   they yield, and those are returned whenever the document passes the
//!   selection gate. The proximity expressions are not interpreted.
//! - **Static weights**: a candidate's weight is the weight the document was
//!   stored with; BM25 and metadata weighting are not computed.
//! - **Naive analyzer**: lowercases and splits on non-alphanumeric
//!   characters; every token becomes a `word` term.
//!
//! Use this service for:
//! - Testing the query builder, accumulator and selector end to end
//! - Embedding the link ranker where candidates are already known
//! - Injecting failures and latency to exercise error paths

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use crate::model::{Candidate, DocNo, SummaryElement, Term};
use crate::query::Query;
use crate::{Error, Result};
use super::RetrievalService;

// ============================================================================
// MemoryRetrieval
// ============================================================================

/// In-memory document table answering link queries.
#[derive(Clone, Default)]
pub struct MemoryRetrieval {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    documents: RwLock<Vec<StoredDocument>>,
    /// Error message returned by every evaluate call while set.
    failure: RwLock<Option<String>>,
    latency: RwLock<Option<Duration>>,
    evaluations: AtomicU64,
}

struct StoredDocument {
    docno: DocNo,
    weight: f64,
    terms: HashSet<String>,
    links: Vec<SummaryElement>,
}

impl MemoryRetrieval {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document; `text` is analyzed to decide which queries select it.
    pub fn add_document(
        &self,
        weight: f64,
        text: &str,
        links: impl IntoIterator<Item = SummaryElement>,
    ) -> DocNo {
        let mut documents = self.inner.documents.write();
        let docno = DocNo(documents.len() as u64 + 1);
        documents.push(StoredDocument {
            docno,
            weight,
            terms: tokenize(text).collect(),
            links: links.into_iter().collect(),
        });
        docno
    }

    /// Make every subsequent evaluate call fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.inner.failure.write() = Some(message.into());
    }

    /// Delay every subsequent evaluate call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.write() = Some(latency);
    }

    /// Number of evaluate calls received so far.
    pub fn evaluations(&self) -> u64 {
        self.inner.evaluations.load(Ordering::Relaxed)
    }

    pub fn document_count(&self) -> usize {
        self.inner.documents.read().len()
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

// ============================================================================
// RetrievalService impl
// ============================================================================

#[async_trait]
impl RetrievalService for MemoryRetrieval {
    async fn analyze(&self, _phrase_type: &str, text: &str) -> Result<Vec<Term>> {
        Ok(tokenize(text).map(Term::word).collect())
    }

    async fn evaluate(&self, query: &Query) -> Result<Vec<Candidate>> {
        self.inner.evaluations.fetch_add(1, Ordering::Relaxed);

        let latency = *self.inner.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = self.inner.failure.read().clone() {
            return Err(Error::Service(message));
        }

        // Without a selection gate nothing qualifies.
        let Some(selection) = &query.features.selection else {
            return Ok(Vec::new());
        };

        let documents = self.inner.documents.read();
        let mut candidates: Vec<Candidate> = documents
            .iter()
            .filter(|doc| selection.accepts(|term| doc.terms.contains(&term.value)))
            .map(|doc| Candidate {
                docno: doc.docno,
                weight: doc.weight,
                summary: doc.links.clone(),
            })
            .collect();
        drop(documents);

        candidates.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .skip(query.min_rank)
            .take(query.max_candidates)
            .collect();

        trace!(candidates = candidates.len(), "memory evaluation done");
        Ok(candidates)
    }
}

// ============================================================================
// Tests
// ============================================================================
