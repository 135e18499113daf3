//! End-to-end integration tests for the link ranking pipeline.
//!
//! Each test exercises: analyze -> build -> evaluate -> accumulate -> select,
//! either against MemoryRetrieval or against a scripted service.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use linkrank::{
    Candidate, DocNo, Error, Link, LinkQueryConfig, LinkRanker, MemoryRetrieval, Query,
    ResultWindow, RetrievalService, SummaryElement, Term, Tier,
};

// ============================================================================
// Helper: a service answering every query with fixed candidates and
// remembering the queries it saw.
// ============================================================================

struct ScriptedService {
    candidates: Vec<Candidate>,
    seen: Mutex<Vec<Query>>,
}

impl ScriptedService {
    fn answering(candidates: Vec<Candidate>) -> Self {
        Self { candidates, seen: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl RetrievalService for ScriptedService {
    async fn analyze(&self, _phrase_type: &str, text: &str) -> linkrank::Result<Vec<Term>> {
        Ok(text.split_whitespace().map(Term::word).collect())
    }

    async fn evaluate(&self, query: &Query) -> linkrank::Result<Vec<Candidate>> {
        self.seen.lock().push(query.clone());
        Ok(self.candidates.clone())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Wikipedia-ish corpus: every document mentions a few link targets.
fn setup_rivers() -> LinkRanker<MemoryRetrieval> {
    init_tracing();
    let ranker = LinkRanker::open_memory();
    let service = ranker.service();
    service.add_document(3.0, "The Nile river delta in Egypt", [
        SummaryElement::link("Nile", 2.0),
        SummaryElement::link("Egypt", 1.0),
        SummaryElement::link("Mediterranean Sea", 0.5),
    ]);
    service.add_document(2.0, "The Ganges river delta in Bengal", [
        SummaryElement::link("Ganges", 2.0),
        SummaryElement::link("Bengal", 1.0),
        SummaryElement::link("Bay of Bengal", 1.0),
    ]);
    service.add_document(1.0, "Mississippi river delta", [
        SummaryElement::link("Mississippi River", 2.0),
        SummaryElement::link("Gulf of Mexico", 1.0),
    ]);
    service.add_document(10.0, "The Amazon river basin", [
        SummaryElement::link("Amazon", 5.0),
    ]);
    ranker
}

// ============================================================================
// 1. The worked example: two candidates mentioning the same link
// ============================================================================

#[tokio::test]
async fn test_river_delta_example() {
    let service = ScriptedService::answering(vec![
        Candidate::new(DocNo(1), 2.0).with_link("Nile", 1.5),
        Candidate::new(DocNo(2), 1.0).with_link("Nile", 0.5),
    ]);
    let ranker = LinkRanker::with_service(service);

    let ranking = ranker.rank_links("river delta", ResultWindow::first(1)).await.unwrap();
    assert_eq!(ranking.links, vec![Link::new("Nile", 3.5)]);

    let seen = ranker.service().seen.lock();
    assert_eq!(seen.len(), 1);
    let features = &seen[0].features;
    assert_eq!(features.count_tier(Tier::Adjacent), 8);
    assert_eq!(features.matches, vec![Term::word("river"), Term::word("delta")]);
    assert_eq!(features.selection.as_ref().unwrap().terms.len(), 2);
}

// ============================================================================
// 2. Ranking over the in-memory corpus
// ============================================================================

#[tokio::test]
async fn test_rank_links_over_corpus() {
    let ranker = setup_rivers();
    let ranking = ranker.rank_links("River Delta", ResultWindow::first(3)).await.unwrap();

    // the Amazon document lacks "delta" and is gated out
    assert_eq!(ranking.links, vec![
        Link::new("Nile", 6.0),
        Link::new("Ganges", 4.0),
        Link::new("Egypt", 3.0),
    ]);
    assert_eq!(ranking.stats.candidates, 3);
    assert_eq!(ranking.stats.distinct_links, 8);
}

#[tokio::test]
async fn test_pages_are_contiguous() {
    let ranker = setup_rivers();
    let all = ranker.rank_links("river delta", ResultWindow::first(100)).await.unwrap().links;
    assert_eq!(all.len(), 8);

    let window = ResultWindow::new(1, 3);
    let first = ranker.rank_links("river delta", window).await.unwrap().links;
    let second = ranker.rank_links("river delta", window.next()).await.unwrap().links;

    let joined: Vec<Link> = first.into_iter().chain(second).collect();
    assert_eq!(joined, all[1..7].to_vec());
}

#[tokio::test]
async fn test_window_beyond_results_is_empty() {
    let ranker = setup_rivers();
    let ranking = ranker.rank_links("river delta", ResultWindow::new(50, 10)).await.unwrap();
    assert!(ranking.links.is_empty());
    assert!(ranking.stats.evaluated);
}

// ============================================================================
// 3. Short circuits
// ============================================================================

#[tokio::test]
async fn test_blank_query_never_evaluates() {
    let ranker = setup_rivers();
    let ranking = ranker.rank_links("  ... ", ResultWindow::first(10)).await.unwrap();
    assert!(ranking.links.is_empty());
    assert_eq!(ranker.service().evaluations(), 0);
}

#[tokio::test]
async fn test_candidates_without_links() {
    let service = ScriptedService::answering(vec![
        Candidate::new(DocNo(1), 4.0).with_element(SummaryElement::new("TITLE", "Nile", 1.0)),
    ]);
    let ranker = LinkRanker::with_service(service);
    let ranking = ranker.rank_links("nile", ResultWindow::first(10)).await.unwrap();
    assert!(ranking.links.is_empty());
    assert_eq!(ranking.stats.candidates, 1);
    assert_eq!(ranking.stats.distinct_links, 0);
}

// ============================================================================
// 4. Failures pass through untouched
// ============================================================================

#[tokio::test]
async fn test_service_failure_is_propagated() {
    let ranker = setup_rivers();
    ranker.service().fail_with("storage server 7184 unreachable");

    let err = ranker.rank_links("river delta", ResultWindow::first(10)).await.unwrap_err();
    match err {
        Error::Service(message) => assert_eq!(message, "storage server 7184 unreachable"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = LinkQueryConfig::default();
    config.ranges.capture = 0;
    assert!(matches!(
        LinkRanker::with_config(MemoryRetrieval::new(), config),
        Err(Error::Config(_))
    ));
}

// ============================================================================
// 5. Configuration and trait objects
// ============================================================================

#[tokio::test]
async fn test_json_config_changes_weights() {
    let config = LinkQueryConfig::from_json(r#"{ "weights": { "single": 0.25 } }"#).unwrap();
    let ranker = LinkRanker::with_config(MemoryRetrieval::new(), config).unwrap();
    let query = ranker.build_query(&[Term::word("nile")]);
    assert!(query.features.summaries.iter().all(|e| e.weight == 0.25));
    assert_eq!(query.max_candidates, 300);
}

#[tokio::test]
async fn test_dyn_service() {
    let memory = MemoryRetrieval::new();
    memory.add_document(1.0, "delta", [SummaryElement::link("Nile", 1.0)]);
    let service: Arc<dyn RetrievalService> = Arc::new(memory.clone());

    let ranker = LinkRanker::with_service(service);
    let ranking = ranker
        .rank_terms(&[Term::word("delta")], ResultWindow::first(5))
        .await
        .unwrap();
    assert_eq!(ranking.links, vec![Link::new("Nile", 1.0)]);
    assert_eq!(memory.evaluations(), 1);
}
