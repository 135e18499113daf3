//! Link query execution.
//!
//! Runs build → evaluate → accumulate → select against a RetrievalService.
//! The only suspension point is the evaluate call.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::LinkQueryConfig;
use crate::model::{Candidate, Link, ResultWindow, Term};
use crate::query::{build_link_query, Query};
use crate::rank::{accumulate_with_stats, select_top_links};
use crate::service::RetrievalService;
use crate::{Error, Result};

/// Links for one result window plus what it took to get them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkRanking {
    pub links: Vec<Link>,
    pub stats: EvaluationStats,
}

/// Execution statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub terms: usize,
    pub expressions: usize,
    /// False when the run short-circuited before calling the service.
    pub evaluated: bool,
    pub candidates: usize,
    pub captured: usize,
    pub skipped: usize,
    pub distinct_links: usize,
    pub execution_time_ms: u64,
}

/// Rank links for pre-analyzed `terms`.
///
/// Zero terms, or candidates without any usable link mention, produce an
/// empty ranking. Service failures are returned unchanged; an evaluate call
/// exceeding `config.timeout_ms` is abandoned with `Error::Timeout`.
pub async fn execute<S: RetrievalService + ?Sized>(
    service: &S,
    terms: &[Term],
    window: ResultWindow,
    config: &LinkQueryConfig,
) -> Result<LinkRanking> {
    let started = Instant::now();
    let mut stats = EvaluationStats {
        terms: terms.len(),
        ..Default::default()
    };

    if terms.is_empty() {
        debug!("no query terms, skipping evaluation");
        return Ok(LinkRanking { links: Vec::new(), stats });
    }

    let query = Query::new(build_link_query(terms, config), config);
    stats.expressions = query.features.summaries.len();

    let candidates = evaluate(service, &query, config.timeout()).await?;
    stats.evaluated = true;

    let (scores, accumulated) = accumulate_with_stats(&candidates);
    stats.candidates = accumulated.candidates;
    stats.captured = accumulated.captured;
    stats.skipped = accumulated.skipped;
    stats.distinct_links = scores.len();

    let links = if scores.is_empty() {
        trace!("no link mentions captured");
        Vec::new()
    } else {
        select_top_links(&scores, window.min_rank, window.count)
    };

    stats.execution_time_ms = elapsed_ms(started);
    debug!(
        candidates = stats.candidates,
        links = stats.distinct_links,
        returned = links.len(),
        elapsed_ms = stats.execution_time_ms,
        "link ranking done"
    );
    Ok(LinkRanking { links, stats })
}

async fn evaluate<S: RetrievalService + ?Sized>(
    service: &S,
    query: &Query,
    budget: Option<Duration>,
) -> Result<Vec<Candidate>> {
    let Some(budget) = budget else {
        return service.evaluate(query).await;
    };
    let started = Instant::now();
    match tokio::time::timeout(budget, service.evaluate(query)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            elapsed_ms: elapsed_ms(started),
        }),
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SummaryElement;
    use crate::service::MemoryRetrieval;

    #[tokio::test]
    async fn test_empty_terms_skip_service() {
        let service = MemoryRetrieval::new();
        let ranking = execute(&service, &[], ResultWindow::first(10), &LinkQueryConfig::default())
            .await
            .unwrap();
        assert!(ranking.links.is_empty());
        assert!(!ranking.stats.evaluated);
        assert_eq!(service.evaluations(), 0);
    }

    #[tokio::test]
    async fn test_stats_are_filled() {
        let service = MemoryRetrieval::new();
        service.add_document(2.0, "river delta", [
            SummaryElement::link("Nile", 1.0),
            SummaryElement::link(" ", 1.0),
        ]);
        let terms = vec![Term::word("river"), Term::word("delta")];
        let ranking = execute(&service, &terms, ResultWindow::first(5), &LinkQueryConfig::default())
            .await
            .unwrap();

        assert_eq!(ranking.links, vec![Link::new("Nile", 2.0)]);
        let stats = ranking.stats;
        assert_eq!(stats.terms, 2);
        assert_eq!(stats.expressions, 8);
        assert!(stats.evaluated);
        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.captured, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.distinct_links, 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let service = MemoryRetrieval::new();
        service.set_latency(Duration::from_millis(200));
        let config = LinkQueryConfig::default().with_timeout(Duration::from_millis(10));
        let err = execute(&service, &[Term::word("x")], ResultWindow::first(5), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
