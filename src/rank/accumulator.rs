//! Link score accumulation across candidates.

use hashbrown::HashMap;
use tracing::debug;

use crate::model::{Candidate, Link};

// ============================================================================
// LinkScoreMap
// ============================================================================

/// Accumulated weight per link id.
///
/// Iteration follows the order in which ids were first added, which keeps
/// selection over equal scores reproducible.
#[derive(Debug, Clone, Default)]
pub struct LinkScoreMap {
    index: HashMap<String, usize>,
    entries: Vec<Link>,
}

impl LinkScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.index.get(id).map(|&i| self.entries[i].weight)
    }

    /// Add `weight` to the score of `id`, creating it at zero if absent.
    pub fn add(&mut self, id: &str, weight: f64) {
        match self.index.get(id) {
            Some(&i) => self.entries[i].weight += weight,
            None => {
                self.index.insert(id.to_string(), self.entries.len());
                self.entries.push(Link::new(id, weight));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.entries.iter()
    }

    pub fn into_links(self) -> Vec<Link> {
        self.entries
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for LinkScoreMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut map = LinkScoreMap::new();
        for (id, weight) in iter {
            map.add(id.as_ref(), weight);
        }
        map
    }
}

// ============================================================================
// Accumulation
// ============================================================================

/// Counters from one accumulation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulationStats {
    pub candidates: usize,
    /// Link elements that contributed to a score.
    pub captured: usize,
    /// Link elements dropped as malformed.
    pub skipped: usize,
}

/// Sum `element.weight * candidate.weight` per trimmed link id.
pub fn accumulate_link_scores(candidates: &[Candidate]) -> LinkScoreMap {
    accumulate_with_stats(candidates).0
}

/// Like [`accumulate_link_scores`], also reporting what was captured and skipped.
///
/// An element is malformed when its trimmed id is blank or its weight is
/// missing or non-finite. A candidate with a non-finite document weight
/// contributes nothing; its link elements count as skipped. So does any
/// product of finite weights that overflows.
pub fn accumulate_with_stats(candidates: &[Candidate]) -> (LinkScoreMap, AccumulationStats) {
    let mut scores = LinkScoreMap::new();
    let mut stats = AccumulationStats {
        candidates: candidates.len(),
        ..Default::default()
    };

    for candidate in candidates {
        let doc_weight = candidate.weight;
        for element in candidate.links() {
            let id = element.value.trim();
            let contribution = element.weight.map(|w| w * doc_weight);
            match contribution {
                Some(c) if c.is_finite() && !id.is_empty() => {
                    scores.add(id, c);
                    stats.captured += 1;
                }
                _ => {
                    debug!(
                        docno = %candidate.docno,
                        id = element.value.as_str(),
                        weight = ?element.weight,
                        "skipping malformed link element"
                    );
                    stats.skipped += 1;
                }
            }
        }
    }

    (scores, stats)
}
