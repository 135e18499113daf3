//! Link query representation.
//!
//! These types are pure data. The retrieval service interprets them and the
//! core only builds them. They derive `Serialize` so a transport can ship
//! them as-is.

pub mod builder;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::LinkQueryConfig;
use crate::model::Term;

pub use builder::build_link_query;

/// Feature set holding the per-term match features used for document weighting.
pub const MATCH_FEATURES: &str = "docfeat";
/// Feature set holding the link-capturing proximity expressions.
pub const SUMMARY_FEATURES: &str = "sumfeat";
/// Feature set holding the selection gate.
pub const SELECTION_FEATURES: &str = "selfeat";

// ============================================================================
// Structural boundary
// ============================================================================

/// Structure a proximity expression must not cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    Sentence,
    Paragraph,
}

impl Boundary {
    /// Feature type of the delimiter term in the index.
    pub fn term_type(&self) -> &'static str {
        match self {
            Boundary::Sentence => "sent",
            Boundary::Paragraph => "para",
        }
    }
}

// ============================================================================
// Proximity expressions
// ============================================================================

/// Operands shared by every structural operator.
///
/// A negative `range` asks the service to match looking backward from the
/// last child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub range: i32,
    pub boundary: Boundary,
    pub children: Vec<ProximityExpr>,
}

/// A proximity constraint over analyzed terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProximityExpr {
    /// A single term; `capture` binds the matched occurrence to a variable.
    Term {
        term: Term,
        capture: Option<String>,
    },
    /// Children appear in order within `range` positions.
    Sequence(Structure),
    /// Children appear in any order within `range` positions.
    Within(Structure),
    /// Children appear in order, each within `range` of its predecessor.
    Chain(Structure),
    /// Children appear in any order, each within `range` of the first.
    InRange(Structure),
}

impl ProximityExpr {
    pub fn term(term: Term) -> Self {
        ProximityExpr::Term { term, capture: None }
    }

    /// Leaf matching any link mention and binding it to `variable`.
    pub fn capture(link_term_type: &str, variable: &str) -> Self {
        ProximityExpr::Term {
            term: Term::new(link_term_type, ""),
            capture: Some(variable.to_string()),
        }
    }

    pub fn sequence(range: i32, boundary: Boundary, children: Vec<ProximityExpr>) -> Self {
        ProximityExpr::Sequence(Structure { range, boundary, children })
    }

    pub fn within(range: i32, boundary: Boundary, children: Vec<ProximityExpr>) -> Self {
        ProximityExpr::Within(Structure { range, boundary, children })
    }

    pub fn chain(range: i32, boundary: Boundary, children: Vec<ProximityExpr>) -> Self {
        ProximityExpr::Chain(Structure { range, boundary, children })
    }

    pub fn in_range(range: i32, boundary: Boundary, children: Vec<ProximityExpr>) -> Self {
        ProximityExpr::InRange(Structure { range, boundary, children })
    }

    /// Operator name as understood by the retrieval service.
    pub fn operator(&self) -> &'static str {
        match self {
            ProximityExpr::Term { .. } => "term",
            ProximityExpr::Sequence(_) => "sequence_struct",
            ProximityExpr::Within(_) => "within_struct",
            ProximityExpr::Chain(_) => "chain_struct",
            ProximityExpr::InRange(_) => "inrange_struct",
        }
    }

    pub fn structure(&self) -> Option<&Structure> {
        match self {
            ProximityExpr::Term { .. } => None,
            ProximityExpr::Sequence(s)
            | ProximityExpr::Within(s)
            | ProximityExpr::Chain(s)
            | ProximityExpr::InRange(s) => Some(s),
        }
    }

    pub fn children(&self) -> &[ProximityExpr] {
        match self.structure() {
            Some(s) => &s.children,
            None => &[],
        }
    }

    /// True if this expression or any descendant binds a capture variable.
    pub fn captures(&self) -> bool {
        match self {
            ProximityExpr::Term { capture, .. } => capture.is_some(),
            _ => self.children().iter().any(ProximityExpr::captures),
        }
    }

    /// Query terms referenced by this expression, in child order.
    /// Capture leaves are not query terms and are skipped.
    pub fn terms(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a Term>) {
        match self {
            ProximityExpr::Term { term, capture: None } => out.push(term),
            ProximityExpr::Term { .. } => {}
            _ => self.children().iter().for_each(|c| c.collect_terms(out)),
        }
    }
}

// ============================================================================
// Features
// ============================================================================

/// Proximity tier an expression was generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Terms at index distance 1.
    Adjacent,
    /// Terms at index distance 2.
    Near,
    /// Terms further apart.
    Far,
    /// Query with a single term.
    Single,
}

/// A scored link-capturing expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedExpr {
    pub tier: Tier,
    pub weight: f64,
    pub expr: ProximityExpr,
}

/// Gate requiring every listed term to be present in a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionFeature {
    pub terms: SmallVec<[Term; 4]>,
}

impl SelectionFeature {
    pub fn contains(terms: &[Term]) -> Self {
        Self { terms: terms.iter().cloned().collect() }
    }

    /// True if `present` holds every required term.
    pub fn accepts(&self, present: impl Fn(&Term) -> bool) -> bool {
        self.terms.iter().all(present)
    }
}

/// Everything the link path merges into a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Per-term features for document weighting, weight 1.0 each.
    pub matches: Vec<Term>,
    /// Link-capturing expressions.
    pub summaries: Vec<WeightedExpr>,
    /// Absent when there are no terms.
    pub selection: Option<SelectionFeature>,
}

impl FeatureSet {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.summaries.is_empty() && self.selection.is_none()
    }

    /// Number of expressions generated for `tier`.
    pub fn count_tier(&self, tier: Tier) -> usize {
        self.summaries.iter().filter(|e| e.tier == tier).count()
    }
}

// ============================================================================
// Query
// ============================================================================

/// Document weighting function applied by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "lowercase")]
pub enum WeightingFunction {
    Bm25 {
        weight: f64,
        k1: f64,
        b: f64,
        avgdoclen: f64,
        feature_set: String,
    },
    Metadata {
        weight: f64,
        name: String,
    },
}

/// Summarizer accumulating the captured link variable per candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSummarizer {
    /// Name of the summary elements it emits.
    pub name: String,
    pub feature_set: String,
    pub variable: String,
    pub result_type: String,
}

/// A complete link query ready for `RetrievalService::evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub features: FeatureSet,
    pub weighting: Vec<WeightingFunction>,
    pub summarizer: LinkSummarizer,
    pub min_rank: usize,
    pub max_candidates: usize,
}

impl Query {
    /// Wrap `features` with the evaluation parameters from `config`.
    pub fn new(features: FeatureSet, config: &LinkQueryConfig) -> Self {
        let bm25 = config.bm25;
        Self {
            features,
            weighting: vec![
                WeightingFunction::Bm25 {
                    weight: bm25.weight,
                    k1: bm25.k1,
                    b: bm25.b,
                    avgdoclen: bm25.avgdoclen,
                    feature_set: MATCH_FEATURES.into(),
                },
                WeightingFunction::Metadata {
                    weight: config.page_weight,
                    name: config.page_weight_metadata.clone(),
                },
            ],
            summarizer: LinkSummarizer {
                name: crate::model::LINK_SUMMARY.into(),
                feature_set: SUMMARY_FEATURES.into(),
                variable: config.capture_variable.clone(),
                result_type: config.link_result_type.clone(),
            },
            min_rank: 0,
            max_candidates: config.max_candidates,
        }
    }
}
