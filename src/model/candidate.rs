//! Candidate documents returned by a retrieval service.

use serde::{Deserialize, Serialize};

/// Name of the summary element that carries a captured link mention.
pub const LINK_SUMMARY: &str = "LINK";

/// Opaque document number assigned by the retrieval service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocNo(pub u64);

impl std::fmt::Display for DocNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, weighted value attached to a candidate by a summarizer.
///
/// `weight` is `None` when the service could not produce a usable number
/// for this occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryElement {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl SummaryElement {
    pub fn new(name: impl Into<String>, value: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            weight: Some(weight),
        }
    }

    /// A link mention as produced by the link summarizer.
    pub fn link(id: impl Into<String>, weight: f64) -> Self {
        Self::new(LINK_SUMMARY, id, weight)
    }

    pub fn is_link(&self) -> bool {
        self.name == LINK_SUMMARY
    }
}

/// A document-level match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub docno: DocNo,
    pub weight: f64,
    #[serde(default)]
    pub summary: Vec<SummaryElement>,
}

impl Candidate {
    pub fn new(docno: DocNo, weight: f64) -> Self {
        Self {
            docno,
            weight,
            summary: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: SummaryElement) -> Self {
        self.summary.push(element);
        self
    }

    pub fn with_link(self, id: impl Into<String>, weight: f64) -> Self {
        self.with_element(SummaryElement::link(id, weight))
    }

    /// Summary elements tagged as link captures.
    pub fn links(&self) -> impl Iterator<Item = &SummaryElement> {
        self.summary.iter().filter(|e| e.is_link())
    }
}
