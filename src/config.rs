//! Link query configuration.
//!
//! Every knob has a default reproducing the stock link-ranking setup, so
//! `LinkQueryConfig::default()` is what production runs with. Partial JSON
//! documents are accepted; missing fields fall back to their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::query::Boundary;
use crate::{Error, Result};

// ============================================================================
// Tier weights
// ============================================================================

/// Feature weights per proximity tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeights {
    /// Adjacent pair: forward sequence, backward sequence, close window, wide window.
    pub adjacent: [f64; 4],
    /// Pair one term apart: close window, wide window.
    pub near: [f64; 2],
    /// Pair further apart: wide window.
    pub far: f64,
    /// Single-term query.
    pub single: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            adjacent: [3.0, 2.0, 2.0, 1.5],
            near: [1.6, 1.2],
            far: 1.1,
            single: 1.0,
        }
    }
}

impl TierWeights {
    fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.adjacent
            .iter()
            .chain(self.near.iter())
            .copied()
            .chain([self.far, self.single])
    }
}

// ============================================================================
// Tier distances
// ============================================================================

/// Maximum position distances used by the base proximity forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierRanges {
    /// Ordered sequence of an adjacent pair.
    pub sequence: i32,
    /// Close unordered window.
    pub close: i32,
    /// Wide unordered window.
    pub wide: i32,
    /// Distance between a matched form and the captured link mention.
    pub capture: i32,
}

impl Default for TierRanges {
    fn default() -> Self {
        Self {
            sequence: 3,
            close: 5,
            wide: 20,
            capture: 50,
        }
    }
}

// ============================================================================
// Document weighting
// ============================================================================

/// Parameters of the BM25 document weighting on the match features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub weight: f64,
    pub k1: f64,
    pub b: f64,
    pub avgdoclen: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            weight: 1.0,
            k1: 0.75,
            b: 2.1,
            avgdoclen: 500.0,
        }
    }
}

// ============================================================================
// LinkQueryConfig
// ============================================================================

/// Configuration for building and evaluating link queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkQueryConfig {
    /// Phrase type passed to the analyzer.
    pub phrase_type: String,
    /// Structure all proximity expressions are scoped to.
    pub boundary: Boundary,
    /// Variable bound to the captured link mention.
    pub capture_variable: String,
    /// Feature type of link mentions in the index.
    pub link_term_type: String,
    /// Summarizer result type of the captured link.
    pub link_result_type: String,
    pub weights: TierWeights,
    pub ranges: TierRanges,
    pub bm25: Bm25Params,
    /// Metadata element holding the static page weight.
    pub page_weight_metadata: String,
    pub page_weight: f64,
    /// Number of candidate documents requested from the service.
    pub max_candidates: usize,
    /// Budget for a single evaluate call. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for LinkQueryConfig {
    fn default() -> Self {
        Self {
            phrase_type: "text".into(),
            boundary: Boundary::Sentence,
            capture_variable: "LINK".into(),
            link_term_type: "linkvar".into(),
            link_result_type: "linkid".into(),
            weights: TierWeights::default(),
            ranges: TierRanges::default(),
            bm25: Bm25Params::default(),
            page_weight_metadata: "pageweight".into(),
            page_weight: 2.0,
            max_candidates: 300,
            timeout_ms: None,
        }
    }
}

impl LinkQueryConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Reject configurations the builder or pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        if let Some(w) = self.weights.iter().find(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(format!("tier weight must be finite and non-negative, got {w}")));
        }
        let r = self.ranges;
        if r.sequence <= 0 || r.close <= 0 || r.wide <= 0 || r.capture <= 0 {
            return Err(Error::Config(format!("proximity ranges must be positive: {r:?}")));
        }
        if self.capture_variable.trim().is_empty() {
            return Err(Error::Config("capture variable must not be blank".into()));
        }
        if self.link_term_type.trim().is_empty() {
            return Err(Error::Config("link term type must not be blank".into()));
        }
        if self.max_candidates == 0 {
            return Err(Error::Config("max_candidates must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LinkQueryConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_candidates, 300);
        assert_eq!(config.weights.adjacent, [3.0, 2.0, 2.0, 1.5]);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LinkQueryConfig::from_json(
            r#"{ "max_candidates": 50, "timeout_ms": 250, "weights": { "far": 0.5 } }"#,
        )
        .unwrap();
        assert_eq!(config.max_candidates, 50);
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.weights.far, 0.5);
        assert_eq!(config.weights.near, [1.6, 1.2]);
        assert_eq!(config.boundary, Boundary::Sentence);
    }

    #[test]
    fn test_rejects_bad_weight() {
        let mut config = LinkQueryConfig::default();
        config.weights.single = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = LinkQueryConfig::from_json("{ max_candidates: }").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_rejects_zero_candidates() {
        let err = LinkQueryConfig::from_json(r#"{ "max_candidates": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
