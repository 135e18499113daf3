//! Analyzed query term.

use serde::{Deserialize, Serialize};

/// A token produced by the retrieval service's analyzer.
///
/// `term_type` is the feature type the analyzer assigned (e.g. `"word"`),
/// `value` the normalized token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub term_type: String,
    pub value: String,
}

impl Term {
    pub fn new(term_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            term_type: term_type.into(),
            value: value.into(),
        }
    }

    /// Shorthand for a term of type `"word"`.
    pub fn word(value: impl Into<String>) -> Self {
        Self::new("word", value)
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.term_type, self.value)
    }
}
