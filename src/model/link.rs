//! Ranked links and the page window used to request them.

use serde::{Deserialize, Serialize};

/// A link target with its accumulated weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub weight: f64,
}

impl Link {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }
}

/// Requested page of ranks: `[min_rank, min_rank + count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultWindow {
    pub min_rank: usize,
    pub count: usize,
}

impl ResultWindow {
    pub fn new(min_rank: usize, count: usize) -> Self {
        Self { min_rank, count }
    }

    /// First page of `count` ranks.
    pub fn first(count: usize) -> Self {
        Self::new(0, count)
    }

    /// Number of top ranks that must be known to answer this window.
    pub fn end(&self) -> usize {
        self.min_rank.saturating_add(self.count)
    }

    /// The window directly following this one.
    pub fn next(&self) -> Self {
        Self::new(self.end(), self.count)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for ResultWindow {
    fn default() -> Self {
        Self::first(20)
    }
}
