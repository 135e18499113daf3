//! Ranking stage: turn candidates into a page of weighted links.
//!
//! Pure functions without I/O. Both steps allocate fresh state per
//! call and share nothing across queries.

pub mod accumulator;
pub mod selector;

pub use accumulator::{
    accumulate_link_scores, accumulate_with_stats, AccumulationStats, LinkScoreMap,
};
pub use selector::{select_top_links, BoundedTopK};
