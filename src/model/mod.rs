//! # Link Ranking Model
//!
//! Plain DTOs exchanged between the query builder, the retrieval service
//! and the ranking stage.
//!
//! Design rule: this module is pure data with no I/O and no async.

pub mod term;
pub mod candidate;
pub mod link;

pub use term::Term;
pub use candidate::{Candidate, DocNo, SummaryElement, LINK_SUMMARY};
pub use link::{Link, ResultWindow};
