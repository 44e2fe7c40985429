//! Nesting inference core.
//!
//! Given a read-only structural class graph (see `renest-graph`), this crate
//! scores every plausible enclosing subject for each class, maintains the
//! resulting mutable nesting graph (assignments, derived names, cascading
//! cache invalidation) and drives batch inference over the whole graph.

#![forbid(unsafe_code)]

mod driver;
mod error;
mod nest;
mod ranker;
mod state;

pub use crate::driver::{auto_nest_all, auto_nest_class, nesting_status, NestingStatus};
pub use crate::driver::DEFAULT_MIN_SCORE;
pub use crate::error::NestError;
pub use crate::nest::{Nest, NestCandidate, NestKind, Subject};
pub use crate::ranker::{best_candidate, rank};
pub use crate::state::NestingGraph;
