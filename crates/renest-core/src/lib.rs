//! Core shared types for renest.
//!
//! This crate is intentionally small and dependency-free.

pub mod access;
pub mod name;

pub use access::INNER_ACCESS_MASK;
pub use name::{natural_cmp, sibling_cmp, strip_local_prefix};
