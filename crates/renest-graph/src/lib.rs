//! Read-only structural class graph for renest.
//!
//! Holds the per-class facts the nesting heuristics consume: access flags,
//! declared members, synthetic member classification, super/interface edges
//! and cross-class reference sets. Classes, methods and fields live in
//! arenas addressed by stable integer ids; every name mentioned anywhere in
//! the input is interned, so references to classes outside the input resolve
//! to non-real placeholder entries instead of dangling.

#![forbid(unsafe_code)]

mod descriptor;
mod facts;
mod graph;

pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{FieldType, MethodDescriptor};
pub use crate::facts::{load_facts, parse_facts, ClassFacts, FactsError, FactsFile};
pub use crate::graph::{
    ClassData, ClassGraph, ClassId, FieldData, FieldId, GraphBuilder, MethodData, MethodId,
};
