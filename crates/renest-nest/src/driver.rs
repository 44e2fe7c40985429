//! Batch inference.
//!
//! Scoring is decision-independent per class and runs on the rayon pool;
//! every mutation of the nesting graph happens afterwards, single-threaded,
//! in a fixed class order. Interleaving scoring with mutation of the same
//! graph is not supported: the derived caches and sibling orderings are
//! shared mutable state with no synchronization of their own.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use renest_core::name::natural_cmp;
use renest_graph::ClassId;

use crate::error::NestError;
use crate::nest::{NestKind, Subject};
use crate::ranker::{best_candidate, rank};
use crate::state::NestingGraph;

/// Accept any candidate that scored at all.
pub const DEFAULT_MIN_SCORE: u8 = 1;

/// Nesting status summary over the graph's real classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NestingStatus {
    pub total_classes: usize,
    pub nested_classes: usize,
    pub anonymous_classes: usize,
    pub inner_classes: usize,
}

/// Infers a nest for every nestable, currently-unassigned class whose best
/// candidate reaches `min_score`. Returns the number of classes assigned.
///
/// `progress` receives a monotone fraction in `[0, 1]`.
pub fn auto_nest_all(
    graph: &mut NestingGraph,
    min_score: u8,
    mut progress: impl FnMut(f64),
) -> usize {
    let mut classes: Vec<ClassId> = graph
        .graph()
        .class_ids()
        .filter(|&c| graph.is_nestable(c) && !graph.has_nest(c))
        .collect();
    // fixed apply order keeps batch results reproducible
    classes.sort_by(|&a, &b| natural_cmp(&graph.graph().class(a).name, &graph.graph().class(b).name));

    if classes.is_empty() {
        progress(1.0);
        return 0;
    }

    let shared: &NestingGraph = graph;
    let decisions: Vec<(ClassId, Option<(Subject, NestKind)>)> = classes
        .par_iter()
        .map(|&class| (class, decide(shared, class, min_score)))
        .collect();

    let total = decisions.len();
    let mut assigned = 0;
    for (index, (class, decision)) in decisions.into_iter().enumerate() {
        if let Some((subject, kind)) = decision {
            match graph.assign(class, subject, kind) {
                Ok(()) => assigned += 1,
                // an earlier assignment in this batch can invalidate a
                // decision, e.g. by closing a cycle
                Err(err) => warn!(
                    class = %graph.graph().class(class).name,
                    %err,
                    "skipping stale batch decision"
                ),
            }
        }
        progress((index + 1) as f64 / total as f64);
    }

    debug!(assigned, total, "auto nesting finished");
    assigned
}

/// Single-class variant of [`auto_nest_all`]. Returns whether an assignment
/// was made.
pub fn auto_nest_class(
    graph: &mut NestingGraph,
    class: ClassId,
    min_score: u8,
) -> Result<bool, NestError> {
    match decide(graph, class, min_score) {
        Some((subject, kind)) => {
            graph.assign(class, subject, kind)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn decide(graph: &NestingGraph, class: ClassId, min_score: u8) -> Option<(Subject, NestKind)> {
    let results = rank(graph, class, None);
    let best = best_candidate(&results)?;
    (best.score >= min_score).then_some((best.subject, best.kind))
}

/// Counts nested/anonymous/inner classes, optionally over input classes only.
pub fn nesting_status(graph: &NestingGraph, inputs_only: bool) -> NestingStatus {
    let mut status = NestingStatus {
        total_classes: 0,
        nested_classes: 0,
        anonymous_classes: 0,
        inner_classes: 0,
    };

    for class in graph.graph().class_ids() {
        if !graph.graph().is_real(class) {
            continue;
        }
        if inputs_only && !graph.graph().class(class).input {
            continue;
        }

        status.total_classes += 1;

        if let Some(nest) = graph.nest(class) {
            status.nested_classes += 1;
            match nest.kind {
                NestKind::Anonymous => status.anonymous_classes += 1,
                NestKind::Inner => status.inner_classes += 1,
                NestKind::Dummy => unreachable!("dummy nests are never committed"),
            }
        }
    }

    status
}
