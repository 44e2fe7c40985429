//! Heuristic ranking of enclosing-subject candidates.
//!
//! Pure read-only pass over the nesting graph: scores every plausible
//! (subject, kind) pair for one class from structural signals (synthetic
//! members, constructor call sites, cross-class references, access flags).
//! An already-assigned class short-circuits to a single confirmed candidate.

use renest_core::access::is_package_private;

use renest_graph::ClassId;

use crate::nest::{NestCandidate, NestKind, Subject};
use crate::state::NestingGraph;

/// Ranks every plausible enclosing subject for `class` against the full
/// candidate pool. Returns an empty list for placeholder classes. When
/// `selected` is set, method-subject entries are only surfaced for that
/// class (the class-level aggregates always are).
pub fn rank(graph: &NestingGraph, class: ClassId, selected: Option<ClassId>) -> Vec<NestCandidate> {
    if !graph.graph().is_real(class) {
        return Vec::new();
    }

    let mut ranker = Ranker {
        graph,
        class,
        selected,
        results: Vec::new(),
    };
    ranker.find_results();
    ranker.finalize()
}

/// Best committable candidate: scan from the highest rank downward, skipping
/// dummy entries.
pub fn best_candidate(results: &[NestCandidate]) -> Option<&NestCandidate> {
    results
        .iter()
        .filter(|c| !c.is_dummy())
        .max_by(|a, b| a.rank_cmp(b))
}

struct Ranker<'a> {
    graph: &'a NestingGraph,
    class: ClassId,
    selected: Option<ClassId>,
    results: Vec<NestCandidate>,
}

impl<'a> Ranker<'a> {
    fn find_results(&mut self) {
        if let Some(nest) = self.graph.nest(self.class) {
            // confirmed assignments win the whole ranking
            self.add_result(nest.subject, nest.kind, 100);
        } else {
            self.try_nest_class(self.class, false);
        }
    }

    fn try_nest_class(&mut self, class: ClassId, check_only: bool) -> Option<NestCandidate> {
        if !self.graph.is_nestable(class) {
            return None;
        }
        let mut best = self.try_enum(class, check_only);
        best = pick_best(best, self.try_anonymous(class, check_only));
        pick_best(best, self.try_inner(class, check_only))
    }

    /// Enum variant bodies: an enum whose superclass is not the enum base is
    /// a specialization of that superclass.
    fn try_enum(&mut self, class: ClassId, check_only: bool) -> Option<NestCandidate> {
        if !self.graph.graph().is_enum(class) {
            return None;
        }
        let super_class = self.graph.graph().class(class).super_class?;
        if self.graph.graph().class(super_class).name == "java/lang/Enum" {
            return None;
        }

        self.check_or_add(class, Subject::Class(super_class), NestKind::Anonymous, 100, check_only)
    }

    /// Anonymous classes have exactly one non-synthetic constructor that is
    /// instantiated at exactly one call site.
    fn try_anonymous(&mut self, class: ClassId, check_only: bool) -> Option<NestCandidate> {
        if !self.graph.can_be_anonymous(class) {
            return None;
        }

        let constructors = self.graph.graph().instance_constructors(class);
        let [constructor] = constructors.as_slice() else {
            return None;
        };

        let refs_in = &self.graph.graph().method(*constructor).refs_in;
        let [call_site] = refs_in.as_slice() else {
            return None;
        };

        let encl_method = *call_site;
        let encl_class = self.graph.graph().method(encl_method).class;
        if encl_class == class {
            return None;
        }

        let mut score = if self.graph.graph().declared_methods(class).len() == 1 {
            90
        } else if self.graph.graph().has_synthetic_fields(class) {
            60
        } else {
            30
        };

        // anonymous classes are conventionally package private
        if !is_package_private(self.graph.graph().class(class).access) {
            score -= 5;
        }

        self.check_or_add(class, Subject::Method(encl_method), NestKind::Anonymous, score, check_only)
    }

    fn try_inner(&mut self, class: ClassId, check_only: bool) -> Option<NestCandidate> {
        if !self.graph.can_be_inner(class) {
            return None;
        }

        // A single synthetic field typically captures the enclosing
        // instance; more than one makes the class look anonymous instead.
        let synthetic_fields = self.graph.graph().synthetic_fields(class);
        if !synthetic_fields.is_empty() {
            if synthetic_fields.len() > 1 {
                return None;
            }

            let field = self.graph.graph().field(synthetic_fields[0]);
            if let Some(ty) = field.type_class {
                if self.graph.graph().is_real(ty) && !field.type_is_array {
                    return self.check_or_add(class, Subject::Class(ty), NestKind::Inner, 90, check_only);
                }
            }
        }

        let mut best = None;

        // Synthetic accessor methods on this class are called by the
        // enclosing class to reach private members.
        if self.graph.graph().has_synthetic_methods(class) {
            let mut callers = Vec::new();
            let mut top_level_callers = Vec::new();
            for method in self.graph.graph().synthetic_methods(class) {
                for &call_site in &self.graph.graph().method(method).refs_in {
                    let caller = self.graph.graph().method(call_site).class;
                    push_unique(&mut callers, caller);
                    push_unique(&mut top_level_callers, self.graph.top_level_class(caller));
                }
            }

            let base_score = if top_level_callers.len() == 1 { 80 } else { 60 };
            best = self.score_reference_classes(class, &callers, base_score, check_only, best);
        }

        // A static inner class without captures may still call static
        // synthetic accessors on its enclosing class.
        let mut callees = Vec::new();
        let mut top_level_callees = Vec::new();
        for &method in &self.graph.graph().class(class).methods {
            for &target in &self.graph.graph().method(method).refs_out {
                let target_method = self.graph.graph().method(target);
                if target_method.class != class
                    && target_method.is_static()
                    && target_method.is_synthetic()
                {
                    push_unique(&mut callees, target_method.class);
                    push_unique(
                        &mut top_level_callees,
                        self.graph.top_level_class(target_method.class),
                    );
                }
            }
        }

        let base_score = if top_level_callees.len() == 1 { 60 } else { 40 };
        self.score_reference_classes(class, &callees, base_score, check_only, best)
    }

    fn score_reference_classes(
        &mut self,
        class: ClassId,
        references: &[ClassId],
        base_score: i32,
        check_only: bool,
        mut best: Option<NestCandidate>,
    ) -> Option<NestCandidate> {
        for &reference in references {
            let mut score = base_score;

            if !self.graph.is_top_level(reference) {
                score -= 20;
            }

            if !check_only {
                // when the candidate itself ranks this class higher than we
                // rank it, the enclosure is probably the other way around
                let reverse = self.try_nest_class(reference, true);
                if let Some(reverse) = reverse {
                    if reverse.subject == Subject::Class(class) && i32::from(reverse.score) > score {
                        score -= 20;
                    }
                }
            }

            let result =
                self.check_or_add(class, Subject::Class(reference), NestKind::Inner, score, check_only);
            best = pick_best(best, result);
        }

        best
    }

    fn check_or_add(
        &mut self,
        class: ClassId,
        subject: Subject,
        kind: NestKind,
        score: i32,
        check_only: bool,
    ) -> Option<NestCandidate> {
        if !self.graph.can_nest_into(class, subject) {
            return None;
        }
        if check_only {
            return Some(NestCandidate::maybe(subject, kind, score));
        }
        self.add_result(subject, kind, score)
    }

    fn add_result(&mut self, subject: Subject, kind: NestKind, score: i32) -> Option<NestCandidate> {
        match subject {
            Subject::Method(method) => {
                // method candidates also surface as a class-level aggregate,
                // so aggregate views see the strength without the specifics
                let method_class = self.graph.graph().method(method).class;
                let aggregate =
                    NestCandidate::maybe(Subject::Class(method_class), NestKind::Dummy, score);

                if self.selected.is_none() || self.selected == Some(method_class) {
                    self.add_result_unchecked(NestCandidate::maybe(subject, kind, score));
                }
                Some(self.add_result_unchecked(aggregate))
            }
            Subject::Class(_) => {
                Some(self.add_result_unchecked(NestCandidate::maybe(subject, kind, score)))
            }
        }
    }

    /// Keeps the higher score per subject, preserving first-seen order.
    fn add_result_unchecked(&mut self, candidate: NestCandidate) -> NestCandidate {
        match self
            .results
            .iter_mut()
            .find(|c| c.subject == candidate.subject)
        {
            Some(existing) => {
                if candidate.score > existing.score {
                    *existing = candidate;
                }
                *existing
            }
            None => {
                self.results.push(candidate);
                candidate
            }
        }
    }

    /// Appends explicit zero-score entries for everything unranked, so a
    /// ranked display covers the complete pool.
    fn finalize(self) -> Vec<NestCandidate> {
        let mut results = self.results;

        for id in self.graph.graph().class_ids() {
            if id == self.class {
                continue;
            }
            if !results.iter().any(|c| c.subject == Subject::Class(id)) {
                results.push(NestCandidate::no(Subject::Class(id)));
            }
        }

        if let Some(selected) = self.selected {
            for &method in &self.graph.graph().class(selected).methods {
                if !results.iter().any(|c| c.subject == Subject::Method(method)) {
                    results.push(NestCandidate::no(Subject::Method(method)));
                }
            }
        }

        results
    }
}

fn pick_best(a: Option<NestCandidate>, b: Option<NestCandidate>) -> Option<NestCandidate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.rank_cmp(&b).is_lt() { b } else { a }),
        (a, None) => a,
        (None, b) => b,
    }
}

fn push_unique(items: &mut Vec<ClassId>, item: ClassId) {
    if !items.contains(&item) {
        items.push(item);
    }
}
