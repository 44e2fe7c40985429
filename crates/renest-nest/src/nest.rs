use std::cmp::Ordering;

use renest_graph::{ClassId, MethodId};

/// How a class is nested into its enclosing subject.
///
/// `Dummy` marks "no candidate" and aggregate placeholder entries in ranking
/// output; it is never a committed assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestKind {
    Anonymous,
    Inner,
    Dummy,
}

impl NestKind {
    pub fn is_dummy(self) -> bool {
        self == NestKind::Dummy
    }
}

/// Anything a class can be nested under: an enclosing class, or an enclosing
/// method for anonymous/local classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Class(ClassId),
    Method(MethodId),
}

/// A committed nesting: "this class is nested into `subject` as `kind`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nest {
    pub subject: Subject,
    pub kind: NestKind,
}

/// One ranked enclosing-subject guess, score clamped to `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestCandidate {
    pub subject: Subject,
    pub kind: NestKind,
    pub score: u8,
}

impl NestCandidate {
    /// A confirmed candidate.
    pub fn yes(subject: Subject, kind: NestKind) -> Self {
        Self::maybe(subject, kind, 100)
    }

    /// An explicit "no" entry.
    pub fn no(subject: Subject) -> Self {
        Self::maybe(subject, NestKind::Dummy, 0)
    }

    pub fn maybe(subject: Subject, kind: NestKind, score: i32) -> Self {
        Self {
            subject,
            kind,
            score: score.clamp(0, 100) as u8,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.kind.is_dummy()
    }

    /// Ranking order: primarily by score; among equal scores a dummy ranks
    /// below a non-dummy. Not an `Ord` impl because candidates with distinct
    /// subjects can still rank equal.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.is_dummy().cmp(&self.is_dummy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_are_clamped() {
        let c = NestCandidate::maybe(Subject::Class(ClassId(0)), NestKind::Inner, 130);
        assert_eq!(c.score, 100);
        let c = NestCandidate::maybe(Subject::Class(ClassId(0)), NestKind::Inner, -10);
        assert_eq!(c.score, 0);
    }

    #[test]
    fn dummy_ranks_below_non_dummy_at_equal_score() {
        let dummy = NestCandidate::maybe(Subject::Class(ClassId(0)), NestKind::Dummy, 50);
        let real = NestCandidate::maybe(Subject::Class(ClassId(1)), NestKind::Inner, 50);
        assert_eq!(dummy.rank_cmp(&real), Ordering::Less);
        assert_eq!(real.rank_cmp(&dummy), Ordering::Greater);

        let other = NestCandidate::maybe(Subject::Class(ClassId(2)), NestKind::Anonymous, 50);
        assert_eq!(real.rank_cmp(&other), Ordering::Equal);
    }

    #[test]
    fn score_dominates_kind() {
        let dummy = NestCandidate::maybe(Subject::Class(ClassId(0)), NestKind::Dummy, 60);
        let real = NestCandidate::maybe(Subject::Class(ClassId(1)), NestKind::Inner, 50);
        assert_eq!(dummy.rank_cmp(&real), Ordering::Greater);
    }
}
