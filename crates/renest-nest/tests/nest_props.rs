use proptest::prelude::*;
use renest_graph::{ClassGraph, ClassId, GraphBuilder, MethodId};
use renest_nest::{NestKind, NestingGraph, Subject};

const PROPTEST_CASES: u32 = 256;
const POOL: usize = 8;

fn pool_graph() -> (ClassGraph, Vec<(ClassId, MethodId)>) {
    let mut b = GraphBuilder::new();
    let mut pool = Vec::with_capacity(POOL);
    for i in 0..POOL {
        let class = b.add_class(&format!("p/C{i}"), 0);
        let run = b
            .add_method(class, "run", "()V", 0)
            .expect("valid descriptor");
        pool.push((class, run));
    }
    (b.finish(), pool)
}

#[derive(Clone, Debug)]
struct NestOp {
    class: usize,
    target: usize,
    anonymous: bool,
    unassign: bool,
}

fn arb_op() -> impl Strategy<Value = NestOp> {
    (0..POOL, 0..POOL, any::<bool>(), prop::bool::weighted(0.2)).prop_map(
        |(class, target, anonymous, unassign)| NestOp {
            class,
            target,
            anonymous,
            unassign,
        },
    )
}

/// Follows the nest chain from `class`, panicking if it ever comes back
/// around or fails to terminate.
fn assert_chain_acyclic(g: &NestingGraph, class: ClassId) {
    let mut seen = vec![class];
    let mut current = class;
    while let Some(nest) = g.nest(current) {
        let next = g.enclosing_class_of(nest.subject);
        assert!(
            !seen.contains(&next),
            "nest chain from {:?} revisits {:?}",
            class,
            next
        );
        seen.push(next);
        current = next;
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn random_assignments_never_form_cycles(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (graph, pool) = pool_graph();
        let mut g = NestingGraph::new(graph);

        for op in ops {
            let (class, _) = pool[op.class];
            if op.unassign {
                g.unassign(class);
                continue;
            }
            let (target_class, target_method) = pool[op.target];
            let subject = if op.anonymous {
                Subject::Method(target_method)
            } else {
                Subject::Class(target_class)
            };
            let kind = if op.anonymous {
                NestKind::Anonymous
            } else {
                NestKind::Inner
            };
            // rejected assignments must leave the graph untouched
            let before = g.nest(class);
            if g.assign(class, subject, kind).is_err() {
                prop_assert_eq!(g.nest(class), before);
            }
        }

        for &(class, _) in &pool {
            assert_chain_acyclic(&g, class);
        }
    }

    #[test]
    fn anonymous_renumbering_is_stable(remove in 0..POOL - 1) {
        let (graph, pool) = pool_graph();
        let mut g = NestingGraph::new(graph);
        let (_, run) = pool[0];

        let children: Vec<ClassId> = pool[1..].iter().map(|&(c, _)| c).collect();
        for &child in &children {
            g.assign_anonymous(child, pool[0].0, Some(run)).unwrap();
        }
        // recover sibling order from the assigned indices
        let mut numbered: Vec<(usize, ClassId)> = children
            .iter()
            .map(|&c| (g.inner_name(c).parse::<usize>().unwrap(), c))
            .collect();
        numbered.sort();
        let before: Vec<ClassId> = numbered.iter().map(|&(_, c)| c).collect();
        prop_assert_eq!(
            numbered.iter().map(|&(n, _)| n).collect::<Vec<_>>(),
            (1..children.len() + 1).collect::<Vec<_>>()
        );

        let removed = before[remove];
        g.unassign(removed);

        let mut after: Vec<(usize, ClassId)> = before
            .iter()
            .copied()
            .filter(|&c| c != removed)
            .map(|c| (g.inner_name(c).parse::<usize>().unwrap(), c))
            .collect();
        after.sort();
        prop_assert_eq!(
            after.iter().map(|&(n, _)| n).collect::<Vec<_>>(),
            (1..children.len()).collect::<Vec<_>>()
        );
        // surviving siblings keep their relative order
        let survivors: Vec<ClassId> = before.iter().copied().filter(|&c| c != removed).collect();
        prop_assert_eq!(after.into_iter().map(|(_, c)| c).collect::<Vec<_>>(), survivors);
    }
}
