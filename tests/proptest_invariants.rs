use proptest::prelude::*;
use rrcf::{DensePoint, GeneralTree, TreeRng};

const DIM: usize = 2;

fn coord_strategy() -> impl Strategy<Value = f64> {
    // A small discretized range so insert/forget sequences generate
    // plenty of duplicates, exercising the num-collapse paths.
    (0..6i64).prop_map(|n| n as f64)
}

fn point_strategy() -> impl Strategy<Value = DensePoint> {
    proptest::collection::vec(coord_strategy(), DIM).prop_map(DensePoint::new)
}

#[derive(Clone, Debug)]
enum Op {
    Insert(DensePoint),
    Forget(DensePoint),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        point_strategy().prop_map(Op::Insert),
        point_strategy().prop_map(Op::Forget),
    ]
}

// Count consistency and partition correctness need to inspect node
// relationships the public API doesn't expose (which leaf belongs to
// which branch's child); those are fuzzed directly against the arena
// in `src/tree/general.rs` and `src/tree/shingled.rs`'s own
// `#[cfg(test)]` modules instead. This file sticks to properties
// actually observable through the public contract.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_op_sequences_never_panic_and_stay_internally_coherent(
        seed in any::<u64>(),
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let mut tree = GeneralTree::new(TreeRng::from_seed(seed), DIM);
        for op in ops {
            match op {
                Op::Insert(point) => {
                    let _ = tree.insert_point(point);
                }
                Op::Forget(point) => {
                    let _ = tree.forget_point(&point);
                }
            }
            // Every leaf's own point must still resolve to some leaf
            // under a cut-guided descent (never panics, never finds
            // nothing) and every leaf must carry at least one point.
            let mut leaves = Vec::new();
            tree.map_leaves(&mut |leaf| leaves.push(leaf.point.clone()));
            for point in &leaves {
                assert!(tree.query(point).is_some());
            }
            tree.map_leaves(&mut |leaf| assert!(leaf.num >= 1));
            tree.map_branches(&mut |b| assert!(b.num >= 2));
        }
    }

    #[test]
    fn round_trip_insert_then_forget_empties_the_tree(
        seed in any::<u64>(),
        point in point_strategy(),
    ) {
        let mut tree = GeneralTree::new(TreeRng::from_seed(seed), DIM);
        tree.insert_point(point.clone()).unwrap();
        tree.forget_point(&point).unwrap();
        prop_assert!(tree.is_empty());
    }

    #[test]
    fn duplicate_idempotence(
        seed in any::<u64>(),
        point in point_strategy(),
        k in 1usize..6,
    ) {
        let mut tree = GeneralTree::new(TreeRng::from_seed(seed), DIM);
        for _ in 0..k {
            tree.insert_point(point.clone()).unwrap();
        }
        for _ in 0..k {
            tree.forget_point(&point).unwrap();
        }
        prop_assert!(tree.is_empty());
    }
}
