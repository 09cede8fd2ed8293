use test_utils::*;

// ============================================================================
// SCENARIO 6 — SEEDED AGREEMENT
// ============================================================================

#[test]
fn same_seed_renders_identically_across_independent_runs() {
    let render = || {
        let mut tree = dense_tree(2024, 2);
        tree.insert_point(p(&[1.0, 0.0])).unwrap();
        tree.insert_point(p(&[0.0, 1.0])).unwrap();
        tree.insert_point(p(&[1.0, 1.0])).unwrap();
        tree.insert_point(p(&[0.0, 0.0])).unwrap();
        tree.to_string()
    };

    let first = render();
    let second = render();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

// ============================================================================
// VARIANT AGREEMENT — general and shingled must render byte-identically
// ============================================================================

#[test]
fn general_and_shingled_trees_agree_on_rendering() {
    let seed = 777;

    let mut general = dense_tree(seed, 2);
    for coords in [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]] {
        general.insert_point(p(&coords)).unwrap();
    }

    // Non-overlapping windows over a raw stream chosen so each window
    // reproduces the same 2D points the general tree saw, in the same
    // order.
    let mut fixture = ShingledFixture::new(seed, 2, 8);
    let raw = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0];
    for x in raw {
        fixture.push(x);
    }
    for start in [0u64, 2, 4, 6] {
        let point = fixture.window_at(start);
        fixture.tree.insert_point(point).unwrap();
    }

    assert_eq!(general.to_string(), fixture.tree.to_string());
}

#[test]
fn insert_then_forget_same_point_on_empty_tree_is_a_no_op() {
    let mut tree = dense_tree(3, 2);
    tree.insert_point(p(&[4.0, 4.0])).unwrap();
    tree.forget_point(&p(&[4.0, 4.0])).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.to_string(), "");
}
