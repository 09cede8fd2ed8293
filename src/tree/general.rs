//! The general tree variant (spec §4): full d-dimensional points at
//! leaves, no cached bounding box. Every descent step recomputes the
//! subtree box it needs from the leaves underneath it, per spec §3's
//! "General variant does not cache a root box — clients recompute by
//! traversing leaves if needed."

use crate::cut::select_cut;
use crate::display::{RenderNode, Shape};
use crate::error::{RrcfError, RrcfResult};
use crate::node::{Arena, Branch, Leaf, Node, NodeId};
use crate::point::{DensePoint, Point};
use crate::rng::TreeRng;

pub struct GeneralTree {
    arena: Arena<DensePoint, ()>,
    root: NodeId,
    dim: usize,
    rng: TreeRng,
}

impl GeneralTree {
    pub fn new(rng: TreeRng, dimension: usize) -> Self {
        assert!(dimension > 0, "tree dimension must be positive");
        GeneralTree {
            arena: Arena::new(),
            root: NodeId::NIL,
            dim: dimension,
            rng,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_nil()
    }

    fn check_dim(&self, p: &DensePoint) -> RrcfResult<()> {
        if p.dim() != self.dim {
            return Err(RrcfError::DimensionMismatch {
                expected: self.dim,
                found: p.dim(),
            });
        }
        Ok(())
    }

    /// Exact coordinate-wise min/max over every leaf under `id`.
    fn subtree_box(&self, id: NodeId) -> (Vec<f64>, Vec<f64>) {
        let mut min = vec![f64::INFINITY; self.dim];
        let mut max = vec![f64::NEG_INFINITY; self.dim];
        self.fold_box(id, &mut min, &mut max);
        (min, max)
    }

    fn fold_box(&self, id: NodeId, min: &mut [f64], max: &mut [f64]) {
        match self.arena.get(id) {
            Node::Leaf(l) => {
                for i in 0..self.dim {
                    let x = l.point.coord(i);
                    if x < min[i] {
                        min[i] = x;
                    }
                    if x > max[i] {
                        max[i] = x;
                    }
                }
            }
            Node::Branch(b) => {
                let (left, right) = (b.left, b.right);
                self.fold_box(left, min, max);
                self.fold_box(right, min, max);
            }
        }
    }

    /// Coordinate-wise min over all points currently in the tree.
    /// Not cached, per spec §3; recomputed by walking every leaf.
    pub fn get_min_box(&self) -> Vec<f64> {
        if self.root.is_nil() {
            return vec![f64::NAN; self.dim];
        }
        self.subtree_box(self.root).0
    }

    pub fn get_max_box(&self) -> Vec<f64> {
        if self.root.is_nil() {
            return vec![f64::NAN; self.dim];
        }
        self.subtree_box(self.root).1
    }

    fn adjust_num_chain(&mut self, mut id: NodeId, delta: i64) {
        loop {
            if id.is_nil() {
                break;
            }
            let next = {
                let node = self.arena.get_mut(id);
                match node {
                    Node::Leaf(l) => {
                        l.num = (l.num as i64 + delta) as u64;
                        l.parent
                    }
                    Node::Branch(b) => {
                        b.num = (b.num as i64 + delta) as u64;
                        b.parent
                    }
                }
            };
            id = next;
        }
    }

    pub fn insert_point(&mut self, p: DensePoint) -> RrcfResult<NodeId> {
        self.check_dim(&p)?;

        if self.root.is_nil() {
            let leaf = self.arena.insert(Node::Leaf(Leaf {
                point: p,
                num: 1,
                parent: NodeId::NIL,
            }));
            self.root = leaf;
            return Ok(leaf);
        }

        let mut node = self.root;
        let mut parent = NodeId::NIL;
        let mut node_is_left = false;
        let (mut lo, mut hi) = self.subtree_box(node);

        loop {
            if let Node::Leaf(leaf) = self.arena.get(node) {
                if leaf.point == p {
                    self.adjust_num_chain(node, 1);
                    return Ok(node);
                }
            }

            let cut = select_cut(&mut self.rng, &lo, &hi, &p);

            let left_escape = cut.value < lo[cut.dim];
            let right_escape = !left_escape && cut.value >= hi[cut.dim] && p.coord(cut.dim) > cut.value;

            if left_escape || right_escape {
                let displaced_num = self.arena.get(node).num();
                let new_leaf = self.arena.insert(Node::Leaf(Leaf {
                    point: p,
                    num: 1,
                    parent: NodeId::NIL,
                }));
                let (left, right) = if left_escape {
                    (new_leaf, node)
                } else {
                    (node, new_leaf)
                };
                let new_branch = self.arena.insert(Node::Branch(Branch {
                    cut,
                    left,
                    right,
                    num: displaced_num + 1,
                    parent,
                    extra: (),
                }));
                self.arena.get_mut(new_leaf).set_parent(new_branch);
                self.arena.get_mut(node).set_parent(new_branch);

                if parent.is_nil() {
                    self.root = new_branch;
                } else {
                    let pbranch = self.arena.get_mut(parent).as_branch_mut().unwrap();
                    if node_is_left {
                        pbranch.left = new_branch;
                    } else {
                        pbranch.right = new_branch;
                    }
                    self.adjust_num_chain(parent, 1);
                }
                return Ok(new_leaf);
            }

            let branch = self.arena.get(node).as_branch().expect("escape checks exhaust the leaf case");
            let use_left = p.coord(branch.cut.dim) <= branch.cut.value;
            let child = if use_left { branch.left } else { branch.right };
            parent = node;
            node_is_left = use_left;
            node = child;
            let (clo, chi) = self.subtree_box(node);
            lo = clo;
            hi = chi;
        }
    }

    pub fn forget_point(&mut self, p: &DensePoint) -> RrcfResult<NodeId> {
        self.check_dim(p)?;
        let leaf_id = self.query(p).ok_or(RrcfError::NotFound)?;
        let matches = matches!(self.arena.get(leaf_id), Node::Leaf(l) if &l.point == p);
        if !matches {
            return Err(RrcfError::NotFound);
        }

        let (num, parent) = {
            let leaf = self.arena.get(leaf_id).as_leaf().unwrap();
            (leaf.num, leaf.parent)
        };

        if num > 1 {
            self.adjust_num_chain(leaf_id, -1);
            return Ok(leaf_id);
        }

        if parent.is_nil() {
            self.root = NodeId::NIL;
            self.arena.remove(leaf_id);
            return Ok(leaf_id);
        }

        let (sibling, grandparent) = {
            let branch = self.arena.get(parent).as_branch().unwrap();
            let sibling = if branch.left == leaf_id { branch.right } else { branch.left };
            (sibling, branch.parent)
        };

        if grandparent.is_nil() {
            self.root = sibling;
            self.arena.get_mut(sibling).set_parent(NodeId::NIL);
        } else {
            let gbranch = self.arena.get_mut(grandparent).as_branch_mut().unwrap();
            if gbranch.left == parent {
                gbranch.left = sibling;
            } else {
                gbranch.right = sibling;
            }
            self.arena.get_mut(sibling).set_parent(grandparent);
            self.adjust_num_chain(grandparent, -1);
        }

        self.arena.remove(parent);
        self.arena.remove(leaf_id);
        Ok(leaf_id)
    }

    /// Descends from the root comparing `p`'s coordinates at each
    /// branch's cut dimension; returns the leaf reached. Does not
    /// guarantee the returned leaf equals `p` (spec §4.1).
    pub fn query(&self, p: &DensePoint) -> Option<NodeId> {
        if self.root.is_nil() {
            return None;
        }
        let mut node = self.root;
        loop {
            match self.arena.get(node) {
                Node::Leaf(_) => return Some(node),
                Node::Branch(b) => {
                    node = if p.coord(b.cut.dim) <= b.cut.value { b.left } else { b.right };
                }
            }
        }
    }

    pub fn find_leaf(&self, p: &DensePoint) -> Option<NodeId> {
        let leaf_id = self.query(p)?;
        match self.arena.get(leaf_id) {
            Node::Leaf(l) if &l.point == p => Some(leaf_id),
            _ => None,
        }
    }

    /// Maximum sibling/self count ratio (integer floor) on the walk
    /// from `leaf` to the root; `0` if `leaf` is the root (spec §4.4).
    pub fn get_collusive_displacement(&self, leaf: NodeId) -> u64 {
        let mut node = leaf;
        let mut max_ratio = 0u64;
        loop {
            let (node_num, parent) = {
                let n = self.arena.get(node);
                (n.num(), n.parent())
            };
            if parent.is_nil() {
                break;
            }
            let branch = self.arena.get(parent).as_branch().unwrap();
            let sibling = if branch.left == node { branch.right } else { branch.left };
            let sibling_num = self.arena.get(sibling).num();
            let ratio = sibling_num / node_num;
            if ratio > max_ratio {
                max_ratio = ratio;
            }
            node = parent;
        }
        max_ratio
    }

    pub fn map_leaves(&self, f: &mut impl FnMut(&Leaf<DensePoint>)) {
        if !self.root.is_nil() {
            self.walk_leaves(self.root, f);
        }
    }

    fn walk_leaves(&self, id: NodeId, f: &mut impl FnMut(&Leaf<DensePoint>)) {
        match self.arena.get(id) {
            Node::Leaf(l) => f(l),
            Node::Branch(b) => {
                self.walk_leaves(b.left, f);
                self.walk_leaves(b.right, f);
            }
        }
    }

    pub fn map_branches(&self, f: &mut impl FnMut(&Branch<()>)) {
        if !self.root.is_nil() {
            self.walk_branches(self.root, f);
        }
    }

    fn walk_branches(&self, id: NodeId, f: &mut impl FnMut(&Branch<()>)) {
        if let Node::Branch(b) = self.arena.get(id) {
            self.walk_branches(b.left, f);
            self.walk_branches(b.right, f);
            f(b);
        }
    }
}

impl RenderNode for GeneralTree {
    fn root(&self) -> Option<NodeId> {
        if self.root.is_nil() {
            None
        } else {
            Some(self.root)
        }
    }

    fn shape(&self, id: NodeId) -> Shape {
        match self.arena.get(id) {
            Node::Leaf(l) => Shape::Leaf {
                coords: l.point.to_vec(),
            },
            Node::Branch(b) => {
                let (min, max) = self.subtree_box(id);
                Shape::Branch {
                    dim: b.cut.dim,
                    value: b.cut.value,
                    min,
                    max,
                    left: b.left,
                    right: b.right,
                }
            }
        }
    }
}

impl std::fmt::Display for GeneralTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::display::render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Recursively checks, straight off the arena, that every branch's
    /// `num` is exactly its children's sum and that every leaf beneath
    /// a branch actually falls on the side its cut puts it on. Returns
    /// the subtree's own `num` so callers don't need a second pass.
    fn assert_invariants(tree: &GeneralTree, id: NodeId) -> u64 {
        match tree.arena.get(id) {
            Node::Leaf(l) => l.num,
            Node::Branch(b) => {
                let left_num = assert_invariants(tree, b.left);
                let right_num = assert_invariants(tree, b.right);
                assert_eq!(
                    b.num,
                    left_num + right_num,
                    "branch num {} does not equal left {left_num} + right {right_num}",
                    b.num
                );
                assert_side(tree, b.left, b.cut.dim, b.cut.value, true);
                assert_side(tree, b.right, b.cut.dim, b.cut.value, false);
                b.num
            }
        }
    }

    fn assert_side(tree: &GeneralTree, id: NodeId, dim: usize, value: f64, is_left: bool) {
        match tree.arena.get(id) {
            Node::Leaf(l) => {
                let x = l.point.coord(dim);
                if is_left {
                    assert!(x <= value, "leaf {x} on the left side exceeds cut value {value}");
                } else {
                    assert!(x > value, "leaf {x} on the right side does not exceed cut value {value}");
                }
            }
            Node::Branch(b) => {
                assert_side(tree, b.left, dim, value, is_left);
                assert_side(tree, b.right, dim, value, is_left);
            }
        }
    }

    fn check(tree: &GeneralTree) {
        if !tree.root.is_nil() {
            assert_invariants(tree, tree.root);
        }
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(Vec<f64>),
        Forget(Vec<f64>),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let coord = 0..6i64;
        let point = proptest::collection::vec(coord.prop_map(|n| n as f64), 2);
        prop_oneof![point.clone().prop_map(Op::Insert), point.prop_map(Op::Forget)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn count_and_partition_hold_after_random_op_sequences(
            seed in any::<u64>(),
            ops in proptest::collection::vec(op_strategy(), 1..40),
        ) {
            let mut tree = GeneralTree::new(TreeRng::from_seed(seed), 2);
            for op in ops {
                match op {
                    Op::Insert(coords) => { let _ = tree.insert_point(DensePoint::new(coords)); }
                    Op::Forget(coords) => { let _ = tree.forget_point(&DensePoint::new(coords)); }
                }
                check(&tree);
            }
        }
    }
}
