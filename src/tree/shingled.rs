//! The shingled tree variant (spec §3–§4): leaves store only a start
//! index into a shared ring buffer, and every branch carries
//! bit-packed bounding-box metadata so any child's box can be decoded
//! from its parent's in O(d) on descent.
//!
//! Box maintenance uses the **recompute** strategy spec §4.3
//! explicitly licenses: after any structural change, a single
//! post-order walk rebuilds every branch's box metadata bottom-up
//! from exact leaf coordinates. See DESIGN.md for why this crate
//! doesn't attempt the reference's incremental `shrinkBoxUpwards`/
//! `expandBoxDownwards` paths.

use crate::cut::select_cut;
use crate::display::{RenderNode, Shape};
use crate::error::{RrcfError, RrcfResult};
use crate::node::{Arena, BitPackedBox, Branch, Leaf, Node, NodeId};
use crate::point::{Point, ShingledPoint};
use crate::rng::TreeRng;

pub struct ShingledTree {
    arena: Arena<ShingledPoint, BitPackedBox>,
    root: NodeId,
    dim: usize,
    rng: TreeRng,
    root_min: Vec<f64>,
    root_max: Vec<f64>,
}

impl ShingledTree {
    pub fn new(rng: TreeRng, shingle_width: usize) -> Self {
        assert!(shingle_width > 0, "shingle width must be positive");
        ShingledTree {
            arena: Arena::new(),
            root: NodeId::NIL,
            dim: shingle_width,
            rng,
            root_min: vec![f64::NAN; shingle_width],
            root_max: vec![f64::NAN; shingle_width],
        }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_nil()
    }

    fn check_dim(&self, p: &ShingledPoint) -> RrcfResult<()> {
        if p.dim() != self.dim {
            return Err(RrcfError::DimensionMismatch {
                expected: self.dim,
                found: p.dim(),
            });
        }
        Ok(())
    }

    pub fn get_min_box(&self) -> Vec<f64> {
        self.root_min.clone()
    }

    pub fn get_max_box(&self) -> Vec<f64> {
        self.root_max.clone()
    }

    fn adjust_num_chain(&mut self, mut id: NodeId, delta: i64) {
        loop {
            if id.is_nil() {
                break;
            }
            let next = match self.arena.get_mut(id) {
                Node::Leaf(l) => {
                    l.num = (l.num as i64 + delta) as u64;
                    l.parent
                }
                Node::Branch(b) => {
                    b.num = (b.num as i64 + delta) as u64;
                    b.parent
                }
            };
            id = next;
        }
    }

    /// Rebuilds every branch's bit-packed box metadata and the cached
    /// root box from exact leaf coordinates, bottom-up (spec §4.3).
    fn recompute_boxes(&mut self) {
        if self.root.is_nil() {
            self.root_min = vec![f64::NAN; self.dim];
            self.root_max = vec![f64::NAN; self.dim];
            return;
        }
        let (min, max) = self.recompute_node(self.root);
        self.root_min = min;
        self.root_max = max;
    }

    fn recompute_node(&mut self, id: NodeId) -> (Vec<f64>, Vec<f64>) {
        let (left, right) = match self.arena.get(id) {
            Node::Leaf(l) => {
                let v = l.point.to_vec();
                return (v.clone(), v);
            }
            Node::Branch(b) => (b.left, b.right),
        };
        let (lmin, lmax) = self.recompute_node(left);
        let (rmin, rmax) = self.recompute_node(right);
        let (bb, min, max) = BitPackedBox::from_children(&lmin, &lmax, &rmin, &rmax);
        self.arena.get_mut(id).as_branch_mut().unwrap().extra = bb;
        (min, max)
    }

    pub fn insert_point(&mut self, p: ShingledPoint) -> RrcfResult<NodeId> {
        self.check_dim(&p)?;

        if self.root.is_nil() {
            let leaf = self.arena.insert(Node::Leaf(Leaf {
                point: p,
                num: 1,
                parent: NodeId::NIL,
            }));
            self.root = leaf;
            self.recompute_boxes();
            return Ok(leaf);
        }

        let mut node = self.root;
        let mut parent = NodeId::NIL;
        let mut node_is_left = false;
        let mut lo = self.root_min.clone();
        let mut hi = self.root_max.clone();

        let result = loop {
            if let Node::Leaf(leaf) = self.arena.get(node) {
                if leaf.point == p {
                    self.adjust_num_chain(node, 1);
                    break node;
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
                    extra: BitPackedBox::new(self.dim),
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
                break new_leaf;
            }

            let branch = self.arena.get(node).as_branch().expect("escape checks exhaust the leaf case");
            let use_left = p.coord(branch.cut.dim) <= branch.cut.value;
            let (clo, chi) = if use_left {
                branch.extra.left_box(&lo, &hi)
            } else {
                branch.extra.right_box(&lo, &hi)
            };
            let child = if use_left { branch.left } else { branch.right };
            parent = node;
            node_is_left = use_left;
            node = child;
            lo = clo;
            hi = chi;
        };

        self.recompute_boxes();
        Ok(result)
    }

    pub fn forget_point(&mut self, p: &ShingledPoint) -> RrcfResult<NodeId> {
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
            self.recompute_boxes();
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
        self.recompute_boxes();
        Ok(leaf_id)
    }

    pub fn query(&self, p: &ShingledPoint) -> Option<NodeId> {
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

    pub fn find_leaf(&self, p: &ShingledPoint) -> Option<NodeId> {
        let leaf_id = self.query(p)?;
        match self.arena.get(leaf_id) {
            Node::Leaf(l) if &l.point == p => Some(leaf_id),
            _ => None,
        }
    }

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

    pub fn map_leaves(&self, f: &mut impl FnMut(&Leaf<ShingledPoint>)) {
        if !self.root.is_nil() {
            self.walk_leaves(self.root, f);
        }
    }

    fn walk_leaves(&self, id: NodeId, f: &mut impl FnMut(&Leaf<ShingledPoint>)) {
        match self.arena.get(id) {
            Node::Leaf(l) => f(l),
            Node::Branch(b) => {
                self.walk_leaves(b.left, f);
                self.walk_leaves(b.right, f);
            }
        }
    }

    pub fn map_branches(&self, f: &mut impl FnMut(&Branch<BitPackedBox>)) {
        if !self.root.is_nil() {
            self.walk_branches(self.root, f);
        }
    }

    fn walk_branches(&self, id: NodeId, f: &mut impl FnMut(&Branch<BitPackedBox>)) {
        if let Node::Branch(b) = self.arena.get(id) {
            self.walk_branches(b.left, f);
            self.walk_branches(b.right, f);
            f(b);
        }
    }
}

impl RenderNode for ShingledTree {
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
                // Rendering a branch visits it bottom-up with no parent
                // box in hand, so its own box comes from folding its
                // children's boxes directly rather than decoding `extra`
                // (which needs the parent's box as an input).
                let (min, max) = self.decode_box(id);
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

impl ShingledTree {
    /// A branch's exact box, folded bottom-up from its two children
    /// (leaves are exact by construction). Used only for display: the
    /// `BitPackedBox` decode path needs a parent box to decode
    /// against, which a branch visited on its own doesn't have.
    fn decode_box(&self, id: NodeId) -> (Vec<f64>, Vec<f64>) {
        match self.arena.get(id) {
            Node::Leaf(l) => {
                let v = l.point.to_vec();
                (v.clone(), v)
            }
            Node::Branch(b) => {
                let (lmin, lmax) = self.decode_box(b.left);
                let (rmin, rmax) = self.decode_box(b.right);
                let mut min = vec![0.0; self.dim];
                let mut max = vec![0.0; self.dim];
                for i in 0..self.dim {
                    min[i] = lmin[i].min(rmin[i]);
                    max[i] = lmax[i].max(rmax[i]);
                }
                (min, max)
            }
        }
    }
}

impl std::fmt::Display for ShingledTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::display::render(self))
    }
}
