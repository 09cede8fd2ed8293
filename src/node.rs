//! Node model (spec §3) and the arena that owns nodes.
//!
//! Nodes are addressed by [`NodeId`], a newtype index into an
//! arena-backed [`Arena`], rather than by raw pointer: `spec.md` §9
//! explicitly permits "arena-plus-index" for implementations without
//! raw pointers, mirroring the teacher crate's own `NodeRef(u32,
//! PhantomData)` handle and its `NULL_NODE: u32 = u32::MAX` sentinel.
//! Identity comparison throughout the tree is `NodeId` equality.

use crate::bitset::BitSet;
use crate::cut::Cut;

/// Index into a tree's node arena. `NodeId::NIL` stands in for "no
/// node" (an empty optional parent/child slot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const NIL: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_nil(self) -> bool {
        self == NodeId::NIL
    }

    #[inline]
    fn from_index(i: usize) -> Self {
        assert!(i < u32::MAX as usize, "node arena exhausted");
        NodeId(i as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-branch bit-packed bounding-box metadata (spec §3). For each
/// dimension, one bit says which child supplies the *looser* bound
/// and one scalar holds that looser bound; the tighter child's bound
/// is always inherited from the parent's own box on descent.
#[derive(Clone, Debug)]
pub struct BitPackedBox {
    min_dir: BitSet,
    min_val: Vec<f64>,
    max_dir: BitSet,
    max_val: Vec<f64>,
}

impl BitPackedBox {
    pub fn new(dim: usize) -> Self {
        BitPackedBox {
            min_dir: BitSet::zeros(dim),
            min_val: vec![0.0; dim],
            max_dir: BitSet::zeros(dim),
            max_val: vec![0.0; dim],
        }
    }

    /// Builds the metadata for a branch from its two children's exact
    /// boxes, applying the "left child wins ties" tiebreak (spec §9)
    /// uniformly to both the min and max direction bits. Returns the
    /// metadata plus the branch's own exact box.
    pub fn from_children(
        left_min: &[f64],
        left_max: &[f64],
        right_min: &[f64],
        right_max: &[f64],
    ) -> (Self, Vec<f64>, Vec<f64>) {
        let dim = left_min.len();
        debug_assert_eq!(left_max.len(), dim);
        debug_assert_eq!(right_min.len(), dim);
        debug_assert_eq!(right_max.len(), dim);

        let mut bb = BitPackedBox::new(dim);
        let mut min = vec![0.0; dim];
        let mut max = vec![0.0; dim];

        for i in 0..dim {
            // Min: the tighter (smaller) child's min is the branch min.
            // Ties favor the left child.
            if left_min[i] <= right_min[i] {
                min[i] = left_min[i];
                bb.min_dir.set(i, false);
                bb.min_val[i] = right_min[i];
            } else {
                min[i] = right_min[i];
                bb.min_dir.set(i, true);
                bb.min_val[i] = left_min[i];
            }

            // Max: the tighter (larger) child's max is the branch max.
            // Ties favor the left child.
            if left_max[i] >= right_max[i] {
                max[i] = left_max[i];
                bb.max_dir.set(i, false);
                bb.max_val[i] = right_max[i];
            } else {
                max[i] = right_max[i];
                bb.max_dir.set(i, true);
                bb.max_val[i] = left_max[i];
            }
        }

        (bb, min, max)
    }

    /// Decodes the left child's box given the parent's own box.
    pub fn left_box(&self, parent_min: &[f64], parent_max: &[f64]) -> (Vec<f64>, Vec<f64>) {
        self.child_box(false, parent_min, parent_max)
    }

    /// Decodes the right child's box given the parent's own box.
    pub fn right_box(&self, parent_min: &[f64], parent_max: &[f64]) -> (Vec<f64>, Vec<f64>) {
        self.child_box(true, parent_min, parent_max)
    }

    /// `min_dir[i]`/`max_dir[i]` name which child is *looser* (see the
    /// type doc comment), so the child being decoded takes the stored
    /// value when it is the looser one, i.e. when its own side
    /// (`is_right`) disagrees with the direction bit.
    fn child_box(&self, is_right: bool, parent_min: &[f64], parent_max: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let dim = self.min_dir.len();
        let mut min = vec![0.0; dim];
        let mut max = vec![0.0; dim];
        for i in 0..dim {
            min[i] = if self.min_dir.get(i) != is_right {
                self.min_val[i]
            } else {
                parent_min[i]
            };
            max[i] = if self.max_dir.get(i) != is_right {
                self.max_val[i]
            } else {
                parent_max[i]
            };
        }
        (min, max)
    }
}

/// Terminal node: one point view and a duplicate count (`num >= 1`;
/// duplicates collapse into one leaf with `num > 1`). Depth isn't
/// stored: nothing in the tree's contract reads it, so it's derived
/// on demand by walking parent links instead of being kept in sync
/// under every insert/forget restructuring (see DESIGN.md).
#[derive(Clone, Debug)]
pub struct Leaf<P> {
    pub point: P,
    pub num: u64,
    pub parent: NodeId,
}

/// Internal node: a cut, two children, the subtree's total count, and
/// (shingled variant only) bounding-box metadata.
#[derive(Clone, Debug)]
pub struct Branch<Extra> {
    pub cut: Cut,
    pub left: NodeId,
    pub right: NodeId,
    pub num: u64,
    pub parent: NodeId,
    pub extra: Extra,
}

/// Tagged Leaf/Branch node, the sum type spec §9 asks for in place of
/// the reference's runtime type inspection.
#[derive(Clone, Debug)]
pub enum Node<P, Extra> {
    Leaf(Leaf<P>),
    Branch(Branch<Extra>),
}

impl<P, Extra> Node<P, Extra> {
    pub fn parent(&self) -> NodeId {
        match self {
            Node::Leaf(l) => l.parent,
            Node::Branch(b) => b.parent,
        }
    }

    pub fn set_parent(&mut self, parent: NodeId) {
        match self {
            Node::Leaf(l) => l.parent = parent,
            Node::Branch(b) => b.parent = parent,
        }
    }

    pub fn num(&self) -> u64 {
        match self {
            Node::Leaf(l) => l.num,
            Node::Branch(b) => b.num,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf<P>> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Branch(_) => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut Leaf<P>> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&Branch<Extra>> {
        match self {
            Node::Branch(b) => Some(b),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_branch_mut(&mut self) -> Option<&mut Branch<Extra>> {
        match self {
            Node::Branch(b) => Some(b),
            Node::Leaf(_) => None,
        }
    }
}

enum Slot<T> {
    Occupied(T),
    Free(u32),
}

/// Owns every node of a tree. Slots freed by `forgetPoint` are tracked
/// on a free list and reused by the next `insertPoint`, so repeated
/// insert/forget cycles don't grow the arena without bound (spec §3
/// "Lifecycle").
pub struct Arena<P, Extra> {
    slots: Vec<Slot<Node<P, Extra>>>,
    free_head: Option<u32>,
}

impl<P, Extra> Arena<P, Extra> {
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free_head: None,
        }
    }

    pub fn insert(&mut self, node: Node<P, Extra>) -> NodeId {
        match self.free_head {
            Some(idx) => {
                let next = match &self.slots[idx as usize] {
                    Slot::Free(next) => *next,
                    Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                };
                self.free_head = if next == u32::MAX { None } else { Some(next) };
                self.slots[idx as usize] = Slot::Occupied(node);
                NodeId::from_index(idx as usize)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId::from_index(self.slots.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, id: NodeId) -> Node<P, Extra> {
        let idx = id.index();
        let next = self.free_head.unwrap_or(u32::MAX);
        let old = std::mem::replace(&mut self.slots[idx], Slot::Free(next));
        self.free_head = Some(idx as u32);
        match old {
            Slot::Occupied(node) => node,
            Slot::Free(_) => panic!("double free of node {idx}"),
        }
    }

    pub fn get(&self, id: NodeId) -> &Node<P, Extra> {
        match &self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Free(_) => panic!("access to freed node {}", id.index()),
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<P, Extra> {
        match &mut self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Free(_) => panic!("access to freed node {}", id.index()),
        }
    }
}

impl<P, Extra> Default for Arena<P, Extra> {
    fn default() -> Self {
        Self::new()
    }
}
