//! The forest (spec §4.5, named as a collaborator in §6): a bank of
//! shingled trees sharing one ring buffer, producing a single CoDisp
//! score per point by averaging across trees.

use std::cell::RefCell;
use std::rc::Rc;

use rand::{Rng as _, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::point::ShingledPoint;
use crate::ring_buffer::RingBuffer;
use crate::rng::TreeRng;
use crate::tree::ShingledTree;

pub struct Forest {
    trees: Vec<ShingledTree>,
    buffer: Rc<RefCell<RingBuffer>>,
    shingle_width: usize,
    tree_size: usize,
    windows_built: u64,
}

impl Forest {
    /// Builds `num_trees` shingled trees of the given shingle width,
    /// each capped at `tree_size` points and seeded from an
    /// independent stream split off `seed` (spec §4.5): reproducible
    /// given the root seed, independent in practice, without
    /// `num_trees` trees sharing one literal seed.
    pub fn new(num_trees: usize, tree_size: usize, shingle_width: usize, seed: u64) -> Self {
        assert!(num_trees > 0, "forest must hold at least one tree");
        assert!(tree_size > 0, "tree size must be positive");
        let mut root_rng = ChaCha8Rng::seed_from_u64(seed);
        let trees = (0..num_trees)
            .map(|_| {
                let tree_seed = root_rng.gen::<u64>();
                ShingledTree::new(TreeRng::from_seed(tree_seed), shingle_width)
            })
            .collect();
        Forest {
            trees,
            buffer: Rc::new(RefCell::new(RingBuffer::new(tree_size + shingle_width))),
            shingle_width,
            tree_size,
            windows_built: 0,
        }
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn shingle_width(&self) -> usize {
        self.shingle_width
    }

    /// Appends `x` to the shared buffer. Once the buffer holds at
    /// least `shingle_width` scalars, builds the newest shingled
    /// point, evicts the oldest point from every tree once `tree_size`
    /// points are live, inserts the new point into every tree, and
    /// returns the mean collusive displacement of the freshly inserted
    /// leaves across the forest (spec §4.5). Returns `0.0` while the
    /// very first window is still filling.
    pub fn add_point(&mut self, x: f64) -> f64 {
        let raw_count = {
            let mut buf = self.buffer.borrow_mut();
            buf.push(x);
            buf.next_index()
        };

        if raw_count < self.shingle_width as u64 {
            return 0.0;
        }
        let new_start = raw_count - self.shingle_width as u64;

        if self.windows_built >= self.tree_size as u64 {
            let oldest_start = new_start - self.tree_size as u64;
            let stale = ShingledPoint::new(self.buffer.clone(), oldest_start, self.shingle_width);
            for tree in &mut self.trees {
                tree.forget_point(&stale)
                    .expect("forest only ever evicts a point every tree holds");
            }
        }

        let mut total = 0.0f64;
        for tree in &mut self.trees {
            let point = ShingledPoint::new(self.buffer.clone(), new_start, self.shingle_width);
            let leaf = tree
                .insert_point(point)
                .expect("forest only ever inserts points matching each tree's configured width");
            total += tree.get_collusive_displacement(leaf) as f64;
        }
        self.windows_built += 1;
        total / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_settle_once_window_fills() {
        let mut forest = Forest::new(3, 16, 4, 42);
        let mut last = 0.0;
        for i in 0..40 {
            last = forest.add_point((i % 5) as f64);
        }
        assert!(last.is_finite());
        assert!(last >= 0.0);
    }

    #[test]
    fn first_points_below_shingle_width_score_zero() {
        let mut forest = Forest::new(2, 8, 5, 1);
        for _ in 0..4 {
            assert_eq!(forest.add_point(1.0), 0.0);
        }
    }
}
