//! Random cut selection (spec §4.2).

use crate::point::Point;
use crate::rng::TreeRng;

/// A hyperplane `(dim, value)` splitting a branch's subtree. Points
/// with `coord[dim] <= value` go left, others go right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cut {
    pub dim: usize,
    pub value: f64,
}

/// Selects a random cut separating `p` from the box `[lo, hi]`, per
/// spec §4.2: extend the box to cover `p`, weight each dimension by
/// its span in the extended box, draw uniformly over the total span,
/// and locate the dimension/offset the draw lands in.
///
/// `lo` and `hi` must have the same length as `p`'s dimension, and
/// that length must be nonzero. Never called when `p` already equals
/// the sole point in scope (duplicate detection happens earlier, per
/// spec §4.2's "total = 0" note).
pub fn select_cut(rng: &mut TreeRng, lo: &[f64], hi: &[f64], p: &dyn Point) -> Cut {
    let d = p.dim();
    debug_assert_eq!(lo.len(), d);
    debug_assert_eq!(hi.len(), d);

    let mut ext_lo = vec![0.0; d];
    let mut ext_hi = vec![0.0; d];
    let mut span = vec![0.0; d];
    let mut total = 0.0f64;
    for i in 0..d {
        let x = p.coord(i);
        ext_lo[i] = lo[i].min(x);
        ext_hi[i] = hi[i].max(x);
        span[i] = ext_hi[i] - ext_lo[i];
        total += span[i];
    }

    debug_assert!(total > 0.0, "select_cut called on a degenerate (zero-span) box");

    let r = rng.draw_scaled(total);
    let mut acc = 0.0f64;
    let mut cut_dim = d - 1;
    for i in 0..d {
        acc += span[i];
        if acc >= r {
            cut_dim = i;
            break;
        }
    }

    let value = ext_lo[cut_dim] + (acc - r);
    Cut {
        dim: cut_dim,
        value,
    }
}
