//! Read-only point views (spec §3 "Point").
//!
//! A [`Point`] is a uniform accessor over *d* floating-point
//! coordinates. Two shapes implement it: [`DensePoint`], which owns a
//! length-*d* array, and [`ShingledPoint`], which is a window into a
//! shared ring buffer reconstructed lazily from a start index and
//! width.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ring_buffer::RingBuffer;

/// Uniform d-dimensional read-only accessor over a sample's coordinates.
pub trait Point {
    fn dim(&self) -> usize;
    fn coord(&self, i: usize) -> f64;

    fn to_vec(&self) -> Vec<f64> {
        (0..self.dim()).map(|i| self.coord(i)).collect()
    }
}

/// Owns its coordinates outright. Used by the general tree variant.
#[derive(Clone, Debug, PartialEq)]
pub struct DensePoint {
    coords: Vec<f64>,
}

impl DensePoint {
    pub fn new(coords: Vec<f64>) -> Self {
        DensePoint { coords }
    }
}

impl Point for DensePoint {
    fn dim(&self) -> usize {
        self.coords.len()
    }

    fn coord(&self, i: usize) -> f64 {
        self.coords[i]
    }

    fn to_vec(&self) -> Vec<f64> {
        self.coords.clone()
    }
}

/// A width-`d` window over a shared scalar ring buffer, identified by
/// the logical index its first coordinate was written at. Two
/// shingled points compare equal iff they reference the same window
/// (spec §3): the `start` index alone carries identity, since the
/// underlying buffer is shared and immutable for any index still live.
#[derive(Clone, Debug)]
pub struct ShingledPoint {
    buffer: Rc<RefCell<RingBuffer>>,
    start: u64,
    width: usize,
}

impl ShingledPoint {
    pub fn new(buffer: Rc<RefCell<RingBuffer>>, start: u64, width: usize) -> Self {
        ShingledPoint {
            buffer,
            start,
            width,
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }
}

impl Point for ShingledPoint {
    fn dim(&self) -> usize {
        self.width
    }

    fn coord(&self, i: usize) -> f64 {
        assert!(i < self.width, "coordinate {i} out of range (width {})", self.width);
        self.buffer
            .borrow()
            .get(self.start + i as u64)
            .expect("shingled point references an evicted ring buffer position")
    }
}

impl PartialEq for ShingledPoint {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.width == other.width
    }
}

impl Eq for ShingledPoint {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_point_reads_back_coordinates() {
        let p = DensePoint::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.dim(), 3);
        assert_eq!(p.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn shingled_points_compare_by_window_identity() {
        let buf = Rc::new(RefCell::new(RingBuffer::new(10)));
        for i in 0..5 {
            buf.borrow_mut().push(i as f64);
        }
        let a = ShingledPoint::new(buf.clone(), 1, 3);
        let b = ShingledPoint::new(buf.clone(), 1, 3);
        let c = ShingledPoint::new(buf, 2, 3);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_vec(), vec![1.0, 2.0, 3.0]);
    }
}
