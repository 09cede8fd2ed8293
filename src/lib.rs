//! Robust Random Cut Forest: an online anomaly-detection library built
//! from random cut trees maintained incrementally as points stream in
//! and out of a sliding window.
//!
//! Two tree variants share one node/arena/cut-selection core:
//! [`tree::GeneralTree`] holds full points at its leaves;
//! [`tree::ShingledTree`] reconstructs points from a shared
//! [`ring_buffer::RingBuffer`] and maintains bit-packed incremental
//! bounding boxes. [`forest::Forest`] drives a bank of shingled trees
//! over one streaming scalar series and reports a CoDisp-based
//! anomaly score per point.

pub mod bitset;
pub mod cut;
pub mod display;
pub mod error;
pub mod forest;
pub mod node;
pub mod point;
pub mod ring_buffer;
pub mod rng;
pub mod tree;

pub use error::{RrcfError, RrcfResult};
pub use forest::Forest;
pub use node::NodeId;
pub use point::{DensePoint, Point, ShingledPoint};
pub use ring_buffer::RingBuffer;
pub use rng::TreeRng;
pub use tree::{GeneralTree, ShingledTree};
