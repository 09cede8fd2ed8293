//! The two tree variants (spec §2): [`general`] stores full d-dimensional
//! points at leaves; [`shingled`] reconstructs points lazily from a
//! shared ring buffer and maintains bit-packed incremental bounding
//! boxes. Both expose the contract in spec §4.1 and share the
//! [`crate::display`] renderer so their `toString()` output agrees
//! byte-for-byte given the same seed and operation sequence.

pub mod general;
pub mod shingled;

pub use general::GeneralTree;
pub use shingled::ShingledTree;
