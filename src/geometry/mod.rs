//! Index-space geometry: boxes, box arrays and domain description.

mod box_array;
mod domain;
mod index_box;

pub use box_array::BoxArray;
pub use domain::{Geometry, Periodicity};
pub use index_box::{BoxIter, IndexBox, IndexType, IntVect, SpaceDim};
