//! Field storage over block sets.

mod block_array;
mod block_field;

pub use block_array::BlockArray;
pub use block_field::BlockField;
