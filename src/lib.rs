//! Split-field perfectly matched layers for block-structured AMR
//! electromagnetic solvers.
//!
//! The crate surrounds a (possibly multi-block, possibly refined) simulation
//! domain with an absorbing padding region and keeps that region in sync with
//! the interior solver every step:
//!
//! - [`pml::make_box_array`] builds the padding blocks around an interior block set
//! - [`pml::SigmaBox`] synthesizes the quadratic damping profiles per block
//! - [`pml::MultiSigmaBox`] caches the per-timestep exponential decay factors
//! - [`pml::Pml`] owns the split fields of one refinement level (fine and coarse)
//! - [`pml::exchange`] moves data between the layer and the interior fields
//!
//! The [`geometry`] and [`arrays`] modules are a shared-memory rendition of
//! the block-partition service the layer is built on.

pub mod arrays;
pub mod constants;
pub mod geometry;
pub mod pml;

use thiserror::Error;

/// Errors raised by the absorbing layer subsystem.
///
/// Every variant except [`Error::Disabled`] describes a structural
/// inconsistency; retrying the same operation cannot succeed.
#[derive(Debug, Error)]
pub enum Error {
    /// User or programmer misconfiguration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A geometric classification that should be exhaustive was not.
    #[error("internal consistency error: {0}")]
    Internal(String),

    /// Invalid numerical input (non-finite time step, cell size, ...).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// A field group was queried on a configuration that never allocated it.
    #[error("field group `{0}` is not allocated for this configuration")]
    Disabled(&'static str),

    /// Checkpoint data missing or malformed.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
