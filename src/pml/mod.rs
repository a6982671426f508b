//! Perfectly matched absorbing layers around the simulation domain.
//!
//! A level's layer is a set of padding blocks ([`make_box_array`]) carrying
//! split E/B (and optionally H, F) fields. The interior solver exchanges data
//! with it every step ([`exchange`], [`copy_to_pml`]), and the layer damps the
//! split components with per-block profiles ([`SigmaBox`]) whose decay
//! factors are cached per time step ([`MultiSigmaBox`]).

pub mod checkpoint;
pub mod config;
pub mod exchange;
pub mod factors;
pub mod fields;
pub mod layer;
pub mod layout;
pub mod medium;
pub mod sigma;
pub mod spectral;

pub use checkpoint::{read_field, write_field};
pub use config::{GuardCells, MaxwellSolver, MediumModel, PmlConfig};
pub use exchange::{copy_to_pml, exchange, split_sum};
pub use factors::{FieldKind, MultiSigmaBox};
pub use fields::{FieldGroup, FieldLayout, PatchFields, VectorField};
pub use layer::{Patch, PatchType, Pml, PmlBuilder};
pub use layout::{grown_domain, make_box_array, reduced_grids, LayerSides};
pub use medium::{ConstantMedium, MediumProperty, MediumProvider};
pub use sigma::{AxisProfile, NeighborKind, Sigma, SigmaBox};
#[cfg(feature = "spectral")]
pub use spectral::push_patch;
pub use spectral::{PmlComp, SpectralPmlIndex, SpectralSetup, SpectralSolver, SpectralSolverBuilder};
