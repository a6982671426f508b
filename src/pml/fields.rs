//! Split-field storage of one patch of the absorbing layer.

use super::config::{GuardCells, MediumModel, PmlConfig};
use crate::arrays::BlockField;
use crate::geometry::{BoxArray, IndexType, IntVect, SpaceDim};
use crate::{Error, Result};

/// One field per Cartesian direction.
pub type VectorField = [BlockField; 3];

/// A field group whose presence is fixed at construction.
///
/// [`get`](Self::get) fails on an absent group; exchange and fill paths go
/// through [`as_option`](Self::as_option) and skip it instead.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGroup<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T> FieldGroup<T> {
    pub fn enabled(name: &'static str, value: T) -> Self {
        Self {
            name,
            value: Some(value),
        }
    }

    pub fn disabled(name: &'static str) -> Self {
        Self { name, value: None }
    }

    /// Allocate with `make` only when `enabled`.
    pub fn when(enabled: bool, name: &'static str, make: impl FnOnce() -> T) -> Self {
        Self {
            name,
            value: enabled.then(make),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Result<&T> {
        self.value.as_ref().ok_or(Error::Disabled(self.name))
    }

    pub fn get_mut(&mut self) -> Result<&mut T> {
        self.value.as_mut().ok_or(Error::Disabled(self.name))
    }

    pub fn as_option(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn as_option_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }
}

/// Staggering of the interior solver's fields, one entry per direction.
///
/// Layer fields are allocated with the same staggering so that block-to-block
/// copies line up index for index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub e: [IndexType; 3],
    pub b: [IndexType; 3],
    pub h: [IndexType; 3],
    pub j: [IndexType; 3],
}

impl FieldLayout {
    /// Yee staggering: E and J on edges, B and H on faces.
    pub fn yee(sdim: SpaceDim) -> Self {
        let edge = |d| IndexType::edge(d, sdim);
        let face = |d| IndexType::face(d, sdim);
        Self {
            e: [edge(0), edge(1), edge(2)],
            b: [face(0), face(1), face(2)],
            h: [face(0), face(1), face(2)],
            j: [edge(0), edge(1), edge(2)],
        }
    }

    /// Every component on the nodes, as used by nodal spectral solvers.
    pub fn nodal(sdim: SpaceDim) -> Self {
        let n = IndexType::nodal_in(sdim);
        Self {
            e: [n; 3],
            b: [n; 3],
            h: [n; 3],
            j: [n; 3],
        }
    }
}

fn vector_field(ba: &BoxArray, itypes: &[IndexType; 3], ncomp: usize, ng: IntVect) -> VectorField {
    [
        BlockField::with_type(ba, itypes[0], ncomp, ng),
        BlockField::with_type(ba, itypes[1], ncomp, ng),
        BlockField::with_type(ba, itypes[2], ncomp, ng),
    ]
}

/// All layer fields of one patch (fine or coarse), zero-initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchFields {
    pub e: VectorField,
    pub b: VectorField,
    pub h: FieldGroup<VectorField>,
    pub f: FieldGroup<BlockField>,
    pub j: VectorField,
    pub eps: FieldGroup<BlockField>,
    pub mu: FieldGroup<BlockField>,
    pub sigma: FieldGroup<BlockField>,
}

impl PatchFields {
    /// Allocate over the cell-centered layer block set `ba`.
    pub fn allocate(
        ba: &BoxArray,
        layout: &FieldLayout,
        config: &PmlConfig,
        guard: &GuardCells,
        sdim: SpaceDim,
    ) -> Self {
        let ncomp = config.split_components();
        let macroscopic = config.medium == MediumModel::Macroscopic;
        let medium = |name| FieldGroup::when(macroscopic, name, || BlockField::new(ba.clone(), 1, guard.e));

        Self {
            e: vector_field(ba, &layout.e, ncomp, guard.e),
            b: vector_field(ba, &layout.b, ncomp, guard.b),
            h: FieldGroup::when(config.magnetic_h, "H", || vector_field(ba, &layout.h, 2, guard.b)),
            f: FieldGroup::when(config.divergence_cleaning, "F", || {
                BlockField::with_type(ba, IndexType::nodal_in(sdim), 3, guard.f)
            }),
            j: vector_field(ba, &layout.j, 1, guard.b),
            eps: medium("eps"),
            mu: medium("mu"),
            sigma: medium("sigma"),
        }
    }

    pub fn h(&self) -> Result<&VectorField> {
        self.h.get()
    }

    pub fn f(&self) -> Result<&BlockField> {
        self.f.get()
    }

    pub fn eps(&self) -> Result<&BlockField> {
        self.eps.get()
    }

    pub fn mu(&self) -> Result<&BlockField> {
        self.mu.get()
    }

    pub fn sigma(&self) -> Result<&BlockField> {
        self.sigma.get()
    }
}
