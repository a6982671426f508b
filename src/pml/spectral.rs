//! Split-field push through a frequency-domain Maxwell solver.
//!
//! The layer owns the split components, the solver owns the transforms and
//! the analytic PML update. Each split component is submitted under a tag
//! naming the field, its direction and the axis it is damped along, so the
//! solver can pick the matching evolution operator.

use super::factors::FieldKind;
#[cfg(feature = "spectral")]
use super::fields::VectorField;
use crate::arrays::BlockField;
use crate::geometry::BoxArray;
use crate::Result;

/// Split sub-component index inside a layer field, by damping axis pair.
///
/// `xy` is the x-directed component damped along y, and so on.
pub struct PmlComp;

impl PmlComp {
    pub const XY: usize = 0;
    pub const XZ: usize = 1;
    pub const YZ: usize = 0;
    pub const YX: usize = 1;
    pub const ZX: usize = 0;
    pub const ZY: usize = 1;
}

/// Tag of a split component in spectral space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralPmlIndex {
    Exy,
    Exz,
    Eyz,
    Eyx,
    Ezx,
    Ezy,
    Bxy,
    Bxz,
    Byz,
    Byx,
    Bzx,
    Bzy,
}

impl SpectralPmlIndex {
    /// Submission order for both transform directions.
    pub const ORDER: [SpectralPmlIndex; 12] = [
        SpectralPmlIndex::Exy,
        SpectralPmlIndex::Exz,
        SpectralPmlIndex::Eyz,
        SpectralPmlIndex::Eyx,
        SpectralPmlIndex::Ezx,
        SpectralPmlIndex::Ezy,
        SpectralPmlIndex::Bxy,
        SpectralPmlIndex::Bxz,
        SpectralPmlIndex::Byz,
        SpectralPmlIndex::Byx,
        SpectralPmlIndex::Bzx,
        SpectralPmlIndex::Bzy,
    ];

    pub fn field_kind(self) -> FieldKind {
        use SpectralPmlIndex::*;
        match self {
            Exy | Exz | Eyz | Eyx | Ezx | Ezy => FieldKind::E,
            Bxy | Bxz | Byz | Byx | Bzx | Bzy => FieldKind::B,
        }
    }

    /// Direction of the field component (0 = x).
    pub fn direction(self) -> usize {
        use SpectralPmlIndex::*;
        match self {
            Exy | Exz | Bxy | Bxz => 0,
            Eyz | Eyx | Byz | Byx => 1,
            Ezx | Ezy | Bzx | Bzy => 2,
        }
    }

    /// Split sub-component holding this tag.
    pub fn component(self) -> usize {
        use SpectralPmlIndex::*;
        match self {
            Exy | Bxy => PmlComp::XY,
            Exz | Bxz => PmlComp::XZ,
            Eyz | Byz => PmlComp::YZ,
            Eyx | Byx => PmlComp::YX,
            Ezx | Bzx => PmlComp::ZX,
            Ezy | Bzy => PmlComp::ZY,
        }
    }
}

/// Frequency-domain solver operating in split-field (PML) mode.
pub trait SpectralSolver: Send {
    /// Solver name for logging.
    fn name(&self) -> &str;

    /// Transform component `comp` of `field` into the spectral slot `index`.
    fn forward_transform(
        &mut self,
        level: usize,
        field: &BlockField,
        index: SpectralPmlIndex,
        comp: usize,
    ) -> Result<()>;

    /// Advance every spectral slot by one time step.
    fn push_spectral_fields(&mut self) -> Result<()>;

    /// Transform spectral slot `index` back into component `comp` of `field`.
    fn backward_transform(
        &mut self,
        level: usize,
        field: &mut BlockField,
        index: SpectralPmlIndex,
        comp: usize,
    ) -> Result<()>;
}

/// Everything a spectral solver needs to be set up over one layer patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSetup {
    pub level: usize,
    /// Cell-centered layer blocks grown by the E guard cells
    pub realspace: BoxArray,
    pub order: [i32; 3],
    pub nodal: bool,
    pub cell_size: [f64; 3],
    pub dt: f64,
}

/// Creates spectral solvers for the layer patches.
pub trait SpectralSolverBuilder {
    fn build(&self, setup: &SpectralSetup) -> Result<Box<dyn SpectralSolver>>;
}

/// One spectral push of the split E and B fields of a patch.
///
/// Only the two off-diagonal split components are transformed; the third
/// component carried with divergence cleaning is left as is.
#[cfg(feature = "spectral")]
pub fn push_patch(
    level: usize,
    solver: &mut dyn SpectralSolver,
    e: &mut VectorField,
    b: &mut VectorField,
) -> Result<()> {
    for idx in SpectralPmlIndex::ORDER {
        let field = match idx.field_kind() {
            FieldKind::E => &e[idx.direction()],
            FieldKind::B => &b[idx.direction()],
        };
        solver.forward_transform(level, field, idx, idx.component())?;
    }

    solver.push_spectral_fields()?;

    for idx in SpectralPmlIndex::ORDER {
        let field = match idx.field_kind() {
            FieldKind::E => &mut e[idx.direction()],
            FieldKind::B => &mut b[idx.direction()],
        };
        solver.backward_transform(level, field, idx, idx.component())?;
    }
    log::trace!("spectral push of layer level {} through {}", level, solver.name());
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Spectral stand-in: copies components out, scales them on push and
    /// writes them back, recording every call.
    #[derive(Debug, Default)]
    pub struct ScalingSolver {
        pub scale: f64,
        pub calls: Arc<Mutex<Vec<String>>>,
        slots: HashMap<SpectralPmlIndex, Vec<Vec<f64>>>,
    }

    impl ScalingSolver {
        pub fn new(scale: f64, calls: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                scale,
                calls,
                slots: HashMap::new(),
            }
        }
    }

    impl SpectralSolver for ScalingSolver {
        fn name(&self) -> &str {
            "scaling"
        }

        fn forward_transform(
            &mut self,
            _level: usize,
            field: &BlockField,
            index: SpectralPmlIndex,
            comp: usize,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(format!("fwd {:?} {}", index, comp));
            let data = field.blocks().iter().map(|b| b.component(comp).to_vec()).collect();
            self.slots.insert(index, data);
            Ok(())
        }

        fn push_spectral_fields(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push("push".into());
            for blocks in self.slots.values_mut() {
                for v in blocks.iter_mut().flatten() {
                    *v *= self.scale;
                }
            }
            Ok(())
        }

        fn backward_transform(
            &mut self,
            _level: usize,
            field: &mut BlockField,
            index: SpectralPmlIndex,
            comp: usize,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(format!("bwd {:?} {}", index, comp));
            if let Some(blocks) = self.slots.get(&index) {
                for (blk, data) in field.blocks_mut().iter_mut().zip(blocks) {
                    blk.component_mut(comp).copy_from_slice(data);
                }
            }
            Ok(())
        }
    }

    /// Builds [`ScalingSolver`]s sharing one call log.
    #[derive(Debug, Default)]
    pub struct ScalingBuilder {
        pub scale: f64,
        pub calls: Arc<Mutex<Vec<String>>>,
        pub setups: Mutex<Vec<SpectralSetup>>,
    }

    impl SpectralSolverBuilder for ScalingBuilder {
        fn build(&self, setup: &SpectralSetup) -> Result<Box<dyn SpectralSolver>> {
            self.setups.lock().unwrap().push(setup.clone());
            Ok(Box::new(ScalingSolver::new(self.scale, Arc::clone(&self.calls))))
        }
    }
}
