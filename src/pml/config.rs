//! Layer configuration and guard-cell selection.

use super::layout::LayerSides;
use crate::geometry::{IntVect, SpaceDim};
use crate::{Error, Result};

/// Interior Maxwell solver the layer is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxwellSolver {
    /// Standard staggered finite-difference scheme
    Yee,
    /// Cole-Karkkainen finite-difference scheme (wider stencil)
    Ckc,
    /// Frequency-domain (pseudo-spectral) solver with the given stencil order per axis
    Spectral { order: [i32; 3], nodal: bool },
}

impl MaxwellSolver {
    pub fn is_spectral(&self) -> bool {
        matches!(self, MaxwellSolver::Spectral { .. })
    }
}

/// Medium the layer's fields propagate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediumModel {
    /// Free space; no medium fields are carried.
    #[default]
    Vacuum,
    /// Permittivity, permeability and conductivity fields are carried.
    Macroscopic,
}

/// Absorbing layer parameters for one refinement level.
#[derive(Debug, Clone, PartialEq)]
pub struct PmlConfig {
    /// Layer depth in cells
    pub ncell: i32,
    /// Number of cells over which damping ramps up
    pub delta: i32,
    /// Which domain sides carry a layer
    pub sides: LayerSides,
    /// Place the layer on the outermost cells of the domain instead of outside it
    pub pml_in_domain: bool,
    /// Carry the divergence-cleaning field F and the third split component
    pub divergence_cleaning: bool,
    /// The simulation window moves; F needs ghost cells
    pub moving_window: bool,
    pub solver: MaxwellSolver,
    pub medium: MediumModel,
    /// Carry magnetizing field H split components
    pub magnetic_h: bool,
    /// Refinement ratio to the coarser companion level
    pub ref_ratio: IntVect,
}

impl Default for PmlConfig {
    fn default() -> Self {
        Self {
            ncell: 10,
            delta: 10,
            sides: LayerSides::all(),
            pml_in_domain: false,
            divergence_cleaning: false,
            moving_window: false,
            solver: MaxwellSolver::Yee,
            medium: MediumModel::Vacuum,
            magnetic_h: false,
            ref_ratio: [2, 2, 2],
        }
    }
}

impl PmlConfig {
    pub fn set_ncell(&mut self, ncell: i32) -> &mut Self {
        self.ncell = ncell;
        self
    }

    pub fn set_delta(&mut self, delta: i32) -> &mut Self {
        self.delta = delta;
        self
    }

    pub fn set_sides(&mut self, sides: LayerSides) -> &mut Self {
        self.sides = sides;
        self
    }

    pub fn set_pml_in_domain(&mut self, in_domain: bool) -> &mut Self {
        self.pml_in_domain = in_domain;
        self
    }

    pub fn set_divergence_cleaning(&mut self, enabled: bool) -> &mut Self {
        self.divergence_cleaning = enabled;
        self
    }

    pub fn set_moving_window(&mut self, enabled: bool) -> &mut Self {
        self.moving_window = enabled;
        self
    }

    pub fn set_solver(&mut self, solver: MaxwellSolver) -> &mut Self {
        self.solver = solver;
        self
    }

    pub fn set_medium(&mut self, medium: MediumModel) -> &mut Self {
        self.medium = medium;
        self
    }

    pub fn set_magnetic_h(&mut self, enabled: bool) -> &mut Self {
        self.magnetic_h = enabled;
        self
    }

    pub fn set_ref_ratio(&mut self, ratio: IntVect) -> &mut Self {
        self.ref_ratio = ratio;
        self
    }

    /// Split components of E and B: 3 with divergence cleaning, else 2.
    pub fn split_components(&self) -> usize {
        if self.divergence_cleaning {
            3
        } else {
            2
        }
    }

    /// Check parameters that would otherwise surface as geometric nonsense.
    pub fn validate(&self, sdim: SpaceDim) -> Result<()> {
        if self.ncell <= 0 {
            return Err(Error::Config(format!(
                "layer depth must be positive, got {}",
                self.ncell
            )));
        }
        if self.delta <= 0 {
            return Err(Error::Config(format!(
                "damping length scale must be positive, got {}",
                self.delta
            )));
        }
        for d in sdim.axes() {
            if self.ref_ratio[d] < 1 {
                return Err(Error::Config(format!(
                    "refinement ratio along axis {} must be at least 1, got {}",
                    d, self.ref_ratio[d]
                )));
            }
        }
        if self.pml_in_domain && sdim.axes().any(|d| self.ref_ratio[d] != self.ref_ratio[0]) {
            return Err(Error::Config(format!(
                "a layer inside the domain needs the same refinement ratio along every axis, got {:?}",
                self.ref_ratio
            )));
        }
        if let MaxwellSolver::Spectral { order, .. } = self.solver {
            if sdim.axes().any(|d| order[d] <= 0) {
                return Err(Error::Config(format!(
                    "spectral stencil order must be positive, got {:?}",
                    order
                )));
            }
        }
        Ok(())
    }
}

/// Ghost-cell widths of the layer fields: `e` for E and the medium fields,
/// `b` for B, H and J, `f` for F.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardCells {
    pub e: IntVect,
    pub b: IntVect,
    pub f: IntVect,
}

impl GuardCells {
    pub fn new(e: IntVect, b: IntVect, f: IntVect) -> Self {
        Self { e, b, f }
    }

    /// Guard cells of the fine patch.
    ///
    /// 2 for E and B; F gets 2 with a moving window, else 0, and at least 1
    /// with the CKC stencil. A spectral solver widens all three to the
    /// larger of the current width and its stencil half-width (the full
    /// order when nodal).
    pub fn resolve(config: &PmlConfig, sdim: SpaceDim) -> Self {
        let mut ngf = if config.moving_window { 2 } else { 0 };
        if config.solver == MaxwellSolver::Ckc {
            ngf = ngf.max(1);
        }
        let mut g = Self {
            e: sdim.uniform(2),
            b: sdim.uniform(2),
            f: sdim.uniform(ngf),
        };
        if let MaxwellSolver::Spectral { order, nodal } = config.solver {
            for d in sdim.axes() {
                let stencil = if nodal { order[d] } else { order[d] / 2 };
                let ng = stencil.max(g.e[d]).max(g.b[d]).max(g.f[d]);
                g.e[d] = ng;
                g.b[d] = ng;
                g.f[d] = ng;
            }
        }
        g
    }

    /// Guard cells of the coarse patch: as the fine patch, except E and B
    /// drop to 1 with a finite-difference solver.
    pub fn resolve_coarse(config: &PmlConfig, sdim: SpaceDim) -> Self {
        let mut g = Self::resolve(config, sdim);
        if !config.solver.is_spectral() {
            g.e = sdim.uniform(1);
            g.b = sdim.uniform(1);
        }
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_cells_finite_difference() {
        let mut cfg = PmlConfig::default();
        let g = GuardCells::resolve(&cfg, SpaceDim::Three);
        assert_eq!(g.e, [2, 2, 2]);
        assert_eq!(g.f, [0, 0, 0]);

        cfg.set_solver(MaxwellSolver::Ckc);
        assert_eq!(GuardCells::resolve(&cfg, SpaceDim::Three).f, [1, 1, 1]);

        cfg.set_moving_window(true);
        let g = GuardCells::resolve(&cfg, SpaceDim::Two);
        assert_eq!(g.f, [2, 2, 0]);

        let c = GuardCells::resolve_coarse(&cfg, SpaceDim::Two);
        assert_eq!(c.e, [1, 1, 0]);
        assert_eq!(c.b, [1, 1, 0]);
        assert_eq!(c.f, [2, 2, 0]);
    }

    #[test]
    fn test_guard_cells_spectral() {
        let mut cfg = PmlConfig::default();
        cfg.set_solver(MaxwellSolver::Spectral {
            order: [16, 16, 2],
            nodal: false,
        });
        let g = GuardCells::resolve(&cfg, SpaceDim::Three);
        assert_eq!(g.e, [8, 8, 2]);
        assert_eq!(g.e, g.b);
        assert_eq!(g.e, g.f);
        // coarse patch keeps the spectral width
        assert_eq!(GuardCells::resolve_coarse(&cfg, SpaceDim::Three), g);

        cfg.set_solver(MaxwellSolver::Spectral {
            order: [4, 4, 4],
            nodal: true,
        });
        assert_eq!(GuardCells::resolve(&cfg, SpaceDim::Three).b, [4, 4, 4]);
    }

    #[test]
    fn test_validate() {
        let mut cfg = PmlConfig::default();
        assert!(cfg.validate(SpaceDim::Three).is_ok());
        cfg.set_ncell(0);
        assert!(matches!(cfg.validate(SpaceDim::Three), Err(Error::Config(_))));
        cfg.set_ncell(4).set_ref_ratio([2, 0, 2]);
        assert!(cfg.validate(SpaceDim::Three).is_err());
        assert_eq!(cfg.split_components(), 2);
        cfg.set_divergence_cleaning(true);
        assert_eq!(cfg.split_components(), 3);
    }

    #[test]
    fn test_validate_anisotropic_ratio() {
        let mut cfg = PmlConfig::default();
        cfg.set_ref_ratio([2, 4, 2]);
        assert!(cfg.validate(SpaceDim::Three).is_ok());
        cfg.set_pml_in_domain(true);
        assert!(matches!(cfg.validate(SpaceDim::Three), Err(Error::Config(_))));
        // the pinned third axis of a 2D level is not compared
        cfg.set_ref_ratio([2, 2, 1]);
        assert!(cfg.validate(SpaceDim::Two).is_ok());
        assert!(cfg.validate(SpaceDim::Three).is_err());
    }
}
