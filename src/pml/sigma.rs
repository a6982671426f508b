//! Damping profiles of the absorbing layer.
//!
//! Along each axis a layer block carries the damping coefficient `sigma` at
//! primary positions, `sigma_star` at positions staggered by half a cell, and
//! the analytic antiderivatives of both (`*_cumsum`). The profile is zero
//! inside the domain and grows quadratically with the distance `s` (in cells)
//! into the layer:
//!
//! ```text
//!   sigma(s)        = fac * s^2
//!   sigma_cumsum(s) = fac * s^3 / (3 c)
//!   fac             = 4 c / (dx * delta^2)
//! ```
//!
//! Which side a block's damping grows from is decided by classifying every
//! nearby interior block as a face, edge or corner neighbor along each axis.

use crate::constants::C0;
use crate::geometry::{BoxArray, IndexBox, SpaceDim};
use crate::{Error, Result};

/// One profile array along one axis, indexed by global index `lo..=hi`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sigma {
    lo: i32,
    hi: i32,
    data: Vec<f64>,
}

impl Sigma {
    /// Zeroed array over `lo..=hi`.
    pub fn new(lo: i32, hi: i32) -> Self {
        let n = (hi - lo + 1).max(0) as usize;
        Self {
            lo,
            hi,
            data: vec![0.0; n],
        }
    }

    pub fn lo(&self) -> i32 {
        self.lo
    }

    pub fn hi(&self) -> i32 {
        self.hi
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at global index `i`.
    pub fn at(&self, i: i32) -> f64 {
        self.data[(i - self.lo) as usize]
    }

    fn set(&mut self, i: i32, value: f64) {
        let idx = (i - self.lo) as usize;
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Profiles and decay factors of one axis of one block.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisProfile {
    pub sigma: Sigma,
    pub sigma_cumsum: Sigma,
    pub sigma_star: Sigma,
    pub sigma_star_cumsum: Sigma,
    pub sigma_fac: Sigma,
    pub sigma_cumsum_fac: Sigma,
    pub sigma_star_fac: Sigma,
    pub sigma_star_cumsum_fac: Sigma,
}

impl AxisProfile {
    fn new(lo: i32, hi: i32) -> Self {
        Self {
            sigma: Sigma::new(lo, hi),
            sigma_cumsum: Sigma::new(lo, hi),
            sigma_star: Sigma::new(lo, hi),
            sigma_star_cumsum: Sigma::new(lo, hi),
            sigma_fac: Sigma::new(lo, hi),
            sigma_cumsum_fac: Sigma::new(lo, hi),
            sigma_star_fac: Sigma::new(lo, hi),
            sigma_star_cumsum_fac: Sigma::new(lo, hi),
        }
    }

    /// Quadratic growth away from the low face of `grid` (at `glo`).
    fn fill_lo(&mut self, dir: usize, overlap: &IndexBox, grid: &IndexBox, fac: f64) {
        let glo = grid.small_end(dir);
        for i in overlap.small_end(dir)..=overlap.big_end(dir) + 1 {
            let offset = (glo - i) as f64;
            self.sigma.set(i, fac * offset * offset);
            self.sigma_cumsum
                .set(i, fac * offset * offset * offset / 3.0 / C0);
            let offset = (glo - i) as f64 - 0.5;
            self.sigma_star.set(i, fac * offset * offset);
            self.sigma_star_cumsum
                .set(i, fac * offset * offset * offset / 3.0 / C0);
        }
    }

    /// Quadratic growth away from the high face of `grid` (at `ghi + 1`).
    fn fill_hi(&mut self, dir: usize, overlap: &IndexBox, grid: &IndexBox, fac: f64) {
        let ghi = grid.big_end(dir);
        for i in overlap.small_end(dir)..=overlap.big_end(dir) + 1 {
            let offset = (i - ghi - 1) as f64;
            self.sigma.set(i, fac * offset * offset);
            self.sigma_cumsum
                .set(i, fac * offset * offset * offset / 3.0 / C0);
            let offset = (i - ghi) as f64 - 0.5;
            self.sigma_star.set(i, fac * offset * offset);
            self.sigma_star_cumsum
                .set(i, fac * offset * offset * offset / 3.0 / C0);
        }
    }

    fn fill_zero(&mut self, dir: usize, overlap: &IndexBox) {
        for i in overlap.small_end(dir)..=overlap.big_end(dir) + 1 {
            self.sigma.set(i, 0.0);
            self.sigma_cumsum.set(i, 0.0);
            self.sigma_star.set(i, 0.0);
            self.sigma_star_cumsum.set(i, 0.0);
        }
    }
}

/// How an interior block neighbors a layer block, seen along one axis.
///
/// Variants are listed in fill order: later kinds overwrite earlier ones
/// where their overlaps share indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NeighborKind {
    /// Touches only diagonally across all axes.
    Corner,
    /// Reached by growing along both other axes (3D only).
    SideSideEdge,
    /// Reached by growing along this axis and one other (3D only).
    DirectSideEdge,
    /// Reached by growing along another axis alone.
    SideFace,
    /// Reached by growing along this axis alone: the layer block lies
    /// directly outward from the neighbor along this axis.
    DirectFace,
}

impl NeighborKind {
    pub const FILL_ORDER: [NeighborKind; 5] = [
        NeighborKind::Corner,
        NeighborKind::SideSideEdge,
        NeighborKind::DirectSideEdge,
        NeighborKind::SideFace,
        NeighborKind::DirectFace,
    ];

    /// Classify `grid` relative to the layer block `bx` along `dir`.
    pub fn classify(grid: &IndexBox, bx: &IndexBox, dir: usize, ncell: i32, sdim: SpaceDim) -> Self {
        let (jdim, kdim) = other_axes(dir, sdim);
        if grid.grow_dir(dir, ncell).intersects(bx) {
            return NeighborKind::DirectFace;
        }
        if grid.grow_dir(jdim, ncell).intersects(bx) {
            return NeighborKind::SideFace;
        }
        if let Some(kdim) = kdim {
            if grid.grow_dir(kdim, ncell).intersects(bx) {
                return NeighborKind::SideFace;
            }
            if grid.grow_dir(dir, ncell).grow_dir(jdim, ncell).intersects(bx)
                || grid.grow_dir(dir, ncell).grow_dir(kdim, ncell).intersects(bx)
            {
                return NeighborKind::DirectSideEdge;
            }
            if grid.grow_dir(jdim, ncell).grow_dir(kdim, ncell).intersects(bx) {
                return NeighborKind::SideSideEdge;
            }
        }
        NeighborKind::Corner
    }
}

/// The axes other than `dir`, in cyclic order; the second is `None` in 2D.
fn other_axes(dir: usize, sdim: SpaceDim) -> (usize, Option<usize>) {
    let n = sdim.count();
    let jdim = (dir + 1) % n;
    let kdim = (n == 3).then_some((dir + 2) % n);
    (jdim, kdim)
}

/// Grow `b` by `ncell` along every axis other than `dir`.
fn grow_sides(b: IndexBox, dir: usize, ncell: i32, sdim: SpaceDim) -> IndexBox {
    let (jdim, kdim) = other_axes(dir, sdim);
    let b = b.grow_dir(jdim, ncell);
    match kdim {
        Some(k) => b.grow_dir(k, ncell),
        None => b,
    }
}

/// Damping profiles of one layer block, for every axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SigmaBox {
    bx: IndexBox,
    axes: Vec<AxisProfile>,
}

impl SigmaBox {
    /// Synthesize the profiles of the cell-centered layer block `bx` from the
    /// interior blocks `grids`.
    ///
    /// # Errors
    /// - `Error::Config` when more than one interior block is a direct-face
    ///   neighbor along one axis (gaps between blocks narrower than the layer)
    /// - `Error::Internal` when a classified neighbor has no overlap with `bx`
    pub fn new(
        bx: &IndexBox,
        grids: &BoxArray,
        dx: [f64; 3],
        ncell: i32,
        delta: i32,
        sdim: SpaceDim,
    ) -> Result<Self> {
        debug_assert!(bx.is_cell_centered());

        let mut axes: Vec<AxisProfile> = sdim
            .axes()
            .map(|d| AxisProfile::new(bx.small_end(d), bx.big_end(d) + 1))
            .collect();

        let isects = grids.intersections(bx, sdim.uniform(ncell));

        for dir in sdim.axes() {
            let fac = 4.0 * C0 / (dx[dir] * (delta * delta) as f64);
            let profile = &mut axes[dir];

            let mut neighbors: Vec<(NeighborKind, IndexBox)> = isects
                .iter()
                .map(|&(gid, _)| {
                    let grid = grids.get(gid);
                    (NeighborKind::classify(&grid, bx, dir, ncell, sdim), grid)
                })
                .collect();

            let direct_faces = neighbors
                .iter()
                .filter(|(k, _)| *k == NeighborKind::DirectFace)
                .count();
            if direct_faces > 1 {
                return Err(Error::Config(format!(
                    "layer block {} has {} direct-face neighbors along axis {}; \
                     gaps between blocks are not wide enough for the layer",
                    bx, direct_faces, dir
                )));
            }

            // stable: keeps box-array order within a kind
            neighbors.sort_by_key(|(k, _)| *k);

            for (kind, grid) in &neighbors {
                match kind {
                    NeighborKind::Corner | NeighborKind::DirectSideEdge | NeighborKind::DirectFace => {
                        let (lobox, hibox) = if *kind == NeighborKind::DirectFace {
                            (grid.adj_cell_lo(dir, ncell), grid.adj_cell_hi(dir, ncell))
                        } else {
                            (
                                grow_sides(grid.adj_cell_lo(dir, ncell), dir, ncell, sdim),
                                grow_sides(grid.adj_cell_hi(dir, ncell), dir, ncell, sdim),
                            )
                        };
                        let looverlap = lobox & *bx;
                        let hioverlap = hibox & *bx;
                        if looverlap.ok() {
                            profile.fill_lo(dir, &looverlap, grid, fac);
                        }
                        if hioverlap.ok() {
                            profile.fill_hi(dir, &hioverlap, grid, fac);
                        }
                        if !looverlap.ok() && !hioverlap.ok() {
                            return Err(Error::Internal(format!(
                                "{:?} neighbor {} of layer block {} along axis {} overlaps neither side",
                                kind, grid, bx, dir
                            )));
                        }
                    }
                    NeighborKind::SideFace | NeighborKind::SideSideEdge => {
                        let overlap = grow_sides(*grid, dir, ncell, sdim) & *bx;
                        if !overlap.ok() {
                            return Err(Error::Internal(format!(
                                "{:?} neighbor {} of layer block {} along axis {} has no overlap",
                                kind, grid, bx, dir
                            )));
                        }
                        profile.fill_zero(dir, &overlap);
                    }
                }
            }
        }

        Ok(Self { bx: *bx, axes })
    }

    /// The layer block the profiles belong to.
    pub fn bx(&self) -> IndexBox {
        self.bx
    }

    pub fn axis(&self, dir: usize) -> &AxisProfile {
        &self.axes[dir]
    }

    pub fn axes(&self) -> &[AxisProfile] {
        &self.axes
    }

    /// `exp(-sigma * dt)` and `exp(-sigma_cumsum * dx)` at primary positions.
    pub fn compute_factors_e(&mut self, dx: [f64; 3], dt: f64) {
        for (d, a) in self.axes.iter_mut().enumerate() {
            exp_scaled(a.sigma_fac.as_mut_slice(), a.sigma.as_slice(), dt);
            exp_scaled(a.sigma_cumsum_fac.as_mut_slice(), a.sigma_cumsum.as_slice(), dx[d]);
        }
    }

    /// `exp(-sigma_star * dt)` and `exp(-sigma_star_cumsum * dx)` at staggered positions.
    pub fn compute_factors_b(&mut self, dx: [f64; 3], dt: f64) {
        for (d, a) in self.axes.iter_mut().enumerate() {
            exp_scaled(a.sigma_star_fac.as_mut_slice(), a.sigma_star.as_slice(), dt);
            exp_scaled(
                a.sigma_star_cumsum_fac.as_mut_slice(),
                a.sigma_star_cumsum.as_slice(),
                dx[d],
            );
        }
    }
}

fn exp_scaled(out: &mut [f64], profile: &[f64], scale: f64) {
    for (o, s) in out.iter_mut().zip(profile) {
        *o = (-s * scale).exp();
    }
}
