//! The absorbing layer of one refinement level.
//!
//! A [`Pml`] owns, for the level's own resolution (fine patch) and optionally
//! for the next coarser one (coarse patch), the layer block set, its damping
//! profiles and every split field allocated over it. It is built once per
//! level at setup or regrid and driven by the level's step loop:
//!
//! ```text
//!   exchange_{e,b,h,f}   interior <-> layer, every step
//!   copy_j_to_pml        interior current -> layer
//!   fill_boundary_*      layer ghost cells
//!   compute_pml_factors  on every dt change
//!   push_psatd           spectral mode only
//! ```
//!
//! A level that needs no layer (every side periodic or disabled) builds into
//! a disabled `Pml` on which every operation is a no-op.

use std::fmt;

use instant::Instant;
use log::info;

use super::checkpoint::{read_field, write_field};
use super::config::{GuardCells, MaxwellSolver, MediumModel, PmlConfig};
use super::exchange::{copy_to_pml, exchange};
use super::factors::MultiSigmaBox;
use super::fields::{FieldLayout, PatchFields, VectorField};
use super::layout::{make_box_array, reduced_grids};
use super::medium::{ConstantMedium, MediumProperty, MediumProvider};
#[cfg(feature = "spectral")]
use super::spectral::SpectralSetup;
use super::spectral::{SpectralSolver, SpectralSolverBuilder};
use crate::arrays::BlockField;
use crate::geometry::{BoxArray, Geometry};
use crate::{Error, Result};

/// Resolution a layer patch lives at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchType {
    Fine,
    Coarse,
}

impl PatchType {
    /// Suffix used in checkpoint keys.
    pub fn suffix(self) -> &'static str {
        match self {
            PatchType::Fine => "fp",
            PatchType::Coarse => "cp",
        }
    }

    fn name(self) -> &'static str {
        match self {
            PatchType::Fine => "fine patch",
            PatchType::Coarse => "coarse patch",
        }
    }
}

/// Layer data at one resolution.
pub struct Patch {
    geom: Geometry,
    layer: BoxArray,
    guard: GuardCells,
    fields: PatchFields,
    sigma: MultiSigmaBox,
    spectral: Option<Box<dyn SpectralSolver>>,
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch")
            .field("geom", &self.geom)
            .field("layer", &self.layer)
            .field("guard", &self.guard)
            .field("spectral", &self.spectral.as_ref().map(|s| s.name().to_string()))
            .finish_non_exhaustive()
    }
}

impl Patch {
    pub fn geometry(&self) -> &Geometry {
        &self.geom
    }

    /// Cell-centered layer blocks.
    pub fn layer_boxes(&self) -> &BoxArray {
        &self.layer
    }

    pub fn guard_cells(&self) -> &GuardCells {
        &self.guard
    }

    pub fn fields(&self) -> &PatchFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut PatchFields {
        &mut self.fields
    }

    pub fn sigma_boxes(&self) -> &MultiSigmaBox {
        &self.sigma
    }

    pub fn sigma_boxes_mut(&mut self) -> &mut MultiSigmaBox {
        &mut self.sigma
    }

    pub fn has_spectral_solver(&self) -> bool {
        self.spectral.is_some()
    }

    fn fill_vector(fields: &mut VectorField, geom: &Geometry) {
        let period = geom.periodicity();
        for f in fields.iter_mut() {
            f.fill_boundary(&period);
        }
    }

    fn keys(&self, prefix: &str, patch: PatchType) -> Vec<(String, &BlockField)> {
        let mut groups = vec![("E", &self.fields.e), ("B", &self.fields.b)];
        if let Some(h) = self.fields.h.as_option() {
            groups.push(("H", h));
        }
        let mut out = Vec::with_capacity(3 * groups.len());
        for (name, v) in groups {
            for (field, axis) in v.iter().zip(["x", "y", "z"]) {
                out.push((format!("{}_{}{}_{}", prefix, name, axis, patch.suffix()), field));
            }
        }
        out
    }
}

fn exchange_vector(pml: &mut VectorField, reg: &mut VectorField, geom: &Geometry, in_domain: bool) -> Result<()> {
    for (p, r) in pml.iter_mut().zip(reg.iter_mut()) {
        exchange(p, r, geom, in_domain)?;
    }
    Ok(())
}

/// Builds a [`Pml`] for one level.
pub struct PmlBuilder<'a> {
    level: usize,
    grids: &'a BoxArray,
    geom: &'a Geometry,
    cgeom: Option<&'a Geometry>,
    config: PmlConfig,
    layout: Option<FieldLayout>,
    guard: Option<(GuardCells, GuardCells)>,
    medium: Option<&'a dyn MediumProvider>,
    spectral: Option<(&'a dyn SpectralSolverBuilder, f64)>,
}

impl<'a> PmlBuilder<'a> {
    pub fn new(level: usize, grids: &'a BoxArray, geom: &'a Geometry, config: &PmlConfig) -> Self {
        Self {
            level,
            grids,
            geom,
            cgeom: None,
            config: config.clone(),
            layout: None,
            guard: None,
            medium: None,
            spectral: None,
        }
    }

    /// Also build a coarse patch over `cgeom` (the next coarser level).
    pub fn coarse(mut self, cgeom: &'a Geometry) -> Self {
        self.cgeom = Some(cgeom);
        self
    }

    /// Staggering of the interior fields; Yee (or all-nodal for a nodal
    /// spectral solver) when unset.
    pub fn layout(mut self, layout: FieldLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Override the guard cells of the fine and coarse patches.
    pub fn guard_cells(mut self, fine: GuardCells, coarse: GuardCells) -> Self {
        self.guard = Some((fine, coarse));
        self
    }

    /// Provider of the medium fields; a vacuum-valued constant medium when unset.
    pub fn medium(mut self, provider: &'a dyn MediumProvider) -> Self {
        self.medium = Some(provider);
        self
    }

    /// Spectral backend and the time step its solvers are set up for.
    pub fn spectral(mut self, builder: &'a dyn SpectralSolverBuilder, dt: f64) -> Self {
        self.spectral = Some((builder, dt));
        self
    }

    pub fn build(self) -> Result<Pml> {
        let sdim = self.geom.space_dim();
        self.config.validate(sdim)?;
        let start = Instant::now();

        let ncell = self.config.ncell;
        let delta = self.config.delta;
        let sides = self.config.sides;
        let in_domain = self.config.pml_in_domain;

        let profile_grids = if in_domain {
            reduced_grids(self.geom, self.grids, ncell, &sides)
        } else {
            self.grids.clone()
        };
        let ba = make_box_array(self.geom, &profile_grids, ncell, in_domain, &sides)?;
        if ba.is_empty() {
            info!("PML level {}: no absorbing layer needed, disabled", self.level);
            return Ok(Pml {
                level: self.level,
                config: self.config,
                fine: None,
                coarse: None,
            });
        }

        let guard = match self.guard {
            Some((fine, _)) => fine,
            None => GuardCells::resolve(&self.config, sdim),
        };
        let fine = self.build_patch(self.geom, ba, &profile_grids, ncell, delta, guard)?;

        let coarse = match self.cgeom {
            Some(cgeom) => Some(self.build_coarse(cgeom)?),
            None => None,
        };

        info!(
            "PML level {}: {} fine blocks ({} cells deep), guard cells e={:?} b={:?} f={:?}, coarse blocks: {}, setup {:.2?}",
            self.level,
            fine.layer.len(),
            ncell,
            guard.e,
            guard.b,
            guard.f,
            coarse.as_ref().map_or(0, |c| c.layer.len()),
            start.elapsed()
        );

        Ok(Pml {
            level: self.level,
            config: self.config,
            fine: Some(fine),
            coarse,
        })
    }

    fn build_coarse(&self, cgeom: &Geometry) -> Result<Patch> {
        let sdim = cgeom.space_dim();
        let rr = self.config.ref_ratio;
        let sides = self.config.sides;
        let grid_cba = self.grids.coarsen(rr);

        let guard = match self.guard {
            Some((_, coarse)) => coarse,
            None => GuardCells::resolve_coarse(&self.config, sdim),
        };

        if self.config.pml_in_domain {
            // validate() guarantees equal ratios on the active axes
            let ncell = self.config.ncell / rr[0];
            let delta = self.config.delta / rr[0];
            if ncell < 1 || delta < 1 {
                return Err(Error::Config(format!(
                    "layer depth {} and damping length {} do not survive coarsening by {}",
                    self.config.ncell, self.config.delta, rr[0]
                )));
            }
            let reduced = reduced_grids(cgeom, &grid_cba, ncell, &sides);
            let cba = make_box_array(cgeom, &reduced, ncell, true, &sides)?;
            self.build_patch(cgeom, cba, &reduced, ncell, delta, guard)
        } else {
            let ncell = self.config.ncell;
            let cba = make_box_array(cgeom, &grid_cba, ncell, false, &sides)?;
            self.build_patch(cgeom, cba, &grid_cba, ncell, self.config.delta, guard)
        }
    }

    fn build_patch(
        &self,
        geom: &Geometry,
        ba: BoxArray,
        profile_grids: &BoxArray,
        ncell: i32,
        delta: i32,
        guard: GuardCells,
    ) -> Result<Patch> {
        let sdim = geom.space_dim();
        let layout = self.layout.unwrap_or_else(|| match self.config.solver {
            MaxwellSolver::Spectral { nodal: true, .. } => FieldLayout::nodal(sdim),
            _ => FieldLayout::yee(sdim),
        });

        let mut fields = PatchFields::allocate(&ba, &layout, &self.config, &guard, sdim);
        if self.config.medium == MediumModel::Macroscopic {
            let fallback = ConstantMedium::default();
            let provider: &dyn MediumProvider = match self.medium {
                Some(provider) => provider,
                None => &fallback,
            };
            for property in MediumProperty::ALL {
                let group = match property {
                    MediumProperty::Conductivity => &mut fields.sigma,
                    MediumProperty::Permittivity => &mut fields.eps,
                    MediumProperty::Permeability => &mut fields.mu,
                };
                provider.initialize(property, group.get_mut()?, geom, self.level)?;
            }
            log::debug!("PML level {}: medium fields from `{}`", self.level, provider.name());
        }

        let sigma = MultiSigmaBox::new(&ba, profile_grids, geom.cell_size(), ncell, delta, sdim)?;
        let spectral = self.build_spectral(geom, &ba, &guard)?;

        Ok(Patch {
            geom: geom.clone(),
            layer: ba,
            guard,
            fields,
            sigma,
            spectral,
        })
    }

    #[cfg(feature = "spectral")]
    fn build_spectral(&self, geom: &Geometry, ba: &BoxArray, guard: &GuardCells) -> Result<Option<Box<dyn SpectralSolver>>> {
        let MaxwellSolver::Spectral { order, nodal } = self.config.solver else {
            return Ok(None);
        };
        let (builder, dt) = self.spectral.ok_or_else(|| {
            Error::Config("PML: spectral solver selected but no spectral backend was supplied".into())
        })?;
        let setup = SpectralSetup {
            level: self.level,
            realspace: ba.enclosed_cells().grow(guard.e),
            order,
            nodal,
            cell_size: geom.cell_size(),
            dt,
        };
        builder.build(&setup).map(Some)
    }

    #[cfg(not(feature = "spectral"))]
    fn build_spectral(&self, _geom: &Geometry, _ba: &BoxArray, _guard: &GuardCells) -> Result<Option<Box<dyn SpectralSolver>>> {
        if self.config.solver.is_spectral() {
            return Err(Error::Config(
                "PML: spectral solver selected but not built".into(),
            ));
        }
        Ok(None)
    }
}

/// Absorbing layer of one refinement level.
#[derive(Debug)]
pub struct Pml {
    level: usize,
    config: PmlConfig,
    fine: Option<Patch>,
    coarse: Option<Patch>,
}

impl Pml {
    /// Layer with default collaborators: Yee staggering, resolved guard
    /// cells, vacuum-valued constant medium.
    pub fn new(level: usize, grids: &BoxArray, geom: &Geometry, cgeom: Option<&Geometry>, config: &PmlConfig) -> Result<Self> {
        let builder = PmlBuilder::new(level, grids, geom, config);
        match cgeom {
            Some(c) => builder.coarse(c).build(),
            None => builder.build(),
        }
    }

    pub fn builder<'a>(level: usize, grids: &'a BoxArray, geom: &'a Geometry, config: &PmlConfig) -> PmlBuilder<'a> {
        PmlBuilder::new(level, grids, geom, config)
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn config(&self) -> &PmlConfig {
        &self.config
    }

    /// False when the level needed no layer; every operation is then a no-op.
    pub fn is_enabled(&self) -> bool {
        self.fine.is_some()
    }

    pub fn has_coarse(&self) -> bool {
        self.coarse.is_some()
    }

    fn slot(&self, patch: PatchType) -> &Option<Patch> {
        match patch {
            PatchType::Fine => &self.fine,
            PatchType::Coarse => &self.coarse,
        }
    }

    fn slot_mut(&mut self, patch: PatchType) -> &mut Option<Patch> {
        match patch {
            PatchType::Fine => &mut self.fine,
            PatchType::Coarse => &mut self.coarse,
        }
    }

    /// The patch, or `Error::Disabled` when it was never built.
    pub fn patch(&self, patch: PatchType) -> Result<&Patch> {
        self.slot(patch).as_ref().ok_or(Error::Disabled(patch.name()))
    }

    pub fn patch_mut(&mut self, patch: PatchType) -> Result<&mut Patch> {
        self.slot_mut(patch).as_mut().ok_or(Error::Disabled(patch.name()))
    }

    pub fn e(&self, patch: PatchType) -> Result<&VectorField> {
        Ok(&self.patch(patch)?.fields.e)
    }

    pub fn b(&self, patch: PatchType) -> Result<&VectorField> {
        Ok(&self.patch(patch)?.fields.b)
    }

    pub fn h(&self, patch: PatchType) -> Result<&VectorField> {
        self.patch(patch)?.fields.h()
    }

    pub fn f(&self, patch: PatchType) -> Result<&BlockField> {
        self.patch(patch)?.fields.f()
    }

    pub fn j(&self, patch: PatchType) -> Result<&VectorField> {
        Ok(&self.patch(patch)?.fields.j)
    }

    pub fn eps(&self, patch: PatchType) -> Result<&BlockField> {
        self.patch(patch)?.fields.eps()
    }

    pub fn mu(&self, patch: PatchType) -> Result<&BlockField> {
        self.patch(patch)?.fields.mu()
    }

    pub fn sigma(&self, patch: PatchType) -> Result<&BlockField> {
        self.patch(patch)?.fields.sigma()
    }

    pub fn e_mut(&mut self, patch: PatchType) -> Result<&mut VectorField> {
        Ok(&mut self.patch_mut(patch)?.fields.e)
    }

    pub fn b_mut(&mut self, patch: PatchType) -> Result<&mut VectorField> {
        Ok(&mut self.patch_mut(patch)?.fields.b)
    }

    pub fn h_mut(&mut self, patch: PatchType) -> Result<&mut VectorField> {
        self.patch_mut(patch)?.fields.h.get_mut()
    }

    pub fn f_mut(&mut self, patch: PatchType) -> Result<&mut BlockField> {
        self.patch_mut(patch)?.fields.f.get_mut()
    }

    pub fn sigma_boxes(&self, patch: PatchType) -> Result<&MultiSigmaBox> {
        Ok(&self.patch(patch)?.sigma)
    }

    pub fn geometry(&self, patch: PatchType) -> Result<&Geometry> {
        Ok(&self.patch(patch)?.geom)
    }

    pub fn layer_boxes(&self, patch: PatchType) -> Result<&BoxArray> {
        Ok(&self.patch(patch)?.layer)
    }

    pub fn exchange_e(&mut self, patch: PatchType, e: Option<&mut VectorField>) -> Result<()> {
        let in_domain = self.config.pml_in_domain;
        let (Some(p), Some(reg)) = (self.slot_mut(patch).as_mut(), e) else {
            return Ok(());
        };
        exchange_vector(&mut p.fields.e, reg, &p.geom, in_domain)
    }

    pub fn exchange_b(&mut self, patch: PatchType, b: Option<&mut VectorField>) -> Result<()> {
        let in_domain = self.config.pml_in_domain;
        let (Some(p), Some(reg)) = (self.slot_mut(patch).as_mut(), b) else {
            return Ok(());
        };
        exchange_vector(&mut p.fields.b, reg, &p.geom, in_domain)
    }

    pub fn exchange_h(&mut self, patch: PatchType, h: Option<&mut VectorField>) -> Result<()> {
        let in_domain = self.config.pml_in_domain;
        let (Some(p), Some(reg)) = (self.slot_mut(patch).as_mut(), h) else {
            return Ok(());
        };
        match p.fields.h.as_option_mut() {
            Some(pml) => exchange_vector(pml, reg, &p.geom, in_domain),
            None => Ok(()),
        }
    }

    pub fn exchange_f(&mut self, patch: PatchType, f: Option<&mut BlockField>) -> Result<()> {
        let in_domain = self.config.pml_in_domain;
        let Some(p) = self.slot_mut(patch).as_mut() else {
            return Ok(());
        };
        match (p.fields.f.as_option_mut(), f) {
            (Some(pml), Some(reg)) => exchange(pml, reg, &p.geom, in_domain),
            _ => Ok(()),
        }
    }

    pub fn exchange_e_both(&mut self, fp: Option<&mut VectorField>, cp: Option<&mut VectorField>) -> Result<()> {
        self.exchange_e(PatchType::Fine, fp)?;
        self.exchange_e(PatchType::Coarse, cp)
    }

    pub fn exchange_b_both(&mut self, fp: Option<&mut VectorField>, cp: Option<&mut VectorField>) -> Result<()> {
        self.exchange_b(PatchType::Fine, fp)?;
        self.exchange_b(PatchType::Coarse, cp)
    }

    pub fn exchange_h_both(&mut self, fp: Option<&mut VectorField>, cp: Option<&mut VectorField>) -> Result<()> {
        self.exchange_h(PatchType::Fine, fp)?;
        self.exchange_h(PatchType::Coarse, cp)
    }

    pub fn exchange_f_both(&mut self, fp: Option<&mut BlockField>, cp: Option<&mut BlockField>) -> Result<()> {
        self.exchange_f(PatchType::Fine, fp)?;
        self.exchange_f(PatchType::Coarse, cp)
    }

    /// Drive the layer current from the interior current.
    pub fn copy_j_to_pml(&mut self, patch: PatchType, j: Option<&VectorField>) -> Result<()> {
        let (Some(p), Some(j)) = (self.slot_mut(patch).as_mut(), j) else {
            return Ok(());
        };
        for (pml, reg) in p.fields.j.iter_mut().zip(j.iter()) {
            copy_to_pml(pml, reg, &p.geom)?;
        }
        Ok(())
    }

    pub fn copy_j_to_pml_both(&mut self, fp: Option<&VectorField>, cp: Option<&VectorField>) -> Result<()> {
        self.copy_j_to_pml(PatchType::Fine, fp)?;
        self.copy_j_to_pml(PatchType::Coarse, cp)
    }

    /// Fill E ghost cells of the layer; skipped when E carries none.
    pub fn fill_boundary_e(&mut self, patch: PatchType) {
        if let Some(p) = self.slot_mut(patch).as_mut() {
            if p.fields.e[0].n_grow().iter().any(|&g| g > 0) {
                Patch::fill_vector(&mut p.fields.e, &p.geom);
            }
        }
    }

    pub fn fill_boundary_b(&mut self, patch: PatchType) {
        if let Some(p) = self.slot_mut(patch).as_mut() {
            Patch::fill_vector(&mut p.fields.b, &p.geom);
        }
    }

    pub fn fill_boundary_h(&mut self, patch: PatchType) {
        if let Some(p) = self.slot_mut(patch).as_mut() {
            if let Some(h) = p.fields.h.as_option_mut() {
                Patch::fill_vector(h, &p.geom);
            }
        }
    }

    /// Fill F ghost cells of the layer; skipped when F carries none.
    pub fn fill_boundary_f(&mut self, patch: PatchType) {
        if let Some(p) = self.slot_mut(patch).as_mut() {
            if let Some(f) = p.fields.f.as_option_mut() {
                if f.n_grow().iter().any(|&g| g > 0) {
                    f.fill_boundary(&p.geom.periodicity());
                }
            }
        }
    }

    /// E, B and F ghost cells on both patches.
    pub fn fill_boundary(&mut self) {
        for patch in [PatchType::Fine, PatchType::Coarse] {
            self.fill_boundary_e(patch);
            self.fill_boundary_b(patch);
            self.fill_boundary_f(patch);
        }
    }

    /// Refresh the B then E decay factors of both patches for `dt`.
    pub fn compute_pml_factors(&mut self, dt: f64) -> Result<()> {
        for p in [self.fine.as_mut(), self.coarse.as_mut()].into_iter().flatten() {
            p.sigma.compute_factors_b(dt)?;
            p.sigma.compute_factors_e(dt)?;
        }
        Ok(())
    }

    /// Advance the split E and B fields of both patches through the
    /// spectral solvers.
    #[cfg(feature = "spectral")]
    pub fn push_psatd(&mut self) -> Result<()> {
        let level = self.level;
        let Some(fine) = self.fine.as_mut() else {
            return Ok(());
        };
        let solver = fine.spectral.as_mut().ok_or_else(|| {
            Error::Config("PML: spectral push requested but the layer was built for a finite-difference solver".into())
        })?;
        super::spectral::push_patch(level, solver.as_mut(), &mut fine.fields.e, &mut fine.fields.b)?;

        if let Some(coarse) = self.coarse.as_mut() {
            if let Some(solver) = coarse.spectral.as_mut() {
                super::spectral::push_patch(level, solver.as_mut(), &mut coarse.fields.e, &mut coarse.fields.b)?;
            }
        }
        Ok(())
    }

    /// Write E, B and (when carried) H of both patches under `prefix`,
    /// keyed `<prefix>_<E|B|H><x|y|z>_<fp|cp>`.
    pub fn checkpoint(&self, prefix: &str) -> Result<()> {
        let mut written = 0;
        for patch in [PatchType::Fine, PatchType::Coarse] {
            if let Some(p) = self.slot(patch) {
                for (key, field) in p.keys(prefix, patch) {
                    write_field(field, &key)?;
                    written += 1;
                }
            }
        }
        log::debug!("PML level {}: checkpointed {} fields under {}", self.level, written, prefix);
        Ok(())
    }

    /// Inverse of [`checkpoint`](Self::checkpoint). Fails when any key of a
    /// carried field group is missing.
    pub fn restart(&mut self, prefix: &str) -> Result<()> {
        for patch in [PatchType::Fine, PatchType::Coarse] {
            let Some(p) = self.slot_mut(patch).as_mut() else {
                continue;
            };
            let keys: Vec<String> = p.keys(prefix, patch).into_iter().map(|(k, _)| k).collect();
            let mut fields: Vec<&mut BlockField> = p.fields.e.iter_mut().chain(p.fields.b.iter_mut()).collect();
            if let Some(h) = p.fields.h.as_option_mut() {
                fields.extend(h.iter_mut());
            }
            for (key, field) in keys.iter().zip(fields) {
                read_field(field, key)?;
            }
        }
        log::debug!("PML level {}: restarted from {}", self.level, prefix);
        Ok(())
    }
}
