//! Damping profiles for every block of a layer, with the per-timestep decay
//! factors cached by time step.
//!
//! The factors depend only on the profiles, the cell size and `dt`:
//!   E:  sigma_fac      = exp(-sigma * dt)
//!       sigma_cumsum_fac = exp(-sigma_cumsum * dx)
//!   B:  the same from the staggered (`sigma_star*`) profiles
//! Recomputation is skipped while `dt` stays bit-identical to the last call.

use rayon::prelude::*;

use super::sigma::SigmaBox;
use crate::geometry::{BoxArray, SpaceDim};
use crate::{Error, Result};

/// Which half of the staggered update a set of factors belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    E,
    B,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            FieldKind::E => "E",
            FieldKind::B => "B",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FactorCache {
    dt: Option<f64>,
    recomputed: usize,
}

impl FactorCache {
    fn is_current(&self, dt: f64) -> bool {
        self.dt.map_or(false, |last| last.to_bits() == dt.to_bits())
    }
}

/// Profiles of every layer block, in layer box-array order.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSigmaBox {
    boxes: Vec<SigmaBox>,
    cell_size: [f64; 3],
    cache_e: FactorCache,
    cache_b: FactorCache,
}

impl MultiSigmaBox {
    /// Build profiles for every block of `layer` from the interior `grids`.
    pub fn new(
        layer: &BoxArray,
        grids: &BoxArray,
        cell_size: [f64; 3],
        ncell: i32,
        delta: i32,
        sdim: SpaceDim,
    ) -> Result<Self> {
        for d in sdim.axes() {
            if !(cell_size[d].is_finite() && cell_size[d] > 0.0) {
                return Err(Error::Numerical(format!(
                    "cell size along axis {} must be positive and finite, got {}",
                    d, cell_size[d]
                )));
            }
        }
        if delta <= 0 {
            return Err(Error::Config(format!(
                "damping length scale must be positive, got {}",
                delta
            )));
        }

        let boxes = layer
            .boxes()
            .par_iter()
            .map(|bx| SigmaBox::new(bx, grids, cell_size, ncell, delta, sdim))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "built damping profiles for {} layer blocks (ncell={}, delta={})",
            boxes.len(),
            ncell,
            delta
        );

        Ok(Self {
            boxes,
            cell_size,
            cache_e: FactorCache::default(),
            cache_b: FactorCache::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, i: usize) -> &SigmaBox {
        &self.boxes[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SigmaBox> {
        self.boxes.iter()
    }

    pub fn cell_size(&self) -> [f64; 3] {
        self.cell_size
    }

    /// Time step the `kind` factors were last computed for.
    pub fn last_dt(&self, kind: FieldKind) -> Option<f64> {
        self.cache(kind).dt
    }

    /// How many times the `kind` factors were actually recomputed.
    pub fn recompute_count(&self, kind: FieldKind) -> usize {
        self.cache(kind).recomputed
    }

    fn cache(&self, kind: FieldKind) -> &FactorCache {
        match kind {
            FieldKind::E => &self.cache_e,
            FieldKind::B => &self.cache_b,
        }
    }

    /// Refresh the `kind` decay factors of every block for time step `dt`.
    ///
    /// Returns `Ok(false)` without touching any block when `dt` equals the
    /// previous call's value.
    pub fn compute_factors(&mut self, kind: FieldKind, dt: f64) -> Result<bool> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(Error::Numerical(format!(
                "time step must be positive and finite, got {}",
                dt
            )));
        }

        let cache = match kind {
            FieldKind::E => &mut self.cache_e,
            FieldKind::B => &mut self.cache_b,
        };
        if cache.is_current(dt) {
            return Ok(false);
        }

        let dx = self.cell_size;
        match kind {
            FieldKind::E => self
                .boxes
                .par_iter_mut()
                .for_each(|sb| sb.compute_factors_e(dx, dt)),
            FieldKind::B => self
                .boxes
                .par_iter_mut()
                .for_each(|sb| sb.compute_factors_b(dx, dt)),
        }

        cache.dt = Some(dt);
        cache.recomputed += 1;
        log::debug!(
            "{} decay factors recomputed for dt={:e} on {} blocks",
            kind.name(),
            dt,
            self.boxes.len()
        );
        Ok(true)
    }

    pub fn compute_factors_e(&mut self, dt: f64) -> Result<bool> {
        self.compute_factors(FieldKind::E, dt)
    }

    pub fn compute_factors_b(&mut self, dt: f64) -> Result<bool> {
        self.compute_factors(FieldKind::B, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IndexBox;
    use crate::pml::sigma::Sigma;

    fn ring() -> MultiSigmaBox {
        let grids = BoxArray::new(vec![IndexBox::new_2d([0, 0], [15, 15])]);
        let layer = BoxArray::new(vec![
            IndexBox::new_2d([-4, 0], [-1, 15]),
            IndexBox::new_2d([16, 0], [19, 15]),
        ]);
        MultiSigmaBox::new(&layer, &grids, [1e-6; 3], 4, 4, SpaceDim::Two).unwrap()
    }

    #[test]
    fn test_factor_cache_skips_same_dt() {
        let mut msb = ring();
        assert!(msb.compute_factors_e(1e-15).unwrap());
        let snapshot = msb.get(0).axis(0).sigma_fac.clone();
        assert!(!msb.compute_factors_e(1e-15).unwrap());
        assert_eq!(msb.recompute_count(FieldKind::E), 1);
        assert_eq!(msb.get(0).axis(0).sigma_fac, snapshot);

        assert!(msb.compute_factors_e(2e-15).unwrap());
        assert_eq!(msb.recompute_count(FieldKind::E), 2);
        assert_eq!(msb.last_dt(FieldKind::E), Some(2e-15));

        // B is cached independently
        assert_eq!(msb.recompute_count(FieldKind::B), 0);
        assert!(msb.compute_factors_b(2e-15).unwrap());
        assert_eq!(msb.recompute_count(FieldKind::B), 1);
    }

    #[test]
    fn test_new_dt_updates_every_factor() {
        use crate::pml::layout::{make_box_array, LayerSides};
        use crate::geometry::Geometry;

        let geom = Geometry::new(IndexBox::new([0, 0, 0], [11, 11, 11]), [1e-6, 2e-6, 3e-6], SpaceDim::Three);
        let grids = BoxArray::new(vec![
            IndexBox::new([0, 0, 0], [5, 11, 11]),
            IndexBox::new([6, 0, 0], [11, 11, 11]),
        ]);
        let layer = make_box_array(&geom, &grids, 3, false, &LayerSides::all()).unwrap();
        let mut msb = MultiSigmaBox::new(&layer, &grids, geom.cell_size(), 3, 3, SpaceDim::Three).unwrap();

        msb.compute_factors_e(1e-15).unwrap();
        msb.compute_factors_b(1e-15).unwrap();
        let (dt, dx) = (3e-15, msb.cell_size());
        assert!(msb.compute_factors_e(dt).unwrap());
        assert!(msb.compute_factors_b(dt).unwrap());

        let expect = |fac: &Sigma, profile: &Sigma, scale: f64| {
            assert_eq!(fac.len(), profile.len());
            for (f, p) in fac.as_slice().iter().zip(profile.as_slice()) {
                assert_eq!(*f, (-p * scale).exp());
            }
        };
        let mut damped = 0;
        for sb in msb.iter() {
            for (d, a) in sb.axes().iter().enumerate() {
                expect(&a.sigma_fac, &a.sigma, dt);
                expect(&a.sigma_cumsum_fac, &a.sigma_cumsum, dx[d]);
                expect(&a.sigma_star_fac, &a.sigma_star, dt);
                expect(&a.sigma_star_cumsum_fac, &a.sigma_star_cumsum, dx[d]);
                damped += a.sigma_fac.as_slice().iter().filter(|&&f| f < 1.0).count();
            }
        }
        assert!(damped > 0);
    }

    #[test]
    fn test_factors_are_decaying() {
        let mut msb = ring();
        msb.compute_factors_e(1e-15).unwrap();
        for sb in msb.iter() {
            for v in sb.axis(0).sigma_fac.as_slice() {
                assert!(*v > 0.0 && *v <= 1.0);
            }
        }
        // hi block: deeper into the layer decays faster
        let x = msb.get(1).axis(0);
        assert!(x.sigma_fac.at(20) < x.sigma_fac.at(17));
    }

    #[test]
    fn test_invalid_dt_rejected() {
        let mut msb = ring();
        assert!(matches!(msb.compute_factors_e(f64::NAN), Err(Error::Numerical(_))));
        assert!(matches!(msb.compute_factors_b(0.0), Err(Error::Numerical(_))));
        assert_eq!(msb.last_dt(FieldKind::E), None);
    }

    #[test]
    fn test_invalid_cell_size_rejected() {
        let grids = BoxArray::new(vec![IndexBox::new_2d([0, 0], [15, 15])]);
        let err = MultiSigmaBox::new(&grids, &grids, [0.0, 1e-6, 1e-6], 4, 4, SpaceDim::Two);
        assert!(matches!(err, Err(Error::Numerical(_))));
    }
}
