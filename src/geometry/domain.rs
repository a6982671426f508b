//! Problem domain description: extent, cell size, periodicity.

use super::index_box::{IndexBox, IntVect, SpaceDim};

/// Domain geometry of one refinement level.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    domain: IndexBox,
    cell_size: [f64; 3],
    periodic: [bool; 3],
    sdim: SpaceDim,
}

impl Geometry {
    /// Non-periodic geometry over a cell-centered `domain`.
    pub fn new(domain: IndexBox, cell_size: [f64; 3], sdim: SpaceDim) -> Self {
        debug_assert!(domain.is_cell_centered(), "domain must be cell-centered");
        Self {
            domain,
            cell_size,
            periodic: [false; 3],
            sdim,
        }
    }

    pub fn with_periodicity(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        for d in self.sdim.count()..3 {
            self.periodic[d] = false;
        }
        self
    }

    pub fn domain(&self) -> IndexBox {
        self.domain
    }

    pub fn cell_size(&self) -> [f64; 3] {
        self.cell_size
    }

    pub fn space_dim(&self) -> SpaceDim {
        self.sdim
    }

    pub fn is_periodic(&self, dir: usize) -> bool {
        self.periodic[dir]
    }

    pub fn is_all_periodic(&self) -> bool {
        self.sdim.axes().all(|d| self.periodic[d])
    }

    pub fn periodicity(&self) -> Periodicity {
        let mut period = [0; 3];
        for d in self.sdim.axes() {
            if self.periodic[d] {
                period[d] = self.domain.length(d);
            }
        }
        Periodicity { period }
    }

    /// Geometry of the next coarser level.
    pub fn coarsen(&self, ratio: IntVect) -> Geometry {
        let mut cell_size = self.cell_size;
        for d in self.sdim.axes() {
            cell_size[d] *= ratio[d] as f64;
        }
        Geometry {
            domain: self.domain.coarsen(ratio),
            cell_size,
            periodic: self.periodic,
            sdim: self.sdim,
        }
    }
}

/// Periodic image lengths per axis (zero on non-periodic axes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Periodicity {
    period: IntVect,
}

impl Periodicity {
    pub fn non_periodic() -> Self {
        Self::default()
    }

    pub fn period(&self) -> IntVect {
        self.period
    }

    pub fn is_any_periodic(&self) -> bool {
        self.period.iter().any(|&p| p > 0)
    }

    /// Every image shift to consider, the zero shift first.
    pub fn shift_vectors(&self) -> Vec<IntVect> {
        let range = |p: i32| -> Vec<i32> {
            if p > 0 {
                vec![0, -p, p]
            } else {
                vec![0]
            }
        };
        let mut shifts = Vec::with_capacity(27);
        for &k in &range(self.period[2]) {
            for &j in &range(self.period[1]) {
                for &i in &range(self.period[0]) {
                    shifts.push([i, j, k]);
                }
            }
        }
        shifts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodicity_shifts() {
        let geom = Geometry::new(
            IndexBox::new([0, 0, 0], [31, 15, 7]),
            [1.0; 3],
            SpaceDim::Three,
        )
        .with_periodicity([true, false, true]);
        let p = geom.periodicity();
        assert_eq!(p.period(), [32, 0, 8]);
        let shifts = p.shift_vectors();
        assert_eq!(shifts.len(), 9);
        assert_eq!(shifts[0], [0, 0, 0]);
        assert!(shifts.contains(&[-32, 0, 8]));
    }

    #[test]
    fn test_2d_ignores_third_axis_periodicity() {
        let geom = Geometry::new(IndexBox::new_2d([0, 0], [15, 15]), [1.0; 3], SpaceDim::Two)
            .with_periodicity([true, true, true]);
        assert!(geom.is_all_periodic());
        assert_eq!(geom.periodicity().period(), [16, 16, 0]);
    }

    #[test]
    fn test_coarsen_geometry() {
        let geom = Geometry::new(
            IndexBox::new([0, 0, 0], [63, 63, 63]),
            [0.5e-6; 3],
            SpaceDim::Three,
        );
        let c = geom.coarsen([2, 2, 2]);
        assert_eq!(c.domain(), IndexBox::new([0, 0, 0], [31, 31, 31]));
        assert!((c.cell_size()[0] - 1.0e-6).abs() < 1e-18);
    }
}
