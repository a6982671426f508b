//! Dense multi-component data over a single box.

use crate::geometry::{IndexBox, IntVect};

/// Field data over one box (valid region plus ghost cells).
///
/// Storage is component-major, each component in Fortran order
/// (axis 0 fastest), which is also the on-disk layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockArray {
    bx: IndexBox,
    ncomp: usize,
    /// Points per component
    npts: usize,
    data: Vec<f64>,
}

impl BlockArray {
    /// Zero-initialized data over `bx`.
    pub fn new(bx: IndexBox, ncomp: usize) -> Self {
        let npts = bx.num_pts();
        Self {
            bx,
            ncomp,
            npts,
            data: vec![0.0; npts * ncomp],
        }
    }

    /// Full box covered by the data, ghost cells included.
    pub fn bx(&self) -> IndexBox {
        self.bx
    }

    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    #[inline]
    fn offset(&self, iv: IntVect, comp: usize) -> usize {
        debug_assert!(self.bx.contains(iv), "{:?} outside {:?}", iv, self.bx);
        debug_assert!(comp < self.ncomp);
        let lo = self.bx.lo();
        let size = self.bx.size();
        let i = (iv[0] - lo[0]) as usize;
        let j = (iv[1] - lo[1]) as usize;
        let k = (iv[2] - lo[2]) as usize;
        comp * self.npts + i + size[0] as usize * (j + size[1] as usize * k)
    }

    #[inline]
    pub fn get(&self, iv: IntVect, comp: usize) -> f64 {
        self.data[self.offset(iv, comp)]
    }

    #[inline]
    pub fn set(&mut self, iv: IntVect, comp: usize, value: f64) {
        let idx = self.offset(iv, comp);
        self.data[idx] = value;
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Set components `[comp, comp + ncomp)` to `value` over `region`.
    pub fn fill_region(&mut self, region: &IndexBox, comp: usize, ncomp: usize, value: f64) {
        let region = *region & self.bx;
        for c in comp..comp + ncomp {
            for iv in region.iter() {
                self.set(iv, c, value);
            }
        }
    }

    /// Copy `ncomp` components over `region` (destination indices) from
    /// `src`, reading `src` at `iv - shift`.
    pub fn copy_region(
        &mut self,
        src: &BlockArray,
        region: &IndexBox,
        shift: IntVect,
        scomp: usize,
        dcomp: usize,
        ncomp: usize,
    ) {
        for n in 0..ncomp {
            for iv in region.iter() {
                let siv = [iv[0] - shift[0], iv[1] - shift[1], iv[2] - shift[2]];
                let v = src.get(siv, scomp + n);
                self.set(iv, dcomp + n, v);
            }
        }
    }

    /// Raw data of one component.
    pub fn component(&self, comp: usize) -> &[f64] {
        &self.data[comp * self.npts..(comp + 1) * self.npts]
    }

    pub fn component_mut(&mut self, comp: usize) -> &mut [f64] {
        &mut self.data[comp * self.npts..(comp + 1) * self.npts]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
