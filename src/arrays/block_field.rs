//! Multi-component fields distributed over a block set.
//!
//! Blocks are processed in parallel with Rayon; every output element is
//! produced from the same inputs regardless of how blocks are scheduled.

use rayon::prelude::*;

use super::block_array::BlockArray;
use crate::geometry::{BoxArray, IndexBox, IndexType, IntVect, Periodicity};
use crate::{Error, Result};

/// A field over every box of a [`BoxArray`], with `ngrow` ghost cells per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockField {
    ba: BoxArray,
    ncomp: usize,
    ngrow: IntVect,
    blocks: Vec<BlockArray>,
}

impl BlockField {
    /// Zero-initialized field.
    pub fn new(ba: BoxArray, ncomp: usize, ngrow: IntVect) -> Self {
        let blocks = ba
            .iter()
            .map(|b| BlockArray::new(b.grow(ngrow), ncomp))
            .collect();
        Self {
            ba,
            ncomp,
            ngrow,
            blocks,
        }
    }

    /// Zero-initialized field on `ba` converted to `itype`.
    pub fn with_type(ba: &BoxArray, itype: IndexType, ncomp: usize, ngrow: IntVect) -> Self {
        Self::new(ba.convert(itype), ncomp, ngrow)
    }

    pub fn box_array(&self) -> &BoxArray {
        &self.ba
    }

    pub fn index_type(&self) -> IndexType {
        self.ba.index_type()
    }

    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    pub fn n_grow(&self) -> IntVect {
        self.ngrow
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn valid_box(&self, i: usize) -> IndexBox {
        self.ba.get(i)
    }

    pub fn blocks(&self) -> &[BlockArray] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [BlockArray] {
        &mut self.blocks
    }

    /// Same boxes, index type and ghost width.
    pub fn same_layout(&self, other: &BlockField) -> bool {
        self.ba == other.ba && self.ngrow == other.ngrow
    }

    /// Value at `iv` from the first block whose valid box contains it.
    pub fn value_at(&self, iv: IntVect, comp: usize) -> Option<f64> {
        self.ba
            .iter()
            .position(|b| b.contains(iv))
            .map(|i| self.blocks[i].get(iv, comp))
    }

    fn check_comps(&self, comp: usize, ncomp: usize, what: &str) -> Result<()> {
        if comp + ncomp > self.ncomp {
            return Err(Error::Config(format!(
                "{}: components [{}, {}) out of range for a {}-component field",
                what,
                comp,
                comp + ncomp,
                self.ncomp
            )));
        }
        Ok(())
    }

    fn check_layout(&self, other: &BlockField, what: &str) -> Result<()> {
        if !self.same_layout(other) {
            return Err(Error::Config(format!(
                "{}: fields are defined on different layouts",
                what
            )));
        }
        Ok(())
    }

    fn clip_ghost(&self, ng: IntVect) -> IntVect {
        [
            ng[0].min(self.ngrow[0]),
            ng[1].min(self.ngrow[1]),
            ng[2].min(self.ngrow[2]),
        ]
    }

    /// Set every component, ghost cells included.
    pub fn set_val(&mut self, value: f64) {
        self.blocks.par_iter_mut().for_each(|b| b.fill(value));
    }

    /// Set components `[comp, comp + ncomp)` on the valid region grown by `ng`.
    pub fn set_val_comps(&mut self, value: f64, comp: usize, ncomp: usize, ng: IntVect) -> Result<()> {
        self.check_comps(comp, ncomp, "set_val")?;
        let ng = self.clip_ghost(ng);
        self.blocks
            .par_iter_mut()
            .zip(self.ba.boxes().par_iter())
            .for_each(|(blk, vbox)| blk.fill_region(&vbox.grow(ng), comp, ncomp, value));
        Ok(())
    }

    /// `dst[dcomp..] = src[scomp..]` over the valid region grown by `ng`.
    pub fn copy(
        dst: &mut BlockField,
        src: &BlockField,
        scomp: usize,
        dcomp: usize,
        ncomp: usize,
        ng: IntVect,
    ) -> Result<()> {
        dst.check_layout(src, "copy")?;
        src.check_comps(scomp, ncomp, "copy source")?;
        dst.check_comps(dcomp, ncomp, "copy destination")?;
        let ng = dst.clip_ghost(ng);
        dst.blocks
            .par_iter_mut()
            .zip(src.blocks.par_iter())
            .zip(src.ba.boxes().par_iter())
            .for_each(|((d, s), vbox)| {
                d.copy_region(s, &vbox.grow(ng), [0; 3], scomp, dcomp, ncomp)
            });
        Ok(())
    }

    /// `dst[dcomp..] += src[scomp..]` over the valid region grown by `ng`.
    pub fn add(
        dst: &mut BlockField,
        src: &BlockField,
        scomp: usize,
        dcomp: usize,
        ncomp: usize,
        ng: IntVect,
    ) -> Result<()> {
        if dst.ba != src.ba {
            return Err(Error::Config(
                "add: fields are defined on different box arrays".into(),
            ));
        }
        src.check_comps(scomp, ncomp, "add source")?;
        dst.check_comps(dcomp, ncomp, "add destination")?;
        let ng = dst.clip_ghost(src.clip_ghost(ng));
        dst.blocks
            .par_iter_mut()
            .zip(src.blocks.par_iter())
            .zip(src.ba.boxes().par_iter())
            .for_each(|((d, s), vbox)| {
                for n in 0..ncomp {
                    for iv in vbox.grow(ng).iter() {
                        let v = d.get(iv, dcomp + n) + s.get(iv, scomp + n);
                        d.set(iv, dcomp + n, v);
                    }
                }
            });
        Ok(())
    }

    /// `dst[dcomp..] = a * x[xcomp..] + b * y[ycomp..]` over the valid region grown by `ng`.
    #[allow(clippy::too_many_arguments)]
    pub fn lin_comb(
        dst: &mut BlockField,
        a: f64,
        x: &BlockField,
        xcomp: usize,
        b: f64,
        y: &BlockField,
        ycomp: usize,
        dcomp: usize,
        ncomp: usize,
        ng: IntVect,
    ) -> Result<()> {
        if dst.ba != x.ba || dst.ba != y.ba {
            return Err(Error::Config(
                "lin_comb: fields are defined on different box arrays".into(),
            ));
        }
        x.check_comps(xcomp, ncomp, "lin_comb x")?;
        y.check_comps(ycomp, ncomp, "lin_comb y")?;
        dst.check_comps(dcomp, ncomp, "lin_comb destination")?;
        let ng = dst.clip_ghost(x.clip_ghost(y.clip_ghost(ng)));
        dst.blocks
            .par_iter_mut()
            .zip(x.blocks.par_iter())
            .zip(y.blocks.par_iter())
            .zip(dst.ba.boxes().par_iter())
            .for_each(|(((d, xb), yb), vbox)| {
                for n in 0..ncomp {
                    for iv in vbox.grow(ng).iter() {
                        let v = a * xb.get(iv, xcomp + n) + b * yb.get(iv, ycomp + n);
                        d.set(iv, dcomp + n, v);
                    }
                }
            });
        Ok(())
    }

    /// Copy `ncomp` components from `src` into `self` wherever the source
    /// blocks (grown by `src_ng`) overlap the destination blocks (grown by
    /// `dst_ng`), including periodic images.
    ///
    /// Where several sources cover the same destination point, the last
    /// source block in box-array order wins.
    #[allow(clippy::too_many_arguments)]
    pub fn parallel_copy(
        &mut self,
        src: &BlockField,
        scomp: usize,
        dcomp: usize,
        ncomp: usize,
        src_ng: IntVect,
        dst_ng: IntVect,
        period: &Periodicity,
    ) -> Result<()> {
        if self.index_type() != src.index_type() && !self.is_empty() && !src.is_empty() {
            return Err(Error::Config(format!(
                "parallel_copy: index type mismatch ({:?} vs {:?})",
                self.index_type().to_int_vect(),
                src.index_type().to_int_vect()
            )));
        }
        src.check_comps(scomp, ncomp, "parallel_copy source")?;
        self.check_comps(dcomp, ncomp, "parallel_copy destination")?;

        let src_ng = src.clip_ghost(src_ng);
        let dst_ng = self.clip_ghost(dst_ng);
        let shifts = period.shift_vectors();
        let src_regions: Vec<IndexBox> = src.ba.iter().map(|b| b.grow(src_ng)).collect();

        log::trace!(
            "parallel_copy: {} -> {} blocks, {} components",
            src.len(),
            self.len(),
            ncomp
        );

        self.blocks
            .par_iter_mut()
            .zip(self.ba.boxes().par_iter())
            .for_each(|(dst, vbox)| {
                let dst_region = vbox.grow(dst_ng);
                for (sblk, sreg) in src.blocks.iter().zip(&src_regions) {
                    for s in &shifts {
                        let overlap = dst_region & sreg.shift(*s);
                        if overlap.ok() {
                            dst.copy_region(sblk, &overlap, *s, scomp, dcomp, ncomp);
                        }
                    }
                }
            });
        Ok(())
    }

    /// Copy component `comp` of `src` into the ghost cells of `self` only,
    /// leaving every valid point untouched.
    pub fn copy_ghost_from(&mut self, src: &BlockField, comp: usize) -> Result<()> {
        self.check_layout(src, "copy_ghost_from")?;
        src.check_comps(comp, 1, "copy_ghost_from source")?;
        self.check_comps(comp, 1, "copy_ghost_from destination")?;
        self.blocks
            .par_iter_mut()
            .zip(src.blocks.par_iter())
            .zip(self.ba.boxes().par_iter())
            .for_each(|((d, s), vbox)| {
                for piece in d.bx().difference(vbox) {
                    d.copy_region(s, &piece, [0; 3], comp, comp, 1);
                }
            });
        Ok(())
    }

    /// Fill ghost cells of every block from the valid cells of the other
    /// blocks, including periodic images. Valid cells are not modified.
    pub fn fill_boundary(&mut self, period: &Periodicity) {
        if self.ngrow.iter().all(|&g| g == 0) {
            return;
        }
        let snapshot = self.blocks.clone();
        let shifts = period.shift_vectors();
        let ncomp = self.ncomp;
        let valid: Vec<IndexBox> = self.ba.iter().copied().collect();

        self.blocks
            .par_iter_mut()
            .zip(valid.par_iter())
            .for_each(|(dst, vbox)| {
                let ghost_pieces = dst.bx().difference(vbox);
                for piece in &ghost_pieces {
                    for (sblk, sbox) in snapshot.iter().zip(&valid) {
                        for s in &shifts {
                            let overlap = *piece & sbox.shift(*s);
                            if overlap.ok() {
                                dst.copy_region(sblk, &overlap, *s, 0, 0, ncomp);
                            }
                        }
                    }
                }
            });
    }

    /// Largest absolute value of component `comp` over valid points.
    pub fn norm_inf(&self, comp: usize) -> f64 {
        self.blocks
            .par_iter()
            .zip(self.ba.boxes().par_iter())
            .map(|(b, vbox)| {
                vbox.iter()
                    .map(|iv| b.get(iv, comp).abs())
                    .fold(0.0, f64::max)
            })
            .reduce(|| 0.0, f64::max)
    }
}
