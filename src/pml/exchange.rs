//! Data movement between the layer's split fields and the interior fields.
//!
//! The interior solver only sees the physical field, the layer stores it
//! split into 2 or 3 components. Layer to interior therefore reduces (sums
//! the split components), interior to layer broadcasts into the first split
//! component and clears the others.

use crate::arrays::BlockField;
use crate::geometry::Geometry;
use crate::{Error, Result};

/// Sum of the split components of `pml` over its valid cells.
pub fn split_sum(pml: &BlockField) -> Result<BlockField> {
    let ncp = pml.ncomp();
    if !(2..=3).contains(&ncp) {
        return Err(Error::Config(format!(
            "layer field must carry 2 or 3 split components, got {}",
            ncp
        )));
    }
    let mut total = BlockField::new(pml.box_array().clone(), 1, [0; 3]);
    BlockField::lin_comb(&mut total, 1.0, pml, 0, 1.0, pml, 1, 0, 1, [0; 3])?;
    if ncp == 3 {
        BlockField::add(&mut total, pml, 2, 0, 1, [0; 3])?;
    }
    Ok(total)
}

/// Two-way exchange between the layer field `pml` and the interior field `reg`.
///
/// Layer to interior: the split sum is written into the interior valid cells
/// when `pml_in_domain`, otherwise into the interior ghost cells only (the
/// outermost valid cells stay owned by the interior solver).
///
/// Interior to layer: interior valid data lands in split component 0 of the
/// layer cells it covers, the other components are cleared there. With
/// `pml_in_domain` the layer's own valid cells are kept.
pub fn exchange(pml: &mut BlockField, reg: &mut BlockField, geom: &Geometry, pml_in_domain: bool) -> Result<()> {
    let ngr = reg.n_grow();
    let ngp = pml.n_grow();
    let ncp = pml.ncomp();
    let period = geom.periodicity();

    let mut tmp = BlockField::new(reg.box_array().clone(), ncp, ngr);
    let total = split_sum(pml)?;

    if pml_in_domain {
        reg.parallel_copy(&total, 0, 0, 1, [0; 3], [0; 3], &period)?;
    } else if ngr.iter().any(|&g| g > 0) {
        BlockField::copy(&mut tmp, reg, 0, 0, 1, ngr)?;
        tmp.parallel_copy(&total, 0, 0, 1, [0; 3], ngr, &period)?;
        reg.copy_ghost_from(&tmp, 0)?;
    }

    BlockField::copy(&mut tmp, reg, 0, 0, 1, [0; 3])?;
    tmp.set_val_comps(0.0, 1, ncp - 1, [0; 3])?;
    if pml_in_domain {
        tmp.parallel_copy(pml, 0, 0, ncp, [0; 3], [0; 3], &period)?;
    }
    pml.parallel_copy(&tmp, 0, 0, ncp, [0; 3], ngp, &period)?;

    log::trace!(
        "exchanged {} layer blocks with {} interior blocks (in_domain={})",
        pml.len(),
        reg.len(),
        pml_in_domain
    );
    Ok(())
}

/// One-way copy of interior valid data into the layer cells it covers,
/// ghost cells included.
pub fn copy_to_pml(pml: &mut BlockField, reg: &BlockField, geom: &Geometry) -> Result<()> {
    let ngp = pml.n_grow();
    pml.parallel_copy(reg, 0, 0, 1, [0; 3], ngp, &geom.periodicity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoxArray, IndexBox, SpaceDim};
    use crate::pml::layout::{make_box_array, LayerSides};

    fn setup() -> (Geometry, BlockField, BlockField) {
        let geom = Geometry::new(IndexBox::new_2d([0, 0], [7, 7]), [1.0; 3], SpaceDim::Two);
        let grids = BoxArray::new(vec![geom.domain()]);
        let layer = make_box_array(&geom, &grids, 2, false, &LayerSides::all()).unwrap();
        let reg = BlockField::new(grids, 1, [2, 2, 0]);
        let pml = BlockField::new(layer, 2, [2, 2, 0]);
        (geom, reg, pml)
    }

    #[test]
    fn test_split_sum() {
        let (_, _, mut pml) = setup();
        pml.set_val_comps(3.0, 0, 1, [0; 3]).unwrap();
        pml.set_val_comps(1.0, 1, 1, [0; 3]).unwrap();
        let total = split_sum(&pml).unwrap();
        assert_eq!(total.value_at([-1, 3, 0], 0), Some(4.0));
        assert_eq!(total.n_grow(), [0; 3]);
    }

    #[test]
    fn test_exchange_outside_domain() {
        let (geom, mut reg, mut pml) = setup();
        reg.set_val(-1.0);
        reg.set_val_comps(7.0, 0, 1, [0; 3]).unwrap();
        pml.set_val_comps(3.0, 0, 1, [0; 3]).unwrap();
        pml.set_val_comps(1.0, 1, 1, [0; 3]).unwrap();

        exchange(&mut pml, &mut reg, &geom, false).unwrap();

        let blk = &reg.blocks()[0];
        assert_eq!(blk.get([0, 0, 0], 0), 7.0);
        assert_eq!(blk.get([7, 4, 0], 0), 7.0);
        // ghost ring fully covered by the 2-cell layer
        assert_eq!(blk.get([-1, 4, 0], 0), 4.0);
        assert_eq!(blk.get([9, 9, 0], 0), 4.0);

        // layer ghosts over the interior: comp 0 from the interior, comp 1 cleared
        let i = pml
            .box_array()
            .iter()
            .position(|b| b.contains([-1, 4, 0]))
            .unwrap();
        let lblk = &pml.blocks()[i];
        assert_eq!(lblk.get([0, 4, 0], 0), 7.0);
        assert_eq!(lblk.get([1, 4, 0], 1), 0.0);
        // layer valid cells are untouched
        assert_eq!(lblk.get([-1, 4, 0], 0), 3.0);
        assert_eq!(lblk.get([-2, 4, 0], 1), 1.0);
    }

    #[test]
    fn test_copy_to_pml() {
        let (geom, mut reg, pml) = setup();
        reg.set_val_comps(2.5, 0, 1, [0; 3]).unwrap();
        let mut j = BlockField::new(pml.box_array().clone(), 1, pml.n_grow());
        copy_to_pml(&mut j, &reg, &geom).unwrap();
        assert_eq!(j.norm_inf(0), 0.0);
        let i = j.box_array().iter().position(|b| b.contains([8, 0, 0])).unwrap();
        assert_eq!(j.blocks()[i].get([7, 0, 0], 0), 2.5);
        // a single-component field cannot act as a split layer field
        assert!(matches!(
            exchange(&mut j, &mut reg, &geom, false),
            Err(Error::Config(_))
        ));
    }
}
