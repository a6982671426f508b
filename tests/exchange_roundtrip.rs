//! Interior <-> layer exchange on a multi-block Yee-staggered level.

use amrpml::arrays::BlockField;
use amrpml::geometry::{BoxArray, Geometry, IndexBox, SpaceDim};
use amrpml::pml::{exchange, split_sum, FieldLayout, PatchType, Pml, PmlConfig, VectorField};

const C: f64 = 7.0;

fn geometry() -> Geometry {
    Geometry::new(IndexBox::new_2d([0, 0], [31, 31]), [1e-6; 3], SpaceDim::Two)
}

fn quadrants() -> BoxArray {
    BoxArray::new(vec![
        IndexBox::new_2d([0, 0], [15, 15]),
        IndexBox::new_2d([16, 0], [31, 15]),
        IndexBox::new_2d([0, 16], [15, 31]),
        IndexBox::new_2d([16, 16], [31, 31]),
    ])
}

fn interior_e(grids: &BoxArray) -> VectorField {
    let layout = FieldLayout::yee(SpaceDim::Two);
    let mk = |d: usize| BlockField::with_type(grids, layout.e[d], 1, [2, 2, 0]);
    [mk(0), mk(1), mk(2)]
}

fn config(in_domain: bool) -> PmlConfig {
    let mut cfg = PmlConfig::default();
    cfg.set_ncell(4).set_delta(4).set_pml_in_domain(in_domain);
    cfg
}

#[test]
fn test_roundtrip_layer_outside_domain() {
    let geom = geometry();
    let grids = quadrants();
    let mut pml = Pml::new(0, &grids, &geom, None, &config(false)).unwrap();

    // layer holds the continuation of the interior constant, split in two
    for f in pml.e_mut(PatchType::Fine).unwrap().iter_mut() {
        f.set_val_comps(5.0, 0, 1, [0; 3]).unwrap();
        f.set_val_comps(C - 5.0, 1, 1, [0; 3]).unwrap();
    }
    let mut e = interior_e(&grids);
    for f in e.iter_mut() {
        f.set_val(-1.0);
        f.set_val_comps(C, 0, 1, [0; 3]).unwrap();
    }

    pml.exchange_e(PatchType::Fine, Some(&mut e)).unwrap();

    for f in &e {
        let domain = geom.domain().convert(f.index_type());
        for (i, blk) in f.blocks().iter().enumerate() {
            let valid = f.valid_box(i);
            for iv in blk.bx().iter() {
                if valid.contains(iv) {
                    assert_eq!(blk.get(iv, 0), C, "valid point {:?} changed", iv);
                } else if !domain.contains(iv) {
                    assert_eq!(blk.get(iv, 0), C, "ghost point {:?} not filled", iv);
                }
            }
        }
    }

    // reverse direction: interior data in component 0, component 1 cleared
    for (d, f) in pml.e(PatchType::Fine).unwrap().iter().enumerate() {
        let domain = geom.domain().convert(f.index_type());
        for (i, blk) in f.blocks().iter().enumerate() {
            let valid = f.valid_box(i);
            for iv in blk.bx().iter() {
                let inside = domain.contains(iv);
                if inside && e[d].value_at(iv, 0).is_some() {
                    assert_eq!(blk.get(iv, 0), C);
                    assert_eq!(blk.get(iv, 1), 0.0);
                } else if valid.contains(iv) && !inside {
                    assert_eq!(blk.get(iv, 0), 5.0);
                    assert_eq!(blk.get(iv, 1), C - 5.0);
                }
            }
        }
    }
}

#[test]
fn test_roundtrip_layer_in_domain() {
    let geom = geometry();
    let grids = quadrants();
    let mut pml = Pml::new(0, &grids, &geom, None, &config(true)).unwrap();

    for f in pml.e_mut(PatchType::Fine).unwrap().iter_mut() {
        f.set_val_comps(5.0, 0, 1, [0; 3]).unwrap();
        f.set_val_comps(-1.0, 1, 1, [0; 3]).unwrap();
    }
    let before: Vec<BlockField> = pml
        .e(PatchType::Fine)
        .unwrap()
        .iter()
        .map(|f| split_sum(f).unwrap())
        .collect();

    let mut e = interior_e(&grids);
    for f in e.iter_mut() {
        f.set_val(C);
    }

    pml.exchange_e(PatchType::Fine, Some(&mut e)).unwrap();

    for (d, f) in e.iter().enumerate() {
        for (i, blk) in f.blocks().iter().enumerate() {
            for iv in f.valid_box(i).iter() {
                let expected = before[d].value_at(iv, 0).unwrap_or(C);
                assert_eq!(blk.get(iv, 0), expected, "E{} at {:?}", d, iv);
            }
        }
    }

    // layer valid data is preserved
    for f in pml.e(PatchType::Fine).unwrap() {
        for (i, blk) in f.blocks().iter().enumerate() {
            for iv in f.valid_box(i).iter() {
                assert_eq!(blk.get(iv, 0), 5.0);
                assert_eq!(blk.get(iv, 1), -1.0);
            }
        }
    }
}

#[test]
fn test_exchange_single_block_matches_multi_block() {
    let geom = geometry();
    let one = BoxArray::new(vec![geom.domain()]);
    let four = quadrants();
    let mut results = Vec::new();

    for grids in [&one, &four] {
        let mut pml = Pml::new(0, grids, &geom, None, &config(false)).unwrap();
        for f in pml.e_mut(PatchType::Fine).unwrap().iter_mut() {
            f.set_val_comps(2.0, 0, 1, [0; 3]).unwrap();
            f.set_val_comps(3.0, 1, 1, [0; 3]).unwrap();
        }
        let mut e = interior_e(grids);
        pml.exchange_e(PatchType::Fine, Some(&mut e)).unwrap();
        let ghost = [-1, -2, 0];
        results.push(e[1].blocks()[0].get(ghost, 0));
    }
    assert_eq!(results, vec![5.0, 5.0]);
}

#[test]
fn test_missing_groups_are_noops() {
    let geom = geometry();
    let grids = quadrants();
    let mut pml = Pml::new(0, &grids, &geom, None, &config(false)).unwrap();
    let mut f = BlockField::new(grids.clone(), 1, [0; 3]);
    let mut h = interior_e(&grids);

    // F and H were never allocated
    pml.exchange_f(PatchType::Fine, Some(&mut f)).unwrap();
    pml.exchange_h_both(Some(&mut h), None).unwrap();
    // no coarse patch
    pml.exchange_e(PatchType::Coarse, Some(&mut h)).unwrap();
    pml.fill_boundary_h(PatchType::Fine);
    pml.fill_boundary_f(PatchType::Coarse);
    assert_eq!(h[0].norm_inf(0), 0.0);

    // a bare layer field can be exchanged directly as well
    let layer = pml.layer_boxes(PatchType::Fine).unwrap().clone();
    let mut bare = BlockField::new(layer, 2, [1, 1, 0]);
    let mut reg = BlockField::new(grids, 1, [1, 1, 0]);
    exchange(&mut bare, &mut reg, &geom, false).unwrap();
}
