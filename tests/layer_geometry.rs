//! Layer block sets built around single- and multi-block interiors.

use amrpml::geometry::{BoxArray, Geometry, IndexBox, SpaceDim};
use amrpml::pml::{grown_domain, make_box_array, LayerSides, Pml, PmlConfig};
use amrpml::Error;

fn quadrants(n: i32) -> BoxArray {
    let h = n / 2;
    BoxArray::new(vec![
        IndexBox::new_2d([0, 0], [h - 1, h - 1]),
        IndexBox::new_2d([h, 0], [n - 1, h - 1]),
        IndexBox::new_2d([0, h], [h - 1, n - 1]),
        IndexBox::new_2d([h, h], [n - 1, n - 1]),
    ])
}

/// Layer and interior tile the grown domain without gaps or double cover.
fn assert_exact_cover(geom: &Geometry, grids: &BoxArray, layer: &BoxArray, ncell: i32, sides: &LayerSides) {
    let grown = grown_domain(geom, ncell, sides);
    assert!(layer.is_disjoint(), "layer blocks overlap: {:?}", layer);
    for bx in layer {
        assert!(grown.contains_box(bx), "{} leaves the grown domain {}", bx, grown);
        assert!(!grids.intersects(bx), "{} overlaps the interior", bx);
    }
    assert_eq!(layer.num_pts() + grids.num_pts(), grown.num_pts());
}

#[test]
fn test_cover_single_block_2d() {
    let geom = Geometry::new(IndexBox::new_2d([0, 0], [31, 31]), [1e-6; 3], SpaceDim::Two);
    let grids = BoxArray::new(vec![geom.domain()]);
    let sides = LayerSides::all();
    let layer = make_box_array(&geom, &grids, 6, false, &sides).unwrap();
    assert_exact_cover(&geom, &grids, &layer, 6, &sides);
    assert_eq!(layer.num_pts(), 44 * 44 - 32 * 32);
}

#[test]
fn test_cover_multi_block_2d() {
    let geom = Geometry::new(IndexBox::new_2d([0, 0], [31, 31]), [1e-6; 3], SpaceDim::Two);
    let grids = quadrants(32);
    let sides = LayerSides::all();
    let layer = make_box_array(&geom, &grids, 4, false, &sides).unwrap();
    assert_exact_cover(&geom, &grids, &layer, 4, &sides);
}

#[test]
fn test_cover_3d() {
    let geom = Geometry::new(IndexBox::new([0, 0, 0], [15, 15, 15]), [1e-6; 3], SpaceDim::Three);
    let grids = BoxArray::new(vec![
        IndexBox::new([0, 0, 0], [7, 15, 15]),
        IndexBox::new([8, 0, 0], [15, 15, 15]),
    ]);
    let sides = LayerSides::all();
    let layer = make_box_array(&geom, &grids, 3, false, &sides).unwrap();
    assert_exact_cover(&geom, &grids, &layer, 3, &sides);
    assert_eq!(layer.num_pts(), 22 * 22 * 22 - 16 * 16 * 16);
}

#[test]
fn test_cover_partially_periodic() {
    let geom = Geometry::new(IndexBox::new_2d([0, 0], [31, 31]), [1e-6; 3], SpaceDim::Two)
        .with_periodicity([true, false, false]);
    let grids = quadrants(32);
    let sides = LayerSides::all();
    let layer = make_box_array(&geom, &grids, 4, false, &sides).unwrap();
    assert_exact_cover(&geom, &grids, &layer, 4, &sides);
    // only the two y faces carry a layer
    assert_eq!(layer.num_pts(), 2 * 4 * 32);
}

#[test]
fn test_cover_single_side() {
    let geom = Geometry::new(IndexBox::new_2d([0, 0], [31, 31]), [1e-6; 3], SpaceDim::Two);
    let grids = quadrants(32);
    let sides = LayerSides {
        lo: [true, false, false],
        hi: [false, false, false],
    };
    let layer = make_box_array(&geom, &grids, 4, false, &sides).unwrap();
    assert_exact_cover(&geom, &grids, &layer, 4, &sides);
    assert!(layer.iter().all(|b| b.big_end(0) == -1));
}

#[test]
fn test_in_domain_layer_inside() {
    let geom = Geometry::new(IndexBox::new_2d([0, 0], [31, 31]), [1e-6; 3], SpaceDim::Two);
    let mut cfg = PmlConfig::default();
    cfg.set_ncell(4).set_delta(4).set_pml_in_domain(true);
    let pml = Pml::new(0, &quadrants(32), &geom, None, &cfg).unwrap();
    let layer = pml.layer_boxes(amrpml::pml::PatchType::Fine).unwrap();
    assert!(layer.is_disjoint());
    assert!(layer.iter().all(|b| geom.domain().contains_box(b)));
    assert_eq!(layer.num_pts(), 32 * 32 - 24 * 24);
}

#[test]
fn test_blocking_factor_rejected() {
    let geom = Geometry::new(IndexBox::new_2d([0, 0], [7, 15]), [1e-6; 3], SpaceDim::Two);
    let grids = BoxArray::new(vec![
        IndexBox::new_2d([0, 0], [3, 15]),
        IndexBox::new_2d([4, 0], [7, 15]),
    ]);

    let err = make_box_array(&geom, &grids, 4, false, &LayerSides::all()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("blocking factor"));

    let mut cfg = PmlConfig::default();
    cfg.set_ncell(4).set_delta(4);
    assert!(matches!(Pml::new(0, &grids, &geom, None, &cfg), Err(Error::Config(_))));

    // one cell less fits
    let layer = make_box_array(&geom, &grids, 3, false, &LayerSides::all()).unwrap();
    assert!(layer.is_disjoint());

    // axes without a layer are not constrained
    let geom = geom.with_periodicity([true, false, false]);
    assert!(make_box_array(&geom, &grids, 4, false, &LayerSides::all()).is_ok());
}
