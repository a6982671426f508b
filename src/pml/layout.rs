//! Construction of the absorbing-layer block set around an interior block set.
//!
//! For each interior block the layer covers, in every face, edge and corner
//! direction, the cells within `ncell` of the block that no interior block
//! covers and that lie inside the (grown) domain:
//!
//! ```text
//!   +----+-----------+----+
//!   | c  |   face    | c  |      c = corner pieces
//!   +----+-----------+----+
//!   |face|  interior |face|
//!   +----+-----------+----+
//!   | c  |   face    | c  |
//!   +----+-----------+----+
//! ```

use crate::geometry::{BoxArray, Geometry, IndexBox, SpaceDim};
use crate::{Error, Result};

/// Per-side enable flags of the layer, low and high along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSides {
    pub lo: [bool; 3],
    pub hi: [bool; 3],
}

impl Default for LayerSides {
    fn default() -> Self {
        Self::all()
    }
}

impl LayerSides {
    pub fn all() -> Self {
        Self {
            lo: [true; 3],
            hi: [true; 3],
        }
    }

    pub fn none() -> Self {
        Self {
            lo: [false; 3],
            hi: [false; 3],
        }
    }

    pub fn any(&self, dir: usize) -> bool {
        self.lo[dir] || self.hi[dir]
    }
}

/// Domain grown by `ncell` on every enabled, non-periodic side.
pub fn grown_domain(geom: &Geometry, ncell: i32, sides: &LayerSides) -> IndexBox {
    let mut domain = geom.domain();
    for d in geom.space_dim().axes() {
        if geom.is_periodic(d) {
            continue;
        }
        if sides.lo[d] {
            domain = domain.grow_lo(d, ncell);
        }
        if sides.hi[d] {
            domain = domain.grow_hi(d, ncell);
        }
    }
    domain
}

/// Interior blocks clipped to their minimal box shrunk by `ncell` on every
/// enabled, non-periodic side; used when the layer overlaps the outermost
/// cells of the domain.
pub fn reduced_grids(geom: &Geometry, grids: &BoxArray, ncell: i32, sides: &LayerSides) -> BoxArray {
    let Some(mut domain0) = grids.minimal_box() else {
        return BoxArray::default();
    };
    for d in geom.space_dim().axes() {
        if geom.is_periodic(d) {
            continue;
        }
        if sides.lo[d] {
            domain0 = domain0.grow_lo(d, -ncell);
        }
        if sides.hi[d] {
            domain0 = domain0.grow_hi(d, -ncell);
        }
    }
    grids.intersect(&domain0)
}

/// Offsets of the 8 (2D) or 26 (3D) neighbors of a block.
fn neighbor_offsets(sdim: SpaceDim) -> impl Iterator<Item = [i32; 3]> {
    let (kbegin, kend) = match sdim {
        SpaceDim::Two => (0, 0),
        SpaceDim::Three => (-1, 1),
    };
    (kbegin..=kend).flat_map(move |kk| {
        (-1..=1).flat_map(move |jj| {
            (-1..=1)
                .map(move |ii| [ii, jj, kk])
                .filter(|o| *o != [0, 0, 0])
        })
    })
}

/// Build the layer block set, `ncell` cells deep around `grids`.
///
/// Returns an empty array when no layer is needed (for example a fully
/// periodic domain, or every side disabled).
///
/// # Errors
/// `Error::Config` when the layer must lie outside the domain and an
/// interior block is not longer than `ncell` along an axis carrying a layer;
/// layers grown from distinct blocks could then overlap.
pub fn make_box_array(
    geom: &Geometry,
    grids: &BoxArray,
    ncell: i32,
    pml_in_domain: bool,
    sides: &LayerSides,
) -> Result<BoxArray> {
    let sdim = geom.space_dim();
    let domain = grown_domain(geom, ncell, sides);
    let mut pieces: Vec<IndexBox> = Vec::new();

    for grid_bx in grids {
        if !pml_in_domain {
            for d in sdim.axes() {
                if !geom.is_periodic(d) && sides.any(d) && grid_bx.length(d) <= ncell {
                    return Err(Error::Config(format!(
                        "block {} is {} cells long along axis {} but the absorbing layer is {} cells deep; \
                         consider using a larger blocking factor",
                        grid_bx,
                        grid_bx.length(d),
                        d,
                        ncell
                    )));
                }
            }
        }

        let bx = grid_bx.grow(sdim.uniform(ncell)) & domain;
        if !bx.ok() {
            continue;
        }

        let size = grid_bx.size();
        let boundary_boxes: Vec<IndexBox> = neighbor_offsets(sdim)
            .map(|o| grid_bx.shift([size[0] * o[0], size[1] * o[1], size[2] * o[2]]) & bx)
            .filter(|b| b.ok())
            .collect();

        for uncovered in grids.complement_in(&bx) {
            for bb in &boundary_boxes {
                let ib = uncovered & *bb;
                if ib.ok() {
                    pieces.push(ib);
                }
            }
        }
    }

    let mut ba = BoxArray::new(pieces);
    ba.remove_overlap();
    Ok(ba)
}
