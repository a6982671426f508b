//! Axis-aligned integer index-space boxes.
//!
//! A box is stored for three axes regardless of the problem dimensionality;
//! in 2D the third axis is a single cell (`lo = hi = 0`) and is never grown.

use std::fmt;
use std::ops::BitAnd;

/// Integer index vector, one entry per axis.
pub type IntVect = [i32; 3];

/// Number of spatial dimensions of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceDim {
    Two,
    Three,
}

impl SpaceDim {
    /// Number of active axes.
    pub fn count(self) -> usize {
        match self {
            SpaceDim::Two => 2,
            SpaceDim::Three => 3,
        }
    }

    /// Iterator over the active axes.
    pub fn axes(self) -> std::ops::Range<usize> {
        0..self.count()
    }

    /// `n` on every active axis, zero on inactive ones.
    pub fn uniform(self, n: i32) -> IntVect {
        match self {
            SpaceDim::Two => [n, n, 0],
            SpaceDim::Three => [n, n, n],
        }
    }
}

/// Per-axis staggering of a box: cell-centered or node-centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndexType {
    nodal: [bool; 3],
}

impl IndexType {
    pub const fn cell() -> Self {
        Self { nodal: [false; 3] }
    }

    pub const fn node() -> Self {
        Self { nodal: [true; 3] }
    }

    pub const fn new(nodal: [bool; 3]) -> Self {
        Self { nodal }
    }

    /// Index type of an edge-centered field pointing along `dir`
    /// (cell-centered along `dir`, nodal elsewhere), as used by E and J.
    pub fn edge(dir: usize, sdim: SpaceDim) -> Self {
        let mut nodal = [false; 3];
        for d in sdim.axes() {
            nodal[d] = d != dir;
        }
        Self { nodal }
    }

    /// Index type of a face-centered field pointing along `dir`
    /// (nodal along `dir`, cell-centered elsewhere), as used by B and H.
    pub fn face(dir: usize, sdim: SpaceDim) -> Self {
        let mut nodal = [false; 3];
        if dir < sdim.count() {
            nodal[dir] = true;
        }
        Self { nodal }
    }

    /// Fully nodal on the active axes.
    pub fn nodal_in(sdim: SpaceDim) -> Self {
        let mut nodal = [false; 3];
        for d in sdim.axes() {
            nodal[d] = true;
        }
        Self { nodal }
    }

    pub fn is_nodal(&self, dir: usize) -> bool {
        self.nodal[dir]
    }

    pub fn is_cell_centered(&self) -> bool {
        self.nodal.iter().all(|n| !n)
    }

    pub fn to_int_vect(&self) -> IntVect {
        [
            self.nodal[0] as i32,
            self.nodal[1] as i32,
            self.nodal[2] as i32,
        ]
    }
}

/// Axis-aligned box `[lo, hi]` (inclusive) in index space.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBox {
    lo: IntVect,
    hi: IntVect,
    itype: IndexType,
}

impl fmt::Debug for IndexBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(({},{},{}) ({},{},{}) ({},{},{}))",
            self.lo[0],
            self.lo[1],
            self.lo[2],
            self.hi[0],
            self.hi[1],
            self.hi[2],
            self.itype.nodal[0] as i32,
            self.itype.nodal[1] as i32,
            self.itype.nodal[2] as i32
        )
    }
}

impl fmt::Display for IndexBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl IndexBox {
    /// Cell-centered box.
    pub const fn new(lo: IntVect, hi: IntVect) -> Self {
        Self {
            lo,
            hi,
            itype: IndexType::cell(),
        }
    }

    pub const fn with_type(lo: IntVect, hi: IntVect, itype: IndexType) -> Self {
        Self { lo, hi, itype }
    }

    /// Cell-centered 2D box; the third axis is pinned to index 0.
    pub const fn new_2d(lo: [i32; 2], hi: [i32; 2]) -> Self {
        Self::new([lo[0], lo[1], 0], [hi[0], hi[1], 0])
    }

    pub fn lo(&self) -> IntVect {
        self.lo
    }

    pub fn hi(&self) -> IntVect {
        self.hi
    }

    pub fn small_end(&self, dir: usize) -> i32 {
        self.lo[dir]
    }

    pub fn big_end(&self, dir: usize) -> i32 {
        self.hi[dir]
    }

    pub fn index_type(&self) -> IndexType {
        self.itype
    }

    pub fn is_cell_centered(&self) -> bool {
        self.itype.is_cell_centered()
    }

    /// True when the box is non-empty.
    pub fn ok(&self) -> bool {
        (0..3).all(|d| self.lo[d] <= self.hi[d])
    }

    pub fn is_empty(&self) -> bool {
        !self.ok()
    }

    pub fn length(&self, dir: usize) -> i32 {
        self.hi[dir] - self.lo[dir] + 1
    }

    pub fn size(&self) -> IntVect {
        [self.length(0), self.length(1), self.length(2)]
    }

    /// Number of points, zero for an empty box.
    pub fn num_pts(&self) -> usize {
        if !self.ok() {
            return 0;
        }
        (0..3).map(|d| self.length(d) as usize).product()
    }

    pub fn contains(&self, iv: IntVect) -> bool {
        (0..3).all(|d| iv[d] >= self.lo[d] && iv[d] <= self.hi[d])
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains_box(&self, other: &IndexBox) -> bool {
        other.ok() && self.contains(other.lo) && self.contains(other.hi)
    }

    /// Intersection; may be empty. Both boxes must share an index type.
    pub fn intersection(&self, other: &IndexBox) -> IndexBox {
        debug_assert_eq!(self.itype, other.itype, "intersecting boxes of different type");
        let mut lo = self.lo;
        let mut hi = self.hi;
        for d in 0..3 {
            lo[d] = lo[d].max(other.lo[d]);
            hi[d] = hi[d].min(other.hi[d]);
        }
        IndexBox::with_type(lo, hi, self.itype)
    }

    pub fn intersects(&self, other: &IndexBox) -> bool {
        self.intersection(other).ok()
    }

    /// Grow by `n[d]` on both sides of every axis (negative shrinks).
    pub fn grow(mut self, n: IntVect) -> IndexBox {
        for d in 0..3 {
            self.lo[d] -= n[d];
            self.hi[d] += n[d];
        }
        self
    }

    /// Grow by `n` on both sides of axis `dir`.
    pub fn grow_dir(mut self, dir: usize, n: i32) -> IndexBox {
        self.lo[dir] -= n;
        self.hi[dir] += n;
        self
    }

    pub fn grow_lo(mut self, dir: usize, n: i32) -> IndexBox {
        self.lo[dir] -= n;
        self
    }

    pub fn grow_hi(mut self, dir: usize, n: i32) -> IndexBox {
        self.hi[dir] += n;
        self
    }

    pub fn shift(mut self, s: IntVect) -> IndexBox {
        for d in 0..3 {
            self.lo[d] += s[d];
            self.hi[d] += s[d];
        }
        self
    }

    /// Cell slab of thickness `len` immediately below the low face along `dir`.
    pub fn adj_cell_lo(&self, dir: usize, len: i32) -> IndexBox {
        let mut b = self.convert(IndexType::cell());
        b.hi[dir] = b.lo[dir] - 1;
        b.lo[dir] -= len;
        b
    }

    /// Cell slab of thickness `len` immediately above the high face along `dir`.
    pub fn adj_cell_hi(&self, dir: usize, len: i32) -> IndexBox {
        let mut b = self.convert(IndexType::cell());
        b.lo[dir] = b.hi[dir] + 1;
        b.hi[dir] += len;
        b
    }

    /// Change staggering: a cell box gains one index on each newly nodal
    /// axis, a nodal box loses one on each newly cell-centered axis.
    pub fn convert(mut self, itype: IndexType) -> IndexBox {
        for d in 0..3 {
            match (self.itype.nodal[d], itype.nodal[d]) {
                (false, true) => self.hi[d] += 1,
                (true, false) => self.hi[d] -= 1,
                _ => {}
            }
        }
        self.itype = itype;
        self
    }

    /// The cells enclosed by this box.
    pub fn enclosed_cells(self) -> IndexBox {
        self.convert(IndexType::cell())
    }

    /// Coarsen by `ratio` per axis (cell-centered boxes).
    pub fn coarsen(mut self, ratio: IntVect) -> IndexBox {
        debug_assert!(self.is_cell_centered(), "coarsening a staggered box");
        for d in 0..3 {
            if ratio[d] > 1 {
                self.lo[d] = self.lo[d].div_euclid(ratio[d]);
                self.hi[d] = self.hi[d].div_euclid(ratio[d]);
            }
        }
        self
    }

    /// `self` minus `other`, as a list of disjoint boxes.
    pub fn difference(&self, other: &IndexBox) -> Vec<IndexBox> {
        let isect = self.intersection(other);
        if !isect.ok() {
            return vec![*self];
        }
        let mut pieces = Vec::new();
        let mut rest = *self;
        for d in 0..3 {
            if rest.lo[d] < isect.lo[d] {
                let mut below = rest;
                below.hi[d] = isect.lo[d] - 1;
                pieces.push(below);
                rest.lo[d] = isect.lo[d];
            }
            if rest.hi[d] > isect.hi[d] {
                let mut above = rest;
                above.lo[d] = isect.hi[d] + 1;
                pieces.push(above);
                rest.hi[d] = isect.hi[d];
            }
        }
        pieces
    }

    /// Iterate every index of the box in Fortran order (axis 0 fastest).
    pub fn iter(&self) -> BoxIter {
        BoxIter {
            bx: *self,
            cur: self.lo,
            done: !self.ok(),
        }
    }
}

impl BitAnd for IndexBox {
    type Output = IndexBox;

    fn bitand(self, rhs: IndexBox) -> IndexBox {
        self.intersection(&rhs)
    }
}

/// Iterator over the indices of an [`IndexBox`].
pub struct BoxIter {
    bx: IndexBox,
    cur: IntVect,
    done: bool,
}

impl Iterator for BoxIter {
    type Item = IntVect;

    fn next(&mut self) -> Option<IntVect> {
        if self.done {
            return None;
        }
        let out = self.cur;
        for d in 0..3 {
            if self.cur[d] < self.bx.hi[d] {
                self.cur[d] += 1;
                return Some(out);
            }
            self.cur[d] = self.bx.lo[d];
        }
        self.done = true;
        Some(out)
    }
}
