//! Ordered collections of index boxes.

use super::index_box::{IndexBox, IndexType, IntVect};

/// Ordered list of boxes sharing one index type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxArray {
    boxes: Vec<IndexBox>,
}

impl BoxArray {
    pub fn new(boxes: Vec<IndexBox>) -> Self {
        debug_assert!(
            boxes.windows(2).all(|w| w[0].index_type() == w[1].index_type()),
            "box array mixes index types"
        );
        Self { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn boxes(&self) -> &[IndexBox] {
        &self.boxes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexBox> {
        self.boxes.iter()
    }

    pub fn get(&self, i: usize) -> IndexBox {
        self.boxes[i]
    }

    /// Index type shared by every box (cell-centered for an empty array).
    pub fn index_type(&self) -> IndexType {
        self.boxes
            .first()
            .map(|b| b.index_type())
            .unwrap_or_default()
    }

    /// Total number of points.
    pub fn num_pts(&self) -> usize {
        self.boxes.iter().map(|b| b.num_pts()).sum()
    }

    /// Smallest box enclosing every box, `None` for an empty array.
    pub fn minimal_box(&self) -> Option<IndexBox> {
        let first = self.boxes.first()?;
        let mut lo = first.lo();
        let mut hi = first.hi();
        for b in &self.boxes[1..] {
            for d in 0..3 {
                lo[d] = lo[d].min(b.lo()[d]);
                hi[d] = hi[d].max(b.hi()[d]);
            }
        }
        Some(IndexBox::with_type(lo, hi, first.index_type()))
    }

    /// For every member grown by `ng`, its (non-empty) intersection with `bx`.
    pub fn intersections(&self, bx: &IndexBox, ng: IntVect) -> Vec<(usize, IndexBox)> {
        self.boxes
            .iter()
            .enumerate()
            .filter_map(|(i, b)| {
                let isect = b.grow(ng) & *bx;
                isect.ok().then_some((i, isect))
            })
            .collect()
    }

    /// True when any member intersects `bx`.
    pub fn intersects(&self, bx: &IndexBox) -> bool {
        self.boxes.iter().any(|b| b.intersects(bx))
    }

    /// The part of `bx` not covered by any member, as disjoint boxes.
    pub fn complement_in(&self, bx: &IndexBox) -> Vec<IndexBox> {
        let mut remaining = vec![*bx];
        for b in &self.boxes {
            if !b.intersects(bx) {
                continue;
            }
            remaining = remaining
                .into_iter()
                .flat_map(|r| r.difference(b))
                .collect();
            if remaining.is_empty() {
                break;
            }
        }
        remaining
    }

    /// Make the members pairwise disjoint while keeping the covered region.
    ///
    /// Earlier boxes keep their extent; later ones are trimmed.
    pub fn remove_overlap(&mut self) {
        let mut kept: Vec<IndexBox> = Vec::with_capacity(self.boxes.len());
        for b in self.boxes.drain(..) {
            let mut pieces = vec![b];
            for k in &kept {
                if pieces.is_empty() {
                    break;
                }
                pieces = pieces.into_iter().flat_map(|p| p.difference(k)).collect();
            }
            kept.extend(pieces.into_iter().filter(|p| p.ok()));
        }
        self.boxes = kept;
    }

    /// Keep only the parts of each member lying inside `bx`.
    pub fn intersect(&self, bx: &IndexBox) -> BoxArray {
        BoxArray::new(
            self.boxes
                .iter()
                .map(|b| *b & *bx)
                .filter(|b| b.ok())
                .collect(),
        )
    }

    pub fn coarsen(&self, ratio: IntVect) -> BoxArray {
        BoxArray::new(self.boxes.iter().map(|b| b.coarsen(ratio)).collect())
    }

    pub fn convert(&self, itype: IndexType) -> BoxArray {
        BoxArray::new(self.boxes.iter().map(|b| b.convert(itype)).collect())
    }

    pub fn enclosed_cells(&self) -> BoxArray {
        self.convert(IndexType::cell())
    }

    pub fn grow(&self, ng: IntVect) -> BoxArray {
        BoxArray::new(self.boxes.iter().map(|b| b.grow(ng)).collect())
    }

    /// True when no two members overlap.
    pub fn is_disjoint(&self) -> bool {
        self.boxes
            .iter()
            .enumerate()
            .all(|(i, a)| self.boxes[i + 1..].iter().all(|b| !a.intersects(b)))
    }
}

impl From<Vec<IndexBox>> for BoxArray {
    fn from(boxes: Vec<IndexBox>) -> Self {
        Self::new(boxes)
    }
}

impl<'a> IntoIterator for &'a BoxArray {
    type Item = &'a IndexBox;
    type IntoIter = std::slice::Iter<'a, IndexBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blocks() -> BoxArray {
        BoxArray::new(vec![
            IndexBox::new([0, 0, 0], [7, 7, 7]),
            IndexBox::new([8, 0, 0], [15, 7, 7]),
        ])
    }

    #[test]
    fn test_minimal_box() {
        let ba = two_blocks();
        assert_eq!(ba.minimal_box(), Some(IndexBox::new([0, 0, 0], [15, 7, 7])));
        assert_eq!(BoxArray::default().minimal_box(), None);
    }

    #[test]
    fn test_intersections_with_growth() {
        let ba = two_blocks();
        let query = IndexBox::new([16, 0, 0], [17, 7, 7]);
        assert!(ba.intersections(&query, [0, 0, 0]).is_empty());
        let hits = ba.intersections(&query, [2, 2, 2]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[0].1, query);
    }

    #[test]
    fn test_complement_in() {
        let ba = two_blocks();
        let bx = IndexBox::new([-2, -2, -2], [17, 9, 9]);
        let rest = ba.complement_in(&bx);
        let covered: usize = rest.iter().map(|b| b.num_pts()).sum();
        assert_eq!(covered, bx.num_pts() - ba.num_pts());
        for r in &rest {
            assert!(!ba.intersects(r));
        }
    }

    #[test]
    fn test_remove_overlap_keeps_cover() {
        let mut ba = BoxArray::new(vec![
            IndexBox::new([0, 0, 0], [5, 5, 0]),
            IndexBox::new([3, 3, 0], [8, 8, 0]),
            IndexBox::new([0, 0, 0], [5, 5, 0]),
        ]);
        ba.remove_overlap();
        assert!(ba.is_disjoint());
        assert_eq!(ba.num_pts(), 36 + 36 - 9);
    }

    #[test]
    fn test_intersect_drops_empty() {
        let ba = two_blocks();
        let clipped = ba.intersect(&IndexBox::new([0, 0, 0], [3, 7, 7]));
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped.get(0), IndexBox::new([0, 0, 0], [3, 7, 7]));
    }
}
