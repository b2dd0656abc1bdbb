//! Spatial index over contour segment endpoints.
//!
//! Built once from a complete [`SegmentSoup`](crate::slice::SegmentSoup)
//! and only queried afterwards, so no query can observe a partially
//! populated index.

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::types::{ContourPoint, Point};

/// An endpoint position tagged with its [`ContourPoint`] index.
type IndexedEndpoint = GeomWithData<[f64; 2], usize>;

/// R\*-tree over contour point positions.
#[derive(Debug)]
pub struct SegmentIndex {
    tree: RTree<IndexedEndpoint>,
}

impl SegmentIndex {
    /// Bulk-load an index over all `points`.
    #[must_use]
    pub fn build(points: &[ContourPoint]) -> Self {
        let entries: Vec<IndexedEndpoint> = points
            .iter()
            .enumerate()
            .map(|(i, cp)| GeomWithData::new([cp.position.x, cp.position.y], i))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indices of all endpoints within `radius` of `position`
    /// (inclusive), in ascending index order.
    #[must_use]
    pub fn within(&self, position: Point, radius: f64) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .tree
            .locate_within_distance([position.x, position.y], radius * radius)
            .map(|entry| entry.data)
            .collect();
        found.sort_unstable();
        found
    }
}
