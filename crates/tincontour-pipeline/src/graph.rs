//! Segment graph: connectivity between contour segment endpoints.
//!
//! One node per [`ContourPoint`] (node index == contour point index).
//! [`Link::Segment`] edges pair the two endpoints of a segment;
//! [`Link::Coincident`] edges join same-band endpoints that lie within
//! the coincidence tolerance and therefore represent one physical vertex.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::index::SegmentIndex;
use crate::slice::SegmentSoup;
use crate::types::ContourPoint;

/// Kind of connection between two contour points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Link {
    /// The two endpoints of one triangle/level segment.
    Segment,
    /// Two endpoints at the same position and level.
    Coincident,
}

/// Undirected graph over all contour points of a run.
#[derive(Debug, Clone)]
pub struct SegmentGraph {
    graph: UnGraph<ContourPoint, Link>,
    segment_edges: usize,
    coincident_edges: usize,
}

impl SegmentGraph {
    /// Build the graph from a complete segment soup and its index.
    ///
    /// `index` must have been built from `soup.points()`.
    #[must_use]
    pub fn build(soup: &SegmentSoup, index: &SegmentIndex, precision: f64) -> Self {
        let points = soup.points();
        let mut graph = UnGraph::with_capacity(points.len(), points.len());
        for &cp in points {
            graph.add_node(cp);
        }

        let mut segment_edges = 0;
        for (a, b) in soup.segments() {
            graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), Link::Segment);
            segment_edges += 1;
        }

        let mut coincident_edges = 0;
        for (i, cp) in points.iter().enumerate() {
            for j in index.within(cp.position, precision) {
                if j > i && points[j].band == cp.band {
                    graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), Link::Coincident);
                    coincident_edges += 1;
                }
            }
        }

        tracing::debug!(
            nodes = points.len(),
            segment_edges,
            coincident_edges,
            "built segment graph",
        );

        Self {
            graph,
            segment_edges,
            coincident_edges,
        }
    }

    /// Number of nodes (contour points).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of [`Link::Segment`] edges.
    #[must_use]
    pub const fn segment_edge_count(&self) -> usize {
        self.segment_edges
    }

    /// Number of [`Link::Coincident`] edges.
    #[must_use]
    pub const fn coincident_edge_count(&self) -> usize {
        self.coincident_edges
    }

    /// The contour point stored at node `n`.
    #[must_use]
    pub fn point(&self, n: usize) -> &ContourPoint {
        &self.graph[NodeIndex::new(n)]
    }

    /// The other endpoint of the segment `n` belongs to.
    #[must_use]
    pub fn sibling(&self, n: usize) -> Option<usize> {
        self.graph
            .edges(NodeIndex::new(n))
            .find(|e| *e.weight() == Link::Segment)
            .map(|e| e.target().index())
    }

    /// Same-band endpoints coincident with `n`, in ascending index order.
    #[must_use]
    pub fn coincident(&self, n: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = self
            .graph
            .edges(NodeIndex::new(n))
            .filter(|e| *e.weight() == Link::Coincident)
            .map(|e| e.target().index())
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Returns `true` if no other endpoint shares `n`'s position, so
    /// the physical vertex has degree 1 and ends an open chain.
    #[must_use]
    pub fn is_chain_end(&self, n: usize) -> bool {
        !self
            .graph
            .edges(NodeIndex::new(n))
            .any(|e| *e.weight() == Link::Coincident)
    }
}
