//! Triangulation: build a planar triangle mesh over the input samples.
//!
//! This module defines the [`Triangulator`] trait for pluggable
//! triangulation algorithms and the [`TriangulatorKind`] enum for
//! selecting one at runtime. Triangulation happens on the `(x, y)`
//! projection; elevations ride along by index.

use serde::{Deserialize, Serialize};

use crate::types::{ContourError, Point3, Triangle};

/// Selects which triangulation algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriangulatorKind {
    /// Unconstrained Delaunay triangulation via the `delaunator` crate.
    ///
    /// Covers the convex hull of the input. Use
    /// [`ContourConfig::max_triangle_edge_length`](crate::ContourConfig::max_triangle_edge_length)
    /// to trim long hull-spanning triangles.
    #[default]
    Delaunay,
}

/// Trait for triangulation strategies.
///
/// Input: validated elevation samples (at least 3, all finite).
/// Output: triangles as index triples into the input slice.
pub trait Triangulator {
    /// Triangulate the `(x, y)` projection of `points`.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError::Degenerate`] when no triangle exists.
    fn triangulate(&self, points: &[Point3]) -> Result<Vec<Triangle>, ContourError>;
}

impl Triangulator for TriangulatorKind {
    fn triangulate(&self, points: &[Point3]) -> Result<Vec<Triangle>, ContourError> {
        match *self {
            Self::Delaunay => triangulate_delaunay(points),
        }
    }
}

/// Check that a point set can be triangulated at all.
///
/// # Errors
///
/// Returns [`ContourError::EmptyInput`] for an empty slice,
/// [`ContourError::InsufficientPoints`] for fewer than three points and
/// [`ContourError::NonFiniteInput`] for the first point with a NaN or
/// infinite coordinate.
pub fn validate_points(points: &[Point3]) -> Result<(), ContourError> {
    if points.is_empty() {
        return Err(ContourError::EmptyInput);
    }
    if points.len() < 3 {
        return Err(ContourError::InsufficientPoints {
            count: points.len(),
        });
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(ContourError::NonFiniteInput { index });
    }
    Ok(())
}

fn triangulate_delaunay(points: &[Point3]) -> Result<Vec<Triangle>, ContourError> {
    let coords: Vec<delaunator::Point> = points
        .iter()
        .map(|p| delaunator::Point { x: p.x, y: p.y })
        .collect();
    let triangulation = delaunator::triangulate(&coords);

    let triangles: Vec<Triangle> = triangulation
        .triangles
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    if triangles.is_empty() {
        return Err(ContourError::Degenerate);
    }
    Ok(triangles)
}

/// Drop triangles whose longest 3D edge exceeds `max_edge_length`.
///
/// Delaunay triangulation always fills the convex hull, so concave data
/// extents produce long sliver triangles that would otherwise carry
/// contours across areas with no samples.
#[must_use = "returns the retained triangles"]
pub fn filter_long_edges(
    points: &[Point3],
    triangles: Vec<Triangle>,
    max_edge_length: f64,
) -> Vec<Triangle> {
    let limit_sq = max_edge_length * max_edge_length;
    triangles
        .into_iter()
        .filter(|&t| max_edge_length_squared(points, t) <= limit_sq)
        .collect()
}

/// Squared length of the longest edge of a triangle, elevation included.
fn max_edge_length_squared(points: &[Point3], [a, b, c]: Triangle) -> f64 {
    let (pa, pb, pc) = (points[a], points[b], points[c]);
    pa.distance_squared(pb)
        .max(pa.distance_squared(pc))
        .max(pb.distance_squared(pc))
}
