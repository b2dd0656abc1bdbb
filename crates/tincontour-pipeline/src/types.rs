//! Shared types for the tincontour pipeline.

use serde::{Deserialize, Serialize};

use crate::triangulate::TriangulatorKind;

/// An input elevation sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    /// Easting (or any planar x coordinate).
    pub x: f64,
    /// Northing (or any planar y coordinate).
    pub y: f64,
    /// Elevation.
    pub z: f64,
}

impl Point3 {
    /// Create a new elevation sample.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The planar projection of this sample.
    #[must_use]
    pub const fn xy(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns `true` if all three coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Squared Euclidean distance to another sample, elevation included.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx.mul_add(dx, dy.mul_add(dy, dz * dz))
    }
}

/// A 2D point in the plane of the contour map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// The point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation from `self` towards `other` by `t`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            t.mul_add(other.x - self.x, self.x),
            t.mul_add(other.y - self.y, self.y),
        )
    }
}

/// A sequence of connected points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Returns a mutable slice of all points.
    pub fn points_mut(&mut self) -> &mut [Point] {
        &mut self.0
    }
}

/// Three indices into the input point array.
pub type Triangle = [usize; 3];

/// One endpoint of a segment where a triangle boundary crosses a contour
/// level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourPoint {
    /// Position of the crossing in the plane.
    pub position: Point,
    /// Elevation of the contour this crossing belongs to.
    pub level: f64,
    /// Band index `k` such that `level == base + k * interval`.
    ///
    /// Same-level tests compare bands, never raw elevations.
    pub band: i64,
}

/// One output record: a single contour line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourLine {
    /// Sequential feature id, starting at 1.
    pub fid: usize,
    /// Contour elevation.
    pub elevation: f64,
    /// Band index of the elevation (see [`ContourPoint::band`]).
    pub band: i64,
    /// Whether the line is a closed loop (first vertex == last vertex).
    pub closed: bool,
    /// Vertex geometry.
    pub polyline: Polyline,
}

/// All contour lines produced by one run, in output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContourSet {
    /// Output records. Feature ids run `1..=lines.len()`.
    pub lines: Vec<ContourLine>,
}

impl ContourSet {
    /// Number of contour lines.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if no contour line was produced.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over the closed loops only.
    pub fn closed(&self) -> impl Iterator<Item = &ContourLine> {
        self.lines.iter().filter(|l| l.closed)
    }

    /// Iterate over the open chains only.
    pub fn open(&self) -> impl Iterator<Item = &ContourLine> {
        self.lines.iter().filter(|l| !l.closed)
    }

    /// Total vertex count across all lines.
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.lines.iter().map(|l| l.polyline.len()).sum()
    }
}

/// Configuration for the contouring pipeline.
///
/// Use [`validate`](Self::validate) (called by every pipeline entry
/// point) to check the invariants documented on each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Vertical spacing between contour lines. Finite and > 0.
    pub interval: f64,

    /// Base contour value. Contours are drawn at
    /// `base + k * interval` for integer `k`.
    pub base: f64,

    /// Distance under which two crossing points are the same vertex.
    /// Finite and > 0.
    pub precision: f64,

    /// Width of the mean filter applied to contour vertices.
    ///
    /// `0` disables smoothing. Even values are rounded up to the next
    /// odd value (see [`effective_filter_size`](Self::effective_filter_size)).
    pub smoothing_filter_size: usize,

    /// Triangles with any 3D edge longer than this are dropped before
    /// slicing. `None` keeps every triangle.
    pub max_triangle_edge_length: Option<f64>,

    /// Which triangulation strategy to use.
    pub triangulator: TriangulatorKind,
}

impl ContourConfig {
    /// Default contour interval.
    pub const DEFAULT_INTERVAL: f64 = 10.0;
    /// Default base contour.
    pub const DEFAULT_BASE: f64 = 0.0;
    /// Default coincidence tolerance.
    pub const DEFAULT_PRECISION: f64 = 1e-6;
    /// Default smoothing filter size.
    pub const DEFAULT_SMOOTHING_FILTER_SIZE: usize = 9;
    /// Most contour levels a single run may span.
    pub const MAX_LEVELS: u32 = 100_000;

    /// The filter size actually applied: `0` stays `0`, even sizes are
    /// bumped to the next odd size.
    #[must_use]
    pub const fn effective_filter_size(&self) -> usize {
        let size = self.smoothing_filter_size;
        if size != 0 && size % 2 == 0 {
            size + 1
        } else {
            size
        }
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError::InvalidConfig`] naming the first field
    /// that violates its invariant.
    pub fn validate(&self) -> Result<(), ContourError> {
        if !self.interval.is_finite() || self.interval <= 0.0 {
            return Err(ContourError::InvalidConfig(format!(
                "interval must be finite and positive, got {}",
                self.interval
            )));
        }
        if !self.base.is_finite() {
            return Err(ContourError::InvalidConfig(format!(
                "base must be finite, got {}",
                self.base
            )));
        }
        if !self.precision.is_finite() || self.precision <= 0.0 {
            return Err(ContourError::InvalidConfig(format!(
                "precision must be finite and positive, got {}",
                self.precision
            )));
        }
        if let Some(max_len) = self.max_triangle_edge_length
            && (!max_len.is_finite() || max_len <= 0.0)
        {
            return Err(ContourError::InvalidConfig(format!(
                "max_triangle_edge_length must be finite and positive, got {max_len}"
            )));
        }
        Ok(())
    }

    /// Check that the elevation range `z_min..=z_max` spans at most
    /// [`MAX_LEVELS`](Self::MAX_LEVELS) contour levels.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError::InvalidConfig`] when the interval is too
    /// fine for the data.
    pub fn check_level_count(&self, z_min: f64, z_max: f64) -> Result<(), ContourError> {
        let levels = (z_max - z_min) / self.interval;
        if levels > f64::from(Self::MAX_LEVELS) {
            return Err(ContourError::InvalidConfig(format!(
                "interval {} spans {levels:.0} levels over elevations {z_min}..{z_max}, \
                 more than the maximum of {}",
                self.interval,
                Self::MAX_LEVELS
            )));
        }
        Ok(())
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            base: Self::DEFAULT_BASE,
            precision: Self::DEFAULT_PRECISION,
            smoothing_filter_size: Self::DEFAULT_SMOOTHING_FILTER_SIZE,
            max_triangle_edge_length: None,
            triangulator: TriangulatorKind::default(),
        }
    }
}

/// Errors raised by a [`ContourSink`](crate::sink::ContourSink).
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink failed to write.
    #[error("failed to write contours: {0}")]
    Io(#[from] std::io::Error),

    /// The sink refused a record.
    #[error("contour sink rejected record: {0}")]
    Rejected(String),
}

/// Errors that can occur while generating contours.
#[derive(Debug, thiserror::Error)]
pub enum ContourError {
    /// No input points were given.
    #[error("input point set is empty")]
    EmptyInput,

    /// Fewer points than a single triangle needs.
    #[error("at least 3 points are required for triangulation, got {count}")]
    InsufficientPoints {
        /// Number of points supplied.
        count: usize,
    },

    /// An input point has a NaN or infinite coordinate.
    #[error("input point {index} has a non-finite coordinate")]
    NonFiniteInput {
        /// Index of the offending point.
        index: usize,
    },

    /// The points admit no triangle (all collinear or coincident), or
    /// every triangle was filtered out.
    #[error("no triangulation exists for the input points")]
    Degenerate,

    /// Pipeline configuration is invalid.
    #[error("invalid contour configuration: {0}")]
    InvalidConfig(String),

    /// The output sink failed.
    #[error(transparent)]
    Sink(#[from] SinkError),
}
