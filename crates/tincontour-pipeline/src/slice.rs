//! Iso-surface slicing: intersect every triangle with every contour level
//! it spans.
//!
//! Each triangle/level pair yields at most one segment. Segments are
//! stored in a [`SegmentSoup`]: a flat array of [`ContourPoint`]s plus an
//! explicit sibling table linking the two endpoints of each segment.

use std::ops::RangeInclusive;

use crate::progress::{Phase, Progress, ProgressTracker};
use crate::types::{ContourConfig, ContourPoint, Point, Point3, Triangle};

/// All contour segments of a run, as paired endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSoup {
    points: Vec<ContourPoint>,
    siblings: Vec<usize>,
}

impl SegmentSoup {
    /// Create an empty soup.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            points: Vec::new(),
            siblings: Vec::new(),
        }
    }

    /// Append one segment and return the indices of its two endpoints.
    pub fn push_segment(
        &mut self,
        start: Point,
        end: Point,
        level: f64,
        band: i64,
    ) -> (usize, usize) {
        let a = self.points.len();
        let b = a + 1;
        self.points.push(ContourPoint {
            position: start,
            level,
            band,
        });
        self.points.push(ContourPoint {
            position: end,
            level,
            band,
        });
        self.siblings.push(b);
        self.siblings.push(a);
        (a, b)
    }

    /// All segment endpoints.
    #[must_use]
    pub fn points(&self) -> &[ContourPoint] {
        &self.points
    }

    /// The other endpoint of the segment `index` belongs to.
    #[must_use]
    pub fn sibling(&self, index: usize) -> usize {
        self.siblings[index]
    }

    /// Iterate over segments as `(start, end)` endpoint index pairs.
    pub fn segments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.siblings
            .iter()
            .enumerate()
            .filter(|&(i, &s)| i < s)
            .map(|(i, &s)| (i, s))
    }

    /// Number of endpoints (twice the number of segments).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no segment was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of segments.
    #[must_use]
    pub const fn segment_count(&self) -> usize {
        self.points.len() / 2
    }
}

/// How a contour plane meets one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossing {
    /// The plane cuts the triangle along a proper segment.
    Segment(Point, Point),
    /// The plane only touches a single vertex.
    Touch,
    /// The crossing count after vertex de-duplication was not 2.
    Anomaly {
        /// Crossings remaining after de-duplication.
        crossings: usize,
    },
}

/// Outcome of slicing a whole triangulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceResult {
    /// Segments produced.
    pub soup: SegmentSoup,
    /// Number of triangle/level pairs examined.
    pub pairs_tested: usize,
    /// Pairs discarded because the plane only touched a vertex.
    pub touches: usize,
    /// Pairs skipped because of an anomalous crossing count.
    pub anomalies: usize,
}

/// Elevation of contour band `band`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn level_of(band: i64, base: f64, interval: f64) -> f64 {
    (band as f64).mul_add(interval, base)
}

/// Contour bands whose level lies within `[z_min, z_max]`.
///
/// Empty when no level falls inside the range.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn band_range(z_min: f64, z_max: f64, base: f64, interval: f64) -> RangeInclusive<i64> {
    let lower = ((z_min - base) / interval).ceil() as i64;
    let upper = ((z_max - base) / interval).floor() as i64;
    lower..=upper
}

/// Where the plane `z = level` crosses the edge `a -> b`, if it does.
///
/// A flat edge lying in the plane reports its first endpoint.
#[allow(clippy::float_cmp)]
fn edge_crossing(a: Point3, b: Point3, level: f64) -> Option<Point> {
    if level < a.z.min(b.z) || level > a.z.max(b.z) {
        return None;
    }
    let t = if a.z == b.z {
        0.0
    } else {
        (level - a.z) / (b.z - a.z)
    };
    Some(a.xy().lerp(b.xy(), t))
}

/// Intersect one triangle with the plane `z = level`.
///
/// Edges are tested in slot order `(p1, p2)`, `(p2, p3)`, `(p1, p3)`.
/// When all three edges report a crossing the plane passes through a
/// vertex, which then shows up on two edges; coinciding crossings are
/// dropped in the fixed order slot 2 (vs 1), slot 3 (vs 1), slot 3
/// (vs 2). Every coincidence found lowers the count, even when the slot
/// was already dropped, so some tie configurations end below 2 and are
/// reported as [`Crossing::Anomaly`].
#[must_use]
pub fn slice_triangle(corners: [Point3; 3], level: f64, precision: f64) -> Crossing {
    let [p1, p2, p3] = corners;
    let mut hits = [
        edge_crossing(p1, p2, level),
        edge_crossing(p2, p3, level),
        edge_crossing(p1, p3, level),
    ];
    let mut count = hits.iter().flatten().count();

    if let [Some(a), Some(b), Some(c)] = hits {
        if a.distance(b) < precision {
            hits[1] = None;
            count -= 1;
        }
        if a.distance(c) < precision {
            hits[2] = None;
            count -= 1;
        }
        if b.distance(c) < precision {
            hits[2] = None;
            count -= 1;
        }
    }

    if count != 2 {
        return Crossing::Anomaly { crossings: count };
    }

    let (start, end) = match hits {
        [_, Some(b), Some(c)] => (b, c),
        [Some(a), None, Some(c)] => (a, c),
        [Some(a), Some(b), None] => (a, b),
        _ => return Crossing::Anomaly { crossings: count },
    };

    if start.distance(end) <= precision {
        Crossing::Touch
    } else {
        Crossing::Segment(start, end)
    }
}

/// Slice every triangle at every contour level it spans.
///
/// Anomalous triangle/level pairs are logged and skipped; they never
/// abort the run.
pub fn slice_triangles(
    points: &[Point3],
    triangles: &[Triangle],
    config: &ContourConfig,
    progress: &mut dyn Progress,
) -> SliceResult {
    let mut result = SliceResult::default();
    let mut tracker = ProgressTracker::new(Phase::Slicing, triangles.len());

    for (tri_idx, &[a, b, c]) in triangles.iter().enumerate() {
        let corners = [points[a], points[b], points[c]];
        let z_min = corners[0].z.min(corners[1].z).min(corners[2].z);
        let z_max = corners[0].z.max(corners[1].z).max(corners[2].z);

        for band in band_range(z_min, z_max, config.base, config.interval) {
            let level = level_of(band, config.base, config.interval);
            result.pairs_tested += 1;
            match slice_triangle(corners, level, config.precision) {
                Crossing::Segment(start, end) => {
                    result.soup.push_segment(start, end, level, band);
                }
                Crossing::Touch => result.touches += 1,
                Crossing::Anomaly { crossings } => {
                    result.anomalies += 1;
                    tracing::warn!(
                        triangle = tri_idx,
                        level,
                        crossings,
                        "anomalous contour crossing count, skipping triangle/level pair",
                    );
                }
            }
        }

        tracker.update(tri_idx, progress);
    }

    tracing::debug!(
        triangles = triangles.len(),
        segments = result.soup.segment_count(),
        touches = result.touches,
        anomalies = result.anomalies,
        "sliced triangulation",
    );
    result
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    const PRECISION: f64 = 1e-9;

    fn config(interval: f64, base: f64) -> ContourConfig {
        ContourConfig {
            interval,
            base,
            precision: PRECISION,
            ..ContourConfig::default()
        }
    }

    /// `true` if `p` lies on segment `a -> b` with fraction in `[0, 1]`.
    fn on_edge(p: Point, a: Point3, b: Point3) -> bool {
        let (a, b) = (a.xy(), b.xy());
        let len = a.distance(b);
        (a.distance(p) + p.distance(b) - len).abs() < 1e-9
    }

    // --- band_range ---

    #[test]
    fn band_range_inclusive_bounds() {
        assert_eq!(band_range(0.0, 20.0, 0.0, 10.0), 0..=2);
        assert_eq!(band_range(1.0, 19.0, 0.0, 10.0), 1..=1);
        assert_eq!(band_range(-25.0, -5.0, 0.0, 10.0), -2..=-1);
        assert_eq!(band_range(3.0, 13.0, 5.0, 2.0), -1..=4);
    }

    #[test]
    fn band_range_empty_between_levels() {
        assert!(band_range(1.0, 9.0, 0.0, 10.0).is_empty());
    }

    #[test]
    fn level_of_band() {
        assert!((level_of(3, 5.0, 2.5) - 12.5).abs() < f64::EPSILON);
        assert!((level_of(-2, 0.0, 10.0) + 20.0).abs() < f64::EPSILON);
    }

    // --- slice_triangle ---

    #[test]
    fn generic_crossing_lies_on_two_edges() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 10.0),
            Point3::new(0.0, 10.0, 4.0),
        ];
        let Crossing::Segment(start, end) = slice_triangle(corners, 5.0, PRECISION) else {
            panic!("expected a segment");
        };
        // Edges (p1,p2) and (p2,p3) span 5; (p1,p3) spans only 0..4.
        assert!(on_edge(start, corners[0], corners[1]));
        assert!(on_edge(end, corners[1], corners[2]));
        assert_eq!(start, Point::new(5.0, 0.0));
    }

    #[test]
    fn crossing_slots_are_normalized() {
        // Only edges (p2,p3) and (p1,p3) span level 5.
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 2.0),
            Point3::new(0.0, 10.0, 10.0),
        ];
        let Crossing::Segment(start, end) = slice_triangle(corners, 5.0, PRECISION) else {
            panic!("expected a segment");
        };
        assert!(on_edge(start, corners[1], corners[2]));
        assert!(on_edge(end, corners[0], corners[2]));
        assert_eq!(end, Point::new(0.0, 5.0));
    }

    #[test]
    fn plane_through_vertex_and_opposite_edge() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 10.0),
            Point3::new(0.0, 10.0, 20.0),
        ];
        // Level 10 passes through p2 and the midpoint of (p1, p3).
        let Crossing::Segment(start, end) = slice_triangle(corners, 10.0, PRECISION) else {
            panic!("expected a segment");
        };
        assert_eq!(start, Point::new(10.0, 0.0));
        assert_eq!(end, Point::new(0.0, 5.0));
    }

    #[test]
    fn single_vertex_touch_is_not_a_segment() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 10.0),
            Point3::new(0.0, 10.0, 20.0),
        ];
        assert_eq!(slice_triangle(corners, 0.0, PRECISION), Crossing::Touch);
        assert_eq!(slice_triangle(corners, 20.0, PRECISION), Crossing::Touch);
    }

    #[test]
    fn level_outside_triangle_is_anomaly_with_zero_crossings() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 2.0),
        ];
        assert_eq!(
            slice_triangle(corners, 5.0, PRECISION),
            Crossing::Anomaly { crossings: 0 }
        );
    }

    #[test]
    fn flat_triangle_in_plane_is_over_resolved() {
        // A tiny flat triangle: all three crossings fall within precision
        // of each other, so the fixed resolution order over-removes.
        let corners = [
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(1e-12, 0.0, 5.0),
            Point3::new(0.0, 1e-12, 5.0),
        ];
        assert_eq!(
            slice_triangle(corners, 5.0, PRECISION),
            Crossing::Anomaly { crossings: 0 }
        );
    }

    #[test]
    fn flat_edge_in_plane_yields_that_edge() {
        // Edge (p1, p2) lies in the plane z = 5; p3 is above.
        let corners = [
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(10.0, 0.0, 5.0),
            Point3::new(0.0, 10.0, 15.0),
        ];
        let Crossing::Segment(start, end) = slice_triangle(corners, 5.0, PRECISION) else {
            panic!("expected a segment");
        };
        assert_eq!(start, Point::new(0.0, 0.0));
        assert_eq!(end, Point::new(10.0, 0.0));
    }

    // --- slice_triangles ---

    #[test]
    fn single_triangle_scenario_yields_one_segment() {
        // Corners at z = 0, 10, 20 with interval 10: level 0 and level 20
        // only touch a vertex, level 10 cuts a proper segment.
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 10.0),
            Point3::new(0.0, 10.0, 20.0),
        ];
        let result =
            slice_triangles(&points, &[[0, 1, 2]], &config(10.0, 0.0), &mut NoProgress);
        assert_eq!(result.pairs_tested, 3);
        assert_eq!(result.touches, 2);
        assert_eq!(result.anomalies, 0);
        assert_eq!(result.soup.segment_count(), 1);
        let cp = result.soup.points()[0];
        assert!((cp.level - 10.0).abs() < f64::EPSILON);
        assert_eq!(cp.band, 1);
    }

    #[test]
    fn every_spanned_level_gets_one_segment() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.5),
            Point3::new(10.0, 0.0, 9.5),
            Point3::new(0.0, 10.0, 3.7),
        ];
        let result =
            slice_triangles(&points, &[[0, 1, 2]], &config(1.0, 0.0), &mut NoProgress);
        // Levels 1..=9 lie strictly inside (0.5, 9.5).
        assert_eq!(result.pairs_tested, 9);
        assert_eq!(result.soup.segment_count(), 9);
        for (a, b) in result.soup.segments() {
            let (pa, pb) = (result.soup.points()[a], result.soup.points()[b]);
            assert_eq!(pa.band, pb.band);
            for p in [pa.position, pb.position] {
                assert!(
                    on_edge(p, points[0], points[1])
                        || on_edge(p, points[1], points[2])
                        || on_edge(p, points[0], points[2]),
                    "endpoint {p:?} is not on a triangle edge",
                );
            }
        }
    }

    #[test]
    fn siblings_pair_segment_endpoints() {
        let mut soup = SegmentSoup::new();
        let (a, b) = soup.push_segment(Point::new(0.0, 0.0), Point::new(1.0, 0.0), 5.0, 0);
        let (c, d) = soup.push_segment(Point::new(1.0, 0.0), Point::new(2.0, 0.0), 5.0, 0);
        assert_eq!(soup.sibling(a), b);
        assert_eq!(soup.sibling(b), a);
        assert_eq!(soup.sibling(c), d);
        assert_eq!(soup.sibling(d), c);
        assert_eq!(soup.segments().collect::<Vec<_>>(), vec![(a, b), (c, d)]);
        assert_eq!(soup.len(), 4);
        assert_eq!(soup.segment_count(), 2);
    }

    #[test]
    fn slicing_reports_progress() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 2.0),
            Point3::new(1.0, 1.0, 3.0),
        ];
        let mut last = None;
        let mut sink = |phase: Phase, pct: u8| {
            assert_eq!(phase, Phase::Slicing);
            last = Some(pct);
        };
        let _ = slice_triangles(
            &points,
            &[[0, 1, 2], [1, 3, 2]],
            &config(0.5, 0.0),
            &mut sink,
        );
        assert_eq!(last, Some(100));
    }
}
