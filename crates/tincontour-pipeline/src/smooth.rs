//! Moving-average smoothing of contour polylines.
//!
//! Each vertex is replaced by the unweighted mean of the `F = 2r + 1`
//! vertices centered on it. The filter runs in place as two full sweeps,
//! forward then reverse, so every update already sees its predecessors'
//! smoothed positions.

use crate::types::{ContourLine, Point, Polyline};

/// Smooth `polyline` in place with window size `filter_size`.
///
/// An even size behaves like the next odd size. Does nothing when
/// `filter_size <= 1` or the polyline has fewer than `filter_size`
/// vertices.
pub fn smooth(polyline: &mut Polyline, closed: bool, filter_size: usize) {
    if filter_size <= 1 || polyline.len() < filter_size {
        return;
    }
    if closed {
        smooth_closed(polyline.points_mut(), filter_size / 2);
    } else {
        smooth_open(polyline.points_mut(), filter_size / 2);
    }
}

/// Smooth every line of a run in place.
pub fn smooth_lines(lines: &mut [ContourLine], filter_size: usize) {
    for line in lines {
        smooth(&mut line.polyline, line.closed, filter_size);
    }
}

/// Mean of the window around `i`, with `index(i, offset)` mapping each
/// window slot to a vertex.
#[allow(clippy::cast_precision_loss)]
fn window_mean(
    points: &[Point],
    i: usize,
    radius: usize,
    index: impl Fn(usize, usize) -> usize,
) -> Point {
    let window = 2 * radius + 1;
    let (mut sx, mut sy) = (0.0, 0.0);
    for offset in 0..window {
        let p = points[index(i, offset)];
        sx += p.x;
        sy += p.y;
    }
    Point::new(sx / window as f64, sy / window as f64)
}

/// Open polyline: window slots past either end clamp to the end vertex.
fn smooth_open(points: &mut [Point], radius: usize) {
    let last = points.len() - 1;
    let clamp = |i: usize, offset: usize| (i + offset).saturating_sub(radius).min(last);

    for i in 0..points.len() {
        points[i] = window_mean(points, i, radius, clamp);
    }
    for i in (0..points.len()).rev() {
        points[i] = window_mean(points, i, radius, clamp);
    }
}

/// Closed polyline: the last vertex duplicates the first, so the window
/// wraps over the `n - 1` distinct vertices.
fn smooth_closed(points: &mut [Point], radius: usize) {
    let ring = points.len() - 1;
    let back = radius % ring;
    let wrap = |i: usize, offset: usize| (i + offset + ring - back) % ring;

    for i in 0..ring {
        points[i] = window_mean(points, i, radius, wrap);
    }
    points[ring] = points[0];
    for i in (0..ring).rev() {
        points[i] = window_mean(points, i, radius, wrap);
    }
    points[ring] = points[0];
}
