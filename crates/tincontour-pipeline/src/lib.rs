//! tincontour-pipeline: Pure contour generation pipeline (sans-IO).
//!
//! Converts scattered elevation samples into contour polylines through:
//! triangulation -> iso-level slicing -> segment index -> segment graph ->
//! polyline assembly -> smoothing.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! point slices and returns structured data. Reading point files and
//! writing exports lives in the `tincontour` CLI and `tincontour-export`.

pub mod assemble;
pub mod diagnostics;
pub mod graph;
pub mod index;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod slice;
pub mod smooth;
pub mod triangulate;
pub mod types;

pub use pipeline::{Pipeline, StagedResult};
pub use progress::{NoProgress, Phase, Progress};
pub use sink::ContourSink;
pub use triangulate::{Triangulator, TriangulatorKind};
pub use types::{
    ContourConfig, ContourError, ContourLine, ContourPoint, ContourSet, Point, Point3, Polyline,
    SinkError, Triangle,
};

/// Run the full contouring pipeline.
///
/// # Pipeline steps
///
/// 1. Validate the configuration and the samples
/// 2. Delaunay triangulation, minus over-long triangles
/// 3. Slice every triangle at every contour level it spans
/// 4. Index segment endpoints and link coincident ones
/// 5. Walk open chains, then closed loops
/// 6. Moving-average smoothing
///
/// # Errors
///
/// Returns [`ContourError::InvalidConfig`] for a bad configuration,
/// [`ContourError::EmptyInput`], [`ContourError::InsufficientPoints`] or
/// [`ContourError::NonFiniteInput`] for unusable samples, and
/// [`ContourError::Degenerate`] when the samples admit no triangle.
pub fn generate_contours(
    points: &[Point3],
    config: &ContourConfig,
) -> Result<ContourSet, ContourError> {
    generate_contours_with_progress(points, config, &mut NoProgress)
}

/// Like [`generate_contours`], reporting per-phase progress.
///
/// # Errors
///
/// Same as [`generate_contours`].
pub fn generate_contours_with_progress(
    points: &[Point3],
    config: &ContourConfig,
    progress: &mut dyn Progress,
) -> Result<ContourSet, ContourError> {
    let staged = Pipeline::new(points.to_vec(), config.clone())
        .triangulate()?
        .slice_with(progress)
        .index()
        .assemble_with(progress)
        .smooth()
        .into_result();
    Ok(staged.contours)
}

/// Generate contours and hand every line to `sink`.
///
/// # Errors
///
/// Same as [`generate_contours`], plus [`ContourError::Sink`] when the
/// sink fails. Nothing reaches the sink if generation fails.
pub fn generate_contours_into(
    points: &[Point3],
    config: &ContourConfig,
    sink: &mut dyn ContourSink,
) -> Result<(), ContourError> {
    let set = generate_contours(points, config)?;
    sink::emit(&set, sink)
}
