//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::generate_contours`] which runs the entire pipeline in
//! one call, [`Pipeline`] lets the caller drive execution one step at a
//! time:
//!
//! ```rust
//! # use tincontour_pipeline::{ContourConfig, ContourError, Pipeline, Point3};
//! # fn run(points: Vec<Point3>) -> Result<(), ContourError> {
//! let staged = Pipeline::new(points, ContourConfig::default())
//!     .triangulate()?
//!     .slice()
//!     .index()
//!     .assemble()
//!     .smooth()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for the fallible triangulation), carrying all previously
//! computed intermediates. The spatial index only exists from
//! [`Indexed`] onward, after slicing has produced every segment, so it is
//! never queried while still being filled.

use crate::assemble::Assembly;
use crate::diagnostics::StageMetrics;
use crate::graph::SegmentGraph;
use crate::index::SegmentIndex;
use crate::progress::{NoProgress, Progress};
use crate::slice::{SegmentSoup, SliceResult};
use crate::triangulate::Triangulator;
use crate::types::{ContourConfig, ContourError, ContourLine, ContourSet, Point3, Triangle};

/// Every intermediate of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedResult {
    /// Input samples.
    pub points: Vec<Point3>,
    /// Triangles that were sliced (after long-edge filtering).
    pub triangles: Vec<Triangle>,
    /// Raw segments produced by slicing.
    pub segments: SegmentSoup,
    /// Anomalous triangle/level pairs skipped during slicing.
    pub anomalies: usize,
    /// Final smoothed contour lines.
    pub contours: ContourSet,
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`triangulate`](Self::triangulate) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .triangulate() to continue"]
pub struct Pending {
    config: ContourConfig,
    points: Vec<Point3>,
}

impl Pending {
    /// The input samples.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Validate inputs, triangulate, and drop over-long triangles.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError::InvalidConfig`] for a bad configuration or
    /// an interval spanning more than
    /// [`ContourConfig::MAX_LEVELS`] levels of the input,
    /// [`ContourError::EmptyInput`], [`ContourError::InsufficientPoints`]
    /// or [`ContourError::NonFiniteInput`] for unusable samples, and
    /// [`ContourError::Degenerate`] when no triangle exists or every
    /// triangle exceeds the maximum edge length.
    pub fn triangulate(self) -> Result<Triangulated, ContourError> {
        self.config.validate()?;
        crate::triangulate::validate_points(&self.points)?;
        let (z_min, z_max) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.z), hi.max(p.z))
            });
        self.config.check_level_count(z_min, z_max)?;

        let triangles = self.config.triangulator.triangulate(&self.points)?;
        let triangles_before_filter = triangles.len();
        let triangles = match self.config.max_triangle_edge_length {
            Some(max_len) => {
                crate::triangulate::filter_long_edges(&self.points, triangles, max_len)
            }
            None => triangles,
        };
        if triangles.is_empty() {
            return Err(ContourError::Degenerate);
        }

        tracing::debug!(
            points = self.points.len(),
            triangles = triangles.len(),
            dropped = triangles_before_filter - triangles.len(),
            "triangulated input",
        );

        Ok(Triangulated {
            config: self.config,
            points: self.points,
            triangles,
            triangles_before_filter,
        })
    }
}

// ───────────────────────── Stage 1: Triangulated ─────────────────────

/// Pipeline state after triangulation.
///
/// Call [`slice`](Self::slice) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .slice() to continue"]
pub struct Triangulated {
    config: ContourConfig,
    points: Vec<Point3>,
    triangles: Vec<Triangle>,
    triangles_before_filter: usize,
}

impl Triangulated {
    /// Triangles that will be sliced.
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Metrics describing this stage's work.
    #[must_use]
    pub fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Triangulation {
            triangulator: format!("{:?}", self.config.triangulator),
            point_count: self.points.len(),
            triangles_before_filter: self.triangles_before_filter,
            triangle_count: self.triangles.len(),
        }
    }

    /// Slice every triangle at every level it spans.
    pub fn slice(self) -> Sliced {
        self.slice_with(&mut NoProgress)
    }

    /// Like [`slice`](Self::slice), reporting progress to `progress`.
    pub fn slice_with(self, progress: &mut dyn Progress) -> Sliced {
        let slice =
            crate::slice::slice_triangles(&self.points, &self.triangles, &self.config, progress);
        Sliced {
            config: self.config,
            points: self.points,
            triangles: self.triangles,
            slice,
        }
    }
}

// ───────────────────────── Stage 2: Sliced ───────────────────────────

/// Pipeline state after slicing.
///
/// Call [`index`](Self::index) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .index() to continue"]
pub struct Sliced {
    config: ContourConfig,
    points: Vec<Point3>,
    triangles: Vec<Triangle>,
    slice: SliceResult,
}

impl Sliced {
    /// All segments produced by slicing.
    #[must_use]
    pub const fn segments(&self) -> &SegmentSoup {
        &self.slice.soup
    }

    /// Metrics describing this stage's work.
    #[must_use]
    pub const fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Slicing {
            pairs_tested: self.slice.pairs_tested,
            segment_count: self.slice.soup.segment_count(),
            touches: self.slice.touches,
            anomalies: self.slice.anomalies,
        }
    }

    /// Build the spatial index and segment graph over all endpoints.
    pub fn index(self) -> Indexed {
        let index = SegmentIndex::build(self.slice.soup.points());
        let graph = SegmentGraph::build(&self.slice.soup, &index, self.config.precision);
        Indexed {
            config: self.config,
            points: self.points,
            triangles: self.triangles,
            slice: self.slice,
            index,
            graph,
        }
    }
}

// ───────────────────────── Stage 3: Indexed ──────────────────────────

/// Pipeline state after building the segment index and graph.
///
/// Call [`assemble`](Self::assemble) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .assemble() to continue"]
pub struct Indexed {
    config: ContourConfig,
    points: Vec<Point3>,
    triangles: Vec<Triangle>,
    slice: SliceResult,
    index: SegmentIndex,
    graph: SegmentGraph,
}

impl Indexed {
    /// The spatial index over segment endpoints.
    #[must_use]
    pub const fn segment_index(&self) -> &SegmentIndex {
        &self.index
    }

    /// The segment graph.
    #[must_use]
    pub const fn graph(&self) -> &SegmentGraph {
        &self.graph
    }

    /// Metrics describing this stage's work.
    #[must_use]
    pub fn stage_metrics(&self) -> StageMetrics {
        let chain_ends = (0..self.graph.node_count())
            .filter(|&n| self.graph.is_chain_end(n))
            .count();
        StageMetrics::Indexing {
            indexed_points: self.index.len(),
            coincident_edges: self.graph.coincident_edge_count(),
            chain_ends,
        }
    }

    /// Walk the graph into open chains and closed loops.
    pub fn assemble(self) -> Assembled {
        self.assemble_with(&mut NoProgress)
    }

    /// Like [`assemble`](Self::assemble), reporting progress to `progress`.
    pub fn assemble_with(self, progress: &mut dyn Progress) -> Assembled {
        let assembly = crate::assemble::assemble(&self.graph, &self.config, progress);
        Assembled {
            config: self.config,
            points: self.points,
            triangles: self.triangles,
            slice: self.slice,
            node_count: self.graph.node_count(),
            assembly,
        }
    }
}

// ───────────────────────── Stage 4: Assembled ────────────────────────

/// Pipeline state after polyline assembly.
///
/// Call [`smooth`](Self::smooth) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .smooth() to continue"]
pub struct Assembled {
    config: ContourConfig,
    points: Vec<Point3>,
    triangles: Vec<Triangle>,
    slice: SliceResult,
    node_count: usize,
    assembly: Assembly,
}

impl Assembled {
    /// Unsmoothed contour lines in output order.
    #[must_use]
    pub fn lines(&self) -> &[ContourLine] {
        &self.assembly.lines
    }

    /// Number of graph nodes visited by the two passes.
    #[must_use]
    pub const fn visited(&self) -> usize {
        self.assembly.visited
    }

    /// Metrics describing this stage's work.
    #[must_use]
    pub fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Assembly {
            open_chains: self.assembly.open_chains,
            closed_loops: self.assembly.closed_loops,
            unclosed_loops: self.assembly.unclosed_loops,
            discarded: self.assembly.discarded,
            visited: self.assembly.visited,
            node_count: self.node_count,
            point_count: self.assembly.lines.iter().map(|l| l.polyline.len()).sum(),
        }
    }

    /// Apply the moving-average smoother to every line.
    pub fn smooth(self) -> Smoothed {
        let filter_size = self.config.effective_filter_size();
        let mut lines = self.assembly.lines;
        let smoothed_lines = if filter_size > 1 {
            lines
                .iter()
                .filter(|l| l.polyline.len() >= filter_size)
                .count()
        } else {
            0
        };
        crate::smooth::smooth_lines(&mut lines, filter_size);
        Smoothed {
            points: self.points,
            triangles: self.triangles,
            slice: self.slice,
            filter_size,
            smoothed_lines,
            contours: ContourSet { lines },
        }
    }
}

// ───────────────────────── Stage 5: Smoothed ─────────────────────────

/// Pipeline state after smoothing, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`StagedResult`].
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Smoothed {
    points: Vec<Point3>,
    triangles: Vec<Triangle>,
    slice: SliceResult,
    filter_size: usize,
    smoothed_lines: usize,
    contours: ContourSet,
}

impl Smoothed {
    /// The final contour lines.
    #[must_use]
    pub const fn contours(&self) -> &ContourSet {
        &self.contours
    }

    /// Metrics describing this stage's work.
    #[must_use]
    pub const fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Smoothing {
            filter_size: self.filter_size,
            smoothed_lines: self.smoothed_lines,
            line_count: self.contours.len(),
        }
    }

    /// Consume the pipeline and return the [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            points: self.points,
            triangles: self.triangles,
            segments: self.slice.soup,
            anomalies: self.slice.anomalies,
            contours: self.contours,
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 6;

/// The output produced by a single pipeline stage.
#[must_use]
pub enum StageOutput<'a> {
    /// Input samples (not yet triangulated).
    Source {
        /// The samples.
        points: &'a [Point3],
    },
    /// Triangulation result.
    Triangulated {
        /// The triangles to slice.
        triangles: &'a [Triangle],
    },
    /// Slicing result.
    Sliced {
        /// The raw segments.
        segments: &'a SegmentSoup,
    },
    /// Index and graph construction result.
    Indexed {
        /// The segment graph.
        graph: &'a SegmentGraph,
    },
    /// Assembly result.
    Assembled {
        /// Unsmoothed contour lines.
        lines: &'a [ContourLine],
    },
    /// Smoothing result.
    Smoothed {
        /// The final contour lines.
        contours: &'a ContourSet,
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// ```rust
/// # use tincontour_pipeline::{ContourConfig, ContourError, Pipeline, Point3};
/// # use tincontour_pipeline::pipeline::{Advance, Stage};
/// # fn run(points: Vec<Point3>) -> Result<(), ContourError> {
/// let mut stage: Stage = Pipeline::new(points, ContourConfig::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
pub trait PipelineStage: Sized {
    /// Machine-friendly name of this stage (e.g. `"slice"`).
    const NAME: &str;

    /// Zero-based index of this stage.
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Stage-specific metrics, `None` for [`Pending`].
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage, `Ok(None)` if already final.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError`] when triangulation fails.
    fn next(self) -> Result<Option<Stage>, ContourError>;

    /// Run all remaining stages and return the [`StagedResult`].
    ///
    /// # Errors
    ///
    /// Returns [`ContourError`] when triangulation fails.
    fn complete(self) -> Result<StagedResult, ContourError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            points: &self.points,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Result<Option<Stage>, ContourError> {
        Ok(Some(Stage::Triangulated(self.triangulate()?)))
    }

    fn complete(self) -> Result<StagedResult, ContourError> {
        self.triangulate()?.complete()
    }
}

impl PipelineStage for Triangulated {
    const NAME: &str = "triangulate";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Triangulated {
            triangles: &self.triangles,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, ContourError> {
        Ok(Some(Stage::Sliced(self.slice())))
    }

    fn complete(self) -> Result<StagedResult, ContourError> {
        self.slice().complete()
    }
}

impl PipelineStage for Sliced {
    const NAME: &str = "slice";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Sliced {
            segments: &self.slice.soup,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, ContourError> {
        Ok(Some(Stage::Indexed(self.index())))
    }

    fn complete(self) -> Result<StagedResult, ContourError> {
        self.index().complete()
    }
}

impl PipelineStage for Indexed {
    const NAME: &str = "index";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Indexed { graph: &self.graph }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, ContourError> {
        Ok(Some(Stage::Assembled(self.assemble())))
    }

    fn complete(self) -> Result<StagedResult, ContourError> {
        self.assemble().complete()
    }
}

impl PipelineStage for Assembled {
    const NAME: &str = "assemble";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Assembled {
            lines: &self.assembly.lines,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, ContourError> {
        Ok(Some(Stage::Smoothed(self.smooth())))
    }

    fn complete(self) -> Result<StagedResult, ContourError> {
        self.smooth().complete()
    }
}

impl PipelineStage for Smoothed {
    const NAME: &str = "smooth";
    const INDEX: usize = 5;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Smoothed {
            contours: &self.contours,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, ContourError> {
        Ok(None)
    }

    fn complete(self) -> Result<StagedResult, ContourError> {
        Ok(self.into_result())
    }
}

/// Type-erased pipeline state, for loop-driven execution.
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Triangulated`].
    Triangulated(Triangulated),
    /// See [`Sliced`].
    Sliced(Sliced),
    /// See [`Indexed`].
    Indexed(Indexed),
    /// See [`Assembled`].
    Assembled(Assembled),
    /// See [`Smoothed`].
    Smoothed(Smoothed),
}

/// Compile-time guard: adding a [`Stage`] variant breaks this match,
/// a reminder to bump [`STAGE_COUNT`].
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::Triangulated(_)
        | Stage::Sliced(_)
        | Stage::Indexed(_)
        | Stage::Assembled(_)
        | Stage::Smoothed(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Triangulated(s) => s.$method($($arg),*),
            Self::Sliced(s) => s.$method($($arg),*),
            Self::Indexed(s) => s.$method($($arg),*),
            Self::Assembled(s) => s.$method($($arg),*),
            Self::Smoothed(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Machine-friendly name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        delegate!(self, output)
    }

    /// Stage-specific metrics, `None` for the initial stage.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Smoothed(_))
    }

    /// Advance to the next stage, `Ok(None)` if already complete.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError`] when triangulation fails.
    pub fn next(self) -> Result<Option<Self>, ContourError> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if
    /// already complete.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError`] when triangulation fails.
    pub fn advance(self) -> Result<Advance, ContourError> {
        if self.is_complete() {
            return Ok(Advance::Complete(self));
        }
        // The guard above rules out the final stage, the only one whose
        // next() is None.
        #[allow(clippy::unreachable)]
        let next = self
            .next()?
            .unwrap_or_else(|| unreachable!("non-complete stage returned None from next()"));
        Ok(Advance::Next(next))
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError`] when triangulation fails.
    pub fn complete(self) -> Result<StagedResult, ContourError> {
        delegate!(self, complete)
    }
}

// Lets the macro call `.name()` and `.index()`: associated constants
// are not reachable through `self`.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Triangulated> for Stage {
    fn from(s: Triangulated) -> Self {
        Self::Triangulated(s)
    }
}

impl From<Sliced> for Stage {
    fn from(s: Sliced) -> Self {
        Self::Sliced(s)
    }
}

impl From<Indexed> for Stage {
    fn from(s: Indexed) -> Self {
        Self::Indexed(s)
    }
}

impl From<Assembled> for Stage {
    fn from(s: Assembled) -> Self {
        Self::Assembled(s)
    }
}

impl From<Smoothed> for Stage {
    fn from(s: Smoothed) -> Self {
        Self::Smoothed(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental contouring pipeline.
///
/// Created via [`Pipeline::new`], which stores the samples and config
/// without doing any processing. Each stage method consumes the current
/// state and returns the next, making it a compile-time error to skip
/// stages or call them out of order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from input samples and config.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(points: Vec<Point3>, config: ContourConfig) -> Pending {
        Pending { config, points }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Two triangles sharing the edge (1, 0)-(0, 1), both spanning z = 5.
    fn two_triangles() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 8.0),
            Point3::new(0.0, 1.0, 8.0),
            Point3::new(1.0, 1.0, 2.0),
        ]
    }

    fn config() -> ContourConfig {
        ContourConfig {
            interval: 5.0,
            smoothing_filter_size: 0,
            ..ContourConfig::default()
        }
    }

    // ─────────── Typed API tests ─────────────────────────────────

    #[test]
    fn pending_exposes_points() {
        let pending = Pipeline::new(two_triangles(), config());
        assert_eq!(pending.points().len(), 4);
    }

    #[test]
    fn triangulate_rejects_invalid_config() {
        let bad = ContourConfig {
            interval: 0.0,
            ..config()
        };
        let result = Pipeline::new(two_triangles(), bad).triangulate();
        assert!(matches!(result, Err(ContourError::InvalidConfig(_))));
    }

    #[test]
    fn triangulate_rejects_interval_finer_than_level_cap() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 1000.0),
            Point3::new(0.0, 10.0, 500.0),
        ];
        let fine = ContourConfig {
            interval: 1e-12,
            ..config()
        };
        let result = Pipeline::new(points, fine).triangulate();
        assert!(matches!(result, Err(ContourError::InvalidConfig(_))));
    }

    #[test]
    fn triangulate_rejects_short_input() {
        let result = Pipeline::new(two_triangles()[..2].to_vec(), config()).triangulate();
        assert!(matches!(
            result,
            Err(ContourError::InsufficientPoints { count: 2 })
        ));
    }

    #[test]
    fn filtering_every_triangle_is_degenerate() {
        let tight = ContourConfig {
            max_triangle_edge_length: Some(0.1),
            ..config()
        };
        let result = Pipeline::new(two_triangles(), tight).triangulate();
        assert!(matches!(result, Err(ContourError::Degenerate)));
    }

    #[test]
    fn stages_expose_intermediates() {
        let triangulated = Pipeline::new(two_triangles(), config())
            .triangulate()
            .unwrap();
        assert_eq!(triangulated.triangles().len(), 2);

        let sliced = triangulated.slice();
        assert!(sliced.segments().segment_count() >= 2);

        let indexed = sliced.index();
        assert_eq!(indexed.segment_index().len(), indexed.graph().node_count());

        let assembled = indexed.assemble();
        assert!(matches!(
            assembled.stage_metrics(),
            StageMetrics::Assembly { visited, node_count, .. } if visited == node_count
        ));
        assert!(assembled.visited() > 0);
        assert!(!assembled.lines().is_empty());

        let smoothed = assembled.smooth();
        assert!(!smoothed.contours().is_empty());

        let staged = smoothed.into_result();
        assert_eq!(staged.points.len(), 4);
        assert_eq!(staged.anomalies, 0);
    }

    #[test]
    fn metrics_reported_for_every_stage_but_pending() {
        let pending = Pipeline::new(two_triangles(), config());
        assert!(PipelineStage::metrics(&pending).is_none());

        let triangulated = pending.triangulate().unwrap();
        assert!(matches!(
            triangulated.stage_metrics(),
            StageMetrics::Triangulation {
                triangle_count: 2,
                ..
            }
        ));
        let smoothed = triangulated.slice().index().assemble().smooth();
        assert!(matches!(
            smoothed.stage_metrics(),
            StageMetrics::Smoothing { filter_size: 0, .. }
        ));
    }

    // ─────────── Dynamic API tests ───────────────────────────────

    #[test]
    fn stage_loop_reaches_completion() {
        let mut stage: Stage = Pipeline::new(two_triangles(), config()).into();
        let mut names = vec![stage.name()];
        assert!(matches!(
            stage.output(),
            StageOutput::Source { points } if points.len() == 4
        ));
        loop {
            match stage.advance().unwrap() {
                Advance::Next(next) => {
                    stage = next;
                    names.push(stage.name());
                    match stage.output() {
                        StageOutput::Source { .. } => unreachable!("source only comes first"),
                        StageOutput::Triangulated { triangles } => {
                            assert_eq!(triangles.len(), 2);
                        }
                        StageOutput::Sliced { segments } => {
                            assert_eq!(segments.segment_count(), 2);
                        }
                        StageOutput::Indexed { graph } => assert_eq!(graph.node_count(), 4),
                        StageOutput::Assembled { lines } => assert!(!lines.is_empty()),
                        StageOutput::Smoothed { contours } => assert!(!contours.is_empty()),
                    }
                }
                Advance::Complete(done) => {
                    stage = done;
                    break;
                }
            }
        }
        assert_eq!(
            names,
            vec!["source", "triangulate", "slice", "index", "assemble", "smooth"]
        );
        assert_eq!(names.len(), STAGE_COUNT);
        assert_eq!(stage.index(), STAGE_COUNT - 1);
        let result = stage.complete().unwrap();
        assert!(!result.contours.is_empty());
    }

    #[test]
    fn complete_matches_typed_chain() {
        let typed = Pipeline::new(two_triangles(), config())
            .triangulate()
            .unwrap()
            .slice()
            .index()
            .assemble()
            .smooth()
            .into_result();
        let dynamic = Stage::from(Pipeline::new(two_triangles(), config()))
            .complete()
            .unwrap();
        assert_eq!(typed, dynamic);
    }

    #[test]
    fn final_stage_next_is_none() {
        let smoothed = Pipeline::new(two_triangles(), config())
            .triangulate()
            .unwrap()
            .slice()
            .index()
            .assemble()
            .smooth();
        assert!(Stage::from(smoothed).next().unwrap().is_none());
    }
}
