//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`generate_contours_with_diagnostics`] runs the same stages as
//! [`generate_contours`](crate::generate_contours) and records a
//! [`StageDiagnostics`] for each one.
//!
//! Time is read through the [`Clock`] trait so this crate carries no
//! platform time dependency; the caller supplies a clock (the CLI uses
//! `std::time::Instant`, tests use a fake).
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::progress::Progress;
use crate::types::{ContourConfig, ContourError, ContourSet, Point3};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic time for stage measurements.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: triangulation and long-edge filtering.
    pub triangulation: StageDiagnostics,
    /// Stage 2: iso-level slicing.
    pub slicing: StageDiagnostics,
    /// Stage 3: segment index and graph construction.
    pub indexing: StageDiagnostics,
    /// Stage 4: polyline assembly.
    pub assembly: StageDiagnostics,
    /// Stage 5: smoothing.
    pub smoothing: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Triangulation metrics.
    Triangulation {
        /// Which triangulator was used.
        triangulator: String,
        /// Number of input samples.
        point_count: usize,
        /// Triangles produced by the triangulator.
        triangles_before_filter: usize,
        /// Triangles kept after long-edge filtering.
        triangle_count: usize,
    },
    /// Slicing metrics.
    Slicing {
        /// Triangle/level pairs examined.
        pairs_tested: usize,
        /// Segments produced.
        segment_count: usize,
        /// Pairs where the plane only touched a vertex.
        touches: usize,
        /// Pairs skipped for an anomalous crossing count.
        anomalies: usize,
    },
    /// Segment index and graph metrics.
    Indexing {
        /// Endpoints in the spatial index.
        indexed_points: usize,
        /// Coincident endpoint pairs found.
        coincident_edges: usize,
        /// Endpoints with no coincident partner.
        chain_ends: usize,
    },
    /// Polyline assembly metrics.
    Assembly {
        /// Open chains found in pass 1.
        open_chains: usize,
        /// Closed loops found in pass 2.
        closed_loops: usize,
        /// Pass 2 walks that failed to close.
        unclosed_loops: usize,
        /// Walks discarded as degenerate.
        discarded: usize,
        /// Graph nodes visited.
        visited: usize,
        /// Graph nodes in total.
        node_count: usize,
        /// Vertices across all assembled lines.
        point_count: usize,
    },
    /// Smoothing metrics.
    Smoothing {
        /// Effective filter size (0 when disabled).
        filter_size: usize,
        /// Lines long enough to be smoothed.
        smoothed_lines: usize,
        /// Number of lines.
        line_count: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Input samples.
    pub input_points: usize,
    /// Triangles sliced.
    pub triangles: usize,
    /// Segments produced by slicing.
    pub segments: usize,
    /// Anomalous triangle/level pairs skipped.
    pub anomalies: usize,
    /// Contour lines emitted.
    pub contour_count: usize,
    /// Of which closed loops.
    pub closed_count: usize,
    /// Vertices across all emitted lines.
    pub final_point_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Contour Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Input: {} points, {} triangles",
            self.summary.input_points, self.summary.triangles,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Triangulation", &self.triangulation),
            ("Slicing", &self.slicing),
            ("Indexing", &self.indexing),
            ("Assembly", &self.assembly),
            ("Smoothing", &self.smoothing),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {} ({} closed)  |  Segments: {}  |  Points: {}  |  Anomalies: {}",
            self.summary.contour_count,
            self.summary.closed_count,
            self.summary.segments,
            self.summary.final_point_count,
            self.summary.anomalies,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Triangulation {
            triangulator,
            point_count,
            triangles_before_filter,
            triangle_count,
        } => {
            if triangles_before_filter == triangle_count {
                format!("{triangulator} {point_count} pts -> {triangle_count} triangles")
            } else {
                format!(
                    "{triangulator} {point_count} pts -> {triangles_before_filter} triangles, {triangle_count} kept",
                )
            }
        }
        StageMetrics::Slicing {
            pairs_tested,
            segment_count,
            touches,
            anomalies,
        } => format!(
            "{pairs_tested} pairs -> {segment_count} segments (touches={touches} anomalies={anomalies})",
        ),
        StageMetrics::Indexing {
            indexed_points,
            coincident_edges,
            chain_ends,
        } => format!("{indexed_points} endpoints, {coincident_edges} joins, {chain_ends} ends"),
        StageMetrics::Assembly {
            open_chains,
            closed_loops,
            unclosed_loops,
            discarded,
            visited,
            node_count,
            point_count,
        } => format!(
            "open={open_chains} closed={closed_loops} unclosed={unclosed_loops} discarded={discarded} visited={visited}/{node_count} pts={point_count}",
        ),
        StageMetrics::Smoothing {
            filter_size,
            smoothed_lines,
            line_count,
        } => {
            if *filter_size <= 1 {
                format!("disabled, {line_count} lines")
            } else {
                format!("F={filter_size} {smoothed_lines}/{line_count} lines")
            }
        }
    }
}

/// Run the full pipeline, timing every stage with `clock`.
///
/// Produces exactly the same [`ContourSet`] as
/// [`generate_contours_with_progress`](crate::generate_contours_with_progress).
///
/// # Errors
///
/// Same as [`generate_contours`](crate::generate_contours).
pub fn generate_contours_with_diagnostics<C: Clock>(
    points: &[Point3],
    config: &ContourConfig,
    clock: &C,
    progress: &mut dyn Progress,
) -> Result<(ContourSet, PipelineDiagnostics), ContourError> {
    let total_start = clock.now();

    let start = clock.now();
    let triangulated = Pipeline::new(points.to_vec(), config.clone()).triangulate()?;
    let triangulation = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: triangulated.stage_metrics(),
    };

    let start = clock.now();
    let sliced = triangulated.slice_with(progress);
    let slicing = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: sliced.stage_metrics(),
    };

    let start = clock.now();
    let indexed = sliced.index();
    let indexing = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: indexed.stage_metrics(),
    };

    let start = clock.now();
    let assembled = indexed.assemble_with(progress);
    let assembly = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: assembled.stage_metrics(),
    };

    let start = clock.now();
    let smoothed = assembled.smooth();
    let smoothing = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: smoothed.stage_metrics(),
    };

    let staged = smoothed.into_result();
    let total_duration = clock.elapsed(&total_start);

    let summary = PipelineSummary {
        input_points: points.len(),
        triangles: staged.triangles.len(),
        segments: staged.segments.segment_count(),
        anomalies: staged.anomalies,
        contour_count: staged.contours.len(),
        closed_count: staged.contours.closed().count(),
        final_point_count: staged.contours.total_points(),
    };

    let diagnostics = PipelineDiagnostics {
        triangulation,
        slicing,
        indexing,
        assembly,
        smoothing,
        total_duration,
        summary,
    };
    Ok((staged.contours, diagnostics))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::progress::NoProgress;

    /// Advances by one millisecond on every reading.
    struct FakeClock {
        ticks: Cell<u64>,
    }

    impl Clock for FakeClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn cone() -> Vec<Point3> {
        let mut points = vec![Point3::new(0.0, 0.0, 100.0)];
        for ring in 1..=4 {
            for step in 0..12 {
                let angle = std::f64::consts::TAU * f64::from(step) / 12.0;
                let r = f64::from(ring) * 10.0;
                points.push(Point3::new(
                    r * angle.cos(),
                    r * angle.sin(),
                    100.0 - f64::from(ring) * 20.0,
                ));
            }
        }
        points
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_match_plain_run() {
        let config = ContourConfig {
            interval: 15.0,
            ..ContourConfig::default()
        };
        let clock = FakeClock {
            ticks: Cell::new(0),
        };
        let (set, diag) =
            generate_contours_with_diagnostics(&cone(), &config, &clock, &mut NoProgress)
                .unwrap();
        let plain = crate::generate_contours(&cone(), &config).unwrap();

        assert_eq!(set, plain);
        assert_eq!(diag.summary.input_points, 49);
        assert_eq!(diag.summary.contour_count, set.len());
        assert_eq!(diag.summary.closed_count, set.closed().count());
        assert!(diag.total_duration >= diag.slicing.duration);
        assert!(matches!(
            diag.assembly.metrics,
            StageMetrics::Assembly { visited, node_count, .. } if visited == node_count
        ));
    }

    #[test]
    fn diagnostics_propagate_errors() {
        let clock = FakeClock {
            ticks: Cell::new(0),
        };
        let result = generate_contours_with_diagnostics(
            &[],
            &ContourConfig::default(),
            &clock,
            &mut NoProgress,
        );
        assert!(matches!(result, Err(ContourError::EmptyInput)));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let clock = FakeClock {
            ticks: Cell::new(0),
        };
        let (_, diag) = generate_contours_with_diagnostics(
            &cone(),
            &ContourConfig::default(),
            &clock,
            &mut NoProgress,
        )
        .unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        assert!(json["slicing"]["duration"].as_f64().unwrap() > 0.0);
        assert!(json["slicing"]["metrics"]["Slicing"].is_object());
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.slicing.duration, diag.slicing.duration);
    }

    #[test]
    fn report_produces_nonempty_string() {
        let stage = |ms, metrics| StageDiagnostics {
            duration: Duration::from_millis(ms),
            metrics,
        };
        let diag = PipelineDiagnostics {
            triangulation: stage(
                10,
                StageMetrics::Triangulation {
                    triangulator: "Delaunay".to_string(),
                    point_count: 100,
                    triangles_before_filter: 180,
                    triangle_count: 170,
                },
            ),
            slicing: stage(
                5,
                StageMetrics::Slicing {
                    pairs_tested: 400,
                    segment_count: 390,
                    touches: 8,
                    anomalies: 2,
                },
            ),
            indexing: stage(
                3,
                StageMetrics::Indexing {
                    indexed_points: 780,
                    coincident_edges: 380,
                    chain_ends: 20,
                },
            ),
            assembly: stage(
                4,
                StageMetrics::Assembly {
                    open_chains: 10,
                    closed_loops: 2,
                    unclosed_loops: 0,
                    discarded: 0,
                    visited: 780,
                    node_count: 780,
                    point_count: 402,
                },
            ),
            smoothing: stage(
                1,
                StageMetrics::Smoothing {
                    filter_size: 9,
                    smoothed_lines: 11,
                    line_count: 12,
                },
            ),
            total_duration: Duration::from_millis(23),
            summary: PipelineSummary {
                input_points: 100,
                triangles: 170,
                segments: 390,
                anomalies: 2,
                contour_count: 12,
                closed_count: 2,
                final_point_count: 402,
            },
        };

        let report = diag.report();
        assert!(report.contains("Contour Diagnostics Report"));
        assert!(report.contains("Delaunay 100 pts -> 180 triangles, 170 kept"));
        assert!(report.contains("anomalies=2"));
        assert!(report.contains("F=9 11/12 lines"));
        assert!(report.contains("Contours: 12 (2 closed)"));
    }
}
