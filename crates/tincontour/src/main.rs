//! tincontour: contour lines from scattered elevation points.
//!
//! Reads a plain-text XYZ point file, runs the contouring pipeline with
//! configurable parameters, writes the contours as GeoJSON or SVG, and
//! prints per-stage diagnostics to stderr.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin tincontour -- [OPTIONS] <INPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod input;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use tincontour_export::{ExportError, GeoJsonMetadata, SvgMetadata, SvgStyle};
use tincontour_pipeline::diagnostics::{Clock, generate_contours_with_diagnostics};
use tincontour_pipeline::{ContourConfig, ContourError, ContourSet, Phase};
use tracing_subscriber::EnvFilter;

use crate::input::InputError;

/// Contour lines from scattered elevation points.
///
/// Triangulates the input samples, slices the surface at every contour
/// level and writes the resulting polylines.
#[derive(Parser)]
#[command(name = "tincontour", version)]
struct Cli {
    /// Path to the XYZ point file.
    input: PathBuf,

    /// Vertical spacing between contour lines.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_INTERVAL)]
    interval: f64,

    /// Base contour value; levels are base + k * interval.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_BASE, allow_negative_numbers = true)]
    base: f64,

    /// Distance under which two crossing points are the same vertex.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_PRECISION)]
    precision: f64,

    /// Smoothing filter size (0 disables, even sizes act like the next odd).
    #[arg(long, default_value_t = ContourConfig::DEFAULT_SMOOTHING_FILTER_SIZE)]
    smooth: usize,

    /// Drop triangles with an edge longer than this before slicing.
    #[arg(long)]
    max_triangle_edge_length: Option<f64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Geojson)]
    format: Format,

    /// Write output to file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// SVG only: every Nth band is drawn as an index contour (0 disables).
    #[arg(long, default_value_t = SvgStyle::DEFAULT_MAJOR_EVERY)]
    major_every: u32,

    /// Full contour config as a JSON string.
    ///
    /// When provided, all other contour parameter flags are ignored.
    /// Missing fields take their default values.
    #[arg(long)]
    config_json: Option<String>,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Output format selection.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// RFC 7946 `FeatureCollection` of `LineString` features.
    Geojson,
    /// SVG document, north up.
    Svg,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("error parsing --config-json: {0}")]
    ConfigJson(#[source] serde_json::Error),

    #[error("contouring failed: {0}")]
    Contour(#[from] ContourError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("error serializing diagnostics: {0}")]
    Diagnostics(#[source] serde_json::Error),

    #[error("error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build a [`ContourConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<ContourConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(CliError::ConfigJson);
    }

    Ok(ContourConfig {
        interval: cli.interval,
        base: cli.base,
        precision: cli.precision,
        smoothing_filter_size: cli.smooth,
        max_triangle_edge_length: cli.max_triangle_edge_length,
        ..ContourConfig::default()
    })
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Log every tenth percent of each phase.
fn log_progress(phase: Phase, percent: u8) {
    if percent % 10 == 0 {
        tracing::info!(phase = phase.name(), percent, "{}", phase.label());
    }
}

fn render(set: &ContourSet, config: &ContourConfig, cli: &Cli) -> Result<String, CliError> {
    let title = cli
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("contours");

    match cli.format {
        Format::Geojson => Ok(tincontour_export::to_geojson(
            set,
            &GeoJsonMetadata {
                name: Some(title),
                pretty: false,
            },
        )?),
        Format::Svg => {
            let desc = format!(
                "interval={}, base={}, smoothing={}",
                config.interval, config.base, config.smoothing_filter_size,
            );
            let config_json = serde_json::to_string(config).ok();
            let metadata = SvgMetadata {
                title: Some(title),
                description: Some(&desc),
                config_json: config_json.as_deref(),
            };
            let style = SvgStyle {
                major_every: cli.major_every,
                ..SvgStyle::default()
            };
            Ok(tincontour_export::to_svg(set, &style, &metadata))
        }
    }
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<(), CliError> {
    match path {
        Some(path) => std::fs::write(path, contents).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(contents.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .map_err(|source| CliError::Write {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;
    let points = input::read_points(&cli.input)?;

    tracing::info!(
        input = %cli.input.display(),
        points = points.len(),
        interval = config.interval,
        base = config.base,
        smoothing = config.smoothing_filter_size,
        "contouring"
    );

    let (set, diagnostics) =
        generate_contours_with_diagnostics(&points, &config, &StdClock, &mut log_progress)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&diagnostics).map_err(CliError::Diagnostics)?;
        eprintln!("{json}");
    } else {
        eprintln!("{}", diagnostics.report());
    }

    let rendered = render(&set, &config, cli)?;
    write_output(cli.output.as_deref(), &rendered)?;

    if let Some(ref path) = cli.output {
        eprintln!(
            "{} contour lines written to {} ({} bytes)",
            set.len(),
            path.display(),
            rendered.len(),
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
