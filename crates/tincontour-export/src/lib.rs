//! tincontour-export: Pure format serializers (sans-IO)
//!
//! Converts a [`ContourSet`](tincontour_pipeline::ContourSet) into output
//! formats. Currently supports GeoJSON and SVG.

pub mod geojson;
pub mod svg;

pub use geojson::{GeoJsonMetadata, to_geojson};
pub use svg::{SvgMetadata, SvgStyle, build_path_data, to_svg};

/// Errors from export serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
