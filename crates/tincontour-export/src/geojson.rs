//! GeoJSON export serializer.
//!
//! Converts a [`ContourSet`] into an RFC 7946 `FeatureCollection` with one
//! `LineString` feature per contour line. Feature properties carry the
//! attribute table of the contour layer: `FID`, `HEIGHT` and `CLOSED`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use serde::Serialize;

use tincontour_pipeline::{ContourLine, ContourSet};

use crate::ExportError;

/// Metadata to embed in the GeoJSON document.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonMetadata<'a> {
    /// Layer name, emitted as a top-level `"name"` member.
    ///
    /// Typically the input file stem.
    pub name: Option<&'a str>,

    /// Pretty-print the document instead of emitting a single line.
    pub pretty: bool,
}

#[derive(Debug, Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    type_: &'static str,
    id: usize,
    geometry: LineString,
    properties: Properties,
}

#[derive(Debug, Serialize)]
struct LineString {
    #[serde(rename = "type")]
    type_: &'static str,
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "UPPERCASE")]
struct Properties {
    fid: usize,
    height: f64,
    closed: bool,
}

impl From<&ContourLine> for Feature {
    fn from(line: &ContourLine) -> Self {
        Self {
            type_: "Feature",
            id: line.fid,
            geometry: LineString {
                type_: "LineString",
                coordinates: line.polyline.points().iter().map(|p| [p.x, p.y]).collect(),
            },
            properties: Properties {
                fid: line.fid,
                height: line.elevation,
                closed: line.closed,
            },
        }
    }
}

/// Serialize a contour set as a GeoJSON `FeatureCollection`.
///
/// Features appear in output order, so feature `i` has `FID == i + 1`.
/// Closed loops keep their duplicated closing vertex, as RFC 7946 expects
/// of a closed `LineString`.
///
/// # Examples
///
/// ```
/// use tincontour_pipeline::{ContourLine, ContourSet, Point, Polyline};
/// use tincontour_export::{GeoJsonMetadata, to_geojson};
///
/// let set = ContourSet {
///     lines: vec![ContourLine {
///         fid: 1,
///         elevation: 120.0,
///         band: 12,
///         closed: false,
///         polyline: Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.5, 2.0)]),
///     }],
/// };
/// let json = to_geojson(&set, &GeoJsonMetadata::default()).unwrap();
/// assert!(json.contains(r#""type":"FeatureCollection""#));
/// assert!(json.contains(r#""HEIGHT":120.0"#));
/// ```
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_geojson(set: &ContourSet, metadata: &GeoJsonMetadata<'_>) -> Result<String, ExportError> {
    let collection = FeatureCollection {
        type_: "FeatureCollection",
        name: metadata.name,
        features: set.lines.iter().map(Feature::from).collect(),
    };
    let json = if metadata.pretty {
        serde_json::to_string_pretty(&collection)?
    } else {
        serde_json::to_string(&collection)?
    };
    Ok(json)
}
