//! SVG export serializer.
//!
//! Converts a [`ContourSet`] into an SVG string with one `<path>` element
//! per contour line, using the [`svg`] crate for document construction,
//! XML escaping and path data formatting.
//!
//! The `viewBox` is the bounding box of all contour vertices (computed
//! with [`geo`]) grown by [`SvgStyle::padding`]. Map coordinates are
//! shifted so the box starts at the origin and the y axis is flipped, so
//! north points up. Shifting keeps large projected coordinates (UTM and
//! the like) within `f32` precision of the path data.
//!
//! Every [`SvgStyle::major_every`]-th band is an index contour drawn with
//! the major stroke; all other lines use the minor stroke.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use geo::{BoundingRect, Coord, LineString, MultiLineString, Rect};
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use tincontour_pipeline::{ContourLine, ContourSet, Point, Polyline};

/// Stroke styling for minor and major (index) contours.
///
/// Strokes use `vector-effect="non-scaling-stroke"`, so widths are in
/// screen units regardless of the map extent.
#[derive(Debug, Clone)]
pub struct SvgStyle<'a> {
    /// Stroke colour of ordinary contours.
    pub minor_color: &'a str,
    /// Stroke width of ordinary contours.
    pub minor_stroke_width: f64,
    /// Stroke colour of index contours.
    pub major_color: &'a str,
    /// Stroke width of index contours.
    pub major_stroke_width: f64,
    /// Bands divisible by this are index contours. `0` disables them.
    pub major_every: u32,
    /// Margin around the contour bounding box, in map units.
    pub padding: f64,
}

impl SvgStyle<'_> {
    /// Default minor stroke colour (dark blue).
    pub const DEFAULT_MINOR_COLOR: &'static str = "#0000cc";
    /// Default major stroke colour (blue).
    pub const DEFAULT_MAJOR_COLOR: &'static str = "#0000ff";
    /// Default minor stroke width.
    pub const DEFAULT_MINOR_STROKE_WIDTH: f64 = 2.0;
    /// Default major stroke width.
    pub const DEFAULT_MAJOR_STROKE_WIDTH: f64 = 5.0;
    /// Default index contour spacing, in bands.
    pub const DEFAULT_MAJOR_EVERY: u32 = 5;

    /// Whether contours of `band` are drawn as index contours.
    #[must_use]
    pub fn is_major(&self, band: i64) -> bool {
        self.major_every > 0 && band.rem_euclid(i64::from(self.major_every)) == 0
    }
}

impl Default for SvgStyle<'_> {
    fn default() -> Self {
        Self {
            minor_color: Self::DEFAULT_MINOR_COLOR,
            minor_stroke_width: Self::DEFAULT_MINOR_STROKE_WIDTH,
            major_color: Self::DEFAULT_MAJOR_COLOR,
            major_stroke_width: Self::DEFAULT_MAJOR_STROKE_WIDTH,
            major_every: Self::DEFAULT_MAJOR_EVERY,
            padding: 0.0,
        }
    }
}

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the input file stem.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized [`ContourConfig`](tincontour_pipeline::ContourConfig),
    /// emitted as the text of a `<metadata>` element so exported files
    /// carry the settings that produced them.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a polyline.
///
/// Uses `M` for the first point and `L` for subsequent points, in the
/// polyline's own coordinates. Returns an empty string for polylines with
/// fewer than 2 points.
///
/// # Examples
///
/// ```
/// use tincontour_pipeline::{Point, Polyline};
/// use tincontour_export::build_path_data;
///
/// let polyline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// let d = build_path_data(&polyline);
/// assert_eq!(d, "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline) -> String {
    path_data(polyline.points(), false, |p| (p.x, p.y))
}

/// Path data through `points` mapped by `tx`. Closed rings drop their
/// duplicated last vertex and end with a close command.
fn path_data(points: &[Point], closed: bool, tx: impl Fn(&Point) -> (f64, f64)) -> String {
    if points.len() < 2 {
        return String::new();
    }

    let body = if closed && points.len() > 3 {
        &points[..points.len() - 1]
    } else {
        points
    };
    let mut data = Data::new().move_to(tx(&body[0]));
    for p in &body[1..] {
        data = data.line_to(tx(p));
    }
    if closed && body.len() < points.len() {
        data = data.close();
    }
    String::from(Value::from(data))
}

/// Bounding box of every contour vertex.
fn extent(set: &ContourSet) -> Option<Rect<f64>> {
    let lines: Vec<LineString<f64>> = set
        .lines
        .iter()
        .filter(|line| !line.polyline.is_empty())
        .map(|line| {
            line.polyline
                .points()
                .iter()
                .map(|p| Coord { x: p.x, y: p.y })
                .collect::<Vec<_>>()
                .into()
        })
        .collect();
    MultiLineString::new(lines).bounding_rect()
}

fn contour_path(line: &ContourLine, d: String, style: &SvgStyle<'_>) -> Path {
    let (class, color, width) = if style.is_major(line.band) {
        ("major", style.major_color, style.major_stroke_width)
    } else {
        ("minor", style.minor_color, style.minor_stroke_width)
    };
    Path::new()
        .set("id", format!("fid-{}", line.fid))
        .set("class", class)
        .set("data-height", line.elevation)
        .set("d", d)
        .set("fill", "none")
        .set("stroke", color)
        .set("stroke-width", width)
        .set("vector-effect", "non-scaling-stroke")
}

/// Serialize a contour set into an SVG document string.
///
/// Lines with fewer than 2 vertices are skipped. An empty set yields a
/// valid document with a zero-area `viewBox` (plus padding).
///
/// # Examples
///
/// ```
/// use tincontour_pipeline::{ContourLine, ContourSet, Point, Polyline};
/// use tincontour_export::{SvgMetadata, SvgStyle, to_svg};
///
/// let set = ContourSet {
///     lines: vec![ContourLine {
///         fid: 1,
///         elevation: 10.0,
///         band: 1,
///         closed: false,
///         polyline: Polyline::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 6.0)]),
///     }],
/// };
/// let metadata = SvgMetadata {
///     title: Some("site-survey"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&set, &SvgStyle::default(), &metadata);
/// assert!(svg.contains("<title>site-survey</title>"));
/// assert!(svg.contains(r#"viewBox="0 0 10 6""#));
/// assert!(svg.contains("M0,6 L10,0"));
/// ```
#[must_use]
pub fn to_svg(set: &ContourSet, style: &SvgStyle<'_>, metadata: &SvgMetadata<'_>) -> String {
    let pad = style.padding;
    let (min_x, max_y, width, height) = extent(set).map_or((0.0, 0.0, 0.0, 0.0), |rect| {
        (rect.min().x, rect.max().y, rect.width(), rect.height())
    });
    let view_width = 2.0f64.mul_add(pad, width);
    let view_height = 2.0f64.mul_add(pad, height);

    let mut doc = Document::new()
        .set("width", view_width)
        .set("height", view_height)
        .set("viewBox", format!("0 0 {view_width} {view_height}"));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(Text::new(config_json));
        doc = doc.add(metadata_el);
    }

    // Map x grows east, SVG y grows down: flip around the top of the box.
    let tx = |p: &Point| (p.x - min_x + pad, max_y - p.y + pad);

    for line in &set.lines {
        let d = path_data(line.polyline.points(), line.closed, tx);
        if d.is_empty() {
            continue;
        }
        doc = doc.add(contour_path(line, d, style));
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
