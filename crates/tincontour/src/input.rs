//! Plain-text XYZ point reader.
//!
//! One point per line, three numeric fields `x y z` separated by commas,
//! semicolons or whitespace. Blank lines and `#` comments are skipped. A
//! first data line that does not parse as numbers is taken as a column
//! header.

use std::path::{Path, PathBuf};

use tincontour_pipeline::Point3;

/// Errors reading an XYZ point file.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data line does not have exactly three fields.
    #[error("line {line}: expected 3 fields (x, y, z), found {found}")]
    FieldCount { line: usize, found: usize },

    /// A field is not a number.
    #[error("line {line}: {value:?} is not a number")]
    InvalidNumber { line: usize, value: String },
}

fn fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect()
}

/// Parse XYZ text into points, in file order.
///
/// # Errors
///
/// Returns [`InputError::FieldCount`] or [`InputError::InvalidNumber`]
/// with the 1-based line number of the first bad line.
pub fn parse_points(text: &str) -> Result<Vec<Point3>, InputError> {
    let mut points = Vec::new();
    let mut seen_data = false;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let fields = fields(content);
        let first_data = !seen_data;
        seen_data = true;

        if fields.len() != 3 {
            if first_data && fields.iter().any(|f| f.parse::<f64>().is_err()) {
                tracing::debug!(line, header = content, "skipping header line");
                continue;
            }
            return Err(InputError::FieldCount {
                line,
                found: fields.len(),
            });
        }

        let mut xyz = [0.0; 3];
        let mut header = false;
        for (slot, field) in xyz.iter_mut().zip(&fields) {
            match field.parse::<f64>() {
                Ok(value) => *slot = value,
                Err(_) if first_data => {
                    header = true;
                    break;
                }
                Err(_) => {
                    return Err(InputError::InvalidNumber {
                        line,
                        value: (*field).to_string(),
                    });
                }
            }
        }
        if header {
            tracing::debug!(line, header = content, "skipping header line");
            continue;
        }
        points.push(Point3::new(xyz[0], xyz[1], xyz[2]));
    }

    Ok(points)
}

/// Read and parse an XYZ file.
///
/// # Errors
///
/// Returns [`InputError::Io`] if the file cannot be read, otherwise the
/// errors of [`parse_points`].
pub fn read_points(path: &Path) -> Result<Vec<Point3>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_points(&text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_separated() {
        let points = parse_points("0 0 1\n10\t0  2\n").unwrap();
        assert_eq!(
            points,
            vec![Point3::new(0.0, 0.0, 1.0), Point3::new(10.0, 0.0, 2.0)]
        );
    }

    #[test]
    fn comma_and_semicolon_separated() {
        let points = parse_points("1,2,3\n4;5;6\n7, 8; 9\n").unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2], Point3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let text = "# survey 2024\n\n1 2 3   # first\n   \n4 5 6\n";
        let points = parse_points(text).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn header_line_skipped() {
        let points = parse_points("X,Y,Z\n1,2,3\n").unwrap();
        assert_eq!(points, vec![Point3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn header_with_extra_columns_skipped() {
        let points = parse_points("easting northing elevation code\n1 2 3\n").unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn only_first_line_may_be_header() {
        let err = parse_points("1 2 3\nx y z\n").unwrap_err();
        assert!(matches!(err, InputError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn wrong_field_count_reports_line() {
        let err = parse_points("# header comment\n1 2 3\n4 5\n").unwrap_err();
        assert!(matches!(err, InputError::FieldCount { line: 3, found: 2 }));
        assert_eq!(
            err.to_string(),
            "line 3: expected 3 fields (x, y, z), found 2"
        );
    }

    #[test]
    fn invalid_number_reports_value() {
        let err = parse_points("1 2 3\n4 5 six\n").unwrap_err();
        match err {
            InputError::InvalidNumber { line, value } => {
                assert_eq!(line, 2);
                assert_eq!(value, "six");
            }
            other => unreachable!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn scientific_notation_and_negatives() {
        let points = parse_points("-1.5e3 2E-1 -0.25\n").unwrap();
        assert_eq!(points, vec![Point3::new(-1500.0, 0.2, -0.25)]);
    }

    #[test]
    fn empty_text_yields_no_points() {
        assert!(parse_points("").unwrap().is_empty());
        assert!(parse_points("# nothing here\n\n").unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_points(Path::new("/nonexistent/points.xyz")).unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/points.xyz"));
    }
}
