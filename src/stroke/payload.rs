//! Stroke submission payload
//!
//! ```text
//! { "strokes": [ [ {"x": 1, "y": 2, "t": 0}, ... ], ... ] }
//! ```
//!
//! Points may also be written as `[x, y, t]` arrays, the form stored in
//! training data exports.

use serde::Deserialize;
use thiserror::Error;

use super::types::{InputError, Point, Stroke, StrokeSet};
use super::CHANNELS;
use crate::error::ParseError;

/// Errors from turning a payload into a [`StrokeSet`]
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    strokes: Option<Vec<Vec<RawPoint>>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Object { x: f64, y: f64, t: f64 },
    Array(Vec<f64>),
}

/// Parse and validate a JSON stroke payload.
///
/// All validation happens here, before any numeric work: malformed JSON or
/// point fields are a [`ParseError`], a missing field, empty stroke or wrong
/// channel count is an [`InputError`].
pub fn parse_payload(source: &str) -> Result<StrokeSet, PayloadError> {
    let raw: RawPayload =
        serde_json::from_str(source).map_err(|e| ParseError::from_json(&e, source))?;
    let raw_strokes = raw.strokes.ok_or(InputError::MissingStrokes)?;

    let mut strokes = Vec::with_capacity(raw_strokes.len());
    for (index, raw_points) in raw_strokes.into_iter().enumerate() {
        if raw_points.is_empty() {
            return Err(InputError::EmptyStroke { index }.into());
        }
        let mut points = Vec::with_capacity(raw_points.len());
        for (sample, raw_point) in raw_points.into_iter().enumerate() {
            let point = match raw_point {
                RawPoint::Object { x, y, t } => Point::new(x, y, t),
                RawPoint::Array(values) => match values.as_slice() {
                    &[x, y, t] => Point::new(x, y, t),
                    _ => {
                        return Err(InputError::ChannelMismatch {
                            stroke: index,
                            sample,
                            expected: CHANNELS,
                            found: values.len(),
                        }
                        .into())
                    }
                },
            };
            points.push(point);
        }
        strokes.push(Stroke::new(points).map_err(|_| InputError::EmptyStroke { index })?);
    }

    Ok(StrokeSet::new(strokes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_points() {
        let set = parse_payload(
            r#"{"strokes": [[{"x": 1, "y": 2, "t": 3}, {"x": 4, "y": 5, "t": 6}], [{"x": 0, "y": 0, "t": 9}]]}"#,
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.strokes()[0].points()[1], Point::new(4.0, 5.0, 6.0));
        assert_eq!(set.strokes()[1].len(), 1);
    }

    #[test]
    fn test_parse_array_points() {
        let set = parse_payload(r#"{"strokes": [[[1.5, 2, 0], [2.5, 3, 16]]]}"#).unwrap();
        assert_eq!(set.strokes()[0].points()[0], Point::new(1.5, 2.0, 0.0));
    }

    #[test]
    fn test_missing_strokes_field() {
        let err = parse_payload(r#"{"points": []}"#).unwrap_err();
        assert!(matches!(err, PayloadError::Input(InputError::MissingStrokes)));

        let err = parse_payload(r#"{"strokes": null}"#).unwrap_err();
        assert!(matches!(err, PayloadError::Input(InputError::MissingStrokes)));
    }

    #[test]
    fn test_empty_stroke_set() {
        let err = parse_payload(r#"{"strokes": []}"#).unwrap_err();
        assert!(matches!(err, PayloadError::Input(InputError::EmptyStrokeSet)));
    }

    #[test]
    fn test_empty_stroke_reports_index() {
        let err = parse_payload(r#"{"strokes": [[[0, 0, 0]], []]}"#).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::Input(InputError::EmptyStroke { index: 1 })
        ));
    }

    #[test]
    fn test_wrong_channel_count() {
        let err = parse_payload(r#"{"strokes": [[[0, 0, 0], [1, 2]]]}"#).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::Input(InputError::ChannelMismatch {
                stroke: 0,
                sample: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_point_field() {
        let err = parse_payload(r#"{"strokes": [[{"x": "left", "y": 0, "t": 0}]]}"#).unwrap_err();
        assert!(matches!(err, PayloadError::Parse(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_payload("{\"strokes\": [[").unwrap_err();
        assert!(matches!(err, PayloadError::Parse(_)));
    }
}
