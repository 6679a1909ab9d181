//! Core stroke types

use thiserror::Error;

/// Errors for stroke input that is structurally unusable
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    /// The payload has no `strokes` field
    #[error("No stroke data provided")]
    MissingStrokes,

    /// The payload contains an empty list of strokes
    #[error("stroke set contains no strokes")]
    EmptyStrokeSet,

    /// A stroke without any points
    #[error("stroke {index} has no points")]
    EmptyStroke { index: usize },

    /// A sample with the wrong number of channels
    #[error("stroke {stroke}, sample {sample}: expected {expected} channels, found {found}")]
    ChannelMismatch {
        stroke: usize,
        sample: usize,
        expected: usize,
        found: usize,
    },

    /// A batch whose sample width does not match the model input
    #[error("batch samples have {found} channels, model expects {expected}")]
    BatchChannels { expected: usize, found: usize },
}

/// A single pen sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }
}

/// One continuous pen-down segment; never empty
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    /// Build a stroke, rejecting an empty point list
    pub fn new(points: Vec<Point>) -> Result<Self, InputError> {
        if points.is_empty() {
            return Err(InputError::EmptyStroke { index: 0 });
        }
        Ok(Self { points })
    }

    /// Convenience constructor from `(x, y, t)` tuples
    pub fn from_xyt(samples: &[(f64, f64, f64)]) -> Result<Self, InputError> {
        Self::new(
            samples
                .iter()
                .map(|&(x, y, t)| Point::new(x, y, t))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The first sample, which normalization translates to the origin
    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Ordered strokes submitted as one classification request
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSet {
    strokes: Vec<Stroke>,
}

impl StrokeSet {
    /// Build a stroke set, rejecting an empty list
    pub fn new(strokes: Vec<Stroke>) -> Result<Self, InputError> {
        if strokes.is_empty() {
            return Err(InputError::EmptyStrokeSet);
        }
        Ok(Self { strokes })
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}
