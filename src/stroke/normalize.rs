//! Per-stroke translation and rescaling

use super::types::{Point, Stroke};

/// A stroke translated to its first point, with x and y scaled into [-1, 1]
///
/// The t channel is translated but never rescaled, so it keeps the relative
/// timing of the original samples.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedStroke {
    samples: Vec<[f64; 3]>,
}

impl NormalizedStroke {
    pub fn samples(&self) -> &[[f64; 3]] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Translate a stroke so its first point is the origin, then rescale x and y
/// independently by their own maximum absolute value.
///
/// A degenerate channel (every value equal) stays at zero; its divisor is 1.0.
pub fn normalize(stroke: &Stroke) -> NormalizedStroke {
    let origin = stroke.first();
    let translated: Vec<Point> = stroke
        .points()
        .iter()
        .map(|p| Point::new(p.x - origin.x, p.y - origin.y, p.t - origin.t))
        .collect();

    let scale_x = channel_scale(translated.iter().map(|p| p.x));
    let scale_y = channel_scale(translated.iter().map(|p| p.y));

    NormalizedStroke {
        samples: translated
            .iter()
            .map(|p| [p.x / scale_x, p.y / scale_y, p.t])
            .collect(),
    }
}

fn channel_scale(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.map(f64::abs).fold(0.0, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}
