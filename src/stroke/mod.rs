//! Stroke geometry: pen samples, submission payloads and preprocessing
//!
//! Raw strokes arrive as a JSON payload, are validated into [`StrokeSet`]s,
//! normalized stroke by stroke and padded into a rectangular [`Batch`] that
//! the classifier consumes.

pub mod batch;
pub mod normalize;
pub mod payload;
pub mod types;

pub use batch::{batch, Batch};
pub use normalize::{normalize, NormalizedStroke};
pub use payload::parse_payload;
pub use types::{InputError, Point, Stroke, StrokeSet};

/// Number of channels per sample: x, y and t
pub const CHANNELS: usize = 3;

/// Normalize every stroke of a set and batch the results in input order
pub fn preprocess(strokes: &StrokeSet) -> Batch {
    let normalized: Vec<NormalizedStroke> = strokes.iter().map(normalize).collect();
    let batch = batch(&normalized);
    log::debug!(
        "event=preprocess strokes={} max_len={}",
        batch.count(),
        batch.max_len()
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_keeps_order_and_pads() {
        let set = StrokeSet::new(vec![
            Stroke::from_xyt(&[(0.0, 0.0, 0.0), (2.0, 0.0, 1.0)]).unwrap(),
            Stroke::from_xyt(&[(5.0, 5.0, 0.0), (5.0, 6.0, 1.0), (5.0, 9.0, 2.0)]).unwrap(),
        ])
        .unwrap();

        let batch = preprocess(&set);
        assert_eq!(batch.count(), 2);
        assert_eq!(batch.max_len(), 3);
        assert_eq!(batch.lengths(), &[2, 3]);
        assert_eq!(batch.sample(0, 1), &[1.0, 0.0, 1.0]);
        assert_eq!(batch.sample(0, 2), &[0.0, 0.0, 0.0]);
        assert_eq!(batch.sample(1, 2), &[0.0, 1.0, 2.0]);
    }
}
