//! Properties of stroke normalization and batching

use inkmath::stroke::{batch, normalize, parse_payload, preprocess, Stroke, CHANNELS};

fn strokes() -> Vec<Stroke> {
    vec![
        Stroke::from_xyt(&[(12.0, -3.0, 100.0), (20.0, 5.0, 116.0), (4.0, 1.0, 133.0)]).unwrap(),
        Stroke::from_xyt(&[(7.0, 7.0, 0.0)]).unwrap(),
        Stroke::from_xyt(&[(0.0, 2.0, 5.0), (0.0, 9.0, 6.0), (0.0, -5.0, 7.0), (0.0, 0.0, 8.0)])
            .unwrap(),
    ]
}

#[test]
fn test_first_sample_is_origin() {
    for stroke in strokes() {
        assert_eq!(normalize(&stroke).samples()[0], [0.0, 0.0, 0.0]);
    }
}

#[test]
fn test_spatial_channels_unit_or_degenerate() {
    for stroke in strokes() {
        let normalized = normalize(&stroke);
        for channel in 0..2 {
            let values: Vec<f64> = normalized.samples().iter().map(|s| s[channel]).collect();
            let max = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            assert!(
                max == 1.0 || values.iter().all(|v| *v == 0.0),
                "channel {} has max {}",
                channel,
                max
            );
        }
    }
}

#[test]
fn test_batch_pads_to_longest_in_order() {
    let normalized: Vec<_> = strokes().iter().map(normalize).collect();
    let batch = batch(&normalized);

    assert_eq!(batch.count(), 3);
    assert_eq!(batch.max_len(), 4);
    assert_eq!(batch.channels(), CHANNELS);
    assert_eq!(batch.lengths(), &[3, 1, 4]);

    for (index, stroke) in normalized.iter().enumerate() {
        for step in 0..batch.max_len() {
            let sample = batch.sample(index, step);
            match stroke.samples().get(step) {
                Some(expected) => {
                    let expected: Vec<f32> = expected.iter().map(|v| *v as f32).collect();
                    assert_eq!(sample, expected.as_slice());
                }
                None => assert_eq!(sample, &[0.0, 0.0, 0.0]),
            }
        }
    }
}

#[test]
fn test_payload_to_batch() {
    let set = parse_payload(
        r#"{"strokes": [[{"x": 1, "y": 1, "t": 0}, {"x": 3, "y": 2, "t": 1}], [[5, 5, 0]]]}"#,
    )
    .unwrap();
    let batch = preprocess(&set);

    assert_eq!(batch.lengths(), &[2, 1]);
    assert_eq!(batch.sample(0, 1), &[1.0, 1.0, 1.0]);
    assert_eq!(batch.sample(1, 0), &[0.0, 0.0, 0.0]);
}
