//! Stateless inference over padded stroke batches

use std::path::Path;

use super::config::{ModelConfig, ReadoutPolicy};
use super::lstm::{affine_accumulate, encode};
use super::params::{ModelError, ModelParams};
use crate::registry::SymbolId;
use crate::stroke::{Batch, InputError};

/// Maps a batch of normalized strokes to symbol ids with fixed parameters
#[derive(Debug, Clone)]
pub struct SequenceClassifier {
    config: ModelConfig,
    params: ModelParams,
}

impl SequenceClassifier {
    /// Load and shape-check a parameter blob
    pub fn load(path: &Path, config: ModelConfig) -> Result<Self, ModelError> {
        let params = ModelParams::from_file(path)?;
        let classifier = Self::from_params(params, config)?;
        log::info!(
            "event=model_load status=ok path={} classes={} hidden={} layers={} bidirectional={}",
            path.display(),
            classifier.config.num_classes,
            classifier.config.hidden_size,
            classifier.config.num_layers,
            classifier.config.bidirectional
        );
        Ok(classifier)
    }

    /// Wrap already decoded parameters, checking their shape
    pub fn from_params(params: ModelParams, config: ModelConfig) -> Result<Self, ModelError> {
        params.validate(&config)?;
        Ok(Self { config, params })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Symbol id for every class index
    pub fn labels(&self) -> &[String] {
        &self.params.labels
    }

    /// Raw class scores, one vector per sequence in batch order
    pub fn logits(&self, batch: &Batch) -> Result<Vec<Vec<f32>>, InputError> {
        if batch.channels() != self.config.input_size {
            return Err(InputError::BatchChannels {
                expected: self.config.input_size,
                found: batch.channels(),
            });
        }

        let logits = (0..batch.count())
            .map(|index| {
                let len = match self.config.readout {
                    ReadoutPolicy::LastValidStep => batch.lengths()[index],
                    ReadoutPolicy::PaddedFinalStep => batch.max_len(),
                };
                let steps = batch.steps(index, len).map(<[f32]>::to_vec).collect();
                let encoded = encode(
                    &self.params.layers,
                    self.config.input_size,
                    self.config.hidden_size,
                    steps,
                    self.config.readout,
                );
                self.project(&encoded.representation)
            })
            .collect();
        Ok(logits)
    }

    /// Predicted class index for every sequence
    pub fn classify_indices(&self, batch: &Batch) -> Result<Vec<usize>, InputError> {
        Ok(self
            .logits(batch)?
            .iter()
            .map(|scores| argmax(scores).unwrap_or(0))
            .collect())
    }

    /// Predicted symbol id for every sequence, in batch order
    pub fn classify(&self, batch: &Batch) -> Result<Vec<SymbolId>, InputError> {
        let ids: Vec<SymbolId> = self
            .classify_indices(batch)?
            .into_iter()
            .map(|index| SymbolId::new(self.params.labels[index].clone()))
            .collect();
        log::debug!(
            "event=classify sequences={} predicted={:?}",
            batch.count(),
            ids.iter().map(SymbolId::as_str).collect::<Vec<_>>()
        );
        Ok(ids)
    }

    fn project(&self, representation: &[f32]) -> Vec<f32> {
        let mut out = self.params.head.bias.clone();
        affine_accumulate(&mut out, &self.params.head.weight, representation);
        out
    }
}

/// Index of the largest score; ties resolve to the lowest index.
///
/// NaN never wins. Returns `None` only for an empty slice.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    if scores.is_empty() {
        return None;
    }
    let mut best = 0;
    let mut top = f32::NEG_INFINITY;
    for (index, &score) in scores.iter().enumerate() {
        if score > top {
            best = index;
            top = score;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{batch, normalize, Stroke};

    fn config() -> ModelConfig {
        ModelConfig::new()
            .with_hidden_size(6)
            .with_num_layers(2)
            .with_num_classes(4)
    }

    fn labels() -> Vec<String> {
        ["plus", "minus", "x", "equals"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn classifier(config: ModelConfig) -> SequenceClassifier {
        let params = ModelParams::initialized(&config, labels(), 3);
        SequenceClassifier::from_params(params, config).unwrap()
    }

    fn sample_batch() -> Batch {
        let strokes = [
            Stroke::from_xyt(&[(0.0, 0.0, 0.0), (3.0, 1.0, 8.0), (6.0, 1.5, 16.0)]).unwrap(),
            Stroke::from_xyt(&[(2.0, 9.0, 0.0), (2.0, 2.0, 10.0)]).unwrap(),
        ];
        batch(&strokes.iter().map(normalize).collect::<Vec<_>>())
    }

    #[test]
    fn test_argmax_picks_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&[0.0, 0.0, 0.0]), Some(0));
        assert_eq!(argmax(&[0.1, 0.5, 0.5, 0.2]), Some(1));
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.3, 0.1]), Some(1));
        assert_eq!(argmax(&[f32::NAN]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_classify_one_id_per_stroke() {
        let ids = classifier(config()).classify(&sample_batch()).unwrap();
        assert_eq!(ids.len(), 2);
        for id in &ids {
            assert!(labels().iter().any(|l| l == id.as_str()));
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let model = classifier(config());
        let batch = sample_batch();
        assert_eq!(model.logits(&batch).unwrap(), model.logits(&batch).unwrap());
        assert_eq!(model.classify(&batch).unwrap(), model.classify(&batch).unwrap());
    }

    #[test]
    fn test_empty_batch_classifies_to_nothing() {
        let ids = classifier(config()).classify(&batch(&[])).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_channel_mismatch_rejected() {
        let two_channel = Batch::from_samples(&[vec![vec![0.0, 0.0]]], 2).unwrap();
        let err = classifier(config()).classify(&two_channel).unwrap_err();
        assert_eq!(err, InputError::BatchChannels { expected: 3, found: 2 });
    }

    #[test]
    fn test_last_valid_step_ignores_padding() {
        let model = classifier(config());
        let short = Stroke::from_xyt(&[(0.0, 0.0, 0.0), (1.0, 2.0, 5.0)]).unwrap();
        let long = Stroke::from_xyt(&[
            (0.0, 0.0, 0.0),
            (1.0, 1.0, 1.0),
            (2.0, 0.0, 2.0),
            (3.0, 1.0, 3.0),
            (4.0, 0.0, 4.0),
        ])
        .unwrap();

        let alone = model.logits(&batch(&[normalize(&short)])).unwrap();
        let padded = model
            .logits(&batch(&[normalize(&short), normalize(&long)]))
            .unwrap();
        assert_eq!(alone[0], padded[0]);
    }

    #[test]
    fn test_padded_final_step_sees_padding() {
        let model = classifier(config().with_readout(ReadoutPolicy::PaddedFinalStep));
        let short = Stroke::from_xyt(&[(0.0, 0.0, 0.0), (1.0, 2.0, 5.0)]).unwrap();
        let long = Stroke::from_xyt(&[
            (0.0, 0.0, 0.0),
            (1.0, 1.0, 1.0),
            (2.0, 0.0, 2.0),
            (3.0, 1.0, 3.0),
        ])
        .unwrap();

        let alone = model.logits(&batch(&[normalize(&short)])).unwrap();
        let padded = model
            .logits(&batch(&[normalize(&short), normalize(&long)]))
            .unwrap();
        assert_ne!(alone[0], padded[0]);
    }
}
