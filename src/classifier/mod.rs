//! Recurrent sequence classifier
//!
//! A stacked, optionally bidirectional LSTM encodes each normalized stroke;
//! the final-step representation is projected to class logits and the
//! highest-scoring class (lowest index on ties) names the predicted symbol.
//! Inference is a pure function of the loaded parameters and the batch.

pub mod config;
mod lstm;
pub mod model;
pub mod params;

pub use config::{ModelConfig, ReadoutPolicy};
pub use model::{argmax, SequenceClassifier};
pub use params::{DirectionParams, LayerParams, LinearParams, ModelError, ModelParams};
