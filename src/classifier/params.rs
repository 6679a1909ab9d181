//! Persisted model parameters and their shape validation

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::ModelConfig;
use crate::stroke::CHANNELS;

/// Errors raised while loading parameters; all of them are fatal at startup
#[derive(Debug, Error)]
pub enum ModelError {
    /// The parameter file could not be read
    #[error("failed to read model parameters from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blob is not a valid parameter encoding
    #[error("failed to decode model parameters: {0}")]
    Decode(#[from] bincode::Error),

    /// A dimension disagrees with the configured architecture
    #[error("parameter shape mismatch for {field}: expected {expected}, found {found}")]
    ShapeMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    /// A model must predict at least one class
    #[error("model declares no output classes")]
    NoClasses,

    /// The blob was trained with a different directionality
    #[error("parameter directionality mismatch: expected bidirectional={expected}, found {found}")]
    DirectionMismatch { expected: bool, found: bool },
}

impl ModelError {
    fn shape(field: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::ShapeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }
}

/// Weights of one recurrent direction of one layer
///
/// Gate rows are stacked in the order input, forget, cell, output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionParams {
    /// `4 * hidden x input`, row-major
    pub w_ih: Vec<f32>,
    /// `4 * hidden x hidden`, row-major
    pub w_hh: Vec<f32>,
    pub b_ih: Vec<f32>,
    pub b_hh: Vec<f32>,
}

/// One stacked layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    pub forward: DirectionParams,
    pub backward: Option<DirectionParams>,
}

/// Final linear projection to class logits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    /// `classes x input`, row-major
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

/// Complete parameter blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub bidirectional: bool,
    /// Symbol id for each class index
    pub labels: Vec<String>,
    pub layers: Vec<LayerParams>,
    pub head: LinearParams,
}

impl ModelParams {
    /// Load a parameter blob from disk
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Decode a parameter blob
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Encode into the persisted blob format
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deterministically initialized parameters for `config`.
    ///
    /// Values are drawn uniformly from `[-1/sqrt(hidden), 1/sqrt(hidden)]`
    /// with a fixed-seed generator, so the same seed always yields the same
    /// model.
    pub fn initialized(config: &ModelConfig, labels: Vec<String>, seed: u64) -> Self {
        let mut rng = SplitMix64(seed);
        let bound = 1.0 / (config.hidden_size.max(1) as f32).sqrt();
        let mut uniform = |n: usize| -> Vec<f32> {
            (0..n).map(|_| (rng.next_unit() * 2.0 - 1.0) * bound).collect()
        };

        let gates = 4 * config.hidden_size;
        let mut layers = Vec::with_capacity(config.num_layers);
        for layer in 0..config.num_layers {
            let input = config.layer_input_size(layer);
            let mut direction = || DirectionParams {
                w_ih: uniform(gates * input),
                w_hh: uniform(gates * config.hidden_size),
                b_ih: uniform(gates),
                b_hh: uniform(gates),
            };
            let forward = direction();
            let backward = config.bidirectional.then(&mut direction);
            layers.push(LayerParams { forward, backward });
        }

        let head = LinearParams {
            weight: uniform(labels.len() * config.head_input_size()),
            bias: uniform(labels.len()),
        };

        Self {
            input_size: config.input_size,
            hidden_size: config.hidden_size,
            num_layers: config.num_layers,
            bidirectional: config.bidirectional,
            labels,
            layers,
            head,
        }
    }

    /// Check every dimension against the configured architecture.
    ///
    /// The input width must also equal the channel count preprocessing
    /// produces, or no payload could ever be classified.
    pub fn validate(&self, config: &ModelConfig) -> Result<(), ModelError> {
        expect_eq("input_size", CHANNELS, config.input_size)?;
        expect_eq("input_size", config.input_size, self.input_size)?;
        expect_eq("hidden_size", config.hidden_size, self.hidden_size)?;
        expect_eq("num_layers", config.num_layers, self.num_layers)?;
        if config.bidirectional != self.bidirectional {
            return Err(ModelError::DirectionMismatch {
                expected: config.bidirectional,
                found: self.bidirectional,
            });
        }
        if config.num_classes == 0 {
            return Err(ModelError::NoClasses);
        }
        expect_eq("num_classes", config.num_classes, self.labels.len())?;
        expect_eq("layers", config.num_layers, self.layers.len())?;

        let hidden = config.hidden_size;
        for (index, layer) in self.layers.iter().enumerate() {
            let input = config.layer_input_size(index);
            validate_direction(&format!("layer{index}.forward"), &layer.forward, input, hidden)?;
            match (&layer.backward, config.bidirectional) {
                (Some(backward), true) => validate_direction(
                    &format!("layer{index}.backward"),
                    backward,
                    input,
                    hidden,
                )?,
                (None, false) => {}
                (found, expected) => {
                    return Err(ModelError::DirectionMismatch {
                        expected,
                        found: found.is_some(),
                    })
                }
            }
        }

        let classes = config.num_classes;
        expect_eq(
            "head.weight",
            classes * config.head_input_size(),
            self.head.weight.len(),
        )?;
        expect_eq("head.bias", classes, self.head.bias.len())?;
        Ok(())
    }
}

fn validate_direction(
    prefix: &str,
    params: &DirectionParams,
    input: usize,
    hidden: usize,
) -> Result<(), ModelError> {
    let gates = 4 * hidden;
    expect_eq(format!("{prefix}.w_ih"), gates * input, params.w_ih.len())?;
    expect_eq(format!("{prefix}.w_hh"), gates * hidden, params.w_hh.len())?;
    expect_eq(format!("{prefix}.b_ih"), gates, params.b_ih.len())?;
    expect_eq(format!("{prefix}.b_hh"), gates, params.b_hh.len())?;
    Ok(())
}

fn expect_eq(field: impl Into<String>, expected: usize, found: usize) -> Result<(), ModelError> {
    if expected == found {
        Ok(())
    } else {
        Err(ModelError::shape(field, expected, found))
    }
}

/// Small fixed-seed generator for reproducible initialization
struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`
    fn next_unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}
