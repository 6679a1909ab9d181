//! Configuration for the sequence classifier

use serde::Deserialize;

/// Which time step of each encoded sequence feeds the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadoutPolicy {
    /// Encode only the true samples of each stroke, so padding has no effect
    #[default]
    LastValidStep,
    /// Encode the full padded sequence and read the padded final step
    PaddedFinalStep,
}

/// Architecture of the recurrent classifier
///
/// Persisted parameters must match this shape exactly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Channels per input sample
    pub input_size: usize,

    /// Width of the hidden and cell state
    pub hidden_size: usize,

    /// Number of stacked recurrent layers
    pub num_layers: usize,

    /// Run a second, right-to-left pass per layer
    pub bidirectional: bool,

    /// Size of the logit vector
    pub num_classes: usize,

    /// Training-time dropout probability; identity at inference
    pub dropout: f32,

    /// Time step selection for the final representation
    pub readout: ReadoutPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: 3,
            hidden_size: 128,
            num_layers: 2,
            bidirectional: true,
            num_classes: 10,
            dropout: 0.3,
            readout: ReadoutPolicy::LastValidStep,
        }
    }
}

impl ModelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hidden state width
    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    /// Set the number of stacked layers
    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    /// Enable or disable the backward pass
    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Set the number of output classes
    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    /// Set the readout policy
    pub fn with_readout(mut self, readout: ReadoutPolicy) -> Self {
        self.readout = readout;
        self
    }

    /// 2 for bidirectional models, 1 otherwise
    pub fn directions(&self) -> usize {
        if self.bidirectional {
            2
        } else {
            1
        }
    }

    /// Input width of a given layer
    pub fn layer_input_size(&self, layer: usize) -> usize {
        if layer == 0 {
            self.input_size
        } else {
            self.hidden_size * self.directions()
        }
    }

    /// Width of the representation the linear head projects
    pub fn head_input_size(&self) -> usize {
        self.hidden_size * self.directions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.input_size, 3);
        assert_eq!(config.hidden_size, 128);
        assert_eq!(config.num_layers, 2);
        assert!(config.bidirectional);
        assert_eq!(config.readout, ReadoutPolicy::LastValidStep);
    }

    #[test]
    fn test_layer_sizes() {
        let config = ModelConfig::new().with_hidden_size(8).with_num_layers(3);
        assert_eq!(config.layer_input_size(0), 3);
        assert_eq!(config.layer_input_size(1), 16);
        assert_eq!(config.head_input_size(), 16);

        let single = config.with_bidirectional(false);
        assert_eq!(single.layer_input_size(2), 8);
        assert_eq!(single.head_input_size(), 8);
    }

    #[test]
    fn test_readout_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            model: ModelConfig,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
[model]
hidden_size = 4
readout = "padded-final-step"
"#,
        )
        .unwrap();
        assert_eq!(parsed.model.hidden_size, 4);
        assert_eq!(parsed.model.readout, ReadoutPolicy::PaddedFinalStep);
        assert_eq!(parsed.model.num_layers, 2);
    }
}
