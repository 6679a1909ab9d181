//! Recurrent encoder: LSTM cell and directional passes

use super::config::ReadoutPolicy;
use super::params::{DirectionParams, LayerParams};

/// One direction of one layer, with its own hidden and cell state.
///
/// State starts at zero for every sequence and is never shared with the
/// opposite direction.
pub(crate) struct DirectionalPass<'a> {
    params: &'a DirectionParams,
    input_size: usize,
    hidden: Vec<f32>,
    cell: Vec<f32>,
    gates: Vec<f32>,
}

impl<'a> DirectionalPass<'a> {
    pub(crate) fn new(params: &'a DirectionParams, input_size: usize, hidden_size: usize) -> Self {
        Self {
            params,
            input_size,
            hidden: vec![0.0; hidden_size],
            cell: vec![0.0; hidden_size],
            gates: vec![0.0; 4 * hidden_size],
        }
    }

    /// Advance one time step and return the new hidden state
    pub(crate) fn step(&mut self, input: &[f32]) -> &[f32] {
        debug_assert_eq!(input.len(), self.input_size);
        let h = self.hidden.len();

        self.gates.copy_from_slice(&self.params.b_ih);
        for (gate, bias) in self.gates.iter_mut().zip(&self.params.b_hh) {
            *gate += bias;
        }
        affine_accumulate(&mut self.gates, &self.params.w_ih, input);
        affine_accumulate(&mut self.gates, &self.params.w_hh, &self.hidden);

        for k in 0..h {
            let i = sigmoid(self.gates[k]);
            let f = sigmoid(self.gates[h + k]);
            let g = self.gates[2 * h + k].tanh();
            let o = sigmoid(self.gates[3 * h + k]);
            self.cell[k] = f * self.cell[k] + i * g;
            self.hidden[k] = o * self.cell[k].tanh();
        }
        &self.hidden
    }

    /// Consume a sequence and collect the hidden state after every step
    pub(crate) fn run<'s>(mut self, inputs: impl Iterator<Item = &'s [f32]>) -> Vec<Vec<f32>> {
        inputs.map(|input| self.step(input).to_vec()).collect()
    }
}

/// Output of one encoded sequence
pub(crate) struct Encoded {
    /// Forward state after the last sample, concatenated with the backward
    /// half chosen by the readout policy
    pub(crate) representation: Vec<f32>,
}

/// Run the stacked encoder over one sequence.
///
/// `LastValidStep` takes the backward state after the backward pass has
/// consumed the whole sequence (time index 0). `PaddedFinalStep` takes the
/// backward output aligned with the last time index, which has seen only
/// the final sample; this is the feature layout of `out[:, -1, :]`.
pub(crate) fn encode(
    layers: &[LayerParams],
    input_size: usize,
    hidden_size: usize,
    steps: Vec<Vec<f32>>,
    readout: ReadoutPolicy,
) -> Encoded {
    let mut inputs = steps;
    let mut width = input_size;
    let mut representation = Vec::new();

    for layer in layers {
        let forward = DirectionalPass::new(&layer.forward, width, hidden_size)
            .run(inputs.iter().map(Vec::as_slice));
        let backward = layer.backward.as_ref().map(|params| {
            let mut outputs = DirectionalPass::new(params, width, hidden_size)
                .run(inputs.iter().rev().map(Vec::as_slice));
            outputs.reverse();
            outputs
        });

        representation = forward.last().cloned().unwrap_or_default();
        let backward_state = backward.as_ref().and_then(|outputs| match readout {
            ReadoutPolicy::LastValidStep => outputs.first(),
            ReadoutPolicy::PaddedFinalStep => outputs.last(),
        });
        if let Some(state) = backward_state {
            representation.extend_from_slice(state);
        }

        // Inter-layer dropout is a training-only regularizer
        inputs = match backward {
            Some(backward) => forward
                .into_iter()
                .zip(backward)
                .map(|(mut fwd, bwd)| {
                    fwd.extend(bwd);
                    fwd
                })
                .collect(),
            None => forward,
        };
        width = inputs.first().map(Vec::len).unwrap_or(width);
    }

    Encoded { representation }
}

/// `out += weight * input` for a row-major `out.len() x input.len()` matrix
pub(crate) fn affine_accumulate(out: &mut [f32], weight: &[f32], input: &[f32]) {
    let cols = input.len();
    for (row, value) in out.iter_mut().enumerate() {
        let weights = &weight[row * cols..(row + 1) * cols];
        *value += weights.iter().zip(input).map(|(w, x)| w * x).sum::<f32>();
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
