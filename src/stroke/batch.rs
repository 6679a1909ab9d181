//! Right-padded rectangular batches of normalized strokes

use super::normalize::NormalizedStroke;
use super::types::InputError;
use super::CHANNELS;

/// A `(count, max_len, channels)` container, stored row-major
///
/// Shorter sequences are zero-padded on the right. Padding is
/// indistinguishable from a legitimate zero sample, so the true length of
/// every sequence is kept alongside the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    data: Vec<f32>,
    lengths: Vec<usize>,
    max_len: usize,
    channels: usize,
}

impl Batch {
    /// Build a batch from raw per-sample channel vectors.
    ///
    /// Every sample must have exactly `channels` values.
    pub fn from_samples(sequences: &[Vec<Vec<f32>>], channels: usize) -> Result<Self, InputError> {
        for (stroke, sequence) in sequences.iter().enumerate() {
            if sequence.is_empty() {
                return Err(InputError::EmptyStroke { index: stroke });
            }
            if let Some((sample, values)) = sequence
                .iter()
                .enumerate()
                .find(|(_, values)| values.len() != channels)
            {
                return Err(InputError::ChannelMismatch {
                    stroke,
                    sample,
                    expected: channels,
                    found: values.len(),
                });
            }
        }

        let lengths: Vec<usize> = sequences.iter().map(Vec::len).collect();
        let max_len = lengths.iter().copied().max().unwrap_or(0);
        let mut data = vec![0.0; sequences.len() * max_len * channels];
        for (i, sequence) in sequences.iter().enumerate() {
            for (j, values) in sequence.iter().enumerate() {
                let offset = (i * max_len + j) * channels;
                data[offset..offset + channels].copy_from_slice(values);
            }
        }

        Ok(Self {
            data,
            lengths,
            max_len,
            channels,
        })
    }

    /// Number of sequences
    pub fn count(&self) -> usize {
        self.lengths.len()
    }

    /// Padded sequence length
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// True (unpadded) length of every sequence, in batch order
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// The channel values of one time step of one sequence
    pub fn sample(&self, index: usize, step: usize) -> &[f32] {
        let offset = (index * self.max_len + step) * self.channels;
        &self.data[offset..offset + self.channels]
    }

    /// The first `len` time steps of one sequence
    pub fn steps(&self, index: usize, len: usize) -> impl Iterator<Item = &[f32]> + '_ {
        (0..len).map(move |step| self.sample(index, step))
    }
}

/// Zero-pad normalized strokes on the right up to the longest one.
pub fn batch(strokes: &[NormalizedStroke]) -> Batch {
    let lengths: Vec<usize> = strokes.iter().map(NormalizedStroke::len).collect();
    let max_len = lengths.iter().copied().max().unwrap_or(0);
    let mut data = vec![0.0; strokes.len() * max_len * CHANNELS];

    for (i, stroke) in strokes.iter().enumerate() {
        for (j, sample) in stroke.samples().iter().enumerate() {
            let offset = (i * max_len + j) * CHANNELS;
            for (c, value) in sample.iter().enumerate() {
                data[offset + c] = *value as f32;
            }
        }
    }

    Batch {
        data,
        lengths,
        max_len,
        channels: CHANNELS,
    }
}
