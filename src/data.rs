//! Training examples.
//!
//! `Dataset` provides validated, row-major storage for feature/label matrices;
//! the training loop operates on slices to avoid per-step copies. Label
//! targets use the +1/-1 encoding: +1 marks a relevant label, -1 an
//! irrelevant one, and any other value is rejected at construction.

use crate::{Error, Result};

/// A single training example: one feature vector and one +1/-1 label vector.
///
/// Both vectors are defensively copied at construction, so later mutation of
/// the caller's buffers cannot change the pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPair {
    input: Vec<f64>,
    target: Vec<f64>,
}

impl DataPair {
    pub fn new(input: &[f64], target: &[f64]) -> Self {
        Self {
            input: input.to_vec(),
            target: target.to_vec(),
        }
    }

    #[inline]
    pub fn input(&self) -> &[f64] {
        &self.input
    }

    #[inline]
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Returns true if the example has at least one relevant and at least one
    /// irrelevant label. Examples failing this carry no ranking information.
    #[inline]
    pub fn has_label_mix(&self) -> bool {
        self.target.iter().any(|&t| t > 0.0) && self.target.iter().any(|&t| t < 0.0)
    }
}

/// A supervised multi-label dataset: inputs (X) and +1/-1 targets (Y).
///
/// Stored as contiguous buffers with row-major layout:
/// - `inputs.len() == len * input_dim`
/// - `targets.len() == len * num_labels`
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Vec<f64>,
    targets: Vec<f64>,
    len: usize,
    input_dim: usize,
    num_labels: usize,
}

impl Dataset {
    /// Build a dataset from flat buffers.
    ///
    /// `inputs` is `(len, input_dim)` and `targets` is `(len, num_labels)`.
    pub fn from_flat(
        inputs: Vec<f64>,
        targets: Vec<f64>,
        input_dim: usize,
        num_labels: usize,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if num_labels == 0 {
            return Err(Error::InvalidData("num_labels must be > 0".to_owned()));
        }
        if inputs.len() % input_dim != 0 {
            return Err(Error::InvalidData(format!(
                "inputs length {} is not divisible by input_dim {input_dim}",
                inputs.len()
            )));
        }

        let len = inputs.len() / input_dim;
        if targets.len() != len * num_labels {
            return Err(Error::InvalidData(format!(
                "targets length {} does not match len * num_labels ({len} * {num_labels})",
                targets.len()
            )));
        }
        validate_targets(&targets)?;

        Ok(Self {
            inputs,
            targets,
            len,
            input_dim,
            num_labels,
        })
    }

    /// Build a dataset from per-example rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }

        let input_dim = inputs[0].len();
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        for (i, row) in inputs.iter().enumerate() {
            if row.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    row.len()
                )));
            }
        }

        let num_labels = targets[0].len();
        if num_labels == 0 {
            return Err(Error::InvalidData("num_labels must be > 0".to_owned()));
        }
        for (i, row) in targets.iter().enumerate() {
            if row.len() != num_labels {
                return Err(Error::InvalidData(format!(
                    "target row {i} has len {}, expected {num_labels}",
                    row.len()
                )));
            }
        }

        let len = inputs.len();
        let mut inputs_flat = Vec::with_capacity(len * input_dim);
        for row in inputs {
            inputs_flat.extend_from_slice(row);
        }
        let mut targets_flat = Vec::with_capacity(len * num_labels);
        for row in targets {
            targets_flat.extend_from_slice(row);
        }

        Self::from_flat(inputs_flat, targets_flat, input_dim, num_labels)
    }

    #[inline]
    /// Returns the number of examples.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns true if there are no examples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    /// Returns the per-example feature dimension.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    /// Returns the number of labels.
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    #[inline]
    /// Returns the `idx`-th feature row (shape: `(input_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f64] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th label row (shape: `(num_labels,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn target(&self, idx: usize) -> &[f64] {
        let start = idx * self.num_labels;
        &self.targets[start..start + self.num_labels]
    }
}

fn validate_targets(targets: &[f64]) -> Result<()> {
    for (i, &t) in targets.iter().enumerate() {
        if t != 1.0 && t != -1.0 {
            return Err(Error::InvalidData(format!(
                "target entry {i} must be +1.0 or -1.0, got {t}"
            )));
        }
    }
    Ok(())
}
