//! Dense weighted layer.
//!
//! Connectivity between consecutive layers is the array structure itself:
//! a row-major `(out_dim, in_dim)` weight matrix plus one bias weight per
//! unit, instead of a graph of neuron objects. The bias weight is multiplied
//! by a fixed bias input constant, so it behaves like one extra weight whose
//! input activation never changes.

use rand::Rng;

use crate::{Activation, Error, Result};

#[derive(Debug, Clone)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f64>,
    biases: Vec<f64>,
    bias_input: f64,
    activation: Activation,
}

impl Layer {
    /// Build a layer with all weights (bias weights included) drawn uniformly
    /// from [-0.5, 0.5].
    pub fn new_with_rng<R: Rng + ?Sized>(
        in_dim: usize,
        out_dim: usize,
        bias_input: f64,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        activation.validate()?;

        let mut layer = Self {
            in_dim,
            out_dim,
            weights: vec![0.0; in_dim * out_dim],
            biases: vec![0.0; out_dim],
            bias_input,
            activation,
        };
        layer.reset_with_rng(rng);
        Ok(layer)
    }

    /// Rebuild a layer from raw parts (used by model deserialization).
    pub fn from_parts(
        in_dim: usize,
        out_dim: usize,
        bias_input: f64,
        activation: Activation,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        activation.validate()?;
        if weights.len() != in_dim * out_dim {
            return Err(Error::InvalidShape(format!(
                "weights length {} does not match out_dim * in_dim ({out_dim} * {in_dim})",
                weights.len()
            )));
        }
        if biases.len() != out_dim {
            return Err(Error::InvalidShape(format!(
                "biases length {} does not match out_dim {out_dim}",
                biases.len()
            )));
        }
        if weights.iter().chain(biases.iter()).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "layer parameters must be finite".to_owned(),
            ));
        }

        Ok(Self {
            in_dim,
            out_dim,
            weights,
            biases,
            bias_input,
            activation,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// Re-randomize all weights uniformly in [-0.5, 0.5].
    pub fn reset_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for w in &mut self.weights {
            *w = rng.gen_range(-0.5..0.5);
        }
        for b in &mut self.biases {
            *b = rng.gen_range(-0.5..0.5);
        }
    }

    /// Forward pass for a single pattern.
    ///
    /// Computes `z = W * inputs + b * bias_input` and `outputs = activation(z)`,
    /// writing the pre-activations into `pre` (backprop needs them).
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `pre.len() == self.out_dim`
    /// - `outputs.len() == self.out_dim`
    #[inline]
    pub fn forward(&self, inputs: &[f64], pre: &mut [f64], outputs: &mut [f64]) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(pre.len(), self.out_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);

        for o in 0..self.out_dim {
            let mut sum = self.biases[o] * self.bias_input;
            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                sum = self.weights[row + i].mul_add(inputs[i], sum);
            }
            pre[o] = sum;
            outputs[o] = self.activation.activate(sum);
        }
    }

    /// Backward pass for a single pattern (overwrite semantics).
    ///
    /// Inputs:
    /// - `inputs`: the same inputs passed to `forward`
    /// - `pre`/`outputs`: the buffers `forward` filled in
    /// - `d_outputs`: upstream gradient dL/d(outputs)
    ///
    /// Writes:
    /// - `d_inputs`: dL/d(inputs), zeroed then accumulated
    /// - `d_weights`, `d_biases`: parameter gradients
    #[inline]
    pub fn backward(
        &self,
        inputs: &[f64],
        pre: &[f64],
        outputs: &[f64],
        d_outputs: &[f64],
        d_inputs: &mut [f64],
        d_weights: &mut [f64],
        d_biases: &mut [f64],
    ) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(pre.len(), self.out_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);
        debug_assert_eq!(d_outputs.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        // d_inputs accumulates contributions from all units.
        d_inputs.fill(0.0);

        for o in 0..self.out_dim {
            let d_z = d_outputs[o] * self.activation.grad(pre[o], outputs[o]);
            d_biases[o] = d_z * self.bias_input;

            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                let w = self.weights[row + i];
                d_weights[row + i] = d_z * inputs[i];
                d_inputs[i] = w.mul_add(d_z, d_inputs[i]);
            }
        }
    }

    /// Gradient-descent update with L2 weights decay:
    /// `w -= lr * (dw + decay * w)`.
    #[inline]
    pub fn decay_step(&mut self, d_weights: &[f64], d_biases: &[f64], lr: f64, decay: f64) {
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.biases.len());

        for (w, &dw) in self.weights.iter_mut().zip(d_weights) {
            *w -= lr * (dw + decay * *w);
        }
        for (b, &db) in self.biases.iter_mut().zip(d_biases) {
            *b -= lr * (db + decay * *b);
        }
    }
}
