//! Layered feed-forward network.
//!
//! A topology `[i, h1, ..., hn, o]` describes `n + 2` layers. Layer 0 is the
//! pass-through input layer: it has no weights and simply forwards the input
//! pattern, so it exists only as the `layer_units(0)` bookkeeping of the dense
//! representation. Every subsequent layer is a fully connected [`Layer`]
//! whose units consume the complete output vector of the previous layer.
//!
//! The network caches each weighted layer's pre-activations and outputs from
//! the most recent [`NeuralNet::feed_forward`]; backprop reads these caches.
//! [`NeuralNet::output`] is a zero vector until the first forward pass and
//! again after a reset.
//!
//! Networks are never shared: cloning produces an independent copy of every
//! weight and cache (the structural replacement for deep-copy-by-serialization).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Activation, Error, Layer, Result};

#[derive(Debug, Clone)]
pub struct NeuralNet {
    input_dim: usize,
    layers: Vec<Layer>,
    /// Cached pre-activations per weighted layer, filled by `feed_forward`.
    pre: Vec<Vec<f64>>,
    /// Cached outputs per weighted layer, filled by `feed_forward`.
    acts: Vec<Vec<f64>>,
    /// Last computed network output; zeros before any forward pass.
    output: Vec<f64>,
}

impl NeuralNet {
    /// Build a network from a topology using a deterministic seed.
    pub fn new_with_seed(
        topology: &[usize],
        bias_input: f64,
        activation: Activation,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(topology, bias_input, activation, &mut rng)
    }

    /// Build a network from a topology using the provided RNG.
    ///
    /// `topology[0]` is the input dimension, `topology[last]` the output
    /// dimension (number of labels); entries in between are hidden layer
    /// sizes. All non-input layers use `activation`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        topology: &[usize],
        bias_input: f64,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        if topology.len() < 2 {
            return Err(Error::InvalidConfig(
                "topology must include input and output dims".to_owned(),
            ));
        }
        if topology.contains(&0) {
            return Err(Error::InvalidConfig(
                "all layer sizes must be > 0".to_owned(),
            ));
        }
        if !bias_input.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "bias input must be finite, got {bias_input}"
            )));
        }
        activation.validate()?;

        let mut layers = Vec::with_capacity(topology.len() - 1);
        for w in topology.windows(2) {
            layers.push(Layer::new_with_rng(w[0], w[1], bias_input, activation, rng)?);
        }

        let pre = layers.iter().map(|l| vec![0.0; l.out_dim()]).collect();
        let acts: Vec<Vec<f64>> = layers.iter().map(|l| vec![0.0; l.out_dim()]).collect();
        let output = vec![0.0; topology[topology.len() - 1]];

        Ok(Self {
            input_dim: topology[0],
            layers,
            pre,
            acts,
            output,
        })
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.output.len()
    }

    /// Total layer count, the pass-through input layer included.
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len() + 1
    }

    /// Unit count of layer `idx`; layer 0 is the input layer.
    ///
    /// Panics if `idx >= num_layers()`.
    #[inline]
    pub fn layer_units(&self, idx: usize) -> usize {
        assert!(
            idx < self.num_layers(),
            "layer index {idx} out of range for {} layers",
            self.num_layers()
        );
        if idx == 0 {
            self.input_dim
        } else {
            self.layers[idx - 1].out_dim()
        }
    }

    /// Feed a pattern through the network, caching every layer's
    /// pre-activations and outputs, and return the output vector.
    pub fn feed_forward(&mut self, pattern: &[f64]) -> Result<&[f64]> {
        if pattern.len() != self.input_dim {
            return Err(Error::InvalidShape(format!(
                "pattern len {} does not match network input dim {}",
                pattern.len(),
                self.input_dim
            )));
        }

        for idx in 0..self.layers.len() {
            let layer = &self.layers[idx];
            let pre = &mut self.pre[idx];
            if idx == 0 {
                layer.forward(pattern, pre, &mut self.acts[0]);
            } else {
                // Borrow the previous output immutably and the current output mutably.
                let (left, right) = self.acts.split_at_mut(idx);
                layer.forward(&left[idx - 1], pre, &mut right[0]);
            }
        }

        if let Some(last) = self.acts.last() {
            self.output.copy_from_slice(last);
        }
        Ok(&self.output)
    }

    /// The most recent output of `feed_forward`, or a zero vector if nothing
    /// has been computed yet (or since the last reset).
    #[inline]
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Re-randomize every weight uniformly in [-0.5, 0.5] and clear all
    /// cached activations and the cached output.
    pub fn reset_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.reset_with_rng(rng);
        }
        for buf in self.pre.iter_mut().chain(self.acts.iter_mut()) {
            buf.fill(0.0);
        }
        self.output.fill(0.0);
    }

    #[inline]
    pub(crate) fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    #[inline]
    pub(crate) fn pre_activations(&self) -> &[Vec<f64>] {
        &self.pre
    }

    #[inline]
    pub(crate) fn activations(&self) -> &[Vec<f64>] {
        &self.acts
    }

    /// Weighted layer `idx` (0 = first layer after the input layer), for
    /// external persistence.
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    /// Rebuild a network from deserialized layers.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one weighted layer".to_owned(),
            ));
        }
        for i in 1..layers.len() {
            if layers[i].in_dim() != layers[i - 1].out_dim() {
                return Err(Error::InvalidShape(format!(
                    "layer {i} in_dim {} does not match previous out_dim {}",
                    layers[i].in_dim(),
                    layers[i - 1].out_dim()
                )));
            }
        }

        let input_dim = layers[0].in_dim();
        let pre = layers.iter().map(|l| vec![0.0; l.out_dim()]).collect();
        let acts: Vec<Vec<f64>> = layers.iter().map(|l| vec![0.0; l.out_dim()]).collect();
        let output = vec![0.0; layers[layers.len() - 1].out_dim()];

        Ok(Self {
            input_dim,
            layers,
            pre,
            acts,
            output,
        })
    }
}
