//! Multi-label backpropagation.
//!
//! One [`Backprop::learn`] call performs a single gradient-descent update of
//! the whole network for one (pattern, target) pair:
//!
//! 1. forward pass (every layer's pre-activations and outputs are cached in
//!    the network);
//! 2. ranking criterion and its gradient at the output layer
//!    ([`crate::loss::rank_loss_backward`]);
//! 3. per-layer error terms propagated backwards with the
//!    weighted-sum-of-downstream-errors rule, each scaled by the local
//!    activation derivative;
//! 4. every weight updated as `w -= lr * (dw + decay * w)`.
//!
//! The returned value is the criterion *before* the update, for convergence
//! monitoring. Gradient buffers are owned by the algorithm and reused across
//! calls (rebuilt only if the network shape changes).

use crate::{loss, DataPair, Error, NeuralNet, Result};

/// Reusable gradient buffers shaped like one specific network.
#[derive(Debug, Clone)]
struct Workspace {
    d_weights: Vec<Vec<f64>>,
    d_biases: Vec<Vec<f64>>,
    /// Gradient w.r.t. each weighted layer's output; the last entry is where
    /// the loss gradient lands before backprop walks the layers.
    d_layer_outputs: Vec<Vec<f64>>,
    d_input: Vec<f64>,
}

impl Workspace {
    fn new(net: &NeuralNet) -> Self {
        let layers = net.layers();
        Self {
            d_weights: layers
                .iter()
                .map(|l| vec![0.0; l.in_dim() * l.out_dim()])
                .collect(),
            d_biases: layers.iter().map(|l| vec![0.0; l.out_dim()]).collect(),
            d_layer_outputs: layers.iter().map(|l| vec![0.0; l.out_dim()]).collect(),
            d_input: vec![0.0; net.input_dim()],
        }
    }

    fn matches(&self, net: &NeuralNet) -> bool {
        self.d_input.len() == net.input_dim()
            && self.d_weights.len() == net.layers().len()
            && net
                .layers()
                .iter()
                .zip(&self.d_weights)
                .all(|(l, dw)| dw.len() == l.in_dim() * l.out_dim())
    }
}

/// Gradient-descent learner for the pairwise ranking criterion.
#[derive(Debug, Clone)]
pub struct Backprop {
    weights_decay: f64,
    workspace: Option<Workspace>,
}

impl Backprop {
    /// `weights_decay` is the L2 regularization coefficient and must lie in
    /// (0, 1].
    pub fn new(weights_decay: f64) -> Result<Self> {
        if !(weights_decay.is_finite() && weights_decay > 0.0 && weights_decay <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "weights decay must be in (0, 1], got {weights_decay}"
            )));
        }
        Ok(Self {
            weights_decay,
            workspace: None,
        })
    }

    #[inline]
    pub fn weights_decay(&self) -> f64 {
        self.weights_decay
    }

    /// One stochastic update of `net` on `pair`; returns the pre-update
    /// ranking criterion.
    ///
    /// A degenerate pair (all labels relevant or all irrelevant) contributes
    /// zero gradient, so only the decay term moves the weights.
    pub fn learn(&mut self, net: &mut NeuralNet, pair: &DataPair, learning_rate: f64) -> Result<f64> {
        if !(learning_rate.is_finite() && learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be in (0, 1], got {learning_rate}"
            )));
        }
        if pair.input().len() != net.input_dim() {
            return Err(Error::InvalidShape(format!(
                "pair input len {} does not match network input dim {}",
                pair.input().len(),
                net.input_dim()
            )));
        }
        if pair.target().len() != net.output_dim() {
            return Err(Error::InvalidShape(format!(
                "pair target len {} does not match network output dim {}",
                pair.target().len(),
                net.output_dim()
            )));
        }

        net.feed_forward(pair.input())?;

        if !self.workspace.as_ref().is_some_and(|ws| ws.matches(net)) {
            self.workspace = Some(Workspace::new(net));
        }
        let ws = self.workspace.as_mut().expect("workspace was just built");

        let error = {
            let d_output = ws
                .d_layer_outputs
                .last_mut()
                .expect("network has at least one weighted layer");
            loss::rank_loss_backward(net.output(), pair.target(), d_output)
        };

        // Backward sweep: error terms flow from the output layer towards the
        // input layer.
        let num_weighted = net.layers().len();
        for idx in (0..num_weighted).rev() {
            let layer = &net.layers()[idx];
            let layer_input: &[f64] = if idx == 0 {
                pair.input()
            } else {
                &net.activations()[idx - 1]
            };
            let pre = &net.pre_activations()[idx];
            let out = &net.activations()[idx];

            if idx == 0 {
                let d_outputs = &ws.d_layer_outputs[0];
                layer.backward(
                    layer_input,
                    pre,
                    out,
                    d_outputs,
                    &mut ws.d_input,
                    &mut ws.d_weights[0],
                    &mut ws.d_biases[0],
                );
            } else {
                // Two gradient buffers at once: the current layer's (read) and
                // the previous layer's (written).
                let (left, right) = ws.d_layer_outputs.split_at_mut(idx);
                layer.backward(
                    layer_input,
                    pre,
                    out,
                    &right[0],
                    &mut left[idx - 1],
                    &mut ws.d_weights[idx],
                    &mut ws.d_biases[idx],
                );
            }
        }

        for (idx, layer) in net.layers_mut().iter_mut().enumerate() {
            layer.decay_step(
                &ws.d_weights[idx],
                &ws.d_biases[idx],
                learning_rate,
                self.weights_decay,
            );
        }

        Ok(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, NeuralNet};
    use approx::assert_abs_diff_eq;

    fn small_net(seed: u64) -> NeuralNet {
        NeuralNet::new_with_seed(&[2, 4, 3], 1.0, Activation::Tanh, seed).unwrap()
    }

    #[test]
    fn decay_outside_unit_interval_is_rejected() {
        assert!(Backprop::new(0.0).is_err());
        assert!(Backprop::new(1.1).is_err());
        assert!(Backprop::new(-0.5).is_err());
        assert!(Backprop::new(f64::NAN).is_err());
        assert!(Backprop::new(1.0).is_ok());
        assert!(Backprop::new(1e-5).is_ok());
    }

    #[test]
    fn learn_rejects_mismatched_pair() {
        let mut net = small_net(0);
        let mut bp = Backprop::new(1e-5).unwrap();

        let bad_input = DataPair::new(&[0.1, 0.2, 0.3], &[1.0, -1.0, -1.0]);
        assert!(bp.learn(&mut net, &bad_input, 0.05).is_err());

        let bad_target = DataPair::new(&[0.1, 0.2], &[1.0, -1.0]);
        assert!(bp.learn(&mut net, &bad_target, 0.05).is_err());

        let pair = DataPair::new(&[0.1, 0.2], &[1.0, -1.0, -1.0]);
        assert!(bp.learn(&mut net, &pair, 0.0).is_err());
        assert!(bp.learn(&mut net, &pair, 1.5).is_err());
    }

    #[test]
    fn repeated_updates_strictly_decrease_the_criterion() {
        // 2-input / 3-label example from a fixed seed; gradient descent on a
        // single pair must reduce the criterion every step.
        let mut net = small_net(42);
        let mut bp = Backprop::new(1e-5).unwrap();
        let pair = DataPair::new(&[-1.0, 1.0], &[1.0, -1.0, 1.0]);

        let mut prev = bp.learn(&mut net, &pair, 0.05).unwrap();
        for _ in 0..25 {
            let err = bp.learn(&mut net, &pair, 0.05).unwrap();
            assert!(
                err < prev,
                "criterion did not decrease: {err} !< {prev}"
            );
            prev = err;
        }
    }

    #[test]
    fn returned_error_is_the_pre_update_criterion() {
        let mut net = small_net(7);
        let mut bp = Backprop::new(1e-5).unwrap();
        let pair = DataPair::new(&[0.4, -0.2], &[-1.0, 1.0, -1.0]);

        let before = {
            let out = net.feed_forward(pair.input()).unwrap();
            crate::loss::rank_loss(out, pair.target())
        };
        let reported = bp.learn(&mut net, &pair, 0.05).unwrap();
        assert_abs_diff_eq!(reported, before, epsilon = 1e-12);

        let after = {
            let out = net.feed_forward(pair.input()).unwrap();
            crate::loss::rank_loss(out, pair.target())
        };
        assert!(after < reported);
    }

    #[test]
    fn backprop_gradient_matches_numeric_gradient() {
        // Finite-difference check of the full chain (criterion -> activation
        // -> weights) on every parameter of a small network. The applied
        // update divided by the learning rate recovers the gradient; the
        // decay contribution is below the comparison tolerance at 1e-12.
        let mut net = NeuralNet::new_with_seed(&[2, 3, 2], 1.0, Activation::Tanh, 3).unwrap();
        let pair = DataPair::new(&[0.3, -0.7], &[1.0, -1.0]);
        let lr = 1e-3;
        let decay = 1e-12;

        let before = net.clone();
        let mut bp = Backprop::new(decay).unwrap();
        bp.learn(&mut net, &pair, lr).unwrap();

        let eps = 1e-5;
        for layer_idx in 0..before.layers().len() {
            for p in 0..before.layers()[layer_idx].weights().len() {
                let mut plus = before.clone();
                plus.layers_mut()[layer_idx].weights_mut()[p] += eps;
                let loss_plus = {
                    let out = plus.feed_forward(pair.input()).unwrap();
                    crate::loss::rank_loss(out, pair.target())
                };

                let mut minus = before.clone();
                minus.layers_mut()[layer_idx].weights_mut()[p] -= eps;
                let loss_minus = {
                    let out = minus.feed_forward(pair.input()).unwrap();
                    crate::loss::rank_loss(out, pair.target())
                };

                let numeric = (loss_plus - loss_minus) / (2.0 * eps);
                let applied = (before.layers()[layer_idx].weights()[p]
                    - net.layers()[layer_idx].weights()[p])
                    / lr;
                assert_abs_diff_eq!(applied, numeric, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn degenerate_pair_only_decays_weights() {
        let mut net = small_net(11);
        let before = net.clone();
        let mut bp = Backprop::new(0.5).unwrap();

        let pair = DataPair::new(&[0.1, 0.9], &[1.0, 1.0, 1.0]);
        let err = bp.learn(&mut net, &pair, 0.1).unwrap();
        assert_eq!(err, 0.0);

        for (l_after, l_before) in net.layers().iter().zip(before.layers()) {
            for (&wa, &wb) in l_after.weights().iter().zip(l_before.weights()) {
                assert_abs_diff_eq!(wa, wb * (1.0 - 0.1 * 0.5), epsilon = 1e-12);
            }
        }
    }
}
