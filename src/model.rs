//! Training driver.
//!
//! [`Bpmll`] owns the whole pipeline: topology construction from a seed,
//! optional input normalization, the per-epoch stochastic training loop, and
//! the final threshold calibration pass. Predictions combine the network's
//! confidence vector with the fitted threshold function.
//!
//! The model is strictly single-threaded; callers wanting parallel training
//! of independent models should clone the untrained model (or build several
//! with different seeds), never share one across threads.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{
    threshold::ideal_threshold, Activation, Backprop, DataPair, Dataset, Error, FeatureScaler,
    MultiLabelOutput, NeuralNet, Result, ThresholdFn,
};

#[derive(Debug, Clone)]
/// Training configuration.
pub struct TrainConfig {
    /// Hidden layer sizes, outermost first. Empty means a single weighted
    /// layer from inputs to labels.
    pub hidden_layers: Vec<usize>,
    pub epochs: usize,
    /// Gradient-descent step size, in (0, 1].
    pub learning_rate: f64,
    /// L2 regularization coefficient, in (0, 1].
    pub weights_decay: f64,
    /// Normalize input attributes to [-1, 1] using training-set min/max.
    pub normalize: bool,
    /// Reshuffle the example order every epoch (seeded, reproducible).
    pub shuffle: bool,
    /// Activation of all non-input layers. Must have a bounded output range.
    pub activation: Activation,
    /// Fixed input value multiplied with every bias weight.
    pub bias_input: f64,
    /// Seed for weight initialization and epoch shuffling.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            hidden_layers: Vec::new(),
            epochs: 100,
            learning_rate: 0.05,
            weights_decay: 1e-5,
            normalize: true,
            shuffle: true,
            activation: Activation::Tanh,
            bias_input: 1.0,
            seed: 0,
        }
    }
}

impl TrainConfig {
    /// Validate all hyperparameters. Invalid values error, never clamp.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if !(self.learning_rate.is_finite()
            && self.learning_rate > 0.0
            && self.learning_rate <= 1.0)
        {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.weights_decay.is_finite()
            && self.weights_decay > 0.0
            && self.weights_decay <= 1.0)
        {
            return Err(Error::InvalidConfig(format!(
                "weights decay must be in (0, 1], got {}",
                self.weights_decay
            )));
        }
        if self.hidden_layers.contains(&0) {
            return Err(Error::InvalidConfig(
                "hidden layer sizes must be > 0".to_owned(),
            ));
        }
        if !self.bias_input.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "bias input must be finite, got {}",
                self.bias_input
            )));
        }
        self.activation.validate()?;
        if !self.activation.has_finite_bounds() {
            return Err(Error::InvalidConfig(format!(
                "activation {} has an unbounded output range; threshold \
                 calibration needs finite bounds",
                self.activation.name()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Summary of one `fit` run.
pub struct FitReport {
    /// Mean ranking criterion over the final epoch.
    pub final_loss: f64,
    /// Examples excluded from weight updates because their labels were all
    /// relevant or all irrelevant.
    pub skipped_examples: usize,
}

/// Everything a trained model needs at inference time.
#[derive(Debug, Clone)]
struct Trained {
    net: NeuralNet,
    threshold: ThresholdFn,
    scaler: Option<FeatureScaler>,
}

#[derive(Debug, Clone)]
/// Multi-label neural network classifier.
///
/// Train with [`Bpmll::fit`], then query [`Bpmll::predict`] for a
/// bipartition/ranking/confidence prediction per pattern.
pub struct Bpmll {
    config: TrainConfig,
    state: Option<Trained>,
}

impl Bpmll {
    /// Build an untrained model; the configuration is validated eagerly.
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    #[inline]
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Train on `train` from scratch.
    ///
    /// Refitting an already trained model discards the previous weights and
    /// restarts from the configured seed.
    pub fn fit(&mut self, train: &Dataset) -> Result<FitReport> {
        if train.is_empty() {
            return Err(Error::InvalidData(
                "training dataset must not be empty".to_owned(),
            ));
        }

        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let mut topology = Vec::with_capacity(cfg.hidden_layers.len() + 2);
        topology.push(train.input_dim());
        topology.extend_from_slice(&cfg.hidden_layers);
        topology.push(train.num_labels());
        let mut net =
            NeuralNet::new_with_rng(&topology, cfg.bias_input, cfg.activation, &mut rng)?;

        let scaler = cfg.normalize.then(|| FeatureScaler::fit(train));
        let mut scaled = vec![0.0; train.input_dim()];

        let mut learner = Backprop::new(cfg.weights_decay)?;
        let mut order: Vec<usize> = (0..train.len()).collect();

        // Examples whose labels are all relevant or all irrelevant carry no
        // ranking information and are excluded from weight updates.
        let degenerate: Vec<bool> = (0..train.len())
            .map(|idx| !DataPair::new(train.input(idx), train.target(idx)).has_label_mix())
            .collect();
        let skipped_examples = degenerate.iter().filter(|&&d| d).count();

        let mut epoch_loss = 0.0;
        for epoch in 0..cfg.epochs {
            if cfg.shuffle {
                order.shuffle(&mut rng);
            }

            epoch_loss = 0.0;
            let mut used = 0usize;
            for &idx in &order {
                if degenerate[idx] {
                    continue;
                }
                let target = train.target(idx);

                let input = match &scaler {
                    Some(s) => {
                        s.transform(train.input(idx), &mut scaled);
                        &scaled[..]
                    }
                    None => train.input(idx),
                };
                let pair = DataPair::new(input, target);
                epoch_loss += learner.learn(&mut net, &pair, cfg.learning_rate)?;
                used += 1;
            }

            if used > 0 {
                epoch_loss /= used as f64;
            }
            debug!(
                "epoch {}/{}: mean ranking loss {epoch_loss:.6}",
                epoch + 1,
                cfg.epochs
            );
        }

        // Threshold calibration over every training example, the skipped
        // ones included (their ideal thresholds come from the activation
        // bounds).
        let mut rows = Vec::with_capacity(train.len());
        let mut ideals = Vec::with_capacity(train.len());
        for idx in 0..train.len() {
            let input = match &scaler {
                Some(s) => {
                    s.transform(train.input(idx), &mut scaled);
                    &scaled[..]
                }
                None => train.input(idx),
            };
            let confidences = net.feed_forward(input)?.to_vec();
            ideals.push(ideal_threshold(
                &confidences,
                train.target(idx),
                cfg.activation.min(),
                cfg.activation.max(),
            ));
            rows.push(confidences);
        }
        let threshold = ThresholdFn::fit(&rows, &ideals)?;

        info!(
            "trained on {} examples ({} labels, {} epochs, {} skipped)",
            train.len(),
            train.num_labels(),
            cfg.epochs,
            skipped_examples
        );

        self.state = Some(Trained {
            net,
            threshold,
            scaler,
        });
        Ok(FitReport {
            final_loss: epoch_loss,
            skipped_examples,
        })
    }

    /// Predict bipartition, ranking, and confidences for one pattern.
    ///
    /// Fails with [`Error::NotTrained`] before the first successful `fit`;
    /// shape mismatches fail with [`Error::InvalidShape`].
    pub fn predict(&mut self, input: &[f64]) -> Result<MultiLabelOutput> {
        let state = self.state.as_mut().ok_or(Error::NotTrained)?;

        if input.len() != state.net.input_dim() {
            return Err(Error::InvalidShape(format!(
                "input len {} does not match model input dim {}",
                input.len(),
                state.net.input_dim()
            )));
        }

        let confidences = match &state.scaler {
            Some(s) => {
                let mut scaled = vec![0.0; input.len()];
                s.transform(input, &mut scaled);
                state.net.feed_forward(&scaled)?.to_vec()
            }
            None => state.net.feed_forward(input)?.to_vec(),
        };

        let t = state.threshold.threshold(&confidences);
        Ok(MultiLabelOutput::from_confidences(confidences, t))
    }

    /// The trained network, if any.
    pub fn net(&self) -> Option<&NeuralNet> {
        self.state.as_ref().map(|s| &s.net)
    }

    /// The fitted threshold function, if any.
    pub fn threshold_fn(&self) -> Option<&ThresholdFn> {
        self.state.as_ref().map(|s| &s.threshold)
    }

    /// The fitted input scaler, if any.
    pub fn scaler(&self) -> Option<&FeatureScaler> {
        self.state.as_ref().and_then(|s| s.scaler.as_ref())
    }

    /// Assemble a trained model from persisted parts (model deserialization).
    pub fn from_parts(
        config: TrainConfig,
        net: NeuralNet,
        threshold: ThresholdFn,
        scaler: Option<FeatureScaler>,
    ) -> Result<Self> {
        config.validate()?;
        if threshold.num_labels() != net.output_dim() {
            return Err(Error::InvalidShape(format!(
                "threshold function covers {} labels, network outputs {}",
                threshold.num_labels(),
                net.output_dim()
            )));
        }
        if let Some(s) = &scaler {
            if s.dim() != net.input_dim() {
                return Err(Error::InvalidShape(format!(
                    "scaler dim {} does not match network input dim {}",
                    s.dim(),
                    net.input_dim()
                )));
            }
        }

        Ok(Self {
            config,
            state: Some(Trained {
                net,
                threshold,
                scaler,
            }),
        })
    }
}
