//! Model serialization/deserialization (feature: `serde`).
//!
//! This module defines a versioned, stable on-disk format for a trained
//! [`Bpmll`] model.
//!
//! Design notes:
//! - Internal structs are never serialized directly, so the file format stays
//!   stable even if the in-memory representation changes.
//! - Deserialization validates dimensions, parameter lengths, and that all
//!   parameters are finite.
//! - Training hyperparameters are not persisted: a loaded model is meant for
//!   inference, and its `TrainConfig` is reconstructed with defaults for the
//!   fields that only matter during `fit`.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{
    Activation, Bpmll, Error, FeatureScaler, Layer, NeuralNet, Result, ThresholdFn, TrainConfig,
};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SerializedModel {
    pub format_version: u32,
    pub bias_input: f64,
    pub layers: Vec<SerializedLayer>,
    /// `num_labels + 1` threshold coefficients, intercept last.
    pub threshold_coeffs: Vec<f64>,
    pub scaler: Option<SerializedScaler>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SerializedLayer {
    pub in_dim: usize,
    pub out_dim: usize,
    pub activation: SerializedActivation,
    /// Row-major (out_dim, in_dim).
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SerializedActivation {
    Sigmoid,
    Tanh,
    Relu,
    Prelu { slope: f64 },
    Elu { slope: f64 },
    Gaussian,
    Linear,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SerializedScaler {
    pub mins: Vec<f64>,
    pub maxs: Vec<f64>,
}

impl From<Activation> for SerializedActivation {
    fn from(value: Activation) -> Self {
        match value {
            Activation::Sigmoid => SerializedActivation::Sigmoid,
            Activation::Tanh => SerializedActivation::Tanh,
            Activation::ReLU => SerializedActivation::Relu,
            Activation::PReLU { slope } => SerializedActivation::Prelu { slope },
            Activation::Elu { slope } => SerializedActivation::Elu { slope },
            Activation::Gaussian => SerializedActivation::Gaussian,
            Activation::Linear => SerializedActivation::Linear,
        }
    }
}

impl SerializedActivation {
    fn into_activation(self) -> Activation {
        match self {
            SerializedActivation::Sigmoid => Activation::Sigmoid,
            SerializedActivation::Tanh => Activation::Tanh,
            SerializedActivation::Relu => Activation::ReLU,
            SerializedActivation::Prelu { slope } => Activation::PReLU { slope },
            SerializedActivation::Elu { slope } => Activation::Elu { slope },
            SerializedActivation::Gaussian => Activation::Gaussian,
            SerializedActivation::Linear => Activation::Linear,
        }
    }
}

impl SerializedModel {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported model format_version {}; expected {MODEL_FORMAT_VERSION}",
                self.format_version
            )));
        }
        if self.layers.is_empty() {
            return Err(Error::InvalidData(
                "serialized model must have at least one layer".to_owned(),
            ));
        }
        if !self.bias_input.is_finite() {
            return Err(Error::InvalidData(format!(
                "bias_input must be finite, got {}",
                self.bias_input
            )));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            layer.validate()?;
            if i > 0 {
                let prev_out = self.layers[i - 1].out_dim;
                if layer.in_dim != prev_out {
                    return Err(Error::InvalidData(format!(
                        "layer {i} in_dim {} does not match previous out_dim {prev_out}",
                        layer.in_dim
                    )));
                }
            }
        }

        let num_labels = self.layers[self.layers.len() - 1].out_dim;
        if self.threshold_coeffs.len() != num_labels + 1 {
            return Err(Error::InvalidData(format!(
                "threshold_coeffs length {} does not match num_labels + 1 ({})",
                self.threshold_coeffs.len(),
                num_labels + 1
            )));
        }
        if self.threshold_coeffs.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "threshold_coeffs must contain only finite values".to_owned(),
            ));
        }

        if let Some(scaler) = &self.scaler {
            let input_dim = self.layers[0].in_dim;
            if scaler.mins.len() != input_dim || scaler.maxs.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "scaler bounds ({}, {}) do not match input_dim {input_dim}",
                    scaler.mins.len(),
                    scaler.maxs.len()
                )));
            }
        }

        Ok(())
    }

    /// Snapshot a trained model.
    ///
    /// Fails with [`Error::NotTrained`] if `model` has not been fitted.
    pub fn from_model(model: &Bpmll) -> Result<Self> {
        let net = model.net().ok_or(Error::NotTrained)?;
        let threshold = model.threshold_fn().ok_or(Error::NotTrained)?;

        let mut layers = Vec::with_capacity(net.num_layers() - 1);
        let mut idx = 0;
        while let Some(layer) = net.layer(idx) {
            layers.push(SerializedLayer::from(layer));
            idx += 1;
        }

        Ok(Self {
            format_version: MODEL_FORMAT_VERSION,
            bias_input: model.config().bias_input,
            layers,
            threshold_coeffs: threshold.coeffs().to_vec(),
            scaler: model.scaler().map(|s| SerializedScaler {
                mins: s.mins().to_vec(),
                maxs: s.maxs().to_vec(),
            }),
        })
    }

    /// Rebuild an inference-ready model.
    pub fn into_model(self) -> Result<Bpmll> {
        self.validate()?;

        let bias_input = self.bias_input;
        let activation = self.layers[0].activation.into_activation();
        let hidden_layers: Vec<usize> = self
            .layers
            .iter()
            .take(self.layers.len() - 1)
            .map(|l| l.out_dim)
            .collect();

        let mut layers = Vec::with_capacity(self.layers.len());
        for (i, layer) in self.layers.into_iter().enumerate() {
            let act = layer.activation.into_activation();
            let l = Layer::from_parts(
                layer.in_dim,
                layer.out_dim,
                bias_input,
                act,
                layer.weights,
                layer.biases,
            )
            .map_err(|e| Error::InvalidData(format!("layer {i} invalid: {e}")))?;
            layers.push(l);
        }
        let net = NeuralNet::from_layers(layers)?;
        let threshold = ThresholdFn::from_coeffs(self.threshold_coeffs)?;
        let scaler = match self.scaler {
            Some(s) => Some(FeatureScaler::from_bounds(s.mins, s.maxs)?),
            None => None,
        };

        let config = TrainConfig {
            hidden_layers,
            normalize: scaler.is_some(),
            activation,
            bias_input,
            ..TrainConfig::default()
        };
        Bpmll::from_parts(config, net, threshold, scaler)
    }
}

impl From<&Layer> for SerializedLayer {
    fn from(layer: &Layer) -> Self {
        Self {
            in_dim: layer.in_dim(),
            out_dim: layer.out_dim(),
            activation: SerializedActivation::from(layer.activation()),
            weights: layer.weights().to_vec(),
            biases: layer.biases().to_vec(),
        }
    }
}

impl SerializedLayer {
    fn validate(&self) -> Result<()> {
        if self.in_dim == 0 || self.out_dim == 0 {
            return Err(Error::InvalidData(format!(
                "layer dims must be > 0, got in_dim={} out_dim={}",
                self.in_dim, self.out_dim
            )));
        }

        let expected_w = self
            .in_dim
            .checked_mul(self.out_dim)
            .ok_or_else(|| Error::InvalidData("layer weight shape overflow".to_owned()))?;
        if self.weights.len() != expected_w {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match out_dim * in_dim ({} * {})",
                self.weights.len(),
                self.out_dim,
                self.in_dim
            )));
        }
        if self.biases.len() != self.out_dim {
            return Err(Error::InvalidData(format!(
                "biases length {} does not match out_dim {}",
                self.biases.len(),
                self.out_dim
            )));
        }

        let act = self.activation.into_activation();
        act.validate()
            .map_err(|e| Error::InvalidData(format!("invalid activation: {e}")))?;

        if self
            .weights
            .iter()
            .chain(self.biases.iter())
            .any(|v| !v.is_finite())
        {
            return Err(Error::InvalidData(
                "layer parameters must contain only finite values".to_owned(),
            ));
        }

        Ok(())
    }
}

impl Bpmll {
    /// Serialize the trained model to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        let ser = SerializedModel::from_model(self)?;
        serde_json::to_string_pretty(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Parse a model from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedModel = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse model json: {e}")))?;
        ser.into_model()
    }

    /// Save the trained model to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s)
            .map_err(|e| Error::InvalidData(format!("failed to write {}: {e}", p.display())))?;
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dataset;

    fn trained_model() -> Bpmll {
        let data = Dataset::from_rows(
            &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.2, 0.9]],
            &[vec![1.0, -1.0], vec![-1.0, 1.0], vec![1.0, -1.0]],
        )
        .unwrap();
        let mut model = Bpmll::new(TrainConfig {
            hidden_layers: vec![3],
            epochs: 20,
            seed: 5,
            ..TrainConfig::default()
        })
        .unwrap();
        model.fit(&data).unwrap();
        model
    }

    #[test]
    fn untrained_model_cannot_be_serialized() {
        let model = Bpmll::new(TrainConfig::default()).unwrap();
        assert!(matches!(
            model.to_json_string_pretty(),
            Err(Error::NotTrained)
        ));
    }

    #[test]
    fn json_roundtrip_preserves_predictions() {
        let mut model = trained_model();
        let json = model.to_json_string_pretty().unwrap();

        let mut loaded = Bpmll::from_json_str(&json).unwrap();
        let input = [0.4, 0.6];
        assert_eq!(
            model.predict(&input).unwrap(),
            loaded.predict(&input).unwrap()
        );
    }

    #[test]
    fn save_and_load_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut model = trained_model();
        model.save_json(&path).unwrap();

        let mut loaded = Bpmll::load_json(&path).unwrap();
        let input = [-0.3, 1.2];
        assert_eq!(
            model.predict(&input).unwrap(),
            loaded.predict(&input).unwrap()
        );
    }

    #[test]
    fn rejects_unknown_version() {
        let bad = r#"{"format_version":999,"bias_input":1.0,"layers":[],"threshold_coeffs":[],"scaler":null}"#;
        let err = Bpmll::from_json_str(bad).unwrap_err();
        assert!(format!("{err}").contains("format_version"));
    }

    #[test]
    fn rejects_mismatched_threshold_length() {
        let mut model = trained_model();
        let mut ser = SerializedModel::from_model(&model).unwrap();
        ser.threshold_coeffs.push(0.0);
        assert!(ser.into_model().is_err());
        // The original stays usable.
        assert!(model.predict(&[0.0, 0.0]).is_ok());
    }
}
