//! A multi-label neural network crate.
//!
//! `bpmll` is a small-core, from-scratch implementation of a dense
//! feed-forward network trained for multi-label classification: instead of
//! squared error, training minimizes a pairwise ranking surrogate loss that
//! penalizes every irrelevant label ranked above (or too close to) a relevant
//! one, and a least-squares-fitted threshold function turns per-label
//! confidences into a bipartition at inference time.
//!
//! # Design goals
//!
//! - Reproducibility: every stochastic step (weight init, epoch shuffling)
//!   flows through one seeded RNG, so identical seeds give identical models.
//! - Clear contracts: shapes and hyperparameters are validated at the API
//!   boundary; invalid values error, they are never clamped.
//! - Predictable performance: the per-example hot path reuses buffers
//!   (network caches, gradient workspace) instead of allocating.
//!
//! # Layers of API
//!
//! - High-level: [`Bpmll`] with [`Bpmll::fit`] / [`Bpmll::predict`] — the
//!   full pipeline of normalization, training, and threshold calibration.
//! - Low-level: [`NeuralNet`] + [`Backprop::learn`] for driving single
//!   gradient-descent steps yourself, and the [`loss`] functions if you only
//!   want the criterion.
//!
//! # Data layout
//!
//! - Scalars are `f64`.
//! - [`Dataset`] stores examples contiguously in row-major layout.
//! - Layer weights are row-major with shape `(out_dim, in_dim)`.
//! - Label targets are encoded +1.0 (relevant) / -1.0 (irrelevant).
//!
//! # Quick start
//!
//! ```rust
//! use bpmll::{Bpmll, Dataset, TrainConfig};
//!
//! # fn main() -> bpmll::Result<()> {
//! let xs = vec![
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ];
//! let ys = vec![
//!     vec![1.0, -1.0],
//!     vec![1.0, -1.0],
//!     vec![-1.0, 1.0],
//!     vec![-1.0, 1.0],
//! ];
//! let train = Dataset::from_rows(&xs, &ys)?;
//!
//! let mut model = Bpmll::new(TrainConfig {
//!     hidden_layers: vec![4],
//!     epochs: 100,
//!     seed: 0,
//!     ..TrainConfig::default()
//! })?;
//! model.fit(&train)?;
//!
//! let prediction = model.predict(&[1.0, 0.0])?;
//! assert_eq!(prediction.bipartition().len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Driving training yourself (advanced)
//!
//! ```rust
//! use bpmll::{Activation, Backprop, DataPair, NeuralNet};
//!
//! # fn main() -> bpmll::Result<()> {
//! let mut net = NeuralNet::new_with_seed(&[2, 4, 3], 1.0, Activation::Tanh, 0)?;
//! let mut learner = Backprop::new(1e-5)?;
//!
//! let pair = DataPair::new(&[-1.0, 1.0], &[1.0, -1.0, 1.0]);
//! let before = learner.learn(&mut net, &pair, 0.05)?;
//! let after = learner.learn(&mut net, &pair, 0.05)?;
//! assert!(after < before);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod backprop;
pub mod data;
pub mod error;
pub mod layer;
pub mod loss;
pub(crate) mod lstsq;
pub mod model;
pub mod net;
pub mod output;
pub mod scale;
pub mod threshold;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::Activation;
pub use backprop::Backprop;
pub use data::{DataPair, Dataset};
pub use error::{Error, Result};
pub use layer::Layer;
pub use model::{Bpmll, FitReport, TrainConfig};
pub use net::NeuralNet;
pub use output::MultiLabelOutput;
pub use scale::FeatureScaler;
pub use threshold::ThresholdFn;
