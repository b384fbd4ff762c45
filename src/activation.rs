//! Activation functions.
//!
//! A weighted layer computes a pre-activation value `z = W x + b * bias_input`
//! and then applies an activation function element-wise: `y = activation(z)`.
//!
//! Two derivative entry points exist on purpose:
//!
//! - [`Activation::derivative`] is the declared analytic derivative and fails
//!   outside its defined domain (e.g. ReLU on the negative reals). It is part
//!   of the public contract and is never called by the training path.
//! - `Activation::grad` (crate-internal) is total: given the cached
//!   pre-activation `z` and output `y` it returns the subgradient the learning
//!   rule uses, so backprop cannot hit an undefined point.
//!
//! Output-range bounds (`min`/`max`) are fixed per value; ELU's lower bound is
//! `-slope` and is recomputed from the variant's own slope, so there is no
//! shared mutable bound state between instances.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Element-wise activation function.
pub enum Activation {
    Sigmoid,
    Tanh,
    ReLU,
    /// Parametric ReLU: `x` for `x >= 0`, `slope * x` otherwise.
    PReLU { slope: f64 },
    /// Exponential linear unit: `x` for `x >= 0`, `slope * (e^x - 1)` otherwise.
    Elu { slope: f64 },
    /// Gaussian bump: `e^(-x^2)`.
    Gaussian,
    Linear,
}

impl Activation {
    /// Validate activation parameters.
    pub fn validate(self) -> Result<()> {
        match self {
            Activation::PReLU { slope } => {
                if !(slope.is_finite() && (0.0..=1.0).contains(&slope)) {
                    return Err(Error::InvalidConfig(format!(
                        "PReLU slope must be finite and in [0, 1], got {slope}"
                    )));
                }
            }
            Activation::Elu { slope } => {
                if !(slope.is_finite() && slope > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "ELU slope must be finite and > 0, got {slope}"
                    )));
                }
            }
            Activation::Sigmoid
            | Activation::Tanh
            | Activation::ReLU
            | Activation::Gaussian
            | Activation::Linear => {}
        }

        Ok(())
    }

    /// Short name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::ReLU => "relu",
            Activation::PReLU { .. } => "prelu",
            Activation::Elu { .. } => "elu",
            Activation::Gaussian => "gaussian",
            Activation::Linear => "linear",
        }
    }

    /// Apply the activation. Total on the reals.
    #[inline]
    pub fn activate(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
            Activation::ReLU => x.max(0.0),
            Activation::PReLU { slope } => {
                if x >= 0.0 {
                    x
                } else {
                    slope * x
                }
            }
            Activation::Elu { slope } => {
                if x >= 0.0 {
                    x
                } else {
                    slope * (x.exp() - 1.0)
                }
            }
            Activation::Gaussian => (-x * x).exp(),
            Activation::Linear => x,
        }
    }

    /// Analytic derivative at `x`.
    ///
    /// Fails with [`Error::DerivativeUndefined`] outside the declared domain:
    /// ReLU at `x < 0`, PReLU and ELU at `x >= 0`. Callers that cannot prove
    /// `x` lies in the defined domain must not call this.
    #[inline]
    pub fn derivative(self, x: f64) -> Result<f64> {
        match self {
            Activation::Sigmoid => {
                let y = sigmoid(x);
                Ok(y * (1.0 - y))
            }
            Activation::Tanh => {
                let y = x.tanh();
                Ok(1.0 - y * y)
            }
            Activation::ReLU => {
                if x >= 0.0 {
                    Ok(1.0)
                } else {
                    Err(Error::DerivativeUndefined {
                        activation: self.name(),
                        x,
                    })
                }
            }
            Activation::PReLU { slope } => {
                if x < 0.0 {
                    Ok(slope)
                } else {
                    Err(Error::DerivativeUndefined {
                        activation: self.name(),
                        x,
                    })
                }
            }
            Activation::Elu { slope } => {
                if x < 0.0 {
                    Ok(slope * x.exp())
                } else {
                    Err(Error::DerivativeUndefined {
                        activation: self.name(),
                        x,
                    })
                }
            }
            Activation::Gaussian => Ok(-2.0 * x * (-x * x).exp()),
            Activation::Linear => Ok(1.0),
        }
    }

    /// Lower bound of the output range.
    #[inline]
    pub fn min(self) -> f64 {
        match self {
            Activation::Sigmoid => 0.0,
            Activation::Tanh => -1.0,
            Activation::ReLU => 0.0,
            Activation::PReLU { slope } => {
                if slope == 0.0 {
                    0.0
                } else {
                    f64::NEG_INFINITY
                }
            }
            Activation::Elu { slope } => -slope,
            Activation::Gaussian => 0.0,
            Activation::Linear => f64::NEG_INFINITY,
        }
    }

    /// Upper bound of the output range.
    #[inline]
    pub fn max(self) -> f64 {
        match self {
            Activation::Sigmoid => 1.0,
            Activation::Tanh => 1.0,
            Activation::ReLU
            | Activation::PReLU { .. }
            | Activation::Elu { .. }
            | Activation::Linear => f64::INFINITY,
            Activation::Gaussian => 1.0,
        }
    }

    /// Returns true if the output range is bounded on both sides.
    ///
    /// Threshold calibration substitutes the range bounds for examples whose
    /// labels are all relevant or all irrelevant, so the network activation
    /// of a trainable model must satisfy this.
    #[inline]
    pub fn has_finite_bounds(self) -> bool {
        self.min().is_finite() && self.max().is_finite()
    }

    /// Total derivative used by backprop, expressed in terms of the cached
    /// pre-activation `z` and output `y = activate(z)`.
    ///
    /// Where the analytic derivative is one-sided or undefined this returns
    /// the conventional subgradient.
    #[inline]
    pub(crate) fn grad(self, z: f64, y: f64) -> f64 {
        match self {
            Activation::Sigmoid => y * (1.0 - y),
            Activation::Tanh => 1.0 - y * y,
            Activation::ReLU => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::PReLU { slope } => {
                if z > 0.0 {
                    1.0
                } else {
                    slope
                }
            }
            Activation::Elu { slope } => {
                if z > 0.0 {
                    1.0
                } else {
                    // d/dz slope * (e^z - 1) = slope * e^z = y + slope
                    y + slope
                }
            }
            Activation::Gaussian => -2.0 * z * y,
            Activation::Linear => 1.0,
        }
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn all_variants() -> Vec<Activation> {
        vec![
            Activation::Sigmoid,
            Activation::Tanh,
            Activation::ReLU,
            Activation::PReLU { slope: 0.1 },
            Activation::Elu { slope: 0.3 },
            Activation::Gaussian,
            Activation::Linear,
        ]
    }

    #[test]
    fn outputs_stay_inside_declared_bounds() {
        let xs = [-1e6, -25.0, -3.0, -0.5, 0.0, 0.5, 3.0, 25.0, 1e6];
        for act in all_variants() {
            for &x in &xs {
                let y = act.activate(x);
                assert!(
                    act.min() <= y && y <= act.max(),
                    "{}({x}) = {y} escaped [{}, {}]",
                    act.name(),
                    act.min(),
                    act.max()
                );
            }
        }
    }

    #[test]
    fn slope_parameters_are_validated() {
        assert!(Activation::PReLU { slope: f64::NAN }.validate().is_err());
        assert!(Activation::PReLU { slope: -0.1 }.validate().is_err());
        assert!(Activation::PReLU { slope: 1.5 }.validate().is_err());
        assert!(Activation::PReLU { slope: 0.25 }.validate().is_ok());

        assert!(Activation::Elu { slope: 0.0 }.validate().is_err());
        assert!(Activation::Elu { slope: -1.0 }.validate().is_err());
        assert!(Activation::Elu { slope: 1.0 }.validate().is_ok());
    }

    #[test]
    fn elu_lower_bound_follows_slope() {
        assert_relative_eq!(Activation::Elu { slope: 0.5 }.min(), -0.5);
        assert_relative_eq!(Activation::Elu { slope: 2.0 }.min(), -2.0);
    }

    #[test]
    fn derivative_fails_outside_defined_domain() {
        assert!(Activation::ReLU.derivative(-1.0).is_err());
        assert!(Activation::ReLU.derivative(0.0).is_ok());

        assert!(Activation::PReLU { slope: 0.1 }.derivative(1.0).is_err());
        assert!(Activation::PReLU { slope: 0.1 }.derivative(-1.0).is_ok());

        assert!(Activation::Elu { slope: 0.5 }.derivative(0.0).is_err());
        assert!(Activation::Elu { slope: 0.5 }.derivative(-2.0).is_ok());

        let err = Activation::ReLU.derivative(-2.0).unwrap_err();
        assert!(format!("{err}").contains("not defined"));
    }

    #[test]
    fn smooth_derivatives_match_finite_differences() {
        let smooth = [
            Activation::Sigmoid,
            Activation::Tanh,
            Activation::Gaussian,
            Activation::Linear,
        ];
        let eps = 1e-6;
        for act in smooth {
            for &x in &[-2.0, -0.3, 0.0, 0.7, 1.9] {
                let numeric = (act.activate(x + eps) - act.activate(x - eps)) / (2.0 * eps);
                let analytic = act.derivative(x).unwrap();
                assert_relative_eq!(analytic, numeric, max_relative = 1e-4, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn grad_agrees_with_derivative_where_both_exist() {
        let cases = [
            (Activation::Sigmoid, 0.4),
            (Activation::Tanh, -0.8),
            (Activation::Gaussian, 1.2),
            (Activation::Linear, 5.0),
            (Activation::PReLU { slope: 0.2 }, -1.5),
            (Activation::Elu { slope: 0.7 }, -0.9),
        ];
        for (act, z) in cases {
            let y = act.activate(z);
            assert_relative_eq!(act.grad(z, y), act.derivative(z).unwrap(), epsilon = 1e-12);
        }
    }
}
