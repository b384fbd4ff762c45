//! Input attribute normalization.
//!
//! Numeric input attributes are mapped to [-1, 1] using the per-attribute
//! min/max observed in the training set. The fitted affine map is stored with
//! the model and reapplied verbatim at inference time, so unseen values
//! outside the training range land outside [-1, 1] rather than being clamped.

use crate::{Dataset, Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    mins: Vec<f64>,
    maxs: Vec<f64>,
}

impl FeatureScaler {
    /// Record per-attribute min/max over the training inputs.
    pub fn fit(train: &Dataset) -> Self {
        let dim = train.input_dim();
        let mut mins = vec![f64::INFINITY; dim];
        let mut maxs = vec![f64::NEG_INFINITY; dim];

        for idx in 0..train.len() {
            for (i, &v) in train.input(idx).iter().enumerate() {
                if v < mins[i] {
                    mins[i] = v;
                }
                if v > maxs[i] {
                    maxs[i] = v;
                }
            }
        }

        Self { mins, maxs }
    }

    /// Rebuild a scaler from stored bounds (used by model deserialization).
    pub fn from_bounds(mins: Vec<f64>, maxs: Vec<f64>) -> Result<Self> {
        if mins.len() != maxs.len() {
            return Err(Error::InvalidShape(format!(
                "mins len {} does not match maxs len {}",
                mins.len(),
                maxs.len()
            )));
        }
        if mins.is_empty() {
            return Err(Error::InvalidData("scaler bounds must not be empty".to_owned()));
        }
        Ok(Self { mins, maxs })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.mins.len()
    }

    #[inline]
    pub fn mins(&self) -> &[f64] {
        &self.mins
    }

    #[inline]
    pub fn maxs(&self) -> &[f64] {
        &self.maxs
    }

    /// Apply the map to one pattern, writing into `out`.
    ///
    /// Attributes that were constant in the training set map to 0.
    ///
    /// Shape contract: `input.len() == out.len() == self.dim()`.
    #[inline]
    pub fn transform(&self, input: &[f64], out: &mut [f64]) {
        debug_assert_eq!(input.len(), self.dim());
        debug_assert_eq!(out.len(), self.dim());

        for i in 0..input.len() {
            let range = self.maxs[i] - self.mins[i];
            out[i] = if range > 0.0 {
                2.0 * (input[i] - self.mins[i]) / range - 1.0
            } else {
                0.0
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn toy_dataset() -> Dataset {
        Dataset::from_rows(
            &[vec![0.0, 10.0], vec![4.0, 10.0], vec![2.0, 10.0]],
            &[vec![1.0], vec![-1.0], vec![1.0]],
        )
        .unwrap()
    }

    #[test]
    fn maps_training_range_to_unit_interval() {
        let scaler = FeatureScaler::fit(&toy_dataset());
        let mut out = [0.0; 2];

        scaler.transform(&[0.0, 10.0], &mut out);
        assert_relative_eq!(out[0], -1.0);
        scaler.transform(&[4.0, 10.0], &mut out);
        assert_relative_eq!(out[0], 1.0);
        scaler.transform(&[2.0, 10.0], &mut out);
        assert_relative_eq!(out[0], 0.0);
    }

    #[test]
    fn constant_attributes_map_to_zero() {
        let scaler = FeatureScaler::fit(&toy_dataset());
        let mut out = [0.0; 2];
        scaler.transform(&[1.0, 10.0], &mut out);
        assert_relative_eq!(out[1], 0.0);
    }

    #[test]
    fn out_of_range_values_extrapolate_instead_of_clamping() {
        let scaler = FeatureScaler::fit(&toy_dataset());
        let mut out = [0.0; 2];
        scaler.transform(&[8.0, 10.0], &mut out);
        assert_relative_eq!(out[0], 3.0);
        scaler.transform(&[-4.0, 10.0], &mut out);
        assert_relative_eq!(out[0], -3.0);
    }
}
