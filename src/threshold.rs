//! Decision-threshold calibration.
//!
//! After training, each training example yields a confidence vector and an
//! "ideal" threshold that would bipartition it correctly: the midpoint
//! between the lowest relevant-label confidence and the highest
//! irrelevant-label confidence. A linear function from confidence vectors to
//! thresholds is then fitted by least squares; at inference it maps a new
//! example's confidences to its decision threshold.
//!
//! Degenerate examples substitute the activation's output-range bounds: with
//! no irrelevant labels the lower bound stands in for the highest irrelevant
//! confidence, with no relevant labels the upper bound stands in for the
//! lowest relevant confidence.

use crate::{lstsq, Error, Result};

/// Ideal decision threshold for one training example.
///
/// `act_min`/`act_max` are the output-range bounds of the network activation
/// and must be finite.
pub fn ideal_threshold(confidences: &[f64], targets: &[f64], act_min: f64, act_max: f64) -> f64 {
    debug_assert_eq!(confidences.len(), targets.len());
    debug_assert!(act_min.is_finite() && act_max.is_finite());

    let mut min_relevant = f64::INFINITY;
    let mut max_irrelevant = f64::NEG_INFINITY;
    for (&c, &t) in confidences.iter().zip(targets) {
        if t > 0.0 {
            if c < min_relevant {
                min_relevant = c;
            }
        } else if c > max_irrelevant {
            max_irrelevant = c;
        }
    }

    if min_relevant == f64::INFINITY {
        // No relevant labels: the threshold belongs above every confidence.
        0.5 * (max_irrelevant + act_max)
    } else if max_irrelevant == f64::NEG_INFINITY {
        // No irrelevant labels: the threshold belongs below every confidence.
        0.5 * (min_relevant + act_min)
    } else {
        0.5 * (min_relevant + max_irrelevant)
    }
}

/// Fitted linear threshold predictor with `num_labels + 1` coefficients
/// (one per label confidence, intercept last).
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdFn {
    coeffs: Vec<f64>,
}

impl ThresholdFn {
    /// Least-squares fit mapping confidence rows to ideal thresholds.
    ///
    /// Solved via the normal equations with a tiny ridge term on the
    /// diagonal, so rank-deficient systems (fewer examples than labels,
    /// duplicated confidence columns) stay solvable.
    pub fn fit(rows: &[Vec<f64>], ideals: &[f64]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidData(
                "threshold fit needs at least one example".to_owned(),
            ));
        }
        if rows.len() != ideals.len() {
            return Err(Error::InvalidShape(format!(
                "confidence rows {} do not match ideals {}",
                rows.len(),
                ideals.len()
            )));
        }
        let num_labels = rows[0].len();
        if num_labels == 0 {
            return Err(Error::InvalidData(
                "confidence rows must not be empty".to_owned(),
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != num_labels {
                return Err(Error::InvalidShape(format!(
                    "confidence row {i} has len {}, expected {num_labels}",
                    row.len()
                )));
            }
        }

        // Normal equations for the design matrix [confidences | 1].
        let p = num_labels + 1;
        let mut ata = vec![0.0; p * p];
        let mut aty = vec![0.0; p];
        for (row, &y) in rows.iter().zip(ideals) {
            for i in 0..p {
                let xi = if i < num_labels { row[i] } else { 1.0 };
                aty[i] += xi * y;
                for j in 0..p {
                    let xj = if j < num_labels { row[j] } else { 1.0 };
                    ata[i * p + j] += xi * xj;
                }
            }
        }

        const RIDGE: f64 = 1e-8;
        for i in 0..p {
            ata[i * p + i] += RIDGE;
        }

        let coeffs = lstsq::solve(ata, aty, p)?;
        Ok(Self { coeffs })
    }

    /// Rebuild from stored coefficients (used by model deserialization).
    pub fn from_coeffs(coeffs: Vec<f64>) -> Result<Self> {
        if coeffs.len() < 2 {
            return Err(Error::InvalidShape(format!(
                "threshold function needs at least 2 coefficients, got {}",
                coeffs.len()
            )));
        }
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidData(
                "threshold coefficients must be finite".to_owned(),
            ));
        }
        Ok(Self { coeffs })
    }

    /// Number of labels this function was fitted for.
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.coeffs.len() - 1
    }

    #[inline]
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Decision threshold for one confidence vector.
    ///
    /// Shape contract: `confidences.len() == self.num_labels()`.
    #[inline]
    pub fn threshold(&self, confidences: &[f64]) -> f64 {
        debug_assert_eq!(confidences.len(), self.num_labels());

        let mut t = self.coeffs[self.coeffs.len() - 1];
        for (&c, &w) in confidences.iter().zip(&self.coeffs) {
            t = w.mul_add(c, t);
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn midpoint_between_label_groups() {
        let t = ideal_threshold(&[0.8, -0.4, 0.6], &[1.0, -1.0, 1.0], -1.0, 1.0);
        // Lowest relevant 0.6, highest irrelevant -0.4.
        assert_relative_eq!(t, 0.1);
    }

    #[test]
    fn degenerate_examples_use_activation_bounds() {
        let all_relevant = ideal_threshold(&[0.8, 0.2], &[1.0, 1.0], -1.0, 1.0);
        assert_relative_eq!(all_relevant, 0.5 * (0.2 + -1.0));

        let all_irrelevant = ideal_threshold(&[-0.8, -0.2], &[-1.0, -1.0], -1.0, 1.0);
        assert_relative_eq!(all_irrelevant, 0.5 * (-0.2 + 1.0));
    }

    #[test]
    fn coefficient_count_is_labels_plus_one() {
        let rows = vec![
            vec![0.9, -0.8, 0.1],
            vec![-0.7, 0.6, 0.2],
            vec![0.3, 0.4, -0.9],
            vec![0.1, -0.2, 0.5],
        ];
        let ideals = vec![0.0, 0.1, -0.1, 0.2];
        let f = ThresholdFn::fit(&rows, &ideals).unwrap();
        assert_eq!(f.coeffs().len(), 4);
        assert_eq!(f.num_labels(), 3);
    }

    #[test]
    fn recovers_an_exact_linear_relationship() {
        // thresholds generated by t = 0.5*c0 - 0.25*c1 + 0.1
        let rows = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![-1.0, 0.5],
        ];
        let ideals: Vec<f64> = rows.iter().map(|r| 0.5 * r[0] - 0.25 * r[1] + 0.1).collect();

        let f = ThresholdFn::fit(&rows, &ideals).unwrap();
        assert_relative_eq!(f.coeffs()[0], 0.5, epsilon = 1e-5);
        assert_relative_eq!(f.coeffs()[1], -0.25, epsilon = 1e-5);
        assert_relative_eq!(f.coeffs()[2], 0.1, epsilon = 1e-5);

        for (row, &t) in rows.iter().zip(&ideals) {
            assert_relative_eq!(f.threshold(row), t, epsilon = 1e-5);
        }
    }

    #[test]
    fn rank_deficient_fit_still_solves() {
        // One example, three labels: heavily underdetermined.
        let rows = vec![vec![0.5, -0.5, 0.0]];
        let ideals = vec![0.1];
        let f = ThresholdFn::fit(&rows, &ideals).unwrap();
        assert_relative_eq!(f.threshold(&rows[0]), 0.1, epsilon = 1e-3);
    }

    #[test]
    fn fit_rejects_mismatched_shapes() {
        assert!(ThresholdFn::fit(&[], &[]).is_err());
        assert!(ThresholdFn::fit(&[vec![0.1]], &[0.1, 0.2]).is_err());
        assert!(ThresholdFn::fit(&[vec![0.1], vec![0.1, 0.2]], &[0.1, 0.2]).is_err());
    }
}
