//! Pairwise ranking surrogate loss.
//!
//! The training criterion is not squared error. For one example, let `C` be
//! the label indices whose target is +1 (relevant) and `C̄` the rest. The
//! loss is
//!
//! ```text
//! E = (1 / (|C| * |C̄|)) * Σ_{k in C} Σ_{l in C̄} exp(-(out[k] - out[l]))
//! ```
//!
//! which penalizes every (relevant, irrelevant) pair whose confidences are
//! ordered wrongly or too close. Its gradient with respect to the outputs is
//!
//! ```text
//! dE/d out[j] = -(1/|C||C̄|) * Σ_{l in C̄} exp(-(out[j] - out[l]))   for j in C
//! dE/d out[j] = +(1/|C||C̄|) * Σ_{k in C} exp(-(out[k] - out[j]))   for j in C̄
//! ```
//!
//! Examples with no relevant or no irrelevant labels carry no ranking
//! information: their loss is 0 and their gradient contribution is zero.

/// Ranking loss value for one example.
///
/// Shape contract: `outputs.len() == targets.len()`; targets are +1/-1.
#[inline]
pub fn rank_loss(outputs: &[f64], targets: &[f64]) -> f64 {
    assert_eq!(
        outputs.len(),
        targets.len(),
        "outputs len {} does not match targets len {}",
        outputs.len(),
        targets.len()
    );
    debug_assert!(targets.iter().all(|&t| t == 1.0 || t == -1.0));

    let relevant = targets.iter().filter(|&&t| t > 0.0).count();
    let irrelevant = targets.len() - relevant;
    if relevant == 0 || irrelevant == 0 {
        return 0.0;
    }

    let mut sum = 0.0;
    for k in 0..outputs.len() {
        if targets[k] <= 0.0 {
            continue;
        }
        for l in 0..outputs.len() {
            if targets[l] > 0.0 {
                continue;
            }
            sum += (-(outputs[k] - outputs[l])).exp();
        }
    }
    sum / (relevant * irrelevant) as f64
}

/// Ranking loss + gradient w.r.t. `outputs` for one example.
///
/// Writes `dE/d(outputs)` into `d_outputs` (overwrite semantics) and returns
/// the loss. Degenerate examples produce zero loss and a zero gradient.
///
/// Shape contract:
/// - `outputs.len() == targets.len()`
/// - `outputs.len() == d_outputs.len()`
#[inline]
pub fn rank_loss_backward(outputs: &[f64], targets: &[f64], d_outputs: &mut [f64]) -> f64 {
    assert_eq!(
        outputs.len(),
        targets.len(),
        "outputs len {} does not match targets len {}",
        outputs.len(),
        targets.len()
    );
    assert_eq!(
        outputs.len(),
        d_outputs.len(),
        "outputs len {} does not match d_outputs len {}",
        outputs.len(),
        d_outputs.len()
    );
    debug_assert!(targets.iter().all(|&t| t == 1.0 || t == -1.0));

    d_outputs.fill(0.0);

    let relevant = targets.iter().filter(|&&t| t > 0.0).count();
    let irrelevant = targets.len() - relevant;
    if relevant == 0 || irrelevant == 0 {
        return 0.0;
    }
    let inv = 1.0 / (relevant * irrelevant) as f64;

    let mut sum = 0.0;
    for k in 0..outputs.len() {
        if targets[k] <= 0.0 {
            continue;
        }
        for l in 0..outputs.len() {
            if targets[l] > 0.0 {
                continue;
            }
            let e = (-(outputs[k] - outputs[l])).exp();
            sum += e;
            d_outputs[k] -= e;
            d_outputs[l] += e;
        }
    }

    for d in d_outputs.iter_mut() {
        *d *= inv;
    }
    sum * inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn perfectly_separated_outputs_have_small_loss() {
        let good = rank_loss(&[1.0, -1.0], &[1.0, -1.0]);
        let bad = rank_loss(&[-1.0, 1.0], &[1.0, -1.0]);
        assert!(good < bad);
        assert_relative_eq!(good, (-2.0_f64).exp());
        assert_relative_eq!(bad, 2.0_f64.exp());
    }

    #[test]
    fn loss_is_normalized_by_pair_count() {
        // Two relevant, two irrelevant, all outputs equal: every pair
        // contributes exp(0) = 1, so the mean is exactly 1.
        let outputs = [0.3, 0.3, 0.3, 0.3];
        let targets = [1.0, 1.0, -1.0, -1.0];
        assert_relative_eq!(rank_loss(&outputs, &targets), 1.0);
    }

    #[test]
    fn degenerate_examples_have_zero_loss_and_gradient() {
        let outputs = [0.5, -0.2, 0.1];
        let mut d = [9.0; 3];

        let all_relevant = [1.0, 1.0, 1.0];
        assert_eq!(rank_loss(&outputs, &all_relevant), 0.0);
        assert_eq!(rank_loss_backward(&outputs, &all_relevant, &mut d), 0.0);
        assert_eq!(d, [0.0; 3]);

        let all_irrelevant = [-1.0, -1.0, -1.0];
        assert_eq!(rank_loss(&outputs, &all_irrelevant), 0.0);
        assert_eq!(rank_loss_backward(&outputs, &all_irrelevant, &mut d), 0.0);
        assert_eq!(d, [0.0; 3]);
    }

    #[test]
    fn backward_returns_same_loss_as_forward() {
        let outputs = [0.4, -0.9, 0.2, -0.1];
        let targets = [1.0, -1.0, -1.0, 1.0];
        let mut d = [0.0; 4];
        assert_relative_eq!(
            rank_loss_backward(&outputs, &targets, &mut d),
            rank_loss(&outputs, &targets)
        );
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let outputs = [0.4, -0.9, 0.2, -0.1, 0.7];
        let targets = [1.0, -1.0, -1.0, 1.0, -1.0];
        let mut d = [0.0; 5];
        rank_loss_backward(&outputs, &targets, &mut d);

        let eps = 1e-6;
        for i in 0..outputs.len() {
            let mut plus = outputs;
            plus[i] += eps;
            let mut minus = outputs;
            minus[i] -= eps;
            let numeric = (rank_loss(&plus, &targets) - rank_loss(&minus, &targets)) / (2.0 * eps);
            assert_abs_diff_eq!(d[i], numeric, epsilon = 1e-8);
        }
    }

    #[test]
    fn gradient_pushes_relevant_up_and_irrelevant_down() {
        let outputs = [0.0, 0.0];
        let targets = [1.0, -1.0];
        let mut d = [0.0; 2];
        rank_loss_backward(&outputs, &targets, &mut d);
        // Descending along -d raises the relevant output and lowers the
        // irrelevant one.
        assert!(d[0] < 0.0);
        assert!(d[1] > 0.0);
    }
}
