//! Binomial probabilities and odds conversions
//!
//! Exact mass: P(X = k) = C(n, k) × p^k × (1 - p)^(n - k)
//! Evaluated in log space so trial counts in the hundreds stay finite.
//! Cumulative tails are the sum of the exact mass over i = 0..=n, bucketed
//! by comparison with k.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The four cumulative tails of a binomial distribution relative to `k`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialTails {
    /// P(X < k)
    pub lt: f64,
    /// P(X <= k)
    pub le: f64,
    /// P(X > k)
    pub gt: f64,
    /// P(X >= k)
    pub ge: f64,
}

impl BinomialTails {
    /// P(X = k)
    pub fn eq(&self) -> f64 {
        self.le - self.lt
    }
}

fn check_domain(trials: u32, successes: u32, p: f64) -> EngineResult<()> {
    if successes > trials {
        return Err(EngineError::Domain(format!(
            "successes ({successes}) must not exceed trials ({trials})"
        )));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(EngineError::Domain(format!(
            "probability must lie in [0, 1], got {p}"
        )));
    }
    Ok(())
}

/// ln C(n, k)
fn ln_choose(n: u32, k: u32) -> f64 {
    let k = k.min(n - k);
    (1..=k)
        .map(|i| ((n - k + i) as f64).ln() - (i as f64).ln())
        .sum()
}

fn mass(trials: u32, successes: u32, p: f64) -> f64 {
    if p == 0.0 {
        return if successes == 0 { 1.0 } else { 0.0 };
    }
    if p == 1.0 {
        return if successes == trials { 1.0 } else { 0.0 };
    }
    let failures = trials - successes;
    let ln = ln_choose(trials, successes)
        + successes as f64 * p.ln()
        + failures as f64 * (1.0 - p).ln();
    ln.exp()
}

/// Exact binomial probability mass P(X = successes)
pub fn exact_binomial(trials: u32, successes: u32, p: f64) -> EngineResult<f64> {
    check_domain(trials, successes, p)?;
    Ok(mass(trials, successes, p))
}

/// Cumulative tail probabilities relative to `successes`
pub fn cumulative_binomial(trials: u32, successes: u32, p: f64) -> EngineResult<BinomialTails> {
    check_domain(trials, successes, p)?;

    let mut tails = BinomialTails {
        lt: 0.0,
        le: 0.0,
        gt: 0.0,
        ge: 0.0,
    };

    for i in 0..=trials {
        let exact = mass(trials, i, p);
        if i < successes {
            tails.lt += exact;
            tails.le += exact;
        } else if i == successes {
            tails.le += exact;
            tails.ge += exact;
        } else {
            tails.gt += exact;
            tails.ge += exact;
        }
    }

    Ok(tails)
}

/// Round to 4 decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Implied probability of a decimal quote, rounded to 4 dp
pub fn decimal_odds_to_probability(odds: f64) -> EngineResult<f64> {
    if !(odds > 0.0) {
        return Err(EngineError::Domain(format!(
            "decimal odds must be positive, got {odds}"
        )));
    }
    Ok(round4(1.0 / odds))
}

/// Decimal quote implied by a probability, rounded to 4 dp
pub fn probability_to_decimal_odds(p: f64) -> EngineResult<f64> {
    if !(p > 0.0 && p <= 1.0) {
        return Err(EngineError::Domain(format!(
            "probability must lie in (0, 1], got {p}"
        )));
    }
    Ok(round4(1.0 / p))
}

fn check_fraction(numerator: u32, denominator: u32) -> EngineResult<()> {
    if numerator == 0 && denominator == 0 {
        return Err(EngineError::Domain(
            "fractional odds 0/0 are undefined".to_string(),
        ));
    }
    Ok(())
}

/// Implied probability of fractional odds `numerator/denominator` (e.g. 5/2)
pub fn fractional_odds_to_probability(numerator: u32, denominator: u32) -> EngineResult<f64> {
    check_fraction(numerator, denominator)?;
    let (n, d) = (numerator as f64, denominator as f64);
    Ok(round4(d / (n + d)))
}

/// Decimal equivalent of fractional odds
pub fn fractional_odds_to_decimal(numerator: u32, denominator: u32) -> EngineResult<f64> {
    check_fraction(numerator, denominator)?;
    if denominator == 0 {
        return Err(EngineError::Domain(
            "fractional odds with a zero denominator have no decimal equivalent".to_string(),
        ));
    }
    let (n, d) = (numerator as f64, denominator as f64);
    Ok(round4((n + d) / d))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_exact_matches_hand_computation() {
        // C(10, 1) × 0.1 × 0.9^9
        let p = exact_binomial(10, 1, 0.1).unwrap();
        assert!((p - 10.0 * 0.1 * 0.9f64.powi(9)).abs() < TOL);
    }

    #[test]
    fn test_tail_identities_hold() {
        for &n in &[0u32, 1, 5, 12, 40] {
            for k in 0..=n {
                for &p in &[0.0, 0.05, 0.27, 0.5, 0.83, 1.0] {
                    let t = cumulative_binomial(n, k, p).unwrap();
                    let eq = exact_binomial(n, k, p).unwrap();
                    assert!((t.lt + eq - t.le).abs() < TOL, "n={n} k={k} p={p}");
                    assert!((t.gt + eq - t.ge).abs() < TOL, "n={n} k={k} p={p}");
                    assert!((t.le + t.gt - 1.0).abs() < TOL, "n={n} k={k} p={p}");
                }
            }
        }
    }

    #[test]
    fn test_at_least_one_matches_closed_form() {
        for n in 0..=30u32 {
            for &p in &[0.0, 0.1, 0.25, 0.3, 0.45, 0.9, 1.0] {
                let ge = cumulative_binomial(n, 1.min(n), p).unwrap().ge;
                let expected = if n == 0 { 1.0 } else { 1.0 - (1.0 - p).powi(n as i32) };
                assert!((ge - expected).abs() < TOL, "n={n} p={p}: {ge} vs {expected}");
            }
        }
    }

    #[test]
    fn test_five_trials_one_success() {
        let t = cumulative_binomial(5, 1, 0.3).unwrap();
        assert!((t.ge - 0.83193).abs() < 1e-5);
        assert!((t.lt - 0.16807).abs() < 1e-5);
    }

    #[test]
    fn test_edge_probabilities() {
        let zero = cumulative_binomial(6, 2, 0.0).unwrap();
        assert_eq!(zero.ge, 0.0);
        assert_eq!(zero.lt, 1.0);

        let one = cumulative_binomial(6, 6, 1.0).unwrap();
        assert_eq!(one.ge, 1.0);
        assert_eq!(one.lt, 0.0);
        assert_eq!(exact_binomial(6, 6, 1.0).unwrap(), 1.0);
        assert_eq!(exact_binomial(6, 5, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn test_large_trial_counts_stay_finite() {
        let t = cumulative_binomial(400, 120, 0.3).unwrap();
        assert!(t.le.is_finite());
        assert!((t.le + t.gt - 1.0).abs() < 1e-9);
        assert!(exact_binomial(400, 120, 0.3).unwrap() > 0.0);
    }

    #[test]
    fn test_out_of_domain_inputs_fail() {
        assert!(matches!(exact_binomial(3, 4, 0.5), Err(EngineError::Domain(_))));
        assert!(matches!(cumulative_binomial(3, 1, -0.1), Err(EngineError::Domain(_))));
        assert!(matches!(cumulative_binomial(3, 1, 1.5), Err(EngineError::Domain(_))));
        assert!(matches!(cumulative_binomial(3, 1, f64::NAN), Err(EngineError::Domain(_))));
    }

    #[test]
    fn test_odds_conversions() {
        assert_eq!(decimal_odds_to_probability(3.5).unwrap(), 0.2857);
        assert_eq!(probability_to_decimal_odds(0.25).unwrap(), 4.0);
        assert!(decimal_odds_to_probability(0.0).is_err());
        assert!(decimal_odds_to_probability(-2.0).is_err());
        assert!(probability_to_decimal_odds(0.0).is_err());
    }

    #[test]
    fn test_fractional_odds() {
        // 5/2 against: implied 2/7, decimal 3.5
        assert_eq!(fractional_odds_to_probability(5, 2).unwrap(), 0.2857);
        assert_eq!(fractional_odds_to_decimal(5, 2).unwrap(), 3.5);
        assert!(fractional_odds_to_probability(0, 0).is_err());
        assert!(fractional_odds_to_decimal(3, 0).is_err());
    }
}
