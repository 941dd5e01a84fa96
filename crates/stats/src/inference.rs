//! Inference primitives for A/B comparison of backtest runs.
//!
//! P-values are computed against the standard normal distribution in both
//! tests. For the t-test this is a normal approximation of the t
//! distribution; backtests with enough trades to say anything meaningful
//! have enough degrees of freedom that the difference does not matter.

/// Error function via the Abramowitz and Stegun 7.1.26 polynomial.
/// Maximum absolute error 1.5e-7, more than enough for p-values.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Two-sided p-value for a standard normal statistic.
fn two_sided_p(z: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

/// Two-proportion z-test with pooled proportion.
///
/// Returns the two-sided p-value for "the win rates differ". Degenerate
/// inputs (an empty sample, or a pooled proportion of exactly 0 or 1, where
/// the standard error collapses) return 1.0: no evidence either way.
pub fn two_proportion_z_test(
    successes_a: usize,
    trials_a: usize,
    successes_b: usize,
    trials_b: usize,
) -> f64 {
    if trials_a == 0 || trials_b == 0 {
        return 1.0;
    }

    let na = trials_a as f64;
    let nb = trials_b as f64;
    let pa = successes_a as f64 / na;
    let pb = successes_b as f64 / nb;
    let pooled = (successes_a + successes_b) as f64 / (na + nb);

    let se = (pooled * (1.0 - pooled) * (1.0 / na + 1.0 / nb)).sqrt();
    if se == 0.0 {
        return 1.0;
    }

    two_sided_p((pa - pb) / se)
}

/// Pooled-variance two-sample t-test with a normal p-value.
///
/// Returns the two-sided p-value for "the sample means differ". Samples
/// with fewer than two observations, or zero pooled variance, return 1.0.
pub fn two_sample_t_test(sample_a: &[f64], sample_b: &[f64]) -> f64 {
    if sample_a.len() < 2 || sample_b.len() < 2 {
        return 1.0;
    }

    let na = sample_a.len() as f64;
    let nb = sample_b.len() as f64;
    let mean_a = sample_a.iter().sum::<f64>() / na;
    let mean_b = sample_b.iter().sum::<f64>() / nb;

    let ss_a: f64 = sample_a.iter().map(|v| (v - mean_a).powi(2)).sum();
    let ss_b: f64 = sample_b.iter().map(|v| (v - mean_b).powi(2)).sum();
    let pooled_variance = (ss_a + ss_b) / (na + nb - 2.0);

    let se = (pooled_variance * (1.0 / na + 1.0 / nb)).sqrt();
    if se == 0.0 {
        return 1.0;
    }

    two_sided_p((mean_a - mean_b) / se)
}
