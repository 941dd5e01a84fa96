//! A/B evaluation of strategy variants: inference primitives and the
//! metric-by-metric comparator over two finished backtest runs.

pub mod comparator;
pub mod inference;

pub use comparator::{
    compare, ComparisonReport, Confidence, MetricComparison, OverallAssessment, Winner, ALPHA,
};
pub use inference::{normal_cdf, two_proportion_z_test, two_sample_t_test};

use backtest::BacktestEngine;
use common::{BacktestConfig, CandleSource, Result};

/// Run both variants over the same candle source and compare the results.
///
/// The two runs are independent (each owns its equity tracker) and execute
/// concurrently. Equivalent to two `BacktestEngine::run` calls followed by
/// [`compare`].
pub async fn compare_runs(
    config_a: BacktestConfig,
    config_b: BacktestConfig,
    source: &dyn CandleSource,
) -> Result<ComparisonReport> {
    let engine_a = BacktestEngine::new(config_a)?;
    let engine_b = BacktestEngine::new(config_b)?;

    let (result_a, result_b) = tokio::join!(engine_a.run(source), engine_b.run(source));
    Ok(compare(&result_a?, &result_b?))
}
