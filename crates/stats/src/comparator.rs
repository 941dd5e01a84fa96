use serde::{Deserialize, Serialize};
use tracing::info;

use backtest::{BacktestPeriod, BacktestResult};

use crate::inference::{two_proportion_z_test, two_sample_t_test};

/// Significance level for the win-rate z-test and the per-trade return t-test.
pub const ALPHA: f64 = 0.05;

// Practical-significance thresholds for the metrics that have no clean
// sampling distribution. Absolute differences below these are noise.
const RR_THRESHOLD: f64 = 0.5;
const DRAWDOWN_PCT_THRESHOLD: f64 = 5.0;
const SHARPE_THRESHOLD: f64 = 0.5;
const PROFIT_FACTOR_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    A,
    B,
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One metric compared across the two runs. `difference` is B minus A.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub value_a: f64,
    pub value_b: f64,
    pub difference: f64,
    /// Relative difference in percent; 0 when the baseline value is 0.
    pub pct_difference: f64,
    /// Present for the two tested rows, absent for threshold rows.
    pub p_value: Option<f64>,
    pub significant: bool,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub winner: Winner,
    pub confidence: Confidence,
    pub key_improvements: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub variant_a: String,
    pub variant_b: String,
    pub label_a: String,
    pub label_b: String,
    pub symbol: String,
    pub timeframe: String,
    pub period: BacktestPeriod,
    pub comparisons: Vec<MetricComparison>,
    pub assessment: OverallAssessment,
    pub summary: String,
}

/// Compare two finished runs metric by metric and issue an overall verdict.
///
/// Six fixed rows: win rate (two-proportion z-test), average per-trade
/// return (t-test), then risk/reward ratio, max drawdown, Sharpe and profit
/// factor as practical-significance thresholds. Drawdown is the one metric
/// where lower is better. The verdict tallies only the significant rows:
/// a margin above 1 picks a winner, above 2 upgrades the confidence to
/// High; anything else is a tie with Low confidence.
pub fn compare(a: &BacktestResult, b: &BacktestResult) -> ComparisonReport {
    let ma = &a.metrics;
    let mb = &b.metrics;

    let returns_a: Vec<f64> = a.trades.iter().map(|t| t.pnl_pct).collect();
    let returns_b: Vec<f64> = b.trades.iter().map(|t| t.pnl_pct).collect();
    let mean_return_a = mean(&returns_a);
    let mean_return_b = mean(&returns_b);

    let win_rate_p = two_proportion_z_test(
        ma.winning_trades,
        ma.total_trades,
        mb.winning_trades,
        mb.total_trades,
    );
    let return_p = two_sample_t_test(&returns_a, &returns_b);

    let comparisons = vec![
        tested_row("win_rate", ma.win_rate, mb.win_rate, win_rate_p, false),
        tested_row(
            "avg_trade_return_pct",
            mean_return_a,
            mean_return_b,
            return_p,
            false,
        ),
        threshold_row("rr_ratio", ma.rr_ratio, mb.rr_ratio, RR_THRESHOLD, false),
        threshold_row(
            "max_drawdown_pct",
            ma.max_drawdown_pct,
            mb.max_drawdown_pct,
            DRAWDOWN_PCT_THRESHOLD,
            true,
        ),
        threshold_row(
            "sharpe_ratio",
            ma.sharpe_ratio,
            mb.sharpe_ratio,
            SHARPE_THRESHOLD,
            false,
        ),
        threshold_row(
            "profit_factor",
            ma.profit_factor,
            mb.profit_factor,
            PROFIT_FACTOR_THRESHOLD,
            false,
        ),
    ];

    let assessment = assess(&comparisons);

    info!(
        winner = ?assessment.winner,
        confidence = ?assessment.confidence,
        significant = comparisons.iter().filter(|c| c.significant).count(),
        "Comparison complete"
    );

    let summary = render_summary(a, b, &comparisons, &assessment);

    ComparisonReport {
        variant_a: a.config.variant.clone(),
        variant_b: b.config.variant.clone(),
        label_a: a.strategy_label.clone(),
        label_b: b.strategy_label.clone(),
        symbol: a.config.symbol.clone(),
        timeframe: a.config.timeframe.clone(),
        period: a.period.clone(),
        comparisons,
        assessment,
        summary,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn pct_difference(a: f64, b: f64) -> f64 {
    if a == 0.0 {
        0.0
    } else {
        (b - a) / a.abs() * 100.0
    }
}

/// Which side a row favors; `None` for exact ties.
fn better_side(row: &MetricComparison, lower_is_better: bool) -> Option<Winner> {
    if row.value_a == row.value_b {
        return None;
    }
    let b_larger = row.value_b > row.value_a;
    Some(if b_larger != lower_is_better {
        Winner::B
    } else {
        Winner::A
    })
}

fn tested_row(
    metric: &str,
    value_a: f64,
    value_b: f64,
    p_value: f64,
    lower_is_better: bool,
) -> MetricComparison {
    let mut row = MetricComparison {
        metric: metric.to_string(),
        value_a,
        value_b,
        difference: value_b - value_a,
        pct_difference: pct_difference(value_a, value_b),
        p_value: Some(p_value),
        significant: p_value < ALPHA,
        interpretation: String::new(),
    };
    row.interpretation = if row.significant {
        let side = if better_side(&row, lower_is_better) == Some(Winner::B) {
            "B"
        } else {
            "A"
        };
        format!("{metric}: {side} leads, {value_a:.4} vs {value_b:.4} (p = {p_value:.4})")
    } else {
        format!("{metric}: no significant difference (p = {p_value:.4})")
    };
    row
}

fn threshold_row(
    metric: &str,
    value_a: f64,
    value_b: f64,
    threshold: f64,
    lower_is_better: bool,
) -> MetricComparison {
    let mut row = MetricComparison {
        metric: metric.to_string(),
        value_a,
        value_b,
        difference: value_b - value_a,
        pct_difference: pct_difference(value_a, value_b),
        p_value: None,
        significant: (value_b - value_a).abs() > threshold,
        interpretation: String::new(),
    };
    row.interpretation = if row.significant {
        let side = if better_side(&row, lower_is_better) == Some(Winner::B) {
            "B"
        } else {
            "A"
        };
        format!("{metric}: {side} leads, {value_a:.4} vs {value_b:.4} (threshold {threshold})")
    } else {
        format!("{metric}: within noise ({value_a:.4} vs {value_b:.4})")
    };
    row
}

fn assess(comparisons: &[MetricComparison]) -> OverallAssessment {
    let mut score_a = 0usize;
    let mut score_b = 0usize;
    for row in comparisons.iter().filter(|c| c.significant) {
        let lower_is_better = row.metric == "max_drawdown_pct";
        match better_side(row, lower_is_better) {
            Some(Winner::A) => score_a += 1,
            Some(Winner::B) => score_b += 1,
            _ => {}
        }
    }

    let margin = score_a.abs_diff(score_b);
    let (winner, confidence) = if margin > 1 {
        let winner = if score_a > score_b { Winner::A } else { Winner::B };
        let confidence = if margin > 2 {
            Confidence::High
        } else {
            Confidence::Medium
        };
        (winner, confidence)
    } else {
        (Winner::Tie, Confidence::Low)
    };

    // A tie lists no improvements: a split decision would mix sentences
    // arguing for both sides.
    let key_improvements: Vec<String> = if winner == Winner::Tie {
        Vec::new()
    } else {
        comparisons
            .iter()
            .filter(|c| c.significant)
            .filter(|c| better_side(c, c.metric == "max_drawdown_pct") == Some(winner))
            .map(|c| c.interpretation.clone())
            .collect()
    };

    let recommendation = match winner {
        Winner::Tie => {
            "No statistically meaningful edge either way; keep the incumbent variant.".to_string()
        }
        Winner::A => format!(
            "Variant A leads on {score_a} of {} significant metrics ({confidence:?} confidence).",
            score_a + score_b
        ),
        Winner::B => format!(
            "Variant B leads on {score_b} of {} significant metrics ({confidence:?} confidence).",
            score_a + score_b
        ),
    };

    OverallAssessment {
        winner,
        confidence,
        key_improvements,
        recommendation,
    }
}

fn render_summary(
    a: &BacktestResult,
    b: &BacktestResult,
    comparisons: &[MetricComparison],
    assessment: &OverallAssessment,
) -> String {
    let mut out = String::new();
    out.push_str("═══════════════ A/B Comparison ═══════════════\n");
    out.push_str(&format!(
        "A: {} [{}]   B: {} [{}]\n",
        a.strategy_label, a.config.variant, b.strategy_label, b.config.variant
    ));
    out.push_str(&format!(
        "{} {} | {} .. {} ({} days)\n",
        a.config.symbol,
        a.config.timeframe,
        a.period.start.format("%Y-%m-%d"),
        a.period.end.format("%Y-%m-%d"),
        a.period.days
    ));
    out.push_str(&format!(
        "Trades: {} vs {}\n\n",
        a.metrics.total_trades, b.metrics.total_trades
    ));
    for row in comparisons {
        let marker = if row.significant { "*" } else { " " };
        out.push_str(&format!("{marker} {}\n", row.interpretation));
    }
    out.push_str(&format!(
        "\nVerdict: {:?} ({:?} confidence)\n{}\n",
        assessment.winner, assessment.confidence, assessment.recommendation
    ));
    out.push_str("══════════════════════════════════════════════");
    out
}
