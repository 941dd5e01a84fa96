use serde::{Deserialize, Serialize};

use common::{EquityPoint, Trade};

/// Annualization factor for per-trade return ratios (trading days).
const ANNUALIZATION: f64 = 252.0;

/// Performance summary over a completed run's trade list and equity curve.
///
/// Computed once at the end of a run. Every ratio is guarded: a degenerate
/// denominator (no trades, no losers, zero variance, zero drawdown) resolves
/// to 0, never `NaN` or infinity. `Default` is the well-formed all-zero
/// metrics of a run that produced no trades.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    /// Fraction of winners in `0.0..=1.0`.
    pub win_rate: f64,
    /// Mean P&L of winners, in quote currency.
    pub avg_win: f64,
    /// Mean absolute P&L of losers, in quote currency (positive magnitude).
    pub avg_loss: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    /// `avg_win / avg_loss`.
    pub rr_ratio: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub profit_factor: f64,
    pub calmar_ratio: f64,
    /// Probability-weighted expected return per trade, in percent.
    pub expectancy: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_trade_duration_hours: f64,
    pub total_fees: f64,
    pub total_slippage: f64,
}

impl BacktestMetrics {
    /// Reduce a run's trades and equity curve into the full metric set.
    pub fn compute(trades: &[Trade], curve: &[EquityPoint], initial_capital: f64) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let total_trades = trades.len();
        let winners: Vec<&Trade> = trades.iter().filter(|t| t.pnl_usd > 0.0).collect();
        let losers: Vec<&Trade> = trades.iter().filter(|t| t.pnl_usd < 0.0).collect();
        let breakeven_trades = total_trades - winners.len() - losers.len();

        let win_rate = winners.len() as f64 / total_trades as f64;

        let avg_win = mean(winners.iter().map(|t| t.pnl_usd));
        let avg_loss = mean(losers.iter().map(|t| t.pnl_usd.abs()));
        let avg_win_pct = mean(winners.iter().map(|t| t.pnl_pct));
        let avg_loss_pct = mean(losers.iter().map(|t| t.pnl_pct.abs()));
        let rr_ratio = safe_div(avg_win, avg_loss);

        let total_return: f64 = trades.iter().map(|t| t.pnl_usd).sum();
        let total_return_pct = safe_div(total_return, initial_capital) * 100.0;

        let max_drawdown = curve.iter().map(|p| p.drawdown).fold(0.0, f64::max);
        let max_drawdown_pct = curve.iter().map(|p| p.drawdown_pct).fold(0.0, f64::max);

        let returns: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
        let mean_return = mean(returns.iter().copied());
        let return_stddev = population_stddev(&returns);

        let sharpe_ratio = safe_div(mean_return, return_stddev) * ANNUALIZATION.sqrt();

        let negative: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_stddev = if negative.is_empty() {
            return_stddev
        } else {
            population_stddev(&negative)
        };
        let sortino_ratio = safe_div(mean_return, downside_stddev) * ANNUALIZATION.sqrt();

        let gross_profit: f64 = winners.iter().map(|t| t.pnl_usd).sum();
        let gross_loss: f64 = losers.iter().map(|t| t.pnl_usd.abs()).sum();
        let profit_factor = safe_div(gross_profit, gross_loss);

        let calmar_ratio = safe_div(total_return_pct, max_drawdown_pct);

        let expectancy = win_rate * avg_win_pct - (1.0 - win_rate) * avg_loss_pct;

        let best_trade = trades.iter().map(|t| t.pnl_usd).fold(f64::MIN, f64::max);
        let worst_trade = trades.iter().map(|t| t.pnl_usd).fold(f64::MAX, f64::min);

        let avg_trade_duration_hours = mean(trades.iter().map(|t| t.duration_hours()));

        Self {
            total_trades,
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            breakeven_trades,
            win_rate,
            avg_win,
            avg_loss,
            avg_win_pct,
            avg_loss_pct,
            rr_ratio,
            total_return,
            total_return_pct,
            max_drawdown,
            max_drawdown_pct,
            sharpe_ratio,
            sortino_ratio,
            profit_factor,
            calmar_ratio,
            expectancy,
            best_trade,
            worst_trade,
            avg_trade_duration_hours,
            total_fees: trades.iter().map(|t| t.fees_usd).sum(),
            total_slippage: trades.iter().map(|t| t.slippage_usd).sum(),
        }
    }
}

/// Mean over an iterator; 0 when empty.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Population standard deviation; 0 when empty.
fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Division that resolves a zero denominator to 0 instead of NaN/Infinity.
fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::{Direction, ExitReason};

    fn trade(pnl_usd: f64, pnl_pct: f64, hours_held: i64) -> Trade {
        let closed = Utc::now();
        Trade {
            id: "t".into(),
            opened_at: closed - Duration::hours(hours_held),
            closed_at: closed,
            direction: Direction::Long,
            entry_price: 100.0,
            exit_price: 100.0,
            stop_loss: 98.0,
            take_profits: vec![103.0],
            position_size_usd: 1000.0,
            pnl_usd,
            pnl_pct,
            fees_usd: 2.0,
            slippage_usd: 2.0,
            exit_reason: ExitReason::TimeExit,
            confidence: 0.55,
            patterns: vec![],
        }
    }

    fn point(equity: f64, drawdown: f64, peak: f64) -> EquityPoint {
        EquityPoint {
            timestamp: Utc::now(),
            equity,
            drawdown,
            drawdown_pct: if peak > 0.0 { drawdown / peak * 100.0 } else { 0.0 },
        }
    }

    fn assert_all_finite(m: &BacktestMetrics) {
        for (name, v) in [
            ("win_rate", m.win_rate),
            ("rr_ratio", m.rr_ratio),
            ("sharpe_ratio", m.sharpe_ratio),
            ("sortino_ratio", m.sortino_ratio),
            ("profit_factor", m.profit_factor),
            ("calmar_ratio", m.calmar_ratio),
            ("expectancy", m.expectancy),
            ("max_drawdown_pct", m.max_drawdown_pct),
        ] {
            assert!(v.is_finite(), "{name} must be finite, got {v}");
        }
    }

    #[test]
    fn zero_trade_run_yields_well_formed_zero_metrics() {
        let m = BacktestMetrics::compute(&[], &[], 10_000.0);
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_all_finite(&m);
    }

    #[test]
    fn trade_counts_partition() {
        let trades = vec![
            trade(50.0, 5.0, 4),
            trade(-20.0, -2.0, 4),
            trade(30.0, 3.0, 4),
            trade(0.0, 0.0, 4),
        ];
        let m = BacktestMetrics::compute(&trades, &[], 1_000.0);
        assert_eq!(
            m.total_trades,
            m.winning_trades + m.losing_trades + m.breakeven_trades
        );
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 1);
        assert_eq!(m.breakeven_trades, 1);
        assert!((0.0..=1.0).contains(&m.win_rate));
    }

    #[test]
    fn core_formulas_match_hand_computation() {
        let trades = vec![
            trade(50.0, 5.0, 4),
            trade(-20.0, -2.0, 4),
            trade(30.0, 3.0, 4),
            trade(0.0, 0.0, 4),
        ];
        let curve = vec![
            point(1050.0, 0.0, 1050.0),
            point(1030.0, 20.0, 1050.0),
            point(1060.0, 0.0, 1060.0),
            point(1060.0, 0.0, 1060.0),
        ];
        let m = BacktestMetrics::compute(&trades, &curve, 1_000.0);

        assert!((m.win_rate - 0.5).abs() < 1e-9);
        assert!((m.avg_win - 40.0).abs() < 1e-9);
        assert!((m.avg_loss - 20.0).abs() < 1e-9);
        assert!((m.rr_ratio - 2.0).abs() < 1e-9);
        assert!((m.total_return - 60.0).abs() < 1e-9);
        assert!((m.total_return_pct - 6.0).abs() < 1e-9);
        assert!((m.max_drawdown - 20.0).abs() < 1e-9);
        assert!((m.profit_factor - 4.0).abs() < 1e-9);
        // expectancy = 0.5 * 4.0 - 0.5 * 2.0
        assert!((m.expectancy - 1.0).abs() < 1e-9);
        assert!((m.best_trade - 50.0).abs() < 1e-9);
        assert!((m.worst_trade + 20.0).abs() < 1e-9);
        assert!((m.avg_trade_duration_hours - 4.0).abs() < 1e-9);
        assert!((m.total_fees - 8.0).abs() < 1e-9);

        // Sharpe recomputed from the trade returns
        let returns = [5.0, -2.0, 3.0, 0.0];
        let mean_r = returns.iter().sum::<f64>() / 4.0;
        let var = returns.iter().map(|r| (r - mean_r).powi(2)).sum::<f64>() / 4.0;
        let expected_sharpe = mean_r / var.sqrt() * 252.0_f64.sqrt();
        assert!((m.sharpe_ratio - expected_sharpe).abs() < 1e-9);
        assert_all_finite(&m);
    }

    #[test]
    fn zero_variance_returns_give_zero_sharpe() {
        let trades = vec![trade(10.0, 1.0, 4), trade(10.0, 1.0, 4)];
        let m = BacktestMetrics::compute(&trades, &[], 1_000.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_all_finite(&m);
    }

    #[test]
    fn no_losers_means_zero_profit_factor_and_rr() {
        let trades = vec![trade(10.0, 1.0, 4), trade(25.0, 2.5, 4)];
        let m = BacktestMetrics::compute(&trades, &[], 1_000.0);
        assert_eq!(m.profit_factor, 0.0, "gross loss 0 guards to 0");
        assert_eq!(m.rr_ratio, 0.0, "avg loss 0 guards to 0");
        assert_all_finite(&m);
    }

    #[test]
    fn sortino_falls_back_to_sharpe_without_negative_returns() {
        let trades = vec![trade(10.0, 1.0, 4), trade(30.0, 3.0, 4)];
        let m = BacktestMetrics::compute(&trades, &[], 1_000.0);
        assert!((m.sortino_ratio - m.sharpe_ratio).abs() < 1e-12);
    }
}
