use tracing::debug;

use common::{EquityPoint, Trade};

/// Running equity and peak-equity accumulator for a single run.
///
/// Owned by exactly one backtest loop: sizing for trade N+1 reads the equity
/// left after trade N, so updates are strictly sequential within a run.
/// Separate runs each own their tracker and can execute in parallel without
/// any shared state.
#[derive(Debug, Clone)]
pub struct EquityTracker {
    initial: f64,
    equity: f64,
    peak: f64,
    curve: Vec<EquityPoint>,
}

impl EquityTracker {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial: initial_capital,
            equity: initial_capital,
            peak: initial_capital,
            curve: Vec::new(),
        }
    }

    /// Position size for the next trade: a fraction of *current* equity,
    /// so sizing compounds across the run.
    pub fn position_size(&self, position_size_pct: f64) -> f64 {
        self.equity * position_size_pct
    }

    /// Fold a closed trade into the curve. Equity moves first, then the
    /// peak, then the drawdown is measured against the updated peak.
    pub fn record(&mut self, trade: &Trade) {
        self.equity += trade.pnl_usd;
        if self.equity > self.peak {
            self.peak = self.equity;
        }

        let drawdown = self.peak - self.equity;
        let drawdown_pct = if self.peak > 0.0 {
            drawdown / self.peak * 100.0
        } else {
            0.0
        };

        debug!(
            equity = self.equity,
            peak = self.peak,
            drawdown = drawdown,
            "Equity updated"
        );

        self.curve.push(EquityPoint {
            timestamp: trade.closed_at,
            equity: self.equity,
            drawdown,
            drawdown_pct,
        });
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn curve(&self) -> &[EquityPoint] {
        &self.curve
    }

    pub fn into_curve(self) -> Vec<EquityPoint> {
        self.curve
    }
}
