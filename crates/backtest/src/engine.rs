use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::{
    timeframe_duration, BacktestConfig, CandleSource, EquityPoint, Error, Result, Trade,
};

use crate::equity::EquityTracker;
use crate::metrics::BacktestMetrics;
use crate::simulator::TradeSimulator;

/// History handed to the signal generator at each decision point, and the
/// warm-up padding requested on top of the run span.
pub const SIGNAL_WINDOW: usize = 50;

/// Evaluated time range of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: i64,
}

/// Everything a finished run produced, serializable as one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub config: BacktestConfig,
    pub strategy_label: String,
    pub period: BacktestPeriod,
    pub metrics: BacktestMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Non-fatal conditions, e.g. a candle shortfall from a partial fetch.
    pub warnings: Vec<String>,
    pub summary: String,
}

/// Drives one strategy variant over historical candles.
///
/// The engine owns the full replay loop: candle retrieval, signal generation
/// over a bounded history window, trade resolution, equity accounting and the
/// final metric reduction. Identical config and identical history produce
/// identical trades and metrics.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the full backtest against `source`.
    ///
    /// An unknown variant tag fails here, before any candle is fetched. A
    /// short candle fetch does not fail the run: the engine simulates what it
    /// got and records the shortfall in `warnings`.
    pub async fn run(&self, source: &dyn CandleSource) -> Result<BacktestResult> {
        let generator = strategy::registry::build(&self.config.variant)?;

        let interval = timeframe_duration(&self.config.timeframe).ok_or_else(|| {
            Error::Config(format!("unsupported timeframe '{}'", self.config.timeframe))
        })?;
        let span = self.config.end - self.config.start;
        let span_candles = (span.num_seconds() / interval.num_seconds()).max(0) as usize;
        let expected = span_candles + SIGNAL_WINDOW;

        info!(
            variant = %self.config.variant,
            symbol = %self.config.symbol,
            timeframe = %self.config.timeframe,
            candles = expected,
            "Starting backtest"
        );

        let mut candles = source
            .fetch_candles(&self.config.symbol, &self.config.timeframe, expected)
            .await?;
        candles.retain(|c| c.timestamp <= self.config.end);

        if candles.is_empty() {
            return Err(Error::Data(format!(
                "no candles for {} {} in the requested period",
                self.config.symbol, self.config.timeframe
            )));
        }
        if candles.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
            return Err(Error::Data(
                "candle history is not in ascending timestamp order".into(),
            ));
        }

        let mut warnings = Vec::new();
        if candles.len() < expected {
            let msg = format!(
                "candle shortfall: got {} of {} requested, results cover a reduced period",
                candles.len(),
                expected
            );
            warn!("{msg}");
            warnings.push(msg);
        }

        let mut tracker = EquityTracker::new(self.config.initial_capital);
        let simulator = TradeSimulator::new(self.config.slippage_bps, self.config.fee_pct);
        let mut trades: Vec<Trade> = Vec::new();

        let mut i = 0;
        while i < candles.len() {
            let current = &candles[i];
            // Candles before the period start are warm-up history only.
            if current.timestamp < self.config.start {
                i += 1;
                continue;
            }

            let history = &candles[i.saturating_sub(SIGNAL_WINDOW)..i];
            let Some(signal) = generator.generate(current, history) else {
                i += 1;
                continue;
            };

            let size = tracker.position_size(self.config.position_size_pct);
            let future = &candles[i + 1..];
            let Some((trade, exit_offset)) = simulator.execute(&signal, current, future, size)
            else {
                i += 1;
                continue;
            };

            tracker.record(&trade);
            trades.push(trade);
            // Next decision comes after the exit candle: positions never
            // overlap, so trade N+1 sizes off the equity left by trade N.
            i += exit_offset + 2;

            if tracker.equity() <= 0.0 {
                let msg = "equity depleted, run stopped early".to_string();
                warn!("{msg}");
                warnings.push(msg);
                break;
            }
        }

        let metrics = BacktestMetrics::compute(&trades, tracker.curve(), tracker.initial());
        let period = BacktestPeriod {
            start: self.config.start,
            end: self.config.end,
            days: span.num_days(),
        };
        let summary = render_summary(
            &self.config,
            generator.label(),
            &period,
            &metrics,
            &warnings,
        );

        info!(
            variant = %self.config.variant,
            trades = metrics.total_trades,
            return_pct = metrics.total_return_pct,
            "Backtest finished"
        );

        Ok(BacktestResult {
            config: self.config.clone(),
            strategy_label: generator.label().to_string(),
            period,
            metrics,
            trades,
            equity_curve: tracker.into_curve(),
            warnings,
            summary,
        })
    }
}

fn render_summary(
    config: &BacktestConfig,
    label: &str,
    period: &BacktestPeriod,
    m: &BacktestMetrics,
    warnings: &[String],
) -> String {
    let mut out = String::new();
    out.push_str("════════════════ Backtest Summary ════════════════\n");
    out.push_str(&format!(
        "Strategy:       {} [{}]  {} {}\n",
        label, config.variant, config.symbol, config.timeframe
    ));
    out.push_str(&format!(
        "Period:         {} .. {} ({} days)\n",
        period.start.format("%Y-%m-%d"),
        period.end.format("%Y-%m-%d"),
        period.days
    ));
    out.push_str(&format!(
        "Capital:        {:.2} -> {:.2} ({:+.2}%)\n",
        config.initial_capital,
        config.initial_capital + m.total_return,
        m.total_return_pct
    ));
    out.push_str(&format!(
        "Trades:         {} ({}W / {}L / {}B), win rate {:.1}%\n",
        m.total_trades,
        m.winning_trades,
        m.losing_trades,
        m.breakeven_trades,
        m.win_rate * 100.0
    ));
    out.push_str(&format!(
        "Avg win/loss:   {:+.2} / {:-.2} (RR {:.2})\n",
        m.avg_win, m.avg_loss, m.rr_ratio
    ));
    out.push_str(&format!(
        "Max drawdown:   {:.2} ({:.2}%)\n",
        m.max_drawdown, m.max_drawdown_pct
    ));
    out.push_str(&format!(
        "Sharpe/Sortino: {:.2} / {:.2}   Calmar {:.2}\n",
        m.sharpe_ratio, m.sortino_ratio, m.calmar_ratio
    ));
    out.push_str(&format!(
        "Profit factor:  {:.2}   Expectancy {:+.2}%\n",
        m.profit_factor, m.expectancy
    ));
    out.push_str(&format!(
        "Costs:          fees {:.2}, slippage {:.2}\n",
        m.total_fees, m.total_slippage
    ));
    for w in warnings {
        out.push_str(&format!("Warning:        {w}\n"));
    }
    out.push_str("══════════════════════════════════════════════════");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use common::Candle;

    struct FixedSource {
        candles: Vec<Candle>,
    }

    #[async_trait]
    impl CandleSource for FixedSource {
        async fn fetch_candles(
            &self,
            _symbol: &str,
            _timeframe: &str,
            limit: usize,
        ) -> common::Result<Vec<Candle>> {
            let n = self.candles.len().min(limit);
            Ok(self.candles[self.candles.len() - n..].to_vec())
        }
    }

    fn config() -> BacktestConfig {
        let end = Utc::now();
        BacktestConfig {
            variant: "A".into(),
            symbol: "BTCUSDT".into(),
            timeframe: "1h".into(),
            start: end - Duration::days(2),
            end,
            initial_capital: 10_000.0,
            position_size_pct: 0.1,
            slippage_bps: 10.0,
            fee_pct: 0.001,
        }
    }

    fn flat_candles(n: usize, end: DateTime<Utc>) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                timestamp: end - Duration::hours((n - 1 - i) as i64),
                open: 100.0,
                high: 100.5,
                low: 99.5,
                close: 100.0,
                volume: 10.0,
            })
            .collect()
    }

    #[tokio::test]
    async fn unknown_variant_fails_before_fetching() {
        let mut cfg = config();
        cfg.variant = "Z".into();
        let engine = BacktestEngine::new(cfg).unwrap();
        let source = FixedSource { candles: vec![] };

        let err = engine.run(&source).await.unwrap_err();
        assert!(matches!(err, Error::UnknownStrategy(_)));
    }

    #[tokio::test]
    async fn empty_history_is_a_data_error() {
        let engine = BacktestEngine::new(config()).unwrap();
        let source = FixedSource { candles: vec![] };

        let err = engine.run(&source).await.unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[tokio::test]
    async fn unsorted_history_is_a_data_error() {
        let cfg = config();
        let mut candles = flat_candles(60, cfg.end);
        candles.swap(10, 40);
        let engine = BacktestEngine::new(cfg).unwrap();
        let source = FixedSource { candles };

        let err = engine.run(&source).await.unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[tokio::test]
    async fn short_fetch_warns_but_completes() {
        let cfg = config();
        // 2 days of hourly candles need 48 + warm-up; serve only 20
        let candles = flat_candles(20, cfg.end);
        let engine = BacktestEngine::new(cfg).unwrap();
        let source = FixedSource { candles };

        let result = engine.run(&source).await.unwrap();
        assert!(
            result.warnings.iter().any(|w| w.contains("shortfall")),
            "expected a shortfall warning, got {:?}",
            result.warnings
        );
        assert_eq!(result.metrics.total_trades, result.trades.len());
    }

    #[tokio::test]
    async fn repeated_timestamps_keep_positions_sequential() {
        let cfg = config();
        // Steady decline with every timestamp duplicated, as a feed with
        // two sub-candles per interval would deliver it
        let n = 98;
        let mut candles = Vec::with_capacity(n);
        let mut price = 140.0;
        for i in 0..n {
            let open = price;
            price *= 0.99;
            candles.push(Candle {
                timestamp: cfg.end - Duration::hours(((n - 1 - i) / 2) as i64),
                open,
                high: open * 1.002,
                low: price * 0.998,
                close: price,
                volume: 10.0,
            });
        }
        let engine = BacktestEngine::new(cfg).unwrap();
        let source = FixedSource { candles };

        let result = engine.run(&source).await.unwrap();
        assert!(!result.trades.is_empty(), "decline must trigger entries");

        for pair in result.trades.windows(2) {
            assert!(
                pair[1].opened_at >= pair[0].closed_at,
                "trade opened at {} while the previous was still open until {}",
                pair[1].opened_at,
                pair[0].closed_at
            );
        }
        let mut equity = result.config.initial_capital;
        for trade in &result.trades {
            let expected = equity * result.config.position_size_pct;
            assert!((trade.position_size_usd - expected).abs() < 1e-6);
            equity += trade.pnl_usd;
        }
    }

    #[tokio::test]
    async fn flat_market_produces_a_well_formed_empty_run() {
        let cfg = config();
        let candles = flat_candles(100, cfg.end);
        let engine = BacktestEngine::new(cfg).unwrap();
        let source = FixedSource { candles };

        let result = engine.run(&source).await.unwrap();
        assert!(result.trades.is_empty(), "flat prices never reach RSI extremes");
        assert_eq!(result.metrics.total_trades, 0);
        assert!(result.metrics.sharpe_ratio.is_finite());
        assert!(result.summary.contains("Backtest Summary"));
    }
}
