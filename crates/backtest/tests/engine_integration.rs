use chrono::{DateTime, Duration, Utc};

use backtest::{BacktestEngine, BacktestResult};
use common::{BacktestConfig, Candle};
use data::MemoryCandleSource;

fn config(variant: &str, end: DateTime<Utc>) -> BacktestConfig {
    BacktestConfig {
        variant: variant.into(),
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

/// Hourly candles ending at `end`: a flat stretch, a steady decline that
/// pins RSI into oversold territory, then a rebound.
fn shaped_candles(end: DateTime<Utc>) -> Vec<Candle> {
    let mut closes = Vec::new();
    let mut price = 100.0;
    for _ in 0..28 {
        closes.push(price);
    }
    for _ in 0..40 {
        price *= 0.99;
        closes.push(price);
    }
    for _ in 0..30 {
        price *= 1.012;
        closes.push(price);
    }

    let n = closes.len();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: end - Duration::hours((n - 1 - i) as i64),
                open,
                high: open.max(close) * 1.002,
                low: open.min(close) * 0.998,
                close,
                volume: 50.0,
            }
        })
        .collect()
}

async fn run(variant: &str) -> BacktestResult {
    let end = Utc::now();
    let source = MemoryCandleSource::new(shaped_candles(end));
    BacktestEngine::new(config(variant, end))
        .unwrap()
        .run(&source)
        .await
        .unwrap()
}

#[tokio::test]
async fn oversold_decline_produces_trades_with_consistent_accounting() {
    let result = run("A").await;
    assert!(
        !result.trades.is_empty(),
        "a 33% decline must trip the oversold entry"
    );

    let m = &result.metrics;
    assert_eq!(
        m.total_trades,
        m.winning_trades + m.losing_trades + m.breakeven_trades
    );
    assert!((0.0..=1.0).contains(&m.win_rate));
    assert_eq!(m.total_trades, result.trades.len());
    assert_eq!(result.equity_curve.len(), result.trades.len());

    // Replay the equity: each trade sizes off the equity left by the last one
    let mut equity = result.config.initial_capital;
    for trade in &result.trades {
        let expected_size = equity * result.config.position_size_pct;
        assert!(
            (trade.position_size_usd - expected_size).abs() < 1e-6,
            "sizing must compound: expected {expected_size}, got {}",
            trade.position_size_usd
        );
        equity += trade.pnl_usd;
    }
    let last = result.equity_curve.last().unwrap();
    assert!((last.equity - equity).abs() < 1e-6);
}

#[tokio::test]
async fn positions_never_overlap() {
    let result = run("A").await;
    for pair in result.trades.windows(2) {
        assert!(
            pair[1].opened_at > pair[0].closed_at,
            "trade {} opened at {} before the previous closed at {}",
            pair[1].id,
            pair[1].opened_at,
            pair[0].closed_at
        );
    }
    for trade in &result.trades {
        assert!(trade.closed_at >= trade.opened_at);
    }
}

#[tokio::test]
async fn equity_curve_peak_is_monotone_and_drawdown_non_negative() {
    let result = run("A").await;
    let mut peak = result.config.initial_capital;
    for point in &result.equity_curve {
        peak = peak.max(point.equity);
        assert!(point.drawdown >= 0.0);
        assert!(point.drawdown_pct >= 0.0);
        assert!((point.drawdown - (peak - point.equity)).abs() < 1e-6);
    }
}

#[tokio::test]
async fn identical_inputs_give_identical_results() {
    let end = Utc::now();
    let candles = shaped_candles(end);

    let first = BacktestEngine::new(config("A", end))
        .unwrap()
        .run(&MemoryCandleSource::new(candles.clone()))
        .await
        .unwrap();
    let second = BacktestEngine::new(config("A", end))
        .unwrap()
        .run(&MemoryCandleSource::new(candles))
        .await
        .unwrap();

    // Byte-identical reruns, trade ids included
    assert_eq!(
        serde_json::to_string(&first.trades).unwrap(),
        serde_json::to_string(&second.trades).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.metrics).unwrap(),
        serde_json::to_string(&second.metrics).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn strict_variant_trades_no_more_often_than_the_permissive_one() {
    let a = run("A").await;
    let b = run("B").await;
    assert!(
        b.metrics.total_trades <= a.metrics.total_trades,
        "B gates on confluence, A only on a wide RSI band: {} vs {}",
        b.metrics.total_trades,
        a.metrics.total_trades
    );
}

#[tokio::test]
async fn results_survive_a_serde_round_trip() {
    let result = run("A").await;
    let json = serde_json::to_string(&result).unwrap();
    let back: BacktestResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.trades.len(), result.trades.len());
    assert_eq!(back.metrics.total_trades, result.metrics.total_trades);
    assert_eq!(back.config.variant, "A");
}
