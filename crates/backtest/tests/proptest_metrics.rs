use chrono::{Duration, Utc};
use proptest::prelude::*;

use backtest::{BacktestMetrics, EquityTracker};
use common::{Direction, ExitReason, Trade};

fn trade_from(pnl_usd: f64, pnl_pct: f64, hours: i64) -> Trade {
    let closed = Utc::now();
    Trade {
        id: "t".into(),
        opened_at: closed - Duration::hours(hours),
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

prop_compose! {
    fn arb_trade()(
        pnl_usd in -500.0..500.0f64,
        pnl_pct in -50.0..50.0f64,
        hours in 1..48i64,
    ) -> Trade {
        trade_from(pnl_usd, pnl_pct, hours)
    }
}

proptest! {
    #[test]
    fn metrics_are_always_finite(trades in prop::collection::vec(arb_trade(), 0..64)) {
        let m = BacktestMetrics::compute(&trades, &[], 10_000.0);

        prop_assert!(m.win_rate.is_finite());
        prop_assert!((0.0..=1.0).contains(&m.win_rate));
        prop_assert!(m.rr_ratio.is_finite());
        prop_assert!(m.sharpe_ratio.is_finite());
        prop_assert!(m.sortino_ratio.is_finite());
        prop_assert!(m.profit_factor.is_finite());
        prop_assert!(m.calmar_ratio.is_finite());
        prop_assert!(m.expectancy.is_finite());
        prop_assert!(m.total_return.is_finite());
        prop_assert!(m.avg_trade_duration_hours.is_finite());
    }

    #[test]
    fn trade_counts_always_partition(trades in prop::collection::vec(arb_trade(), 0..64)) {
        let m = BacktestMetrics::compute(&trades, &[], 10_000.0);
        prop_assert_eq!(
            m.total_trades,
            m.winning_trades + m.losing_trades + m.breakeven_trades
        );
    }

    #[test]
    fn tracker_peak_is_monotone_under_any_pnl_sequence(
        pnls in prop::collection::vec(-900.0..900.0f64, 1..64),
    ) {
        let mut tracker = EquityTracker::new(10_000.0);
        let mut last_peak = tracker.peak();
        for pnl in pnls {
            tracker.record(&trade_from(pnl, pnl / 100.0, 4));
            prop_assert!(tracker.peak() >= last_peak);
            last_peak = tracker.peak();
        }
        for point in tracker.curve() {
            prop_assert!(point.drawdown >= 0.0);
            prop_assert!(point.drawdown_pct.is_finite());
        }
    }
}
