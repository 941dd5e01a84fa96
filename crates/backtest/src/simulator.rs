use tracing::debug;
use uuid::Uuid;

use common::{Candle, Direction, ExitReason, Signal, Trade};

/// Maximum holding window: a position still open after this many candles is
/// closed at the last provisional close (`time_exit`).
pub const MAX_HOLD_CANDLES: usize = 24;

/// Resolves a signal into a completed trade by scanning the candles that
/// follow the decision point.
///
/// Entry and exit fills are degraded by `slippage_bps` in the direction that
/// hurts the trader; fees and slippage cost are charged for the round trip.
/// Only the first take-profit level resolves the exit — any further targets
/// ride on the trade record for reporting but do not affect execution.
#[derive(Debug, Clone)]
pub struct TradeSimulator {
    slippage_bps: f64,
    fee_pct: f64,
}

impl TradeSimulator {
    pub fn new(slippage_bps: f64, fee_pct: f64) -> Self {
        Self {
            slippage_bps,
            fee_pct,
        }
    }

    /// Simulate one position from `signal`, entered at `entry_candle` and
    /// resolved against `future` (candles strictly after the decision point).
    ///
    /// Returns the trade together with the index of the exit candle within
    /// `future`, so the caller resumes after the right candle even when the
    /// feed repeats timestamps. Returns `None` when fewer than two future
    /// candles are available — an exit cannot be resolved, and the caller
    /// moves on to the next timestamp. `position_size_usd` is the caller's
    /// equity-derived sizing and must be positive.
    pub fn execute(
        &self,
        signal: &Signal,
        entry_candle: &Candle,
        future: &[Candle],
        position_size_usd: f64,
    ) -> Option<(Trade, usize)> {
        if future.len() < 2 || position_size_usd <= 0.0 {
            return None;
        }
        let first_target = signal.take_profits.first().copied()?;

        let slip = self.slippage_bps / 10_000.0;
        let entry_effective = match signal.direction {
            Direction::Long => signal.entry_price * (1.0 + slip),
            Direction::Short => signal.entry_price * (1.0 - slip),
        };

        // Forward scan: stop checked before target on every candle, a
        // provisional close carried while neither level is touched.
        let scan = &future[..future.len().min(MAX_HOLD_CANDLES)];
        let mut exit_price = scan[0].close;
        let mut exit_time = scan[0].timestamp;
        let mut exit_reason = ExitReason::TimeExit;
        let mut exit_index = 0usize;

        for (idx, candle) in scan.iter().enumerate() {
            let (stop_hit, target_hit) = match signal.direction {
                Direction::Long => (
                    candle.low <= signal.stop_loss,
                    candle.high >= first_target,
                ),
                Direction::Short => (
                    candle.high >= signal.stop_loss,
                    candle.low <= first_target,
                ),
            };

            if stop_hit {
                exit_price = signal.stop_loss;
                exit_time = candle.timestamp;
                exit_reason = ExitReason::StopLoss;
                exit_index = idx;
                break;
            }
            if target_hit {
                exit_price = first_target;
                exit_time = candle.timestamp;
                exit_reason = ExitReason::TakeProfit;
                exit_index = idx;
                break;
            }
            exit_price = candle.close;
            exit_time = candle.timestamp;
            exit_reason = ExitReason::TimeExit;
            exit_index = idx;
        }

        // Exit slippage worsens the fill: longs sell lower, shorts buy higher
        let exit_effective = match signal.direction {
            Direction::Long => exit_price * (1.0 - slip),
            Direction::Short => exit_price * (1.0 + slip),
        };

        let raw_return = match signal.direction {
            Direction::Long => (exit_effective - entry_effective) / entry_effective,
            Direction::Short => (entry_effective - exit_effective) / entry_effective,
        };

        let gross_pnl = position_size_usd * raw_return;
        let fees = position_size_usd * self.fee_pct * 2.0;
        let slippage_cost = position_size_usd * slip * 2.0;
        let net_pnl = gross_pnl - fees - slippage_cost;

        debug!(
            direction = %signal.direction,
            reason = %exit_reason,
            entry = entry_effective,
            exit = exit_effective,
            pnl = net_pnl,
            "Trade resolved"
        );

        // Name-based id: identical inputs replay to the identical trade,
        // byte for byte. Entry time plus direction is unique within a run
        // since positions never overlap.
        let id = Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!(
                "{}:{}:{}",
                entry_candle.timestamp.timestamp_millis(),
                signal.direction,
                exit_time.timestamp_millis()
            )
            .as_bytes(),
        )
        .to_string();

        let trade = Trade {
            id,
            opened_at: entry_candle.timestamp,
            closed_at: exit_time,
            direction: signal.direction,
            entry_price: entry_effective,
            exit_price: exit_effective,
            stop_loss: signal.stop_loss,
            take_profits: signal.take_profits.clone(),
            position_size_usd,
            pnl_usd: net_pnl,
            pnl_pct: net_pnl / position_size_usd * 100.0,
            fees_usd: fees,
            slippage_usd: slippage_cost,
            exit_reason,
            confidence: signal.confidence,
            patterns: signal.patterns.clone(),
        };
        Some((trade, exit_index))
    }
}
