use common::{Candle, Direction, Signal};

use crate::indicators::{RsiIndicator, Trend, TrendDetector};
use crate::SignalGenerator;

/// Variant "A" — permissive mean-reversion entry.
///
/// Fires on a single-indicator extreme: RSI at a wide threshold while the
/// short-horizon trend is stretched the same way (oversold into a falling
/// market buys the bounce, overbought into a rising market sells it).
/// Fixed moderate confidence, fixed percentage stop and single target.
#[derive(Debug, Clone)]
pub struct MomentumExtreme {
    rsi: RsiIndicator,
    trend: TrendDetector,
}

const RSI_PERIOD: usize = 14;
const RSI_OVERSOLD: f64 = 35.0;
const RSI_OVERBOUGHT: f64 = 65.0;
const CONFIDENCE: f64 = 0.55;
const STOP_PCT: f64 = 0.02;
const TARGET_PCT: f64 = 0.03;

impl MomentumExtreme {
    pub fn new() -> Self {
        Self {
            rsi: RsiIndicator::new(RSI_PERIOD),
            trend: TrendDetector::new(3, 10),
        }
    }
}

impl Default for MomentumExtreme {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGenerator for MomentumExtreme {
    fn label(&self) -> &str {
        "A (permissive)"
    }

    fn min_lookback(&self) -> usize {
        RSI_PERIOD
    }

    fn generate(&self, current: &Candle, history: &[Candle]) -> Option<Signal> {
        if history.len() < self.min_lookback() {
            return None;
        }

        let mut closes: Vec<f64> = history.iter().map(|c| c.close).collect();
        closes.push(current.close);

        let rsi = self.rsi.compute(&closes)?;
        let trend = self.trend.compute(&closes)?;
        let entry = current.close;

        if rsi <= RSI_OVERSOLD && trend == Trend::Down {
            Some(Signal {
                direction: Direction::Long,
                entry_price: entry,
                stop_loss: entry * (1.0 - STOP_PCT),
                take_profits: vec![entry * (1.0 + TARGET_PCT)],
                confidence: CONFIDENCE,
                patterns: vec!["rsi_oversold".into(), format!("trend_{trend}")],
            })
        } else if rsi >= RSI_OVERBOUGHT && trend == Trend::Up {
            Some(Signal {
                direction: Direction::Short,
                entry_price: entry,
                stop_loss: entry * (1.0 + STOP_PCT),
                take_profits: vec![entry * (1.0 - TARGET_PCT)],
                confidence: CONFIDENCE,
                patterns: vec!["rsi_overbought".into(), format!("trend_{trend}")],
            })
        } else {
            None
        }
    }
}
