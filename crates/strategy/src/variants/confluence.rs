use common::{Candle, Direction, Signal};

use crate::indicators::{RsiIndicator, Trend, TrendDetector, VolatilityGauge};
use crate::SignalGenerator;

/// Variant "B" — validated confluence entry.
///
/// Requires agreement of three gates before firing: RSI at a strict
/// threshold, the short-horizon trend stretched in the same direction, and
/// a minimum realized-volatility floor (dead markets produce no edge worth
/// the round-trip costs). Higher confidence, wider stop, two take-profit
/// targets instead of one.
#[derive(Debug, Clone)]
pub struct ConfluenceValidated {
    rsi: RsiIndicator,
    trend: TrendDetector,
    volatility: VolatilityGauge,
}

const RSI_PERIOD: usize = 14;
const RSI_OVERSOLD: f64 = 28.0;
const RSI_OVERBOUGHT: f64 = 72.0;
const VOL_PERIOD: usize = 20;
/// Minimum per-bar return stdev, in percent.
const MIN_VOLATILITY: f64 = 0.5;
const CONFIDENCE: f64 = 0.78;
const STOP_PCT: f64 = 0.03;
const TARGET_PCTS: [f64; 2] = [0.04, 0.08];

impl ConfluenceValidated {
    pub fn new() -> Self {
        Self {
            rsi: RsiIndicator::new(RSI_PERIOD),
            trend: TrendDetector::new(3, 10),
            volatility: VolatilityGauge::new(VOL_PERIOD),
        }
    }
}

impl Default for ConfluenceValidated {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGenerator for ConfluenceValidated {
    fn label(&self) -> &str {
        "B (validated)"
    }

    fn min_lookback(&self) -> usize {
        VOL_PERIOD
    }

    fn generate(&self, current: &Candle, history: &[Candle]) -> Option<Signal> {
        if history.len() < self.min_lookback() {
            return None;
        }

        let mut closes: Vec<f64> = history.iter().map(|c| c.close).collect();
        closes.push(current.close);

        let rsi = self.rsi.compute(&closes)?;
        let trend = self.trend.compute(&closes)?;
        let volatility = self.volatility.compute(&closes)?;
        if volatility < MIN_VOLATILITY {
            return None;
        }

        let entry = current.close;

        if rsi <= RSI_OVERSOLD && trend == Trend::Down {
            Some(Signal {
                direction: Direction::Long,
                entry_price: entry,
                stop_loss: entry * (1.0 - STOP_PCT),
                take_profits: TARGET_PCTS.iter().map(|t| entry * (1.0 + t)).collect(),
                confidence: CONFIDENCE,
                patterns: vec![
                    "rsi_oversold_strict".into(),
                    format!("trend_{trend}"),
                    "volatility_floor".into(),
                ],
            })
        } else if rsi >= RSI_OVERBOUGHT && trend == Trend::Up {
            Some(Signal {
                direction: Direction::Short,
                entry_price: entry,
                stop_loss: entry * (1.0 + STOP_PCT),
                take_profits: TARGET_PCTS.iter().map(|t| entry * (1.0 - t)).collect(),
                confidence: CONFIDENCE,
                patterns: vec![
                    "rsi_overbought_strict".into(),
                    format!("trend_{trend}"),
                    "volatility_floor".into(),
                ],
            })
        } else {
            None
        }
    }
}
