use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV candle from the candle source.
/// Candles arrive ascending by timestamp; spacing may be irregular
/// (the simulator never fills gaps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Direction of a simulated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// How a simulated position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TimeExit,
    Manual,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::TimeExit => write!(f, "time_exit"),
            ExitReason::Manual => write!(f, "manual"),
        }
    }
}

/// Entry signal emitted by a signal generator for one decision candle.
///
/// Transient: consumed by the trade simulator immediately, or discarded if
/// no position can be resolved. `take_profits` is ordered nearest-first and
/// always holds at least one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profits: Vec<f64>,
    /// Generator confidence in `0.0..=1.0`.
    pub confidence: f64,
    /// Pattern/rule tags explaining why the signal fired.
    pub patterns: Vec<String>,
}

/// One fully resolved simulated position. Immutable once created.
///
/// Entry and exit prices are post-slippage. `pnl_usd` is net of round-trip
/// fees and slippage cost; `pnl_pct` is that net amount relative to
/// `position_size_usd`, in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: f64,
    pub take_profits: Vec<f64>,
    pub position_size_usd: f64,
    pub pnl_usd: f64,
    pub pnl_pct: f64,
    pub fees_usd: f64,
    pub slippage_usd: f64,
    pub exit_reason: ExitReason,
    pub confidence: f64,
    pub patterns: Vec<String>,
}

impl Trade {
    /// Holding time in hours. Never negative (`closed_at >= opened_at`).
    pub fn duration_hours(&self) -> f64 {
        (self.closed_at - self.opened_at).num_seconds() as f64 / 3600.0
    }
}

/// One point on the equity curve, emitted per closed trade.
/// `drawdown` is the distance below the running peak, never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub drawdown: f64,
    pub drawdown_pct: f64,
}

/// Parse a timeframe label ("1m", "5m", "15m", "1h", "4h", "1d") into its
/// candle interval. Returns `None` for unsupported labels.
pub fn timeframe_duration(timeframe: &str) -> Option<Duration> {
    match timeframe {
        "1m" => Some(Duration::minutes(1)),
        "5m" => Some(Duration::minutes(5)),
        "15m" => Some(Duration::minutes(15)),
        "30m" => Some(Duration::minutes(30)),
        "1h" => Some(Duration::hours(1)),
        "4h" => Some(Duration::hours(4)),
        "1d" => Some(Duration::days(1)),
        _ => None,
    }
}
