pub mod engine;
pub mod equity;
pub mod metrics;
pub mod simulator;

pub use engine::{BacktestEngine, BacktestPeriod, BacktestResult, SIGNAL_WINDOW};
pub use equity::EquityTracker;
pub use metrics::BacktestMetrics;
pub use simulator::{TradeSimulator, MAX_HOLD_CANDLES};
