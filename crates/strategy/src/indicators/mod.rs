pub mod rsi;
pub mod trend;
pub mod volatility;

pub use rsi::RsiIndicator;
pub use trend::{Trend, TrendDetector};
pub use volatility::VolatilityGauge;
