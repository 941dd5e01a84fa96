use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Immutable parameters for one backtest run. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Strategy variant tag, resolved against the strategy registry
    /// (e.g. "A" or "B"). Unknown tags are rejected before any simulation.
    pub variant: String,
    /// Trading pair, e.g. "BTCUSDT".
    pub symbol: String,
    /// Candle interval label, e.g. "1h".
    pub timeframe: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Starting equity in quote currency. Must be > 0.
    pub initial_capital: f64,
    /// Fraction of current equity committed per trade, in (0, 1].
    /// Sizing compounds: each trade reads equity after the previous one.
    pub position_size_pct: f64,
    /// Execution slippage in basis points, applied on entry and exit.
    pub slippage_bps: f64,
    /// Taker fee as a fraction of position size, charged per side.
    pub fee_pct: f64,
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_capital <= 0.0 {
            return Err(Error::Config("initial_capital must be > 0".into()));
        }
        if self.position_size_pct <= 0.0 || self.position_size_pct > 1.0 {
            return Err(Error::Config("position_size_pct must be in (0, 1]".into()));
        }
        if self.slippage_bps < 0.0 {
            return Err(Error::Config("slippage_bps must be >= 0".into()));
        }
        if self.fee_pct < 0.0 {
            return Err(Error::Config("fee_pct must be >= 0".into()));
        }
        if self.end <= self.start {
            return Err(Error::Config("end must be after start".into()));
        }
        if self.symbol.is_empty() {
            return Err(Error::Config("symbol must not be empty".into()));
        }
        if crate::timeframe_duration(&self.timeframe).is_none() {
            return Err(Error::Config(format!(
                "unsupported timeframe '{}'",
                self.timeframe
            )));
        }
        Ok(())
    }
}

/// Whether the CLI evaluates one variant or compares two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Run,
    Compare,
}

/// Run parameters loaded from the TOML file referenced by `CLAWLAB_CONFIG`.
///
/// Example `config/backtest.toml`:
/// ```toml
/// mode = "compare"
/// symbol = "BTCUSDT"
/// timeframe = "1h"
/// days = 30
/// initial_capital = 10000.0
/// position_size_pct = 0.1
/// slippage_bps = 10.0
/// fee_pct = 0.001
/// variant = "A"
/// variant_b = "B"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub mode: RunMode,
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// History window: the run covers the last `days` days up to now.
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_position_size_pct")]
    pub position_size_pct: f64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: f64,
    #[serde(default = "default_fee_pct")]
    pub fee_pct: f64,
    /// Variant evaluated in `run` mode, and the baseline in `compare` mode.
    pub variant: String,
    /// Challenger variant, required in `compare` mode.
    #[serde(default)]
    pub variant_b: Option<String>,
}

fn default_timeframe() -> String {
    "1h".to_string()
}
fn default_days() -> i64 {
    30
}
fn default_initial_capital() -> f64 {
    10_000.0
}
fn default_position_size_pct() -> f64 {
    0.1
}
fn default_slippage_bps() -> f64 {
    10.0
}
fn default_fee_pct() -> f64 {
    0.001
}

impl AppConfig {
    /// Load from the path in `CLAWLAB_CONFIG` (default `config/backtest.toml`).
    /// Loads `.env` if present. Panics on a missing or malformed file.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let path = std::env::var("CLAWLAB_CONFIG")
            .unwrap_or_else(|_| "config/backtest.toml".to_string());
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read run config at '{path}': {e}"));
        toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse run config at '{path}': {e}"))
    }

    /// Materialize the backtest config for a given variant tag, anchoring the
    /// period to the last `days` days.
    pub fn backtest_config(&self, variant: &str) -> BacktestConfig {
        let end = Utc::now();
        BacktestConfig {
            variant: variant.to_string(),
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            start: end - Duration::days(self.days),
            end,
            initial_capital: self.initial_capital,
            position_size_pct: self.position_size_pct,
            slippage_bps: self.slippage_bps,
            fee_pct: self.fee_pct,
        }
    }
}
