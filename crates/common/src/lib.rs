pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use config::{AppConfig, BacktestConfig, RunMode};
pub use error::{Error, Result};
pub use source::CandleSource;
pub use types::*;
