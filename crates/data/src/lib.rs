//! Candle retrieval adapters: Binance REST klines and an in-memory replay
//! source for tests and offline runs.

pub mod binance;
pub mod memory;

pub use binance::BinanceCandleSource;
pub use memory::MemoryCandleSource;
