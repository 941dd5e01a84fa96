use async_trait::async_trait;

use crate::{Candle, Result};

/// Abstraction over historical candle retrieval.
///
/// `BinanceCandleSource` implements this against the public klines REST API.
/// `MemoryCandleSource` implements this for tests and offline replays.
///
/// Contract: candles are returned ascending by timestamp, at most `limit` of
/// the most recent for the symbol/timeframe. Implementations that fetch in
/// batches should return whatever was already retrieved when a later batch
/// fails, rather than discarding partial history; the backtest engine treats
/// a short result as a warning, not a fault.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>>;
}
