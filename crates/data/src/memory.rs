use async_trait::async_trait;

use common::{Candle, CandleSource, Result};

/// Replays a preloaded candle slice. Ignores symbol and timeframe; serves
/// the most recent `limit` candles of whatever it holds.
pub struct MemoryCandleSource {
    candles: Vec<Candle>,
}

impl MemoryCandleSource {
    /// `candles` must already be ascending by timestamp.
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }
}

#[async_trait]
impl CandleSource for MemoryCandleSource {
    async fn fetch_candles(
        &self,
        _symbol: &str,
        _timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let n = self.candles.len().min(limit);
        Ok(self.candles[self.candles.len() - n..].to_vec())
    }
}
