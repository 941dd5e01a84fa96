use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use common::{Candle, CandleSource, Error, Result};

const BASE_URL: &str = "https://api.binance.com";

/// Binance caps /api/v3/klines at 1000 rows per request.
const PAGE_LIMIT: usize = 1000;

/// Historical candle source backed by the public Binance klines endpoint.
///
/// Requests larger than one page are paginated backwards from the most
/// recent candle. A failure partway through pagination is not fatal: the
/// candles already retrieved are returned and the shortfall is left for the
/// caller to notice.
pub struct BinanceCandleSource {
    http: Client,
}

impl BinanceCandleSource {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        interval: &str,
        end_time_ms: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let mut url = format!(
            "{BASE_URL}/api/v3/klines?symbol={symbol}&interval={interval}&limit={limit}"
        );
        if let Some(end) = end_time_ms {
            url.push_str(&format!("&endTime={end}"));
        }

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Source(format!("HTTP {status}: {body}")));
        }

        let rows: Vec<Value> = serde_json::from_str(&body)?;
        rows.iter().map(parse_kline).collect()
    }
}

impl Default for BinanceCandleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandleSource for BinanceCandleSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let mut collected: Vec<Candle> = Vec::with_capacity(limit);
        let mut end_time_ms: Option<i64> = None;

        while collected.len() < limit {
            let page_size = (limit - collected.len()).min(PAGE_LIMIT);
            let page = match self
                .fetch_page(symbol, timeframe, end_time_ms, page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    if collected.is_empty() {
                        return Err(e);
                    }
                    warn!(
                        symbol,
                        got = collected.len(),
                        requested = limit,
                        error = %e,
                        "Kline pagination failed, returning partial history"
                    );
                    break;
                }
            };
            if page.is_empty() {
                break; // history exhausted
            }

            debug!(symbol, page = page.len(), total = collected.len(), "Fetched klines page");

            // Next page ends just before the oldest candle seen so far.
            end_time_ms = Some(page[0].timestamp.timestamp_millis() - 1);
            // Pages arrive ascending; older pages go in front.
            let mut merged = page;
            merged.append(&mut collected);
            collected = merged;
        }

        Ok(collected)
    }
}

/// One kline row is a JSON array:
/// `[openTime, open, high, low, close, volume, closeTime, ...]`
/// with prices and volume as strings.
fn parse_kline(row: &Value) -> Result<Candle> {
    let arr = row
        .as_array()
        .ok_or_else(|| Error::Source("kline row is not an array".into()))?;
    if arr.len() < 6 {
        return Err(Error::Source(format!("kline row too short: {} fields", arr.len())));
    }

    let open_time = arr[0]
        .as_i64()
        .ok_or_else(|| Error::Source("kline open time is not an integer".into()))?;
    let timestamp = ms_to_datetime(open_time)?;

    Ok(Candle {
        timestamp,
        open: parse_price(&arr[1], "open")?,
        high: parse_price(&arr[2], "high")?,
        low: parse_price(&arr[3], "low")?,
        close: parse_price(&arr[4], "close")?,
        volume: parse_price(&arr[5], "volume")?,
    })
}

fn parse_price(v: &Value, field: &str) -> Result<f64> {
    v.as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| Error::Source(format!("kline {field} is not a numeric string")))
}

fn ms_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| Error::Source(format!("invalid kline timestamp {ms}")))
}
