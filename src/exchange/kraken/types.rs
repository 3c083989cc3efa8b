use crate::data::{CandleBar, OrderBookSnapshot, PriceLevel, Ticker};
use crate::error::ProviderError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Kraken wraps every public response in `{error: [...], result: {...}}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub error: Vec<String>,
    pub result: Option<T>,
}

/// One entry of the `Assets` response.
#[derive(Debug, Deserialize)]
pub struct AssetInfo {
    pub altname: String,
}

/// One entry of the `AssetPairs` response.
#[derive(Debug, Deserialize)]
pub struct PairInfo {
    #[serde(default)]
    pub altname: String,
}

/// One entry of the `Ticker` response.
///
/// Kraken keys are single letters: "c" = [last trade price, lot volume],
/// "o" = session open price. All numbers arrive as strings.
#[derive(Debug, Deserialize)]
pub struct TickerInfo {
    pub c: [String; 2],
    pub o: String,
}

impl TickerInfo {
    pub fn into_ticker(self) -> Result<Ticker, ProviderError> {
        Ok(Ticker {
            last_price: parse_decimal(&self.c[0], "ticker.c")?,
            open_price: parse_decimal(&self.o, "ticker.o")?,
        })
    }
}

/// Depth row: [price, volume, timestamp].
pub type DepthRow = (String, String, serde_json::Value);

/// One entry of the `Depth` response.
#[derive(Debug, Deserialize)]
pub struct DepthData {
    #[serde(default)]
    pub bids: Vec<DepthRow>,
    #[serde(default)]
    pub asks: Vec<DepthRow>,
}

impl DepthData {
    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> Result<OrderBookSnapshot, ProviderError> {
        Ok(OrderBookSnapshot {
            bids: parse_levels(&self.bids, "depth.bids")?,
            asks: parse_levels(&self.asks, "depth.asks")?,
            fetched_at,
        })
    }
}

/// OHLC row: [time, open, high, low, close, vwap, volume, count].
pub type OhlcRow = (i64, String, String, String, String, String, String, i64);

pub fn candle_from_row(row: &OhlcRow) -> Result<CandleBar, ProviderError> {
    let open_time = DateTime::<Utc>::from_timestamp(row.0, 0)
        .ok_or_else(|| ProviderError::Malformed(format!("ohlc time out of range: {}", row.0)))?;

    Ok(CandleBar {
        open_time,
        open: parse_decimal(&row.1, "ohlc.open")?,
        high: parse_decimal(&row.2, "ohlc.high")?,
        low: parse_decimal(&row.3, "ohlc.low")?,
        close: parse_decimal(&row.4, "ohlc.close")?,
        volume: parse_decimal(&row.6, "ohlc.volume")?,
    })
}

fn parse_levels(rows: &[DepthRow], field: &str) -> Result<Vec<PriceLevel>, ProviderError> {
    rows.iter()
        .map(|(price, qty, _ts)| {
            Ok(PriceLevel::new(
                parse_decimal(price, field)?,
                parse_decimal(qty, field)?,
            ))
        })
        .collect()
}

fn parse_decimal(raw: &str, field: &str) -> Result<Decimal, ProviderError> {
    raw.parse::<Decimal>()
        .map_err(|_| ProviderError::Malformed(format!("{}: not a number: {:?}", field, raw)))
}
