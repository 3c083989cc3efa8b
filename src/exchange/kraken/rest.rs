use crate::data::{CandleBar, OrderBookSnapshot, Ticker};
use crate::error::ProviderError;
use crate::exchange::kraken::types::{
    candle_from_row, AssetInfo, DepthData, Envelope, OhlcRow, PairInfo, TickerInfo,
};
use crate::exchange::MarketDataProvider;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// Production Kraken endpoint.
pub const KRAKEN_API: &str = "https://api.kraken.com";

/// Kraken public REST API client.
///
/// Public endpoints only - no authentication. All responses are validated
/// into typed structures here; nothing dynamic crosses this boundary.
pub struct KrakenRestClient {
    client: Client,
    base_url: String,
}

impl KrakenRestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch one public endpoint and unwrap the Kraken envelope.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/0/public/{}", self.base_url, endpoint);
        debug!(%url, "kraken request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("http status {}", status)));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if !envelope.error.is_empty() {
            return Err(map_venue_error(&envelope.error));
        }

        envelope
            .result
            .ok_or_else(|| ProviderError::Malformed("envelope missing result".into()))
    }
}

/// Map Kraken's error strings onto the typed taxonomy.
fn map_venue_error(errors: &[String]) -> ProviderError {
    let joined = errors.join(",");
    if joined.contains("Rate limit") || joined.contains("Too many requests") {
        ProviderError::RateLimited
    } else if joined.contains("Unknown asset") {
        ProviderError::NotFound
    } else {
        ProviderError::Network(joined)
    }
}

/// Pull the per-pair payload out of a keyed result map.
///
/// Kraken keys responses by canonical pair key; tolerate a single-entry
/// map under a different spelling since we only ever ask for one pair.
fn take_pair_entry<T>(mut map: HashMap<String, T>, pair_key: &str) -> Result<T, ProviderError> {
    if let Some(entry) = map.remove(pair_key) {
        return Ok(entry);
    }
    if map.len() == 1 {
        if let Some(entry) = map.into_values().next() {
            return Ok(entry);
        }
    }
    Err(ProviderError::Malformed(format!(
        "response missing pair {}",
        pair_key
    )))
}

#[async_trait]
impl MarketDataProvider for KrakenRestClient {
    async fn asset_altnames(&self) -> Result<HashSet<String>, ProviderError> {
        let assets: HashMap<String, AssetInfo> = self.get("Assets", &[]).await?;
        Ok(assets
            .into_values()
            .map(|a| a.altname.to_uppercase())
            .collect())
    }

    async fn pair_directory(&self) -> Result<HashMap<String, String>, ProviderError> {
        let pairs: HashMap<String, PairInfo> = self.get("AssetPairs", &[]).await?;
        Ok(pairs
            .into_iter()
            .filter(|(_, info)| !info.altname.is_empty())
            .map(|(key, info)| (info.altname.to_uppercase(), key))
            .collect())
    }

    async fn ticker(&self, pair_key: &str) -> Result<Ticker, ProviderError> {
        let result: HashMap<String, TickerInfo> = self
            .get("Ticker", &[("pair", pair_key.to_string())])
            .await?;
        take_pair_entry(result, pair_key)?.into_ticker()
    }

    async fn depth(&self, pair_key: &str, count: u32) -> Result<OrderBookSnapshot, ProviderError> {
        let result: HashMap<String, DepthData> = self
            .get(
                "Depth",
                &[
                    ("pair", pair_key.to_string()),
                    ("count", count.to_string()),
                ],
            )
            .await?;
        take_pair_entry(result, pair_key)?.into_snapshot(Utc::now())
    }

    async fn candles(
        &self,
        pair_key: &str,
        interval_secs: u32,
        bars: usize,
    ) -> Result<Vec<CandleBar>, ProviderError> {
        // Kraken's OHLC interval is in minutes.
        let interval_min = (interval_secs / 60).max(1);
        let result: serde_json::Value = self
            .get(
                "OHLC",
                &[
                    ("pair", pair_key.to_string()),
                    ("interval", interval_min.to_string()),
                ],
            )
            .await?;

        // Result is {"<pair key>": [[...], ...], "last": <id>}.
        let rows_value = result
            .get(pair_key)
            .or_else(|| {
                result
                    .as_object()
                    .and_then(|obj| obj.iter().find(|(k, _)| *k != "last").map(|(_, v)| v))
            })
            .ok_or_else(|| {
                ProviderError::Malformed(format!("ohlc response missing pair {}", pair_key))
            })?;

        let rows: Vec<OhlcRow> = serde_json::from_value(rows_value.clone())
            .map_err(|e| ProviderError::Malformed(format!("ohlc rows: {}", e)))?;

        let mut candles = rows
            .iter()
            .map(candle_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        // Keep the most recent `bars`, time order preserved.
        if candles.len() > bars {
            candles.drain(..candles.len() - bars);
        }
        Ok(candles)
    }
}
