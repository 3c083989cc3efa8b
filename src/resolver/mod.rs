pub mod aliases;

use crate::cache::TtlCache;
use crate::data::TradingPair;
use crate::error::{ProviderError, SignalError};
use crate::exchange::MarketDataProvider;
use aliases::aliases;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// TTL-backed store of the venue's asset and pair listings.
///
/// Listings change rarely, so this is the one place stale data is
/// acceptable: when a refresh fails and a previous value exists, the old
/// directory is served with a warning instead of failing the caller.
pub struct MetadataCache {
    provider: Arc<dyn MarketDataProvider>,
    altnames: TtlCache<&'static str, Arc<HashSet<String>>>,
    directory: TtlCache<&'static str, Arc<HashMap<String, String>>>,
}

impl MetadataCache {
    pub fn new(provider: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            altnames: TtlCache::new(ttl).with_stale_fallback(),
            directory: TtlCache::new(ttl).with_stale_fallback(),
        }
    }

    /// Altnames of all listed assets, lazily populated.
    pub async fn asset_altnames(&self) -> Result<Arc<HashSet<String>>, ProviderError> {
        let provider = Arc::clone(&self.provider);
        self.altnames
            .get_or_fetch("assets", move || async move {
                provider.asset_altnames().await.map(Arc::new)
            })
            .await
    }

    /// Pair altname -> venue pair key, lazily populated.
    pub async fn pair_directory(&self) -> Result<Arc<HashMap<String, String>>, ProviderError> {
        let provider = Arc::clone(&self.provider);
        self.directory
            .get_or_fetch("pairs", move || async move {
                provider.pair_directory().await.map(Arc::new)
            })
            .await
    }
}

/// Maps logical symbols to venue trading pairs.
pub struct PairResolver {
    metadata: MetadataCache,
}

impl PairResolver {
    pub fn new(metadata: MetadataCache) -> Self {
        Self { metadata }
    }

    /// Resolve `symbol` against the pair directory.
    ///
    /// Candidate bases are the symbol itself plus its known aliases;
    /// aliases are only tried when the venue actually lists them. The walk
    /// is base-candidate-major, quote-preference-minor, so resolution is
    /// deterministic for an unchanged directory: "BTC" with quotes
    /// [USD, USDT] prefers XBTUSD, falls back to XBTUSDT.
    pub async fn resolve(
        &self,
        symbol: &str,
        quote_prefs: &[String],
    ) -> Result<TradingPair, SignalError> {
        let sym = symbol.to_uppercase();

        let altnames = self
            .metadata
            .asset_altnames()
            .await
            .map_err(|e| metadata_unavailable(&sym, e))?;
        let directory = self
            .metadata
            .pair_directory()
            .await
            .map_err(|e| metadata_unavailable(&sym, e))?;

        let mut candidates: Vec<String> = vec![sym.clone()];
        for alias in aliases(&sym) {
            if altnames.contains(*alias) {
                candidates.push((*alias).to_string());
            }
        }

        for base in &candidates {
            for quote in quote_prefs {
                let quote = quote.to_uppercase();
                let altname = format!("{}{}", base, quote);
                if let Some(pair_key) = directory.get(&altname) {
                    return Ok(TradingPair {
                        symbol: sym,
                        base_alt: base.clone(),
                        quote,
                        pair_key: pair_key.clone(),
                        altname,
                    });
                }
            }
        }

        Err(SignalError::PairNotFound { symbol: sym })
    }
}

fn metadata_unavailable(symbol: &str, source: ProviderError) -> SignalError {
    SignalError::DataUnavailable {
        feed: "metadata",
        pair: symbol.to_string(),
        source,
    }
}
