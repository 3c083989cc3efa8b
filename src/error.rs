use thiserror::Error;

/// Transport-level failures from the upstream venue.
///
/// `RateLimited` and `Network` are transient and get exactly one retry;
/// `NotFound` and `Malformed` are structural and surface immediately.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("rate limited by venue")]
    RateLimited,

    #[error("unknown asset or pair")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Whether a single retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::Network(_))
    }
}

/// Engine-level error taxonomy.
///
/// `PairNotFound` and `DataUnavailable` are per-symbol and never escape
/// `compute_snapshot` - they end up in the skip list. `ConfigInvalid` is
/// fatal and only raised at engine construction.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("no tradable pair for {symbol} under any preferred quote")]
    PairNotFound { symbol: String },

    #[error("{feed} feed unavailable for {pair}: {source}")]
    DataUnavailable {
        feed: &'static str,
        pair: String,
        #[source]
        source: ProviderError,
    },

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::RateLimited.is_transient());
        assert!(ProviderError::Network("timeout".into()).is_transient());
        assert!(!ProviderError::NotFound.is_transient());
        assert!(!ProviderError::Malformed("bad shape".into()).is_transient());
    }
}
