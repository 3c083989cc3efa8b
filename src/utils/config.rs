use crate::error::SignalError;
use crate::exchange::kraken::rest::KRAKEN_API;
use crate::strategy::{BiasThresholds, BiasWeights};
use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
///
/// Every field has a default matching the original deployment, so the
/// engine runs with no config file at all. A TOML file overrides section
/// by section; `CHENDA_UNIVERSE` / `CHENDA_QUOTE_PREFS` override from the
/// environment on top of that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logical symbols to compute signals for
    pub universe: Vec<String>,

    /// Quote currencies in resolution preference order
    pub quote_preferences: Vec<String>,

    /// Order book levels requested per side
    pub depth_level_count: u32,

    /// Per-symbol pipeline deadline within one snapshot, seconds
    pub snapshot_deadline_secs: f64,

    pub whale: WhaleConfig,
    pub candles: CandleConfig,
    pub bias: BiasConfig,
    pub cache: CacheConfig,
    pub exchange: ExchangeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhaleConfig {
    /// Minimum notional for a level to count as a whale
    pub usd_floor: Decimal,

    /// Maximum whale levels kept per side
    pub cap_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CandleConfig {
    pub interval_secs: u32,
    pub bar_count: usize,
    pub momentum_lookback: usize,
    pub volatility_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasConfig {
    pub weights: BiasWeights,
    pub thresholds: BiasThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub metadata_ttl_secs: u64,
    pub market_data_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub api_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub output: String,
    pub file_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            universe: split_list("BTC,ETH,SOL,XRP,LINK,ADA,DOGE,AVAX,ATOM,TRX"),
            quote_preferences: split_list("USD,USDT,EUR,USDC"),
            depth_level_count: 20,
            snapshot_deadline_secs: 15.0,
            whale: WhaleConfig::default(),
            candles: CandleConfig::default(),
            bias: BiasConfig::default(),
            cache: CacheConfig::default(),
            exchange: ExchangeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WhaleConfig {
    fn default() -> Self {
        Self {
            usd_floor: dec!(100000),
            cap_count: 10,
        }
    }
}

impl Default for CandleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            bar_count: 96,
            momentum_lookback: 12,
            volatility_window: 14,
        }
    }
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            weights: BiasWeights {
                book: 0.7,
                momentum: 0.3,
            },
            thresholds: BiasThresholds {
                high: 0.2,
                low: -0.2,
            },
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            metadata_ttl_secs: 1800,
            market_data_ttl_secs: 5,
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_endpoint: KRAKEN_API.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `CHENDA_CONFIG` or the default path, falling back to
    /// built-in defaults when no file exists, then apply env overrides.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("CHENDA_CONFIG").unwrap_or_else(|_| "config/chenda.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// The two knobs the original service honored from the environment.
    fn apply_env_overrides(&mut self) {
        if let Ok(universe) = std::env::var("CHENDA_UNIVERSE") {
            self.universe = split_list(&universe);
        }
        if let Ok(quotes) = std::env::var("CHENDA_QUOTE_PREFS") {
            self.quote_preferences = split_list(&quotes);
        }
    }

    /// Reject configurations outside sane bounds. Fatal at startup only;
    /// never called mid-computation.
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.universe.is_empty() {
            return Err(invalid("universe is empty"));
        }
        if self.quote_preferences.is_empty() {
            return Err(invalid("quote_preferences is empty"));
        }
        if self.depth_level_count == 0 {
            return Err(invalid("depth_level_count must be positive"));
        }
        if self.snapshot_deadline_secs <= 0.0 {
            return Err(invalid("snapshot_deadline_secs must be positive"));
        }
        if self.whale.usd_floor < Decimal::ZERO {
            return Err(invalid("whale.usd_floor must not be negative"));
        }
        if self.whale.cap_count == 0 {
            return Err(invalid("whale.cap_count must be positive"));
        }
        if self.candles.interval_secs == 0 {
            return Err(invalid("candles.interval_secs must be positive"));
        }
        if self.candles.momentum_lookback == 0 || self.candles.volatility_window == 0 {
            return Err(invalid("candle windows must be positive"));
        }
        if self.candles.bar_count <= self.candles.momentum_lookback {
            return Err(invalid("candles.bar_count must exceed momentum_lookback"));
        }
        if self.bias.weights.book < 0.0 || self.bias.weights.momentum < 0.0 {
            return Err(invalid("bias weights must not be negative"));
        }
        if self.bias.thresholds.low >= self.bias.thresholds.high {
            return Err(invalid("bias thresholds require low < high"));
        }
        if self.cache.metadata_ttl_secs == 0 || self.cache.market_data_ttl_secs == 0 {
            return Err(invalid("cache TTLs must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> SignalError {
    SignalError::ConfigInvalid(msg.to_string())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
