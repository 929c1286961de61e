//! Configuration
//! 環境変数 (.env 含む) からサーバー設定を読み込む

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// ========================================
// 既定値
// ========================================

pub const TOTAL_CAP: u64 = 1_000_000;
pub const MIN_PRICE: f64 = 29.99;
pub const MAX_PRICE: f64 = 999_999.00;
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_PAGE_SIZE: u64 = 24;
pub const MAX_PAGE_SIZE: u64 = 200;
pub const BROWSE_MAX_PAGES: u64 = 50;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("price range is invalid: min_price={min_price}, max_price={max_price}")]
    InvalidPriceRange { min_price: f64, max_price: f64 },

    #[error("{key} must be at least 1")]
    InvalidCap { key: &'static str },
}

// ========================================
// CatalogConfig
// ========================================

/// カタログ生成の静的設定
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub total_cap: u64,
    pub min_price: f64,
    pub max_price: f64,
    pub currency: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            total_cap: TOTAL_CAP,
            min_price: MIN_PRICE,
            max_price: MAX_PRICE,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_cap == 0 {
            return Err(ConfigError::InvalidCap { key: "MARKET_TOTAL_CAP" });
        }
        let finite = self.min_price.is_finite() && self.max_price.is_finite();
        if !finite || self.min_price < 0.0 || self.min_price > self.max_price {
            return Err(ConfigError::InvalidPriceRange {
                min_price: self.min_price,
                max_price: self.max_price,
            });
        }
        Ok(())
    }
}

// ========================================
// AppConfig
// ========================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub catalog: CatalogConfig,
    pub max_page_size: u64,
    pub browse_max_pages: u64,
    pub upstream_url: Option<String>,
    pub upstream_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            catalog: CatalogConfig::default(),
            max_page_size: MAX_PAGE_SIZE,
            browse_max_pages: BROWSE_MAX_PAGES,
            upstream_url: None,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// プロセス環境変数から読み込み（.env があれば先に反映）
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match (lookup("MARKET_BIND_ADDR"), lookup("PORT")) {
            (Some(addr), _) if !addr.trim().is_empty() => addr.trim().to_string(),
            (_, Some(port)) => {
                let port: u16 = parse_value("PORT", &port)?;
                format!("0.0.0.0:{}", port)
            }
            _ => defaults.bind_addr,
        };

        let catalog = CatalogConfig {
            total_cap: parse_or("MARKET_TOTAL_CAP", &lookup, defaults.catalog.total_cap)?,
            min_price: parse_or("MARKET_MIN_PRICE", &lookup, defaults.catalog.min_price)?,
            max_price: parse_or("MARKET_MAX_PRICE", &lookup, defaults.catalog.max_price)?,
            currency: lookup("MARKET_CURRENCY")
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.catalog.currency),
        };
        catalog.validate()?;

        let max_page_size = parse_or("MARKET_MAX_PAGE_SIZE", &lookup, defaults.max_page_size)?;
        if max_page_size == 0 {
            return Err(ConfigError::InvalidCap { key: "MARKET_MAX_PAGE_SIZE" });
        }
        let browse_max_pages =
            parse_or("MARKET_BROWSE_MAX_PAGES", &lookup, defaults.browse_max_pages)?;
        if browse_max_pages == 0 {
            return Err(ConfigError::InvalidCap { key: "MARKET_BROWSE_MAX_PAGES" });
        }

        let upstream_url = lookup("MARKET_UPSTREAM_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        let timeout_secs = parse_or(
            "MARKET_UPSTREAM_TIMEOUT_SECS",
            &lookup,
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;

        Ok(Self {
            bind_addr,
            catalog,
            max_page_size,
            browse_max_pages,
            upstream_url,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => parse_value(key, &raw),
        _ => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
