use std::env;
use std::time::Duration;

use crate::errors::CoreError;

/// Public CoinGecko v3 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Upper bound on a single remote call before it counts as a timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long cached spot prices are served without a new remote call.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(60);

/// Maximum number of candidates returned by a coin search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// `PRICE_SEARCH_LIMIT` may lower the search cap, never raise it.
pub const MAX_SEARCH_LIMIT: usize = DEFAULT_SEARCH_LIMIT;

/// Settings for the price gateway and its remote provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Optional demo API key, sent as a header (never in the URL).
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub freshness_window: Duration,
    pub search_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl GatewayConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable                     | Default                            |
    /// |------------------------------|------------------------------------|
    /// | `COINGECKO_BASE_URL`         | `https://api.coingecko.com/api/v3` |
    /// | `COINGECKO_API_KEY`          | unset                              |
    /// | `PRICE_REQUEST_TIMEOUT_SECS` | `30`                               |
    /// | `PRICE_CACHE_TTL_SECS`       | `60`                               |
    /// | `PRICE_SEARCH_LIMIT`         | `10` (1 to 10)                     |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`GatewayConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("COINGECKO_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);

        let api_key = lookup("COINGECKO_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let request_timeout = match lookup("PRICE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("PRICE_REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let freshness_window = match lookup("PRICE_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_number("PRICE_CACHE_TTL_SECS", &raw)?),
            None => defaults.freshness_window,
        };

        let search_limit = match lookup("PRICE_SEARCH_LIMIT") {
            Some(raw) => match parse_positive("PRICE_SEARCH_LIMIT", &raw)? as usize {
                n if n > MAX_SEARCH_LIMIT => {
                    return Err(CoreError::Config(format!(
                        "PRICE_SEARCH_LIMIT must be at most {MAX_SEARCH_LIMIT}"
                    )))
                }
                n => n,
            },
            None => defaults.search_limit,
        };

        Ok(Self {
            base_url,
            api_key,
            request_timeout,
            freshness_window,
            search_limit,
        })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64, CoreError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| CoreError::Config(format!("{name}={raw:?} is not a valid number: {e}")))
}

fn parse_positive(name: &str, raw: &str) -> Result<u64, CoreError> {
    match parse_number(name, raw)? {
        0 => Err(CoreError::Config(format!("{name} must be greater than zero"))),
        n => Ok(n),
    }
}
