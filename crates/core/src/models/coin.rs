use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A coin known to the local book, keyed by its stable external id
/// (e.g., "bitcoin", "ethereum").
///
/// `current_price` is a best-effort cached value in USD, not authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// External id used by the price service
    pub id: String,

    /// Ticker symbol, uppercased (e.g., "BTC")
    pub symbol: String,

    /// Human-readable name (e.g., "Bitcoin")
    pub name: String,

    /// Small icon URL, if the price service provided one
    #[serde(default)]
    pub image_url: Option<String>,

    /// Last known spot price in USD
    pub current_price: Decimal,

    /// When `current_price` was last written
    pub last_updated: DateTime<Utc>,
}

impl Coin {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: Decimal,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            image_url: None,
            current_price,
            last_updated: at,
        }
    }

    /// Build a local coin record from remote metadata.
    /// A missing spot price is stored as zero.
    pub fn from_info(info: CoinInfo, at: DateTime<Utc>) -> Self {
        let mut coin = Self::new(
            info.id,
            info.symbol,
            info.name,
            info.current_price.unwrap_or(Decimal::ZERO),
            at,
        );
        coin.image_url = info.image_url.filter(|url| !url.is_empty());
        coin
    }

    /// Overwrite the cached price after a successful refresh.
    pub fn apply_price(&mut self, price: Decimal, at: DateTime<Utc>) {
        self.current_price = price;
        self.last_updated = at;
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}

/// One row of a free-text coin search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinCandidate {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub thumb: Option<String>,
    pub market_cap_rank: Option<u32>,
}

/// Metadata for a single coin as reported by the price service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub current_price: Option<Decimal>,
}
