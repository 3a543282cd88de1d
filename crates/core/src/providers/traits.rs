use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::coin::{CoinCandidate, CoinInfo};

/// Trait abstraction for the remote market data service.
///
/// The price gateway is the only caller. It owns caching and error
/// recording; implementations only translate calls to the wire and back.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Free-text search over coin names and symbols.
    async fn search(&self, query: &str) -> Result<Vec<CoinCandidate>, CoreError>;

    /// Metadata for one coin. `Ok(None)` when the service has no such id.
    async fn coin_info(&self, id: &str) -> Result<Option<CoinInfo>, CoreError>;

    /// USD spot prices for many ids in one request.
    /// Ids the service does not know are simply missing from the map.
    async fn simple_prices(&self, ids: &[String]) -> Result<HashMap<String, Decimal>, CoreError>;
}
