use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::{GatewayConfig, MAX_SEARCH_LIMIT};
use crate::errors::{CoreError, RemoteError};
use crate::models::book::LedgerBook;
use crate::models::coin::{Coin, CoinCandidate, CoinInfo};
use crate::models::price::PriceCache;
use crate::providers::coingecko::CoinGeckoProvider;
use crate::providers::traits::MarketDataProvider;

/// Outcome of a price refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    /// Number of coins whose price was written back
    pub updated: usize,
    /// The failure of this particular refresh, if any
    pub error: Option<RemoteError>,
}

impl RefreshReport {
    /// A refresh failed when nothing came back and the call errored.
    pub fn is_success(&self) -> bool {
        !(self.updated == 0 && self.error.is_some())
    }
}

/// The single owner of the remote market data dependency.
///
/// Wraps a [`MarketDataProvider`] with:
/// - a spot-price cache shared by every id, with one global refresh stamp;
/// - a last-error slot, overwritten by every remote call;
/// - graceful degradation: reads return empty or partial results instead
///   of failing.
///
/// One gateway is built at startup and shared by handle (`Arc<PriceGateway>`);
/// its state lives behind interior mutexes that are never held across an await.
pub struct PriceGateway {
    provider: Arc<dyn MarketDataProvider>,
    clock: Arc<dyn Clock>,
    freshness_window: Duration,
    search_limit: usize,
    cache: Mutex<PriceCache>,
    last_error: Mutex<Option<RemoteError>>,
}

impl std::fmt::Debug for PriceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceGateway")
            .field("provider", &self.provider.name())
            .field("freshness_window", &self.freshness_window)
            .field("search_limit", &self.search_limit)
            .field("cached_prices", &self.cached_price_count())
            .finish()
    }
}

impl PriceGateway {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        clock: Arc<dyn Clock>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            provider,
            clock,
            freshness_window: config.freshness_window,
            search_limit: config.search_limit.min(MAX_SEARCH_LIMIT),
            cache: Mutex::new(PriceCache::new()),
            last_error: Mutex::new(None),
        }
    }

    /// Gateway backed by CoinGecko and the wall clock.
    pub fn coingecko(config: &GatewayConfig) -> Result<Self, CoreError> {
        let provider = CoinGeckoProvider::new(config)?;
        Ok(Self::new(Arc::new(provider), Arc::new(SystemClock), config))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // ── Search & metadata ───────────────────────────────────────────

    /// Search coins by name or symbol. At most `search_limit` candidates;
    /// empty on failure, with the reason left in [`PriceGateway::last_error`].
    pub async fn search(&self, query: &str) -> Vec<CoinCandidate> {
        self.try_search(query).await.unwrap_or_default()
    }

    /// Like [`PriceGateway::search`] but also hands back this call's failure.
    pub async fn try_search(&self, query: &str) -> Result<Vec<CoinCandidate>, RemoteError> {
        self.begin_call();
        match self.provider.search(query).await {
            Ok(mut results) => {
                results.truncate(self.search_limit);
                Ok(results)
            }
            Err(e) => Err(self.record_failure("search", e)),
        }
    }

    /// Remote metadata lookup. `None` when the id is unknown or the call failed.
    pub async fn fetch_coin_info(&self, id: &str) -> Option<CoinInfo> {
        self.begin_call();
        match self.provider.coin_info(id).await {
            Ok(Some(info)) => Some(info),
            Ok(None) => {
                tracing::debug!(coin_id = %id, "coin not known to price service");
                None
            }
            Err(e) => {
                self.record_failure("coin_info", e);
                None
            }
        }
    }

    /// Fetch-or-create a local coin.
    ///
    /// A coin already in `book` is returned as-is without touching the remote
    /// service. Otherwise its metadata is fetched and a new coin persisted.
    pub async fn resolve(&self, book: &mut LedgerBook, id: &str) -> Result<Option<Coin>, CoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        if let Some(existing) = book.coin(id) {
            return Ok(Some(existing.clone()));
        }

        let info = match self.fetch_coin_info(id).await {
            Some(info) => info,
            None => return Ok(None),
        };

        let mut coin = Coin::from_info(info, self.clock.now());
        // Keep the id the caller asked for; it is the key everything else uses.
        coin.id = id.to_string();
        let coin = book.insert_coin(coin)?.clone();
        tracing::info!(coin_id = %coin.id, symbol = %coin.symbol, "registered new coin");
        Ok(Some(coin))
    }

    // ── Prices ──────────────────────────────────────────────────────

    /// Spot price for one id, served from cache while fresh.
    pub async fn spot_price(&self, id: &str) -> Option<Decimal> {
        let now = self.clock.now();
        if let Some(price) = self.lock_cache().get_fresh(id, now, self.freshness_window) {
            tracing::debug!(coin_id = %id, %price, "spot price served from cache");
            return Some(price);
        }

        self.begin_call();
        let ids = [id.to_string()];
        match self.provider.simple_prices(&ids).await {
            Ok(prices) => {
                let price = prices.get(id).copied()?;
                self.lock_cache().store(id, price, self.clock.now());
                Some(price)
            }
            Err(e) => {
                self.record_failure("spot_price", e);
                None
            }
        }
    }

    /// Spot prices for many ids in one remote call. Ids the service does not
    /// return are left out; a failed call yields an empty map.
    pub async fn bulk_spot_price(&self, ids: &[String]) -> HashMap<String, Decimal> {
        self.try_bulk_spot_price(ids).await.unwrap_or_default()
    }

    async fn try_bulk_spot_price(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Decimal>, RemoteError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.begin_call();
        match self.provider.simple_prices(ids).await {
            Ok(mut prices) => {
                // Only keep what was asked for.
                prices.retain(|id, _| ids.contains(id));
                self.lock_cache().store_many(&prices, self.clock.now());
                if prices.len() < ids.len() {
                    tracing::debug!(
                        requested = ids.len(),
                        returned = prices.len(),
                        "price service omitted some ids"
                    );
                }
                Ok(prices)
            }
            Err(e) => Err(self.record_failure("bulk_spot_price", e)),
        }
    }

    /// Refresh `current_price` and `last_updated` on the given coins.
    ///
    /// Returns `false` only when no price came back and the call failed.
    pub async fn refresh_prices(&self, coins: Vec<&mut Coin>) -> bool {
        self.refresh_prices_report(coins).await.is_success()
    }

    /// Same as [`PriceGateway::refresh_prices`], reporting this call's own error.
    pub async fn refresh_prices_report(&self, mut coins: Vec<&mut Coin>) -> RefreshReport {
        if coins.is_empty() {
            return RefreshReport {
                updated: 0,
                error: None,
            };
        }

        let ids: Vec<String> = coins.iter().map(|c| c.id.clone()).collect();
        let (prices, error) = match self.try_bulk_spot_price(&ids).await {
            Ok(prices) => (prices, None),
            Err(e) => (HashMap::new(), Some(e)),
        };

        let now = self.clock.now();
        let mut updated = 0;
        for coin in coins.iter_mut() {
            if let Some(price) = prices.get(&coin.id) {
                coin.apply_price(*price, now);
                updated += 1;
            }
        }

        tracing::debug!(requested = ids.len(), updated, "price refresh finished");
        RefreshReport { updated, error }
    }

    // ── Error slot & cache inspection ───────────────────────────────

    /// The failure of the most recent remote call, if it failed.
    pub fn last_error(&self) -> Option<RemoteError> {
        self.last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn cached_price_count(&self) -> usize {
        self.lock_cache().len()
    }

    /// Last price seen for `id`, ignoring freshness.
    pub fn last_known_price(&self, id: &str) -> Option<Decimal> {
        self.lock_cache().last_known(id)
    }

    /// Drop every cached price so the next lookup goes to the network.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    // ── Internal ────────────────────────────────────────────────────

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, PriceCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every remote call overwrites the slot: cleared on start, set on failure.
    fn begin_call(&self) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn record_failure(&self, operation: &str, error: CoreError) -> RemoteError {
        let error = error.into_remote();
        tracing::warn!(
            provider = self.provider.name(),
            operation,
            kind = %error.kind,
            error = %error.message,
            "price service call failed"
        );
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(error.clone());
        error
    }
}
