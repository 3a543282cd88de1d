#![allow(dead_code)]

// ═══════════════════════════════════════════════════════════════════
// Shared test helpers: scripted market data provider, clock, gateway
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crypto_portfolio_core::clock::ManualClock;
use crypto_portfolio_core::config::GatewayConfig;
use crypto_portfolio_core::errors::{CoreError, RemoteError, RemoteErrorKind};
use crypto_portfolio_core::models::coin::{CoinCandidate, CoinInfo};
use crypto_portfolio_core::providers::traits::MarketDataProvider;
use crypto_portfolio_core::services::price_gateway::PriceGateway;

/// A provider backed by in-memory tables that counts every call and can be
/// switched into a failing mode.
pub struct MockMarket {
    prices: Mutex<HashMap<String, Decimal>>,
    coins: Mutex<HashMap<String, CoinInfo>>,
    failure: Mutex<Option<RemoteError>>,
    pub price_calls: AtomicUsize,
    pub info_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl MockMarket {
    /// Knows bitcoin (BTC, 60 000) and ethereum (ETH, 3 000).
    pub fn new() -> Self {
        let market = Self {
            prices: Mutex::new(HashMap::new()),
            coins: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            price_calls: AtomicUsize::new(0),
            info_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
        };
        market.add_coin("bitcoin", "btc", "Bitcoin", dec!(60000));
        market.add_coin("ethereum", "eth", "Ethereum", dec!(3000));
        market
    }

    pub fn add_coin(&self, id: &str, symbol: &str, name: &str, price: Decimal) {
        self.coins.lock().unwrap().insert(
            id.to_string(),
            CoinInfo {
                id: id.to_string(),
                symbol: symbol.to_uppercase(),
                name: name.to_string(),
                image_url: Some(format!("https://img.example/{id}.png")),
                current_price: Some(price),
            },
        );
        self.set_price(id, price);
    }

    pub fn set_price(&self, id: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(id.to_string(), price);
    }

    /// Keep the coin's metadata but stop quoting a price for it.
    pub fn remove_price(&self, id: &str) {
        self.prices.lock().unwrap().remove(id);
    }

    pub fn fail_with(&self, kind: RemoteErrorKind, message: &str) {
        *self.failure.lock().unwrap() = Some(RemoteError::new(kind, message));
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), CoreError> {
        match self.failure.lock().unwrap().clone() {
            Some(e) => Err(CoreError::Remote(e)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketDataProvider for MockMarket {
    fn name(&self) -> &str {
        "MockMarket"
    }

    async fn search(&self, query: &str) -> Result<Vec<CoinCandidate>, CoreError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let q = query.to_lowercase();
        let mut results: Vec<CoinCandidate> = self
            .coins
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.name.to_lowercase().contains(&q) || c.symbol.to_lowercase().contains(&q))
            .map(|c| CoinCandidate {
                id: c.id.clone(),
                symbol: c.symbol.clone(),
                name: c.name.clone(),
                thumb: None,
                market_cap_rank: None,
            })
            .collect();
        results.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(results)
    }

    async fn coin_info(&self, id: &str) -> Result<Option<CoinInfo>, CoreError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.coins.lock().unwrap().get(id).cloned())
    }

    async fn simple_prices(&self, ids: &[String]) -> Result<HashMap<String, Decimal>, CoreError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let prices = self.prices.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| prices.get(id).map(|p| (id.clone(), *p)))
            .collect())
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct Harness {
    pub market: Arc<MockMarket>,
    pub clock: Arc<ManualClock>,
    pub gateway: Arc<PriceGateway>,
}

pub fn harness() -> Harness {
    harness_with(MockMarket::new())
}

pub fn harness_with(market: MockMarket) -> Harness {
    let market = Arc::new(market);
    let clock = Arc::new(ManualClock::new(start_time()));
    let gateway = Arc::new(PriceGateway::new(
        market.clone(),
        clock.clone(),
        &GatewayConfig::default(),
    ));
    Harness {
        market,
        clock,
        gateway,
    }
}
