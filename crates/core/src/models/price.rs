use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;

/// In-process cache of spot prices (USD) keyed by external coin id.
///
/// There is one refresh timestamp for the whole cache, not one per id:
/// an entry is only served while the *last* refresh of any kind is inside
/// the freshness window.
#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    prices: HashMap<String, Decimal>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached price for `id`, if the cache is still fresh at `now` and the id
    /// has been seen.
    pub fn get_fresh(&self, id: &str, now: DateTime<Utc>, window: Duration) -> Option<Decimal> {
        if !self.is_fresh(now, window) {
            return None;
        }
        self.prices.get(id).copied()
    }

    /// True when the last refresh happened less than `window` before `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.refreshed_at {
            // A refresh stamped after `now` (clock moved back) still counts as fresh.
            Some(at) => (now - at).to_std().map_or(true, |age| age < window),
            None => false,
        }
    }

    /// Record a single fetched price and restamp the cache.
    pub fn store(&mut self, id: &str, price: Decimal, now: DateTime<Utc>) {
        self.prices.insert(id.to_string(), price);
        self.refreshed_at = Some(now);
    }

    /// Record the result of a bulk fetch and restamp the cache.
    /// Ids absent from `prices` keep whatever they had before.
    pub fn store_many(&mut self, prices: &HashMap<String, Decimal>, now: DateTime<Utc>) {
        for (id, price) in prices {
            self.prices.insert(id.clone(), *price);
        }
        self.refreshed_at = Some(now);
    }

    /// Last price seen for `id`, regardless of freshness.
    pub fn last_known(&self, id: &str) -> Option<Decimal> {
        self.prices.get(id).copied()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn clear(&mut self) {
        self.prices.clear();
        self.refreshed_at = None;
    }
}
