mod common;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use uuid::Uuid;

use common::{date, start_time};
use crypto_portfolio_core::clock::{Clock, ManualClock};
use crypto_portfolio_core::errors::CoreError;
use crypto_portfolio_core::models::book::LedgerBook;
use crypto_portfolio_core::models::coin::{Coin, CoinInfo};
use crypto_portfolio_core::models::position::Position;
use crypto_portfolio_core::models::price::PriceCache;
use crypto_portfolio_core::models::transaction::{
    NewTransaction, Transaction, TransactionSort, TransactionType,
};

// ═══════════════════════════════════════════════════════════════════
//  Coin
// ═══════════════════════════════════════════════════════════════════

mod coin {
    use super::*;

    #[test]
    fn symbol_is_uppercased() {
        let c = Coin::new("bitcoin", "btc", "Bitcoin", dec!(1), start_time());
        assert_eq!(c.symbol, "BTC");
        assert_eq!(c.to_string(), "Bitcoin (BTC)");
    }

    #[test]
    fn from_info_defaults_missing_price_to_zero() {
        let info = CoinInfo {
            id: "obscure".into(),
            symbol: "obs".into(),
            name: "Obscure".into(),
            image_url: Some(String::new()),
            current_price: None,
        };
        let c = Coin::from_info(info, start_time());
        assert_eq!(c.current_price, Decimal::ZERO);
        assert_eq!(c.image_url, None);
        assert_eq!(c.symbol, "OBS");
    }

    #[test]
    fn apply_price_moves_timestamp() {
        let mut c = Coin::new("bitcoin", "btc", "Bitcoin", dec!(1), start_time());
        let later = start_time() + Duration::hours(1);
        c.apply_price(dec!(2), later);
        assert_eq!(c.current_price, dec!(2));
        assert_eq!(c.last_updated, later);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  TransactionType & TransactionSort
// ═══════════════════════════════════════════════════════════════════

mod transaction_type {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(TransactionType::Buy.to_string(), "BUY");
        assert_eq!(TransactionType::Sell.to_string(), "SELL");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(" buy ".parse::<TransactionType>(), Ok(TransactionType::Buy));
        assert_eq!("Sell".parse::<TransactionType>(), Ok(TransactionType::Sell));
    }

    #[test]
    fn parse_rejects_other_words() {
        let err = "HODL".parse::<TransactionType>().unwrap_err();
        assert!(err.contains("HODL"));
    }
}

mod transaction_sort {
    use super::*;

    #[test]
    fn allow_listed_keys_round_trip() {
        for key in ["transaction_date", "-transaction_date", "total_amount", "-total_amount"] {
            assert_eq!(TransactionSort::from_key(key).key(), key);
        }
    }

    #[test]
    fn anything_else_is_newest_first() {
        assert_eq!(TransactionSort::from_key("notes"), TransactionSort::DateDesc);
        assert_eq!(TransactionSort::from_key("-created_at"), TransactionSort::DateDesc);
        assert_eq!(TransactionSort::from_key("TOTAL_AMOUNT"), TransactionSort::DateDesc);
        assert_eq!(TransactionSort::default(), TransactionSort::DateDesc);
    }
}

#[test]
fn transaction_total_is_exact_product() {
    let request = NewTransaction::buy("bitcoin", dec!(0.00012345), dec!(67890.12), date(2025, 1, 1));
    let tx = Transaction::new(Uuid::new_v4(), &request, start_time()).unwrap();
    assert_eq!(tx.total_amount, dec!(8.381035314));
    assert_eq!(tx.notes, "");
}

#[test]
fn transaction_total_out_of_range_is_an_error() {
    let huge = dec!(100000000000000000000);
    let request = NewTransaction::buy("bitcoin", huge, huge, date(2025, 1, 1));
    let err = Transaction::new(Uuid::new_v4(), &request, start_time()).unwrap_err();
    assert!(matches!(err, CoreError::Overflow(ref m) if m.contains("out of range")));
}

// ═══════════════════════════════════════════════════════════════════
//  PriceCache
// ═══════════════════════════════════════════════════════════════════

mod price_cache {
    use super::*;
    use std::time::Duration as StdDuration;

    const WINDOW: StdDuration = StdDuration::from_secs(60);

    #[test]
    fn empty_cache_is_stale() {
        let cache = PriceCache::new();
        assert!(!cache.is_fresh(start_time(), WINDOW));
        assert!(cache.is_empty());
    }

    #[test]
    fn fresh_until_window_elapses() {
        let mut cache = PriceCache::new();
        cache.store("bitcoin", dec!(1), start_time());

        let almost = start_time() + Duration::seconds(59);
        let exactly = start_time() + Duration::seconds(60);
        assert_eq!(cache.get_fresh("bitcoin", almost, WINDOW), Some(dec!(1)));
        assert_eq!(cache.get_fresh("bitcoin", exactly, WINDOW), None);
        assert_eq!(cache.last_known("bitcoin"), Some(dec!(1)));
    }

    #[test]
    fn store_many_keeps_unmentioned_ids_and_restamps() {
        let mut cache = PriceCache::new();
        cache.store("bitcoin", dec!(1), start_time());

        let later = start_time() + Duration::seconds(120);
        cache.store_many(&HashMap::new(), later);

        assert_eq!(cache.refreshed_at(), Some(later));
        assert_eq!(cache.get_fresh("bitcoin", later, WINDOW), Some(dec!(1)));
    }

    #[test]
    fn clear_drops_prices_and_stamp() {
        let mut cache = PriceCache::new();
        cache.store("bitcoin", dec!(1), start_time());
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.refreshed_at(), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  LedgerBook constraints
// ═══════════════════════════════════════════════════════════════════

mod book {
    use super::*;

    fn with_bitcoin() -> LedgerBook {
        let mut book = LedgerBook::new();
        book.insert_coin(Coin::new("bitcoin", "btc", "Bitcoin", dec!(1), start_time()))
            .unwrap();
        book
    }

    #[test]
    fn duplicate_coin_rejected() {
        let mut book = with_bitcoin();
        let err = book
            .insert_coin(Coin::new("bitcoin", "xbt", "Other", dec!(2), start_time()))
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(book.coin("bitcoin").unwrap().symbol, "BTC");
    }

    #[test]
    fn position_needs_known_coin() {
        let mut book = LedgerBook::new();
        let err = book
            .insert_position(Position::new(Uuid::new_v4(), "bitcoin"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }

    #[test]
    fn one_position_per_user_and_coin() {
        let mut book = with_bitcoin();
        let user = Uuid::new_v4();
        book.insert_position(Position::new(user, "bitcoin")).unwrap();

        assert!(book.insert_position(Position::new(user, "bitcoin")).is_err());
        assert!(book.insert_position(Position::new(Uuid::new_v4(), "bitcoin")).is_ok());
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut book = with_bitcoin();
        let user = Uuid::new_v4();
        let a = book.get_or_create_position(user, "bitcoin").unwrap();
        let b = book.get_or_create_position(user, "bitcoin").unwrap();
        assert_eq!(a, b);
        assert_eq!(book.positions.len(), 1);
    }

    #[test]
    fn transaction_needs_known_position() {
        let mut book = with_bitcoin();
        let request = NewTransaction::buy("bitcoin", dec!(1), dec!(1), date(2025, 1, 1));
        let err = book
            .insert_transaction(Transaction::new(Uuid::new_v4(), &request, start_time()).unwrap())
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }

    #[test]
    fn update_unknown_position_fails() {
        let mut book = with_bitcoin();
        assert!(book.update_position(Position::new(Uuid::new_v4(), "bitcoin")).is_err());
    }

    #[test]
    fn coins_mut_skips_unknown_ids() {
        let mut book = with_bitcoin();
        let ids = vec!["bitcoin".to_string(), "ghost".to_string()];
        assert_eq!(book.coins_mut(&ids).len(), 1);
    }

    #[test]
    fn transactions_for_user_excludes_others() {
        let mut book = with_bitcoin();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let request = NewTransaction::buy("bitcoin", dec!(1), dec!(1), date(2025, 1, 1));
        for user in [alice, bob, bob] {
            let position = book.get_or_create_position(user, "bitcoin").unwrap();
            book.insert_transaction(Transaction::new(position, &request, start_time()).unwrap())
                .unwrap();
        }

        assert_eq!(book.transactions_for_user(alice).len(), 1);
        assert_eq!(book.transactions_for_user(bob).len(), 2);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  ManualClock
// ═══════════════════════════════════════════════════════════════════

#[test]
fn manual_clock_moves_only_when_told() {
    let clock = ManualClock::new(start_time());
    assert_eq!(clock.now(), start_time());

    clock.advance(Duration::seconds(90));
    assert_eq!(clock.now(), start_time() + Duration::seconds(90));

    clock.set(start_time());
    assert_eq!(clock.now(), start_time());
}
