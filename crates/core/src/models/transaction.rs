use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Buy,
    Sell,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            other => Err(format!("unknown transaction type '{other}' (expected BUY or SELL)")),
        }
    }
}

/// Sort order for transaction listings.
///
/// Only these four orders are accepted from callers; see [`TransactionSort::from_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionSort {
    /// Oldest transaction date first
    DateAsc,
    /// Newest transaction date first (default)
    #[default]
    DateDesc,
    /// Smallest total amount first
    TotalAsc,
    /// Largest total amount first
    TotalDesc,
}

impl TransactionSort {
    /// Parse a caller-supplied sort key. Anything outside the allow-list
    /// falls back to newest-first rather than failing.
    pub fn from_key(key: &str) -> Self {
        match key {
            "transaction_date" => TransactionSort::DateAsc,
            "-transaction_date" => TransactionSort::DateDesc,
            "total_amount" => TransactionSort::TotalAsc,
            "-total_amount" => TransactionSort::TotalDesc,
            _ => TransactionSort::default(),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            TransactionSort::DateAsc => "transaction_date",
            TransactionSort::DateDesc => "-transaction_date",
            TransactionSort::TotalAsc => "total_amount",
            TransactionSort::TotalDesc => "-total_amount",
        }
    }
}

/// An immutable record of one buy or sell, owned by exactly one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub position_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,

    /// `quantity * price_per_unit`
    pub total_amount: Decimal,

    #[serde(default)]
    pub notes: String,

    /// Logical date chosen by the user
    pub transaction_date: NaiveDate,

    /// When the record was written
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Fails with `CoreError::Overflow` when `quantity * price_per_unit` does
    /// not fit in a `Decimal`.
    pub fn new(
        position_id: Uuid,
        request: &NewTransaction,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let total_amount = request
            .quantity
            .checked_mul(request.price_per_unit)
            .ok_or_else(|| {
                CoreError::Overflow(format!(
                    "total of {} x {} is out of range",
                    request.quantity, request.price_per_unit
                ))
            })?;

        Ok(Self {
            id: Uuid::new_v4(),
            position_id,
            transaction_type: request.transaction_type,
            quantity: request.quantity,
            price_per_unit: request.price_per_unit,
            total_amount,
            notes: request.notes.clone(),
            transaction_date: request.transaction_date,
            created_at,
        })
    }
}

/// A proposed transaction, as submitted by the user before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub coin_id: String,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl NewTransaction {
    pub fn new(
        coin_id: impl Into<String>,
        transaction_type: TransactionType,
        quantity: Decimal,
        price_per_unit: Decimal,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            coin_id: coin_id.into(),
            transaction_type,
            quantity,
            price_per_unit,
            transaction_date,
            notes: String::new(),
        }
    }

    pub fn buy(
        coin_id: impl Into<String>,
        quantity: Decimal,
        price_per_unit: Decimal,
        transaction_date: NaiveDate,
    ) -> Self {
        Self::new(coin_id, TransactionType::Buy, quantity, price_per_unit, transaction_date)
    }

    pub fn sell(
        coin_id: impl Into<String>,
        quantity: Decimal,
        price_per_unit: Decimal,
        transaction_date: NaiveDate,
    ) -> Self {
        Self::new(coin_id, TransactionType::Sell, quantity, price_per_unit, transaction_date)
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// A transaction joined with the coin it belongs to, for history listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    pub transaction: Transaction,
    pub coin_id: String,
    pub coin_symbol: String,
    pub coin_name: String,
}
