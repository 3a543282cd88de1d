use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::{CoreError, Rejection};
use crate::models::book::LedgerBook;
use crate::models::position::{Position, UserId};
use crate::models::transaction::{NewTransaction, Transaction, TransactionType};
use crate::services::ledger_service::LedgerService;

/// Most fractional digits accepted on quantities and prices.
pub const MAX_SCALE: u32 = 8;

/// Most integer digits accepted on quantities and prices.
pub const MAX_INTEGER_DIGITS: u32 = 12;

/// Smallest representable quantity or price (1e-8).
pub fn min_unit() -> Decimal {
    Decimal::new(1, MAX_SCALE)
}

/// Exclusive upper bound on quantities and prices (1e12).
pub fn max_amount() -> Decimal {
    Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS))
}

/// Validates proposed transactions and admits the ones that pass.
pub struct IntakeService {
    ledger: LedgerService,
}

impl IntakeService {
    pub fn new() -> Self {
        Self {
            ledger: LedgerService::new(),
        }
    }

    /// Check a proposed transaction against the user's current holdings.
    ///
    /// Rules:
    /// - quantity and price are at least 1e-8, below 1e12, with at most
    ///   8 decimal places
    /// - a sell needs an existing position holding at least `quantity`
    /// - buys have no balance precondition
    pub fn validate(
        &self,
        book: &LedgerBook,
        user: UserId,
        request: &NewTransaction,
    ) -> Result<(), Rejection> {
        if !is_valid_amount(request.quantity) {
            return Err(Rejection::InvalidQuantity(request.quantity));
        }
        if !is_valid_amount(request.price_per_unit) {
            return Err(Rejection::InvalidPrice(request.price_per_unit));
        }

        if request.transaction_type == TransactionType::Sell {
            let position = book
                .position(user, &request.coin_id)
                .ok_or_else(|| Rejection::NotHeld(request.coin_id.clone()))?;

            if request.quantity > position.total_quantity {
                return Err(Rejection::InsufficientBalance {
                    available: position.total_quantity,
                    requested: request.quantity,
                });
            }
        }

        Ok(())
    }

    /// Validate, then persist the transaction and recalculate its position.
    ///
    /// Nothing is written when validation fails or the resulting totals
    /// would leave the `Decimal` range. The coin must already be
    /// in the book.
    pub fn admit(
        &self,
        book: &mut LedgerBook,
        user: UserId,
        request: &NewTransaction,
        now: DateTime<Utc>,
    ) -> Result<Transaction, CoreError> {
        if book.coin(&request.coin_id).is_none() {
            return Err(Rejection::UnknownCoin(request.coin_id.clone()).into());
        }
        self.screen(book, user, request)?;

        let position = match book.position(user, &request.coin_id) {
            Some(existing) => existing.clone(),
            None => Position::new(user, request.coin_id.clone()),
        };
        let transaction = Transaction::new(position.id, request, now)?;

        // Dry run first so an out-of-range history leaves no rows behind.
        let history = book.transactions_for_position(position.id);
        self.ledger
            .recalculate(&position, history.into_iter().chain([&transaction]))?;

        if book.position_by_id(position.id).is_none() {
            book.insert_position(position.clone())?;
        }
        book.insert_transaction(transaction.clone())?;
        let position = self.ledger.recalculate_in_book(book, position.id)?;

        tracing::info!(
            transaction_id = %transaction.id,
            coin_id = %request.coin_id,
            kind = %transaction.transaction_type,
            quantity = %transaction.quantity,
            price = %transaction.price_per_unit,
            held = %position.total_quantity,
            "transaction admitted"
        );
        Ok(transaction)
    }

    /// [`IntakeService::validate`], logging the rejection.
    pub fn screen(
        &self,
        book: &LedgerBook,
        user: UserId,
        request: &NewTransaction,
    ) -> Result<(), CoreError> {
        self.validate(book, user, request).map_err(|rejection| {
            tracing::info!(
                coin_id = %request.coin_id,
                kind = %request.transaction_type,
                reason = %rejection,
                "transaction rejected"
            );
            CoreError::Rejected(rejection)
        })
    }
}

impl Default for IntakeService {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_amount(value: Decimal) -> bool {
    value >= min_unit() && value < max_amount() && value.normalize().scale() <= MAX_SCALE
}
