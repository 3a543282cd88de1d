use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::book::LedgerBook;
use crate::models::position::Position;
use crate::models::transaction::{Transaction, TransactionType};

/// Fractional digits kept on the weighted average buy price.
pub const PRICE_SCALE: u32 = 8;

/// Folds a position's transaction history into its aggregate values.
///
/// Pure business logic, no I/O. The average cost is a plain weighted mean
/// over buys (no FIFO/LIFO lots): selling lowers the quantity, never the
/// average.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Recompute `position` from its complete set of transactions.
    ///
    /// The average is rounded to [`PRICE_SCALE`] digits and `total_invested`
    /// is derived from the rounded value, so
    /// `total_invested == total_quantity * avg_buy_price` holds exactly.
    /// History whose sums leave the `Decimal` range is `CoreError::Overflow`.
    pub fn recalculate<'a, I>(&self, position: &Position, transactions: I) -> Result<Position, CoreError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut bought_qty = Decimal::ZERO;
        let mut bought_value = Decimal::ZERO;
        let mut sold_qty = Decimal::ZERO;

        for tx in transactions {
            match tx.transaction_type {
                TransactionType::Buy => {
                    let value = tx
                        .quantity
                        .checked_mul(tx.price_per_unit)
                        .ok_or_else(|| overflow(position, "buy value"))?;
                    bought_qty = bought_qty
                        .checked_add(tx.quantity)
                        .ok_or_else(|| overflow(position, "bought quantity"))?;
                    bought_value = bought_value
                        .checked_add(value)
                        .ok_or_else(|| overflow(position, "bought value"))?;
                }
                TransactionType::Sell => {
                    sold_qty = sold_qty
                        .checked_add(tx.quantity)
                        .ok_or_else(|| overflow(position, "sold quantity"))?;
                }
            }
        }

        // Not clamped: a negative quantity marks history that bypassed intake.
        let total_quantity = bought_qty
            .checked_sub(sold_qty)
            .ok_or_else(|| overflow(position, "quantity"))?;

        let avg_buy_price = if bought_qty > Decimal::ZERO {
            bought_value
                .checked_div(bought_qty)
                .ok_or_else(|| overflow(position, "average price"))?
                .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointNearestEven)
        } else {
            Decimal::ZERO
        };

        let total_invested = total_quantity
            .checked_mul(avg_buy_price)
            .ok_or_else(|| overflow(position, "invested amount"))?;

        Ok(Position {
            total_quantity,
            avg_buy_price,
            total_invested,
            ..position.clone()
        })
    }

    /// Recalculate a stored position from the book's transactions and write
    /// the derived fields back.
    pub fn recalculate_in_book(
        &self,
        book: &mut LedgerBook,
        position_id: Uuid,
    ) -> Result<Position, CoreError> {
        let current = book
            .position_by_id(position_id)
            .ok_or_else(|| CoreError::Storage(format!("position {position_id} not found")))?;

        let updated = self.recalculate(current, book.transactions_for_position(position_id))?;
        book.update_position(updated.clone())?;

        if updated.total_quantity < Decimal::ZERO {
            tracing::warn!(
                position_id = %updated.id,
                coin_id = %updated.coin_id,
                quantity = %updated.total_quantity,
                "position quantity is negative; sells exceed recorded buys"
            );
        }
        Ok(updated)
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}

fn overflow(position: &Position, what: &str) -> CoreError {
    CoreError::Overflow(format!(
        "{what} out of range for position {} ({})",
        position.id, position.coin_id
    ))
}
