use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity handed to the core by the host's authentication layer.
pub type UserId = Uuid;

/// A user's aggregate holding in one coin.
///
/// Every field except the identity columns is derived from the position's
/// transactions by `LedgerService::recalculate` and is never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub user_id: UserId,
    pub coin_id: String,

    /// Σ buys − Σ sells. Can go negative only if history was seeded
    /// around validation.
    pub total_quantity: Decimal,

    /// Weighted average price over all buys. Sells never move it.
    pub avg_buy_price: Decimal,

    /// `total_quantity * avg_buy_price`
    pub total_invested: Decimal,
}

impl Position {
    /// A zero-valued position, as created on the first transaction.
    pub fn new(user_id: UserId, coin_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            coin_id: coin_id.into(),
            total_quantity: Decimal::ZERO,
            avg_buy_price: Decimal::ZERO,
            total_invested: Decimal::ZERO,
        }
    }

    pub fn is_open(&self) -> bool {
        self.total_quantity > Decimal::ZERO
    }

    /// Saturates instead of overflowing on absurd remote prices.
    pub fn current_value(&self, current_price: Decimal) -> Decimal {
        self.total_quantity.saturating_mul(current_price)
    }

    pub fn profit_loss(&self, current_price: Decimal) -> Decimal {
        self.current_value(current_price)
            .saturating_sub(self.total_invested)
    }

    /// Percentage gain relative to `total_invested`; zero when nothing is invested.
    pub fn profit_loss_percent(&self, current_price: Decimal) -> Decimal {
        percent_of(self.profit_loss(current_price), self.total_invested)
    }
}

/// `part / whole * 100`, or zero when `whole` is not positive.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole > Decimal::ZERO {
        part.checked_div(whole)
            .map_or(Decimal::ZERO, |ratio| ratio.saturating_mul(Decimal::ONE_HUNDRED))
    } else {
        Decimal::ZERO
    }
}
