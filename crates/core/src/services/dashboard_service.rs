use rust_decimal::Decimal;

use crate::models::book::LedgerBook;
use crate::models::dashboard::{Dashboard, PortfolioTotals, PositionValuation};
use crate::models::position::{percent_of, UserId};

/// Values a user's open positions against the coins' cached prices.
///
/// Does not fetch anything: the caller refreshes prices first and passes in
/// any warning from that refresh.
pub struct DashboardService;

impl DashboardService {
    pub fn new() -> Self {
        Self
    }

    /// Ids of the coins the user currently holds (quantity > 0).
    pub fn held_coin_ids(&self, book: &LedgerBook, user: UserId) -> Vec<String> {
        book.positions_for(user)
            .into_iter()
            .filter(|p| p.is_open())
            .map(|p| p.coin_id.clone())
            .collect()
    }

    /// Build the dashboard for `user`.
    ///
    /// Only open positions are listed, largest `total_invested` first.
    /// Positions whose coin is missing from the book are skipped.
    pub fn build(
        &self,
        book: &LedgerBook,
        user: UserId,
        price_warning: Option<String>,
    ) -> Dashboard {
        let mut positions: Vec<PositionValuation> = book
            .positions_for(user)
            .into_iter()
            .filter(|p| p.is_open())
            .filter_map(|p| {
                let coin = book.coin(&p.coin_id)?;
                let price = coin.current_price;
                Some(PositionValuation {
                    position_id: p.id,
                    coin_id: coin.id.clone(),
                    symbol: coin.symbol.clone(),
                    name: coin.name.clone(),
                    image_url: coin.image_url.clone(),
                    current_price: price,
                    price_updated_at: coin.last_updated,
                    total_quantity: p.total_quantity,
                    avg_buy_price: p.avg_buy_price,
                    total_invested: p.total_invested,
                    current_value: p.current_value(price),
                    profit_loss: p.profit_loss(price),
                    profit_loss_percent: p.profit_loss_percent(price),
                })
            })
            .collect();

        positions.sort_by(|a, b| b.total_invested.cmp(&a.total_invested));

        let totals = Self::totals(&positions);
        Dashboard {
            positions,
            totals,
            price_warning,
        }
    }

    /// Sum invested and current value, then derive the overall gain.
    pub fn totals(positions: &[PositionValuation]) -> PortfolioTotals {
        let total_invested = positions
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.total_invested));
        let total_current_value = positions
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.current_value));
        let total_profit_loss = total_current_value.saturating_sub(total_invested);

        PortfolioTotals {
            total_invested,
            total_current_value,
            total_profit_loss,
            total_profit_loss_percent: percent_of(total_profit_loss, total_invested),
        }
    }
}

impl Default for DashboardService {
    fn default() -> Self {
        Self::new()
    }
}
