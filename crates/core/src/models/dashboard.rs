use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::coin::CoinCandidate;

/// What the dashboard shows for one open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    pub position_id: Uuid,
    pub coin_id: String,
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,

    /// Cached spot price (USD) used for this valuation
    pub current_price: Decimal,

    /// When that price was last refreshed
    pub price_updated_at: DateTime<Utc>,

    pub total_quantity: Decimal,
    pub avg_buy_price: Decimal,
    pub total_invested: Decimal,

    /// total_quantity × current_price
    pub current_value: Decimal,

    /// current_value − total_invested
    pub profit_loss: Decimal,

    /// profit_loss / total_invested × 100, zero when nothing is invested
    pub profit_loss_percent: Decimal,
}

/// Portfolio-wide sums over all open positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_invested: Decimal,
    pub total_current_value: Decimal,
    pub total_profit_loss: Decimal,
    pub total_profit_loss_percent: Decimal,
}

/// Everything the dashboard endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Open positions, largest investment first
    pub positions: Vec<PositionValuation>,
    pub totals: PortfolioTotals,

    /// Set when the price refresh for this dashboard failed; values are
    /// then computed from the previously cached prices.
    pub price_warning: Option<String>,
}

/// Result of a coin search, with the failure reason when the lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinSearch {
    pub results: Vec<CoinCandidate>,
    pub warning: Option<String>,
}
