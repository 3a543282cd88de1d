pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod telemetry;

use std::sync::Arc;

use models::{
    book::LedgerBook,
    coin::Coin,
    dashboard::{CoinSearch, Dashboard},
    position::{Position, UserId},
    transaction::{NewTransaction, Transaction, TransactionSort, TransactionView},
};
use services::{
    dashboard_service::DashboardService, intake_service::IntakeService,
    price_gateway::PriceGateway,
};
use storage::manager::StorageManager;

use clock::Clock;
use config::GatewayConfig;
use errors::{CoreError, Rejection, RemoteError};

/// Queries shorter than this (after trimming) never reach the price service.
pub const MIN_SEARCH_LEN: usize = 2;

/// Main entry point for the crypto portfolio core library.
///
/// Holds the ledger book (coins, positions, transactions) and a handle to the
/// shared price gateway. Every operation takes the caller's `UserId`; the
/// host's authentication layer is responsible for producing it.
#[must_use]
pub struct CryptoPortfolio {
    book: LedgerBook,
    gateway: Arc<PriceGateway>,
    intake: IntakeService,
    dashboard: DashboardService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for CryptoPortfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoPortfolio")
            .field("coins", &self.book.coins.len())
            .field("positions", &self.book.positions.len())
            .field("transactions", &self.book.transactions.len())
            .field("gateway", &self.gateway)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl CryptoPortfolio {
    /// Create an empty book around an existing gateway.
    pub fn new(gateway: Arc<PriceGateway>) -> Self {
        Self::with_book(LedgerBook::new(), gateway)
    }

    /// Wrap an existing book (e.g., restored from a snapshot).
    pub fn with_book(book: LedgerBook, gateway: Arc<PriceGateway>) -> Self {
        Self {
            book,
            gateway,
            intake: IntakeService::new(),
            dashboard: DashboardService::new(),
            dirty: false,
        }
    }

    /// Empty book backed by CoinGecko, configured from `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, CoreError> {
        let gateway = PriceGateway::coingecko(config)?;
        Ok(Self::new(Arc::new(gateway)))
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Restore a book from snapshot bytes.
    pub fn load_from_bytes(data: &[u8], gateway: Arc<PriceGateway>) -> Result<Self, CoreError> {
        let book = StorageManager::load_from_bytes(data)?;
        Ok(Self::with_book(book, gateway))
    }

    /// Serialize the book. Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, CoreError> {
        let bytes = StorageManager::save_to_bytes(&self.book)?;
        self.dirty = false;
        Ok(bytes)
    }

    pub fn load_from_file(path: &str, gateway: Arc<PriceGateway>) -> Result<Self, CoreError> {
        let book = StorageManager::load_from_file(path)?;
        tracing::info!(path, coins = book.coins.len(), transactions = book.transactions.len(), "ledger loaded");
        Ok(Self::with_book(book, gateway))
    }

    /// Write the book to disk. Clears the unsaved-changes flag on success.
    pub fn save_to_file(&mut self, path: &str) -> Result<(), CoreError> {
        StorageManager::save_to_file(&self.book, path)?;
        self.dirty = false;
        tracing::info!(path, "ledger saved");
        Ok(())
    }

    /// Returns `true` if the book has been modified since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Dashboard ───────────────────────────────────────────────────

    /// Refresh prices for every coin the user holds, then value the open
    /// positions.
    ///
    /// A failed refresh does not fail the dashboard: the previously cached
    /// prices are used and `price_warning` explains what went wrong.
    pub async fn get_dashboard(&mut self, user: UserId) -> Dashboard {
        let held = self.dashboard.held_coin_ids(&self.book, user);

        let mut price_warning = None;
        if !held.is_empty() {
            let report = self
                .gateway
                .refresh_prices_report(self.book.coins_mut(&held))
                .await;
            if report.updated > 0 {
                self.dirty = true;
            }
            if !report.is_success() {
                price_warning = report
                    .error
                    .map(|e| format!("Could not refresh prices: {e}"));
            }
        }

        self.dashboard.build(&self.book, user, price_warning)
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Record a buy or sell.
    ///
    /// The request is validated against the user's holdings first; only then
    /// is the coin resolved (fetched and registered if unseen). On success the
    /// transaction is stored and its position recalculated before returning.
    /// A rejection is `CoreError::Rejected` and leaves no transaction behind.
    pub async fn submit_transaction(
        &mut self,
        user: UserId,
        request: NewTransaction,
    ) -> Result<Transaction, CoreError> {
        let request = NewTransaction {
            coin_id: request.coin_id.trim().to_string(),
            ..request
        };

        // Amounts and holdings are checked before any remote lookup.
        self.intake.screen(&self.book, user, &request)?;

        let coins_before = self.book.coins.len();
        let coin = self.gateway.resolve(&mut self.book, &request.coin_id).await?;
        if self.book.coins.len() != coins_before {
            self.dirty = true;
        }

        let coin = coin.ok_or_else(|| Rejection::UnknownCoin(request.coin_id.clone()))?;
        let request = NewTransaction {
            coin_id: coin.id,
            ..request
        };

        let now = self.gateway.clock().now();
        let transaction = self.intake.admit(&mut self.book, user, &request, now)?;
        self.dirty = true;
        Ok(transaction)
    }

    /// The user's transaction history in the requested order.
    ///
    /// `sort_key` must be one of `transaction_date`, `-transaction_date`,
    /// `total_amount`, `-total_amount`; anything else sorts newest first.
    /// Equal keys keep the most recently recorded transaction first.
    #[must_use]
    pub fn list_transactions(&self, user: UserId, sort_key: &str) -> Vec<TransactionView> {
        let order = TransactionSort::from_key(sort_key);

        let mut rows: Vec<TransactionView> = self
            .book
            .transactions_for_user(user)
            .into_iter()
            .map(|(tx, position)| {
                let coin = self.book.coin(&position.coin_id);
                TransactionView {
                    transaction: tx.clone(),
                    coin_id: position.coin_id.clone(),
                    coin_symbol: coin.map(|c| c.symbol.clone()).unwrap_or_default(),
                    coin_name: coin.map(|c| c.name.clone()).unwrap_or_default(),
                }
            })
            .collect();

        rows.sort_by(|a, b| b.transaction.created_at.cmp(&a.transaction.created_at));
        match order {
            TransactionSort::DateAsc => {
                rows.sort_by(|a, b| a.transaction.transaction_date.cmp(&b.transaction.transaction_date))
            }
            TransactionSort::DateDesc => {
                rows.sort_by(|a, b| b.transaction.transaction_date.cmp(&a.transaction.transaction_date))
            }
            TransactionSort::TotalAsc => {
                rows.sort_by(|a, b| a.transaction.total_amount.cmp(&b.transaction.total_amount))
            }
            TransactionSort::TotalDesc => {
                rows.sort_by(|a, b| b.transaction.total_amount.cmp(&a.transaction.total_amount))
            }
        }
        rows
    }

    // ── Coins & search ──────────────────────────────────────────────

    /// Free-text coin search. Queries under two characters return nothing
    /// without calling the price service.
    pub async fn search_coins(&self, query: &str) -> CoinSearch {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return CoinSearch::default();
        }

        match self.gateway.try_search(query).await {
            Ok(results) => CoinSearch {
                results,
                warning: None,
            },
            Err(e) => CoinSearch {
                results: Vec::new(),
                warning: Some(e.to_string()),
            },
        }
    }

    /// Pick a coin from search results: returns the local record, fetching
    /// and registering it first if it is new.
    pub async fn select_coin(&mut self, coin_id: &str) -> Result<Option<Coin>, CoreError> {
        let coins_before = self.book.coins.len();
        let coin = self.gateway.resolve(&mut self.book, coin_id).await?;
        if self.book.coins.len() != coins_before {
            self.dirty = true;
        }
        Ok(coin)
    }

    #[must_use]
    pub fn coin(&self, coin_id: &str) -> Option<&Coin> {
        self.book.coin(coin_id)
    }

    // ── Positions ───────────────────────────────────────────────────

    /// All of the user's positions, including closed (zero-quantity) ones.
    #[must_use]
    pub fn positions(&self, user: UserId) -> Vec<&Position> {
        self.book.positions_for(user)
    }

    #[must_use]
    pub fn position(&self, user: UserId, coin_id: &str) -> Option<&Position> {
        self.book.position(user, coin_id)
    }

    // ── Gateway & book access ───────────────────────────────────────

    /// Failure of the gateway's most recent remote call, if it failed.
    #[must_use]
    pub fn last_price_error(&self) -> Option<RemoteError> {
        self.gateway.last_error()
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<PriceGateway> {
        &self.gateway
    }

    #[must_use]
    pub fn book(&self) -> &LedgerBook {
        &self.book
    }
}
