use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::errors::CoreError;

use super::coin::Coin;
use super::position::{Position, UserId};
use super::transaction::Transaction;

/// The persisted state: coins, positions and transactions.
///
/// Everything in here is what gets written to a snapshot. Lookups enforce the
/// same constraints a relational store would: unique coin ids, one position
/// per (user, coin), and every row pointing at an existing parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerBook {
    /// Known coins keyed by external id
    pub coins: BTreeMap<String, Coin>,

    /// One entry per (user, coin) pair
    pub positions: Vec<Position>,

    /// Every admitted transaction, in insertion order
    pub transactions: Vec<Transaction>,
}

impl LedgerBook {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Coins ───────────────────────────────────────────────────────

    pub fn coin(&self, id: &str) -> Option<&Coin> {
        self.coins.get(id)
    }

    pub fn insert_coin(&mut self, coin: Coin) -> Result<&Coin, CoreError> {
        if self.coins.contains_key(&coin.id) {
            return Err(CoreError::Storage(format!(
                "coin '{}' already exists",
                coin.id
            )));
        }
        let id = coin.id.clone();
        Ok(self.coins.entry(id).or_insert(coin))
    }

    /// Mutable handles to every known coin whose id is in `ids`.
    /// Unknown ids are skipped.
    pub fn coins_mut<'a>(&'a mut self, ids: &[String]) -> Vec<&'a mut Coin> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.coins
            .iter_mut()
            .filter(|(id, _)| wanted.contains(id.as_str()))
            .map(|(_, coin)| coin)
            .collect()
    }

    // ── Positions ───────────────────────────────────────────────────

    pub fn position(&self, user: UserId, coin_id: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.user_id == user && p.coin_id == coin_id)
    }

    pub fn position_by_id(&self, id: Uuid) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }

    pub fn positions_for(&self, user: UserId) -> Vec<&Position> {
        self.positions.iter().filter(|p| p.user_id == user).collect()
    }

    pub fn insert_position(&mut self, position: Position) -> Result<Uuid, CoreError> {
        if !self.coins.contains_key(&position.coin_id) {
            return Err(CoreError::Storage(format!(
                "position references unknown coin '{}'",
                position.coin_id
            )));
        }
        if self.position(position.user_id, &position.coin_id).is_some() {
            return Err(CoreError::Storage(format!(
                "duplicate position for user {} and coin '{}'",
                position.user_id, position.coin_id
            )));
        }
        let id = position.id;
        self.positions.push(position);
        Ok(id)
    }

    /// Return the id of the user's position in `coin_id`, creating a
    /// zero-valued one if none exists.
    pub fn get_or_create_position(&mut self, user: UserId, coin_id: &str) -> Result<Uuid, CoreError> {
        match self.position(user, coin_id) {
            Some(existing) => Ok(existing.id),
            None => self.insert_position(Position::new(user, coin_id)),
        }
    }

    /// Overwrite a stored position with recalculated values.
    pub fn update_position(&mut self, position: Position) -> Result<(), CoreError> {
        let slot = self
            .positions
            .iter_mut()
            .find(|p| p.id == position.id)
            .ok_or_else(|| CoreError::Storage(format!("position {} not found", position.id)))?;
        *slot = position;
        Ok(())
    }

    // ── Transactions ────────────────────────────────────────────────

    pub fn insert_transaction(&mut self, transaction: Transaction) -> Result<(), CoreError> {
        if self.position_by_id(transaction.position_id).is_none() {
            return Err(CoreError::Storage(format!(
                "transaction references unknown position {}",
                transaction.position_id
            )));
        }
        if self.transactions.iter().any(|t| t.id == transaction.id) {
            return Err(CoreError::Storage(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        self.transactions.push(transaction);
        Ok(())
    }

    pub fn transactions_for_position(&self, position_id: Uuid) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.position_id == position_id)
            .collect()
    }

    /// All of a user's transactions, each paired with its position.
    pub fn transactions_for_user(&self, user: UserId) -> Vec<(&Transaction, &Position)> {
        self.transactions
            .iter()
            .filter_map(|t| {
                self.position_by_id(t.position_id)
                    .filter(|p| p.user_id == user)
                    .map(|p| (t, p))
            })
            .collect()
    }
}
