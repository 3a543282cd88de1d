use crate::errors::CoreError;
use crate::models::book::LedgerBook;

use super::format;

/// Save/load the ledger book to/from snapshot bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Flow: LedgerBook → bincode → CPTF header + payload
    pub fn save_to_bytes(book: &LedgerBook) -> Result<Vec<u8>, CoreError> {
        let payload = bincode::serialize(book)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize ledger: {e}")))?;
        Ok(format::write_snapshot(format::CURRENT_VERSION, &payload))
    }

    /// Flow: CPTF bytes → parse header → bincode → LedgerBook
    pub fn load_from_bytes(data: &[u8]) -> Result<LedgerBook, CoreError> {
        let (_version, payload) = format::read_snapshot(data)?;
        bincode::deserialize(payload)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize ledger: {e}")))
    }

    pub fn save_to_file(book: &LedgerBook, path: &str) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(book)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<LedgerBook, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes)
    }
}
