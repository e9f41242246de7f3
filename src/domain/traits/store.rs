use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::errors::StorageError;
use crate::domain::entities::Currency;

/// Store trait - persistence boundary for the currency and admin
/// collections.
///
/// The write operations report whether a row was actually touched so the
/// callers can distinguish "done" from "was not there" without a separate
/// read.
#[async_trait]
pub trait Store: Send + Sync {
    // Currency collection, keyed by name.

    /// Insert `name` only if it is absent. The existence check and the
    /// write are one conditional operation, not a read-then-write pair.
    /// Returns whether a row was written.
    async fn insert_currency(&self, name: &str, rate: Decimal) -> Result<bool, StorageError>;

    /// Returns whether a row was removed.
    async fn delete_currency(&self, name: &str) -> Result<bool, StorageError>;

    /// Returns whether a row was updated.
    async fn update_rate(&self, name: &str, rate: Decimal) -> Result<bool, StorageError>;

    async fn get_rate(&self, name: &str) -> Result<Option<Decimal>, StorageError>;

    /// All currencies in insertion order.
    async fn list_currencies(&self) -> Result<Vec<Currency>, StorageError>;

    // Admin identity collection, keyed by chat id.

    async fn is_admin(&self, chat_id: &str) -> Result<bool, StorageError>;

    /// Idempotent: registering an already known identity is a no-op.
    async fn add_admin(&self, chat_id: &str) -> Result<(), StorageError>;
}
