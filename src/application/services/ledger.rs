//! Currency ledger - domain rules over the persisted currency records.

use rust_decimal::Decimal;

use crate::application::errors::LedgerError;
use crate::domain::entities::Currency;
use crate::domain::traits::Store;

/// In-process abstraction over the persisted currency name → rate records,
/// plus the admin identity collection living behind the same storage
/// boundary.
///
/// Every operation commits immediately; no multi-step transaction spans
/// two calls.
pub struct CurrencyLedger<S: Store> {
    store: S,
}

impl<S: Store> CurrencyLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn exists(&self, name: &str) -> Result<bool, LedgerError> {
        Ok(self.store.get_rate(name).await?.is_some())
    }

    /// Insert a new currency.
    ///
    /// The storage write is conditional on the name being absent, so two
    /// chats racing to add the same name cannot both win; the loser gets
    /// `DuplicateCurrency` even if its earlier existence check passed.
    pub async fn insert(&self, name: &str, rate: Decimal) -> Result<(), LedgerError> {
        if self.store.insert_currency(name, rate).await? {
            Ok(())
        } else {
            Err(LedgerError::DuplicateCurrency(name.to_string()))
        }
    }

    /// Remove a currency. Deleting an absent name is a success: the
    /// outcome (no such row) is the same either way.
    pub async fn delete(&self, name: &str) -> Result<(), LedgerError> {
        self.store.delete_currency(name).await?;
        Ok(())
    }

    pub async fn update_rate(&self, name: &str, rate: Decimal) -> Result<(), LedgerError> {
        if self.store.update_rate(name, rate).await? {
            Ok(())
        } else {
            Err(LedgerError::CurrencyNotFound(name.to_string()))
        }
    }

    pub async fn get_rate(&self, name: &str) -> Result<Option<Decimal>, LedgerError> {
        Ok(self.store.get_rate(name).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<Currency>, LedgerError> {
        Ok(self.store.list_currencies().await?)
    }

    pub async fn is_admin(&self, chat_id: &str) -> Result<bool, LedgerError> {
        Ok(self.store.is_admin(chat_id).await?)
    }

    pub async fn register_admin(&self, chat_id: &str) -> Result<(), LedgerError> {
        Ok(self.store.add_admin(chat_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryStore;
    use rust_decimal_macros::dec;

    fn ledger() -> CurrencyLedger<MemoryStore> {
        CurrencyLedger::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_exactly() {
        let ledger = ledger();
        ledger.insert("USD", dec!(90.50)).await.unwrap();

        let rate = ledger.get_rate("USD").await.unwrap();
        assert_eq!(rate, Some(dec!(90.50)));
        assert!(ledger.exists("USD").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let ledger = ledger();
        ledger.insert("USD", dec!(90.50)).await.unwrap();

        let err = ledger.insert("USD", dec!(91)).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateCurrency(name) if name == "USD"));

        // The first rate survives the rejected insert.
        assert_eq!(ledger.get_rate("USD").await.unwrap(), Some(dec!(90.50)));
    }

    #[tokio::test]
    async fn names_are_case_sensitive() {
        let ledger = ledger();
        ledger.insert("usd", dec!(1)).await.unwrap();
        ledger.insert("USD", dec!(2)).await.unwrap();

        assert_eq!(ledger.get_rate("usd").await.unwrap(), Some(dec!(1)));
        assert_eq!(ledger.get_rate("USD").await.unwrap(), Some(dec!(2)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let ledger = ledger();
        ledger.insert("USD", dec!(90.50)).await.unwrap();

        ledger.delete("USD").await.unwrap();
        ledger.delete("USD").await.unwrap();
        assert!(!ledger.exists("USD").await.unwrap());
    }

    #[tokio::test]
    async fn update_of_absent_name_fails() {
        let ledger = ledger();
        let err = ledger.update_rate("XXX", dec!(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::CurrencyNotFound(name) if name == "XXX"));
    }

    #[tokio::test]
    async fn update_overwrites_the_rate() {
        let ledger = ledger();
        ledger.insert("EUR", dec!(98)).await.unwrap();
        ledger.update_rate("EUR", dec!(99.25)).await.unwrap();

        assert_eq!(ledger.get_rate("EUR").await.unwrap(), Some(dec!(99.25)));
    }

    #[tokio::test]
    async fn list_never_contains_duplicates() {
        let ledger = ledger();
        ledger.insert("USD", dec!(90)).await.unwrap();
        ledger.insert("EUR", dec!(98)).await.unwrap();
        let _ = ledger.insert("USD", dec!(91)).await;
        ledger.delete("EUR").await.unwrap();
        ledger.insert("EUR", dec!(99)).await.unwrap();

        let names: Vec<String> = ledger
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped);
        assert_eq!(names.len(), 2);
    }

    #[tokio::test]
    async fn admin_registration_is_idempotent() {
        let ledger = ledger();
        assert!(!ledger.is_admin("42").await.unwrap());

        ledger.register_admin("42").await.unwrap();
        ledger.register_admin("42").await.unwrap();
        assert!(ledger.is_admin("42").await.unwrap());
        assert!(!ledger.is_admin("43").await.unwrap());
    }
}
