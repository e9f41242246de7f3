//! In-memory store, used by tests and console development mode.

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::Currency;
use crate::domain::traits::Store;

/// Volatile store. Currencies keep their insertion order; the uniqueness
/// check and the insert happen under one write lock.
#[derive(Default)]
pub struct MemoryStore {
    currencies: RwLock<Vec<Currency>>,
    admins: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_currency(&self, name: &str, rate: Decimal) -> Result<bool, StorageError> {
        let mut currencies = self.currencies.write().await;
        if currencies.iter().any(|c| c.name == name) {
            return Ok(false);
        }
        currencies.push(Currency::new(name, rate));
        Ok(true)
    }

    async fn delete_currency(&self, name: &str) -> Result<bool, StorageError> {
        let mut currencies = self.currencies.write().await;
        let before = currencies.len();
        currencies.retain(|c| c.name != name);
        Ok(currencies.len() < before)
    }

    async fn update_rate(&self, name: &str, rate: Decimal) -> Result<bool, StorageError> {
        let mut currencies = self.currencies.write().await;
        match currencies.iter_mut().find(|c| c.name == name) {
            Some(currency) => {
                currency.rate = rate;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_rate(&self, name: &str) -> Result<Option<Decimal>, StorageError> {
        let currencies = self.currencies.read().await;
        Ok(currencies.iter().find(|c| c.name == name).map(|c| c.rate))
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>, StorageError> {
        let currencies = self.currencies.read().await;
        Ok(currencies.clone())
    }

    async fn is_admin(&self, chat_id: &str) -> Result<bool, StorageError> {
        let admins = self.admins.read().await;
        Ok(admins.contains(chat_id))
    }

    async fn add_admin(&self, chat_id: &str) -> Result<(), StorageError> {
        let mut admins = self.admins.write().await;
        admins.insert(chat_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn behaves_like_the_sqlite_store() {
        let store = MemoryStore::new();

        assert!(store.insert_currency("USD", dec!(90.50)).await.unwrap());
        assert!(!store.insert_currency("USD", dec!(91)).await.unwrap());
        assert_eq!(store.get_rate("USD").await.unwrap(), Some(dec!(90.50)));

        assert!(store.update_rate("USD", dec!(91)).await.unwrap());
        assert!(!store.update_rate("XXX", dec!(1)).await.unwrap());

        assert!(store.delete_currency("USD").await.unwrap());
        assert!(!store.delete_currency("USD").await.unwrap());
    }

    #[tokio::test]
    async fn listing_preserves_insertion_order() {
        let store = MemoryStore::new();
        store.insert_currency("USD", dec!(90)).await.unwrap();
        store.insert_currency("EUR", dec!(98)).await.unwrap();

        let names: Vec<String> = store
            .list_currencies()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["USD", "EUR"]);
    }
}
