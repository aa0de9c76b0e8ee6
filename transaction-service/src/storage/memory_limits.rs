//! In-process limit configuration store. Backed by an `lru::LruCache` keyed
//! by `(AccountType, TransactionType)` with a TTL stamp per entry, mirroring
//! the cache-with-expiry shape the limit enforcer (C6) layers on top of any
//! backing store — here the cache *is* the store since there is no database
//! behind it.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use crate::domain::{AccountType, TransactionLimit, TransactionType};

use super::{LimitStore, LimitStoreError};

const CACHE_CAPACITY: usize = 256;

struct Entry {
    limit: TransactionLimit,
    stored_at: Instant,
}

pub struct MemoryLimitStore {
    entries: Mutex<LruCache<(AccountType, TransactionType), Entry>>,
    ttl: Duration,
}

impl MemoryLimitStore {
    pub fn new(ttl: Duration) -> Self {
        MemoryLimitStore {
            entries: Mutex::new(LruCache::new(
                std::num::NonZeroUsize::new(CACHE_CAPACITY).expect("capacity is nonzero"),
            )),
            ttl,
        }
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        entry.stored_at.elapsed() < self.ttl
    }
}

impl Default for MemoryLimitStore {
    fn default() -> Self {
        // spec.md §4.2: cache TTL capped at 60s.
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl LimitStore for MemoryLimitStore {
    async fn find_active(
        &self,
        account_type: AccountType,
        transaction_type: TransactionType,
    ) -> Result<Option<TransactionLimit>, LimitStoreError> {
        let key = (account_type, transaction_type);
        let mut entries = self.entries.lock().map_err(|_| LimitStoreError::Unavailable)?;
        match entries.get(&key) {
            Some(entry) if self.is_fresh(entry) => {
                if entry.limit.active {
                    Ok(Some(entry.limit.clone()))
                } else {
                    Ok(None)
                }
            }
            Some(_) => {
                entries.pop(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, limit: TransactionLimit) -> Result<(), LimitStoreError> {
        let key = (limit.account_type, limit.transaction_type);
        let mut entries = self.entries.lock().map_err(|_| LimitStoreError::Unavailable)?;
        entries.put(
            key,
            Entry {
                limit,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_common::money::Money;

    fn sample_limit() -> TransactionLimit {
        TransactionLimit {
            account_type: AccountType::Checking,
            transaction_type: TransactionType::Transfer,
            daily_limit: Some(Money::parse("5000.00").unwrap()),
            monthly_limit: Some(Money::parse("20000.00").unwrap()),
            per_tx_limit: Some(Money::parse("1000.00").unwrap()),
            daily_count: Some(10),
            monthly_count: Some(100),
            active: true,
        }
    }

    #[tokio::test]
    async fn upsert_then_find_active_round_trips() {
        let store = MemoryLimitStore::default();
        store.upsert(sample_limit()).await.unwrap();
        let found = store
            .find_active(AccountType::Checking, TransactionType::Transfer)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn inactive_limit_is_not_returned() {
        let store = MemoryLimitStore::default();
        let mut limit = sample_limit();
        limit.active = false;
        store.upsert(limit).await.unwrap();
        let found = store
            .find_active(AccountType::Checking, TransactionType::Transfer)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_evicted() {
        let store = MemoryLimitStore::new(Duration::from_millis(1));
        store.upsert(sample_limit()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let found = store
            .find_active(AccountType::Checking, TransactionType::Transfer)
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
