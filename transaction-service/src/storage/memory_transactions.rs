//! In-process transaction store. Stands in for the production relational
//! store (database migration tooling is out of scope per `spec.md` §1) while
//! still honoring the uniqueness invariants and the row-level lock the
//! reversal path needs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use ledgerflow_common::pagination::{Page, PageSpec};

use crate::domain::{ProcessingState, Transaction, TransactionStatus, TransactionType, Usage, UsageWindow};

use super::{
    SearchFilter, TransactionLockGuard, TransactionStore, TransactionStoreError, TransactionUpdate,
};

struct Row {
    data: Mutex<Transaction>,
    reversal_lock: Arc<Mutex<()>>,
}

pub struct MemoryTransactionStore {
    rows: DashMap<String, Arc<Row>>,
    /// (created_by, type, idempotency_key) -> transaction id.
    idempotency_index: DashMap<(String, TransactionType, String), String>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        MemoryTransactionStore {
            rows: DashMap::new(),
            idempotency_index: DashMap::new(),
        }
    }
}

impl Default for MemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn insert(&self, tx: Transaction) -> Result<Transaction, TransactionStoreError> {
        if let Some(key) = tx.idempotency_key.clone() {
            let index_key = (tx.created_by.clone(), tx.transaction_type, key);
            if self.idempotency_index.contains_key(&index_key) {
                return Err(TransactionStoreError::DuplicateIdempotency);
            }
            self.idempotency_index.insert(index_key, tx.id.clone());
        }

        self.rows.insert(
            tx.id.clone(),
            Arc::new(Row {
                data: Mutex::new(tx.clone()),
                reversal_lock: Arc::new(Mutex::new(())),
            }),
        );
        Ok(tx)
    }

    async fn update(
        &self,
        id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction, TransactionStoreError> {
        let row = self.rows.get(id).map(|r| r.clone()).ok_or(TransactionStoreError::NotFound)?;
        let mut tx = row.data.lock().await;
        if let Some(new_status) = update.status {
            // Completed -> Reversed is the one legal transition out of a
            // terminal status (spec.md §3 invariant 2's reversal carve-out).
            let is_reversal_flip =
                tx.status == TransactionStatus::Completed && new_status == TransactionStatus::Reversed;
            if tx.status.is_terminal() && new_status != tx.status && !is_reversal_flip {
                return Err(TransactionStoreError::IllegalTransition);
            }
        }

        if let Some(status) = update.status {
            tx.status = status;
        }
        if let Some(state) = update.processing_state {
            tx.processing_state = state;
        }
        if let Some(processed_at) = update.processed_at {
            tx.processed_at = Some(processed_at);
        }
        if let Some(reason) = update.failure_reason {
            tx.failure_reason = Some(reason);
        }
        if let Some(reversal_id) = update.reversal_transaction_id {
            tx.reversal_transaction_id = Some(reversal_id);
        }

        Ok(tx.clone())
    }

    async fn find_by_id(&self, id: &str) -> Option<Transaction> {
        let row = self.rows.get(id)?.clone();
        let tx = row.data.lock().await;
        Some(tx.clone())
    }

    async fn find_by_id_for_update(&self, id: &str) -> Option<TransactionLockGuard> {
        let row = self.rows.get(id)?.clone();
        let permit = row.reversal_lock.clone().lock_owned().await;
        let tx = row.data.lock().await.clone();
        Some(TransactionLockGuard::new(tx, permit))
    }

    async fn find_by_idempotency(
        &self,
        created_by: &str,
        transaction_type: TransactionType,
        key: &str,
    ) -> Option<Transaction> {
        let id = self
            .idempotency_index
            .get(&(created_by.to_string(), transaction_type, key.to_string()))?
            .clone();
        self.find_by_id(&id).await
    }

    async fn find_reversals(&self, original_id: &str) -> Vec<Transaction> {
        let mut result = Vec::new();
        for entry in self.rows.iter() {
            let tx = entry.value().data.lock().await;
            if tx.transaction_type == TransactionType::Reversal
                && tx.original_transaction_id.as_deref() == Some(original_id)
            {
                result.push(tx.clone());
            }
        }
        result
    }

    async fn aggregate_usage(
        &self,
        account_id: &str,
        transaction_type: TransactionType,
        window: UsageWindow,
    ) -> Usage {
        let now = Utc::now();
        let mut usage = Usage::default();
        for entry in self.rows.iter() {
            let tx = entry.value().data.lock().await;
            if tx.status != TransactionStatus::Completed || tx.transaction_type != transaction_type {
                continue;
            }
            let side_matches = tx.from_account.as_deref() == Some(account_id)
                || tx.to_account.as_deref() == Some(account_id);
            if !side_matches {
                continue;
            }
            if !within_window(tx.created_at, now, window) {
                continue;
            }
            usage.sum = usage.sum.checked_add(tx.amount).unwrap_or(usage.sum);
            usage.count += 1;
        }
        usage
    }

    async fn page(&self, filter: SearchFilter, page: PageSpec) -> Page<Transaction> {
        let page = page.clamped();
        let mut matched = Vec::new();
        for entry in self.rows.iter() {
            let tx = entry.value().data.lock().await;
            if matches_filter(&tx, &filter) {
                matched.push(tx.clone());
            }
        }
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let start = page.offset().min(total) as usize;
        let end = (start + page.size as usize).min(matched.len());
        Page {
            items: matched[start..end].to_vec(),
            page: page.page,
            size: page.size,
            total,
        }
    }

    async fn find_stuck(&self, older_than: DateTime<Utc>) -> Vec<Transaction> {
        let mut result = Vec::new();
        for entry in self.rows.iter() {
            let tx = entry.value().data.lock().await;
            let stuck = !matches!(
                tx.processing_state,
                ProcessingState::Completed | ProcessingState::ManualActionRequired
            ) && !tx.status.is_terminal()
                && tx.created_at < older_than;
            if stuck {
                result.push(tx.clone());
            }
        }
        result
    }
}

fn within_window(created_at: DateTime<Utc>, now: DateTime<Utc>, window: UsageWindow) -> bool {
    match window {
        UsageWindow::Day => created_at.date_naive() == now.date_naive(),
        UsageWindow::Month => {
            created_at.year() == now.year() && created_at.month() == now.month()
        }
    }
}

fn matches_filter(tx: &Transaction, filter: &SearchFilter) -> bool {
    if let Some(account_id) = &filter.account_id {
        let matches = tx.from_account.as_deref() == Some(account_id.as_str())
            || tx.to_account.as_deref() == Some(account_id.as_str());
        if !matches {
            return false;
        }
    }
    if let Some(t) = filter.transaction_type {
        if tx.transaction_type != t {
            return false;
        }
    }
    if let Some(s) = filter.status {
        if tx.status != s {
            return false;
        }
    }
    if let Some(start) = filter.start_date {
        if tx.created_at < start {
            return false;
        }
    }
    if let Some(end) = filter.end_date {
        if tx.created_at > end {
            return false;
        }
    }
    if let Some(min) = filter.min_amount {
        if tx.amount < min {
            return false;
        }
    }
    if let Some(max) = filter.max_amount {
        if tx.amount > max {
            return false;
        }
    }
    if let Some(description) = &filter.description {
        if tx.description.as_deref() != Some(description.as_str()) {
            return false;
        }
    }
    if let Some(reference) = &filter.reference {
        if tx.reference.as_deref() != Some(reference.as_str()) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_common::money::Money;

    fn sample_tx(id: &str, created_by: &str, idempotency_key: Option<&str>) -> Transaction {
        Transaction {
            id: id.to_string(),
            transaction_type: TransactionType::Transfer,
            status: TransactionStatus::Pending,
            processing_state: ProcessingState::Initiated,
            from_account: Some("a".to_string()),
            to_account: Some("b".to_string()),
            amount: Money::parse("10.00").unwrap(),
            currency: "USD".to_string(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
            processed_at: None,
            original_transaction_id: None,
            reversal_transaction_id: None,
            idempotency_key: idempotency_key.map(|k| k.to_string()),
            description: None,
            reference: None,
            failure_reason: None,
        }
    }

    #[tokio::test]
    async fn duplicate_idempotency_key_is_rejected() {
        let store = MemoryTransactionStore::new();
        store.insert(sample_tx("tx-1", "user-1", Some("k1"))).await.unwrap();
        let err = store
            .insert(sample_tx("tx-2", "user-1", Some("k1")))
            .await
            .unwrap_err();
        assert_eq!(err, TransactionStoreError::DuplicateIdempotency);
    }

    #[tokio::test]
    async fn different_subject_same_key_is_allowed() {
        let store = MemoryTransactionStore::new();
        store.insert(sample_tx("tx-1", "user-1", Some("k1"))).await.unwrap();
        store.insert(sample_tx("tx-2", "user-2", Some("k1"))).await.unwrap();
        assert!(store.find_by_id("tx-2").await.is_some());
    }

    #[tokio::test]
    async fn find_by_id_for_update_serializes_reversal_attempts() {
        let store = MemoryTransactionStore::new();
        store.insert(sample_tx("tx-1", "user-1", None)).await.unwrap();

        let guard = store.find_by_id_for_update("tx-1").await.unwrap();
        assert_eq!(guard.transaction.id, "tx-1");
        // second call would block while guard is held; dropping releases it.
        drop(guard);
        assert!(store.find_by_id_for_update("tx-1").await.is_some());
    }
}
