pub mod memory_limits;
pub mod memory_transactions;

pub use memory_limits::MemoryLimitStore;
pub use memory_transactions::MemoryTransactionStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ledgerflow_common::pagination::{Page, PageSpec};

use crate::domain::{
    AccountType, Transaction, TransactionLimit, TransactionType, Usage, UsageWindow,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransactionStoreError {
    #[error("DUPLICATE_IDEMPOTENCY")]
    DuplicateIdempotency,
    #[error("transaction not found")]
    NotFound,
    #[error("illegal state transition")]
    IllegalTransition,
}

/// Fields an orchestration step may update on a transaction row. Only the
/// fields actually being changed are set; everything else is left as-is.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub status: Option<crate::domain::TransactionStatus>,
    pub processing_state: Option<crate::domain::ProcessingState>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub reversal_transaction_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub account_id: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub status: Option<crate::domain::TransactionStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_amount: Option<ledgerflow_common::money::Money>,
    pub max_amount: Option<ledgerflow_common::money::Money>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// Persists transactions and enforces the uniqueness invariants of
/// `spec.md` §3 (idempotency key, single non-failed reversal per original).
#[async_trait]
pub trait TransactionStore: Send + Sync + 'static {
    async fn insert(&self, tx: Transaction) -> Result<Transaction, TransactionStoreError>;

    async fn update(
        &self,
        id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction, TransactionStoreError>;

    async fn find_by_id(&self, id: &str) -> Option<Transaction>;

    /// Acquires a row-level write lock on `id`, held until the returned guard
    /// is dropped, for the reversal path's "check-then-insert" atomicity
    /// (`spec.md` §4.8 step 2).
    async fn find_by_id_for_update(&self, id: &str) -> Option<TransactionLockGuard>;

    async fn find_by_idempotency(
        &self,
        created_by: &str,
        transaction_type: TransactionType,
        key: &str,
    ) -> Option<Transaction>;

    async fn find_reversals(&self, original_id: &str) -> Vec<Transaction>;

    async fn aggregate_usage(
        &self,
        account_id: &str,
        transaction_type: TransactionType,
        window: UsageWindow,
    ) -> Usage;

    async fn page(&self, filter: SearchFilter, page: PageSpec) -> Page<Transaction>;

    /// Rows whose `processing_state` is non-terminal and whose `created_at`
    /// is older than `older_than` — input to the crash-recovery sweeper (C15).
    async fn find_stuck(&self, older_than: DateTime<Utc>) -> Vec<Transaction>;
}

/// RAII guard representing the row lock acquired by `find_by_id_for_update`.
/// Holding this across the reversal-insertion unit of work is what makes
/// "check original is COMPLETED, check no existing reversal, insert reversal"
/// atomic (`spec.md` §4.8).
pub struct TransactionLockGuard {
    pub transaction: Transaction,
    _permit: tokio::sync::OwnedMutexGuard<()>,
}

impl TransactionLockGuard {
    pub fn new(transaction: Transaction, permit: tokio::sync::OwnedMutexGuard<()>) -> Self {
        TransactionLockGuard {
            transaction,
            _permit: permit,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LimitStoreError {
    #[error("storage error")]
    Unavailable,
}

/// Read-mostly store for `spec.md` §4.2. Caching (TTL, invalidation) is
/// layered on top in `service::limit_enforcer`, not in the trait itself.
#[async_trait]
pub trait LimitStore: Send + Sync + 'static {
    async fn find_active(
        &self,
        account_type: AccountType,
        transaction_type: TransactionType,
    ) -> Result<Option<TransactionLimit>, LimitStoreError>;

    async fn upsert(&self, limit: TransactionLimit) -> Result<(), LimitStoreError>;
}
