pub mod memory;

pub use memory::MemoryAccountStore;

use async_trait::async_trait;

use crate::domain::{Account, BalanceOpRequest, BalanceOperation};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("account not found")]
    AccountNotFound,
}

/// Storage abstraction for accounts and the balance-op ledger (C9). A single
/// trait covers both because every mutation of one touches the other
/// atomically: applying a balance op both records the ledger row and updates
/// the account balance under the same per-account lock.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    async fn get(&self, account_id: &str) -> Option<Account>;

    /// Administrative absolute balance set. Bypasses the balance-op ledger
    /// entirely per `SPEC_FULL.md` §9 Open Question 1.
    async fn set_balance_absolute(
        &self,
        account_id: &str,
        new_balance: ledgerflow_common::money::Money,
    ) -> Result<Account, StoreError>;

    /// Applies `request` to `account_id` atomically and idempotently by
    /// `(account_id, operation_id)`. First submission with a given key inserts
    /// the ledger row and mutates the balance under a per-account lock; any
    /// later submission with the same key returns the stored outcome
    /// byte-for-byte without mutating the balance again.
    async fn apply_balance_op(
        &self,
        account_id: &str,
        request: BalanceOpRequest,
    ) -> Result<BalanceOperation, StoreError>;

    /// Seeds an account for tests and local bring-up; not part of the public
    /// HTTP surface.
    async fn seed(&self, account: Account);
}
