//! In-process store standing in for the production relational store; database
//! migration tooling is explicitly out of scope per `spec.md` §1. Per-account
//! mutation is serialized through a `tokio::sync::Mutex` held for the
//! duration of one `apply_balance_op`, matching the per-account row lock
//! described in `spec.md` §5.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use ledgerflow_common::money::Money;
use tokio::sync::Mutex;

use crate::domain::{Account, BalanceOpRequest, BalanceOpStatus, BalanceOperation};

use super::{AccountStore, StoreError};

struct AccountRow {
    account: Mutex<Account>,
    ledger: Mutex<std::collections::HashMap<String, BalanceOperation>>,
}

pub struct MemoryAccountStore {
    accounts: DashMap<String, Arc<AccountRow>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        MemoryAccountStore {
            accounts: DashMap::new(),
        }
    }

    fn row(&self, account_id: &str) -> Option<Arc<AccountRow>> {
        self.accounts.get(account_id).map(|r| r.clone())
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, account_id: &str) -> Option<Account> {
        let row = self.row(account_id)?;
        let account = row.account.lock().await;
        Some(account.clone())
    }

    async fn set_balance_absolute(
        &self,
        account_id: &str,
        new_balance: Money,
    ) -> Result<Account, StoreError> {
        let row = self.row(account_id).ok_or(StoreError::AccountNotFound)?;
        let mut account = row.account.lock().await;
        account.balance = new_balance;
        Ok(account.clone())
    }

    async fn apply_balance_op(
        &self,
        account_id: &str,
        request: BalanceOpRequest,
    ) -> Result<BalanceOperation, StoreError> {
        let row = self.row(account_id).ok_or(StoreError::AccountNotFound)?;

        // Lock account and ledger together for the duration of this op: the
        // whole read-check-write sequence must be atomic per account.
        let mut account = row.account.lock().await;
        let mut ledger = row.ledger.lock().await;

        if let Some(existing) = ledger.get(&request.operation_id) {
            return Ok(BalanceOperation {
                status: BalanceOpStatus::Replayed,
                applied: false,
                ..existing.clone()
            });
        }

        let accepts = request.allow_negative || account.accepts_delta(request.delta);
        let entry = if accepts {
            let resulting = account
                .balance
                .checked_add(request.delta)
                .ok_or(StoreError::AccountNotFound)?;
            account.balance = resulting;
            BalanceOperation {
                account_id: account_id.to_string(),
                operation_id: request.operation_id.clone(),
                transaction_id: request.transaction_id.clone(),
                delta: request.delta,
                reason: request.reason.clone(),
                allow_negative: request.allow_negative,
                applied: true,
                resulting_balance: resulting,
                status: BalanceOpStatus::Applied,
                created_at: ledgerflow_common::time::now(),
            }
        } else {
            BalanceOperation {
                account_id: account_id.to_string(),
                operation_id: request.operation_id.clone(),
                transaction_id: request.transaction_id.clone(),
                delta: request.delta,
                reason: request.reason.clone(),
                allow_negative: request.allow_negative,
                applied: false,
                resulting_balance: account.balance,
                status: BalanceOpStatus::Rejected,
                created_at: ledgerflow_common::time::now(),
            }
        };

        ledger.insert(request.operation_id.clone(), entry.clone());
        Ok(entry)
    }

    async fn seed(&self, account: Account) {
        self.accounts.insert(
            account.id.clone(),
            Arc::new(AccountRow {
                account: Mutex::new(account),
                ledger: Mutex::new(std::collections::HashMap::new()),
            }),
        );
    }
}
