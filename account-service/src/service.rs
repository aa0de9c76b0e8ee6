//! Account Service application layer: thin orchestration over the storage
//! trait plus the authorization rule for the administrative absolute-set
//! endpoint.

use std::sync::Arc;

use ledgerflow_common::{
    auth::Principal,
    error::{ApiError, ErrorCode},
    money::Money,
};

use crate::domain::{Account, BalanceOpRequest, BalanceOperation};
use crate::storage::{AccountStore, StoreError};

pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        AccountService { store }
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account, ApiError> {
        self.store
            .get(account_id)
            .await
            .ok_or_else(|| ApiError::from_code(ErrorCode::AccountNotFound))
    }

    /// `PUT /accounts/{id}/balance`: administrative absolute set, bypasses the
    /// balance-op ledger entirely (`SPEC_FULL.md` §9 Open Question 1).
    pub async fn set_balance_absolute(
        &self,
        principal: &Principal,
        account_id: &str,
        new_balance: Money,
    ) -> Result<Account, ApiError> {
        if !principal.has_role("ADMIN") {
            return Err(ApiError::from_code(ErrorCode::RoleRequired));
        }
        self.store
            .set_balance_absolute(account_id, new_balance)
            .await
            .map_err(map_store_error)
    }

    /// `POST /accounts/{id}/balance-ops`: idempotent signed delta application,
    /// the Account-side half of the debit/credit legs driven by the
    /// Transaction Service's orchestrator (C7) through C4/C5.
    pub async fn apply_balance_op(
        &self,
        account_id: &str,
        request: BalanceOpRequest,
    ) -> Result<BalanceOperation, ApiError> {
        self.store
            .apply_balance_op(account_id, request)
            .await
            .map_err(map_store_error)
    }
}

fn map_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::AccountNotFound => ApiError::from_code(ErrorCode::AccountNotFound),
    }
}
