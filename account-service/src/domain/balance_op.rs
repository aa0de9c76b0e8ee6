//! BalanceOperation — the C9 ledger row. Write-once per `(account_id, operation_id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerflow_common::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BalanceOpStatus {
    Applied,
    Rejected,
    Replayed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceOperation {
    pub account_id: String,
    pub operation_id: String,
    pub transaction_id: String,
    pub delta: Money,
    pub reason: String,
    pub allow_negative: bool,
    pub applied: bool,
    pub resulting_balance: Money,
    pub status: BalanceOpStatus,
    pub created_at: DateTime<Utc>,
}

/// Request to apply a signed delta to an account's balance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceOpRequest {
    pub operation_id: String,
    pub transaction_id: String,
    pub delta: Money,
    pub reason: String,
    #[serde(default)]
    pub allow_negative: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceOpResponse {
    pub applied: bool,
    pub status: BalanceOpStatus,
    pub resulting_balance: Money,
}

impl From<&BalanceOperation> for BalanceOpResponse {
    fn from(op: &BalanceOperation) -> Self {
        BalanceOpResponse {
            applied: op.applied,
            status: op.status,
            resulting_balance: op.resulting_balance,
        }
    }
}
