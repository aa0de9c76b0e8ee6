//! The Transaction entity — the atomic unit the orchestrator drives from
//! request to terminal state. See `spec.md` §3 for the invariants this type
//! must uphold; they are enforced by the orchestrator (C7) and reversal
//! coordinator (C8), not by this module itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerflow_common::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Transfer,
    Deposit,
    Withdrawal,
    Fee,
    Interest,
    Reversal,
    Refund,
}

impl TransactionType {
    /// Side the limit enforcer (C6) should check against, per `spec.md` §4.7
    /// step 4: `from` for transfer/withdrawal/fee, `to` for deposit/interest/refund.
    /// `Reversal` checks whichever side is populated as `from`.
    pub fn limit_side_is_from(self) -> bool {
        matches!(
            self,
            TransactionType::Transfer
                | TransactionType::Withdrawal
                | TransactionType::Fee
                | TransactionType::Reversal
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    FailedRequiresManualAction,
    Reversed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed
                | TransactionStatus::Failed
                | TransactionStatus::FailedRequiresManualAction
                | TransactionStatus::Reversed
                | TransactionStatus::Cancelled
        )
    }

    /// Whether a `REVERSAL` in this status counts against "at most one
    /// successful reversal" (`spec.md` §3 invariant 3).
    pub fn counts_as_successful_reversal(self) -> bool {
        !matches!(
            self,
            TransactionStatus::Failed | TransactionStatus::FailedRequiresManualAction
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingState {
    Initiated,
    DebitApplied,
    CreditApplied,
    Completed,
    Compensated,
    ManualActionRequired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub processing_state: ProcessingState,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub original_transaction_id: Option<String>,
    pub reversal_transaction_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub failure_reason: Option<String>,
}

impl Transaction {
    /// A row has a debit leg iff it actually has a `from_account` — derived
    /// from the row itself rather than `transaction_type`, since `REVERSAL`
    /// rows inherit whichever sides the original transaction populated
    /// (a reversed WITHDRAWAL has no `to_account`, so its reversal has no
    /// `from_account`).
    pub fn has_debit_leg(&self) -> bool {
        self.from_account.is_some()
    }

    /// A row has a credit leg iff it actually has a `to_account`. See
    /// `has_debit_leg` for why this is derived per-row, not per-type.
    pub fn has_credit_leg(&self) -> bool {
        self.to_account.is_some()
    }

    pub fn debit_operation_id(&self) -> String {
        format!("{}:debit", self.id)
    }

    pub fn credit_operation_id(&self) -> String {
        format!("{}:credit", self.id)
    }

    pub fn compensate_operation_id(&self) -> String {
        format!("{}:compensate", self.id)
    }
}
