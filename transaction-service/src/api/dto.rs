use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerflow_common::money::Money;

use crate::domain::{ProcessingState, Transaction, TransactionStatus, TransactionType};
use crate::service::NewTransactionRequest;
use crate::storage::SearchFilter;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
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

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        TransactionResponse {
            id: tx.id,
            transaction_type: tx.transaction_type,
            status: tx.status,
            processing_state: tx.processing_state,
            from_account: tx.from_account,
            to_account: tx.to_account,
            amount: tx.amount,
            currency: tx.currency,
            created_by: tx.created_by,
            created_at: tx.created_at,
            processed_at: tx.processed_at,
            original_transaction_id: tx.original_transaction_id,
            reversal_transaction_id: tx.reversal_transaction_id,
            idempotency_key: tx.idempotency_key,
            description: tx.description,
            reference: tx.reference,
            failure_reason: tx.failure_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_id: String,
    pub to_account_id: String,
    pub amount: Money,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

impl From<TransferRequest> for NewTransactionRequest {
    fn from(req: TransferRequest) -> Self {
        NewTransactionRequest {
            transaction_type: TransactionType::Transfer,
            from_account: Some(req.from_account_id),
            to_account: Some(req.to_account_id),
            amount: req.amount,
            description: req.description,
            reference: None,
            idempotency_key: req.idempotency_key,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub account_id: String,
    pub amount: Money,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

impl From<DepositRequest> for NewTransactionRequest {
    fn from(req: DepositRequest) -> Self {
        NewTransactionRequest {
            transaction_type: TransactionType::Deposit,
            from_account: None,
            to_account: Some(req.account_id),
            amount: req.amount,
            description: req.description,
            reference: None,
            idempotency_key: req.idempotency_key,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub account_id: String,
    pub amount: Money,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

impl From<WithdrawRequest> for NewTransactionRequest {
    fn from(req: WithdrawRequest) -> Self {
        NewTransactionRequest {
            transaction_type: TransactionType::Withdrawal,
            from_account: Some(req.account_id),
            to_account: None,
            amount: req.amount,
            description: req.description,
            reference: None,
            idempotency_key: req.idempotency_key,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseRequest {
    pub reason: String,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub account_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

impl From<SearchQuery> for SearchFilter {
    fn from(q: SearchQuery) -> Self {
        SearchFilter {
            account_id: q.account_id,
            transaction_type: q.transaction_type,
            status: q.status,
            start_date: q.start_date,
            end_date: q.end_date,
            min_amount: q.min_amount,
            max_amount: q.max_amount,
            description: q.description,
            reference: q.reference,
        }
    }
}
