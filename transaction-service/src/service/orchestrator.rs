//! Orchestrator (C7) — the heart of the system. Drives a transaction from
//! `PENDING/INITIATED` to a terminal state, coordinating the debit and
//! credit legs against the Account Service and compensating a successful
//! debit when the credit leg cannot be applied (`spec.md` §4.7).

use std::sync::Arc;

use ledgerflow_common::error::{ApiError, ErrorCode};
use ledgerflow_common::ids::new_id;
use ledgerflow_common::money::Money;
use ledgerflow_common::resilience::{Outcome, ResilienceWrapper};
use ledgerflow_common::time::now;

use crate::client::{AccountBalanceClient, ClientError, RemoteAccount, RemoteBalanceOpStatus};
use crate::domain::{ProcessingState, Transaction, TransactionStatus, TransactionType};
use crate::storage::{TransactionStore, TransactionStoreError, TransactionUpdate};

use super::limit_enforcer::LimitEnforcer;

/// Caller-supplied shape of a brand-new (non-reversal) transaction request,
/// already past `amount > 0` parsing at the DTO boundary.
pub struct NewTransactionRequest {
    pub transaction_type: TransactionType,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub amount: Money,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub idempotency_key: Option<String>,
}

pub struct Orchestrator {
    transactions: Arc<dyn TransactionStore>,
    limit_enforcer: LimitEnforcer,
    account_client: Arc<AccountBalanceClient>,
    resilience: Arc<ResilienceWrapper>,
}

impl Orchestrator {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        limit_enforcer: LimitEnforcer,
        account_client: Arc<AccountBalanceClient>,
        resilience: Arc<ResilienceWrapper>,
    ) -> Self {
        Orchestrator {
            transactions,
            limit_enforcer,
            account_client,
            resilience,
        }
    }

    /// Entry point for `POST /transfer`, `/deposit`, `/withdraw`. Steps 1-5
    /// of `spec.md` §4.7, then hands off to the shared state machine.
    pub async fn submit(
        &self,
        subject: &str,
        bearer: &str,
        request: NewTransactionRequest,
    ) -> Result<Transaction, ApiError> {
        // Step 1: idempotency fast path.
        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = self
                .transactions
                .find_by_idempotency(subject, request.transaction_type, key)
                .await
            {
                return Ok(existing);
            }
        }

        // Step 2: shape validation.
        if !request.amount.is_positive() {
            return Err(ApiError::from_code(ErrorCode::AmountNonPositive));
        }
        validate_required_accounts(request.transaction_type, &request.from_account, &request.to_account)?;

        // Step 3: load + validate accounts.
        let from_account = match &request.from_account {
            Some(from) => Some(self.load_and_validate_account(from, bearer).await?),
            None => None,
        };
        let to_account = match &request.to_account {
            Some(to) => Some(self.load_and_validate_account(to, bearer).await?),
            None => None,
        };
        let currency = match (&from_account, &to_account) {
            (Some(a), Some(b)) if a.currency != b.currency => {
                return Err(ApiError::from_code(ErrorCode::CurrencyMismatch));
            }
            (Some(a), _) => a.currency.clone(),
            (_, Some(b)) => b.currency.clone(),
            (None, None) => unreachable!("validate_required_accounts guarantees at least one side"),
        };

        // Step 4: enforce limits on the side the type is measured against.
        let (limit_account_id, limit_account_type) = if request.transaction_type.limit_side_is_from() {
            let account = from_account.as_ref().expect("validated above");
            (account.id.clone(), account.account_type)
        } else {
            let account = to_account.as_ref().expect("validated above");
            (account.id.clone(), account.account_type)
        };
        self.limit_enforcer
            .enforce(
                &limit_account_id,
                limit_account_type,
                request.transaction_type,
                request.amount,
            )
            .await?;

        // Step 5: insert the INITIATED row.
        let tx = Transaction {
            id: new_id(),
            transaction_type: request.transaction_type,
            status: TransactionStatus::Pending,
            processing_state: ProcessingState::Initiated,
            from_account: request.from_account,
            to_account: request.to_account,
            amount: request.amount,
            currency,
            created_by: subject.to_string(),
            created_at: now(),
            processed_at: None,
            original_transaction_id: None,
            reversal_transaction_id: None,
            idempotency_key: request.idempotency_key.clone(),
            description: request.description,
            reference: request.reference,
            failure_reason: None,
        };

        let inserted = match self.transactions.insert(tx).await {
            Ok(tx) => tx,
            Err(TransactionStoreError::DuplicateIdempotency) => {
                // Narrow race with step 1: someone else just inserted the
                // same (subject, type, key) between our fast-path read and
                // our insert. Re-read and return it.
                let key = request
                    .idempotency_key
                    .as_deref()
                    .expect("duplicate idempotency implies a key was present");
                return self
                    .transactions
                    .find_by_idempotency(subject, request.transaction_type, key)
                    .await
                    .ok_or_else(|| ApiError::from_code(ErrorCode::DuplicateIdempotency));
            }
            Err(other) => return Err(map_store_error(other)),
        };

        self.run_state_machine(inserted, bearer).await
    }

    /// Runs the debit -> credit -> commit state machine starting from
    /// `tx`'s current `processing_state`. Used both for a freshly-inserted
    /// transaction and, via the sweeper, to resume a crashed one.
    pub async fn run_state_machine(&self, mut tx: Transaction, bearer: &str) -> Result<Transaction, ApiError> {
        loop {
            match tx.processing_state {
                ProcessingState::Initiated => {
                    tx = self.debit_step(tx, bearer).await?;
                }
                ProcessingState::DebitApplied => {
                    tx = self.credit_step(tx, bearer).await?;
                }
                ProcessingState::CreditApplied => {
                    tx = self.commit_step(tx).await?;
                }
                ProcessingState::Completed
                | ProcessingState::Compensated
                | ProcessingState::ManualActionRequired => {
                    return Ok(tx);
                }
            }
            if tx.status.is_terminal() {
                return Ok(tx);
            }
        }
    }

    async fn debit_step(&self, tx: Transaction, bearer: &str) -> Result<Transaction, ApiError> {
        if !tx.has_debit_leg() {
            return self
                .advance(&tx.id, ProcessingState::DebitApplied, None, None)
                .await;
        }

        let from = tx.from_account.as_deref().expect("debit leg implies from_account");
        let op_id = tx.debit_operation_id();
        let outcome = self
            .resilience
            .call("account-debit", || {
                self.account_client.apply_balance_op(
                    from,
                    &op_id,
                    &tx.id,
                    tx.amount.negate(),
                    "debit",
                    false,
                    bearer,
                )
            })
            .await;

        match outcome {
            Ok(response) => match response.status {
                RemoteBalanceOpStatus::Applied | RemoteBalanceOpStatus::Replayed => {
                    self.advance(&tx.id, ProcessingState::DebitApplied, None, None).await
                }
                RemoteBalanceOpStatus::Rejected => {
                    self.fail_with(
                        &tx.id,
                        TransactionStatus::Failed,
                        ProcessingState::Completed,
                        "INSUFFICIENT_FUNDS",
                    )
                    .await
                }
            },
            Err(_outcome) => {
                self.fail_with(
                    &tx.id,
                    TransactionStatus::Failed,
                    ProcessingState::Completed,
                    "UPSTREAM_UNAVAILABLE",
                )
                .await
            }
        }
    }

    async fn credit_step(&self, tx: Transaction, bearer: &str) -> Result<Transaction, ApiError> {
        if !tx.has_credit_leg() {
            return self
                .advance(&tx.id, ProcessingState::CreditApplied, None, None)
                .await;
        }

        let to = tx.to_account.as_deref().expect("credit leg implies to_account");
        let op_id = tx.credit_operation_id();
        let outcome = self
            .resilience
            .call("account-credit", || {
                self.account_client
                    .apply_balance_op(to, &op_id, &tx.id, tx.amount, "credit", true, bearer)
            })
            .await;

        match outcome {
            Ok(response) => match response.status {
                RemoteBalanceOpStatus::Applied | RemoteBalanceOpStatus::Replayed => {
                    self.advance(&tx.id, ProcessingState::CreditApplied, None, None).await
                }
                // Credit is opened allow_negative=true so it should never
                // reject in practice, but a rejection is still a credit
                // failure that must be compensated like any other.
                RemoteBalanceOpStatus::Rejected => self.compensate(tx, bearer).await,
            },
            Err(_outcome) => self.compensate(tx, bearer).await,
        }
    }

    async fn compensate(&self, tx: Transaction, bearer: &str) -> Result<Transaction, ApiError> {
        if !tx.has_debit_leg() {
            // Nothing was debited; a failed credit on a debit-less
            // transaction (e.g. DEPOSIT) just fails outright.
            return self
                .fail_with(
                    &tx.id,
                    TransactionStatus::Failed,
                    ProcessingState::Completed,
                    "CREDIT_FAILED",
                )
                .await;
        }

        let from = tx.from_account.as_deref().expect("compensation implies from_account");
        let op_id = tx.compensate_operation_id();
        let outcome = self
            .resilience
            .call("account-compensate", || {
                self.account_client
                    .apply_balance_op(from, &op_id, &tx.id, tx.amount, "compensate", true, bearer)
            })
            .await;

        match outcome {
            Ok(response)
                if matches!(
                    response.status,
                    RemoteBalanceOpStatus::Applied | RemoteBalanceOpStatus::Replayed
                ) =>
            {
                self.fail_with(
                    &tx.id,
                    TransactionStatus::Failed,
                    ProcessingState::Compensated,
                    "CREDIT_FAILED",
                )
                .await
            }
            _ => {
                log::error!(
                    "compensation failed for transaction {}; entering manual-action-required",
                    tx.id
                );
                self.fail_with(
                    &tx.id,
                    TransactionStatus::FailedRequiresManualAction,
                    ProcessingState::ManualActionRequired,
                    "MANUAL_ACTION_REQUIRED",
                )
                .await
            }
        }
    }

    async fn commit_step(&self, tx: Transaction) -> Result<Transaction, ApiError> {
        let update = TransactionUpdate {
            status: Some(TransactionStatus::Completed),
            processing_state: Some(ProcessingState::Completed),
            processed_at: Some(now()),
            ..Default::default()
        };
        self.transactions
            .update(&tx.id, update)
            .await
            .map_err(map_store_error)
    }

    async fn advance(
        &self,
        id: &str,
        processing_state: ProcessingState,
        status: Option<TransactionStatus>,
        failure_reason: Option<String>,
    ) -> Result<Transaction, ApiError> {
        let update = TransactionUpdate {
            status,
            processing_state: Some(processing_state),
            failure_reason,
            ..Default::default()
        };
        self.transactions.update(id, update).await.map_err(map_store_error)
    }

    async fn fail_with(
        &self,
        id: &str,
        status: TransactionStatus,
        processing_state: ProcessingState,
        reason: &str,
    ) -> Result<Transaction, ApiError> {
        let update = TransactionUpdate {
            status: Some(status),
            processing_state: Some(processing_state),
            processed_at: Some(now()),
            failure_reason: Some(reason.to_string()),
            ..Default::default()
        };
        self.transactions.update(id, update).await.map_err(map_store_error)
    }

    async fn load_and_validate_account(
        &self,
        account_id: &str,
        bearer: &str,
    ) -> Result<RemoteAccount, ApiError> {
        let outcome = self
            .resilience
            .call("account-get", || self.account_client.get_account(account_id, bearer))
            .await;

        let account = match outcome {
            Ok(account) => account,
            Err(Outcome::Upstream(ClientError::Remote4xx { status })) if status == 404 => {
                return Err(ApiError::from_code(ErrorCode::AccountNotFound));
            }
            Err(_) => return Err(ApiError::from_code(ErrorCode::UpstreamUnavailable)),
        };

        if !account.active {
            return Err(ApiError::from_code(ErrorCode::AccountInactive));
        }

        Ok(account)
    }
}

fn validate_required_accounts(
    transaction_type: TransactionType,
    from: &Option<String>,
    to: &Option<String>,
) -> Result<(), ApiError> {
    let missing = match transaction_type {
        TransactionType::Transfer => from.is_none() || to.is_none(),
        TransactionType::Withdrawal | TransactionType::Fee => from.is_none(),
        TransactionType::Deposit | TransactionType::Interest | TransactionType::Refund => to.is_none(),
        TransactionType::Reversal => from.is_none() && to.is_none(),
    };
    if missing {
        Err(ApiError::from_code(ErrorCode::MissingAccount))
    } else {
        Ok(())
    }
}

fn map_store_error(err: TransactionStoreError) -> ApiError {
    match err {
        TransactionStoreError::DuplicateIdempotency => ApiError::from_code(ErrorCode::DuplicateIdempotency),
        TransactionStoreError::NotFound => ApiError::from_code(ErrorCode::TransactionNotFound),
        TransactionStoreError::IllegalTransition => {
            ApiError::new(ErrorCode::ManualActionRequired, "illegal transaction state transition")
        }
    }
}
