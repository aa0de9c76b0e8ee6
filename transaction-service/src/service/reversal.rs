//! Reversal Coordinator (C8). Validates and records the reversal of a prior
//! completed transaction under a row-level lock, then hands the new
//! `REVERSAL` row to the orchestrator's state machine (`spec.md` §4.8).

use std::sync::Arc;

use ledgerflow_common::error::{ApiError, ErrorCode};
use ledgerflow_common::ids::new_id;
use ledgerflow_common::time::now;

use crate::domain::{ProcessingState, Transaction, TransactionStatus, TransactionType};
use crate::storage::{TransactionStore, TransactionUpdate};

use super::orchestrator::Orchestrator;

pub struct ReversalCoordinator {
    transactions: Arc<dyn TransactionStore>,
    orchestrator: Arc<Orchestrator>,
}

impl ReversalCoordinator {
    pub fn new(transactions: Arc<dyn TransactionStore>, orchestrator: Arc<Orchestrator>) -> Self {
        ReversalCoordinator {
            transactions,
            orchestrator,
        }
    }

    pub async fn reverse(
        &self,
        original_id: &str,
        reason: &str,
        subject: &str,
        bearer: &str,
        idempotency_key: Option<String>,
    ) -> Result<Transaction, ApiError> {
        // Step 1: idempotency fast path.
        if let Some(key) = &idempotency_key {
            if let Some(existing) = self
                .transactions
                .find_by_idempotency(subject, TransactionType::Reversal, key)
                .await
            {
                return Ok(existing);
            }
        }

        // Step 2: lock the original row for the duration of the
        // check-then-insert unit of work.
        let guard = self
            .transactions
            .find_by_id_for_update(original_id)
            .await
            .ok_or_else(|| ApiError::from_code(ErrorCode::TransactionNotFound))?;
        let original = guard.transaction.clone();

        // Step 3: only a COMPLETED transaction is reversible. A REVERSAL's
        // own status is COMPLETED too, but `type = REVERSAL` is excluded by
        // invariant 3's framing (reversal-of-reversal is not reversible).
        if original.status != TransactionStatus::Completed || original.transaction_type == TransactionType::Reversal
        {
            return Err(ApiError::from_code(ErrorCode::NotReversible));
        }

        // Step 4: at most one non-failed reversal per original.
        let existing_reversals = self.transactions.find_reversals(original_id).await;
        if existing_reversals
            .iter()
            .any(|r| r.status.counts_as_successful_reversal())
        {
            return Err(ApiError::from_code(ErrorCode::AlreadyReversed));
        }

        // Step 5: insert the REVERSAL row with swapped legs, then point the
        // original at it.
        let reversal = Transaction {
            id: new_id(),
            transaction_type: TransactionType::Reversal,
            status: TransactionStatus::Pending,
            processing_state: ProcessingState::Initiated,
            from_account: original.to_account.clone(),
            to_account: original.from_account.clone(),
            amount: original.amount,
            currency: original.currency.clone(),
            created_by: subject.to_string(),
            created_at: now(),
            processed_at: None,
            original_transaction_id: Some(original_id.to_string()),
            reversal_transaction_id: None,
            idempotency_key,
            description: Some(reason.to_string()),
            reference: None,
            failure_reason: None,
        };

        let inserted = self
            .transactions
            .insert(reversal)
            .await
            .map_err(|_| ApiError::from_code(ErrorCode::AlreadyReversed))?;

        self.transactions
            .update(
                original_id,
                TransactionUpdate {
                    reversal_transaction_id: Some(inserted.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|_| ApiError::from_code(ErrorCode::TransactionNotFound))?;

        // Row lock is released here, once the original is pointed at the new
        // reversal and a second concurrent reverse() call would now see it
        // via find_reversals.
        drop(guard);

        // Step 6: hand off to the ordinary two-legged state machine.
        let completed = self.orchestrator.run_state_machine(inserted, bearer).await?;

        // Step 7: on a successful reversal, flip the original to REVERSED.
        if completed.status == TransactionStatus::Completed {
            self.transactions
                .update(
                    original_id,
                    TransactionUpdate {
                        status: Some(TransactionStatus::Reversed),
                        ..Default::default()
                    },
                )
                .await
                .map_err(|_| ApiError::from_code(ErrorCode::TransactionNotFound))?;
        }

        Ok(completed)
    }
}
