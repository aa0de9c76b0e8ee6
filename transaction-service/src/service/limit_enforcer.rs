//! Limit Enforcer (C6). Advisory-synchronous: runs once before the debit
//! leg and is never re-checked after compensation, since failed/compensated
//! transactions are excluded from the aggregate by definition (`spec.md`
//! §4.6).

use std::sync::Arc;

use ledgerflow_common::error::{ApiError, ErrorCode};
use ledgerflow_common::money::Money;

use crate::domain::{AccountType, TransactionType, UsageWindow};
use crate::storage::{LimitStore, TransactionStore};

pub struct LimitEnforcer {
    limits: Arc<dyn LimitStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl LimitEnforcer {
    pub fn new(limits: Arc<dyn LimitStore>, transactions: Arc<dyn TransactionStore>) -> Self {
        LimitEnforcer { limits, transactions }
    }

    /// Checks the configured limit for `(account_type, transaction_type)`
    /// against `account_id`'s current usage plus the candidate `amount`.
    /// A missing or inactive limit row means "no limit configured" and
    /// always passes (`spec.md` §4.2).
    pub async fn enforce(
        &self,
        account_id: &str,
        account_type: AccountType,
        transaction_type: TransactionType,
        amount: Money,
    ) -> Result<(), ApiError> {
        let limit = match self
            .limits
            .find_active(account_type, transaction_type)
            .await
            .map_err(|_| ApiError::from_code(ErrorCode::LimitExceeded))?
        {
            Some(limit) => limit,
            None => return Ok(()),
        };

        if let Some(per_tx) = limit.per_tx_limit {
            if amount > per_tx {
                return Err(ApiError::from_code(ErrorCode::LimitExceeded));
            }
        }

        // Zero or negative count limits mean "reject everything of this
        // type" per the supplemental edge case: a configured, non-null,
        // non-positive count is not "no limit", it is "no allowance".
        if let Some(daily_count) = limit.daily_count {
            if daily_count == 0 {
                return Err(ApiError::from_code(ErrorCode::LimitExceeded));
            }
        }
        if let Some(monthly_count) = limit.monthly_count {
            if monthly_count == 0 {
                return Err(ApiError::from_code(ErrorCode::LimitExceeded));
            }
        }

        let daily = self
            .transactions
            .aggregate_usage(account_id, transaction_type, UsageWindow::Day)
            .await;
        let monthly = self
            .transactions
            .aggregate_usage(account_id, transaction_type, UsageWindow::Month)
            .await;

        if let Some(daily_limit) = limit.daily_limit {
            if daily.sum.checked_add(amount).map(|s| s > daily_limit).unwrap_or(true) {
                return Err(ApiError::from_code(ErrorCode::LimitExceeded));
            }
        }
        if let Some(monthly_limit) = limit.monthly_limit {
            if monthly
                .sum
                .checked_add(amount)
                .map(|s| s > monthly_limit)
                .unwrap_or(true)
            {
                return Err(ApiError::from_code(ErrorCode::LimitExceeded));
            }
        }
        if let Some(daily_count) = limit.daily_count {
            if daily.count + 1 > daily_count {
                return Err(ApiError::from_code(ErrorCode::LimitExceeded));
            }
        }
        if let Some(monthly_count) = limit.monthly_count {
            if monthly.count + 1 > monthly_count {
                return Err(ApiError::from_code(ErrorCode::LimitExceeded));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionLimit;
    use crate::storage::{MemoryLimitStore, MemoryTransactionStore};

    fn checking_withdrawal_limit(daily_limit: &str) -> TransactionLimit {
        TransactionLimit {
            account_type: AccountType::Checking,
            transaction_type: TransactionType::Withdrawal,
            daily_limit: Some(Money::parse(daily_limit).unwrap()),
            monthly_limit: None,
            per_tx_limit: None,
            daily_count: None,
            monthly_count: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn no_configured_limit_passes() {
        let limits = Arc::new(MemoryLimitStore::default());
        let transactions = Arc::new(MemoryTransactionStore::new());
        let enforcer = LimitEnforcer::new(limits, transactions);
        let result = enforcer
            .enforce(
                "acc-1",
                AccountType::Checking,
                TransactionType::Withdrawal,
                Money::parse("50.00").unwrap(),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn zero_daily_count_rejects_everything() {
        let limits = Arc::new(MemoryLimitStore::default());
        let mut limit = checking_withdrawal_limit("1000.00");
        limit.daily_count = Some(0);
        limits.upsert(limit).await.unwrap();
        let transactions = Arc::new(MemoryTransactionStore::new());
        let enforcer = LimitEnforcer::new(limits, transactions);

        let err = enforcer
            .enforce(
                "acc-1",
                AccountType::Checking,
                TransactionType::Withdrawal,
                Money::parse("1.00").unwrap(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LimitExceeded);
    }

    #[tokio::test]
    async fn per_tx_limit_is_enforced() {
        let limits = Arc::new(MemoryLimitStore::default());
        let mut limit = checking_withdrawal_limit("1000.00");
        limit.per_tx_limit = Some(Money::parse("100.00").unwrap());
        limits.upsert(limit).await.unwrap();
        let transactions = Arc::new(MemoryTransactionStore::new());
        let enforcer = LimitEnforcer::new(limits, transactions);

        let err = enforcer
            .enforce(
                "acc-1",
                AccountType::Checking,
                TransactionType::Withdrawal,
                Money::parse("150.00").unwrap(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LimitExceeded);
    }
}
