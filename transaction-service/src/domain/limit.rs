//! TransactionLimit — administrative configuration read by the Limit
//! Enforcer (C6). Primary key `(account_type, transaction_type)`.

use serde::{Deserialize, Serialize};

use ledgerflow_common::money::Money;

use super::account_type::AccountType;
use super::transaction::TransactionType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLimit {
    pub account_type: AccountType,
    pub transaction_type: TransactionType,
    pub daily_limit: Option<Money>,
    pub monthly_limit: Option<Money>,
    pub per_tx_limit: Option<Money>,
    pub daily_count: Option<u64>,
    pub monthly_count: Option<u64>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageWindow {
    Day,
    Month,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub sum: Money,
    pub count: u64,
}
