//! Account entity. Per `spec.md` §9 "Design Notes", account kinds are modeled
//! as a single tagged record rather than a checking/savings/credit class
//! hierarchy; type-specific behavior (credit limits) lives as optional fields
//! here and as data in the Limit Enforcer, not as dispatch.

use serde::{Deserialize, Serialize};

use ledgerflow_common::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub owner_id: String,
    pub account_type: AccountType,
    pub balance: Money,
    /// Only meaningful for `AccountType::Credit`; `None` for checking/savings.
    pub credit_limit: Option<Money>,
    pub active: bool,
    pub currency: String,
}

impl Account {
    /// Credit accounts may go negative up to `credit_limit`; non-credit
    /// accounts may never be made negative by a non-allow-negative op.
    pub fn available_credit(&self) -> Option<Money> {
        let limit = self.credit_limit?;
        Some(limit.checked_add(self.balance).unwrap_or(Money::ZERO))
    }

    /// Whether applying `delta` (signed) would leave the account in a state
    /// acceptable for a non-`allow_negative` operation.
    pub fn accepts_delta(&self, delta: Money) -> bool {
        let resulting = match self.balance.checked_add(delta) {
            Some(value) => value,
            None => return false,
        };
        if resulting.minor_units() >= 0 {
            return true;
        }
        match self.account_type {
            AccountType::Credit => {
                let limit = self.credit_limit.unwrap_or(Money::ZERO);
                resulting.negate().minor_units() <= limit.minor_units()
            }
            AccountType::Checking | AccountType::Savings => false,
        }
    }
}
