use serde::{Deserialize, Serialize};

use ledgerflow_common::money::Money;

use crate::domain::{Account, AccountType};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub owner_id: String,
    pub account_type: AccountType,
    pub balance: Money,
    pub available_credit: Option<Money>,
    pub active: bool,
    pub currency: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse {
            available_credit: account.available_credit(),
            id: account.id,
            owner_id: account.owner_id,
            account_type: account.account_type,
            balance: account.balance,
            active: account.active,
            currency: account.currency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetBalanceRequest {
    pub balance: Money,
}
