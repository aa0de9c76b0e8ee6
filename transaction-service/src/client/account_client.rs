//! Account-Balance Client (C4): the only way the Transaction Service touches
//! account state. Every call is wrapped by the Resilience Wrapper (C5) at the
//! call site in the orchestrator, not here — this module stays a thin,
//! synchronous-shaped HTTP client, the way the teacher's `CallbackService`
//! separates delivery mechanics from retry policy.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use ledgerflow_common::money::Money;
use ledgerflow_common::resilience::Retryable;

use crate::domain::AccountType;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAccount {
    pub id: String,
    pub owner_id: String,
    pub account_type: AccountType,
    pub balance: Money,
    pub available_credit: Option<Money>,
    pub active: bool,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceOpRequestBody {
    operation_id: String,
    transaction_id: String,
    delta: Money,
    reason: String,
    allow_negative: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBalanceOp {
    pub applied: bool,
    pub status: RemoteBalanceOpStatus,
    pub resulting_balance: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteBalanceOpStatus {
    Applied,
    Rejected,
    Replayed,
}

/// Categorized failure modes from `spec.md` §4.4. `is_retryable` is what the
/// Resilience Wrapper (C5) consults to decide whether to retry a leg.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("network error reaching account service: {0}")]
    Network(String),
    #[error("account service call timed out")]
    Timeout,
    #[error("account service rejected the request: {status}")]
    Remote4xx { status: u16 },
    #[error("account service is unavailable: {status}")]
    Remote5xx { status: u16 },
}

impl Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Timeout | ClientError::Remote5xx { .. }
        ) || matches!(self, ClientError::Remote4xx { status } if *status == 429)
    }
}

pub struct AccountBalanceClient {
    http: Client,
    base_url: String,
}

impl AccountBalanceClient {
    pub fn new(base_url: String, timeout: std::time::Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        AccountBalanceClient { http, base_url }
    }

    pub async fn get_account(&self, id: &str, bearer: &str) -> Result<RemoteAccount, ClientError> {
        let url = format!("{}/accounts/{}", self.base_url, id);
        let response = self
            .http
            .get(&url)
            .header("Authorization", bearer)
            .send()
            .await
            .map_err(classify_transport_error)?;

        parse_response(response).await
    }

    pub async fn apply_balance_op(
        &self,
        account_id: &str,
        operation_id: &str,
        transaction_id: &str,
        delta: Money,
        reason: &str,
        allow_negative: bool,
        bearer: &str,
    ) -> Result<RemoteBalanceOp, ClientError> {
        let url = format!("{}/accounts/{}/balance-ops", self.base_url, account_id);
        let body = BalanceOpRequestBody {
            operation_id: operation_id.to_string(),
            transaction_id: transaction_id.to_string(),
            delta,
            reason: reason.to_string(),
            allow_negative,
        };

        let response = self
            .http
            .post(&url)
            .header("Authorization", bearer)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        parse_response(response).await
    }
}

fn classify_transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Network(err.to_string())
    }
}

async fn parse_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    } else if status.is_server_error() {
        Err(ClientError::Remote5xx {
            status: status.as_u16(),
        })
    } else {
        Err(ClientError::Remote4xx {
            status: status.as_u16(),
        })
    }
}
