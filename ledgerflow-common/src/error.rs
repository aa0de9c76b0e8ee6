//! Stable machine error codes shared by both services, mapped to HTTP status
//! codes the way the teacher's `InternalRpcError` maps to JSON-RPC codes.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// The stable machine code from `spec.md` §7. Human messages are free to change;
/// this enum's variant names are the wire contract.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    #[error("TOKEN_EXPIRED")]
    TokenExpired,
    #[error("TOKEN_INVALID")]
    TokenInvalid,
    #[error("ROLE_REQUIRED")]
    RoleRequired,
    #[error("AMOUNT_NON_POSITIVE")]
    AmountNonPositive,
    #[error("MISSING_ACCOUNT")]
    MissingAccount,
    #[error("CURRENCY_MISMATCH")]
    CurrencyMismatch,
    #[error("ACCOUNT_NOT_FOUND")]
    AccountNotFound,
    #[error("ACCOUNT_INACTIVE")]
    AccountInactive,
    #[error("TRANSACTION_NOT_FOUND")]
    TransactionNotFound,
    #[error("INSUFFICIENT_FUNDS")]
    InsufficientFunds,
    #[error("LIMIT_EXCEEDED")]
    LimitExceeded,
    #[error("NOT_REVERSIBLE")]
    NotReversible,
    #[error("ALREADY_REVERSED")]
    AlreadyReversed,
    #[error("DUPLICATE_IDEMPOTENCY")]
    DuplicateIdempotency,
    #[error("UPSTREAM_UNAVAILABLE")]
    UpstreamUnavailable,
    #[error("CIRCUIT_OPEN")]
    CircuitOpen,
    #[error("UPSTREAM_REJECTED")]
    UpstreamRejected,
    #[error("MANUAL_ACTION_REQUIRED")]
    ManualActionRequired,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        use ErrorCode::*;
        match self {
            TokenExpired | TokenInvalid => StatusCode::UNAUTHORIZED,
            RoleRequired => StatusCode::FORBIDDEN,
            AmountNonPositive | MissingAccount | CurrencyMismatch => StatusCode::BAD_REQUEST,
            AccountNotFound | TransactionNotFound => StatusCode::NOT_FOUND,
            DuplicateIdempotency | AlreadyReversed => StatusCode::CONFLICT,
            AccountInactive | InsufficientFunds | LimitExceeded | NotReversible => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            UpstreamUnavailable | CircuitOpen | UpstreamRejected | ManualActionRequired => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

/// A caller-facing error. Carries the stable [`ErrorCode`] plus a human message
/// that is not part of the wire contract and may change freely.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        let message = code.to_string();
        Self { code, message }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.code.status()
    }

    fn error_response(&self) -> HttpResponse {
        let code_str: &'static str = match self.code {
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::TokenInvalid => "TOKEN_INVALID",
            ErrorCode::RoleRequired => "ROLE_REQUIRED",
            ErrorCode::AmountNonPositive => "AMOUNT_NON_POSITIVE",
            ErrorCode::MissingAccount => "MISSING_ACCOUNT",
            ErrorCode::CurrencyMismatch => "CURRENCY_MISMATCH",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::AccountInactive => "ACCOUNT_INACTIVE",
            ErrorCode::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::LimitExceeded => "LIMIT_EXCEEDED",
            ErrorCode::NotReversible => "NOT_REVERSIBLE",
            ErrorCode::AlreadyReversed => "ALREADY_REVERSED",
            ErrorCode::DuplicateIdempotency => "DUPLICATE_IDEMPOTENCY",
            ErrorCode::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorCode::CircuitOpen => "CIRCUIT_OPEN",
            ErrorCode::UpstreamRejected => "UPSTREAM_REJECTED",
            ErrorCode::ManualActionRequired => "MANUAL_ACTION_REQUIRED",
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            code: code_str,
            message: &self.message,
        })
    }
}
