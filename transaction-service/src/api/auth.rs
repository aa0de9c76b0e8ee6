//! Bearer-token extraction, mirroring the Account Service's extractor
//! (`account-service/src/api/auth.rs`). The orchestrator needs the raw
//! bearer string too, to forward verbatim to C4 (`spec.md` §9), so this
//! module exposes both the validated principal and the raw header.

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use ledgerflow_common::{
    auth::{validate_now, Principal},
    error::{ApiError, ErrorCode},
};

use crate::AppState;

pub struct AuthenticatedPrincipal(pub Principal);

pub struct BearerToken(pub String);

fn extract_header(req: &HttpRequest) -> Result<&str, ApiError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::from_code(ErrorCode::TokenInvalid))
}

impl FromRequest for AuthenticatedPrincipal {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = (|| {
            let state = req
                .app_data::<actix_web::web::Data<AppState>>()
                .ok_or_else(|| ApiError::from_code(ErrorCode::TokenInvalid))?;

            let header = extract_header(req)?;
            let bearer = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ApiError::from_code(ErrorCode::TokenInvalid))?;

            validate_now(state.jwt_secret.as_bytes(), bearer)
                .map(AuthenticatedPrincipal)
                .map_err(|e| match e {
                    ledgerflow_common::auth::TokenError::Expired => {
                        ApiError::from_code(ErrorCode::TokenExpired)
                    }
                    ledgerflow_common::auth::TokenError::Invalid => {
                        ApiError::from_code(ErrorCode::TokenInvalid)
                    }
                })
        })();

        ready(result)
    }
}

impl FromRequest for BearerToken {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_header(req).map(|h| BearerToken(h.to_string())))
    }
}
