//! Bearer-token extraction. The validated token's raw bytes are never
//! re-minted or stashed in thread-local state (`spec.md` §9 "Bearer-token
//! propagation") — each handler pulls it fresh from the `Authorization`
//! header on every request.

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use ledgerflow_common::{
    auth::{validate_now, Principal},
    error::{ApiError, ErrorCode},
};

use crate::AppState;

pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequest for AuthenticatedPrincipal {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = (|| {
            let state = req
                .app_data::<actix_web::web::Data<AppState>>()
                .ok_or_else(|| ApiError::from_code(ErrorCode::TokenInvalid))?;

            let header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| ApiError::from_code(ErrorCode::TokenInvalid))?;

            let bearer = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ApiError::from_code(ErrorCode::TokenInvalid))?;

            validate_now(state.jwt_secret.as_bytes(), bearer).map(AuthenticatedPrincipal).map_err(|e| match e {
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
