use actix_web::{get, post, put, web, HttpResponse};
use log::info;

use ledgerflow_common::error::ApiError;

use crate::domain::BalanceOpRequest;
use crate::AppState;

use super::auth::AuthenticatedPrincipal;
use super::dto::{AccountResponse, SetBalanceRequest};

#[get("/accounts/{id}")]
pub async fn get_account(
    state: web::Data<AppState>,
    _principal: AuthenticatedPrincipal,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let account = state.service.get_account(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}

#[put("/accounts/{id}/balance")]
pub async fn set_balance(
    state: web::Data<AppState>,
    principal: AuthenticatedPrincipal,
    path: web::Path<String>,
    body: web::Json<SetBalanceRequest>,
) -> Result<HttpResponse, ApiError> {
    let account_id = path.into_inner();
    if log::log_enabled!(log::Level::Info) {
        info!(
            "administrative absolute balance set on {account_id} by {}",
            principal.0.subject
        );
    }
    let account = state
        .service
        .set_balance_absolute(&principal.0, &account_id, body.into_inner().balance)
        .await?;
    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}

#[post("/accounts/{id}/balance-ops")]
pub async fn apply_balance_op(
    state: web::Data<AppState>,
    _principal: AuthenticatedPrincipal,
    path: web::Path<String>,
    body: web::Json<BalanceOpRequest>,
) -> Result<HttpResponse, ApiError> {
    let op = state
        .service
        .apply_balance_op(&path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(crate::domain::BalanceOpResponse::from(&op)))
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "UP" }))
}
