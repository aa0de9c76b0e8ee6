use actix_web::{get, post, web, HttpResponse};

use ledgerflow_common::error::ApiError;
use ledgerflow_common::pagination::PageSpec;

use crate::AppState;

use super::auth::{AuthenticatedPrincipal, BearerToken};
use super::dto::{
    DepositRequest, ReverseRequest, SearchQuery, TransactionResponse, TransferRequest, WithdrawRequest,
};

#[post("/transfer")]
pub async fn transfer(
    state: web::Data<AppState>,
    principal: AuthenticatedPrincipal,
    bearer: BearerToken,
    body: web::Json<TransferRequest>,
) -> Result<HttpResponse, ApiError> {
    let tx = state
        .orchestrator
        .submit(&principal.0.subject, &bearer.0, body.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(TransactionResponse::from(tx)))
}

#[post("/deposit")]
pub async fn deposit(
    state: web::Data<AppState>,
    principal: AuthenticatedPrincipal,
    bearer: BearerToken,
    body: web::Json<DepositRequest>,
) -> Result<HttpResponse, ApiError> {
    let tx = state
        .orchestrator
        .submit(&principal.0.subject, &bearer.0, body.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(TransactionResponse::from(tx)))
}

#[post("/withdraw")]
pub async fn withdraw(
    state: web::Data<AppState>,
    principal: AuthenticatedPrincipal,
    bearer: BearerToken,
    body: web::Json<WithdrawRequest>,
) -> Result<HttpResponse, ApiError> {
    let tx = state
        .orchestrator
        .submit(&principal.0.subject, &bearer.0, body.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(TransactionResponse::from(tx)))
}

#[post("/{id}/reverse")]
pub async fn reverse(
    state: web::Data<AppState>,
    principal: AuthenticatedPrincipal,
    bearer: BearerToken,
    path: web::Path<String>,
    body: web::Json<ReverseRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let tx = state
        .reversal
        .reverse(
            &path.into_inner(),
            &request.reason,
            &principal.0.subject,
            &bearer.0,
            request.idempotency_key,
        )
        .await?;
    Ok(HttpResponse::Ok().json(TransactionResponse::from(tx)))
}

#[get("/{id}")]
pub async fn get_by_id(
    state: web::Data<AppState>,
    _principal: AuthenticatedPrincipal,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tx = state
        .transactions
        .find_by_id(&path.into_inner())
        .await
        .ok_or_else(|| ApiError::from_code(ledgerflow_common::error::ErrorCode::TransactionNotFound))?;
    Ok(HttpResponse::Ok().json(TransactionResponse::from(tx)))
}

#[get("/account/{id}")]
pub async fn by_account(
    state: web::Data<AppState>,
    _principal: AuthenticatedPrincipal,
    path: web::Path<String>,
    page: web::Query<PageSpec>,
) -> Result<HttpResponse, ApiError> {
    let filter = crate::storage::SearchFilter {
        account_id: Some(path.into_inner()),
        ..Default::default()
    };
    let result = state.transactions.page(filter, page.into_inner()).await;
    let response = ledgerflow_common::pagination::Page {
        items: result.items.into_iter().map(TransactionResponse::from).collect(),
        page: result.page,
        size: result.size,
        total: result.total,
    };
    Ok(HttpResponse::Ok().json(response))
}

#[get("/search")]
pub async fn search(
    state: web::Data<AppState>,
    _principal: AuthenticatedPrincipal,
    query: web::Query<SearchQuery>,
    page: web::Query<PageSpec>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.into_inner().into();
    let result = state.transactions.page(filter, page.into_inner()).await;
    let response = ledgerflow_common::pagination::Page {
        items: result.items.into_iter().map(TransactionResponse::from).collect(),
        page: result.page,
        size: result.size,
        total: result.total,
    };
    Ok(HttpResponse::Ok().json(response))
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "UP" }))
}
