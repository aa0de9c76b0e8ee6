use std::sync::Arc;

use actix_web::{test, web, App};
use ledgerflow_common::{auth::token, money::Money};

use account_service::{
    api,
    domain::{Account, AccountType},
    storage::{AccountStore, MemoryAccountStore},
    AppState,
};

const SECRET: &str = "integration-test-secret";

async fn app_with_account(account: Account) -> web::Data<AppState> {
    let store = Arc::new(MemoryAccountStore::new());
    store.seed(account).await;
    web::Data::new(AppState::new(store, SECRET.to_string()))
}

fn bearer() -> String {
    format!("Bearer {}", token::issue(SECRET.as_bytes(), "user-1", &[], 60))
}

#[actix_web::test]
async fn apply_balance_op_is_idempotent_by_operation_id() {
    let state = app_with_account(Account {
        id: "acc-1".to_string(),
        owner_id: "user-1".to_string(),
        account_type: AccountType::Checking,
        balance: Money::parse("1000.00").unwrap(),
        credit_limit: None,
        active: true,
        currency: "USD".to_string(),
    })
    .await;

    let srv = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let body = serde_json::json!({
        "operationId": "tx-1:debit",
        "transactionId": "tx-1",
        "delta": "-250.00",
        "reason": "debit",
        "allowNegative": false
    });

    let req = test::TestRequest::post()
        .uri("/accounts/acc-1/balance-ops")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&srv, req).await;
    assert_eq!(resp["status"], "APPLIED");
    assert_eq!(resp["resultingBalance"], "750.00");

    let req2 = test::TestRequest::post()
        .uri("/accounts/acc-1/balance-ops")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp2: serde_json::Value = test::call_and_read_body_json(&srv, req2).await;
    assert_eq!(resp2["status"], "REPLAYED");
    assert_eq!(resp2["applied"], false);
    assert_eq!(resp2["resultingBalance"], "750.00");
}

#[actix_web::test]
async fn get_account_requires_bearer_token() {
    let state = app_with_account(Account {
        id: "acc-2".to_string(),
        owner_id: "user-1".to_string(),
        account_type: AccountType::Checking,
        balance: Money::parse("10.00").unwrap(),
        credit_limit: None,
        active: true,
        currency: "USD".to_string(),
    })
    .await;

    let srv = test::init_service(App::new().app_data(state).configure(api::configure)).await;
    let req = test::TestRequest::get().uri("/accounts/acc-2").to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn set_balance_requires_admin_role() {
    let state = app_with_account(Account {
        id: "acc-3".to_string(),
        owner_id: "user-1".to_string(),
        account_type: AccountType::Checking,
        balance: Money::parse("10.00").unwrap(),
        credit_limit: None,
        active: true,
        currency: "USD".to_string(),
    })
    .await;

    let srv = test::init_service(App::new().app_data(state).configure(api::configure)).await;
    let body = serde_json::json!({ "balance": "500.00" });
    let req = test::TestRequest::put()
        .uri("/accounts/acc-3/balance")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), 403);
}
