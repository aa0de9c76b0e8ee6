use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use ledgerflow_common::auth::token;
use ledgerflow_common::money::Money;
use ledgerflow_common::resilience::{CircuitBreakerConfig, ResilienceWrapper, RetryPolicy};

use account_service::domain::{Account, AccountType as RemoteAccountType};
use account_service::storage::{AccountStore, MemoryAccountStore};

use transaction_service::client::AccountBalanceClient;
use transaction_service::domain::{AccountType, TransactionLimit, TransactionType};
use transaction_service::service::{LimitEnforcer, Orchestrator, ReversalCoordinator};
use transaction_service::storage::{LimitStore, MemoryLimitStore, TransactionStore};
use transaction_service::AppState;

const SECRET: &str = "integration-test-secret";

fn bearer() -> String {
    format!("Bearer {}", token::issue(SECRET.as_bytes(), "user-1", &[], 60))
}

/// Boots a real Account Service on an ephemeral localhost port and returns
/// its base URL plus a handle to seed accounts directly. The Account-Balance
/// Client speaks real HTTP, so tests exercising the orchestrator's upstream
/// calls need a live listener rather than `actix_web::test::init_service`.
async fn spawn_account_service(accounts: Vec<Account>) -> String {
    let store = Arc::new(MemoryAccountStore::new());
    for account in accounts {
        store.seed(account).await;
    }
    let state = web::Data::new(account_service::AppState::new(store, SECRET.to_string()));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(account_service::api::configure)
    })
    .bind("127.0.0.1:0")
    .expect("bind account-service test listener");
    let addr = server.addrs()[0];
    let running = server.run();
    tokio::spawn(running);
    format!("http://{addr}")
}

/// Boots a second stand-in Account Service whose `/accounts/{id}/balance-ops`
/// handler can be told to fail a specific leg by `reason` ("credit" or
/// "compensate"), for exercising the orchestrator's failure/compensation
/// paths deterministically rather than via a real business rejection (the
/// credit and compensate legs both run `allow_negative=true`, so the real
/// Account Service's ledger never rejects them).
#[derive(Clone, Copy)]
struct FlakyFlags {
    fail_credit: bool,
    fail_compensate: bool,
}

async fn flaky_get_account(path: web::Path<String>) -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok().json(serde_json::json!({
        "id": path.into_inner(),
        "ownerId": "user-1",
        "accountType": "CHECKING",
        "balance": "1000.00",
        "availableCredit": serde_json::Value::Null,
        "active": true,
        "currency": "USD",
    }))
}

async fn flaky_balance_op(
    flags: web::Data<FlakyFlags>,
    body: web::Json<serde_json::Value>,
) -> actix_web::HttpResponse {
    let reason = body.get("reason").and_then(|v| v.as_str()).unwrap_or("");
    let fail = match reason {
        "credit" => flags.fail_credit,
        "compensate" => flags.fail_compensate,
        _ => false,
    };
    if fail {
        return actix_web::HttpResponse::InternalServerError().finish();
    }
    actix_web::HttpResponse::Ok().json(serde_json::json!({
        "applied": true,
        "status": "APPLIED",
        "resultingBalance": "1000.00",
    }))
}

async fn spawn_flaky_account_service(fail_credit: bool, fail_compensate: bool) -> String {
    let flags = web::Data::new(FlakyFlags {
        fail_credit,
        fail_compensate,
    });
    let server = HttpServer::new(move || {
        App::new()
            .app_data(flags.clone())
            .route("/accounts/{id}", web::get().to(flaky_get_account))
            .route("/accounts/{id}/balance-ops", web::post().to(flaky_balance_op))
    })
    .bind("127.0.0.1:0")
    .expect("bind flaky account-service listener");
    let addr = server.addrs()[0];
    tokio::spawn(server.run());
    format!("http://{addr}")
}

fn checking(id: &str, balance: &str) -> Account {
    Account {
        id: id.to_string(),
        owner_id: "user-1".to_string(),
        account_type: RemoteAccountType::Checking,
        balance: Money::parse(balance).unwrap(),
        credit_limit: None,
        active: true,
        currency: "USD".to_string(),
    }
}

struct Harness {
    state: web::Data<AppState>,
}

impl Harness {
    async fn new(account_service_base_url: String) -> Self {
        Self::build(account_service_base_url, None).await
    }

    /// Same as `new`, but seeds the Limit Store with `limit` before any
    /// request is served, for tests that need a configured cap in place.
    async fn new_with_limit(account_service_base_url: String, limit: TransactionLimit) -> Self {
        Self::build(account_service_base_url, Some(limit)).await
    }

    async fn build(account_service_base_url: String, limit: Option<TransactionLimit>) -> Self {
        let transactions: Arc<dyn TransactionStore> =
            Arc::new(transaction_service::storage::MemoryTransactionStore::new());
        let limits: Arc<dyn transaction_service::storage::LimitStore> =
            Arc::new(MemoryLimitStore::default());
        if let Some(limit) = limit {
            limits.upsert(limit).await.expect("seed limit");
        }
        let account_client = Arc::new(AccountBalanceClient::new(
            account_service_base_url,
            Duration::from_secs(2),
        ));
        let resilience = Arc::new(ResilienceWrapper::new(
            Duration::from_secs(2),
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
            },
            CircuitBreakerConfig {
                window: 10,
                failure_rate_threshold: 0.5,
                open_dwell: Duration::from_secs(30),
                half_open_probe: 3,
            },
        ));
        let enforcer = LimitEnforcer::new(limits, transactions.clone());
        let orchestrator = Arc::new(Orchestrator::new(
            transactions.clone(),
            enforcer,
            account_client,
            resilience,
        ));
        let reversal = ReversalCoordinator::new(transactions.clone(), orchestrator.clone());
        let state = web::Data::new(AppState::new(
            transactions,
            orchestrator,
            reversal,
            SECRET.to_string(),
        ));
        Harness { state }
    }
}

#[actix_web::test]
async fn transfer_moves_funds_between_accounts() {
    let base_url = spawn_account_service(vec![checking("acc-a", "1000.00"), checking("acc-b", "100.00")]).await;
    let harness = Harness::new(base_url).await;
    let srv = actix_web::test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .configure(transaction_service::api::configure),
    )
    .await;

    let body = serde_json::json!({
        "fromAccountId": "acc-a",
        "toAccountId": "acc-b",
        "amount": "250.00",
    });
    let req = actix_web::test::TestRequest::post()
        .uri("/transfer")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, req).await;

    assert_eq!(resp["status"], "COMPLETED");
    assert_eq!(resp["processingState"], "COMPLETED");
    assert_eq!(resp["fromAccount"], "acc-a");
    assert_eq!(resp["toAccount"], "acc-b");
}

#[actix_web::test]
async fn duplicate_idempotency_key_replays_the_same_transaction() {
    let base_url = spawn_account_service(vec![checking("acc-a", "1000.00"), checking("acc-b", "100.00")]).await;
    let harness = Harness::new(base_url).await;
    let srv = actix_web::test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .configure(transaction_service::api::configure),
    )
    .await;

    let body = serde_json::json!({
        "fromAccountId": "acc-a",
        "toAccountId": "acc-b",
        "amount": "50.00",
        "idempotencyKey": "client-key-1",
    });

    let req1 = actix_web::test::TestRequest::post()
        .uri("/transfer")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp1: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, req1).await;

    let req2 = actix_web::test::TestRequest::post()
        .uri("/transfer")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp2: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, req2).await;

    assert_eq!(resp1["id"], resp2["id"]);
}

#[actix_web::test]
async fn withdrawal_beyond_balance_fails_without_touching_credit_leg() {
    let base_url = spawn_account_service(vec![checking("acc-a", "10.00")]).await;
    let harness = Harness::new(base_url).await;
    let srv = actix_web::test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .configure(transaction_service::api::configure),
    )
    .await;

    let body = serde_json::json!({
        "accountId": "acc-a",
        "amount": "500.00",
    });
    let req = actix_web::test::TestRequest::post()
        .uri("/withdraw")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, req).await;

    assert_eq!(resp["status"], "FAILED");
    assert_eq!(resp["failureReason"], "INSUFFICIENT_FUNDS");
}

#[actix_web::test]
async fn reversal_round_trips_a_completed_transfer() {
    let base_url = spawn_account_service(vec![checking("acc-a", "1000.00"), checking("acc-b", "100.00")]).await;
    let harness = Harness::new(base_url).await;
    let srv = actix_web::test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .configure(transaction_service::api::configure),
    )
    .await;

    let body = serde_json::json!({
        "fromAccountId": "acc-a",
        "toAccountId": "acc-b",
        "amount": "300.00",
    });
    let req = actix_web::test::TestRequest::post()
        .uri("/transfer")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let completed: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, req).await;
    let id = completed["id"].as_str().unwrap().to_string();

    let reverse_body = serde_json::json!({ "reason": "customer dispute" });
    let reverse_req = actix_web::test::TestRequest::post()
        .uri(&format!("/{id}/reverse"))
        .insert_header(("Authorization", bearer()))
        .set_json(&reverse_body)
        .to_request();
    let reversal: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, reverse_req).await;

    assert_eq!(reversal["transactionType"], "REVERSAL");
    assert_eq!(reversal["status"], "COMPLETED");
    assert_eq!(reversal["fromAccount"], "acc-b");
    assert_eq!(reversal["toAccount"], "acc-a");

    let second_req = actix_web::test::TestRequest::post()
        .uri(&format!("/{id}/reverse"))
        .insert_header(("Authorization", bearer()))
        .set_json(&reverse_body)
        .to_request();
    let resp = actix_web::test::call_service(&srv, second_req).await;
    assert_eq!(resp.status(), 422);
}

#[actix_web::test]
async fn currency_mismatch_is_rejected_before_any_leg_runs() {
    let mut eur_account = checking("acc-eur", "500.00");
    eur_account.currency = "EUR".to_string();
    let base_url = spawn_account_service(vec![checking("acc-a", "1000.00"), eur_account]).await;
    let harness = Harness::new(base_url).await;
    let srv = actix_web::test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .configure(transaction_service::api::configure),
    )
    .await;

    let body = serde_json::json!({
        "fromAccountId": "acc-a",
        "toAccountId": "acc-eur",
        "amount": "10.00",
    });
    let req = actix_web::test::TestRequest::post()
        .uri("/transfer")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp = actix_web::test::call_service(&srv, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn credit_leg_failure_triggers_compensation() {
    let base_url = spawn_flaky_account_service(true, false).await;
    let harness = Harness::new(base_url).await;
    let srv = actix_web::test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .configure(transaction_service::api::configure),
    )
    .await;

    let body = serde_json::json!({
        "fromAccountId": "acc-a",
        "toAccountId": "acc-b",
        "amount": "100.00",
    });
    let req = actix_web::test::TestRequest::post()
        .uri("/transfer")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, req).await;

    assert_eq!(resp["status"], "FAILED");
    assert_eq!(resp["processingState"], "COMPENSATED");
    assert_eq!(resp["failureReason"], "CREDIT_FAILED");
}

#[actix_web::test]
async fn compensation_failure_escalates_to_manual_action() {
    let base_url = spawn_flaky_account_service(true, true).await;
    let harness = Harness::new(base_url).await;
    let srv = actix_web::test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .configure(transaction_service::api::configure),
    )
    .await;

    let body = serde_json::json!({
        "fromAccountId": "acc-a",
        "toAccountId": "acc-b",
        "amount": "100.00",
    });
    let req = actix_web::test::TestRequest::post()
        .uri("/transfer")
        .insert_header(("Authorization", bearer()))
        .set_json(&body)
        .to_request();
    let resp: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, req).await;

    assert_eq!(resp["status"], "FAILED_REQUIRES_MANUAL_ACTION");
    assert_eq!(resp["processingState"], "MANUAL_ACTION_REQUIRED");
    assert_eq!(resp["failureReason"], "MANUAL_ACTION_REQUIRED");
}

#[actix_web::test]
async fn sequential_withdrawals_are_rejected_once_the_daily_cap_is_reached() {
    let base_url = spawn_account_service(vec![checking("acc-a", "1000.00")]).await;
    let limit = TransactionLimit {
        account_type: AccountType::Checking,
        transaction_type: TransactionType::Withdrawal,
        daily_limit: None,
        monthly_limit: None,
        per_tx_limit: None,
        daily_count: Some(2),
        monthly_count: None,
        active: true,
    };
    let harness = Harness::new_with_limit(base_url, limit).await;
    let srv = actix_web::test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .configure(transaction_service::api::configure),
    )
    .await;

    let withdraw = || {
        actix_web::test::TestRequest::post()
            .uri("/withdraw")
            .insert_header(("Authorization", bearer()))
            .set_json(&serde_json::json!({ "accountId": "acc-a", "amount": "10.00" }))
            .to_request()
    };

    let first: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, withdraw()).await;
    assert_eq!(first["status"], "COMPLETED");

    let second: serde_json::Value = actix_web::test::call_and_read_body_json(&srv, withdraw()).await;
    assert_eq!(second["status"], "COMPLETED");

    let third = actix_web::test::call_service(&srv, withdraw()).await;
    assert_eq!(third.status(), 422);
}
