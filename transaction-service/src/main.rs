use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::{info, LevelFilter};

use ledgerflow_common::auth::token;
use ledgerflow_common::config::{
    apply_env_overrides, apply_limits_env_overrides, JwtConfig, LimitsConfig, ResilienceConfig,
};
use ledgerflow_common::resilience::{CircuitBreakerConfig, ResilienceWrapper, RetryPolicy};

use transaction_service::client::AccountBalanceClient;
use transaction_service::service::{LimitEnforcer, Orchestrator, ReversalCoordinator, Sweeper};
use transaction_service::storage::{MemoryLimitStore, MemoryTransactionStore};
use transaction_service::{api, AppState};

#[derive(Parser, Debug)]
#[command(name = "transaction-service")]
#[command(about = "Ledger Flow Transaction Service")]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8082")]
    bind_address: String,

    /// Base URL of the Account Service this instance talks to.
    #[arg(long, default_value = "http://127.0.0.1:8081")]
    account_service_base_url: String,

    /// How often the crash-recovery sweeper scans for stuck transactions.
    #[arg(long, default_value_t = 30)]
    sweeper_interval_secs: u64,

    /// Age (in seconds) a non-terminal transaction must reach before the
    /// sweeper considers it stuck.
    #[arg(long, default_value_t = 60)]
    sweeper_stuck_after_secs: i64,

    /// How long the Limit Store's cache trusts a previously-read limit
    /// before re-checking the backing store. Overrides
    /// `LEDGERFLOW_LIMITS_CACHE_TTL_SECS` and the `limits.cache-ttl` default
    /// when set.
    #[arg(long)]
    limits_cache_ttl_secs: Option<u64>,

    /// Log level.
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Directory for rotated log files; omit to log to stdout only.
    #[arg(long)]
    log_dir: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    ledgerflow_common::logging::init(cli.log_level, cli.log_dir.as_deref())?;

    let mut jwt = JwtConfig::default();
    let mut resilience_config = ResilienceConfig::default();
    apply_env_overrides(&mut jwt, &mut resilience_config);

    let mut limits_config = LimitsConfig::default();
    apply_limits_env_overrides(&mut limits_config);
    if let Some(ttl) = cli.limits_cache_ttl_secs {
        limits_config.cache_ttl_secs = ttl;
    }

    let transactions: Arc<dyn transaction_service::storage::TransactionStore> =
        Arc::new(MemoryTransactionStore::new());
    let limits: Arc<dyn transaction_service::storage::LimitStore> =
        Arc::new(MemoryLimitStore::new(limits_config.cache_ttl()));

    let account_client = Arc::new(AccountBalanceClient::new(
        cli.account_service_base_url.clone(),
        resilience_config.call_deadline(),
    ));
    let resilience = Arc::new(ResilienceWrapper::new(
        resilience_config.call_deadline(),
        RetryPolicy {
            max_attempts: resilience_config.retry_max_attempts,
            base_delay: resilience_config.retry_base_wait(),
        },
        CircuitBreakerConfig {
            window: resilience_config.breaker_window,
            failure_rate_threshold: resilience_config.breaker_failure_rate_threshold,
            open_dwell: resilience_config.breaker_open_dwell(),
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

    // The sweeper runs outside any inbound request, so it mints its own
    // short-lived system-subject token to forward to the Account Service.
    let system_token = token::issue(jwt.secret.as_bytes(), "system-sweeper", &["SYSTEM".to_string()], 300);
    let sweeper = Arc::new(Sweeper::new(
        transactions.clone(),
        orchestrator.clone(),
        chrono::Duration::seconds(cli.sweeper_stuck_after_secs),
        system_token,
    ));
    sweeper.spawn(Duration::from_secs(cli.sweeper_interval_secs));

    let state = web::Data::new(AppState::new(transactions, orchestrator, reversal, jwt.secret.clone()));

    info!("transaction-service listening on {}", cli.bind_address);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind(&cli.bind_address)?
        .run()
        .await?;
    Ok(())
}
