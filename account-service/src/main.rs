use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::{info, LevelFilter};

use account_service::{api, storage::MemoryAccountStore, AppState};
use ledgerflow_common::config::{apply_env_overrides, JwtConfig, ResilienceConfig};

#[derive(Parser, Debug)]
#[command(name = "account-service")]
#[command(about = "Ledger Flow Account Service")]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8081")]
    bind_address: String,

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
    let mut resilience = ResilienceConfig::default();
    apply_env_overrides(&mut jwt, &mut resilience);

    let store: Arc<dyn account_service::storage::AccountStore> =
        Arc::new(MemoryAccountStore::new());
    let state = web::Data::new(AppState::new(store, jwt.secret.clone()));

    info!("account-service listening on {}", cli.bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind(&cli.bind_address)?
    .run()
    .await?;
    Ok(())
}
