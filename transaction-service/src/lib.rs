pub mod api;
pub mod client;
pub mod domain;
pub mod service;
pub mod storage;

use std::sync::Arc;

use service::{Orchestrator, ReversalCoordinator};
use storage::TransactionStore;

/// Shared application state handed to every actix-web worker.
pub struct AppState {
    pub transactions: Arc<dyn TransactionStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub reversal: ReversalCoordinator,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        orchestrator: Arc<Orchestrator>,
        reversal: ReversalCoordinator,
        jwt_secret: String,
    ) -> Self {
        AppState {
            transactions,
            orchestrator,
            reversal,
            jwt_secret,
        }
    }
}
