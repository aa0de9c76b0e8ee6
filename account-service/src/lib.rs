pub mod api;
pub mod domain;
pub mod service;
pub mod storage;

use std::sync::Arc;

use service::AccountService;
use storage::AccountStore;

/// Shared application state handed to every actix-web worker.
pub struct AppState {
    pub service: AccountService,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, jwt_secret: String) -> Self {
        AppState {
            service: AccountService::new(store),
            jwt_secret,
        }
    }
}
