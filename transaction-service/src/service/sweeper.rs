//! Crash-Recovery Sweeper (C15). A background task that periodically scans
//! for transactions stuck in a non-terminal `processing-state` and replays
//! the next orchestration step using the same deterministic operation ids
//! (`spec.md` §4.7 "Crash between writes").

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::storage::TransactionStore;

use super::orchestrator::Orchestrator;

pub struct Sweeper {
    transactions: Arc<dyn TransactionStore>,
    orchestrator: Arc<Orchestrator>,
    stuck_after: chrono::Duration,
    system_bearer: String,
}

impl Sweeper {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        orchestrator: Arc<Orchestrator>,
        stuck_after: chrono::Duration,
        system_bearer: String,
    ) -> Self {
        Sweeper {
            transactions,
            orchestrator,
            stuck_after,
            system_bearer,
        }
    }

    /// Runs one sweep: finds stuck rows and resumes their state machine.
    /// Errors from an individual replay are logged and do not stop the sweep.
    pub async fn sweep_once(&self) {
        let threshold = Utc::now() - self.stuck_after;
        let stuck = self.transactions.find_stuck(threshold).await;
        if stuck.is_empty() {
            return;
        }
        log::info!("sweeper: resuming {} stuck transaction(s)", stuck.len());
        for tx in stuck {
            let id = tx.id.clone();
            let bearer = format!("Bearer {}", self.system_bearer);
            match self.orchestrator.run_state_machine(tx, &bearer).await {
                Ok(resumed) => {
                    log::info!("sweeper: transaction {id} resumed to {:?}", resumed.processing_state)
                }
                Err(err) => log::error!("sweeper: failed to resume transaction {id}: {err}"),
            }
        }
    }

    /// Spawns the periodic background loop on the current Tokio runtime.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.sweep_once().await;
            }
        })
    }
}
