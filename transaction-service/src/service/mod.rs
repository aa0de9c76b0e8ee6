pub mod limit_enforcer;
pub mod orchestrator;
pub mod reversal;
pub mod sweeper;

pub use limit_enforcer::LimitEnforcer;
pub use orchestrator::{NewTransactionRequest, Orchestrator};
pub use reversal::ReversalCoordinator;
pub use sweeper::Sweeper;
