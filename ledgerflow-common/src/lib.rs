//! Shared ambient stack for the Ledger Flow account and transaction services:
//! the token validator (C1), the resilience wrapper (C5), the money type,
//! error taxonomy, configuration, logging and pagination helpers every
//! handler in both services is built on top of.

pub mod auth;
pub mod config;
pub mod error;
pub mod ids;
pub mod logging;
pub mod money;
pub mod pagination;
pub mod resilience;
pub mod time;
