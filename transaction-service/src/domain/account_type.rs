//! Mirrors the Account Service's `AccountType` wire representation. The two
//! services are independently deployable, so this is a local copy of the
//! shape rather than a shared dependency — matching `spec.md` §1's framing of
//! the Account Service as an external collaborator reached only over HTTP.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
}
