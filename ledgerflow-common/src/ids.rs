//! Opaque identifier generation.

use uuid::Uuid;

/// Generates a new globally-unique opaque identifier for a transaction, account
/// operation, or similar entity the service itself originates.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
