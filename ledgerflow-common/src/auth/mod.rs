pub mod token;

pub use token::{validate, validate_now, Principal, TokenError};
