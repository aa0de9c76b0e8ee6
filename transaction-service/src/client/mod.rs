pub mod account_client;

pub use account_client::{AccountBalanceClient, ClientError, RemoteAccount, RemoteBalanceOp};
