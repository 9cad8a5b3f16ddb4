pub mod base40;
pub mod bitcoin_client;
pub mod config;
pub mod error;
pub mod hashing;
pub mod logging;
pub mod operations;
pub mod retry;
pub mod stopper;
pub mod test_utils;

pub use error::{Error, Result};
