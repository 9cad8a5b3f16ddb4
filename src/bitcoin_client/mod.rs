pub mod client;
pub mod error;
pub mod types;

pub use client::{Client, UtxoSource, fee_rate_from_btc_per_kvb, fee_rate_from_estimate};
pub use error::Error;
