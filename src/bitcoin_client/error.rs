use serde::Deserialize;
use thiserror::Error as ThisError;

#[derive(Deserialize, Debug)]
pub struct BitcoinRpcErrorResponse {
    pub code: i32,
    pub message: String,
}

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Bitcoin RPC error (code {code}): {message}")]
    BitcoinRpc { code: i32, message: String },
    #[error("No fee estimate available: {0}")]
    NoFeeEstimate(String),
    #[error("Invalid amount: {0}")]
    Amount(#[from] bitcoin::amount::ParseAmountError),
    #[error("Invalid header value error: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
}
