use std::time::Duration;

use anyhow::{Result, anyhow};
use backon::{ExponentialBuilder, Retryable};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::bitcoin_client::Error;

pub fn new_backoff() -> ExponentialBuilder {
    ExponentialBuilder::new()
        .with_jitter()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(10))
        .with_max_times(5)
}

/// Only transport failures are worth another attempt; an RPC error answer
/// will not change on retry.
pub fn is_transient(error: &Error) -> bool {
    matches!(error, Error::Http(_))
}

pub fn notify(action: &str) -> impl FnMut(&Error, Duration) {
    move |e, d| {
        warn!("Retrying {} due to {:?} after {:?}", action, e, d);
    }
}

/// Retries transient failures of `operation` with backoff. Cancelling
/// `cancel_token` abandons any attempt still in flight.
pub async fn retry<T, F, Fut>(
    operation: F,
    action: &str,
    cancel_token: CancellationToken,
) -> Result<T>
where
    Fut: Future<Output = Result<T, Error>>,
    F: FnMut() -> Fut,
{
    let token = cancel_token.clone();
    let attempts = operation
        .retry(new_backoff())
        .notify(notify(action))
        .when(move |e| is_transient(e) && !token.is_cancelled());
    select! {
        biased;
        _ = cancel_token.cancelled() => Err(anyhow!("Cancelled {}", action)),
        result = attempts => Ok(result?),
    }
}
