//! Detached Units of Work
//!
//! Axum drops the handler future when the client disconnects. A
//! transaction awaited directly inside the handler would be cancelled at
//! whatever `.await` it was parked on. Running it through
//! [`run_to_completion`] moves it onto its own task, so it always reaches
//! commit or rollback even if nobody is left to read the result.

use std::future::Future;

use thiserror::Error;

/// The spawned task panicked or the runtime is shutting down
#[derive(Debug, Error)]
#[error("Background task failed: {0}")]
pub struct TaskError(String);

/// Spawn `work` and wait for its output.
pub async fn run_to_completion<F, T>(work: F) -> Result<T, TaskError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| TaskError(e.to_string()))
}
