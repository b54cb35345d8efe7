//! Offloading blocking engine calls from async callers.

use crate::error::{CoreError, CoreResult};
use tokio::task::{self, JoinError};

/// Runs `f` on Tokio's blocking pool and waits for its result.
///
/// The await is the caller's only suspension point. There is no
/// cancellation: once submitted, `f` runs to completion even if the
/// returned future is dropped.
///
/// Must be called from within a Tokio runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> CoreResult<T>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f).await.map_err(map_join_error)?
}

fn map_join_error(err: JoinError) -> CoreError {
    CoreError::TaskFailed(err.to_string())
}
