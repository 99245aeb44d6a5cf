pub mod auth;
pub mod domain;
pub mod engine;
pub mod entries;
pub mod error;
pub mod hosting;
pub mod profile;
pub mod routes;
pub mod token;

use crate::error::ApiError;

/// Run blocking store or hashing work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
