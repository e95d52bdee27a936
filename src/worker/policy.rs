use async_trait::async_trait;
use thiserror::Error;

use crate::storage::StorageError;

/// Persistence failure after a successful download
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Rejected(String),
}

/// Per-input hooks driving a batch.
///
/// `url_for` must be pure: it is called once per input and its result is
/// fixed for that input's whole attempt chain. `on_failed` fires once when an
/// input exhausts every attempt; `on_save` fires once when a non-empty
/// payload arrives and returns the number of bytes it persisted. A save error is logged by the runner and never reaches
/// `on_failed`.
#[async_trait]
pub trait TaskPolicy<T, P>: Send + Sync
where
    T: Sync + 'static,
    P: Send + 'static,
{
    fn url_for(&self, input: &T) -> String;

    fn on_failed(&self, input: &T, url: &str);

    async fn on_save(&self, input: &T, payload: P) -> Result<usize, SaveError>;

    fn log_prefix(&self, _input: &T) -> String {
        String::new()
    }
}
