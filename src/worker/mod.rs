//! Download orchestration
//!
//! [`runner::download`] drives one URL through bounded retries and hands the
//! outcome to a save or failure callback. [`batch::run_batch`] fans a list of
//! inputs out to item runs under a counting semaphore, with a [`TaskPolicy`]
//! supplying URLs, log prefixes and the two outcome hooks.

pub mod batch;
pub mod policy;
pub mod runner;

pub use batch::{BatchSummary, run_batch};
pub use policy::{SaveError, TaskPolicy};
pub use runner::{DownloadOutcome, download};

use crate::fetch::METHOD_FETCH;

pub const DEFAULT_RETRY_ATTEMPT: u32 = 3;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;

/// Per-batch task options
#[derive(Debug, Clone, bon::Builder)]
pub struct TaskOptions {
    /// Extra attempts after the first one
    #[builder(default = DEFAULT_RETRY_ATTEMPT)]
    pub retry_attempt: u32,
    /// Fetch strategy tag, resolved through the fetcher registry
    #[builder(into, default = METHOD_FETCH.to_string())]
    pub method: String,
    #[builder(default = DEFAULT_CONCURRENCY_LIMIT)]
    pub concurrency_limit: usize,
    /// When false every item starts immediately
    #[builder(default = true)]
    pub limiter: bool,
    /// Per-attempt progress logging
    #[builder(default = true)]
    pub log: bool,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}
