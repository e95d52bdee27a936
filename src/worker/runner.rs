//! Single-item download runner

use std::future::Future;

use tracing::{debug, error, info, warn};

use super::TaskOptions;
use super::policy::SaveError;
use crate::fetch::Fetcher;
use crate::observability::Metrics;

/// How one item's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Payload downloaded and persisted
    Saved,
    /// Payload downloaded, persistence failed
    SaveFailed,
    /// Fetch succeeded without a payload; nothing to save
    Empty,
    /// Every attempt failed; `on_failed` was called
    Failed,
}

/// Fetch `url` up to `retry_attempt + 1` times, then save or report.
///
/// Retries are immediate. `on_failed` runs at most once, only after the last
/// attempt fails. `on_save` runs at most once, only with a non-empty payload.
pub async fn download<P, Fe, F, S, Fut>(
    fetcher: &Fe,
    url: &str,
    options: &TaskOptions,
    metrics: &Metrics,
    on_failed: F,
    on_save: S,
) -> DownloadOutcome
where
    Fe: Fetcher<P> + ?Sized,
    F: FnOnce(),
    S: FnOnce(P) -> Fut,
    Fut: Future<Output = Result<usize, SaveError>>,
{
    let mut attempt: u32 = 0;

    let payload = loop {
        if options.log {
            info!(url, attempt = attempt + 1, "Attempting download");
        }

        metrics.fetch_started();
        let result = fetcher.fetch(url).await;
        metrics.fetch_finished();

        match result {
            Ok(payload) => {
                if options.log {
                    info!(url, "Download complete");
                }
                break payload;
            }
            Err(e) => {
                attempt += 1;

                if attempt > options.retry_attempt {
                    if options.log {
                        warn!(url, attempts = attempt, error = %e, "Download failed, no attempts left");
                    }
                    metrics.failed();
                    on_failed();
                    return DownloadOutcome::Failed;
                }

                if options.log {
                    warn!(url, retry = attempt, error = %e, "Download failed, retrying");
                } else {
                    debug!(url, retry = attempt, error = %e, "Download failed, retrying");
                }
            }
        }
    };

    let Some(payload) = payload else {
        debug!(url, "Empty result, nothing to save");
        metrics.empty();
        return DownloadOutcome::Empty;
    };

    metrics.downloaded();

    match on_save(payload).await {
        Ok(bytes) => {
            metrics.saved(bytes);
            DownloadOutcome::Saved
        }
        Err(e) => {
            error!(url, error = %e, "Failed to save result");
            metrics.save_failed();
            DownloadOutcome::SaveFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, Result as FetchResult};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::cell::Cell;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then returns `payload`
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        payload: Option<Value>,
    }

    impl Flaky {
        fn new(failures: u32, payload: Option<Value>) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                payload,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher<Value> for Flaky {
        async fn fetch(&self, _url: &str) -> FetchResult<Option<Value>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(FetchError::RequestFailed(format!("call {call}")))
            } else {
                Ok(self.payload.clone())
            }
        }
    }

    #[tokio::test]
    async fn test_permanent_failure_exhausts_attempts() {
        for retry_attempt in [0, 1, 3, 5] {
            let fetcher = Flaky::new(u32::MAX, None);
            let options = TaskOptions::builder().retry_attempt(retry_attempt).build();
            let metrics = Metrics::new();
            let failed = Cell::new(0);

            let outcome = download(
                &fetcher,
                "http://x/A",
                &options,
                &metrics,
                || failed.set(failed.get() + 1),
                |_payload: Value| async { Err(SaveError::Rejected("unexpected save".to_string())) },
            )
            .await;

            assert_eq!(outcome, DownloadOutcome::Failed);
            assert_eq!(fetcher.calls(), retry_attempt + 1);
            assert_eq!(failed.get(), 1);
            assert_eq!(metrics.snapshot().failed, 1);
        }
    }

    #[tokio::test]
    async fn test_success_stops_retrying() {
        let fetcher = Flaky::new(2, Some(json!({"id": "A"})));
        let options = TaskOptions::builder().retry_attempt(5).build();
        let metrics = Metrics::new();
        let saved = Cell::new(None);

        let outcome = download(
            &fetcher,
            "http://x/A",
            &options,
            &metrics,
            || panic!("must not fail"),
            |payload| {
                saved.set(Some(payload));
                async { Ok(11) }
            },
        )
        .await;

        assert_eq!(outcome, DownloadOutcome::Saved);
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(saved.take(), Some(json!({"id": "A"})));
        assert_eq!(metrics.snapshot().attempts, 3);
        assert_eq!(metrics.snapshot().bytes_saved, 11);
    }

    #[tokio::test]
    async fn test_success_on_last_attempt() {
        let fetcher = Flaky::new(2, Some(json!(1)));
        let options = TaskOptions::builder().retry_attempt(2).build();
        let metrics = Metrics::new();

        let outcome = download(
            &fetcher,
            "http://x/A",
            &options,
            &metrics,
            || panic!("must not fail"),
            |_payload| async { Ok(0) },
        )
        .await;

        assert_eq!(outcome, DownloadOutcome::Saved);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_save_failure_is_not_download_failure() {
        let fetcher = Flaky::new(0, Some(json!([])));
        let options = TaskOptions::default();
        let metrics = Metrics::new();
        let failed = Cell::new(false);

        let outcome = download(
            &fetcher,
            "http://x/A",
            &options,
            &metrics,
            || failed.set(true),
            |_payload| async { Err(SaveError::Rejected("disk full".to_string())) },
        )
        .await;

        assert_eq!(outcome, DownloadOutcome::SaveFailed);
        assert!(!failed.get());
        assert_eq!(fetcher.calls(), 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.save_failed, 1);
        assert_eq!(snapshot.failed, 0);
    }

    #[tokio::test]
    async fn test_empty_result_skips_save() {
        let fetcher = Flaky::new(0, None);
        let options = TaskOptions::builder().log(false).build();
        let metrics = Metrics::new();

        let outcome = download(
            &fetcher,
            "http://x/A",
            &options,
            &metrics,
            || panic!("must not fail"),
            |_payload: Value| async { Err(SaveError::Rejected("unexpected save".to_string())) },
        )
        .await;

        assert_eq!(outcome, DownloadOutcome::Empty);
        assert_eq!(metrics.snapshot().empty, 1);
    }
}
