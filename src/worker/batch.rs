//! Batch task runner

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::TaskOptions;
use super::policy::TaskPolicy;
use super::runner::download;
use crate::fetch::Fetcher;
use crate::observability::{Metrics, MetricsSnapshot};

/// What a finished batch did
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub metrics: MetricsSnapshot,
}

/// Run every input through [`download`], at most `concurrency_limit` at a time.
///
/// All item runs are driven on the calling task. With the limiter on, a fair
/// semaphore admits items in input order as slots free up; with it off every
/// item starts at once. The batch returns only after every item has reached
/// `on_save` or `on_failed` (or produced an empty result). Item failures never
/// stop the batch.
pub async fn run_batch<T, P, Fe, Pol>(
    inputs: &[T],
    fetcher: &Fe,
    policy: &Pol,
    options: &TaskOptions,
    metrics: &Metrics,
) -> BatchSummary
where
    T: Sync + 'static,
    P: Send + 'static,
    Fe: Fetcher<P> + ?Sized,
    Pol: TaskPolicy<T, P> + ?Sized,
{
    let run_id = Uuid::now_v7();
    let started_at = Utc::now();
    let gate = options
        .limiter
        .then(|| Semaphore::new(options.concurrency_limit.max(1)));

    let span = info_span!("batch", %run_id);

    async {
        info!(
            total = inputs.len(),
            concurrency_limit = options.concurrency_limit,
            limiter = options.limiter,
            method = %options.method,
            "Batch starting"
        );

        let runs = inputs.iter().map(|input| {
            let gate = gate.as_ref();
            let url = policy.url_for(input);
            let prefix = policy.log_prefix(input);

            async move {
                // The semaphore is never closed, so acquire only fails if it is
                let _permit = match gate {
                    Some(gate) => gate.acquire().await.ok(),
                    None => None,
                };

                download(
                    fetcher,
                    &url,
                    options,
                    metrics,
                    || policy.on_failed(input, &url),
                    |payload| policy.on_save(input, payload),
                )
                .instrument(info_span!("item", %prefix))
                .await
            }
        });

        join_all(runs).await;
    }
    .instrument(span)
    .await;

    let summary = BatchSummary {
        run_id,
        total: inputs.len(),
        started_at,
        finished_at: Utc::now(),
        metrics: metrics.snapshot(),
    };

    info!(
        %run_id,
        total = summary.total,
        saved = summary.metrics.saved,
        bytes_saved = summary.metrics.bytes_saved,
        failed = summary.metrics.failed,
        save_failed = summary.metrics.save_failed,
        empty = summary.metrics.empty,
        elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
        "Batch complete"
    );

    summary
}
