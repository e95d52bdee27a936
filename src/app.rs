//! Command implementations: argument checks, persistence hooks, wiring

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cli::{CheckArgs, DownloadArgs};
use crate::config::{ConfigError, Settings};
use crate::fetch::{FetchError, FetcherRegistry, RegistryError};
use crate::ledger::{FailureLedger, LedgerError, read_identifiers};
use crate::observability::Metrics;
use crate::storage::{StorageClient, StorageError};
use crate::worker::{BatchSummary, SaveError, TaskPolicy, run_batch};

/// Token replaced by the identifier in a URL template
pub const INJECT_PLACEHOLDER: &str = "[INJECT]";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("URL template should include placeholder `[INJECT]` as injection point for the input: {0}")]
    MissingPlaceholder(String),

    #[error("Output folder doesn't exist: {}", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("Failed to create output folder {}: {source}", .path.display())]
    OutputDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// URL template holding at least one `[INJECT]` placeholder
#[derive(Debug, Clone)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        if !template.contains(INJECT_PLACEHOLDER) {
            return Err(AppError::MissingPlaceholder(template.to_string()));
        }
        Ok(Self(template.to_string()))
    }

    pub fn render(&self, identifier: &str) -> String {
        self.0.replace(INJECT_PLACEHOLDER, identifier)
    }
}

/// Saves each payload under its identifier and records download failures
pub struct PersistPolicy {
    template: UrlTemplate,
    storage: StorageClient,
    ledger: Arc<FailureLedger>,
}

impl PersistPolicy {
    pub fn new(template: UrlTemplate, storage: StorageClient, ledger: Arc<FailureLedger>) -> Self {
        Self {
            template,
            storage,
            ledger,
        }
    }
}

#[async_trait]
impl TaskPolicy<String, Value> for PersistPolicy {
    fn url_for(&self, input: &String) -> String {
        self.template.render(input)
    }

    fn on_failed(&self, input: &String, url: &str) {
        warn!(input = %input, url, "Failed to download");
        self.ledger.record(input.clone());
    }

    async fn on_save(&self, input: &String, payload: Value) -> std::result::Result<usize, SaveError> {
        debug!(input = %input, root = %self.storage.root, "Saving result");
        let meta = self.storage.upload_json(input, &payload).await?;
        Ok(meta.size)
    }

    fn log_prefix(&self, input: &String) -> String {
        format!("[{input}]")
    }
}

/// Fold command-line flags over the loaded settings
fn apply_download_args(settings: &mut Settings, args: &DownloadArgs) {
    if let Some(dir) = &args.output {
        settings.output.dir = dir.clone();
    }
    if let Some(path) = &args.failed_output {
        settings.output.failed_output = path.clone();
    }
    if let Some(limit) = args.concurrency_limit {
        settings.download.concurrency_limit = limit;
    }
    if let Some(retry_attempt) = args.retry_attempt {
        settings.download.retry_attempt = retry_attempt;
    }
    if let Some(method) = &args.method {
        settings.download.method = method.clone();
    }
    if args.no_parallel {
        settings.download.limiter = false;
    }
    if args.skip_existing {
        settings.output.skip_existing = true;
    }
    if args.quiet {
        settings.download.log = false;
    }
}

/// An explicit `-O` must exist; the configured default is created on demand
async fn prepare_output_dir(dir: &Path, explicit: bool) -> Result<()> {
    if tokio::fs::metadata(dir).await.is_ok_and(|meta| meta.is_dir()) {
        return Ok(());
    }

    if explicit {
        return Err(AppError::OutputDirMissing(dir.to_path_buf()));
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| AppError::OutputDirCreate {
            path: dir.to_path_buf(),
            source,
        })
}

/// Drop identifiers that already have a saved object
async fn filter_existing(storage: &StorageClient, inputs: Vec<String>) -> Vec<String> {
    let mut pending = Vec::with_capacity(inputs.len());

    for input in inputs {
        match storage.exists(&input).await {
            Ok(true) => info!(input = %input, "Result exists, skipping"),
            Ok(false) => pending.push(input),
            Err(e) => {
                warn!(input = %input, error = %e, "Could not check existing result, downloading anyway");
                pending.push(input);
            }
        }
    }

    pending
}

/// `download` command
///
/// Every argument problem is reported before the first request goes out.
/// The failure ledger is written once, after the whole batch.
pub async fn run_download(mut settings: Settings, args: DownloadArgs) -> Result<BatchSummary> {
    apply_download_args(&mut settings, &args);
    settings.validate()?;

    let template = UrlTemplate::parse(&args.url_template)?;
    let inputs = read_identifiers(&args.input_file).await?;
    prepare_output_dir(&settings.output.dir, args.output.is_some()).await?;

    let storage = StorageClient::local(&settings.output.dir)?;
    let registry = FetcherRegistry::<Value>::with_defaults(&settings.fetch_config())?;
    let options = settings.task_options();
    let fetcher = registry.resolve(&options.method)?;
    let metrics = Metrics::new();

    let inputs = if settings.output.skip_existing {
        let total = inputs.len();
        let pending = filter_existing(&storage, inputs).await;
        metrics.skipped(total - pending.len());
        pending
    } else {
        inputs
    };

    info!(
        inputs = inputs.len(),
        output = %settings.output.dir.display(),
        "Download task starting"
    );

    let ledger = Arc::new(FailureLedger::new());
    let policy = PersistPolicy::new(template, storage, Arc::clone(&ledger));

    let summary = run_batch(&inputs, &*fetcher, &policy, &options, &metrics).await;

    info!(failed = ledger.len(), "Emitting failed task list");
    ledger.persist(&settings.output.failed_output).await?;
    info!("Download task complete");

    Ok(summary)
}

/// `check` command: identifiers from the input file with no saved result
pub async fn run_check(mut settings: Settings, args: CheckArgs) -> Result<Vec<String>> {
    if let Some(dir) = &args.output {
        settings.output.dir = dir.clone();
    }
    if let Some(path) = &args.missing_output {
        settings.output.missing_output = path.clone();
    }
    settings.validate()?;

    let inputs = read_identifiers(&args.input_file).await?;
    if !tokio::fs::metadata(&settings.output.dir)
        .await
        .is_ok_and(|meta| meta.is_dir())
    {
        return Err(AppError::OutputDirMissing(settings.output.dir.clone()));
    }

    let storage = StorageClient::local(&settings.output.dir)?;
    let missing = FailureLedger::new();

    for input in inputs {
        let present = match storage.exists(&input).await {
            Ok(present) => present,
            Err(StorageError::InvalidKey(_)) => {
                warn!(input = %input, "Identifier cannot name a result file");
                false
            }
            Err(e) => return Err(e.into()),
        };
        if !present {
            info!(input = %input, "Missing");
            missing.record(input);
        }
    }

    missing.persist(&settings.output.missing_output).await?;
    info!(missing = missing.len(), "Check complete");

    Ok(missing.into_entries())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_requires_placeholder() {
        assert!(matches!(
            UrlTemplate::parse("http://x/region"),
            Err(AppError::MissingPlaceholder(_))
        ));
    }

    #[test]
    fn test_template_render() {
        let template = UrlTemplate::parse("http://x/[INJECT]?id=[INJECT]").unwrap();
        assert_eq!(template.render("7301"), "http://x/7301?id=7301");
    }

    #[tokio::test]
    async fn test_persist_policy_hooks() {
        let storage = StorageClient::in_memory();
        let ledger = Arc::new(FailureLedger::new());
        let policy = PersistPolicy::new(
            UrlTemplate::parse("http://x/[INJECT]").unwrap(),
            storage.clone(),
            Arc::clone(&ledger),
        );

        let input = "A".to_string();
        assert_eq!(policy.url_for(&input), "http://x/A");
        assert_eq!(policy.log_prefix(&input), "[A]");

        let written = policy.on_save(&input, json!({"a": 1})).await.unwrap();
        assert_eq!(written, 7);
        assert_eq!(storage.download("A").await.unwrap(), br#"{"a":1}"#);

        policy.on_failed(&"B".to_string(), "http://x/B");
        assert_eq!(ledger.snapshot(), vec!["B"]);
    }

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings::default();
        let args = DownloadArgs {
            input_file: PathBuf::from("input.txt"),
            url_template: "http://x/[INJECT]".to_string(),
            output: Some(PathBuf::from("out")),
            no_parallel: true,
            failed_output: Some(PathBuf::from("bad.txt")),
            concurrency_limit: Some(2),
            skip_existing: true,
            retry_attempt: Some(0),
            method: Some("mock".to_string()),
            quiet: true,
        };

        apply_download_args(&mut settings, &args);

        assert_eq!(settings.output.dir, PathBuf::from("out"));
        assert_eq!(settings.output.failed_output, PathBuf::from("bad.txt"));
        assert_eq!(settings.download.concurrency_limit, 2);
        assert_eq!(settings.download.retry_attempt, 0);
        assert_eq!(settings.download.method, "mock");
        assert!(!settings.download.limiter);
        assert!(!settings.download.log);
        assert!(settings.output.skip_existing);
    }
}
