use std::fmt::Display;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use super::error::{LedgerError, Result};

/// Append-only list of failed inputs, safe to share across item runs
#[derive(Debug)]
pub struct FailureLedger<T = String> {
    entries: Mutex<Vec<T>>,
}

impl<T> FailureLedger<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, input: T) {
        self.lock().push(input);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn into_entries(self) -> Vec<T> {
        self.entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // Appends are single pushes, so a poisoned lock still guards a valid Vec
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> FailureLedger<T> {
    /// Entries in append order
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }
}

impl<T: Display> FailureLedger<T> {
    /// Newline-joined entries, no trailing newline
    pub fn render(&self) -> String {
        self.lock()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the ledger file, replacing any previous content
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.render();

        tokio::fs::write(path, content)
            .await
            .map_err(|source| LedgerError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), entries = self.len(), "Failure ledger written");
        Ok(())
    }
}

impl<T> Default for FailureLedger<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a newline-separated identifier list, dropping blank lines
pub async fn read_identifiers(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LedgerError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(parse_identifiers(&content))
}

pub fn parse_identifiers(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_record_keeps_order() {
        let ledger = FailureLedger::new();
        ledger.record("B".to_string());
        ledger.record("D".to_string());

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.snapshot(), vec!["B", "D"]);
        assert_eq!(ledger.render(), "B\nD");
    }

    #[test]
    fn test_empty_ledger_renders_empty() {
        let ledger: FailureLedger = FailureLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.render(), "");
    }

    #[test]
    fn test_concurrent_appends() {
        let ledger = Arc::new(FailureLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        ledger.record(format!("{worker}-{i}"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 800);
    }

    #[tokio::test]
    async fn test_persist_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("failed.txt");

        let ledger = FailureLedger::new();
        ledger.record("7301".to_string());
        ledger.record("7302".to_string());
        ledger.persist(&path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "7301\n7302");
        assert_eq!(read_identifiers(&path).await.unwrap(), vec!["7301", "7302"]);
    }

    #[tokio::test]
    async fn test_persist_to_missing_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope").join("failed.txt");

        let ledger: FailureLedger = FailureLedger::new();
        assert!(matches!(
            ledger.persist(&path).await,
            Err(LedgerError::Write { .. })
        ));
    }

    #[test]
    fn test_parse_identifiers_skips_blank_and_cr() {
        let ids = parse_identifiers("A\r\n\nB\n   \nC\n");
        assert_eq!(ids, vec!["A", "B", "C"]);
    }
}
