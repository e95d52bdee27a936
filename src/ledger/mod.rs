//! Failure ledger
//!
//! Identifiers whose download exhausted every attempt are appended here by
//! the caller's failure hook. The ledger is owned by the caller, shared with
//! concurrent item runs by reference, and written to disk once when the
//! batch is over:
//!
//! ```rust,ignore
//! use fetchbatch::ledger::FailureLedger;
//!
//! let ledger = FailureLedger::new();
//! ledger.record("7301".to_string());
//! ledger.persist("failed.txt").await?;
//! ```

pub mod error;
pub mod failures;

pub use error::{LedgerError, Result};
pub use failures::{FailureLedger, parse_identifiers, read_identifiers};
