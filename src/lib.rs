pub mod app;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod ledger;
pub mod observability;
pub mod storage;
pub mod worker;
