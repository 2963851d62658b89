//! Wallet ledger core for an investment platform.
//!
//! Wallets hold available and locked funds, every balance change is written to an
//! append-only transaction log, and guards refuse writes that would alter ledger history or
//! the financial terms of acquired inventory. Reconciliation jobs re-check the books and
//! raise admin alerts instead of correcting anything.

pub mod config;
pub mod domain;
pub mod jobs;
pub mod ledger;
pub mod output;
pub mod parsing;
pub mod reconciliation;
