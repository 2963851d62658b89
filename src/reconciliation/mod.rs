//! Read-only integrity checks over the ledger.
//!
//! Nothing here writes to the ledger. Turning a failed check into an admin alert is the
//! job layer's concern (see [`crate::jobs`]); mismatches are never corrected automatically.

mod inventory;
mod snapshots;

pub use inventory::{InventoryReport, LedgerCostCheck, ProductConservation, check_product, reconcile_inventory};
pub use snapshots::{SnapshotAuditReport, TamperedSnapshot, audit_snapshots};
