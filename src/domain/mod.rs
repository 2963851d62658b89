//! Core domain types: identifiers, money, wallets, ledger rows, inventory and
//! disclosure records.

mod audit;
mod disclosure;
mod ids;
mod inventory;
mod money;
mod transaction;
mod wallet;

pub use audit::{AdminAlert, AlertKind, AuditAction, AuditLogEntry, Severity};
pub use disclosure::{Company, CompanyProfile, DisclosureSnapshot, payload_hash};
pub use ids::{
    AlertId, AllocationId, AuditLogId, BulkPurchaseId, CompanyId, DisclosureVersionId,
    FundLockId, LedgerEntryId, OrderId, ProductId, TransactionId, UserId, WithdrawalId,
};
pub use inventory::{
    Allocation, BulkPurchase, LedgerEntry, LedgerEntryKind, NewBulkPurchase, Product,
    ProductStatus, SourceType,
};
pub use money::Paise;
pub use transaction::{EntityRef, TransactionRecord, TransactionType};
pub use wallet::{
    FundLock, LockPurpose, LockStatus, Lockable, Wallet, WithdrawalRequest, WithdrawalStatus,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Paise, available: Paise },
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Paise),
    #[error("Locked balance {locked} exceeds balance {balance}")]
    LockedExceedsBalance { balance: Paise, locked: Paise },
    #[error("Cannot unlock {requested}, only {locked} is locked")]
    UnlockExceedsLocked { requested: Paise, locked: Paise },
    #[error("Amount {amount} would overflow {total}")]
    Overflow { total: Paise, amount: Paise },
}

/// Who is performing an operation. Threaded explicitly through every mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    #[display("system")]
    System,
    #[display("admin:{_0}")]
    Admin(UserId),
    #[display("user:{_0}")]
    User(UserId),
}

impl Actor {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::System => None,
            Actor::Admin(id) | Actor::User(id) => Some(*id),
        }
    }
}
