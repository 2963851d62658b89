//! Stateful wallet ledger.
//!
//! Holds every table of the ledger core (wallets, fund locks, the append-only transaction
//! log, inventory, disclosures, audit log and admin alerts) and exposes the operations that
//! mutate them. Each operation validates against copies first and writes only once every
//! check has passed, so a failed call leaves no partial state behind. Exclusive `&mut`
//! access to the ledger is the only lock.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, warn};

use crate::{
    config::LedgerConfig,
    domain::{
        Actor, AdminAlert, AlertId, AlertKind, Allocation, AllocationId, AuditAction,
        AuditLogEntry, AuditLogId, BulkPurchase, BulkPurchaseId, Company, CompanyId,
        DisclosureSnapshot, EntityRef, FundLock, FundLockId, LedgerEntry, Product, ProductId,
        Severity, TransactionId, TransactionRecord, UserId, Wallet, WithdrawalId,
        WithdrawalRequest,
    },
};
pub use commands::WalletCommand;
pub use errors::{InvariantViolation, LedgerError};
pub use types::{AppendOnly, Table};
pub use wallet::ReleaseOutcome;

mod commands;
mod disclosure;
pub mod errors;
pub mod guards;
mod inventory;
mod types;
mod wallet;
mod withdrawal;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    config: LedgerConfig,
    sequences: types::Sequences,
    wallets: Table<UserId, Wallet>,
    transactions: Table<TransactionId, TransactionRecord>,
    fund_locks: Table<FundLockId, FundLock>,
    withdrawals: Table<WithdrawalId, WithdrawalRequest>,
    products: Table<ProductId, Product>,
    bulk_purchases: Table<BulkPurchaseId, BulkPurchase>,
    allocations: Table<AllocationId, Allocation>,
    ledger_entries: AppendOnly<LedgerEntry>,
    companies: Table<CompanyId, Company>,
    disclosures: AppendOnly<DisclosureSnapshot>,
    audit_log: AppendOnly<AuditLogEntry>,
    alerts: AppendOnly<AdminAlert>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
    pub fn wallets(&self) -> &Table<UserId, Wallet> {
        &self.wallets
    }
    pub fn wallet(&self, user: UserId) -> Option<&Wallet> {
        self.wallets.get(&user)
    }
    pub fn transactions(&self) -> &Table<TransactionId, TransactionRecord> {
        &self.transactions
    }
    pub fn transaction(&self, id: TransactionId) -> Option<&TransactionRecord> {
        self.transactions.get(&id)
    }
    pub fn fund_locks(&self) -> &Table<FundLockId, FundLock> {
        &self.fund_locks
    }
    pub fn fund_lock(&self, id: FundLockId) -> Option<&FundLock> {
        self.fund_locks.get(&id)
    }
    pub fn withdrawals(&self) -> &Table<WithdrawalId, WithdrawalRequest> {
        &self.withdrawals
    }
    pub fn withdrawal(&self, id: WithdrawalId) -> Option<&WithdrawalRequest> {
        self.withdrawals.get(&id)
    }
    pub fn products(&self) -> &Table<ProductId, Product> {
        &self.products
    }
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }
    pub fn bulk_purchases(&self) -> &Table<BulkPurchaseId, BulkPurchase> {
        &self.bulk_purchases
    }
    pub fn bulk_purchase(&self, id: BulkPurchaseId) -> Option<&BulkPurchase> {
        self.bulk_purchases.get(&id)
    }
    pub fn allocations(&self) -> &Table<AllocationId, Allocation> {
        &self.allocations
    }
    pub fn ledger_entries(&self) -> &AppendOnly<LedgerEntry> {
        &self.ledger_entries
    }
    pub fn companies(&self) -> &Table<CompanyId, Company> {
        &self.companies
    }
    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(&id)
    }
    pub fn disclosures(&self) -> &AppendOnly<DisclosureSnapshot> {
        &self.disclosures
    }
    pub fn audit_log(&self) -> &AppendOnly<AuditLogEntry> {
        &self.audit_log
    }
    pub fn alerts(&self) -> &AppendOnly<AdminAlert> {
        &self.alerts
    }

    /// Inserts a row into the admin alert sink.
    pub fn raise_alert(
        &mut self,
        kind: AlertKind,
        severity: Severity,
        title: impl Into<String>,
        details: serde_json::Value,
    ) -> AlertId {
        let id = self.sequences.alerts.next();
        let alert = AdminAlert {
            id,
            kind,
            severity,
            title: title.into(),
            details,
            created_at: Utc::now(),
        };
        match severity {
            Severity::Critical => error!(severity = "critical", alert = %id, kind = %kind, "{}", alert.title),
            Severity::Warning => warn!(alert = %id, kind = %kind, "{}", alert.title),
        }
        self.alerts.push(alert);
        id
    }

    pub(crate) fn record_audit(
        &mut self,
        actor: Actor,
        action: AuditAction,
        entity: EntityRef,
        old_values: serde_json::Value,
        new_values: serde_json::Value,
        message: impl Into<String>,
    ) -> AuditLogId {
        let id = self.sequences.audit_log.next();
        self.audit_log.push(AuditLogEntry {
            id,
            actor,
            action,
            entity,
            old_values,
            new_values,
            message: message.into(),
            created_at: Utc::now(),
        });
        id
    }

    /// Records a refused write and turns it into an error. The refused row is never touched.
    pub(crate) fn reject<T>(
        &mut self,
        actor: Actor,
        action: AuditAction,
        entity: EntityRef,
        old_values: serde_json::Value,
        new_values: serde_json::Value,
        violation: InvariantViolation,
    ) -> Result<T, LedgerError> {
        error!(
            severity = "critical",
            actor = %actor,
            entity = %entity,
            "Blocked write to immutable record: {violation}"
        );
        self.record_audit(
            actor,
            action,
            entity,
            old_values,
            new_values,
            violation.to_string(),
        );
        Err(violation.into())
    }
}

/// Serializes a row to JSON for the audit log, keeping only `fields` when given.
pub(crate) fn audit_values<T: Serialize>(row: &T, fields: Option<&[&str]>) -> serde_json::Value {
    let value = serde_json::to_value(row).unwrap_or_default();
    match (value, fields) {
        (serde_json::Value::Object(map), Some(fields)) => map
            .into_iter()
            .filter(|(key, _)| fields.contains(&key.as_str()))
            .collect::<serde_json::Map<_, _>>()
            .into(),
        (value, _) => value,
    }
}
