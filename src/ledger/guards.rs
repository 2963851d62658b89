//! Write guards for append-only and partially immutable rows.
//!
//! The checks here are pure: they compare the stored row with the proposed row and say
//! whether the write may happen. The `Ledger` methods at the bottom run them before any
//! write and record refusals in the audit log.

use chrono::Utc;
use tracing::{info, warn};

use super::{Ledger, LedgerError, audit_values, errors::InvariantViolation};
use crate::domain::{
    Actor, AuditAction, BulkPurchase, EntityRef, TransactionId, TransactionRecord,
};

/// Names every listed field whose value differs between `$old` and `$new`.
macro_rules! changed_fields {
    ($old:expr, $new:expr, [$($field:ident),+ $(,)?]) => {{
        let mut changed: Vec<&'static str> = Vec::new();
        $(
            if $old.$field != $new.$field {
                changed.push(stringify!($field));
            }
        )+
        changed
    }};
}

/// The reversal linkage is the only part of a ledger transaction that may be written after creation.
pub const TRANSACTION_MUTABLE_FIELDS: [&str; 5] = [
    "is_reversed",
    "reversed_by_transaction_id",
    "reversed_at",
    "reversal_reason",
    "updated_at",
];

/// Identity, sourcing, financial terms and dates of a bulk purchase.
pub const BULK_PURCHASE_IMMUTABLE_FIELDS: [&str; 11] = [
    "id",
    "product_id",
    "face_value_purchased",
    "actual_cost_paid",
    "discount_percentage",
    "extra_allocation_percentage",
    "total_value_received",
    "seller_name",
    "source_type",
    "purchase_date",
    "created_at",
];

pub fn transaction_changes(old: &TransactionRecord, new: &TransactionRecord) -> Vec<&'static str> {
    changed_fields!(
        old,
        new,
        [
            id,
            user_id,
            transaction_type,
            amount,
            balance_before,
            balance_after,
            tds_deducted,
            description,
            reference,
            is_reversed,
            reversed_by_transaction_id,
            reversed_at,
            reversal_reason,
            created_at,
            updated_at,
        ]
    )
}

pub fn bulk_purchase_changes(old: &BulkPurchase, new: &BulkPurchase) -> Vec<&'static str> {
    changed_fields!(
        old,
        new,
        [
            id,
            product_id,
            admin_id,
            face_value_purchased,
            actual_cost_paid,
            discount_percentage,
            extra_allocation_percentage,
            total_value_received,
            value_remaining,
            seller_name,
            source_type,
            purchase_date,
            notes,
            created_at,
            updated_at,
        ]
    )
}

/// Allows only reversal linkage changes, and only while the row is not yet reversed.
pub fn check_transaction_update(
    old: &TransactionRecord,
    new: &TransactionRecord,
) -> Result<(), InvariantViolation> {
    let changed = transaction_changes(old, new);
    let immutable: Vec<&'static str> = changed
        .iter()
        .copied()
        .filter(|field| !TRANSACTION_MUTABLE_FIELDS.contains(field))
        .collect();
    if !immutable.is_empty() {
        return Err(InvariantViolation::ImmutableTransaction {
            id: old.id,
            fields: immutable,
        });
    }
    if old.is_reversed && changed.iter().any(|field| *field != "updated_at") {
        return Err(InvariantViolation::ReversalIsFinal(old.id));
    }
    Ok(())
}

pub fn check_bulk_purchase_update(
    old: &BulkPurchase,
    new: &BulkPurchase,
) -> Result<(), InvariantViolation> {
    let immutable: Vec<&'static str> = bulk_purchase_changes(old, new)
        .into_iter()
        .filter(|field| BULK_PURCHASE_IMMUTABLE_FIELDS.contains(field))
        .collect();
    if !immutable.is_empty() {
        return Err(InvariantViolation::ImmutableBulkPurchase {
            id: old.id,
            fields: immutable,
        });
    }
    check_value_remaining(new)
}

/// `0 <= value_remaining <= total_value_received`.
pub fn check_value_remaining(purchase: &BulkPurchase) -> Result<(), InvariantViolation> {
    if purchase.value_remaining.is_negative()
        || purchase.value_remaining > purchase.total_value_received
    {
        return Err(InvariantViolation::ValueRemainingOutOfRange {
            id: purchase.id,
            value_remaining: purchase.value_remaining,
            total_value_received: purchase.total_value_received,
        });
    }
    Ok(())
}

/// Only untouched inventory may be deleted.
pub fn check_bulk_purchase_delete(purchase: &BulkPurchase) -> Result<(), InvariantViolation> {
    let allocated = purchase.allocated_value();
    if allocated.is_positive() {
        return Err(InvariantViolation::AllocatedBulkPurchaseDeletion {
            id: purchase.id,
            allocated,
        });
    }
    Ok(())
}

impl Ledger {
    /// Applies `mutate` to a copy of the transaction and writes it back if only the
    /// reversal linkage changed. Any other change is refused and audited; the stored row
    /// stays as it was.
    pub fn update_transaction(
        &mut self,
        id: TransactionId,
        actor: Actor,
        mutate: impl FnOnce(&mut TransactionRecord),
    ) -> Result<(), LedgerError> {
        let old = self
            .transactions
            .get(&id)
            .ok_or(LedgerError::TransactionNotFound(id))?
            .clone();
        let mut new = old.clone();
        mutate(&mut new);

        let changed = transaction_changes(&old, &new);
        if changed.is_empty() {
            return Ok(());
        }
        if let Err(violation) = check_transaction_update(&old, &new) {
            return self.reject(
                actor,
                AuditAction::UpdateRejected,
                EntityRef::Transaction(id),
                audit_values(&old, Some(&changed)),
                audit_values(&new, Some(&changed)),
                violation,
            );
        }

        if !changed.contains(&"updated_at") {
            new.updated_at = Utc::now();
        }
        self.record_audit(
            actor,
            AuditAction::Updated,
            EntityRef::Transaction(id),
            audit_values(&old, Some(&changed)),
            audit_values(&new, Some(&changed)),
            format!("Transaction {id} reversal linkage updated"),
        );
        info!(target: "audit", transaction = %id, actor = %actor, fields = ?changed, "Transaction updated");
        self.transactions.insert(id, new);
        Ok(())
    }

    /// Ledger rows are never deleted. Always refused; corrections go through a
    /// compensating transaction (see [`Ledger::reverse_transaction`]).
    pub fn delete_transaction(&mut self, id: TransactionId, actor: Actor) -> Result<(), LedgerError> {
        let Some(row) = self.transactions.get(&id) else {
            warn!(transaction = %id, actor = %actor, "Delete requested for unknown transaction");
            return Err(LedgerError::TransactionNotFound(id));
        };
        let old_values = audit_values(row, None);
        self.reject(
            actor,
            AuditAction::DeleteRejected,
            EntityRef::Transaction(id),
            old_values,
            serde_json::Value::Null,
            InvariantViolation::TransactionDeletion(id),
        )
    }
}
