mod common;

use common::{admin, funded, paise};
use serde_json::json;
use wallet_ledger::{
    domain::{AuditAction, EntityRef, Paise, TransactionId, TransactionType, UserId},
    ledger::{InvariantViolation, Ledger, LedgerError},
};

fn first_transaction(ledger: &Ledger) -> TransactionId {
    ledger.transactions().values().next().unwrap().id
}

#[test]
fn changing_the_amount_is_rejected_and_row_is_unchanged() {
    let mut ledger = funded(1, 10_000);
    let id = first_transaction(&ledger);
    let before = ledger.transaction(id).unwrap().clone();

    let err = ledger
        .update_transaction(id, admin(), |tx| tx.amount += paise(1))
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvariantViolation(InvariantViolation::ImmutableTransaction { ref fields, .. })
            if fields == &vec!["amount"]
    ));
    assert_eq!(ledger.transaction(id), Some(&before));
}

#[test]
fn rejection_names_every_immutable_field_in_declaration_order() {
    let mut ledger = funded(1, 10_000);
    let id = first_transaction(&ledger);

    let err = ledger
        .update_transaction(id, admin(), |tx| {
            tx.balance_after = Paise::new(1_000_000);
            tx.transaction_type = TransactionType::Bonus;
        })
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvariantViolation(InvariantViolation::ImmutableTransaction { ref fields, .. })
            if fields == &vec!["transaction_type", "balance_after"]
    ));
}

#[test]
fn rejected_update_is_audited_with_attempted_values() {
    let mut ledger = funded(1, 10_000);
    let id = first_transaction(&ledger);

    let _ = ledger.update_transaction(id, admin(), |tx| tx.amount = paise(10_001));

    let entry = ledger.audit_log().last().unwrap();
    assert_eq!(entry.action, AuditAction::UpdateRejected);
    assert_eq!(entry.entity, EntityRef::Transaction(id));
    assert_eq!(entry.actor, admin());
    assert_eq!(entry.old_values, json!({ "amount": 10_000 }));
    assert_eq!(entry.new_values, json!({ "amount": 10_001 }));
}

#[test]
fn reversal_linkage_may_be_written_once() {
    let mut ledger = funded(1, 10_000);
    let id = first_transaction(&ledger);
    let other = ledger
        .deposit(UserId::from(1), paise(500), None, admin())
        .unwrap();

    ledger
        .update_transaction(id, admin(), |tx| {
            tx.is_reversed = true;
            tx.reversed_by_transaction_id = Some(other);
            tx.reversal_reason = Some("linked manually".to_owned());
        })
        .unwrap();

    let row = ledger.transaction(id).unwrap();
    assert!(row.is_reversed);
    assert_eq!(row.reversed_by_transaction_id, Some(other));
    assert_eq!(row.amount, paise(10_000));
    assert_eq!(ledger.audit_log().last().unwrap().action, AuditAction::Updated);
}

#[test]
fn a_reversed_transaction_cannot_be_unreversed() {
    let mut ledger = funded(1, 10_000);
    let id = first_transaction(&ledger);
    ledger
        .reverse_transaction(id, admin(), "duplicate deposit")
        .unwrap();

    let err = ledger
        .update_transaction(id, admin(), |tx| {
            tx.is_reversed = false;
            tx.reversed_by_transaction_id = None;
        })
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvariantViolation(InvariantViolation::ReversalIsFinal(rejected)) if rejected == id
    ));
    assert!(ledger.transaction(id).unwrap().is_reversed);
}

#[test]
fn unchanged_update_writes_nothing() {
    let mut ledger = funded(1, 10_000);
    let id = first_transaction(&ledger);

    ledger.update_transaction(id, admin(), |_| {}).unwrap();

    assert!(ledger.audit_log().is_empty());
}

#[test]
fn deleting_a_transaction_is_always_rejected() {
    let mut ledger = funded(1, 10_000);
    let id = first_transaction(&ledger);

    let err = ledger.delete_transaction(id, admin()).unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvariantViolation(InvariantViolation::TransactionDeletion(_))
    ));
    assert!(ledger.transaction(id).is_some());

    let entry = ledger.audit_log().last().unwrap();
    assert_eq!(entry.action, AuditAction::DeleteRejected);
    assert_eq!(entry.old_values["amount"], json!(10_000));
    assert_eq!(entry.new_values, serde_json::Value::Null);
}

#[test]
fn deleting_an_unknown_transaction_reports_not_found() {
    let mut ledger = funded(1, 10_000);

    let err = ledger
        .delete_transaction(TransactionId::from(99), admin())
        .unwrap_err();

    assert!(matches!(err, LedgerError::TransactionNotFound(_)));
    assert!(ledger.audit_log().is_empty());
}
