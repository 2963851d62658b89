mod common;

use common::{admin, paise, run, wallet};
use std::collections::BTreeMap;
use wallet_ledger::{
    domain::{Actor, UserId, WithdrawalId, WithdrawalStatus},
    ledger::{LedgerError, ReleaseOutcome, WalletCommand},
};

fn user(id: u64) -> UserId {
    UserId::from(id)
}

fn withdrawal(id: u64) -> WithdrawalId {
    WithdrawalId::from(id)
}

/// Deposit 10_000 and request a withdrawal of 4_000 (withdrawal 1).
fn requested() -> Vec<WalletCommand> {
    vec![
        WalletCommand::Deposit {
            user: user(1),
            amount: paise(10_000),
        },
        WalletCommand::RequestWithdrawal {
            user: user(1),
            amount: paise(4_000),
        },
    ]
}

fn then(mut commands: Vec<WalletCommand>, next: WalletCommand) -> Vec<WalletCommand> {
    commands.push(next);
    commands
}

#[test]
fn request_locks_the_requested_amount() {
    let ledger = run(requested());

    let expected = BTreeMap::from([(user(1), wallet(1, 10_000, 4_000))]);
    assert_eq!(ledger.wallets().as_map(), &expected);

    let request = ledger.withdrawal(withdrawal(1)).unwrap();
    assert_eq!(request.status, WithdrawalStatus::Pending);
    assert!(ledger.fund_lock(request.fund_lock_id).unwrap().is_active());
}

#[test]
fn approval_releases_the_lock_and_debits_the_wallet() {
    let ledger = run(then(
        requested(),
        WalletCommand::ApproveWithdrawal {
            withdrawal: withdrawal(1),
        },
    ));

    let expected = BTreeMap::from([(user(1), wallet(1, 6_000, 0))]);
    assert_eq!(ledger.wallets().as_map(), &expected);

    let request = ledger.withdrawal(withdrawal(1)).unwrap();
    assert_eq!(request.status, WithdrawalStatus::Approved);
    assert_eq!(request.decided_by, Some(admin()));
    assert!(!ledger.fund_lock(request.fund_lock_id).unwrap().is_active());
}

#[test]
fn completion_follows_approval_without_moving_money() {
    let ledger = run(then(
        then(
            requested(),
            WalletCommand::ApproveWithdrawal {
                withdrawal: withdrawal(1),
            },
        ),
        WalletCommand::CompleteWithdrawal {
            withdrawal: withdrawal(1),
        },
    ));

    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 6_000, 0)));
    assert_eq!(
        ledger.withdrawal(withdrawal(1)).unwrap().status,
        WithdrawalStatus::Completed
    );
}

#[test]
fn rejection_returns_funds_to_available() {
    let ledger = run(then(
        requested(),
        WalletCommand::RejectWithdrawal {
            withdrawal: withdrawal(1),
        },
    ));

    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 10_000, 0)));
    let request = ledger.withdrawal(withdrawal(1)).unwrap();
    assert_eq!(request.status, WithdrawalStatus::Rejected);
    assert_eq!(request.decision_reason.as_deref(), Some("rejected by admin"));
}

#[test]
fn cancellation_is_attributed_to_the_owner() {
    let ledger = run(then(
        requested(),
        WalletCommand::CancelWithdrawal {
            withdrawal: withdrawal(1),
        },
    ));

    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 10_000, 0)));
    let request = ledger.withdrawal(withdrawal(1)).unwrap();
    assert_eq!(request.status, WithdrawalStatus::Cancelled);
    assert_eq!(request.decided_by, Some(Actor::User(user(1))));
}

#[test]
fn request_exceeding_available_is_ignored() {
    let ledger = run(vec![
        WalletCommand::Deposit {
            user: user(1),
            amount: paise(1_000),
        },
        WalletCommand::RequestWithdrawal {
            user: user(1),
            amount: paise(4_000),
        },
    ]);

    assert!(ledger.withdrawals().is_empty());
    assert!(ledger.fund_locks().is_empty());
    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 1_000, 0)));
}

#[test]
fn pending_withdrawal_cannot_be_completed() {
    let mut ledger = run(requested());

    let err = ledger
        .complete_withdrawal(withdrawal(1), admin())
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvalidWithdrawalTransition {
            from: WithdrawalStatus::Pending,
            to: WithdrawalStatus::Completed,
            ..
        }
    ));
}

#[test]
fn rejected_withdrawal_cannot_be_approved() {
    let mut ledger = run(then(
        requested(),
        WalletCommand::RejectWithdrawal {
            withdrawal: withdrawal(1),
        },
    ));

    let err = ledger.approve_withdrawal(withdrawal(1), admin()).unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvalidWithdrawalTransition {
            from: WithdrawalStatus::Rejected,
            to: WithdrawalStatus::Approved,
            ..
        }
    ));
    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 10_000, 0)));
}

/// If the lock was released out of band, approval must not debit funds that are no
/// longer reserved.
#[test]
fn approval_fails_when_lock_was_released_elsewhere() {
    let mut ledger = run(requested());
    let lock_id = ledger.withdrawal(withdrawal(1)).unwrap().fund_lock_id;
    let outcome = ledger.release(lock_id, admin(), "manual release").unwrap();
    assert!(matches!(outcome, ReleaseOutcome::Released(_)));

    let err = ledger.approve_withdrawal(withdrawal(1), admin()).unwrap_err();

    assert!(matches!(err, LedgerError::FundLockNotActive(id) if id == lock_id));
    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 10_000, 0)));
    assert_eq!(
        ledger.withdrawal(withdrawal(1)).unwrap().status,
        WithdrawalStatus::Pending
    );
}

#[test]
fn unknown_withdrawal_is_reported() {
    let mut ledger = run(requested());

    let err = ledger.approve_withdrawal(withdrawal(9), admin()).unwrap_err();

    assert!(matches!(err, LedgerError::WithdrawalNotFound(_)));
}

/// Later commands refer to withdrawals by id, so a refused request must not use one up.
#[test]
fn refused_request_does_not_consume_a_withdrawal_id() {
    let ledger = run(vec![
        WalletCommand::Deposit {
            user: user(1),
            amount: paise(1_000),
        },
        WalletCommand::RequestWithdrawal {
            user: user(1),
            amount: paise(5_000),
        },
        WalletCommand::RequestWithdrawal {
            user: user(1),
            amount: paise(500),
        },
        WalletCommand::ApproveWithdrawal {
            withdrawal: withdrawal(1),
        },
    ]);

    let expected = BTreeMap::from([(user(1), wallet(1, 500, 0))]);

    assert_eq!(ledger.wallets().as_map(), &expected);
    assert_eq!(ledger.withdrawals().len(), 1);
    let request = ledger.withdrawal(withdrawal(1)).unwrap();
    assert_eq!(request.amount, paise(500));
    assert_eq!(request.status, WithdrawalStatus::Approved);
}

#[test]
fn request_id_follows_the_last_successful_request() {
    let mut ledger = run(requested());

    let refused = ledger.request_withdrawal(user(1), paise(50_000), Actor::User(user(1)));
    let accepted = ledger
        .request_withdrawal(user(1), paise(1_000), Actor::User(user(1)))
        .unwrap();

    assert!(matches!(refused, Err(LedgerError::DomainError(_))));
    assert_eq!(accepted, withdrawal(2));
}
