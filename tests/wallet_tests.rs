mod common;

use common::{admin, funded, paise, run, wallet};
use rust_decimal::dec;
use std::collections::BTreeMap;
use wallet_ledger::{
    config::LedgerConfig,
    domain::{
        Actor, DomainError, LedgerEntryKind, LockPurpose, Lockable, OrderId, Paise, TransactionType,
        UserId,
    },
    ledger::{Ledger, LedgerError, WalletCommand},
};

fn user(id: u64) -> UserId {
    UserId::from(id)
}

#[test]
fn deposit_creates_wallet_and_credits_balance() {
    let ledger = run(vec![WalletCommand::Deposit {
        user: user(1),
        amount: paise(10_000),
    }]);

    let expected = BTreeMap::from([(user(1), wallet(1, 10_000, 0))]);

    assert_eq!(ledger.wallets().as_map(), &expected);
}

#[test]
fn withdrawal_exceeding_balance_is_ignored() {
    let ledger = run(vec![
        WalletCommand::Deposit {
            user: user(1),
            amount: paise(3_000),
        },
        WalletCommand::Withdraw {
            user: user(1),
            amount: paise(10_000),
        },
    ]);

    let expected = BTreeMap::from([(user(1), wallet(1, 3_000, 0))]);

    assert_eq!(ledger.wallets().as_map(), &expected);
}

/// Locked funds are part of the balance but cannot be spent.
#[test]
fn withdrawal_cannot_spend_locked_funds() {
    let ledger = run(vec![
        WalletCommand::Deposit {
            user: user(1),
            amount: paise(10_000),
        },
        WalletCommand::RequestWithdrawal {
            user: user(1),
            amount: paise(8_000),
        },
        WalletCommand::Withdraw {
            user: user(1),
            amount: paise(5_000),
        }, // only 2_000 available
    ]);

    let expected = BTreeMap::from([(user(1), wallet(1, 10_000, 8_000))]);

    assert_eq!(ledger.wallets().as_map(), &expected);
}

#[test]
fn withdrawal_without_wallet_fails() {
    let mut ledger = Ledger::new();

    let err = ledger
        .withdraw(user(7), paise(1), None, Actor::User(user(7)))
        .unwrap_err();

    assert!(matches!(err, LedgerError::WalletNotFound(id) if id == user(7)));
    assert!(ledger.wallets().is_empty());
}

#[test]
fn every_balance_change_records_before_and_after() {
    let mut ledger = funded(1, 10_000);
    ledger
        .withdraw(user(1), paise(2_500), None, Actor::User(user(1)))
        .unwrap();

    let rows: Vec<_> = ledger
        .transactions()
        .values()
        .map(|tx| {
            (
                tx.transaction_type,
                tx.amount,
                tx.balance_before,
                tx.balance_after,
            )
        })
        .collect();

    assert_eq!(
        rows,
        vec![
            (TransactionType::Deposit, paise(10_000), paise(0), paise(10_000)),
            (
                TransactionType::Withdrawal,
                paise(2_500),
                paise(10_000),
                paise(7_500)
            ),
        ]
    );
}

#[test]
fn non_positive_deposit_is_rejected_without_side_effects() {
    let mut ledger = Ledger::new();

    let err = ledger
        .deposit(user(1), paise(0), None, Actor::User(user(1)))
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::DomainError(DomainError::NonPositiveAmount(_))
    ));
    assert!(ledger.wallet(user(1)).is_none());
    assert!(ledger.transactions().is_empty());
}

#[test]
fn bonus_withholds_default_tds() {
    let mut ledger = Ledger::new();

    let id = ledger
        .credit_bonus(user(1), paise(10_000), "Referral bonus", admin())
        .unwrap();

    let tx = ledger.transaction(id).unwrap();
    assert_eq!(tx.transaction_type, TransactionType::Bonus);
    assert_eq!(tx.amount, paise(9_000));
    assert_eq!(tx.tds_deducted, paise(1_000));
    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 9_000, 0)));

    let entries: Vec<_> = ledger
        .ledger_entries()
        .iter()
        .map(|entry| (entry.kind, entry.amount))
        .collect();
    assert_eq!(
        entries,
        vec![
            (LedgerEntryKind::BonusExpense, paise(10_000)),
            (LedgerEntryKind::TdsPayable, paise(1_000)),
        ]
    );
}

#[test]
fn bonus_uses_configured_tds_rounded_to_whole_paise() {
    let mut ledger = Ledger::with_config(LedgerConfig {
        bonus_tds_percentage: dec!(5),
        ..LedgerConfig::default()
    });

    // 5% of 1999 is 99.95, rounded to 100.
    let id = ledger
        .credit_bonus(user(1), paise(1_999), "Loyalty bonus", admin())
        .unwrap();

    let tx = ledger.transaction(id).unwrap();
    assert_eq!(tx.tds_deducted, paise(100));
    assert_eq!(tx.amount, paise(1_899));
}

#[test]
fn reversing_a_deposit_posts_a_compensating_transaction() {
    let mut ledger = funded(1, 10_000);
    let deposit = ledger.transactions().values().next().unwrap().id;

    let reversal = ledger
        .reverse_transaction(deposit, admin(), "card payment charged back")
        .unwrap();

    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 0, 0)));

    let original = ledger.transaction(deposit).unwrap();
    assert!(original.is_reversed);
    assert_eq!(original.reversed_by_transaction_id, Some(reversal));
    assert_eq!(
        original.reversal_reason.as_deref(),
        Some("card payment charged back")
    );
    assert_eq!(original.amount, paise(10_000));
    assert_eq!(original.balance_after, paise(10_000));

    let compensating = ledger.transaction(reversal).unwrap();
    assert_eq!(compensating.transaction_type, TransactionType::Reversal);
    assert_eq!(compensating.amount, paise(10_000));
    assert_eq!(compensating.balance_before, paise(10_000));
    assert_eq!(compensating.balance_after, paise(0));
}

#[test]
fn reversing_a_withdrawal_credits_the_wallet() {
    let mut ledger = funded(1, 10_000);
    let withdrawal = ledger
        .withdraw(user(1), paise(4_000), None, Actor::User(user(1)))
        .unwrap();

    ledger
        .reverse_transaction(withdrawal, admin(), "payout bounced")
        .unwrap();

    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 10_000, 0)));
}

#[test]
fn a_transaction_can_only_be_reversed_once() {
    let mut ledger = funded(1, 10_000);
    let deposit = ledger.transactions().values().next().unwrap().id;
    ledger.reverse_transaction(deposit, admin(), "first").unwrap();

    let err = ledger
        .reverse_transaction(deposit, admin(), "second")
        .unwrap_err();

    assert!(matches!(err, LedgerError::AlreadyReversed(id) if id == deposit));
    assert_eq!(ledger.transactions().len(), 2);
}

/// Reversing a deposit whose funds are reserved would push locked above balance.
#[test]
fn reversal_that_would_touch_locked_funds_fails_cleanly() {
    let mut ledger = funded(1, 10_000);
    let deposit = ledger.transactions().values().next().unwrap().id;
    ledger
        .lock_funds(
            user(1),
            paise(8_000),
            LockPurpose::Order,
            Lockable::Order(OrderId::from(5)),
            serde_json::Value::Null,
            Actor::User(user(1)),
        )
        .unwrap();
    let rows_before = ledger.transactions().len();

    let err = ledger
        .reverse_transaction(deposit, admin(), "chargeback")
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::DomainError(DomainError::InsufficientFunds { .. })
    ));
    assert!(!ledger.transaction(deposit).unwrap().is_reversed);
    assert_eq!(ledger.transactions().len(), rows_before);
    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 10_000, 8_000)));
}

#[test]
fn fund_lock_rows_are_not_reversible() {
    let mut ledger = funded(1, 10_000);
    ledger
        .lock_funds(
            user(1),
            paise(1_000),
            LockPurpose::Order,
            Lockable::Order(OrderId::from(1)),
            serde_json::Value::Null,
            Actor::User(user(1)),
        )
        .unwrap();
    let lock_row = ledger.transactions().values().last().unwrap().id;

    let err = ledger
        .reverse_transaction(lock_row, admin(), "oops")
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::NotReversible {
            transaction_type: TransactionType::FundsLocked,
            ..
        }
    ));
}

#[test]
fn reversing_a_bonus_compensates_company_entries() {
    let mut ledger = Ledger::new();
    let bonus = ledger
        .credit_bonus(user(1), paise(10_000), "Referral bonus", admin())
        .unwrap();

    ledger
        .reverse_transaction(bonus, admin(), "referral fraud")
        .unwrap();

    let net = |kind: LedgerEntryKind| -> Paise {
        ledger
            .ledger_entries()
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.amount)
            .sum()
    };
    assert_eq!(net(LedgerEntryKind::BonusExpense), Paise::ZERO);
    assert_eq!(net(LedgerEntryKind::TdsPayable), Paise::ZERO);
    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, 0, 0)));
}

#[test]
fn deposit_past_the_largest_balance_is_refused() {
    let mut ledger = funded(1, i64::MAX);

    let err = ledger
        .deposit(user(1), paise(1), None, Actor::User(user(1)))
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::DomainError(DomainError::Overflow { total, amount })
            if total == paise(i64::MAX) && amount == paise(1)
    ));
    assert_eq!(ledger.wallet(user(1)), Some(&wallet(1, i64::MAX, 0)));
    assert_eq!(ledger.transactions().len(), 1);
}

#[test]
fn overflowing_commands_are_skipped() {
    let ledger = run(vec![
        WalletCommand::Deposit {
            user: user(1),
            amount: paise(i64::MAX),
        },
        WalletCommand::RequestWithdrawal {
            user: user(1),
            amount: paise(1_000),
        },
        WalletCommand::Deposit {
            user: user(1),
            amount: paise(1),
        },
        WalletCommand::Bonus {
            user: user(1),
            amount: paise(10_000),
        },
    ]);

    let expected = BTreeMap::from([(user(1), wallet(1, i64::MAX, 1_000))]);

    assert_eq!(ledger.wallets().as_map(), &expected);
    assert!(ledger.ledger_entries().is_empty());
}
