use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Actor, DomainError, FundLockId, OrderId, Paise, UserId, WithdrawalId};

/// A user's wallet. Invariant: `0 <= locked_balance <= balance`.
///
/// Fields are private; balances only move through the methods below, each of which
/// keeps the invariant or fails without touching the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    user_id: UserId,
    balance: Paise,
    locked_balance: Paise,
}

impl Wallet {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Paise::ZERO,
            locked_balance: Paise::ZERO,
        }
    }

    /// Rebuilds a wallet from stored counters, rejecting ones that break the invariant.
    pub fn from_parts(
        user_id: UserId,
        balance: Paise,
        locked_balance: Paise,
    ) -> Result<Self, DomainError> {
        if locked_balance.is_negative() || locked_balance > balance {
            return Err(DomainError::LockedExceedsBalance {
                balance,
                locked: locked_balance,
            });
        }
        Ok(Self {
            user_id,
            balance,
            locked_balance,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
    pub fn balance(&self) -> Paise {
        self.balance
    }
    pub fn locked_balance(&self) -> Paise {
        self.locked_balance
    }
    pub fn available(&self) -> Paise {
        self.balance - self.locked_balance
    }

    /// Fails unless `amount` is positive and covered by available funds.
    pub fn ensure_available(&self, amount: Paise) -> Result<(), DomainError> {
        ensure_positive(amount)?;
        if self.available() < amount {
            return Err(DomainError::InsufficientFunds {
                requested: amount,
                available: self.available(),
            });
        }
        Ok(())
    }

    /// Credit funds. Increases balance.
    pub(crate) fn credit(&mut self, amount: Paise) -> Result<(), DomainError> {
        ensure_positive(amount)?;
        self.balance = checked_add(self.balance, amount)?;
        Ok(())
    }
    /// Debit available funds. Locked funds are never spent.
    pub(crate) fn debit(&mut self, amount: Paise) -> Result<(), DomainError> {
        self.ensure_available(amount)?;
        self.balance = checked_sub(self.balance, amount)?;
        Ok(())
    }
    /// Move funds from available to locked. Balance stays the same.
    pub(crate) fn lock(&mut self, amount: Paise) -> Result<(), DomainError> {
        self.ensure_available(amount)?;
        self.locked_balance = checked_add(self.locked_balance, amount)?;
        Ok(())
    }
    /// Move funds from locked back to available. Balance stays the same.
    pub(crate) fn unlock(&mut self, amount: Paise) -> Result<(), DomainError> {
        ensure_positive(amount)?;
        if amount > self.locked_balance {
            return Err(DomainError::UnlockExceedsLocked {
                requested: amount,
                locked: self.locked_balance,
            });
        }
        self.locked_balance = checked_sub(self.locked_balance, amount)?;
        Ok(())
    }
}

fn checked_add(total: Paise, amount: Paise) -> Result<Paise, DomainError> {
    total
        .checked_add(amount)
        .ok_or(DomainError::Overflow { total, amount })
}

fn checked_sub(total: Paise, amount: Paise) -> Result<Paise, DomainError> {
    total
        .checked_sub(amount)
        .ok_or(DomainError::Overflow { total, amount })
}

fn ensure_positive(amount: Paise) -> Result<(), DomainError> {
    if !amount.is_positive() {
        return Err(DomainError::NonPositiveAmount(amount));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum LockPurpose {
    #[display("withdrawal")]
    Withdrawal,
    #[display("order")]
    Order,
}

/// The pending obligation a fund lock reserves money for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Lockable {
    #[display("withdrawal:{_0}")]
    Withdrawal(WithdrawalId),
    #[display("order:{_0}")]
    Order(OrderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    #[display("active")]
    Active,
    /// Terminal.
    #[display("released")]
    Released,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundLock {
    pub id: FundLockId,
    pub user_id: UserId,
    pub amount: Paise,
    pub purpose: LockPurpose,
    pub lockable: Lockable,
    pub metadata: serde_json::Value,
    pub status: LockStatus,
    pub locked_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    pub released_by: Option<Actor>,
    pub release_reason: Option<String>,
}

impl FundLock {
    pub fn is_active(&self) -> bool {
        self.status == LockStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    #[display("pending")]
    Pending,
    #[display("approved")]
    Approved,
    #[display("completed")]
    Completed,
    #[display("rejected")]
    Rejected,
    #[display("cancelled")]
    Cancelled,
}

impl WithdrawalStatus {
    /// Permitted workflow edges: pending -> approved | rejected | cancelled, approved -> completed.
    pub fn can_transition_to(self, next: WithdrawalStatus) -> bool {
        use WithdrawalStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) | (Approved, Completed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub user_id: UserId,
    pub amount: Paise,
    pub status: WithdrawalStatus,
    pub fund_lock_id: FundLockId,
    pub decided_by: Option<Actor>,
    pub decision_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
