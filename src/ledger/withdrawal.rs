//! Withdrawal requests: the main user of fund locks.
//!
//! A request locks funds while it waits for an admin. Approval releases the lock and debits
//! the wallet; rejection or cancellation only releases it.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::{Ledger, LedgerError, ReleaseOutcome};
use crate::domain::{
    Actor, EntityRef, LockPurpose, Lockable, Paise, UserId, WithdrawalId, WithdrawalRequest,
    WithdrawalStatus,
};

impl Ledger {
    pub fn request_withdrawal(
        &mut self,
        user: UserId,
        amount: Paise,
        actor: Actor,
    ) -> Result<WithdrawalId, LedgerError> {
        // The id is only taken once the lock succeeds, so a refused request leaves no gap.
        let id: WithdrawalId = self.sequences.withdrawals.peek();
        let fund_lock_id = self.lock_funds(
            user,
            amount,
            LockPurpose::Withdrawal,
            Lockable::Withdrawal(id),
            json!({ "withdrawal_id": id }),
            actor,
        )?;
        let _: WithdrawalId = self.sequences.withdrawals.next();

        let now = Utc::now();
        self.withdrawals.insert(
            id,
            WithdrawalRequest {
                id,
                user_id: user,
                amount,
                status: WithdrawalStatus::Pending,
                fund_lock_id,
                decided_by: None,
                decision_reason: None,
                created_at: now,
                updated_at: now,
            },
        );
        info!(withdrawal = %id, user = %user, amount = %amount, "Withdrawal requested");
        Ok(id)
    }

    fn withdrawal_transition(
        &self,
        id: WithdrawalId,
        next: WithdrawalStatus,
    ) -> Result<WithdrawalRequest, LedgerError> {
        let request = self
            .withdrawals
            .get(&id)
            .ok_or(LedgerError::WithdrawalNotFound(id))?;
        if !request.status.can_transition_to(next) {
            return Err(LedgerError::InvalidWithdrawalTransition {
                id,
                from: request.status,
                to: next,
            });
        }
        Ok(request.clone())
    }

    fn store_decision(
        &mut self,
        mut request: WithdrawalRequest,
        status: WithdrawalStatus,
        actor: Actor,
        reason: Option<&str>,
    ) {
        info!(withdrawal = %request.id, from = %request.status, to = %status, actor = %actor, "Withdrawal status changed");
        request.status = status;
        request.decided_by = Some(actor);
        request.decision_reason = reason.map(str::to_owned);
        request.updated_at = Utc::now();
        self.withdrawals.insert(request.id, request);
    }

    /// Releases the lock and debits the wallet by the requested amount.
    pub fn approve_withdrawal(&mut self, id: WithdrawalId, actor: Actor) -> Result<(), LedgerError> {
        let request = self.withdrawal_transition(id, WithdrawalStatus::Approved)?;
        let lock = self
            .fund_locks
            .get(&request.fund_lock_id)
            .ok_or(LedgerError::FundLockNotFound(request.fund_lock_id))?;
        if !lock.is_active() {
            return Err(LedgerError::FundLockNotActive(lock.id));
        }

        // Dry run both wallet moves so a failure cannot leave the lock released without the debit.
        let mut wallet = self
            .wallets
            .get(&request.user_id)
            .cloned()
            .ok_or(LedgerError::WalletNotFound(request.user_id))?;
        wallet.unlock(lock.amount)?;
        wallet.debit(request.amount)?;

        self.release(request.fund_lock_id, actor, "withdrawal approved")?;
        self.withdraw(
            request.user_id,
            request.amount,
            Some(EntityRef::Withdrawal(id)),
            actor,
        )?;
        self.store_decision(request, WithdrawalStatus::Approved, actor, None);
        Ok(())
    }

    /// Payout confirmed. No money moves.
    pub fn complete_withdrawal(&mut self, id: WithdrawalId, actor: Actor) -> Result<(), LedgerError> {
        let request = self.withdrawal_transition(id, WithdrawalStatus::Completed)?;
        self.store_decision(request, WithdrawalStatus::Completed, actor, None);
        Ok(())
    }

    pub fn reject_withdrawal(
        &mut self,
        id: WithdrawalId,
        actor: Actor,
        reason: &str,
    ) -> Result<ReleaseOutcome, LedgerError> {
        self.close_pending_withdrawal(id, WithdrawalStatus::Rejected, actor, reason)
    }

    pub fn cancel_withdrawal(
        &mut self,
        id: WithdrawalId,
        actor: Actor,
        reason: &str,
    ) -> Result<ReleaseOutcome, LedgerError> {
        self.close_pending_withdrawal(id, WithdrawalStatus::Cancelled, actor, reason)
    }

    fn close_pending_withdrawal(
        &mut self,
        id: WithdrawalId,
        status: WithdrawalStatus,
        actor: Actor,
        reason: &str,
    ) -> Result<ReleaseOutcome, LedgerError> {
        let request = self.withdrawal_transition(id, status)?;
        let outcome = self.release(request.fund_lock_id, actor, &format!("withdrawal {status}"))?;
        self.store_decision(request, status, actor, Some(reason));
        Ok(outcome)
    }
}
