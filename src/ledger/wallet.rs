use chrono::Utc;
use tracing::{info, warn};

use super::{Ledger, LedgerError, audit_values, guards};
use crate::domain::{
    Actor, AuditAction, DomainError, EntityRef, FundLock, FundLockId, LedgerEntry, LedgerEntryKind,
    LockPurpose, LockStatus, Lockable, Paise, TransactionId, TransactionRecord, TransactionType,
    UserId, Wallet,
};

/// Result of releasing a fund lock. Releasing twice is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released(TransactionId),
    AlreadyReleased,
}

/// What a new ledger row records, apart from the balances it is written against.
pub(crate) struct Posting {
    pub transaction_type: TransactionType,
    pub amount: Paise,
    pub tds_deducted: Paise,
    pub description: String,
    pub reference: Option<EntityRef>,
}

impl Posting {
    pub(crate) fn new(transaction_type: TransactionType, amount: Paise, description: String) -> Self {
        Self {
            transaction_type,
            amount,
            tds_deducted: Paise::ZERO,
            description,
            reference: None,
        }
    }
    pub(crate) fn reference(mut self, reference: EntityRef) -> Self {
        self.reference = Some(reference);
        self
    }
}

impl Ledger {
    /// Returns the user's wallet, creating an empty one on first use.
    pub fn open_wallet(&mut self, user: UserId) -> &Wallet {
        self.wallets.get_or_insert_with(user, || Wallet::new(user))
    }

    fn existing_wallet(&self, user: UserId) -> Result<Wallet, LedgerError> {
        self.wallets
            .get(&user)
            .cloned()
            .ok_or(LedgerError::WalletNotFound(user))
    }

    /// Builds the ledger row for moving `before` to `after`.
    fn build_transaction(
        &mut self,
        before: &Wallet,
        after: &Wallet,
        posting: Posting,
    ) -> TransactionRecord {
        let now = Utc::now();
        TransactionRecord {
            id: self.sequences.transactions.next(),
            user_id: after.user_id(),
            transaction_type: posting.transaction_type,
            amount: posting.amount,
            balance_before: before.balance(),
            balance_after: after.balance(),
            tds_deducted: posting.tds_deducted,
            description: posting.description,
            reference: posting.reference,
            is_reversed: false,
            reversed_by_transaction_id: None,
            reversed_at: None,
            reversal_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Writes a wallet together with the ledger row that explains the change.
    fn commit(&mut self, wallet: Wallet, record: TransactionRecord, actor: Actor) -> TransactionId {
        let id = record.id;
        info!(
            target: "audit",
            transaction = %id,
            user = %record.user_id,
            kind = %record.transaction_type,
            amount = %record.amount,
            balance_before = %record.balance_before,
            balance_after = %record.balance_after,
            actor = %actor,
            "Transaction created"
        );
        self.wallets.insert(wallet.user_id(), wallet);
        self.transactions.insert(id, record);
        id
    }

    /// Validates `change` against a copy of the wallet and commits it with its ledger row.
    pub(crate) fn post(
        &mut self,
        before: Wallet,
        change: impl FnOnce(&mut Wallet) -> Result<(), DomainError>,
        posting: Posting,
        actor: Actor,
    ) -> Result<TransactionId, LedgerError> {
        let mut after = before.clone();
        change(&mut after)?;
        let record = self.build_transaction(&before, &after, posting);
        Ok(self.commit(after, record, actor))
    }

    pub fn deposit(
        &mut self,
        user: UserId,
        amount: Paise,
        reference: Option<EntityRef>,
        actor: Actor,
    ) -> Result<TransactionId, LedgerError> {
        let before = self
            .wallets
            .get(&user)
            .cloned()
            .unwrap_or_else(|| Wallet::new(user));
        let mut posting = Posting::new(
            TransactionType::Deposit,
            amount,
            format!("Deposit of {amount} paise"),
        );
        posting.reference = reference;
        self.post(before, |wallet| wallet.credit(amount), posting, actor)
    }

    /// Debits available funds. Locked funds cannot be withdrawn this way.
    pub fn withdraw(
        &mut self,
        user: UserId,
        amount: Paise,
        reference: Option<EntityRef>,
        actor: Actor,
    ) -> Result<TransactionId, LedgerError> {
        let before = self.existing_wallet(user)?;
        let mut posting = Posting::new(
            TransactionType::Withdrawal,
            amount,
            format!("Withdrawal of {amount} paise"),
        );
        posting.reference = reference;
        self.post(before, |wallet| wallet.debit(amount), posting, actor)
    }

    /// Credits a bonus net of TDS at the configured rate and books the gross expense and
    /// the withheld tax in the company ledger.
    pub fn credit_bonus(
        &mut self,
        user: UserId,
        gross: Paise,
        description: &str,
        actor: Actor,
    ) -> Result<TransactionId, LedgerError> {
        if !gross.is_positive() {
            return Err(DomainError::NonPositiveAmount(gross).into());
        }
        let tds = gross.percent(self.config.bonus_tds_percentage);
        let net = gross - tds;
        let before = self
            .wallets
            .get(&user)
            .cloned()
            .unwrap_or_else(|| Wallet::new(user));
        let mut posting = Posting::new(
            TransactionType::Bonus,
            net,
            format!("{description} (gross {gross}, TDS {tds})"),
        );
        posting.tds_deducted = tds;

        let id = self.post(before, |wallet| wallet.credit(net), posting, actor)?;
        self.book_entry(LedgerEntryKind::BonusExpense, EntityRef::Transaction(id), gross);
        if tds.is_positive() {
            self.book_entry(LedgerEntryKind::TdsPayable, EntityRef::Transaction(id), tds);
        }
        Ok(id)
    }

    pub(crate) fn book_entry(&mut self, kind: LedgerEntryKind, reference: EntityRef, amount: Paise) {
        let id = self.sequences.ledger_entries.next();
        self.ledger_entries.push(LedgerEntry {
            id,
            kind,
            reference,
            amount,
            created_at: Utc::now(),
        });
    }

    /// Reserves `amount` of the user's available funds against `lockable`.
    pub fn lock_funds(
        &mut self,
        user: UserId,
        amount: Paise,
        purpose: LockPurpose,
        lockable: Lockable,
        metadata: serde_json::Value,
        actor: Actor,
    ) -> Result<FundLockId, LedgerError> {
        let before = self.existing_wallet(user)?;
        before.ensure_available(amount)?;

        let lock_id: FundLockId = self.sequences.fund_locks.next();
        let posting = Posting::new(
            TransactionType::FundsLocked,
            amount,
            format!("Funds locked for {purpose} ({lockable})"),
        )
        .reference(EntityRef::FundLock(lock_id));
        self.post(before, |wallet| wallet.lock(amount), posting, actor)?;

        self.fund_locks.insert(
            lock_id,
            FundLock {
                id: lock_id,
                user_id: user,
                amount,
                purpose,
                lockable,
                metadata,
                status: LockStatus::Active,
                locked_at: Utc::now(),
                released_at: None,
                released_by: None,
                release_reason: None,
            },
        );
        info!(lock = %lock_id, user = %user, amount = %amount, lockable = %lockable, "Funds locked");
        Ok(lock_id)
    }

    /// Returns the locked amount to the available balance and closes the lock.
    pub fn release(
        &mut self,
        lock_id: FundLockId,
        actor: Actor,
        reason: &str,
    ) -> Result<ReleaseOutcome, LedgerError> {
        let mut lock = self
            .fund_locks
            .get(&lock_id)
            .ok_or(LedgerError::FundLockNotFound(lock_id))?
            .clone();
        if !lock.is_active() {
            warn!(lock = %lock_id, actor = %actor, "Fund lock already released, ignoring");
            return Ok(ReleaseOutcome::AlreadyReleased);
        }

        let before = self.existing_wallet(lock.user_id)?;
        let amount = lock.amount;
        let posting = Posting::new(
            TransactionType::FundsReleased,
            amount,
            format!("Funds released ({reason})"),
        )
        .reference(EntityRef::FundLock(lock_id));
        let transaction = self.post(before, |wallet| wallet.unlock(amount), posting, actor)?;

        lock.status = LockStatus::Released;
        lock.released_at = Some(Utc::now());
        lock.released_by = Some(actor);
        lock.release_reason = Some(reason.to_owned());
        self.fund_locks.insert(lock_id, lock);
        info!(lock = %lock_id, actor = %actor, reason, "Funds released");
        Ok(ReleaseOutcome::Released(transaction))
    }

    /// Posts a compensating transaction that undoes the balance effect of `id` and links the
    /// two rows. The original amounts are never touched.
    pub fn reverse_transaction(
        &mut self,
        id: TransactionId,
        actor: Actor,
        reason: &str,
    ) -> Result<TransactionId, LedgerError> {
        let original = self
            .transactions
            .get(&id)
            .ok_or(LedgerError::TransactionNotFound(id))?
            .clone();
        if original.is_reversed {
            return Err(LedgerError::AlreadyReversed(id));
        }
        if !original.transaction_type.is_reversible() {
            return Err(LedgerError::NotReversible {
                id,
                transaction_type: original.transaction_type,
            });
        }

        let before = self.existing_wallet(original.user_id)?;
        let delta = original.balance_delta();
        let mut after = before.clone();
        if delta.is_positive() {
            after.debit(delta)?;
        } else {
            after.credit(-delta)?;
        }

        let record = self.build_transaction(
            &before,
            &after,
            Posting::new(
                TransactionType::Reversal,
                delta.abs(),
                format!("Reversal of transaction {id}: {reason}"),
            )
            .reference(EntityRef::Transaction(id)),
        );
        let now = Utc::now();
        let mut reversed = original.clone();
        reversed.is_reversed = true;
        reversed.reversed_by_transaction_id = Some(record.id);
        reversed.reversed_at = Some(now);
        reversed.reversal_reason = Some(reason.to_owned());
        reversed.updated_at = now;
        guards::check_transaction_update(&original, &reversed)?;

        let changed = guards::transaction_changes(&original, &reversed);
        let reversal = self.commit(after, record, actor);
        self.record_audit(
            actor,
            AuditAction::Updated,
            EntityRef::Transaction(id),
            audit_values(&original, Some(&changed)),
            audit_values(&reversed, Some(&changed)),
            format!("Transaction {id} reversed by {reversal}"),
        );
        self.transactions.insert(id, reversed);

        // Company-book entries tied to the original row are compensated as well.
        let compensations: Vec<_> = self
            .ledger_entries
            .iter()
            .filter(|entry| entry.reference == EntityRef::Transaction(id))
            .map(|entry| (entry.kind, -entry.amount))
            .collect();
        for (kind, amount) in compensations {
            self.book_entry(kind, EntityRef::Transaction(reversal), amount);
        }
        Ok(reversal)
    }
}
