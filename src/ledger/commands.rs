use tracing::warn;

use super::{Ledger, LedgerError};
use crate::domain::{Actor, Paise, UserId, WithdrawalId};

/// Wallet-facing operations that can be fed to the ledger as a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCommand {
    Deposit { user: UserId, amount: Paise },
    Withdraw { user: UserId, amount: Paise },
    Bonus { user: UserId, amount: Paise },
    RequestWithdrawal { user: UserId, amount: Paise },
    ApproveWithdrawal { withdrawal: WithdrawalId },
    RejectWithdrawal { withdrawal: WithdrawalId },
    CancelWithdrawal { withdrawal: WithdrawalId },
    CompleteWithdrawal { withdrawal: WithdrawalId },
}

impl Ledger {
    /// Applies one command. User-initiated commands act as that user, admin decisions as
    /// `admin`.
    pub fn apply(&mut self, command: WalletCommand, admin: Actor) -> Result<(), LedgerError> {
        match command {
            WalletCommand::Deposit { user, amount } => {
                self.deposit(user, amount, None, Actor::User(user))?;
            }
            WalletCommand::Withdraw { user, amount } => {
                self.withdraw(user, amount, None, Actor::User(user))?;
            }
            WalletCommand::Bonus { user, amount } => {
                self.credit_bonus(user, amount, "Bonus credit", admin)?;
            }
            WalletCommand::RequestWithdrawal { user, amount } => {
                self.request_withdrawal(user, amount, Actor::User(user))?;
            }
            WalletCommand::ApproveWithdrawal { withdrawal } => {
                self.approve_withdrawal(withdrawal, admin)?;
            }
            WalletCommand::RejectWithdrawal { withdrawal } => {
                self.reject_withdrawal(withdrawal, admin, "rejected by admin")?;
            }
            WalletCommand::CancelWithdrawal { withdrawal } => {
                let owner = self
                    .withdrawal(withdrawal)
                    .map(|request| Actor::User(request.user_id))
                    .ok_or(LedgerError::WithdrawalNotFound(withdrawal))?;
                self.cancel_withdrawal(withdrawal, owner, "cancelled by user")?;
            }
            WalletCommand::CompleteWithdrawal { withdrawal } => {
                self.complete_withdrawal(withdrawal, admin)?;
            }
        }
        Ok(())
    }

    /// Applies every command in order. Failing commands are logged and skipped.
    pub fn process_commands(&mut self, commands: impl Iterator<Item = WalletCommand>, admin: Actor) {
        for command in commands {
            if let Err(e) = self.apply(command, admin) {
                warn!("Error processing command: {e}");
            }
        }
    }
}
