//! CSV and JSON input.
//!
//! Wallet commands are parsed in two stages:
//! 1. Serde deserializes each CSV row into a flat `CsvCommand`.
//! 2. `TryFrom<CsvCommand>` converts it into a strongly-typed `WalletCommand`.
//!
//! Malformed rows or rows missing a required column are logged and skipped.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    domain::{DisclosureSnapshot, Paise, UserId, WithdrawalId},
    ledger::WalletCommand,
};

#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CommandType {
    Deposit,
    Withdraw,
    Bonus,
    RequestWithdrawal,
    ApproveWithdrawal,
    RejectWithdrawal,
    CancelWithdrawal,
    CompleteWithdrawal,
}

/// Flat representation of a single CSV row. Columns that a command type does not use are
/// left empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvCommand {
    r#type: CommandType,
    user: Option<UserId>,
    amount: Option<Paise>,
    withdrawal: Option<WithdrawalId>,
}

/// Returns an iterator that lazily deserializes CSV rows into wallet commands,
/// skipping any rows that fail to parse or convert.
pub fn deserialize_csv<D: std::io::Read>(
    reader: &mut csv::Reader<D>,
) -> impl Iterator<Item = WalletCommand> {
    reader
        .deserialize::<CsvCommand>()
        .filter_map(|result| match result {
            Ok(command) => Some(command),
            Err(e) => {
                warn!("Failed to parse command: {e}");
                None
            }
        })
        .filter_map(|csv_command| match WalletCommand::try_from(csv_command) {
            Ok(command) => Some(command),
            Err(e) => {
                warn!("Failed to convert CsvCommand to WalletCommand: {e}");
                None
            }
        })
}

/// Reads persisted disclosure snapshots from a JSON array.
pub fn deserialize_snapshots<R: std::io::Read>(
    reader: R,
) -> Result<Vec<DisclosureSnapshot>, serde_json::Error> {
    serde_json::from_reader(reader)
}

#[derive(Debug, thiserror::Error)]
enum IntoCommandError {
    #[error("Missing user for {0:?}")]
    MissingUser(CommandType),
    #[error("Missing amount for {0:?}")]
    MissingAmount(CommandType),
    #[error("Missing withdrawal id for {0:?}")]
    MissingWithdrawal(CommandType),
}

impl TryFrom<CsvCommand> for WalletCommand {
    type Error = IntoCommandError;

    fn try_from(value: CsvCommand) -> Result<Self, Self::Error> {
        let kind = value.r#type;
        let user = || value.user.ok_or(IntoCommandError::MissingUser(kind));
        let amount = || value.amount.ok_or(IntoCommandError::MissingAmount(kind));
        let withdrawal = || {
            value
                .withdrawal
                .ok_or(IntoCommandError::MissingWithdrawal(kind))
        };

        Ok(match kind {
            CommandType::Deposit => WalletCommand::Deposit {
                user: user()?,
                amount: amount()?,
            },
            CommandType::Withdraw => WalletCommand::Withdraw {
                user: user()?,
                amount: amount()?,
            },
            CommandType::Bonus => WalletCommand::Bonus {
                user: user()?,
                amount: amount()?,
            },
            CommandType::RequestWithdrawal => WalletCommand::RequestWithdrawal {
                user: user()?,
                amount: amount()?,
            },
            CommandType::ApproveWithdrawal => WalletCommand::ApproveWithdrawal {
                withdrawal: withdrawal()?,
            },
            CommandType::RejectWithdrawal => WalletCommand::RejectWithdrawal {
                withdrawal: withdrawal()?,
            },
            CommandType::CancelWithdrawal => WalletCommand::CancelWithdrawal {
                withdrawal: withdrawal()?,
            },
            CommandType::CompleteWithdrawal => WalletCommand::CompleteWithdrawal {
                withdrawal: withdrawal()?,
            },
        })
    }
}
