//! Serializes wallet state to CSV and reports to JSON.

use serde::Serialize;

use crate::{
    domain::{Paise, UserId, Wallet},
    ledger::Table,
};

/// Maps directly to the output columns: user, balance, locked, available.
#[derive(Debug, Serialize)]
struct OutputCsv {
    user: UserId,
    balance: Paise,
    locked: Paise,
    available: Paise,
}

pub fn print_wallets(
    wallets: &Table<UserId, Wallet>,
    writer: impl std::io::Write,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for wallet in wallets.values() {
        let output_csv = OutputCsv {
            user: wallet.user_id(),
            balance: wallet.balance(),
            locked: wallet.locked_balance(),
            available: wallet.available(),
        };
        wtr.serialize(output_csv)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_report<T: Serialize>(report: &T, mut writer: impl std::io::Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}
