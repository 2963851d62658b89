use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AllocationId, BulkPurchaseId, CompanyId, DisclosureVersionId, FundLockId, OrderId, Paise,
    ProductId, TransactionId, UserId, WithdrawalId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[display("deposit")]
    Deposit,
    #[display("withdrawal")]
    Withdrawal,
    #[display("funds_locked")]
    FundsLocked,
    #[display("funds_released")]
    FundsReleased,
    #[display("bonus")]
    Bonus,
    #[display("reversal")]
    Reversal,
}

impl TransactionType {
    /// Only rows that moved the balance can be compensated by a reversal.
    pub fn is_reversible(self) -> bool {
        matches!(
            self,
            TransactionType::Deposit | TransactionType::Withdrawal | TransactionType::Bonus
        )
    }
}

/// Typed pointer to another ledger entity, used for transaction references and audit subjects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    #[display("transaction:{_0}")]
    Transaction(TransactionId),
    #[display("fund_lock:{_0}")]
    FundLock(FundLockId),
    #[display("withdrawal:{_0}")]
    Withdrawal(WithdrawalId),
    #[display("order:{_0}")]
    Order(OrderId),
    #[display("product:{_0}")]
    Product(ProductId),
    #[display("bulk_purchase:{_0}")]
    BulkPurchase(BulkPurchaseId),
    #[display("allocation:{_0}")]
    Allocation(AllocationId),
    #[display("company:{_0}")]
    Company(CompanyId),
    #[display("disclosure_version:{_0}")]
    DisclosureVersion(DisclosureVersionId),
    #[display("external:{_0}")]
    External(String),
}

/// Append-only ledger row. After creation only the reversal linkage may be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub user_id: UserId,
    pub transaction_type: TransactionType,
    pub amount: Paise,
    pub balance_before: Paise,
    pub balance_after: Paise,
    pub tds_deducted: Paise,
    pub description: String,
    pub reference: Option<EntityRef>,
    pub is_reversed: bool,
    pub reversed_by_transaction_id: Option<TransactionId>,
    pub reversed_at: Option<DateTime<Utc>>,
    pub reversal_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Signed effect of this row on the wallet balance.
    pub fn balance_delta(&self) -> Paise {
        self.balance_after - self.balance_before
    }
}
