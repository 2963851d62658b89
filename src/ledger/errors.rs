use crate::domain::{
    AllocationId, BulkPurchaseId, CompanyId, DomainError, FundLockId, Paise, ProductId,
    ProductStatus, TransactionId, TransactionType, UserId, WithdrawalId, WithdrawalStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Wallet not found for user {0}")]
    WalletNotFound(UserId),
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),
    #[error("Fund lock {0} not found")]
    FundLockNotFound(FundLockId),
    #[error("Fund lock {0} is not active")]
    FundLockNotActive(FundLockId),
    #[error("Withdrawal {0} not found")]
    WithdrawalNotFound(WithdrawalId),
    #[error("Withdrawal {id} cannot move from {from} to {to}")]
    InvalidWithdrawalTransition {
        id: WithdrawalId,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },
    #[error("Transaction {0} is already reversed")]
    AlreadyReversed(TransactionId),
    #[error("Transaction {id} of type {transaction_type} cannot be reversed")]
    NotReversible {
        id: TransactionId,
        transaction_type: TransactionType,
    },
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),
    #[error("Product {id} cannot move from {from} to {to}")]
    InvalidProductTransition {
        id: ProductId,
        from: ProductStatus,
        to: ProductStatus,
    },
    #[error("Bulk purchase {0} not found")]
    BulkPurchaseNotFound(BulkPurchaseId),
    #[error("Invalid bulk purchase: {0}")]
    InvalidBulkPurchase(String),
    #[error("Insufficient inventory for product {product}: requested {requested}, remaining {remaining}")]
    InsufficientInventory {
        product: ProductId,
        requested: Paise,
        remaining: Paise,
    },
    #[error("Allocation {0} not found")]
    AllocationNotFound(AllocationId),
    #[error("Allocation {0} is already reversed")]
    AllocationAlreadyReversed(AllocationId),
    #[error("Company {0} not found")]
    CompanyNotFound(CompanyId),
    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] InvariantViolation),
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
}

/// A guard refused a write that would break an immutability or range invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Transaction {id} is immutable, attempted to change {fields:?}")]
    ImmutableTransaction {
        id: TransactionId,
        fields: Vec<&'static str>,
    },
    #[error("Reversal of transaction {0} is final")]
    ReversalIsFinal(TransactionId),
    #[error("Transaction {0} cannot be deleted, post a compensating transaction instead")]
    TransactionDeletion(TransactionId),
    #[error("Bulk purchase {id} has immutable fields {fields:?}")]
    ImmutableBulkPurchase {
        id: BulkPurchaseId,
        fields: Vec<&'static str>,
    },
    #[error(
        "Bulk purchase {id} value_remaining {value_remaining} outside 0..={total_value_received}"
    )]
    ValueRemainingOutOfRange {
        id: BulkPurchaseId,
        value_remaining: Paise,
        total_value_received: Paise,
    },
    #[error("Bulk purchase {id} cannot be deleted, {allocated} already allocated")]
    AllocatedBulkPurchaseDeletion {
        id: BulkPurchaseId,
        allocated: Paise,
    },
    #[error("Company {0} is frozen")]
    FrozenCompany(CompanyId),
}
