use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AllocationId, BulkPurchaseId, EntityRef, LedgerEntryId, Paise, ProductId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[display("draft")]
    Draft,
    #[display("approved")]
    Approved,
    /// Inventory exists; product terms can no longer change.
    #[display("locked")]
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[display("company_listing")]
    CompanyListing,
    #[display("manual_entry")]
    ManualEntry,
}

/// Inventory acquired wholesale for later allocation to investors.
///
/// Financial terms are fixed at creation. Only `value_remaining`, `notes`, `admin_id`
/// and `updated_at` may change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPurchase {
    pub id: BulkPurchaseId,
    pub product_id: ProductId,
    pub admin_id: Option<UserId>,
    pub face_value_purchased: Paise,
    pub actual_cost_paid: Paise,
    pub discount_percentage: Decimal,
    pub extra_allocation_percentage: Decimal,
    pub total_value_received: Paise,
    pub value_remaining: Paise,
    pub seller_name: String,
    pub source_type: SourceType,
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BulkPurchase {
    /// Value already handed out to investors.
    pub fn allocated_value(&self) -> Paise {
        self.total_value_received - self.value_remaining
    }
}

/// Input for creating a bulk purchase. `value_remaining` starts equal to `total_value_received`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBulkPurchase {
    pub product_id: ProductId,
    pub admin_id: Option<UserId>,
    pub face_value_purchased: Paise,
    pub actual_cost_paid: Paise,
    pub discount_percentage: Decimal,
    pub extra_allocation_percentage: Decimal,
    pub total_value_received: Paise,
    pub seller_name: String,
    pub source_type: SourceType,
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub product_id: ProductId,
    pub bulk_purchase_id: BulkPurchaseId,
    pub user_id: UserId,
    pub value: Paise,
    pub is_reversed: bool,
    pub created_at: DateTime<Utc>,
    pub reversed_at: Option<DateTime<Utc>>,
    pub reversal_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    #[display("inventory_purchase")]
    InventoryPurchase,
    #[display("bonus_expense")]
    BonusExpense,
    #[display("tds_payable")]
    TdsPayable,
}

/// Company-books entry. Corrections are posted as new entries with a negated amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub kind: LedgerEntryKind,
    pub reference: EntityRef,
    pub amount: Paise,
    pub created_at: DateTime<Utc>,
}
