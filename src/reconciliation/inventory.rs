use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    domain::{BulkPurchaseId, EntityRef, LedgerEntryKind, Paise, ProductId},
    ledger::{Ledger, LedgerError},
};

/// Conservation check for one product: `allocated + remaining == total_received`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductConservation {
    pub product_id: ProductId,
    pub total_received: Paise,
    pub allocated: Paise,
    pub remaining: Paise,
    /// `allocated + remaining - total_received`. Zero when conserved.
    pub discrepancy: Paise,
    pub is_conserved: bool,
}

/// Booked `inventory_purchase` entries against the cost recorded on bulk purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerCostCheck {
    pub ledger_total: Paise,
    pub purchase_cost_total: Paise,
    pub difference: Paise,
    pub tolerance: Paise,
    pub is_within_tolerance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub scope: Option<ProductId>,
    pub products: Vec<ProductConservation>,
    pub cost_check: LedgerCostCheck,
}

impl InventoryReport {
    pub fn is_clean(&self) -> bool {
        self.products.iter().all(|product| product.is_conserved)
            && self.cost_check.is_within_tolerance
    }

    pub fn mismatched_products(&self) -> impl Iterator<Item = &ProductConservation> {
        self.products.iter().filter(|product| !product.is_conserved)
    }
}

/// Recomputes the conservation invariant for one product. Tolerance is zero.
pub fn check_product(ledger: &Ledger, product: ProductId) -> Result<ProductConservation, LedgerError> {
    if ledger.product(product).is_none() {
        return Err(LedgerError::ProductNotFound(product));
    }
    let purchases = || {
        ledger
            .bulk_purchases()
            .values()
            .filter(move |purchase| purchase.product_id == product)
    };
    let total_received = Paise::try_sum(purchases().map(|purchase| purchase.total_value_received))?;
    let remaining = Paise::try_sum(purchases().map(|purchase| purchase.value_remaining))?;
    let allocated = Paise::try_sum(
        ledger
            .allocations()
            .values()
            .filter(|allocation| allocation.product_id == product && !allocation.is_reversed)
            .map(|allocation| allocation.value),
    )?;
    let discrepancy = Paise::try_sum([allocated, remaining, -total_received])?;

    Ok(ProductConservation {
        product_id: product,
        total_received,
        allocated,
        remaining,
        discrepancy,
        is_conserved: discrepancy == Paise::ZERO,
    })
}

/// Runs the conservation check for one product, or every product when `scope` is `None`,
/// plus the booked-cost comparison over the same purchases.
pub fn reconcile_inventory(
    ledger: &Ledger,
    scope: Option<ProductId>,
    tolerance: Paise,
) -> Result<InventoryReport, LedgerError> {
    let products = match scope {
        Some(product) => vec![check_product(ledger, product)?],
        None => ledger
            .products()
            .as_map()
            .keys()
            .map(|product| check_product(ledger, *product))
            .collect::<Result<Vec<_>, _>>()?,
    };

    let in_scope = |product: ProductId| scope.is_none_or(|wanted| wanted == product);
    let purchases: BTreeSet<BulkPurchaseId> = ledger
        .bulk_purchases()
        .values()
        .filter(|purchase| in_scope(purchase.product_id))
        .map(|purchase| purchase.id)
        .collect();
    let purchase_cost_total = Paise::try_sum(
        ledger
            .bulk_purchases()
            .values()
            .filter(|purchase| purchases.contains(&purchase.id))
            .map(|purchase| purchase.actual_cost_paid),
    )?;
    // Entries of deleted purchases net to zero, so only live purchases matter when scoped.
    let ledger_total = Paise::try_sum(
        ledger
            .ledger_entries()
            .iter()
            .filter(|entry| entry.kind == LedgerEntryKind::InventoryPurchase)
            .filter(|entry| match &entry.reference {
                EntityRef::BulkPurchase(id) => scope.is_none() || purchases.contains(id),
                _ => scope.is_none(),
            })
            .map(|entry| entry.amount),
    )?;
    let difference = Paise::try_sum([ledger_total, -purchase_cost_total])?;

    Ok(InventoryReport {
        scope,
        products,
        cost_check: LedgerCostCheck {
            ledger_total,
            purchase_cost_total,
            difference,
            tolerance,
            is_within_tolerance: difference.abs() <= tolerance,
        },
    })
}
