//! Products, bulk purchases and allocations.
//!
//! Allocations draw value out of bulk purchases (`value_remaining`) so that, per product,
//! allocated plus remaining always equals the total received.

use chrono::Utc;
use tracing::info;

use super::{Ledger, LedgerError, audit_values, guards};
use crate::domain::{
    Actor, Allocation, AllocationId, AuditAction, BulkPurchase, BulkPurchaseId, DomainError,
    EntityRef, LedgerEntryKind, NewBulkPurchase, Paise, Product, ProductId, ProductStatus, UserId,
};

impl Ledger {
    pub fn create_product(&mut self, name: &str, actor: Actor) -> ProductId {
        let id: ProductId = self.sequences.products.next();
        let now = Utc::now();
        let product = Product {
            id,
            name: name.to_owned(),
            status: ProductStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.record_audit(
            actor,
            AuditAction::Created,
            EntityRef::Product(id),
            serde_json::Value::Null,
            audit_values(&product, None),
            format!("Product {name} created"),
        );
        self.products.insert(id, product);
        id
    }

    pub fn approve_product(&mut self, id: ProductId, actor: Actor) -> Result<(), LedgerError> {
        self.set_product_status(id, ProductStatus::Approved, actor)
    }

    fn set_product_status(
        &mut self,
        id: ProductId,
        status: ProductStatus,
        actor: Actor,
    ) -> Result<(), LedgerError> {
        let mut product = self
            .products
            .get(&id)
            .ok_or(LedgerError::ProductNotFound(id))?
            .clone();
        let allowed = matches!(
            (product.status, status),
            (ProductStatus::Draft, ProductStatus::Approved)
                | (ProductStatus::Approved, ProductStatus::Locked)
        );
        if !allowed {
            return Err(LedgerError::InvalidProductTransition {
                id,
                from: product.status,
                to: status,
            });
        }
        let old = audit_values(&product, Some(&["status"]));
        product.status = status;
        product.updated_at = Utc::now();
        self.record_audit(
            actor,
            AuditAction::Updated,
            EntityRef::Product(id),
            old,
            audit_values(&product, Some(&["status"])),
            format!("Product {id} is now {status}"),
        );
        info!(product = %id, status = %status, actor = %actor, "Product status changed");
        self.products.insert(id, product);
        Ok(())
    }

    /// Records newly acquired inventory and books its cost.
    ///
    /// The first purchase for an approved product locks that product.
    pub fn create_bulk_purchase(
        &mut self,
        new: NewBulkPurchase,
        actor: Actor,
    ) -> Result<BulkPurchaseId, LedgerError> {
        let product = self
            .products
            .get(&new.product_id)
            .ok_or(LedgerError::ProductNotFound(new.product_id))?;
        for amount in [
            new.face_value_purchased,
            new.actual_cost_paid,
            new.total_value_received,
        ] {
            if !amount.is_positive() {
                return Err(DomainError::NonPositiveAmount(amount).into());
            }
        }
        if new.discount_percentage.is_sign_negative()
            || new.extra_allocation_percentage.is_sign_negative()
        {
            return Err(LedgerError::InvalidBulkPurchase(
                "percentages must not be negative".to_owned(),
            ));
        }
        let lock_product = product.status == ProductStatus::Approved
            && !self
                .bulk_purchases
                .values()
                .any(|purchase| purchase.product_id == new.product_id);

        let id: BulkPurchaseId = self.sequences.bulk_purchases.next();
        let now = Utc::now();
        let purchase = BulkPurchase {
            id,
            product_id: new.product_id,
            admin_id: new.admin_id,
            face_value_purchased: new.face_value_purchased,
            actual_cost_paid: new.actual_cost_paid,
            discount_percentage: new.discount_percentage,
            extra_allocation_percentage: new.extra_allocation_percentage,
            total_value_received: new.total_value_received,
            value_remaining: new.total_value_received,
            seller_name: new.seller_name,
            source_type: new.source_type,
            purchase_date: new.purchase_date,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        self.book_entry(
            LedgerEntryKind::InventoryPurchase,
            EntityRef::BulkPurchase(id),
            purchase.actual_cost_paid,
        );
        self.record_audit(
            actor,
            AuditAction::Created,
            EntityRef::BulkPurchase(id),
            serde_json::Value::Null,
            audit_values(&purchase, None),
            format!("Bulk purchase {id} created"),
        );
        info!(
            target: "audit",
            bulk_purchase = %id,
            product = %purchase.product_id,
            total_value_received = %purchase.total_value_received,
            actual_cost_paid = %purchase.actual_cost_paid,
            actor = %actor,
            "Bulk purchase created"
        );
        let product_id = purchase.product_id;
        self.bulk_purchases.insert(id, purchase);

        if lock_product {
            self.set_product_status(product_id, ProductStatus::Locked, actor)?;
        }
        Ok(id)
    }

    /// Applies `mutate` to a copy of the purchase and writes it back only if no immutable
    /// field changed and `value_remaining` stays within `0..=total_value_received`.
    pub fn update_bulk_purchase(
        &mut self,
        id: BulkPurchaseId,
        actor: Actor,
        mutate: impl FnOnce(&mut BulkPurchase),
    ) -> Result<(), LedgerError> {
        let old = self
            .bulk_purchases
            .get(&id)
            .ok_or(LedgerError::BulkPurchaseNotFound(id))?
            .clone();
        let mut new = old.clone();
        mutate(&mut new);
        self.write_bulk_purchase(old, new, actor)
    }

    fn write_bulk_purchase(
        &mut self,
        old: BulkPurchase,
        mut new: BulkPurchase,
        actor: Actor,
    ) -> Result<(), LedgerError> {
        let changed = guards::bulk_purchase_changes(&old, &new);
        if changed.is_empty() {
            return Ok(());
        }
        if let Err(violation) = guards::check_bulk_purchase_update(&old, &new) {
            return self.reject(
                actor,
                AuditAction::UpdateRejected,
                EntityRef::BulkPurchase(old.id),
                audit_values(&old, Some(&changed)),
                audit_values(&new, Some(&changed)),
                violation,
            );
        }
        if !changed.contains(&"updated_at") {
            new.updated_at = Utc::now();
        }
        self.record_audit(
            actor,
            AuditAction::Updated,
            EntityRef::BulkPurchase(old.id),
            audit_values(&old, Some(&changed)),
            audit_values(&new, Some(&changed)),
            format!("Bulk purchase {} updated", old.id),
        );
        self.bulk_purchases.insert(new.id, new);
        Ok(())
    }

    /// Deletes an untouched purchase and posts a compensating cost entry.
    pub fn delete_bulk_purchase(
        &mut self,
        id: BulkPurchaseId,
        actor: Actor,
    ) -> Result<(), LedgerError> {
        let purchase = self
            .bulk_purchases
            .get(&id)
            .ok_or(LedgerError::BulkPurchaseNotFound(id))?
            .clone();
        if let Err(violation) = guards::check_bulk_purchase_delete(&purchase) {
            return self.reject(
                actor,
                AuditAction::DeleteRejected,
                EntityRef::BulkPurchase(id),
                audit_values(&purchase, None),
                serde_json::Value::Null,
                violation,
            );
        }

        self.bulk_purchases.remove(&id);
        self.book_entry(
            LedgerEntryKind::InventoryPurchase,
            EntityRef::BulkPurchase(id),
            -purchase.actual_cost_paid,
        );
        self.record_audit(
            actor,
            AuditAction::Deleted,
            EntityRef::BulkPurchase(id),
            audit_values(&purchase, None),
            serde_json::Value::Null,
            format!("Bulk purchase {id} deleted"),
        );
        info!(bulk_purchase = %id, actor = %actor, "Bulk purchase deleted");
        Ok(())
    }

    /// Value still available for allocation across all purchases of a product.
    pub fn inventory_remaining(&self, product: ProductId) -> Result<Paise, LedgerError> {
        let remaining = Paise::try_sum(
            self.bulk_purchases
                .values()
                .filter(|purchase| purchase.product_id == product)
                .map(|purchase| purchase.value_remaining),
        )?;
        Ok(remaining)
    }

    /// Hands `value` of a product to `user`, drawing from the oldest purchases first.
    pub fn allocate_inventory(
        &mut self,
        product: ProductId,
        user: UserId,
        value: Paise,
        actor: Actor,
    ) -> Result<Vec<AllocationId>, LedgerError> {
        if !value.is_positive() {
            return Err(DomainError::NonPositiveAmount(value).into());
        }
        if !self.products.as_map().contains_key(&product) {
            return Err(LedgerError::ProductNotFound(product));
        }
        let remaining = self.inventory_remaining(product)?;
        if remaining < value {
            return Err(LedgerError::InsufficientInventory {
                product,
                requested: value,
                remaining,
            });
        }

        let mut sources: Vec<&BulkPurchase> = self
            .bulk_purchases
            .values()
            .filter(|purchase| purchase.product_id == product && purchase.value_remaining.is_positive())
            .collect();
        sources.sort_by_key(|purchase| (purchase.purchase_date, purchase.id));

        // Plan every draw and check it before writing anything.
        let mut plan = Vec::new();
        let mut outstanding = value;
        for source in sources {
            if !outstanding.is_positive() {
                break;
            }
            let take = outstanding.min(source.value_remaining);
            let mut drawn = source.clone();
            drawn.value_remaining -= take;
            guards::check_bulk_purchase_update(source, &drawn)?;
            plan.push((source.clone(), drawn, take));
            outstanding -= take;
        }

        let mut allocations = Vec::with_capacity(plan.len());
        for (old, new, take) in plan {
            let id: AllocationId = self.sequences.allocations.next();
            let bulk_purchase_id = old.id;
            self.write_bulk_purchase(old, new, actor)?;
            self.allocations.insert(
                id,
                Allocation {
                    id,
                    product_id: product,
                    bulk_purchase_id,
                    user_id: user,
                    value: take,
                    is_reversed: false,
                    created_at: Utc::now(),
                    reversed_at: None,
                    reversal_reason: None,
                },
            );
            info!(allocation = %id, product = %product, bulk_purchase = %bulk_purchase_id, user = %user, value = %take, "Inventory allocated");
            allocations.push(id);
        }
        Ok(allocations)
    }

    /// Returns an allocation's value to the purchase it was drawn from.
    pub fn reverse_allocation(
        &mut self,
        id: AllocationId,
        actor: Actor,
        reason: &str,
    ) -> Result<(), LedgerError> {
        let mut allocation = self
            .allocations
            .get(&id)
            .ok_or(LedgerError::AllocationNotFound(id))?
            .clone();
        if allocation.is_reversed {
            return Err(LedgerError::AllocationAlreadyReversed(id));
        }
        let old = self
            .bulk_purchases
            .get(&allocation.bulk_purchase_id)
            .ok_or(LedgerError::BulkPurchaseNotFound(allocation.bulk_purchase_id))?
            .clone();
        let mut new = old.clone();
        new.value_remaining = new
            .value_remaining
            .checked_add(allocation.value)
            .ok_or(DomainError::Overflow {
                total: old.value_remaining,
                amount: allocation.value,
            })?;
        guards::check_bulk_purchase_update(&old, &new)?;

        self.write_bulk_purchase(old, new, actor)?;
        allocation.is_reversed = true;
        allocation.reversed_at = Some(Utc::now());
        allocation.reversal_reason = Some(reason.to_owned());
        self.record_audit(
            actor,
            AuditAction::Updated,
            EntityRef::Allocation(id),
            serde_json::json!({ "is_reversed": false }),
            serde_json::json!({ "is_reversed": true }),
            format!("Allocation {id} reversed: {reason}"),
        );
        self.allocations.insert(id, allocation);
        Ok(())
    }
}
