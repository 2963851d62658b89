use std::time::Duration;

use serde_json::json;
use tracing::{error, info};

use super::{Job, JobError, JobOutcome};
use crate::{
    config::LedgerConfig,
    domain::{AlertKind, Paise, ProductId, Severity},
    ledger::Ledger,
    reconciliation::{audit_snapshots, reconcile_inventory},
};

/// Checks inventory conservation and booked purchase cost. Single attempt, read-only.
#[derive(Debug, Clone)]
pub struct InventoryReconciliationJob {
    scope: Option<ProductId>,
    tolerance: Paise,
    timeout: Duration,
}

impl InventoryReconciliationJob {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            scope: None,
            tolerance: config.ledger_tolerance_paise,
            timeout: config.inventory_reconciliation.timeout(),
        }
    }

    pub fn for_product(mut self, product: ProductId) -> Self {
        self.scope = Some(product);
        self
    }
}

impl Job for InventoryReconciliationJob {
    fn name(&self) -> &'static str {
        "inventory_reconciliation"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn handle(&self, ledger: &mut Ledger) -> Result<JobOutcome, JobError> {
        let report = reconcile_inventory(ledger, self.scope, self.tolerance)?;
        if report.is_clean() {
            let summary = format!(
                "Inventory conserved for {} product(s), booked cost within tolerance",
                report.products.len()
            );
            info!(job = self.name(), "{summary}");
            return Ok(JobOutcome::AllClear {
                summary,
                report: json!(report),
            });
        }

        let mut alerts = Vec::new();
        let mismatched: Vec<_> = report.mismatched_products().cloned().collect();
        for product in &mismatched {
            error!(
                severity = "critical",
                product = %product.product_id,
                allocated = %product.allocated,
                remaining = %product.remaining,
                total_received = %product.total_received,
                discrepancy = %product.discrepancy,
                "Inventory conservation violated"
            );
        }
        if !mismatched.is_empty() {
            alerts.push(ledger.raise_alert(
                AlertKind::InventoryMismatch,
                Severity::Critical,
                format!("Inventory conservation violated for {} product(s)", mismatched.len()),
                json!({ "products": mismatched }),
            ));
        }

        let cost = &report.cost_check;
        if !cost.is_within_tolerance {
            error!(
                severity = "critical",
                ledger_total = %cost.ledger_total,
                purchase_cost_total = %cost.purchase_cost_total,
                difference = %cost.difference,
                tolerance = %cost.tolerance,
                "Booked inventory cost does not match bulk purchases"
            );
            alerts.push(ledger.raise_alert(
                AlertKind::LedgerMismatch,
                Severity::Critical,
                "Booked inventory cost does not match bulk purchases",
                json!({ "cost_check": cost }),
            ));
        }

        Ok(JobOutcome::AlertsRaised {
            summary: format!("{} inventory alert(s) raised", alerts.len()),
            alerts,
            report: json!(report),
        })
    }
}

/// Recomputes every disclosure snapshot hash. Single attempt, read-only.
#[derive(Debug, Clone)]
pub struct SnapshotIntegrityAuditJob {
    timeout: Duration,
}

impl SnapshotIntegrityAuditJob {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            timeout: config.snapshot_audit.timeout(),
        }
    }
}

impl Job for SnapshotIntegrityAuditJob {
    fn name(&self) -> &'static str {
        "snapshot_integrity_audit"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn handle(&self, ledger: &mut Ledger) -> Result<JobOutcome, JobError> {
        let report = audit_snapshots(ledger.disclosures());
        if report.is_clean() {
            let summary = format!("{} snapshot(s) verified, no tampering", report.checked);
            info!(job = self.name(), "{summary}");
            return Ok(JobOutcome::AllClear {
                summary,
                report: json!(report),
            });
        }

        for tampered in &report.tampered {
            error!(
                severity = "critical",
                disclosure = %tampered.id,
                company = %tampered.company_id,
                version = tampered.version_number,
                stored_hash = %tampered.stored_hash,
                computed_hash = %tampered.computed_hash,
                "Disclosure snapshot tamper detected"
            );
        }
        let alert = ledger.raise_alert(
            AlertKind::SnapshotTamper,
            Severity::Critical,
            format!(
                "Tamper detected in {} of {} disclosure snapshot(s)",
                report.tampered.len(),
                report.checked
            ),
            json!({ "tampered": report.tampered }),
        );
        Ok(JobOutcome::AlertsRaised {
            alerts: vec![alert],
            summary: format!("{} tampered snapshot(s)", report.tampered.len()),
            report: json!(report),
        })
    }
}
