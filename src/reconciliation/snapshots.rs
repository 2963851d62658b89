use serde::Serialize;

use crate::domain::{CompanyId, DisclosureSnapshot, DisclosureVersionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TamperedSnapshot {
    pub id: DisclosureVersionId,
    pub company_id: CompanyId,
    pub version_number: u32,
    pub stored_hash: String,
    pub computed_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotAuditReport {
    pub checked: usize,
    pub tampered: Vec<TamperedSnapshot>,
}

impl SnapshotAuditReport {
    pub fn is_clean(&self) -> bool {
        self.tampered.is_empty()
    }
}

/// Recomputes the SHA-256 of every snapshot payload and lists those that no longer match.
pub fn audit_snapshots<'a>(
    snapshots: impl IntoIterator<Item = &'a DisclosureSnapshot>,
) -> SnapshotAuditReport {
    let mut report = SnapshotAuditReport::default();
    for snapshot in snapshots {
        report.checked += 1;
        let computed_hash = snapshot.computed_hash();
        if computed_hash != snapshot.payload_hash {
            report.tampered.push(TamperedSnapshot {
                id: snapshot.id,
                company_id: snapshot.company_id,
                version_number: snapshot.version_number,
                stored_hash: snapshot.payload_hash.clone(),
                computed_hash,
            });
        }
    }
    report
}
