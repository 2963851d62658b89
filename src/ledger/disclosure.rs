use chrono::Utc;
use tracing::{info, warn};

use super::{Ledger, LedgerError, audit_values, errors::InvariantViolation};
use crate::domain::{
    Actor, AuditAction, Company, CompanyId, CompanyProfile, DisclosureSnapshot,
    DisclosureVersionId, EntityRef, payload_hash,
};

impl Ledger {
    pub fn register_company(&mut self, profile: CompanyProfile, actor: Actor) -> CompanyId {
        let id: CompanyId = self.sequences.companies.next();
        let now = Utc::now();
        let company = Company {
            id,
            profile,
            frozen_at: None,
            created_at: now,
            updated_at: now,
        };
        self.record_audit(
            actor,
            AuditAction::Created,
            EntityRef::Company(id),
            serde_json::Value::Null,
            audit_values(&company, None),
            format!("Company {} registered", company.profile.name),
        );
        self.companies.insert(id, company);
        id
    }

    /// Edits a company profile. Frozen companies refuse every change.
    pub fn update_company(
        &mut self,
        id: CompanyId,
        actor: Actor,
        mutate: impl FnOnce(&mut CompanyProfile),
    ) -> Result<(), LedgerError> {
        let mut company = self
            .companies
            .get(&id)
            .ok_or(LedgerError::CompanyNotFound(id))?
            .clone();
        let mut profile = company.profile.clone();
        mutate(&mut profile);
        if profile == company.profile {
            return Ok(());
        }
        let old_values = audit_values(&company.profile, None);
        let new_values = audit_values(&profile, None);
        if company.is_frozen() {
            return self.reject(
                actor,
                AuditAction::UpdateRejected,
                EntityRef::Company(id),
                old_values,
                new_values,
                InvariantViolation::FrozenCompany(id),
            );
        }

        company.profile = profile;
        company.updated_at = Utc::now();
        self.record_audit(
            actor,
            AuditAction::Updated,
            EntityRef::Company(id),
            old_values,
            new_values,
            format!("Company {id} updated"),
        );
        self.companies.insert(id, company);
        Ok(())
    }

    /// Freezing is one-way. Freezing a frozen company does nothing.
    pub fn freeze_company(&mut self, id: CompanyId, actor: Actor) -> Result<(), LedgerError> {
        let mut company = self
            .companies
            .get(&id)
            .ok_or(LedgerError::CompanyNotFound(id))?
            .clone();
        if company.is_frozen() {
            warn!(company = %id, actor = %actor, "Company already frozen");
            return Ok(());
        }
        let now = Utc::now();
        company.frozen_at = Some(now);
        company.updated_at = now;
        self.record_audit(
            actor,
            AuditAction::Updated,
            EntityRef::Company(id),
            serde_json::json!({ "frozen_at": null }),
            serde_json::json!({ "frozen_at": now }),
            format!("Company {id} frozen"),
        );
        self.companies.insert(id, company);
        info!(company = %id, actor = %actor, "Company frozen");
        Ok(())
    }

    /// Locks a new disclosure version for the company, hashing its payload.
    pub fn publish_disclosure(
        &mut self,
        company: CompanyId,
        payload: serde_json::Value,
        actor: Actor,
    ) -> Result<DisclosureVersionId, LedgerError> {
        if self.companies.get(&company).is_none() {
            return Err(LedgerError::CompanyNotFound(company));
        }
        let version_number = self
            .disclosures
            .iter()
            .filter(|snapshot| snapshot.company_id == company)
            .map(|snapshot| snapshot.version_number)
            .max()
            .unwrap_or(0)
            + 1;
        let id: DisclosureVersionId = self.sequences.disclosures.next();
        let snapshot = DisclosureSnapshot {
            id,
            company_id: company,
            version_number,
            payload_hash: payload_hash(&payload),
            payload,
            locked_at: Utc::now(),
            created_by: actor,
        };
        info!(
            target: "audit",
            disclosure = %id,
            company = %company,
            version = version_number,
            hash = %snapshot.payload_hash,
            actor = %actor,
            "Disclosure version locked"
        );
        self.disclosures.push(snapshot);
        Ok(id)
    }

    /// Restores snapshots read back from storage exactly as they were persisted.
    ///
    /// Stored hashes are kept as-is so the integrity audit can compare them.
    pub fn load_disclosures(&mut self, snapshots: impl IntoIterator<Item = DisclosureSnapshot>) {
        for snapshot in snapshots {
            self.sequences.disclosures.observe(snapshot.id.into());
            self.disclosures.push(snapshot);
        }
    }
}
