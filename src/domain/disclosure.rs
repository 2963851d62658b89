use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Actor, CompanyId, DisclosureVersionId};

/// Editable company details. Frozen companies reject every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub sector: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub profile: CompanyProfile,
    pub frozen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn is_frozen(&self) -> bool {
        self.frozen_at.is_some()
    }
}

/// Locked disclosure version. Snapshots are append-only; nothing updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureSnapshot {
    pub id: DisclosureVersionId,
    pub company_id: CompanyId,
    pub version_number: u32,
    pub payload: serde_json::Value,
    /// Hex SHA-256 of the payload's canonical form (see [`payload_hash`]), taken when the
    /// version was locked.
    pub payload_hash: String,
    pub locked_at: DateTime<Utc>,
    pub created_by: Actor,
}

impl DisclosureSnapshot {
    pub fn computed_hash(&self) -> String {
        payload_hash(&self.payload)
    }
    pub fn is_intact(&self) -> bool {
        self.computed_hash() == self.payload_hash
    }
}

/// Hex SHA-256 over the canonical form of `payload`: compact JSON with object keys in
/// sorted order and numbers as serde_json prints them.
///
/// The hash covers the parsed value, not the bytes it was read from. Equal payloads hash the
/// same whatever their original spacing or key order, and a hash computed elsewhere over
/// non-canonical text will not match.
pub fn payload_hash(payload: &serde_json::Value) -> String {
    hex::encode(Sha256::digest(payload.to_string().as_bytes()))
}
