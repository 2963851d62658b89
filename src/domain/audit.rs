use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Actor, AlertId, AuditLogId, EntityRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    #[display("created")]
    Created,
    #[display("updated")]
    Updated,
    #[display("deleted")]
    Deleted,
    #[display("update_rejected")]
    UpdateRejected,
    #[display("delete_rejected")]
    DeleteRejected,
}

/// Append-only record of who changed what. Rejections are logged alongside accepted changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub actor: Actor,
    pub action: AuditAction,
    pub entity: EntityRef,
    pub old_values: serde_json::Value,
    pub new_values: serde_json::Value,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    #[display("inventory_mismatch")]
    InventoryMismatch,
    #[display("ledger_mismatch")]
    LedgerMismatch,
    #[display("snapshot_tamper")]
    SnapshotTamper,
    #[display("job_failed")]
    JobFailed,
}

/// Row in the admin alert sink, reviewed by a human. Never auto-resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAlert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
