//! Snapshot model: the full ordered collection pushed to subscribers.

use serde::{Deserialize, Serialize};

use super::DiskRecord;

/// Every disk in the store at one revision, ordered by purchase date descending.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub revision_id: i64,
    pub generated_at: String,
    pub disks: Vec<DiskRecord>,
}

impl Snapshot {
    pub fn find(&self, id: &str) -> Option<&DiskRecord> {
        self.disks.iter().find(|d| d.id == id)
    }
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
