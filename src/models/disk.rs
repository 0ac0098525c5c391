//! Disk record model, the sole inventory entity.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Canonical status for a disk in working order.
pub const STATUS_GOOD: &str = "Bueno";
/// Canonical status for a failed or retired disk.
pub const STATUS_BAD: &str = "Malo";
/// Canonical status for anything that still has to be inspected.
pub const STATUS_REVIEW: &str = "Por revisar";

/// Coarse status classification used for badges and summaries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Good,
    Bad,
    Review,
}

impl StatusClass {
    /// Classify free-text status. Unknown values need review.
    pub fn of(status: &str) -> Self {
        let s = status.to_lowercase();
        if s.contains("bueno") || s.contains("operativo") {
            StatusClass::Good
        } else if s.contains("malo") || s.contains("baja") {
            StatusClass::Bad
        } else {
            StatusClass::Review
        }
    }
}

/// A physical storage disk as held by the record store.
///
/// Every field except `id` is unvalidated free text (or a number for
/// `capacity`); absent fields deserialize to empty string or zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskRecord {
    pub id: String,
    pub internal_code: String,
    pub host_id: String,
    #[serde(rename = "type")]
    pub disk_type: String,
    /// Capacity in gigabytes
    pub capacity: f64,
    pub brand: String,
    pub serial: String,
    pub status: String,
    pub purchase_date: String,
    pub install_date: String,
    pub observations: String,
}

impl DiskRecord {
    pub fn from_input(id: String, input: DiskInput) -> Self {
        Self {
            id,
            internal_code: input.internal_code,
            host_id: input.host_id,
            disk_type: input.disk_type,
            capacity: input.capacity,
            brand: input.brand,
            serial: input.serial,
            status: input.status,
            purchase_date: input.purchase_date,
            install_date: input.install_date,
            observations: input.observations,
        }
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::of(&self.status)
    }
}

/// Request body for creating a disk or overwriting all of its fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskInput {
    pub internal_code: String,
    pub host_id: String,
    #[serde(rename = "type")]
    pub disk_type: String,
    pub capacity: f64,
    pub brand: String,
    pub serial: String,
    pub status: String,
    pub purchase_date: String,
    pub install_date: String,
    pub observations: String,
}

/// Raw form submission from the disk dialog.
///
/// `capacity` arrives as typed text and is coerced to a number on submit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskForm {
    /// Present when editing an existing disk
    pub id: Option<String>,
    pub internal_code: String,
    pub host_id: String,
    #[serde(rename = "type")]
    pub disk_type: String,
    pub capacity: String,
    pub brand: String,
    pub serial: String,
    pub status: String,
    pub purchase_date: String,
    pub install_date: String,
    pub observations: String,
}

impl DiskForm {
    /// Coerce the form into a store input. Blank capacity counts as zero.
    pub fn into_input(self) -> Result<(Option<String>, DiskInput), AppError> {
        let raw = self.capacity.trim();
        let capacity = if raw.is_empty() {
            0.0
        } else {
            raw.parse::<f64>()
                .ok()
                .filter(|c| c.is_finite())
                .ok_or_else(|| {
                    AppError::Validation(format!("Capacity '{}' is not a number", raw))
                })?
        };

        let id = self.id.filter(|id| !id.trim().is_empty());
        Ok((
            id,
            DiskInput {
                internal_code: self.internal_code,
                host_id: self.host_id,
                disk_type: self.disk_type,
                capacity,
                brand: self.brand,
                serial: self.serial,
                status: self.status,
                purchase_date: self.purchase_date,
                install_date: self.install_date,
                observations: self.observations,
            },
        ))
    }
}
