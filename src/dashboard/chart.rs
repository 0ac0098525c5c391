//! Chart series aggregated over the visible subset.

use serde::{Deserialize, Serialize};

use crate::models::DiskRecord;

/// Label for records with no value in the grouped field.
pub const UNDEFINED_LABEL: &str = "Undefined";
/// Label for records not assigned to any host.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GroupBy {
    #[default]
    Status,
    Brand,
    Type,
    Host,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    #[default]
    Count,
    Capacity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    #[default]
    Doughnut,
    Bar,
    Pie,
}

/// Chart configuration chosen by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartSettings {
    pub group_by: GroupBy,
    pub metric: Metric,
    pub kind: ChartKind,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Data handed to the chart renderer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub title: String,
    pub kind: ChartKind,
    pub dataset_label: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSettings {
    /// Aggregate `disks` into labelled values, labels in first-seen order.
    pub fn aggregate(&self, disks: &[&DiskRecord]) -> ChartSeries {
        let mut points: Vec<ChartPoint> = Vec::new();

        for disk in disks {
            let label = self.label_for(disk);
            let amount = match self.metric {
                Metric::Count => 1.0,
                Metric::Capacity => disk.capacity,
            };
            match points.iter_mut().find(|p| p.label == label) {
                Some(point) => point.value += amount,
                None => points.push(ChartPoint {
                    label,
                    value: amount,
                }),
            }
        }

        ChartSeries {
            title: self.title(),
            kind: self.kind,
            dataset_label: match self.metric {
                Metric::Count => "Units".to_string(),
                Metric::Capacity => "Capacity (GB)".to_string(),
            },
            points,
        }
    }

    fn label_for(&self, disk: &DiskRecord) -> String {
        let value = match self.group_by {
            GroupBy::Status => &disk.status,
            GroupBy::Brand => &disk.brand,
            GroupBy::Type => &disk.disk_type,
            GroupBy::Host => {
                if disk.host_id.is_empty() {
                    return UNASSIGNED_LABEL.to_string();
                }
                &disk.host_id
            }
        };
        if value.is_empty() {
            UNDEFINED_LABEL.to_string()
        } else {
            value.clone()
        }
    }

    pub fn title(&self) -> String {
        let metric = match self.metric {
            Metric::Count => "Distribution",
            Metric::Capacity => "Total Capacity",
        };
        let group = match self.group_by {
            GroupBy::Status => "by Operating Status",
            GroupBy::Brand => "by Manufacturer",
            GroupBy::Type => "by Technology",
            GroupBy::Host => "by Physical Location",
        };
        format!("{} {}", metric, group)
    }
}

/// Human-readable capacity for tooltips: terabytes from 1000 GB up.
pub fn format_capacity(gigabytes: f64) -> String {
    if gigabytes >= 1000.0 {
        format!("{:.2} TB", gigabytes / 1000.0)
    } else {
        format!("{} GB", gigabytes)
    }
}
