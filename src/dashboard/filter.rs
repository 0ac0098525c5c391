//! Filter criteria and the visible-subset derivation.
//!
//! The visible subset is a linear scan over the snapshot that keeps the
//! snapshot's order. Missing text counts as empty and missing capacity as
//! zero; malformed values simply fail to match.

use serde::{Deserialize, Serialize};

use crate::models::DiskRecord;

/// Selector value meaning "no constraint".
pub const ALL: &str = "all";

/// One named capacity range, bounds inclusive, in gigabytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityBucket {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl CapacityBucket {
    fn new(name: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
        }
    }

    pub fn contains(&self, capacity: f64) -> bool {
        capacity >= self.min && capacity <= self.max
    }
}

/// The table of named capacity ranges offered by the capacity filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityBuckets(Vec<CapacityBucket>);

impl Default for CapacityBuckets {
    fn default() -> Self {
        Self(vec![
            CapacityBucket::new("240", 230.0, 260.0),
            CapacityBucket::new("480", 470.0, 520.0),
            CapacityBucket::new("1000", 900.0, 1100.0),
            CapacityBucket::new("2000", 1900.0, 2100.0),
        ])
    }
}

impl CapacityBuckets {
    /// Parse a `name=min-max` comma-separated list, e.g. `240=230-260,480=470-520`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut buckets = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, range) = entry
                .split_once('=')
                .ok_or_else(|| format!("bucket '{}' is missing '='", entry))?;
            let (min, max) = range
                .split_once('-')
                .ok_or_else(|| format!("bucket '{}' is missing a '-' range", entry))?;
            let min: f64 = min
                .trim()
                .parse()
                .map_err(|_| format!("bucket '{}' has a non-numeric minimum", entry))?;
            let max: f64 = max
                .trim()
                .parse()
                .map_err(|_| format!("bucket '{}' has a non-numeric maximum", entry))?;
            if min > max {
                return Err(format!("bucket '{}' has min greater than max", entry));
            }
            buckets.push(CapacityBucket::new(name.trim(), min, max));
        }
        if buckets.is_empty() {
            return Err("no buckets defined".to_string());
        }
        Ok(Self(buckets))
    }

    pub fn get(&self, name: &str) -> Option<&CapacityBucket> {
        self.0.iter().find(|b| b.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapacityBucket> {
        self.0.iter()
    }

    /// Does `capacity` satisfy the capacity selector?
    ///
    /// `all` accepts everything, a bucket name accepts its range, any other
    /// value is compared for exact numeric equality.
    pub fn matches(&self, selector: &str, capacity: f64) -> bool {
        if selector == ALL {
            return true;
        }
        if let Some(bucket) = self.get(selector) {
            return bucket.contains(capacity);
        }
        match selector.trim().parse::<f64>() {
            Ok(exact) => capacity == exact,
            Err(_) => false,
        }
    }
}

/// User-entered filter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub search: String,
    pub status: String,
    #[serde(rename = "type")]
    pub disk_type: String,
    pub brand: String,
    pub capacity: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: ALL.to_string(),
            disk_type: ALL.to_string(),
            brand: ALL.to_string(),
            capacity: ALL.to_string(),
        }
    }
}

impl FilterCriteria {
    /// Whether a single record passes every active predicate.
    pub fn matches(&self, disk: &DiskRecord, buckets: &CapacityBuckets) -> bool {
        let term = self.search.to_lowercase();
        let text_match = [&disk.serial, &disk.internal_code, &disk.brand, &disk.host_id]
            .iter()
            .any(|field| field.to_lowercase().contains(&term));

        let status_match = self.status == ALL || disk.status == self.status;
        let type_match = self.disk_type == ALL || disk.disk_type == self.disk_type;
        let brand_match = self.brand == ALL
            || disk
                .brand
                .to_lowercase()
                .contains(&self.brand.to_lowercase());
        let capacity_match = buckets.matches(&self.capacity, disk.capacity);

        text_match && status_match && type_match && brand_match && capacity_match
    }

    /// The visible subset of `disks`, in snapshot order.
    pub fn apply<'a>(
        &self,
        disks: &'a [DiskRecord],
        buckets: &CapacityBuckets,
    ) -> Vec<&'a DiskRecord> {
        disks.iter().filter(|d| self.matches(d, buckets)).collect()
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }

    /// Treat blank selectors as "no constraint".
    pub fn normalize(&mut self) {
        for selector in [
            &mut self.status,
            &mut self.disk_type,
            &mut self.brand,
            &mut self.capacity,
        ] {
            if selector.trim().is_empty() {
                *selector = ALL.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(id: &str, status: &str, capacity: f64) -> DiskRecord {
        DiskRecord {
            id: id.to_string(),
            status: status.to_string(),
            capacity,
            ..Default::default()
        }
    }

    fn ids(disks: &[&DiskRecord]) -> Vec<String> {
        disks.iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn test_bucket_240_bounds() {
        let buckets = CapacityBuckets::default();
        assert!(buckets.matches("240", 230.0));
        assert!(buckets.matches("240", 250.0));
        assert!(buckets.matches("240", 260.0));
        assert!(!buckets.matches("240", 229.0));
        assert!(!buckets.matches("240", 261.0));
    }

    #[test]
    fn test_other_buckets_and_exact_match() {
        let buckets = CapacityBuckets::default();
        assert!(buckets.matches("480", 500.0));
        assert!(buckets.matches("1000", 931.5));
        assert!(buckets.matches("2000", 2000.0));
        assert!(!buckets.matches("2000", 1800.0));
        assert!(buckets.matches("750", 750.0));
        assert!(!buckets.matches("750", 751.0));
        assert!(!buckets.matches("big", 750.0));
        assert!(buckets.matches(ALL, f64::MAX));
    }

    #[test]
    fn test_brand_is_case_insensitive_substring() {
        let buckets = CapacityBuckets::default();
        let samsung = DiskRecord {
            id: "1".to_string(),
            brand: "Samsung Pro".to_string(),
            ..Default::default()
        };
        let criteria = FilterCriteria {
            brand: "sam".to_string(),
            ..Default::default()
        };
        assert!(criteria.matches(&samsung, &buckets));

        let criteria = FilterCriteria {
            brand: "seagate".to_string(),
            ..Default::default()
        };
        assert!(!criteria.matches(&samsung, &buckets));
    }

    #[test]
    fn test_search_covers_serial_code_brand_host() {
        let buckets = CapacityBuckets::default();
        let record = DiskRecord {
            id: "1".to_string(),
            serial: "WD-WCC4N1234".to_string(),
            internal_code: "INV-042".to_string(),
            brand: "Western Digital".to_string(),
            host_id: "SRV-NAS-01".to_string(),
            observations: "hidden text".to_string(),
            ..Default::default()
        };
        for term in ["wcc4n", "inv-042", "DIGITAL", "nas-01", ""] {
            let criteria = FilterCriteria {
                search: term.to_string(),
                ..Default::default()
            };
            assert!(criteria.matches(&record, &buckets), "term {:?}", term);
        }
        let criteria = FilterCriteria {
            search: "hidden".to_string(),
            ..Default::default()
        };
        assert!(!criteria.matches(&record, &buckets));
    }

    #[test]
    fn test_status_filter_then_clear() {
        let buckets = CapacityBuckets::default();
        let disks = vec![disk("1", "Bueno", 250.0), disk("2", "Malo", 500.0)];

        let criteria = FilterCriteria {
            status: "Bueno".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&criteria.apply(&disks, &buckets)), vec!["1"]);

        let cleared = FilterCriteria::default();
        assert!(cleared.is_cleared());
        assert_eq!(ids(&cleared.apply(&disks, &buckets)), vec!["1", "2"]);
    }

    #[test]
    fn test_exact_status_and_type() {
        let buckets = CapacityBuckets::default();
        let mut record = disk("1", "Bueno", 0.0);
        record.disk_type = "SSD".to_string();

        let lowercase_status = FilterCriteria {
            status: "bueno".to_string(),
            ..Default::default()
        };
        assert!(!lowercase_status.matches(&record, &buckets));

        let type_filter = FilterCriteria {
            disk_type: "SSD".to_string(),
            ..Default::default()
        };
        assert!(type_filter.matches(&record, &buckets));
    }

    #[test]
    fn test_bucket_config_parsing() {
        let buckets = CapacityBuckets::parse("120=110-130, 4000=3800-4100").unwrap();
        assert!(buckets.matches("120", 128.0));
        assert!(buckets.matches("4000", 4000.0));
        assert!(!buckets.matches("240", 240.5));
        assert!(buckets.matches("240", 240.0));

        assert!(CapacityBuckets::parse("").is_err());
        assert!(CapacityBuckets::parse("240").is_err());
        assert!(CapacityBuckets::parse("240=260-230").is_err());
        assert!(CapacityBuckets::parse("240=a-b").is_err());
    }

    /// Small deterministic generator so the randomized check is reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
            items[(self.next() as usize) % items.len()]
        }
    }

    fn reference_match(disk: &DiskRecord, c: &FilterCriteria) -> bool {
        let term = c.search.to_lowercase();
        let text = disk.serial.to_lowercase().contains(&term)
            || disk.internal_code.to_lowercase().contains(&term)
            || disk.brand.to_lowercase().contains(&term)
            || disk.host_id.to_lowercase().contains(&term);
        let status = c.status == "all" || c.status == disk.status;
        let kind = c.disk_type == "all" || c.disk_type == disk.disk_type;
        let brand = c.brand == "all" || disk.brand.to_lowercase().contains(&c.brand.to_lowercase());
        let cap = disk.capacity;
        let capacity = match c.capacity.as_str() {
            "all" => true,
            "240" => (230.0..=260.0).contains(&cap),
            "480" => (470.0..=520.0).contains(&cap),
            "1000" => (900.0..=1100.0).contains(&cap),
            "2000" => (1900.0..=2100.0).contains(&cap),
            other => other.parse::<f64>().map(|v| v == cap).unwrap_or(false),
        };
        text && status && kind && brand && capacity
    }

    #[test]
    fn test_randomized_subset_matches_reference() {
        let buckets = CapacityBuckets::default();
        let mut rng = Lcg(0x5eed);
        let brands = ["Samsung Pro", "SAMSUNG", "Kingston", "WD Blue", "", "hgst"];
        let statuses = ["Bueno", "Malo", "Por revisar", ""];
        let types = ["HDD", "SSD", "NVMe", ""];
        let hosts = ["SRV-01", "PC-22", "", "nas"];
        let capacities = [0.0, 229.0, 230.0, 256.0, 261.0, 480.0, 500.0, 931.0, 1000.0, 2000.0, 4000.0];

        for round in 0..200 {
            let disks: Vec<DiskRecord> = (0..(rng.next() % 12))
                .map(|i| DiskRecord {
                    id: format!("{}-{}", round, i),
                    internal_code: format!("INV-{}", rng.next() % 50),
                    host_id: rng.pick(&hosts).to_string(),
                    disk_type: rng.pick(&types).to_string(),
                    capacity: capacities[(rng.next() as usize) % capacities.len()],
                    brand: rng.pick(&brands).to_string(),
                    serial: format!("SN{}", rng.next() % 1000),
                    status: rng.pick(&statuses).to_string(),
                    ..Default::default()
                })
                .collect();

            let criteria = FilterCriteria {
                search: rng.pick(&["", "sam", "inv-1", "sn9", "srv", "zzz"]).to_string(),
                status: rng.pick(&["all", "Bueno", "Malo", "Por revisar"]).to_string(),
                disk_type: rng.pick(&["all", "HDD", "SSD"]).to_string(),
                brand: rng.pick(&["all", "sam", "KING", "wd", "x"]).to_string(),
                capacity: rng
                    .pick(&["all", "240", "480", "1000", "2000", "4000", "oops"])
                    .to_string(),
            };

            let expected: Vec<String> = disks
                .iter()
                .filter(|d| reference_match(d, &criteria))
                .map(|d| d.id.clone())
                .collect();
            assert_eq!(ids(&criteria.apply(&disks, &buckets)), expected);
        }
    }
}
