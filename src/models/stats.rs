//! Aggregate network statistics, derived on demand from a record set.

use std::collections::BTreeMap;

use serde::Serialize;

use super::node::{NodeRecord, NodeStatus, Storage};

// == Aggregate Statistics ==
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatistics {
    pub total: usize,
    pub active: usize,
    pub gossiping: usize,
    pub offline: usize,
    pub unknown: usize,
    /// Node count per region
    pub by_region: BTreeMap<String, usize>,
    /// Summed storage across all nodes
    pub total_storage: Storage,
    /// Floor of the mean uptime in seconds, 0 for an empty set
    pub average_uptime: u64,
    /// Share of active nodes in percent, one decimal
    pub health_percentage: f64,
    /// Floor of the mean latency (ms) over nodes reporting one
    pub average_latency: u64,
}

impl AggregateStatistics {
    /// Recomputes every figure from `records`.
    pub fn from_records(records: &[NodeRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        let mut uptime_sum: u128 = 0;
        let mut latency_sum = 0.0;
        let mut latency_samples = 0usize;

        for record in records {
            match record.status {
                NodeStatus::Active => stats.active += 1,
                NodeStatus::Gossiping => stats.gossiping += 1,
                NodeStatus::Offline => stats.offline += 1,
                NodeStatus::Unknown => stats.unknown += 1,
            }

            *stats
                .by_region
                .entry(record.location.region.clone())
                .or_insert(0) += 1;

            let totals = &mut stats.total_storage;
            totals.used = totals.used.saturating_add(record.storage.used);
            totals.total = totals.total.saturating_add(record.storage.total);
            totals.available = totals.available.saturating_add(record.storage.available);

            uptime_sum += u128::from(record.uptime);

            if let Some(latency) = record.latency_ms().filter(|l| l.is_finite() && *l >= 0.0) {
                latency_sum += latency;
                latency_samples += 1;
            }
        }

        if !records.is_empty() {
            let mean = uptime_sum / records.len() as u128;
            stats.average_uptime = u64::try_from(mean).unwrap_or(u64::MAX);
            stats.health_percentage =
                (stats.active as f64 / records.len() as f64 * 1000.0).round() / 10.0;
        }
        if latency_samples > 0 {
            stats.average_latency = (latency_sum / latency_samples as f64).floor() as u64;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::fixtures::node;
    use serde_json::json;

    #[test]
    fn test_empty_set() {
        let stats = AggregateStatistics::from_records(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_uptime, 0);
        assert_eq!(stats.health_percentage, 0.0);
        assert_eq!(stats.average_latency, 0);
        assert!(stats.by_region.is_empty());
    }

    #[test]
    fn test_counts_by_status_and_region() {
        let records = vec![
            node("a", NodeStatus::Active, "Europe", 10),
            node("b", NodeStatus::Active, "Asia", 20),
            node("c", NodeStatus::Gossiping, "Europe", 30),
            node("d", NodeStatus::Offline, "Africa", 0),
            node("e", NodeStatus::Unknown, "Africa", 5),
        ];
        let stats = AggregateStatistics::from_records(&records);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.gossiping, 1);
        assert_eq!(stats.offline, 1);
        assert_eq!(stats.unknown, 1);
        assert_eq!(stats.by_region["Europe"], 2);
        assert_eq!(stats.by_region["Africa"], 2);
        assert_eq!(stats.by_region["Asia"], 1);
        assert_eq!(stats.health_percentage, 40.0);
    }

    #[test]
    fn test_average_uptime_is_floored() {
        let records = vec![
            node("a", NodeStatus::Active, "Europe", 10),
            node("b", NodeStatus::Active, "Europe", 11),
        ];
        assert_eq!(AggregateStatistics::from_records(&records).average_uptime, 10);
    }

    #[test]
    fn test_storage_is_summed() {
        let records = vec![
            node("a", NodeStatus::Active, "Europe", 1),
            node("b", NodeStatus::Offline, "Europe", 1),
        ];
        let stats = AggregateStatistics::from_records(&records);

        assert_eq!(stats.total_storage, Storage::new(80, 200));
    }

    #[test]
    fn test_average_latency_skips_missing_values() {
        let mut a = node("a", NodeStatus::Active, "Europe", 1);
        a.metadata.insert("latency".into(), json!(45));
        let mut b = node("b", NodeStatus::Active, "Europe", 1);
        b.metadata.insert("latency".into(), json!(50.5));
        let c = node("c", NodeStatus::Offline, "Europe", 1);

        let stats = AggregateStatistics::from_records(&[a, b, c]);
        assert_eq!(stats.average_latency, 47);
    }

    #[test]
    fn test_serializes_camel_case() {
        let stats = AggregateStatistics::from_records(&[node("a", NodeStatus::Active, "Europe", 1)]);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["byRegion"]["Europe"], 1);
        assert_eq!(json["totalStorage"]["used"], 40);
        assert_eq!(json["averageUptime"], 1);
    }
}
