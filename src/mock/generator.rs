//! Mock network generator
//!
//! Produces a fixed-size population of pNodes and evolves it over time:
//! active nodes fill their disks, uptime accrues, latency jitters and a node
//! occasionally changes status.

use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use crate::models::{
    Coordinates, Location, NodeRecord, NodeStatus, Storage, MOCK_MARKER, SOURCE_MARKER_KEY,
};

const GB: u64 = 1_000_000_000;

/// (country, region, city, lat, lon, first two IPv4 octets)
const LOCATIONS: &[(&str, &str, &str, f64, f64, &str)] = &[
    ("Nigeria", "West Africa", "Lagos", 6.5244, 3.3792, "197.210"),
    ("United States", "North America", "New York", 40.7128, -74.0060, "104.26"),
    ("Germany", "Europe", "Frankfurt", 50.1109, 8.6821, "185.45"),
    ("Singapore", "Asia", "Singapore", 1.3521, 103.8198, "139.59"),
    ("Nigeria", "West Africa", "Abuja", 9.0765, 7.3986, "197.211"),
    ("Brazil", "South America", "São Paulo", -23.5505, -46.6333, "177.71"),
    ("Australia", "Oceania", "Sydney", -33.8688, 151.2093, "103.21"),
    ("Japan", "Asia", "Tokyo", 35.6762, 139.6503, "133.242"),
    ("United Kingdom", "Europe", "London", 51.5074, -0.1278, "81.2"),
    ("Kenya", "East Africa", "Nairobi", -1.2921, 36.8219, "41.90"),
];

const VERSIONS: &[&str] = &["1.3.0", "1.2.3", "1.2.3", "1.2.2", "1.2.1"];
const DISK_SIZES_GB: &[u64] = &[100, 150, 200, 250, 500];
const PORTS: &[u64] = &[3000, 4000, 5000, 8000];

const STATUS_FLIP_PROBABILITY: f64 = 0.03;
const OFFLINE_PROBABILITY: f64 = 0.01;
const RECOVERY_PROBABILITY: f64 = 0.05;
/// Upper bound on per-tick disk growth of an active node, as a share of capacity
const MAX_GROWTH_PER_TICK: f64 = 0.005;

/// Seeded generator holding the current synthetic population.
#[derive(Debug)]
pub struct MockGenerator {
    rng: StdRng,
    records: Vec<NodeRecord>,
    last_tick: Instant,
}

impl MockGenerator {
    /// Creates a generator; a fixed `seed` makes ids and statuses reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            records: Vec::new(),
            last_tick: Instant::now(),
        }
    }

    // == Generate ==
    /// Replaces the population with `count` fresh nodes and returns them.
    pub fn generate(&mut self, count: usize) -> Vec<NodeRecord> {
        let records = (0..count).map(|index| self.new_node(index)).collect();
        self.records = records;
        self.last_tick = Instant::now();
        self.records.clone()
    }

    // == Advance ==
    /// Moves the population forward by the wall-clock time since the last
    /// tick (at least one second) and returns it.
    pub fn advance(&mut self) -> Vec<NodeRecord> {
        let elapsed = self.last_tick.elapsed().max(Duration::from_secs(1));
        self.advance_by(elapsed)
    }

    /// Moves the population forward by `elapsed`.
    pub fn advance_by(&mut self, elapsed: Duration) -> Vec<NodeRecord> {
        let seconds = elapsed.as_secs();
        let mut records = std::mem::take(&mut self.records);
        for record in &mut records {
            self.step(record, seconds);
        }
        self.records = records;
        self.last_tick = Instant::now();
        self.records.clone()
    }

    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<&NodeRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn new_node(&mut self, index: usize) -> NodeRecord {
        let rng = &mut self.rng;
        let &(country, region, city, lat, lon, ip_prefix) = &LOCATIONS[index % LOCATIONS.len()];

        let roll: f64 = rng.gen();
        let status = if roll < 0.6 {
            NodeStatus::Active
        } else if roll < 0.85 {
            NodeStatus::Gossiping
        } else {
            NodeStatus::Offline
        };

        let total = DISK_SIZES_GB[rng.gen_range(0..DISK_SIZES_GB.len())] * GB;
        let used = (total as f64 * rng.gen_range(0.1..0.9)) as u64;

        let (uptime, last_seen) = if status == NodeStatus::Offline {
            let hours_ago = rng.gen_range(1..48);
            (0, Utc::now() - ChronoDuration::hours(hours_ago))
        } else {
            (rng.gen_range(1..=120) * 86_400, Utc::now())
        };

        let suffix: String = (0..6)
            .map(|_| {
                let chars = b"ABCDEFGHJKLMNPQRSTUVWXYZ0123456789";
                chars[rng.gen_range(0..chars.len())] as char
            })
            .collect();

        let mut metadata = Map::new();
        metadata.insert(
            "ip".into(),
            json!(format!("{}.{}.{}", ip_prefix, rng.gen_range(0..=255), rng.gen_range(1..=254))),
        );
        metadata.insert("port".into(), json!(PORTS[rng.gen_range(0..PORTS.len())]));
        metadata.insert("latency".into(), latency_value(rng, status));
        metadata.insert("cpuCores".into(), json!(rng.gen_range(4..=16)));
        metadata.insert("ramGb".into(), json!(4 * rng.gen_range(1..=16)));
        metadata.insert(SOURCE_MARKER_KEY.into(), json!(MOCK_MARKER));

        NodeRecord {
            id: format!("pNode-{:03}-{}", index + 1, suffix),
            status,
            storage: Storage::new(used, total),
            location: Location {
                country: country.to_string(),
                region: region.to_string(),
                city: city.to_string(),
                coordinates: Some(Coordinates { lat, lon }),
            },
            uptime,
            version: VERSIONS[rng.gen_range(0..VERSIONS.len())].to_string(),
            last_seen,
            metadata,
        }
    }

    fn step(&mut self, record: &mut NodeRecord, seconds: u64) {
        let rng = &mut self.rng;

        if record.status == NodeStatus::Offline {
            if rng.gen_bool(RECOVERY_PROBABILITY) {
                record.status = NodeStatus::Gossiping;
                record.last_seen = Utc::now();
            }
        } else if rng.gen_bool(OFFLINE_PROBABILITY) {
            record.status = NodeStatus::Offline;
            record.uptime = 0;
        } else {
            record.uptime = record.uptime.saturating_add(seconds);
            record.last_seen = Utc::now();

            if record.status == NodeStatus::Active {
                let growth = (record.storage.total as f64 * rng.gen_range(0.0..MAX_GROWTH_PER_TICK)) as u64;
                record.storage = Storage::new(
                    record.storage.used.saturating_add(growth),
                    record.storage.total,
                );
            }

            if rng.gen_bool(STATUS_FLIP_PROBABILITY) {
                record.status = match record.status {
                    NodeStatus::Active => NodeStatus::Gossiping,
                    _ => NodeStatus::Active,
                };
            }
        }

        record
            .metadata
            .insert("latency".into(), latency_value(rng, record.status));
    }
}

/// Fresh latency roll in milliseconds; offline nodes report none.
fn latency_value(rng: &mut StdRng, status: NodeStatus) -> Value {
    if status == NodeStatus::Offline {
        Value::Null
    } else {
        json!(rng.gen_range(15..=250))
    }
}
