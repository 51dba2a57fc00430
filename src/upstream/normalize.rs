//! Normalization boundary for upstream node payloads
//!
//! The status API has no stable schema, so every canonical field is read
//! through an explicit alias table. Nothing outside this module looks at raw
//! upstream JSON.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use super::{FetchError, FetchErrorKind};
use crate::models::{Coordinates, Location, NodeRecord, NodeStatus, Storage, SOURCE_MARKER_KEY};

// == Alias Table ==
/// Where a canonical field may appear in an upstream node object.
#[derive(Debug, Clone, Copy)]
enum Alias {
    /// Top-level key
    Key(&'static str),
    /// Key inside a nested object
    Nested(&'static str, &'static str),
}

use Alias::{Key, Nested};

const ID: &[Alias] = &[Key("id"), Key("nodeId"), Key("pubkey")];
const STATUS: &[Alias] = &[Key("status"), Key("gossipStatus")];
const STORAGE_USED: &[Alias] = &[Nested("storage", "used"), Key("storageUsed")];
const STORAGE_TOTAL: &[Alias] = &[Nested("storage", "total"), Key("storageTotal")];
const STORAGE_AVAILABLE: &[Alias] = &[Nested("storage", "available"), Key("storageAvailable")];
const COUNTRY: &[Alias] = &[Nested("location", "country"), Key("country")];
const REGION: &[Alias] = &[Nested("location", "region"), Key("region")];
const CITY: &[Alias] = &[Nested("location", "city"), Key("city")];
const COORDINATES: &[Alias] = &[Nested("location", "coordinates"), Key("coordinates")];
const UPTIME: &[Alias] = &[Key("uptime")];
const VERSION: &[Alias] = &[Key("version")];
const LAST_SEEN: &[Alias] = &[Key("lastSeen"), Key("last_seen")];
const IP: &[Alias] = &[Key("ip"), Key("ipAddress")];
const PORT: &[Alias] = &[Key("port")];
const LATENCY: &[Alias] = &[Key("latency")];

/// Version placeholder for nodes that do not report one.
const UNKNOWN_VERSION: &str = "unknown";

/// Every non-null value found through `aliases`, in table order.
fn candidates<'a>(
    node: &'a Map<String, Value>,
    aliases: &'a [Alias],
) -> impl Iterator<Item = &'a Value> + 'a {
    aliases
        .iter()
        .filter_map(move |alias| match alias {
            Key(key) => node.get(*key),
            Nested(parent, key) => node.get(*parent)?.as_object()?.get(*key),
        })
        .filter(|value| !value.is_null())
}

/// First alias whose value survives `coerce`; an empty or mistyped value
/// falls through to the next alias.
fn lookup<T>(
    node: &Map<String, Value>,
    aliases: &[Alias],
    coerce: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    candidates(node, aliases).find_map(coerce)
}

// == Envelope ==
/// Normalizes a list response: a bare array or an object with `nodes`.
pub fn normalize_list(body: Value) -> Result<Vec<NodeRecord>, FetchError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("nodes") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(FetchError::new(
                    FetchErrorKind::Shape,
                    "expected an array or an object with a `nodes` array",
                ))
            }
        },
        other => {
            return Err(FetchError::new(
                FetchErrorKind::Shape,
                format!("expected a node list, got {}", json_type(&other)),
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            normalize_node(item).map_err(|err| FetchError {
                message: format!("node #{index}: {}", err.message),
                ..err
            })
        })
        .collect()
}

// == Single Node ==
/// Maps one upstream node object onto a [`NodeRecord`].
///
/// The identifier is the only required field; everything else defaults.
pub fn normalize_node(raw: &Value) -> Result<NodeRecord, FetchError> {
    let node = raw.as_object().ok_or_else(|| {
        FetchError::new(
            FetchErrorKind::Normalization,
            format!("expected a node object, got {}", json_type(raw)),
        )
    })?;

    let id = lookup(node, ID, as_text).ok_or_else(|| {
        FetchError::new(
            FetchErrorKind::Normalization,
            "node has none of `id`, `nodeId`, `pubkey`",
        )
    })?;

    let status = lookup(node, STATUS, |value| value.as_str().map(NodeStatus::parse))
        .unwrap_or_default();

    let storage = normalize_storage(&id, node);

    let location = Location {
        country: lookup(node, COUNTRY, as_text).unwrap_or_else(|| Location::default().country),
        region: lookup(node, REGION, as_text).unwrap_or_else(|| Location::default().region),
        city: lookup(node, CITY, as_text).unwrap_or_else(|| Location::default().city),
        coordinates: lookup(node, COORDINATES, as_coordinates),
    };

    let last_seen = lookup(node, LAST_SEEN, as_timestamp).unwrap_or_else(Utc::now);

    Ok(NodeRecord {
        id,
        status,
        storage,
        location,
        uptime: lookup(node, UPTIME, as_count).unwrap_or(0),
        version: lookup(node, VERSION, as_text)
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        last_seen,
        metadata: normalize_metadata(node),
    })
}

/// Builds a consistent storage block and flags inputs that were not.
fn normalize_storage(id: &str, node: &Map<String, Value>) -> Storage {
    let used = lookup(node, STORAGE_USED, as_count).unwrap_or(0);
    let available = lookup(node, STORAGE_AVAILABLE, as_count);
    let total = lookup(node, STORAGE_TOTAL, as_count)
        .unwrap_or_else(|| used.saturating_add(available.unwrap_or(0)));

    let storage = Storage::new(used, total);
    let reported = Storage {
        used,
        total,
        available: available.unwrap_or(storage.available),
    };
    if !reported.is_consistent() {
        warn!(
            node = %id,
            used, total, available = reported.available,
            "upstream storage violates used + available == total; available recomputed"
        );
    }
    storage
}

fn normalize_metadata(node: &Map<String, Value>) -> Map<String, Value> {
    let mut metadata = Map::new();
    for (key, aliases) in [("ip", IP), ("port", PORT), ("latency", LATENCY)] {
        if let Some(value) = candidates(node, aliases).next() {
            metadata.insert(key.to_string(), value.clone());
        }
    }
    if let Some(Value::Object(extra)) = node.get("metadata") {
        metadata.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    // The origin marker is reserved for generated records
    metadata.remove(SOURCE_MARKER_KEY);
    metadata
}

// == Value Coercions ==
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer from a number or numeric string; fractions are floored.
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_coordinates(value: &Value) -> Option<Coordinates> {
    let object = value.as_object()?;
    let lat = object.get("lat").or_else(|| object.get("latitude"))?.as_f64()?;
    let lon = object
        .get("lon")
        .or_else(|| object.get("lng"))
        .or_else(|| object.get("longitude"))?
        .as_f64()?;
    Some(Coordinates { lat, lon })
}

/// RFC 3339 text, or Unix seconds (milliseconds above 10^12).
fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Value::Number(n) => {
            let raw = n.as_i64()?;
            if raw > 1_000_000_000_000 {
                Utc.timestamp_millis_opt(raw).single()
            } else {
                Utc.timestamp_opt(raw, 0).single()
            }
        }
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
