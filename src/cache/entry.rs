//! Cache entry schema and legacy-format migration
//!
//! Entries on disk come in two shapes. Current records wrap the provider
//! payload together with the time it was obtained:
//!
//! ```json
//! { "timestamp": 1717490000.5, "data": { "aqi": 42, ... } }
//! ```
//!
//! Legacy records predate timestamps and hold the payload itself. Any value
//! that is not a current record is treated as legacy. Legacy entries are
//! rewritten in place as current records on first access, stamped with the
//! access time since the original fetch time cannot be recovered.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::CacheKey;
use super::store::Cache;

/// Field holding the fetch time (epoch seconds)
const TIMESTAMP_FIELD: &str = "timestamp";

/// Field holding the payload, as written by this tool
const DATA_FIELD: &str = "data";

/// Alternate payload field accepted on read
const PAYLOAD_FIELD: &str = "payload";

/// A payload together with the time it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    /// Epoch seconds at which the payload was fetched (or migrated)
    pub timestamp: f64,
    /// Opaque provider document
    pub payload: Value,
}

impl CacheRecord {
    /// Creates a record stamped with `timestamp`
    pub fn new(timestamp: f64, payload: Value) -> Self {
        Self { timestamp, payload }
    }

    /// Age of the record in seconds relative to `now`
    pub fn age_secs(&self, now: f64) -> f64 {
        now - self.timestamp
    }
}

/// Shape of a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Raw payload without a timestamp
    Legacy,
    /// Timestamped record
    Current,
}

/// A stored cache value, decided by [`classify`]
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// Value stored before timestamps existed; the value is the payload
    Legacy(Value),
    /// Timestamped record
    Current(CacheRecord),
}

impl CacheEntry {
    /// Returns the shape of this entry
    pub fn kind(&self) -> EntryKind {
        match self {
            CacheEntry::Legacy(_) => EntryKind::Legacy,
            CacheEntry::Current(_) => EntryKind::Current,
        }
    }

    /// Returns the payload regardless of shape
    pub fn payload(&self) -> &Value {
        match self {
            CacheEntry::Legacy(value) => value,
            CacheEntry::Current(record) => &record.payload,
        }
    }
}

/// Classifies a raw stored value without consuming it
///
/// A value is current iff it is an object with a numeric `timestamp` and a
/// `data` (or `payload`) field.
pub fn classify(value: &Value) -> EntryKind {
    let Some(map) = value.as_object() else {
        return EntryKind::Legacy;
    };

    let has_timestamp = map.get(TIMESTAMP_FIELD).is_some_and(Value::is_number);
    let has_payload = map.contains_key(DATA_FIELD) || map.contains_key(PAYLOAD_FIELD);

    if has_timestamp && has_payload {
        EntryKind::Current
    } else {
        EntryKind::Legacy
    }
}

/// Converts a raw stored value into a typed entry
pub fn parse_entry(value: Value) -> CacheEntry {
    if classify(&value) == EntryKind::Legacy {
        return CacheEntry::Legacy(value);
    }

    let Value::Object(mut map) = value else {
        return CacheEntry::Legacy(value);
    };

    let timestamp = map
        .get(TIMESTAMP_FIELD)
        .and_then(Value::as_f64)
        .unwrap_or_default();
    let payload = map
        .remove(DATA_FIELD)
        .or_else(|| map.remove(PAYLOAD_FIELD))
        .unwrap_or(Value::Null);

    CacheEntry::Current(CacheRecord { timestamp, payload })
}

/// Migrates a legacy entry at `key` to a current record stamped with `now`
///
/// Returns the payload unchanged, or `None` if the key is absent. Calling this
/// on an entry that is already current leaves it untouched and returns its
/// payload.
pub fn migrate(cache: &mut Cache, key: &CacheKey, now: f64) -> Option<Value> {
    let entry = cache.get_mut(key)?;

    if let CacheEntry::Legacy(value) = entry {
        let payload = std::mem::take(value);
        *entry = CacheEntry::Current(CacheRecord::new(now, payload));
    }

    Some(entry.payload().clone())
}

impl Serialize for CacheEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CacheEntry::Legacy(value) => value.serialize(serializer),
            CacheEntry::Current(record) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(TIMESTAMP_FIELD, &record.timestamp)?;
                map.serialize_entry(DATA_FIELD, &record.payload)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for CacheEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(parse_entry(value))
    }
}
