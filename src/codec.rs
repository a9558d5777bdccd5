//! Wire codec for beacon records.
//!
//! Platform bridges hand over beacons as loosely-typed maps: numbers may be
//! JSON numbers or numeric strings, optional fields may be missing, and the
//! identity scheme depends on the beacon technology. This module turns those
//! maps into [`BeaconRecord`]s and back.
//!
//! Coercion is permissive by default (see [`crate::coerce`]). The only hard
//! failures are a non-object entry and a missing or wrong-typed identity field.

use crate::beacon::{BeaconFields, BeaconKind, BeaconRecord};
use crate::coerce::{parse_double, parse_double_opt, parse_int};
use crate::proximity::{Proximity, classify, parse_proximity_string};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

pub const TYPE: &str = "type";
pub const PROXIMITY_UUID: &str = "proximityUUID";
pub const MAC_ADDRESS: &str = "macAddress";
pub const MAJOR: &str = "major";
pub const MINOR: &str = "minor";
pub const NAMESPACE_ID: &str = "namespaceId";
pub const INSTANCE_ID: &str = "instanceId";
pub const RSSI: &str = "rssi";
pub const TX_POWER: &str = "txPower";
pub const ACCURACY: &str = "accuracy";
pub const PROXIMITY: &str = "proximity";

/// Error types for decoding raw beacon maps.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The raw entry was not a JSON object
    #[error("Invalid data: beacon entry is not an object")]
    NotAnObject,
    /// A required identity field was absent or null
    #[error("Missing field: {field}")]
    MissingField { field: &'static str },
    /// A required identity field had the wrong JSON type
    #[error("Invalid field: {field} (expected {expected})")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    /// The frame could not be parsed as JSON at all
    #[error("Invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err.to_string())
    }
}

/// Convenience alias for decoded records or decode errors.
pub type BeaconResult = Result<BeaconRecord, DecodeError>;

fn required_str(map: &Map<String, Value>, field: &'static str) -> Result<String, DecodeError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

fn required_int(map: &Map<String, Value>, field: &'static str) -> Result<i64, DecodeError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField { field }),
        Some(value) => value.as_i64().ok_or(DecodeError::InvalidField {
            field,
            expected: "integer",
        }),
    }
}

fn optional_str(map: &Map<String, Value>, field: &'static str) -> Option<String> {
    match map.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => {
            debug!(field, value = %other, "ignoring non-string value");
            None
        }
    }
}

/// Decode a single raw beacon map.
///
/// The record's proximity is `explicit_proximity` when given, otherwise
/// `Unknown`. The map's own `proximity` key is not consulted here; use
/// [`decode_batch`] for that.
///
/// # Errors
/// Returns a [`DecodeError`] if `raw` is not an object or an identity field
/// (`type`, `proximityUUID`, `major`, `minor`, `namespaceId`, `instanceId`)
/// is missing or has the wrong type.
pub fn decode_one(raw: &Value, explicit_proximity: Option<Proximity>) -> BeaconResult {
    let map = raw.as_object().ok_or(DecodeError::NotAnObject)?;

    let fields = BeaconFields {
        kind: BeaconKind::from_wire(&required_str(map, TYPE)?),
        proximity_uuid: required_str(map, PROXIMITY_UUID)?,
        mac_address: optional_str(map, MAC_ADDRESS),
        major: required_int(map, MAJOR)?,
        minor: required_int(map, MINOR)?,
        namespace_id: required_str(map, NAMESPACE_ID)?,
        instance_id: required_str(map, INSTANCE_ID)?,
        rssi: map.get(RSSI).and_then(parse_int),
        tx_power: map.get(TX_POWER).and_then(parse_int),
        accuracy: parse_double_opt(map.get(ACCURACY)),
    };

    Ok(BeaconRecord::with_proximity(
        fields,
        explicit_proximity.unwrap_or_default(),
    ))
}

/// Resolve the proximity of a raw batch entry.
///
/// A non-null `proximity` value wins (unrecognized text is `Unknown`);
/// otherwise a non-null `accuracy` is classified; otherwise `Unknown`.
fn entry_proximity(entry: &Value) -> Proximity {
    match entry.get(PROXIMITY) {
        Some(Value::String(s)) => parse_proximity_string(s),
        Some(v) if !v.is_null() => Proximity::Unknown,
        _ => match entry.get(ACCURACY) {
            Some(v) if !v.is_null() => classify(Some(parse_double(v))),
            _ => Proximity::Unknown,
        },
    }
}

/// Decode a batch of raw beacon maps with optional filtering.
///
/// Returns one element per input entry, in order. Entries rejected by a filter
/// yield `None` in their position rather than being removed. An empty filter
/// slice disables that filter. Non-array input yields an empty vector.
///
/// An entry passes the MAC filter only if it carries a `macAddress` string
/// that is a member of `mac_filter`.
pub fn decode_batch(
    raw_items: &Value,
    mac_filter: &[String],
    proximity_filter: &[Proximity],
) -> Vec<Option<BeaconResult>> {
    let Some(items) = raw_items.as_array() else {
        debug!("batch input is not an array, decoding nothing");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let proximity = entry_proximity(entry);

            let mac_ok = mac_filter.is_empty()
                || entry
                    .get(MAC_ADDRESS)
                    .and_then(Value::as_str)
                    .is_some_and(|mac| mac_filter.iter().any(|f| f == mac));
            let proximity_ok =
                proximity_filter.is_empty() || proximity_filter.contains(&proximity);

            if mac_ok && proximity_ok {
                Some(decode_one(entry, Some(proximity)))
            } else {
                trace!(index, %proximity, "entry filtered out");
                None
            }
        })
        .collect()
}

/// Encode a record into its outbound wire map.
///
/// `txPower` and `macAddress` are present only when the record has them;
/// `proximity` is the (possibly derived) category as a string.
pub fn encode(record: &BeaconRecord) -> Map<String, Value> {
    let mut map = Map::new();

    macro_rules! put {
        ($key:expr, $val:expr) => {
            map.insert($key.to_string(), Value::from($val));
        };
    }

    put!(TYPE, record.kind().as_str());
    put!(PROXIMITY_UUID, record.proximity_uuid());
    put!(MAJOR, record.major());
    put!(MINOR, record.minor());
    put!(NAMESPACE_ID, record.namespace_id());
    put!(INSTANCE_ID, record.instance_id());
    put!(RSSI, record.rssi());
    put!(ACCURACY, record.accuracy());
    put!(PROXIMITY, record.proximity().as_str());

    if let Some(tx_power) = record.tx_power() {
        put!(TX_POWER, tx_power);
    }
    if let Some(mac) = record.mac_address() {
        put!(MAC_ADDRESS, mac);
    }

    map
}

/// Element-wise [`encode`].
pub fn encode_batch(records: &[BeaconRecord]) -> Vec<Map<String, Value>> {
    records.iter().map(encode).collect()
}

/// Compact JSON text of [`encode`], for logging and comparisons.
pub fn to_display_string(record: &BeaconRecord) -> String {
    Value::Object(encode(record)).to_string()
}
