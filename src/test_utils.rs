use crate::beacon::{BeaconFields, BeaconKind};
use serde_json::{Value, json};

/// A stable MAC address for unit tests.
pub const TEST_MAC: &str = "AA:BB:CC:DD:EE:FF";

/// A stable AltBeacon proximity UUID for unit tests.
pub const TEST_UUID: &str = "2f234454-cf6d-4a0f-adf2-f4911ba9ffa6";

/// AltBeacon fields with every optional value populated.
///
/// Tests can override just the fields they care about.
pub fn altbeacon_fields() -> BeaconFields {
    BeaconFields {
        kind: BeaconKind::AltBeacon,
        proximity_uuid: TEST_UUID.to_string(),
        mac_address: Some(TEST_MAC.to_string()),
        major: 1,
        minor: 2,
        namespace_id: "edd1ebeac04e5defa017".to_string(),
        instance_id: "000000000001".to_string(),
        rssi: Some(-60),
        tx_power: Some(-59),
        accuracy: 1.5,
    }
}

/// Same as [`altbeacon_fields`] but tagged as Eddystone.
pub fn eddystone_fields() -> BeaconFields {
    BeaconFields {
        kind: BeaconKind::Eddystone,
        ..altbeacon_fields()
    }
}

/// A fully populated raw AltBeacon map as a platform bridge would deliver it.
pub fn raw_altbeacon() -> Value {
    json!({
        "type": "altbeacon",
        "proximityUUID": TEST_UUID,
        "macAddress": TEST_MAC,
        "major": 1,
        "minor": 2,
        "namespaceId": "edd1ebeac04e5defa017",
        "instanceId": "000000000001",
        "rssi": -60,
        "txPower": -59,
        "accuracy": 1.5
    })
}
