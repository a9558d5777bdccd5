//! The beacon record entity and its technology-aware identity.

use crate::platform::Platform;
use crate::proximity::{Proximity, classify};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Stored RSSI when the platform did not supply one.
pub const RSSI_UNSET: i64 = -1;

/// Beacon technology, taken from the wire `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BeaconKind {
    /// AltBeacon (and iBeacon-style) frames, identified by UUID/major/minor
    AltBeacon,
    /// Eddystone-UID frames, identified by namespace/instance
    Eddystone,
    /// Any other discriminator; identified like AltBeacon
    Other(String),
}

impl BeaconKind {
    /// Interpret a wire `type` string. Matching is exact.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "altbeacon" => BeaconKind::AltBeacon,
            "eddystone" => BeaconKind::Eddystone,
            other => BeaconKind::Other(other.to_string()),
        }
    }

    /// The wire `type` string.
    pub fn as_str(&self) -> &str {
        match self {
            BeaconKind::AltBeacon => "altbeacon",
            BeaconKind::Eddystone => "eddystone",
            BeaconKind::Other(s) => s,
        }
    }
}

impl fmt::Display for BeaconKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain field values used to construct a [`BeaconRecord`].
///
/// `rssi` may be left unset here; the record normalizes it to [`RSSI_UNSET`].
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconFields {
    pub kind: BeaconKind,
    pub proximity_uuid: String,
    pub mac_address: Option<String>,
    pub major: i64,
    pub minor: i64,
    pub namespace_id: String,
    pub instance_id: String,
    pub rssi: Option<i64>,
    pub tx_power: Option<i64>,
    /// Estimated distance in meters; non-finite values are stored as `0.0`
    pub accuracy: f64,
}

/// An immutable beacon sighting.
///
/// Equality is not structural: it depends on the beacon technology and on
/// whether the host platform reports MAC addresses, so it is exposed through
/// [`BeaconRecord::matches`] and [`BeaconRecord::keyed`] instead of `PartialEq`.
#[derive(Debug, Clone)]
pub struct BeaconRecord {
    kind: BeaconKind,
    proximity_uuid: String,
    mac_address: Option<String>,
    major: i64,
    minor: i64,
    namespace_id: String,
    instance_id: String,
    rssi: i64,
    tx_power: Option<i64>,
    accuracy: f64,
    // Set at construction when resolved, otherwise filled on first read.
    proximity: OnceLock<Proximity>,
}

impl BeaconRecord {
    /// Build a record whose proximity is derived from `accuracy` when first read.
    pub fn new(fields: BeaconFields) -> Self {
        Self::from_parts(fields, OnceLock::new())
    }

    /// Build a record with an already resolved proximity.
    pub fn with_proximity(fields: BeaconFields, proximity: Proximity) -> Self {
        Self::from_parts(fields, OnceLock::from(proximity))
    }

    fn from_parts(fields: BeaconFields, proximity: OnceLock<Proximity>) -> Self {
        Self {
            kind: fields.kind,
            proximity_uuid: fields.proximity_uuid,
            mac_address: fields.mac_address,
            major: fields.major,
            minor: fields.minor,
            namespace_id: fields.namespace_id,
            instance_id: fields.instance_id,
            rssi: fields.rssi.unwrap_or(RSSI_UNSET),
            tx_power: fields.tx_power,
            accuracy: if fields.accuracy.is_finite() {
                fields.accuracy
            } else {
                0.0
            },
            proximity,
        }
    }

    pub fn kind(&self) -> &BeaconKind {
        &self.kind
    }

    pub fn proximity_uuid(&self) -> &str {
        &self.proximity_uuid
    }

    pub fn mac_address(&self) -> Option<&str> {
        self.mac_address.as_deref()
    }

    pub fn major(&self) -> i64 {
        self.major
    }

    pub fn minor(&self) -> i64 {
        self.minor
    }

    pub fn namespace_id(&self) -> &str {
        &self.namespace_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Signal strength in dBm, or [`RSSI_UNSET`].
    pub fn rssi(&self) -> i64 {
        self.rssi
    }

    pub fn tx_power(&self) -> Option<i64> {
        self.tx_power
    }

    /// Estimated distance in meters (`0.0` when unknown).
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// The proximity category.
    ///
    /// Returns the resolved value if one was given at construction; otherwise
    /// classifies `accuracy` once and caches the result.
    pub fn proximity(&self) -> Proximity {
        *self
            .proximity
            .get_or_init(|| classify(Some(self.accuracy)))
    }

    /// Technology-aware equality.
    ///
    /// Records of different kinds never match. AltBeacon and Eddystone compare
    /// their identity fields, plus the MAC address when `platform` reports it.
    /// Other kinds compare the AltBeacon triple and, if `self` carries a MAC
    /// address, require `other` to carry the same one.
    pub fn matches(&self, other: &BeaconRecord, platform: Platform) -> bool {
        if self.kind != other.kind {
            return false;
        }

        match self.kind {
            BeaconKind::AltBeacon => self.same_triple(other) && self.same_mac(other, platform),
            BeaconKind::Eddystone => {
                self.namespace_id == other.namespace_id
                    && self.instance_id == other.instance_id
                    && self.same_mac(other, platform)
            }
            BeaconKind::Other(_) => {
                self.same_triple(other)
                    && self
                        .mac_address
                        .as_deref()
                        .is_none_or(|mac| other.mac_address.as_deref() == Some(mac))
            }
        }
    }

    fn same_triple(&self, other: &BeaconRecord) -> bool {
        self.proximity_uuid == other.proximity_uuid
            && self.major == other.major
            && self.minor == other.minor
    }

    fn same_mac(&self, other: &BeaconRecord, platform: Platform) -> bool {
        !platform.reports_mac_address() || self.mac_address == other.mac_address
    }

    /// Technology identifier without the MAC address: `uuid:major:minor`, or
    /// `namespace:instance` for Eddystone.
    pub fn technology_id(&self) -> String {
        match self.kind {
            BeaconKind::Eddystone => format!("{}:{}", self.namespace_id, self.instance_id),
            BeaconKind::AltBeacon | BeaconKind::Other(_) => {
                format!("{}:{}:{}", self.proximity_uuid, self.major, self.minor)
            }
        }
    }

    /// The identity key of this record as seen on `platform`.
    pub fn identity(&self, platform: Platform) -> IdentityKey {
        let reported_mac = if platform.reports_mac_address() {
            self.mac_address.clone()
        } else {
            None
        };

        match &self.kind {
            BeaconKind::AltBeacon => IdentityKey::AltBeacon {
                proximity_uuid: self.proximity_uuid.clone(),
                major: self.major,
                minor: self.minor,
                mac_address: reported_mac,
            },
            BeaconKind::Eddystone => IdentityKey::Eddystone {
                namespace_id: self.namespace_id.clone(),
                instance_id: self.instance_id.clone(),
                mac_address: reported_mac,
            },
            BeaconKind::Other(kind) => IdentityKey::Other {
                kind: kind.clone(),
                proximity_uuid: self.proximity_uuid.clone(),
                major: self.major,
                minor: self.minor,
                mac_address: self.mac_address.clone(),
            },
        }
    }

    /// Borrow this record with `platform` attached so it can live in hashed
    /// collections.
    pub fn keyed(&self, platform: Platform) -> Keyed<'_> {
        Keyed {
            record: self,
            platform,
        }
    }
}

/// Hashes the technology identity plus the MAC address whenever present.
///
/// The MAC is hashed regardless of platform, so two records that
/// [`BeaconRecord::matches`] on a platform without MAC reporting may still
/// hash differently if their MACs differ. Use [`Keyed`] for hashed collections.
impl Hash for BeaconRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.kind {
            BeaconKind::Eddystone => {
                self.namespace_id.hash(state);
                self.instance_id.hash(state);
            }
            BeaconKind::AltBeacon | BeaconKind::Other(_) => {
                self.proximity_uuid.hash(state);
                self.major.hash(state);
                self.minor.hash(state);
            }
        }
        if let Some(mac) = &self.mac_address {
            mac.hash(state);
        }
    }
}

impl fmt::Display for BeaconRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::codec::to_display_string(self))
    }
}

/// Owned identity of a beacon, one variant per technology.
///
/// The MAC address is part of the key for AltBeacon and Eddystone only when
/// the platform reports it; other kinds keep whatever MAC they carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    AltBeacon {
        proximity_uuid: String,
        major: i64,
        minor: i64,
        mac_address: Option<String>,
    },
    Eddystone {
        namespace_id: String,
        instance_id: String,
        mac_address: Option<String>,
    },
    Other {
        kind: String,
        proximity_uuid: String,
        major: i64,
        minor: i64,
        mac_address: Option<String>,
    },
}

impl IdentityKey {
    pub fn mac_address(&self) -> Option<&str> {
        match self {
            IdentityKey::AltBeacon { mac_address, .. }
            | IdentityKey::Eddystone { mac_address, .. }
            | IdentityKey::Other { mac_address, .. } => mac_address.as_deref(),
        }
    }
}

/// Technology identifier without the MAC address, e.g. `uuid:1:2` or
/// `namespace:instance`.
impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::AltBeacon {
                proximity_uuid,
                major,
                minor,
                ..
            }
            | IdentityKey::Other {
                proximity_uuid,
                major,
                minor,
                ..
            } => write!(f, "{}:{}:{}", proximity_uuid, major, minor),
            IdentityKey::Eddystone {
                namespace_id,
                instance_id,
                ..
            } => write!(f, "{}:{}", namespace_id, instance_id),
        }
    }
}

/// A [`BeaconRecord`] paired with the platform its equality depends on.
///
/// Two keyed records are equal when each [`BeaconRecord::matches`] the other.
/// Checking both directions keeps `Eq` symmetric for kinds whose MAC rule is
/// one-sided. The hash covers only the technology identity so it stays
/// consistent with every MAC rule.
#[derive(Debug, Clone, Copy)]
pub struct Keyed<'a> {
    record: &'a BeaconRecord,
    platform: Platform,
}

impl<'a> Keyed<'a> {
    pub fn record(&self) -> &'a BeaconRecord {
        self.record
    }
}

impl PartialEq for Keyed<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.record.matches(other.record, self.platform)
            && other.record.matches(self.record, self.platform)
    }
}

impl Eq for Keyed<'_> {}

impl Hash for Keyed<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let r = self.record;
        r.kind.hash(state);
        match r.kind {
            BeaconKind::Eddystone => {
                r.namespace_id.hash(state);
                r.instance_id.hash(state);
            }
            BeaconKind::AltBeacon | BeaconKind::Other(_) => {
                r.proximity_uuid.hash(state);
                r.major.hash(state);
                r.minor.hash(state);
            }
        }
    }
}
