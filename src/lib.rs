//! `beacon-records` library.
//!
//! Decodes loosely-typed beacon maps surfaced by a ranging/monitoring bridge
//! into [`BeaconRecord`]s, classifies proximity, compares beacons by their
//! technology identity, and encodes them back to wire maps.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing and process exit codes.
//! The run loop lives in [`crate::app`] where it can be tested
//! deterministically with an injected frame source + injected output streams.

pub mod app;
pub mod beacon;
pub mod codec;
pub mod coerce;
pub mod logging;
pub mod output;
pub mod platform;
pub mod proximity;
pub mod source;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types at the crate root
pub use beacon::{BeaconFields, BeaconKind, BeaconRecord, IdentityKey, Keyed, RSSI_UNSET};
pub use codec::{
    BeaconResult, DecodeError, decode_batch, decode_one, encode, encode_batch, to_display_string,
};
pub use coerce::{parse_double, parse_int};
pub use output::OutputFormatter;
pub use output::influxdb::InfluxDbFormatter;
pub use output::json::JsonFormatter;
pub use platform::Platform;
pub use proximity::{Proximity, classify, parse_proximity_string, proximity_to_string};
pub use source::{FrameResult, FrameSource, SourceError, StdinSource};
pub use throttle::{Throttle, parse_duration};
