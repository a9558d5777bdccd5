//! Coarse distance classification for beacon sightings.
//!
//! A [`Proximity`] is derived from an accuracy estimate (meters) when the
//! platform does not supply one, and travels on the wire as a lowercase string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound (inclusive) of the `immediate` range, in meters.
pub const IMMEDIATE_MAX_METERS: f64 = 1.0;

/// Lower bound (inclusive) of the `far` range, in meters.
pub const FAR_MIN_METERS: f64 = 10.0;

/// Four-valued proximity category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Proximity {
    /// Distance could not be estimated
    #[default]
    Unknown,
    /// Within about a meter
    Immediate,
    /// Between one and ten meters
    Near,
    /// Ten meters or more
    Far,
}

impl Proximity {
    /// All categories in wire order.
    pub const ALL: [Proximity; 4] = [
        Proximity::Unknown,
        Proximity::Immediate,
        Proximity::Near,
        Proximity::Far,
    ];

    /// The wire string for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Proximity::Unknown => "unknown",
            Proximity::Immediate => "immediate",
            Proximity::Near => "near",
            Proximity::Far => "far",
        }
    }
}

/// Classify an accuracy estimate (meters) into a [`Proximity`].
///
/// `None` and `NaN` are `Unknown`. Zero is `Immediate`: there is deliberately
/// no special case for an exact `0.0`.
///
/// # Examples
/// ```
/// use beacon_records::proximity::{Proximity, classify};
///
/// assert_eq!(classify(None), Proximity::Unknown);
/// assert_eq!(classify(Some(1.0)), Proximity::Immediate);
/// assert_eq!(classify(Some(2.9)), Proximity::Near);
/// assert_eq!(classify(Some(10.0)), Proximity::Far);
/// ```
pub fn classify(accuracy: Option<f64>) -> Proximity {
    match accuracy {
        None => Proximity::Unknown,
        Some(a) if a <= IMMEDIATE_MAX_METERS => Proximity::Immediate,
        Some(a) if a < FAR_MIN_METERS => Proximity::Near,
        Some(a) if a >= FAR_MIN_METERS => Proximity::Far,
        Some(_) => Proximity::Unknown,
    }
}

/// Parse a wire proximity string. Anything unrecognized is `Unknown`.
pub fn parse_proximity_string(text: &str) -> Proximity {
    match text {
        "immediate" => Proximity::Immediate,
        "near" => Proximity::Near,
        "far" => Proximity::Far,
        _ => Proximity::Unknown,
    }
}

/// Inverse of [`parse_proximity_string`].
pub fn proximity_to_string(proximity: Proximity) -> &'static str {
    proximity.as_str()
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Proximity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_proximity_string(s))
    }
}
