//! Host platform capabilities that influence beacon identity.

use std::fmt;
use std::str::FromStr;

/// The host platform that surfaced the beacon records.
///
/// Only one capability matters to the record model: whether the platform
/// reliably reports the advertiser's MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Platform {
    /// Android-like hosts expose the advertiser MAC address
    #[default]
    Android,
    /// iOS-like hosts withhold the MAC address
    Ios,
}

impl Platform {
    /// Does this platform reliably report MAC addresses?
    #[inline]
    pub fn reports_mac_address(self) -> bool {
        matches!(self, Platform::Android)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" | "macos" | "darwin" => Ok(Platform::Ios),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}
