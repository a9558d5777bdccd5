//! Per-beacon rate limiting.
//!
//! Ranging callbacks report the same beacon many times per second. A
//! [`Throttle`] lets at most one sighting per beacon identity through each
//! interval, which keeps the output readable when a beacon sits still.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A throttle that limits the rate of events per key.
///
/// Each key is tracked independently, allowing at most one event per
/// `interval`. The first event for a key is always allowed, and a blocked
/// event does not restart the interval.
#[derive(Debug)]
pub struct Throttle<K> {
    /// Minimum time between events for each key
    interval: Duration,
    /// Last admitted event time per key
    last_seen: HashMap<K, Instant>,
}

impl<K: Hash + Eq> Throttle<K> {
    /// Create a new throttle with the specified minimum interval between events.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use beacon_records::throttle::Throttle;
    ///
    /// let mut throttle = Throttle::new(Duration::from_secs(3));
    /// assert!(throttle.should_emit("beacon-a"));
    /// assert!(!throttle.should_emit("beacon-a"));
    /// ```
    pub fn new(interval: Duration) -> Self {
        Throttle {
            interval,
            last_seen: HashMap::new(),
        }
    }

    /// Returns `true` if an event for `key` should be emitted now.
    ///
    /// When `true` is returned the interval for `key` restarts.
    pub fn should_emit(&mut self, key: K) -> bool {
        let now = Instant::now();

        match self.last_seen.get(&key) {
            Some(last) if now.duration_since(*last) < self.interval => false,
            _ => {
                self.last_seen.insert(key, now);
                true
            }
        }
    }

    /// Number of distinct keys seen so far.
    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}

/// Parse a duration from a human-readable string.
///
/// Supports `ms`, `s`, `m` and `h` suffixes; a bare number is seconds.
///
/// # Examples
/// ```
/// use beacon_records::throttle::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
/// assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    let src = src.trim();

    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    // "ms" must be tried before "m" and "s".
    let units: [(&str, &str, fn(u64) -> Duration); 4] = [
        ("ms", "milliseconds", Duration::from_millis),
        ("h", "hours", |n| Duration::from_secs(n.saturating_mul(3600))),
        ("m", "minutes", |n| Duration::from_secs(n.saturating_mul(60))),
        ("s", "seconds", Duration::from_secs),
    ];

    for (suffix, unit, make) in units {
        if let Some(num) = src.strip_suffix(suffix) {
            let n: u64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid {}: {}", unit, num))?;
            return Ok(make(n));
        }
    }

    let secs: u64 = src
        .parse()
        .map_err(|_| format!("invalid duration: {}", src))?;
    Ok(Duration::from_secs(secs))
}
