//! Core application runner for `beacon-records`.
//!
//! This module is intentionally decoupled from CLI parsing and process exit codes
//! so it can be tested deterministically with an injected frame source and
//! injected output streams.

use crate::beacon::{BeaconRecord, IdentityKey};
use crate::codec::decode_batch;
use crate::output::influxdb::InfluxDbFormatter;
use crate::output::json::JsonFormatter;
use crate::output::{Format, OutputFormatter};
use crate::platform::Platform;
use crate::proximity::Proximity;
use crate::source::{FrameSource, SourceError};
use crate::throttle::Throttle;
use clap::Parser;
use std::io;
use std::io::Write;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Host platform the records came from; decides whether MAC addresses
    /// count towards beacon identity.
    #[arg(long, default_value_t, value_enum)]
    pub platform: Platform,

    /// Only pass beacons with this MAC address. Repeatable.
    #[arg(long = "mac", value_name = "MAC")]
    pub mac_filter: Vec<String>,

    /// Only pass beacons in this proximity. Repeatable.
    #[arg(long = "proximity", value_enum, value_name = "PROXIMITY")]
    pub proximity_filter: Vec<Proximity>,

    /// Output format.
    #[arg(long, default_value_t, value_enum)]
    pub format: Format,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "beacon")]
    pub influxdb_measurement: String,

    /// Throttle output per beacon to at most one record per interval.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, value_parser = crate::throttle::parse_duration)]
    pub throttle: Option<Duration>,

    /// Verbose output, print decode errors for malformed entries
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            mac_filter: Vec::new(),
            proximity_filter: Vec::new(),
            format: Format::default(),
            influxdb_measurement: "beacon".to_string(),
            throttle: None,
            verbose: false,
        }
    }
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Counters for one run, reported when the source closes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub frames: usize,
    pub written: usize,
    pub filtered: usize,
    pub throttled: usize,
    pub errors: usize,
}

fn make_formatter(options: &Options) -> Box<dyn OutputFormatter> {
    match options.format {
        Format::Json => Box::new(JsonFormatter),
        Format::Influxdb => Box::new(InfluxDbFormatter::new(options.influxdb_measurement.clone())),
    }
}

fn write_record(
    formatter: &dyn OutputFormatter,
    record: &BeaconRecord,
    out: &mut dyn Write,
) -> io::Result<()> {
    let line = formatter.format(record);
    writeln!(out, "{line}")
}

/// Run the core processing loop, writing formatted output to `out` and verbose errors to `err`.
///
/// - Each frame goes through [`decode_batch`] with the configured filters.
/// - Decoded records are optionally throttled per beacon identity, formatted and written to `out`.
/// - Malformed frames and entries are written to `err` only when `options.verbose` is true.
pub async fn run_with_io(
    options: Options,
    source: &dyn FrameSource,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<RunStats, RunError> {
    let formatter = make_formatter(&options);
    let mut throttle: Option<Throttle<IdentityKey>> = options.throttle.map(Throttle::new);
    let mut stats = RunStats::default();

    let mut frames = source.start().await?;

    while let Some(frame) = frames.recv().await {
        stats.frames += 1;

        let frame = match frame {
            Ok(frame) => frame,
            Err(decode_err) => {
                stats.errors += 1;
                warn!(error = %decode_err, "dropping unreadable frame");
                if options.verbose {
                    writeln!(err, "{decode_err}")?;
                }
                continue;
            }
        };

        for entry in decode_batch(&frame, &options.mac_filter, &options.proximity_filter) {
            match entry {
                None => stats.filtered += 1,
                Some(Ok(record)) => {
                    let should_emit = throttle
                        .as_mut()
                        .is_none_or(|t| t.should_emit(record.identity(options.platform)));

                    if should_emit {
                        write_record(formatter.as_ref(), &record, out)?;
                        stats.written += 1;
                    } else {
                        stats.throttled += 1;
                    }
                }
                Some(Err(decode_err)) => {
                    stats.errors += 1;
                    warn!(error = %decode_err, "dropping malformed beacon entry");
                    if options.verbose {
                        writeln!(err, "{decode_err}")?;
                    }
                }
            }
        }
    }

    debug!(?stats, "source closed");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeError;
    use crate::source::{FrameResult, StartFuture};
    use crate::test_utils::{TEST_MAC, raw_altbeacon};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Debug)]
    struct FakeSource {
        frames: Mutex<Vec<FrameResult>>,
    }

    impl FakeSource {
        fn new(frames: Vec<FrameResult>) -> Self {
            Self {
                frames: Mutex::new(frames),
            }
        }
    }

    impl FrameSource for FakeSource {
        fn start(&self) -> StartFuture<'_> {
            let frames = self.frames.lock().unwrap().clone();
            Box::pin(async move {
                let (tx, rx) = mpsc::channel::<FrameResult>(frames.len().max(1));
                tokio::spawn(async move {
                    for f in frames {
                        let _ = tx.send(f).await;
                    }
                    // drop tx to close channel
                });
                Ok(rx)
            })
        }
    }

    async fn run(options: Options, frames: Vec<FrameResult>) -> (RunStats, String, String) {
        let source = FakeSource::new(frames);
        let mut out = Vec::<u8>::new();
        let mut err = Vec::<u8>::new();
        let stats = run_with_io(options, &source, &mut out, &mut err)
            .await
            .unwrap();
        (
            stats,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[tokio::test]
    async fn run_writes_json_lines_to_out() {
        let (stats, out, err) = run(
            Options::default(),
            vec![Ok(json!([raw_altbeacon(), raw_altbeacon()]))],
        )
        .await;

        assert!(err.is_empty());
        assert_eq!(stats.written, 2);
        assert_eq!(out.lines().count(), 2);

        let first: Value = serde_json::from_str(out.lines().next().unwrap()).unwrap();
        assert_eq!(first["macAddress"], TEST_MAC);
        // accuracy 1.5 classified on the batch path
        assert_eq!(first["proximity"], "near");
        assert!(out.ends_with('\n'));
    }

    #[tokio::test]
    async fn run_writes_influxdb_lines() {
        let options = Options {
            format: Format::Influxdb,
            influxdb_measurement: "ranging".to_string(),
            ..Options::default()
        };
        let (_, out, _) = run(options, vec![Ok(json!([raw_altbeacon()]))]).await;

        assert!(out.starts_with("ranging,"));
        assert!(out.contains("rssi=-60i"));
    }

    #[tokio::test]
    async fn run_applies_filters() {
        let mut far = raw_altbeacon();
        far["proximity"] = json!("far");
        let mut stranger = raw_altbeacon();
        stranger["macAddress"] = json!("11:22:33:44:55:66");

        let options = Options {
            mac_filter: vec![TEST_MAC.to_string()],
            proximity_filter: vec![Proximity::Near],
            ..Options::default()
        };
        let (stats, out, _) = run(
            options,
            vec![Ok(json!([raw_altbeacon(), far, stranger]))],
        )
        .await;

        assert_eq!(out.lines().count(), 1);
        assert_eq!(stats.written, 1);
        assert_eq!(stats.filtered, 2);
    }

    #[tokio::test]
    async fn run_applies_throttle_per_beacon() {
        let mut other = raw_altbeacon();
        other["minor"] = json!(3);

        let options = Options {
            throttle: Some(Duration::from_secs(3600)),
            ..Options::default()
        };
        let (stats, out, _) = run(
            options,
            vec![
                Ok(json!([raw_altbeacon(), other])),
                Ok(json!([raw_altbeacon()])),
            ],
        )
        .await;

        assert_eq!(out.lines().count(), 2);
        assert_eq!(stats.throttled, 1);
    }

    #[tokio::test]
    async fn run_ignores_non_array_frames() {
        let (stats, out, err) = run(Options::default(), vec![Ok(json!(42))]).await;
        assert!(out.is_empty());
        assert!(err.is_empty());
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.written, 0);
    }

    #[tokio::test]
    async fn run_prints_decode_errors_only_when_verbose() {
        let mut broken = raw_altbeacon();
        broken.as_object_mut().unwrap().remove("major");
        let frames = vec![
            Ok(json!([broken])),
            Err(DecodeError::Json("bad frame".to_string())),
        ];

        // non-verbose: nothing written
        let (stats, out, err) = run(Options::default(), frames.clone()).await;
        assert!(out.is_empty());
        assert!(err.is_empty());
        assert_eq!(stats.errors, 2);

        // verbose: errors are written to err
        let options = Options {
            verbose: true,
            ..Options::default()
        };
        let (_, out, err) = run(options, frames).await;
        assert!(out.is_empty());
        assert!(err.contains("Missing field: major"));
        assert!(err.contains("Invalid JSON: bad frame"));
    }

    #[test]
    fn options_parse_from_args() {
        let options = Options::try_parse_from([
            "beacon-records",
            "--platform",
            "ios",
            "--mac",
            "AA:BB:CC:DD:EE:FF",
            "--proximity",
            "near",
            "--proximity",
            "immediate",
            "--format",
            "influxdb",
            "--throttle",
            "3s",
            "-v",
        ])
        .unwrap();

        assert_eq!(options.platform, Platform::Ios);
        assert_eq!(options.mac_filter, vec![TEST_MAC.to_string()]);
        assert_eq!(
            options.proximity_filter,
            vec![Proximity::Near, Proximity::Immediate]
        );
        assert_eq!(options.format, Format::Influxdb);
        assert_eq!(options.throttle, Some(Duration::from_secs(3)));
        assert!(options.verbose);
    }

    #[test]
    fn options_defaults() {
        let options = Options::try_parse_from(["beacon-records"]).unwrap();
        assert_eq!(options.platform, Platform::Android);
        assert!(options.mac_filter.is_empty());
        assert!(options.proximity_filter.is_empty());
        assert_eq!(options.format, Format::Json);
        assert_eq!(options.influxdb_measurement, "beacon");
        assert_eq!(options.throttle, None);
    }

    #[test]
    fn options_reject_unknown_proximity() {
        assert!(Options::try_parse_from(["beacon-records", "--proximity", "close"]).is_err());
    }
}
