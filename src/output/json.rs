//! Compact JSON output, identical to the record's display string.

use crate::beacon::BeaconRecord;
use crate::codec::to_display_string;
use crate::output::OutputFormatter;

/// Writes each record as its encoded wire map in compact JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, record: &BeaconRecord) -> String {
        to_display_string(record)
    }
}
