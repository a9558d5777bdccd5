//! InfluxDB line protocol output formatter.

use crate::beacon::BeaconRecord;
use crate::output::OutputFormatter;
use std::collections::BTreeMap;
use std::fmt;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::Integer(num) => write!(f, "{num}i"),
            FieldValue::String(s) => write!(f, "\"{}\"", escape_field_string(s)),
        }
    }
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
}

/// Escape backslashes and double quotes inside a string field value.
fn escape_field_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape commas and spaces in the measurement name.
fn escape_measurement(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape commas, spaces and equals signs in tag keys and values.
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn fmt_tags(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    for (key, value) in data_point.tag_set.iter() {
        write!(fmt, ",{}={}", escape_tag(key), escape_tag(value))?;
    }
    Ok(())
}

fn fmt_fields(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (key, value) in data_point.field_set.iter() {
        if first {
            first = false;
        } else {
            write!(fmt, ",")?;
        }
        write!(fmt, "{}={}", key, value)?;
    }
    Ok(())
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", escape_measurement(&self.measurement))?;
        fmt_tags(self, fmt)?;
        write!(fmt, " ")?;
        fmt_fields(self, fmt)
    }
}

/// InfluxDB line protocol formatter.
///
/// Records carry no timestamp, so lines are written without one and the
/// database assigns arrival time.
pub struct InfluxDbFormatter {
    /// The measurement name in InfluxDB
    measurement_name: String,
}

impl InfluxDbFormatter {
    /// Create a new InfluxDB formatter.
    ///
    /// # Arguments
    /// * `measurement_name` - The measurement name to use in the line protocol
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    /// Tags: beacon type, technology identifier and MAC address when present.
    fn tag_set(&self, record: &BeaconRecord) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("type".to_string(), record.kind().to_string());
        tags.insert("id".to_string(), record.technology_id());
        if let Some(mac) = record.mac_address() {
            tags.insert("mac".to_string(), mac.to_string());
        }
        tags
    }

    fn field_set(&self, record: &BeaconRecord) -> BTreeMap<String, FieldValue> {
        let mut fields = BTreeMap::new();
        fields.insert("rssi".into(), FieldValue::Integer(record.rssi()));
        fields.insert("accuracy".into(), FieldValue::Float(record.accuracy()));
        fields.insert(
            "proximity".into(),
            FieldValue::String(record.proximity().to_string()),
        );
        if let Some(tx_power) = record.tx_power() {
            fields.insert("tx_power".into(), FieldValue::Integer(tx_power));
        }
        fields
    }

    fn to_data_point(&self, record: &BeaconRecord) -> DataPoint {
        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set: self.tag_set(record),
            field_set: self.field_set(record),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, record: &BeaconRecord) -> String {
        format!("{}", self.to_data_point(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::{BeaconKind, BeaconRecord};
    use crate::proximity::Proximity;
    use crate::test_utils::{TEST_UUID, altbeacon_fields, eddystone_fields};

    #[test]
    fn test_field_value_display() {
        assert_eq!(format!("{}", FieldValue::Float(3.5)), "3.5");
        assert_eq!(format!("{}", FieldValue::Integer(-60)), "-60i");
        assert_eq!(
            format!("{}", FieldValue::String("near".to_string())),
            "\"near\""
        );
        assert_eq!(
            format!("{}", FieldValue::String("a\"b".to_string())),
            "\"a\\\"b\""
        );
        assert_eq!(
            format!("{}", FieldValue::String("C:\\beacons\\".to_string())),
            "\"C:\\\\beacons\\\\\""
        );
    }

    #[test]
    fn test_data_point_format() {
        let mut tags = BTreeMap::new();
        tags.insert("type".to_string(), "altbeacon".to_string());
        tags.insert("room".to_string(), "living room".to_string());

        let mut fields = BTreeMap::new();
        fields.insert("rssi".to_string(), FieldValue::Integer(-70));
        fields.insert("accuracy".to_string(), FieldValue::Float(2.0));

        let data_point = DataPoint {
            measurement: "beacon".to_string(),
            tag_set: tags,
            field_set: fields,
        };

        assert_eq!(
            format!("{}", data_point),
            "beacon,room=living\\ room,type=altbeacon accuracy=2,rssi=-70i"
        );
    }

    #[test]
    fn test_influxdb_formatter_altbeacon() {
        let formatter = InfluxDbFormatter::new("beacon".to_string());
        let record = BeaconRecord::new(altbeacon_fields());

        let result = formatter.format(&record);

        assert!(result.starts_with("beacon,"));
        assert!(result.contains(&format!("id={}:1:2", TEST_UUID)));
        assert!(result.contains("mac=AA:BB:CC:DD:EE:FF"));
        assert!(result.contains("type=altbeacon"));
        assert!(result.contains("rssi=-60i"));
        assert!(result.contains("tx_power=-59i"));
        assert!(result.contains("accuracy=1.5"));
        assert!(result.contains("proximity=\"near\""));
    }

    #[test]
    fn test_influxdb_formatter_eddystone_without_optionals() {
        let formatter = InfluxDbFormatter::new("beacon".to_string());
        let mut fields = eddystone_fields();
        fields.mac_address = None;
        fields.tx_power = None;
        let record = BeaconRecord::with_proximity(fields, Proximity::Far);

        let result = formatter.format(&record);

        assert!(result.contains("id=edd1ebeac04e5defa017:000000000001"));
        assert!(result.contains("type=eddystone"));
        assert!(result.contains("proximity=\"far\""));
        assert!(!result.contains("mac="));
        assert!(!result.contains("tx_power="));
    }

    #[test]
    fn test_data_point_escapes_measurement_name() {
        let mut fields = BTreeMap::new();
        fields.insert("rssi".to_string(), FieldValue::Integer(-70));

        let data_point = DataPoint {
            measurement: "beacon sightings,raw".to_string(),
            tag_set: BTreeMap::new(),
            field_set: fields,
        };

        assert_eq!(
            format!("{}", data_point),
            "beacon\\ sightings\\,raw rssi=-70i"
        );
    }

    #[test]
    fn test_influxdb_formatter_escapes_other_type() {
        let formatter = InfluxDbFormatter::new("beacon".to_string());
        let mut fields = altbeacon_fields();
        fields.kind = BeaconKind::Other("vendor x".to_string());
        let result = formatter.format(&BeaconRecord::new(fields));
        assert!(result.contains("type=vendor\\ x"));
    }
}
