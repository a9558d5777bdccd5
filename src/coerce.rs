//! Lenient numeric coercion for loosely-typed wire values.
//!
//! Platform bridges deliver numbers either as JSON numbers or as numeric
//! strings. These helpers absorb both shapes and never fail.

use serde_json::Value;

/// Coerce a wire value into an integer.
///
/// - numbers truncate toward zero (saturating at the `i64` range)
/// - strings are parsed base-10 after trimming; unparseable text yields `0`
/// - anything else (null, bool, array, object) yields `None`
///
/// # Examples
/// ```
/// use beacon_records::coerce::parse_int;
/// use serde_json::json;
///
/// assert_eq!(parse_int(&json!("-60")), Some(-60));
/// assert_eq!(parse_int(&json!(-59.7)), Some(-59));
/// assert_eq!(parse_int(&json!("loud")), Some(0));
/// assert_eq!(parse_int(&json!(null)), None);
/// ```
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => Some(s.trim().parse::<i64>().unwrap_or(0)),
        _ => None,
    }
}

/// Coerce a wire value into a double.
///
/// - numbers convert directly
/// - strings are parsed after trimming; unparseable text yields `0.0`
/// - anything else yields `0.0`
///
/// `NaN` and infinities count as unparseable: the result is always finite.
pub fn parse_double(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// Like [`parse_double`], but an absent key also yields `0.0`.
pub fn parse_double_opt(value: Option<&Value>) -> f64 {
    value.map_or(0.0, parse_double)
}
