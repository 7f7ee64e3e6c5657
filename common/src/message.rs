use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Seconds since the Unix epoch, with sub-second precision.
pub type Timestamp = f64;

/// Naive date-time layouts accepted after RFC 3339 fails. Interpreted as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts that RFC 3339 parsing does not cover.
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
];

/// A single chat message on the channel.
///
/// Messages are append-only: once stored they are never edited, only evicted
/// by retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub sender: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: Timestamp,
    /// Opaque client payload, passed through untouched.
    #[serde(default)]
    pub extra: Option<Value>,
}

impl Message {
    pub fn new(content: impl Into<String>, sender: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            content: content.into(),
            sender: sender.into(),
            timestamp,
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: Option<Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Seconds elapsed between this message and `now`. Negative for messages
    /// stamped in the future.
    pub fn age(&self, now: Timestamp) -> f64 {
        now - self.timestamp
    }
}

/// Parse a client-supplied timestamp string.
///
/// Accepts a plain number of epoch seconds, RFC 3339, or an ISO-8601 style
/// date-time with or without offset. Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(secs) = raw.parse::<f64>() {
        return secs.is_finite().then_some(secs);
    }

    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(raw) {
        return Some(micros_to_secs(dt.timestamp_micros()));
    }

    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(raw, layout) {
            return Some(micros_to_secs(dt.timestamp_micros()));
        }
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(micros_to_secs(naive.and_utc().timestamp_micros()));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| micros_to_secs(naive.and_utc().timestamp_micros()))
}

/// Normalize a JSON timestamp (number or string) to epoch seconds.
///
/// Returns `None` for anything unparseable; callers decide whether that means
/// epoch zero or a rejected request.
pub fn normalize_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::Number(n) => n.as_f64().filter(|secs| secs.is_finite()),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

fn micros_to_secs(micros: i64) -> Timestamp {
    micros as f64 / 1_000_000.0
}

// Documents written by older deployments kept timestamps as raw strings.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_timestamp(&value).unwrap_or(0.0))
}
