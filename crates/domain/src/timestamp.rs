//! Fractional Unix epoch second encoding for persisted timestamps.
//!
//! Lock files and audit log lines store instants as `f64` seconds so they stay
//! readable by the tooling that already consumes them.

use chrono::{DateTime, Utc};

/// Converts an instant to fractional epoch seconds.
#[must_use]
pub fn to_epoch_seconds(value: DateTime<Utc>) -> f64 {
    value.timestamp_micros() as f64 / 1_000_000.0
}

/// Converts fractional epoch seconds to an instant.
///
/// Returns `None` for non-finite or out-of-range values.
#[must_use]
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }

    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round() as i64)
}

/// Serde adapter for `DateTime<Utc>` fields.
pub mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an instant as epoch seconds.
    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(super::to_epoch_seconds(*value))
    }

    /// Deserializes an instant from epoch seconds.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        super::from_epoch_seconds(seconds)
            .ok_or_else(|| D::Error::custom(format!("invalid epoch timestamp {seconds}")))
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
pub mod epoch_seconds_option {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional instant as epoch seconds or null.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_some(&super::to_epoch_seconds(*value)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional instant from epoch seconds or null.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer)?
            .map(|seconds| {
                super::from_epoch_seconds(seconds)
                    .ok_or_else(|| D::Error::custom(format!("invalid epoch timestamp {seconds}")))
            })
            .transpose()
    }
}
