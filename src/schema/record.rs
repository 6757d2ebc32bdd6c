//! tripscore.input.v1 record definitions

use crate::types::{LocationSample, PhoneContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version string for tripscore.input.v1
pub const SCHEMA_VERSION: &str = "tripscore.input.v1";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// One line of a recorded host stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Defaults to the current version when omitted
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(flatten)]
    pub payload: InputPayload,
}

/// Record payload, discriminated by `"type"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPayload {
    /// GNSS fix
    Location(LocationSample),
    /// Screen touch
    Touch { timestamp_ms: i64 },
    /// Phone state poll (about 1 Hz while a trip is active)
    PhoneContext {
        timestamp_ms: i64,
        screen_on: bool,
        locked: bool,
    },
    /// Posted limit for the current road; `null` clears it
    SpeedLimit {
        timestamp_ms: i64,
        #[serde(default)]
        limit_kmh: Option<f64>,
    },
}

impl InputRecord {
    pub fn location(sample: LocationSample) -> Self {
        Self::with_payload(InputPayload::Location(sample))
    }

    pub fn touch(timestamp_ms: i64) -> Self {
        Self::with_payload(InputPayload::Touch { timestamp_ms })
    }

    pub fn phone_context(timestamp_ms: i64, ctx: PhoneContext) -> Self {
        Self::with_payload(InputPayload::PhoneContext {
            timestamp_ms,
            screen_on: ctx.screen_on,
            locked: ctx.locked,
        })
    }

    pub fn speed_limit(timestamp_ms: i64, limit_kmh: Option<f64>) -> Self {
        Self::with_payload(InputPayload::SpeedLimit {
            timestamp_ms,
            limit_kmh,
        })
    }

    fn with_payload(payload: InputPayload) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            payload,
        }
    }

    pub fn timestamp_ms(&self) -> i64 {
        match &self.payload {
            InputPayload::Location(sample) => sample.timestamp_ms,
            InputPayload::Touch { timestamp_ms }
            | InputPayload::PhoneContext { timestamp_ms, .. }
            | InputPayload::SpeedLimit { timestamp_ms, .. } => *timestamp_ms,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &self.payload {
            InputPayload::Location(_) => "location",
            InputPayload::Touch { .. } => "touch",
            InputPayload::PhoneContext { .. } => "phone_context",
            InputPayload::SpeedLimit { .. } => "speed_limit",
        }
    }

    /// Validate the record in isolation
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        let timestamp_ms = self.timestamp_ms();
        if timestamp_ms < 0 {
            return Err(ValidationError::NegativeTimestamp(timestamp_ms));
        }

        match &self.payload {
            InputPayload::Location(sample) => validate_location(sample),
            InputPayload::SpeedLimit {
                limit_kmh: Some(limit),
                ..
            } if !(limit.is_finite() && *limit > 0.0) => {
                Err(ValidationError::InvalidSpeedLimit(*limit))
            }
            _ => Ok(()),
        }
    }
}

fn validate_location(sample: &LocationSample) -> Result<(), ValidationError> {
    if !sample.has_valid_position() {
        return Err(ValidationError::CoordinatesOutOfRange {
            latitude: sample.latitude,
            longitude: sample.longitude,
        });
    }
    if !sample.speed_mps.is_finite() || sample.speed_mps < 0.0 {
        return Err(ValidationError::InvalidSpeed(sample.speed_mps));
    }
    if !sample.bearing_deg.is_finite() || !(0.0..=360.0).contains(&sample.bearing_deg) {
        return Err(ValidationError::InvalidBearing(sample.bearing_deg));
    }
    if !sample.accuracy_m.is_finite() || sample.accuracy_m < 0.0 {
        return Err(ValidationError::InvalidAccuracy(sample.accuracy_m));
    }
    Ok(())
}

/// Validation errors for input records
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Coordinates out of range: ({latitude}, {longitude})")]
    CoordinatesOutOfRange { latitude: f64, longitude: f64 },

    #[error("Invalid speed: {0} m/s")]
    InvalidSpeed(f64),

    #[error("Invalid bearing: {0} degrees")]
    InvalidBearing(f64),

    #[error("Invalid accuracy: {0} m")]
    InvalidAccuracy(f64),

    #[error("Negative timestamp: {0}")]
    NegativeTimestamp(i64),

    #[error("Invalid speed limit: {0} km/h")]
    InvalidSpeedLimit(f64),

    #[error("Timestamp went backwards: {current} after {previous}")]
    TimestampRegression { previous: i64, current: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_location_record_from_json() {
        let json = r#"{
            "type": "location",
            "latitude": 37.7749,
            "longitude": -122.4194,
            "timestamp_ms": 1705320000000,
            "speed_mps": 12.5,
            "bearing_deg": 90.0,
            "accuracy_m": 4.0
        }"#;

        let record: InputRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.schema_version, SCHEMA_VERSION);
        assert_eq!(record.type_name(), "location");
        assert_eq!(record.timestamp_ms(), 1_705_320_000_000);
        assert!(record.validate().is_ok());

        match record.payload {
            InputPayload::Location(sample) => assert_eq!(sample.speed_mps, 12.5),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_side_channel_records() {
        let touch: InputRecord =
            serde_json::from_str(r#"{"type":"touch","timestamp_ms":1000}"#).unwrap();
        assert_eq!(touch, InputRecord::touch(1_000));

        let ctx: InputRecord = serde_json::from_str(
            r#"{"type":"phone_context","timestamp_ms":2000,"screen_on":true,"locked":false}"#,
        )
        .unwrap();
        assert_eq!(
            ctx,
            InputRecord::phone_context(
                2_000,
                PhoneContext {
                    screen_on: true,
                    locked: false
                }
            )
        );

        let cleared: InputRecord =
            serde_json::from_str(r#"{"type":"speed_limit","timestamp_ms":3000}"#).unwrap();
        assert_eq!(cleared, InputRecord::speed_limit(3_000, None));
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(InputRecord::touch(5)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "type": "touch",
                "timestamp_ms": 5
            })
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_str::<InputRecord>(r#"{"type":"gyro","timestamp_ms":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut sample = LocationSample::new(37.0, -122.0, 0, 10.0, 45.0);
        sample.latitude = 91.0;
        assert!(matches!(
            InputRecord::location(sample).validate(),
            Err(ValidationError::CoordinatesOutOfRange { .. })
        ));

        let sample = LocationSample::new(37.0, -122.0, 0, -1.0, 45.0);
        assert_eq!(
            InputRecord::location(sample).validate(),
            Err(ValidationError::InvalidSpeed(-1.0))
        );

        let sample = LocationSample::new(37.0, -122.0, 0, 1.0, 400.0);
        assert_eq!(
            InputRecord::location(sample).validate(),
            Err(ValidationError::InvalidBearing(400.0))
        );

        assert_eq!(
            InputRecord::touch(-5).validate(),
            Err(ValidationError::NegativeTimestamp(-5))
        );
        assert_eq!(
            InputRecord::speed_limit(0, Some(0.0)).validate(),
            Err(ValidationError::InvalidSpeedLimit(0.0))
        );
        assert!(InputRecord::speed_limit(0, Some(50.0)).validate().is_ok());

        let mut record = InputRecord::touch(0);
        record.schema_version = "tripscore.input.v0".to_string();
        assert!(matches!(
            record.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }
}
