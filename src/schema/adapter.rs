//! Parsing and batch validation of tripscore.input.v1 streams

use crate::error::TripError;
use crate::schema::record::*;
use crate::types::LocationSample;
use serde::Serialize;

/// Adapter for reading recorded host streams
pub struct InputAdapter;

impl InputAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<InputRecord>, TripError> {
        let records: Vec<InputRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<InputRecord>, TripError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            match Self::parse_line(line) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    return Err(TripError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse one NDJSON line; blank lines and `#` comments yield `None`
    pub fn parse_line(line: &str) -> Result<Option<InputRecord>, serde_json::Error> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        serde_json::from_str(trimmed).map(Some)
    }

    /// Parse either a JSON array or NDJSON, deciding by the first
    /// non-whitespace character
    pub fn parse_auto(input: &str) -> Result<Vec<InputRecord>, TripError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Validate a batch of records, including timestamp ordering
    pub fn validate_records(records: &[InputRecord]) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut previous: Option<i64> = None;

        for (index, record) in records.iter().enumerate() {
            let error = match record.validate() {
                Err(e) => Some(e),
                Ok(()) => {
                    let current = record.timestamp_ms();
                    match previous {
                        Some(previous) if current < previous => {
                            Some(ValidationError::TimestampRegression { previous, current })
                        }
                        _ => None,
                    }
                }
            };
            previous = Some(previous.map_or(record.timestamp_ms(), |p| p.max(record.timestamp_ms())));

            if let Some(error) = error {
                results.push(ValidationResult {
                    index,
                    record_type: record.type_name(),
                    error: error.to_string(),
                });
            }
        }
        results
    }

    /// Location samples in stream order
    pub fn locations(records: &[InputRecord]) -> Vec<LocationSample> {
        records
            .iter()
            .filter_map(|r| match &r.payload {
                InputPayload::Location(sample) => Some(*sample),
                _ => None,
            })
            .collect()
    }
}

/// One failing record of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub index: usize,
    pub record_type: &'static str,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = r#"
# recorded 2024-01-15
{"type":"location","latitude":37.7749,"longitude":-122.4194,"timestamp_ms":1000,"speed_mps":0.0}
{"type":"touch","timestamp_ms":1500}

{"type":"location","latitude":37.7750,"longitude":-122.4193,"timestamp_ms":2000,"speed_mps":3.5,"bearing_deg":45.0}
"#;

    #[test]
    fn test_parse_ndjson() {
        let records = InputAdapter::parse_ndjson(STREAM).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].type_name(), "touch");

        let locations = InputAdapter::locations(&records);
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[1].bearing_deg, 45.0);
        assert_eq!(locations[0].accuracy_m, 0.0);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let err = InputAdapter::parse_ndjson("{\"type\":\"touch\",\"timestamp_ms\":1}\nnot json")
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array_and_auto() {
        let json = r#"[{"type":"touch","timestamp_ms":1},{"type":"touch","timestamp_ms":2}]"#;
        assert_eq!(InputAdapter::parse_array(json).unwrap().len(), 2);
        assert_eq!(InputAdapter::parse_auto(json).unwrap().len(), 2);
        assert_eq!(InputAdapter::parse_auto(STREAM).unwrap().len(), 3);
    }

    #[test]
    fn test_validate_records() {
        let records = vec![
            InputRecord::touch(1_000),
            InputRecord::location(LocationSample::new(37.0, -122.0, 2_000, -3.0, 0.0)),
            InputRecord::touch(500),
            InputRecord::touch(3_000),
        ];

        let results = InputAdapter::validate_records(&records);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 1);
        assert_eq!(results[0].record_type, "location");
        assert!(results[0].error.contains("speed"));
        assert_eq!(results[1].index, 2);
        assert!(results[1].error.contains("backwards"));
    }
}
