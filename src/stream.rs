//! Tolerant ingestion of live NDJSON streams
//!
//! A long-running host stream must survive the odd bad line. Records that
//! fail validation (negative speed reported as "unknown", a touch arriving
//! just behind the last fix) are logged and still processed, since the core
//! clamps them. Lines that are not JSON records are logged and skipped.

use crate::pipeline::TripProcessor;
use crate::schema::{InputAdapter, InputRecord, ValidationError};
use crate::types::TripRecord;
use log::warn;

/// Line-by-line driver around a [`TripProcessor`]
pub struct RecordStream {
    processor: TripProcessor,
    line_number: usize,
    previous_ms: Option<i64>,
    skipped_lines: usize,
    warnings: usize,
}

impl RecordStream {
    pub fn new(processor: TripProcessor) -> Self {
        Self {
            processor,
            line_number: 0,
            previous_ms: None,
            skipped_lines: 0,
            warnings: 0,
        }
    }

    /// Feed one NDJSON line and return the trips it completed
    pub fn push_line(&mut self, line: &str) -> Vec<TripRecord> {
        self.line_number += 1;
        match InputAdapter::parse_line(line) {
            Ok(Some(record)) => self.push_record(&record),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("skipping line {}: {}", self.line_number, e);
                self.skipped_lines += 1;
                Vec::new()
            }
        }
    }

    /// Feed one parsed record and return the trips it completed
    pub fn push_record(&mut self, record: &InputRecord) -> Vec<TripRecord> {
        let current = record.timestamp_ms();
        let problem = match (record.validate(), self.previous_ms) {
            (Err(e), _) => Some(e),
            (Ok(()), Some(previous)) if current < previous => {
                Some(ValidationError::TimestampRegression { previous, current })
            }
            _ => None,
        };
        if let Some(e) = problem {
            warn!(
                "{} record at {} processed despite: {}",
                record.type_name(),
                current,
                e
            );
            self.warnings += 1;
        }
        self.previous_ms = Some(self.previous_ms.map_or(current, |p| p.max(current)));

        self.processor.process_record(record);
        self.processor.take_finished_trips()
    }

    pub fn processor(&self) -> &TripProcessor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut TripProcessor {
        &mut self.processor
    }

    /// Lines that could not be parsed
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Records processed despite failing validation
    pub fn warnings(&self) -> usize {
        self.warnings
    }
}
