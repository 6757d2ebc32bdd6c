//! tripscore.input.v1 schema
//!
//! Recorded host streams are sequences of tagged records: GNSS fixes plus the
//! touch, phone-context and speed-limit side channels. Records replay through
//! [`TripProcessor::process_record`](crate::pipeline::TripProcessor::process_record)
//! in order.

mod adapter;
mod record;

pub use adapter::*;
pub use record::*;
