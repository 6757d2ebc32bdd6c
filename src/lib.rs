//! TripScore - On-device trip segmentation and driving behavior scoring
//!
//! TripScore turns a stream of noisy GNSS samples from a moving vehicle into
//! discrete trips, each with a 0-100 behavioral score, a 0-5 star rating and
//! a route fingerprint, through a deterministic pipeline: trip segmentation →
//! signal filtering → event classification → route fingerprinting → scoring.
//!
//! ## Modules
//!
//! - **Core**: state machine, filter, classifier, fingerprint and scoring
//! - **Pipeline**: [`TripProcessor`] wiring the core for one sample stream
//! - **Host surfaces**: input schema, live record streams, route aggregation,
//!   simulator and C FFI

pub mod classifier;
pub mod config;
pub mod distraction;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod geo;
pub mod pipeline;
pub mod routes;
pub mod schema;
pub mod scoring;
pub mod simulator;
pub mod state_machine;
pub mod stream;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::TripConfig;
pub use error::TripError;
pub use pipeline::TripProcessor;
pub use routes::{RouteStore, RouteSummary};
pub use scoring::{ScoreResult, ScoringEngine};
pub use simulator::Scenario;
pub use state_machine::TripStateMachine;
pub use stream::RecordStream;
pub use types::{
    EventCategory, EventCounters, EventMarker, LiveTripState, LocationSample, PathPoint,
    PhoneContext, Severity, TripPhase, TripRecord, TripTransition,
};

// Schema exports
pub use schema::{InputAdapter, InputRecord, SCHEMA_VERSION};

/// TripScore version
pub const TRIPSCORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "tripscore";
