//! TripScore CLI - Command-line interface for the trip scoring engine
//!
//! Commands:
//! - replay: Score a recorded input stream (batch mode)
//! - run: Score streaming input from stdin (streaming mode)
//! - simulate: Generate a synthetic drive
//! - validate: Validate input records
//! - doctor: Diagnose configuration and environment
//! - schema: Describe the input and output schemas
//! - routes: List route aggregates from a saved store

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tripscore::schema::{InputAdapter, InputRecord, SCHEMA_VERSION};
use tripscore::{
    RecordStream, RouteStore, Scenario, TripConfig, TripError, TripPhase, TripProcessor,
    PRODUCER_NAME, TRIPSCORE_VERSION,
};

/// TripScore - On-device trip segmentation and driving behavior scoring
#[derive(Parser)]
#[command(name = "tripscore")]
#[command(version = TRIPSCORE_VERSION)]
#[command(about = "Segment GNSS streams into trips and score driving behavior", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a recorded input stream (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// End a trip still active when the input runs out
        #[arg(long)]
        end_at_eof: bool,

        /// Load route aggregates from file
        #[arg(long)]
        load_routes: Option<PathBuf>,

        /// Save route aggregates to file after processing
        #[arg(long)]
        save_routes: Option<PathBuf>,
    },

    /// Score streaming NDJSON from stdin (streaming mode)
    Run {
        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Load route aggregates from file
        #[arg(long)]
        load_routes: Option<PathBuf>,

        /// Save route aggregates to file on exit
        #[arg(long)]
        save_routes: Option<PathBuf>,

        /// Flush output after each trip
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Generate a synthetic 1 Hz drive
    Simulate {
        /// Scenario to generate (normal, hard_brake, cornering)
        scenario: Scenario,

        /// Epoch milliseconds of the first sample
        #[arg(long, default_value = "1705320000000")]
        start_ms: i64,

        /// Emit scored trips instead of input records
        #[arg(long)]
        score: bool,

        /// Engine configuration file used with --score
        #[arg(long)]
        config: Option<PathBuf>,

        /// Load route aggregates from file (with --score)
        #[arg(long)]
        load_routes: Option<PathBuf>,

        /// Save route aggregates to file (with --score)
        #[arg(long)]
        save_routes: Option<PathBuf>,
    },

    /// Validate input records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a route store file
        #[arg(long)]
        routes: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// List route aggregates from a saved store
    Routes {
        /// Route store file
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array if the input starts with '[', NDJSON otherwise
    Auto,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one trip per line)
    Ndjson,
    /// JSON array of trips
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (tripscore.input.v1)
    Input,
    /// Output schema (trip record)
    Output,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TripCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            config,
            end_at_eof,
            load_routes,
            save_routes,
        } => cmd_replay(
            &input,
            &output,
            input_format,
            output_format,
            config.as_deref(),
            end_at_eof,
            load_routes.as_deref(),
            save_routes.as_deref(),
        ),

        Commands::Run {
            config,
            load_routes,
            save_routes,
            flush,
        } => cmd_run(
            config.as_deref(),
            load_routes.as_deref(),
            save_routes.as_deref(),
            flush,
        ),

        Commands::Simulate {
            scenario,
            start_ms,
            score,
            config,
            load_routes,
            save_routes,
        } => cmd_simulate(
            scenario,
            start_ms,
            score,
            config.as_deref(),
            load_routes.as_deref(),
            save_routes.as_deref(),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor {
            config,
            routes,
            json,
        } => cmd_doctor(config.as_deref(), routes.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),

        Commands::Routes { file, json } => cmd_routes(&file, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    end_at_eof: bool,
    load_routes: Option<&Path>,
    save_routes: Option<&Path>,
) -> Result<(), TripCliError> {
    let input_data = read_input(input)?;
    let records = parse_records(&input_data, &input_format)?;

    if records.is_empty() {
        return Err(TripCliError::NoRecords);
    }

    let mut stream = RecordStream::new(build_processor(config, load_routes)?);
    let mut trips = Vec::new();
    let mut last_timestamp_ms = i64::MIN;
    for record in &records {
        trips.extend(stream.push_record(record));
        last_timestamp_ms = last_timestamp_ms.max(record.timestamp_ms());
    }

    let processor = stream.processor_mut();
    if end_at_eof && processor.phase() == TripPhase::Active {
        info!("input ended during a trip; ending it at {}", last_timestamp_ms);
        trips.push(processor.end_trip(last_timestamp_ms)?);
    }
    debug!("replayed {} records into {} trips", records.len(), trips.len());

    if let Some(path) = save_routes {
        fs::write(path, processor.save_routes()?)?;
    }

    let output_data = format_output(&trips, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    config: Option<&Path>,
    load_routes: Option<&Path>,
    save_routes: Option<&Path>,
    flush: bool,
) -> Result<(), TripCliError> {
    let mut stream = RecordStream::new(build_processor(config, load_routes)?);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let trips = stream.push_line(&line?);
        if trips.is_empty() {
            continue;
        }
        for trip in &trips {
            writeln!(stdout, "{}", serde_json::to_string(trip)?)?;
        }
        if flush {
            stdout.flush()?;
        }
    }
    stdout.flush()?;

    if stream.skipped_lines() > 0 || stream.warnings() > 0 {
        info!(
            "stream finished with {} skipped lines and {} records processed despite validation errors",
            stream.skipped_lines(),
            stream.warnings()
        );
    }

    if let Some(path) = save_routes {
        fs::write(path, stream.processor().save_routes()?)?;
    }

    Ok(())
}

fn cmd_simulate(
    scenario: Scenario,
    start_ms: i64,
    score: bool,
    config: Option<&Path>,
    load_routes: Option<&Path>,
    save_routes: Option<&Path>,
) -> Result<(), TripCliError> {
    let samples = scenario.generate(start_ms);
    info!("generated {} samples for scenario {}", samples.len(), scenario);

    if !score {
        let records: Vec<InputRecord> = samples.into_iter().map(InputRecord::location).collect();
        print!("{}", format_output(&records, &OutputFormat::Ndjson)?);
        return Ok(());
    }

    let mut processor = build_processor(config, load_routes)?;
    let trips = processor.process_samples(&samples);

    if let Some(path) = save_routes {
        fs::write(path, processor.save_routes()?)?;
    }

    print!("{}", format_output(&trips, &OutputFormat::Ndjson)?);
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), TripCliError> {
    let input_data = read_input(input)?;
    let records = parse_records(&input_data, &input_format)?;

    let results = InputAdapter::validate_records(&records);
    let locations = InputAdapter::locations(&records);
    let location_span_s = match (locations.first(), locations.last()) {
        (Some(first), Some(last)) => (last.timestamp_ms - first.timestamp_ms) as f64 / 1000.0,
        _ => 0.0,
    };

    let report = ValidationReport {
        schema_version: SCHEMA_VERSION.to_string(),
        total_records: records.len(),
        location_records: locations.len(),
        location_span_s,
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .into_iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                record_type: r.record_type.to_string(),
                error: r.error,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema:          {}", report.schema_version);
        println!("Total records:   {}", report.total_records);
        println!(
            "Location fixes:  {} over {:.0} s",
            report.location_records, report.location_span_s
        );
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} record (index {}): {}", err.record_type, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(TripCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, routes: Option<&Path>, json: bool) -> Result<(), TripCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "tripscore_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("TripScore version {}", TRIPSCORE_VERSION),
        },
        DoctorCheck {
            name: "schema_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Input schema: {}", SCHEMA_VERSION),
        },
    ];

    if let Some(path) = config {
        checks.push(check_file("config", path, |content| {
            let config = TripConfig::from_json(content)?;
            config.validate()?;
            Ok(format!(
                "Config valid (trip starts after {} s above {} m/s)",
                config.detection.start_min_duration_ms / 1000,
                config.detection.high_speed_mps
            ))
        }));
    }

    if let Some(path) = routes {
        checks.push(check_file("routes", path, |content| {
            let store = RouteStore::from_json(content)?;
            Ok(format!("Route store valid ({} routes)", store.len()))
        }));
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (streaming mode ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: TRIPSCORE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("TripScore Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(TripCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_file<F>(name: &str, path: &Path, check: F) -> DoctorCheck
where
    F: FnOnce(&str) -> Result<String, TripCliError>,
{
    let (status, message) = if !path.exists() {
        (CheckStatus::Warning, format!("{} file does not exist", name))
    } else {
        match fs::read_to_string(path) {
            Ok(content) => match check(&content) {
                Ok(message) => (CheckStatus::Ok, message),
                Err(e) => (CheckStatus::Error, format!("Invalid {} file: {}", name, e)),
            },
            Err(e) => (CheckStatus::Error, format!("Cannot read {} file: {}", name, e)),
        }
    };
    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), TripCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("Records are tagged by \"type\" and must arrive in timestamp order:");
                println!();
                println!("1. location - One GNSS fix");
                println!("   - latitude, longitude (degrees), timestamp_ms (epoch ms)");
                println!("   - speed_mps, bearing_deg, accuracy_m (optional, default 0)");
                println!();
                println!("2. touch - Screen touch while driving");
                println!("   - timestamp_ms");
                println!();
                println!("3. phone_context - Periodic phone state");
                println!("   - timestamp_ms, screen_on, locked");
                println!();
                println!("4. speed_limit - Posted limit for the current road");
                println!("   - timestamp_ms, limit_kmh (omit to revert to the baseline)");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: trip record");
                println!();
                println!("- trip_id, route_id");
                println!("- start_epoch_ms, end_epoch_ms, duration_min, distance_km");
                println!("- score (0-100), stars (0-5), valid");
                println!("- counters: per category {{ minor, mid, major }} plus distraction and night time");
                println!("- night_minutes");
                println!("- markers: [{{ latitude, longitude, timestamp_ms, category, severity, value }}]");
            }
        }
    }

    Ok(())
}

fn cmd_routes(file: &Path, json: bool) -> Result<(), TripCliError> {
    let store = RouteStore::from_json(&fs::read_to_string(file)?)?;
    let summaries = store.summaries();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("{} routes", summaries.len());
    for route in summaries {
        println!(
            "  {}  trips={}  avg_stars={:.2}",
            route.route_id, route.trip_count, route.avg_stars
        );
    }
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, TripCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(data: &str, format: &InputFormat) -> Result<Vec<InputRecord>, TripCliError> {
    let records = match format {
        InputFormat::Auto => InputAdapter::parse_auto(data)?,
        InputFormat::Ndjson => InputAdapter::parse_ndjson(data)?,
        InputFormat::Json => InputAdapter::parse_array(data)?,
    };
    Ok(records)
}

fn build_processor(
    config: Option<&Path>,
    load_routes: Option<&Path>,
) -> Result<TripProcessor, TripCliError> {
    let config = match config {
        Some(path) => TripConfig::from_json(&fs::read_to_string(path)?)?,
        None => TripConfig::default(),
    };
    let mut processor = TripProcessor::with_config(config)?;

    if let Some(path) = load_routes {
        processor.load_routes(&fs::read_to_string(path)?)?;
        debug!("loaded {} routes", processor.routes().len());
    }
    Ok(processor)
}

fn format_output<T: Serialize>(items: &[T], format: &OutputFormat) -> Result<String, TripCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for item in items {
                out.push_str(&serde_json::to_string(item)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(items)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(items)?),
    }
}

fn get_input_json_schema() -> String {
    let record = |ty: &str, required: &[&str], extra: serde_json::Value| {
        let mut properties = serde_json::json!({
            "type": { "const": ty },
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "timestamp_ms": { "type": "integer", "minimum": 0 }
        });
        if let (Some(properties), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
            properties.extend(extra.clone());
        }
        serde_json::json!({
            "type": "object",
            "required": required,
            "properties": properties
        })
    };

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "TripScore recorded input record",
        "oneOf": [
            record(
                "location",
                &["type", "latitude", "longitude", "timestamp_ms"],
                serde_json::json!({
                    "latitude": { "type": "number", "minimum": -90, "maximum": 90 },
                    "longitude": { "type": "number", "minimum": -180, "maximum": 180 },
                    "speed_mps": { "type": "number", "minimum": 0 },
                    "bearing_deg": { "type": "number", "minimum": 0, "exclusiveMaximum": 360 },
                    "accuracy_m": { "type": "number", "minimum": 0 }
                })
            ),
            record("touch", &["type", "timestamp_ms"], serde_json::json!({})),
            record(
                "phone_context",
                &["type", "timestamp_ms", "screen_on", "locked"],
                serde_json::json!({
                    "screen_on": { "type": "boolean" },
                    "locked": { "type": "boolean" }
                })
            ),
            record(
                "speed_limit",
                &["type", "timestamp_ms"],
                serde_json::json!({
                    "limit_kmh": { "type": ["number", "null"], "exclusiveMinimum": 0 }
                })
            )
        ]
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let severity_counts = serde_json::json!({
        "type": "object",
        "properties": {
            "minor": { "type": "integer" },
            "mid": { "type": "integer" },
            "major": { "type": "integer" }
        }
    });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "tripscore.trip",
        "description": "Finalized TripScore trip record",
        "type": "object",
        "required": [
            "trip_id", "start_epoch_ms", "end_epoch_ms", "duration_min",
            "distance_km", "route_id", "score", "stars", "valid", "counters"
        ],
        "properties": {
            "trip_id": { "type": "string" },
            "start_epoch_ms": { "type": "integer" },
            "end_epoch_ms": { "type": "integer" },
            "duration_min": { "type": "number" },
            "distance_km": { "type": "number" },
            "route_id": { "type": "string", "pattern": "^[0-9a-f]{64}$" },
            "score": { "type": "number", "minimum": 0, "maximum": 100 },
            "stars": { "type": "integer", "minimum": 0, "maximum": 5 },
            "valid": { "type": "boolean" },
            "night_minutes": { "type": "number" },
            "counters": {
                "type": "object",
                "properties": {
                    "braking": severity_counts,
                    "acceleration": severity_counts,
                    "cornering": severity_counts,
                    "speeding": severity_counts
                }
            },
            "markers": { "type": "array", "items": { "type": "object" } }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum TripCliError {
    Io(io::Error),
    Engine(TripError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
    DoctorFailed,
}

impl std::fmt::Display for TripCliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripCliError::Io(e) => write!(f, "{}", e),
            TripCliError::Engine(e) => write!(f, "{}", e),
            TripCliError::Json(e) => write!(f, "{}", e),
            TripCliError::NoRecords => write!(f, "No records found in input"),
            TripCliError::ValidationFailed(count) => write!(f, "{} records failed validation", count),
            TripCliError::DoctorFailed => write!(f, "One or more health checks failed"),
        }
    }
}

impl From<io::Error> for TripCliError {
    fn from(e: io::Error) -> Self {
        TripCliError::Io(e)
    }
}

impl From<TripError> for TripCliError {
    fn from(e: TripError) -> Self {
        TripCliError::Engine(e)
    }
}

impl From<serde_json::Error> for TripCliError {
    fn from(e: serde_json::Error) -> Self {
        TripCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TripCliError> for CliError {
    fn from(e: TripCliError) -> Self {
        let message = e.to_string();
        let (code, hint) = match &e {
            TripCliError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
            TripCliError::Engine(TripError::InvalidConfig(_)) => {
                ("CONFIG_ERROR", Some("Run 'tripscore doctor --config <file>'"))
            }
            TripCliError::Engine(TripError::NoActiveTrip) => ("NO_ACTIVE_TRIP", None),
            TripCliError::Engine(_) => (
                "PARSE_ERROR",
                Some("Ensure input matches the tripscore.input.v1 schema"),
            ),
            TripCliError::Json(_) => ("JSON_ERROR", Some("Check JSON syntax")),
            TripCliError::NoRecords => ("NO_RECORDS", Some("Ensure input file is not empty")),
            TripCliError::ValidationFailed(_) => {
                ("VALIDATION_FAILED", Some("Fix validation errors and retry"))
            }
            TripCliError::DoctorFailed => {
                ("DOCTOR_FAILED", Some("Review the doctor report for details"))
            }
        };
        CliError {
            code: code.to_string(),
            message,
            hint: hint.map(str::to_string),
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    schema_version: String,
    total_records: usize,
    location_records: usize,
    location_span_s: f64,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record_type: String,
    error: String,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
