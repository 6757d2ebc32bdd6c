//! FFI bindings for TripScore
//!
//! This module provides C-compatible functions for driving a trip processor
//! from the host application. All functions use C strings (null-terminated)
//! and return allocated memory that must be freed by the caller using
//! `tripscore_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::TripConfig;
use crate::pipeline::TripProcessor;
use crate::types::{LocationSample, PhoneContext};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Serialize `value` into a newly allocated C string, or NULL with the error set
fn json_to_cstr<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Opaque handle to a TripProcessor
pub struct TripProcessorHandle {
    processor: TripProcessor,
}

/// Borrow the processor behind a handle, setting the error on NULL
unsafe fn processor_mut<'a>(handle: *mut TripProcessorHandle) -> Option<&'a mut TripProcessor> {
    if handle.is_null() {
        set_last_error("Null processor pointer");
        return None;
    }
    Some(&mut (*handle).processor)
}

// ============================================================================
// Processor lifecycle
// ============================================================================

/// Create a new TripProcessor.
///
/// # Safety
/// - `config_json` must be NULL (defaults) or a valid null-terminated C string
///   holding a TripConfig JSON object; missing fields take their defaults.
/// - Returns a pointer that must be freed with `tripscore_processor_free`.
/// - Returns NULL on error; call `tripscore_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn tripscore_processor_new(
    config_json: *const c_char,
) -> *mut TripProcessorHandle {
    clear_last_error();

    let processor = if config_json.is_null() {
        TripProcessor::new()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match TripConfig::from_json(&json).and_then(TripProcessor::with_config) {
            Ok(p) => p,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(TripProcessorHandle { processor }))
}

/// Free a TripProcessor.
///
/// # Safety
/// - `handle` must be a pointer returned by `tripscore_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tripscore_processor_free(handle: *mut TripProcessorHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// ============================================================================
// Sample stream
// ============================================================================

/// Feed one location sample (LocationSample JSON) and return the resulting
/// transition as JSON, e.g. `{"transition":"started","start_time_ms":...}`.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - `sample_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `tripscore_free_string`.
/// - Returns NULL on error; call `tripscore_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn tripscore_push_sample(
    handle: *mut TripProcessorHandle,
    sample_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let processor = match processor_mut(handle) {
        Some(p) => p,
        None => return ptr::null_mut(),
    };

    let json = match cstr_to_string(sample_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid sample string pointer");
            return ptr::null_mut();
        }
    };

    let sample: LocationSample = match serde_json::from_str(&json) {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&format!("Invalid sample: {}", e));
            return ptr::null_mut();
        }
    };

    let transition = processor.process_sample(&sample);
    json_to_cstr(&transition)
}

/// Record a screen touch at `timestamp_ms`.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn tripscore_touch(handle: *mut TripProcessorHandle, timestamp_ms: i64) -> i32 {
    clear_last_error();

    match processor_mut(handle) {
        Some(p) => {
            p.on_touch(timestamp_ms);
            0
        }
        None => -1,
    }
}

/// Evaluate a phone context tick.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - Returns 1 when the tick counted as phone handling, 0 when it did not
///   (or no trip is active), -1 on error.
#[no_mangle]
pub unsafe extern "C" fn tripscore_phone_context(
    handle: *mut TripProcessorHandle,
    timestamp_ms: i64,
    speed_mps: f64,
    screen_on: bool,
    locked: bool,
) -> i32 {
    clear_last_error();

    let processor = match processor_mut(handle) {
        Some(p) => p,
        None => return -1,
    };

    let ctx = PhoneContext { screen_on, locked };
    match processor.on_phone_context(timestamp_ms, speed_mps, ctx) {
        Some(tick) if tick.handled => 1,
        _ => 0,
    }
}

/// Set the posted speed limit (km/h). Zero, negative or NaN clears it.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn tripscore_set_speed_limit(
    handle: *mut TripProcessorHandle,
    limit_kmh: f64,
) -> i32 {
    clear_last_error();

    match processor_mut(handle) {
        Some(p) => {
            let limit = (limit_kmh.is_finite() && limit_kmh > 0.0).then_some(limit_kmh);
            p.set_speed_limit_kmh(limit);
            0
        }
        None => -1,
    }
}

// ============================================================================
// Trip lifecycle
// ============================================================================

/// Resume an active trip started at `start_time_ms` (after a host restart).
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn tripscore_resume(handle: *mut TripProcessorHandle, start_time_ms: i64) -> i32 {
    clear_last_error();

    match processor_mut(handle) {
        Some(p) => {
            p.resume_trip(start_time_ms);
            0
        }
        None => -1,
    }
}

/// End the active trip now and return its TripRecord JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - Returns a newly allocated string that must be freed with `tripscore_free_string`.
/// - Returns NULL when no trip is active or on error; call `tripscore_last_error`.
#[no_mangle]
pub unsafe extern "C" fn tripscore_end_trip(handle: *mut TripProcessorHandle, now_ms: i64) -> *mut c_char {
    clear_last_error();

    let processor = match processor_mut(handle) {
        Some(p) => p,
        None => return ptr::null_mut(),
    };

    match processor.end_trip(now_ms) {
        Ok(record) => json_to_cstr(&record),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Drain trips completed by the sample stream as a JSON array of TripRecords
/// (`[]` when none finished since the last call).
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - Returns a newly allocated string that must be freed with `tripscore_free_string`.
/// - Returns NULL on error; call `tripscore_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn tripscore_take_finished(handle: *mut TripProcessorHandle) -> *mut c_char {
    clear_last_error();

    match processor_mut(handle) {
        Some(p) => json_to_cstr(&p.take_finished_trips()),
        None => ptr::null_mut(),
    }
}

/// Live state of the current trip as LiveTripState JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - Returns a newly allocated string that must be freed with `tripscore_free_string`.
#[no_mangle]
pub unsafe extern "C" fn tripscore_live_state(handle: *mut TripProcessorHandle, now_ms: i64) -> *mut c_char {
    clear_last_error();

    match processor_mut(handle) {
        Some(p) => json_to_cstr(&p.live_state(now_ms)),
        None => ptr::null_mut(),
    }
}

// ============================================================================
// Route persistence
// ============================================================================

/// Save route aggregates to JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - Returns a newly allocated string that must be freed with `tripscore_free_string`.
/// - Returns NULL on error; call `tripscore_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn tripscore_save_routes(handle: *mut TripProcessorHandle) -> *mut c_char {
    clear_last_error();

    let processor = match processor_mut(handle) {
        Some(p) => p,
        None => return ptr::null_mut(),
    };

    match processor.save_routes() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load route aggregates from JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `tripscore_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn tripscore_load_routes(
    handle: *mut TripProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    let processor = match processor_mut(handle) {
        Some(p) => p,
        None => return -1,
    };

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match processor.load_routes(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by TripScore functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a TripScore function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tripscore_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next TripScore call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn tripscore_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the TripScore library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn tripscore_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::Scenario;
    use crate::types::TripRecord;
    use std::ffi::CString;

    const T0: i64 = 1_705_320_000_000;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        tripscore_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_trip_lifecycle() {
        unsafe {
            let handle = tripscore_processor_new(ptr::null());
            assert!(!handle.is_null());

            let mut started = false;
            for sample in Scenario::HardBrake.generate(T0) {
                let json = CString::new(serde_json::to_string(&sample).unwrap()).unwrap();
                let transition = take_string(tripscore_push_sample(handle, json.as_ptr()));
                started |= transition.contains("\"started\"");
            }
            assert!(started);

            let finished = take_string(tripscore_take_finished(handle));
            let trips: Vec<TripRecord> = serde_json::from_str(&finished).unwrap();
            assert_eq!(trips.len(), 1);
            assert_eq!(trips[0].counters.braking.total(), 1);

            assert_eq!(take_string(tripscore_take_finished(handle)), "[]");

            // Route store round trip
            let routes = tripscore_save_routes(handle);
            assert!(!routes.is_null());
            let other = tripscore_processor_new(ptr::null());
            assert_eq!(tripscore_load_routes(other, routes), 0);
            tripscore_free_string(routes);

            tripscore_processor_free(handle);
            tripscore_processor_free(other);
        }
    }

    #[test]
    fn test_ffi_side_channels_and_manual_end() {
        unsafe {
            let handle = tripscore_processor_new(ptr::null());
            assert_eq!(tripscore_resume(handle, T0), 0);
            assert_eq!(tripscore_set_speed_limit(handle, 80.0), 0);

            assert_eq!(tripscore_touch(handle, T0 + 1_000), 0);
            assert_eq!(tripscore_touch(handle, T0 + 1_500), 0);
            assert_eq!(tripscore_phone_context(handle, T0 + 2_000, 12.0, true, false), 1);
            assert_eq!(tripscore_phone_context(handle, T0 + 2_000, 12.0, true, true), 0);

            let live = take_string(tripscore_live_state(handle, T0 + 60_000));
            assert!(live.contains("\"active\":true"));

            let record = take_string(tripscore_end_trip(handle, T0 + 60_000));
            let record: TripRecord = serde_json::from_str(&record).unwrap();
            assert_eq!(record.counters.handled_seconds, 1.0);
            // One minute and no distance fails the validity gate
            assert!(!record.valid);

            // Nothing left to end
            assert!(tripscore_end_trip(handle, T0 + 61_000).is_null());
            assert!(!tripscore_last_error().is_null());

            tripscore_processor_free(handle);
        }
    }

    #[test]
    fn test_ffi_config() {
        unsafe {
            let config = CString::new(r#"{"detection":{"end_low_speed_ms":60000}}"#).unwrap();
            let handle = tripscore_processor_new(config.as_ptr());
            assert!(!handle.is_null());
            tripscore_processor_free(handle);

            let bad = CString::new(r#"{"filter":{"alpha_speed":2.0}}"#).unwrap();
            assert!(tripscore_processor_new(bad.as_ptr()).is_null());
            let error = CStr::from_ptr(tripscore_last_error()).to_str().unwrap();
            assert!(error.contains("alpha_speed"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let handle = tripscore_processor_new(ptr::null());
            let invalid = CString::new("not json").unwrap();
            assert!(tripscore_push_sample(handle, invalid.as_ptr()).is_null());

            let error = tripscore_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            assert_eq!(tripscore_touch(ptr::null_mut(), 0), -1);
            tripscore_processor_free(handle);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = tripscore_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
