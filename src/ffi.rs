//! FFI bindings for the challenge engine
//!
//! C-compatible functions for host apps. The challenge state crosses the
//! boundary as JSON: each call takes the current state document and returns
//! the updated one, so the host owns persistence. Returned strings must be
//! freed with `seventyfive_free_string`.
//!
//! Dates are `YYYY-MM-DD` strings; frame timestamps are Unix milliseconds.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::challenge::{parse_date, ChallengeState, CompletionOutcome};
use crate::config::EngineConfig;
use crate::error::ChallengeError;
use crate::reps::RepCounter;
use crate::targets;
use crate::types::{Baselines, ExerciseType, PoseFrame};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

/// Read a required string argument, naming it in the error
unsafe fn required(ptr: *const c_char, name: &str) -> Result<String, String> {
    cstr_to_string(ptr).ok_or_else(|| format!("Invalid {} string pointer", name))
}

/// Parse the state argument; NULL or empty means a fresh inactive state
unsafe fn state_arg(ptr: *const c_char) -> Result<ChallengeState, String> {
    match cstr_to_string(ptr) {
        Some(json) if !json.trim().is_empty() => {
            serde_json::from_str(&json).map_err(|e| ChallengeError::from(e).to_string())
        }
        _ => Ok(ChallengeState::default()),
    }
}

unsafe fn date_arg(ptr: *const c_char, name: &str) -> Result<NaiveDate, String> {
    parse_date(&required(ptr, name)?).map_err(|e| e.to_string())
}

unsafe fn baselines_arg(ptr: *const c_char) -> Result<Baselines, String> {
    let json = required(ptr, "baselines")?;
    serde_json::from_str(&json).map_err(|e| ChallengeError::from(e).to_string())
}

unsafe fn exercise_arg(ptr: *const c_char) -> Result<ExerciseType, String> {
    required(ptr, "exercise")?
        .parse()
        .map_err(|e: ChallengeError| e.to_string())
}

fn timestamp_arg(timestamp_ms: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .ok_or_else(|| format!("Timestamp out of range: {}", timestamp_ms))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| ChallengeError::from(e).to_string())
}

/// Hand a JSON result to the caller, or record the error and return NULL
fn respond(result: Result<String, String>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(msg) => {
            set_last_error(&msg);
            ptr::null_mut()
        }
    }
}

/// Hand a status code to the caller: 0 on success, -1 with the error recorded
fn status(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(msg) => {
            set_last_error(&msg);
            -1
        }
    }
}

#[derive(Serialize)]
struct CompletionResponse {
    state: ChallengeState,
    outcome: CompletionOutcome,
}

unsafe fn challenge_start(
    state_json: *const c_char,
    baselines_json: *const c_char,
    today: *const c_char,
) -> Result<String, String> {
    let mut state = state_arg(state_json)?;
    let baselines = baselines_arg(baselines_json)?;
    let today = date_arg(today, "today")?;
    state
        .start_challenge(baselines, today)
        .map_err(|e| e.to_string())?;
    to_json(&state)
}

unsafe fn complete_exercise(
    state_json: *const c_char,
    date: *const c_char,
    exercise: *const c_char,
    actual_count: u32,
) -> Result<String, String> {
    let mut state = state_arg(state_json)?;
    let date = date_arg(date, "date")?;
    let exercise = exercise_arg(exercise)?;
    let outcome = state
        .complete_exercise(date, exercise, actual_count)
        .map_err(|e| e.to_string())?;
    to_json(&CompletionResponse { state, outcome })
}

unsafe fn advance_day(state_json: *const c_char) -> Result<String, String> {
    let mut state = state_arg(state_json)?;
    state.advance_day().map_err(|e| e.to_string())?;
    to_json(&state)
}

unsafe fn sync_day(state_json: *const c_char, today: *const c_char) -> Result<String, String> {
    let mut state = state_arg(state_json)?;
    let today = date_arg(today, "today")?;
    state.sync_current_day(today).map_err(|e| e.to_string())?;
    to_json(&state)
}

unsafe fn update_baselines(
    state_json: *const c_char,
    baselines_json: *const c_char,
    today: *const c_char,
) -> Result<String, String> {
    let mut state = state_arg(state_json)?;
    let baselines = baselines_arg(baselines_json)?;
    let today = date_arg(today, "today")?;
    state
        .update_baselines(baselines, today)
        .map_err(|e| e.to_string())?;
    to_json(&state)
}

unsafe fn summary(state_json: *const c_char, today: *const c_char) -> Result<String, String> {
    let state = state_arg(state_json)?;
    let today = date_arg(today, "today")?;
    to_json(&state.summary(today))
}

unsafe fn counter_start(
    counter: &mut RepCounter,
    exercise: *const c_char,
    timestamp_ms: i64,
) -> Result<(), String> {
    let exercise = exercise_arg(exercise)?;
    let now = timestamp_arg(timestamp_ms)?;
    counter.start(exercise, now);
    Ok(())
}

unsafe fn counter_stop(
    counter: &mut RepCounter,
    exercise: *const c_char,
) -> Result<String, String> {
    let exercise = exercise_arg(exercise)?;
    let stopped = counter
        .stop(exercise)
        .ok_or_else(|| ChallengeError::SessionNotStarted(exercise).to_string())?;
    to_json(&stopped)
}

unsafe fn counter_process(
    counter: &mut RepCounter,
    exercise: *const c_char,
    frame_json: *const c_char,
    timestamp_ms: i64,
) -> Result<String, String> {
    let exercise = exercise_arg(exercise)?;
    let frame: PoseFrame = serde_json::from_str(&required(frame_json, "frame")?)
        .map_err(|e| ChallengeError::from(e).to_string())?;
    let now = timestamp_arg(timestamp_ms)?;
    let outcome = counter
        .process(exercise, &frame, now)
        .map_err(|e| e.to_string())?;
    to_json(&outcome)
}

// ============================================================================
// Challenge API
// ============================================================================

/// Start a challenge on `today` and return the new state JSON.
///
/// # Safety
/// - `state_json` may be NULL (fresh state) or a valid null-terminated C string.
/// - `baselines_json` and `today` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_challenge_start(
    state_json: *const c_char,
    baselines_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    respond(challenge_start(state_json, baselines_json, today))
}

/// Complete one exercise for `date`.
///
/// Returns `{"state": ..., "outcome": ...}`.
///
/// # Safety
/// - `state_json`, `date` and `exercise` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_complete_exercise(
    state_json: *const c_char,
    date: *const c_char,
    exercise: *const c_char,
    actual_count: u32,
) -> *mut c_char {
    clear_last_error();

    respond(complete_exercise(state_json, date, exercise, actual_count))
}

/// Advance to the next challenge day and return the new state JSON.
///
/// # Safety
/// - `state_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_advance_day(state_json: *const c_char) -> *mut c_char {
    clear_last_error();

    respond(advance_day(state_json))
}

/// Recompute the current day from the calendar and return the new state JSON.
///
/// # Safety
/// - `state_json` and `today` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_sync_day(
    state_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    respond(sync_day(state_json, today))
}

/// Replace the baselines, regenerating today's record.
///
/// # Safety
/// - `state_json`, `baselines_json` and `today` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_update_baselines(
    state_json: *const c_char,
    baselines_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    respond(update_baselines(state_json, baselines_json, today))
}

/// Summarize the challenge as of `today`.
///
/// # Safety
/// - `state_json` and `today` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_summary(
    state_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    respond(summary(state_json, today))
}

/// Targets for one day given the baselines.
///
/// # Safety
/// - `baselines_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_daily_targets(
    baselines_json: *const c_char,
    day: u32,
) -> *mut c_char {
    clear_last_error();

    respond(
        baselines_arg(baselines_json).and_then(|b| to_json(&targets::daily_targets(&b, day))),
    )
}

// ============================================================================
// Rep Counter API
// ============================================================================

/// Opaque handle to a RepCounter
pub struct RepCounterHandle {
    counter: RepCounter,
}

/// Create a rep counter.
///
/// # Safety
/// - `config_toml` may be NULL (default thresholds) or a valid null-terminated C string.
/// - Must be freed with `seventyfive_counter_free`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_counter_new(
    config_toml: *const c_char,
) -> *mut RepCounterHandle {
    clear_last_error();

    let config = match cstr_to_string(config_toml) {
        Some(toml) => match EngineConfig::from_toml_str(&toml) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        None => EngineConfig::default(),
    };

    let handle = Box::new(RepCounterHandle {
        counter: RepCounter::new(config.counter),
    });
    Box::into_raw(handle)
}

/// Free a rep counter.
///
/// # Safety
/// - `counter` must be a valid pointer returned by `seventyfive_counter_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_counter_free(counter: *mut RepCounterHandle) {
    if !counter.is_null() {
        drop(Box::from_raw(counter));
    }
}

/// Start (or restart) the session for an exercise.
///
/// # Safety
/// - `counter` must be a valid pointer returned by `seventyfive_counter_new`.
/// - `exercise` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_counter_start(
    counter: *mut RepCounterHandle,
    exercise: *const c_char,
    timestamp_ms: i64,
) -> i32 {
    clear_last_error();

    if counter.is_null() {
        set_last_error("Null counter pointer");
        return -1;
    }
    let handle = &mut *counter;

    status(counter_start(&mut handle.counter, exercise, timestamp_ms))
}

/// Stop the session for an exercise and return its final state JSON.
///
/// # Safety
/// - `counter` must be a valid pointer returned by `seventyfive_counter_new`.
/// - `exercise` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error or when no session was live.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_counter_stop(
    counter: *mut RepCounterHandle,
    exercise: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if counter.is_null() {
        set_last_error("Null counter pointer");
        return ptr::null_mut();
    }
    let handle = &mut *counter;

    respond(counter_stop(&mut handle.counter, exercise))
}

/// Feed one pose frame and return the frame outcome JSON.
///
/// # Safety
/// - `counter` must be a valid pointer returned by `seventyfive_counter_new`.
/// - `exercise` and `frame_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `seventyfive_free_string`.
/// - Returns NULL on error; call `seventyfive_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_counter_process(
    counter: *mut RepCounterHandle,
    exercise: *const c_char,
    frame_json: *const c_char,
    timestamp_ms: i64,
) -> *mut c_char {
    clear_last_error();

    if counter.is_null() {
        set_last_error("Null counter pointer");
        return ptr::null_mut();
    }
    let handle = &mut *counter;

    respond(counter_process(&mut handle.counter, exercise, frame_json, timestamp_ms))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by seventyfive functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a seventyfive function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next seventyfive call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn seventyfive_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PoseSynthesizer;
    use chrono::TimeZone;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null(), "unexpected error: {:?}", last_error());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        seventyfive_free_string(ptr);
        s
    }

    fn last_error() -> Option<String> {
        unsafe {
            let err = seventyfive_last_error();
            if err.is_null() {
                None
            } else {
                Some(CStr::from_ptr(err).to_str().unwrap().to_string())
            }
        }
    }

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn test_ffi_challenge_flow() {
        let baselines = c(r#"{"pushups":10,"squats":15,"situps":10,"planks":30}"#);
        let today = c("2024-03-01");

        unsafe {
            let state = take_string(seventyfive_challenge_start(
                ptr::null(),
                baselines.as_ptr(),
                today.as_ptr(),
            ));

            let mut state = c(&state);
            for exercise in ["pushups", "squats", "situps", "planks"] {
                let exercise = c(exercise);
                let response = take_string(seventyfive_complete_exercise(
                    state.as_ptr(),
                    today.as_ptr(),
                    exercise.as_ptr(),
                    40,
                ));
                let value: serde_json::Value = serde_json::from_str(&response).unwrap();
                state = c(&value["state"].to_string());
            }

            let summary = take_string(seventyfive_summary(state.as_ptr(), today.as_ptr()));
            let summary: serde_json::Value = serde_json::from_str(&summary).unwrap();
            assert_eq!(summary["current_streak"], 1);
            assert_eq!(summary["total_days_completed"], 1);
            assert_eq!(summary["status"], "active");

            let advanced = take_string(seventyfive_advance_day(state.as_ptr()));
            let advanced: ChallengeState = serde_json::from_str(&advanced).unwrap();
            assert_eq!(advanced.current_day, 2);
        }
    }

    #[test]
    fn test_ffi_rejects_inactive_challenge() {
        let today = c("2024-03-01");
        let exercise = c("pushups");

        unsafe {
            let result = seventyfive_complete_exercise(
                ptr::null(),
                today.as_ptr(),
                exercise.as_ptr(),
                10,
            );
            assert!(result.is_null());
        }
        assert_eq!(last_error().as_deref(), Some("Challenge is not active"));
    }

    #[test]
    fn test_ffi_sync_day() {
        let baselines = c(r#"{"pushups":10,"squats":15,"situps":10,"planks":30}"#);
        let start = c("2024-03-01");
        let later = c("2024-03-10");

        unsafe {
            let state = c(&take_string(seventyfive_challenge_start(
                ptr::null(),
                baselines.as_ptr(),
                start.as_ptr(),
            )));

            let synced = take_string(seventyfive_sync_day(state.as_ptr(), later.as_ptr()));
            let synced: ChallengeState = serde_json::from_str(&synced).unwrap();
            assert_eq!(synced.current_day, 10);
            let record = synced.progress_for(parse_date("2024-03-10").unwrap()).unwrap();
            assert_eq!(record.day, 10);
            assert_eq!(record.exercise(ExerciseType::Pushups).unwrap().target, 19);
        }
    }

    #[test]
    fn test_ffi_update_baselines() {
        let baselines = c(r#"{"pushups":10,"squats":15,"situps":10,"planks":30}"#);
        let updated = c(r#"{"pushups":25,"squats":15,"situps":10,"planks":30}"#);
        let today = c("2024-03-01");
        let pushups = c("pushups");

        unsafe {
            let state = c(&take_string(seventyfive_challenge_start(
                ptr::null(),
                baselines.as_ptr(),
                today.as_ptr(),
            )));
            let response = take_string(seventyfive_complete_exercise(
                state.as_ptr(),
                today.as_ptr(),
                pushups.as_ptr(),
                10,
            ));
            let value: serde_json::Value = serde_json::from_str(&response).unwrap();
            let state = c(&value["state"].to_string());

            let state = take_string(seventyfive_update_baselines(
                state.as_ptr(),
                updated.as_ptr(),
                today.as_ptr(),
            ));
            let state: ChallengeState = serde_json::from_str(&state).unwrap();
            assert_eq!(state.baselines.pushups, 25);
            let record = state.progress_for(parse_date("2024-03-01").unwrap()).unwrap();
            let pushups = record.exercise(ExerciseType::Pushups).unwrap();
            assert_eq!(pushups.target, 25);
            assert!(!pushups.completed);
        }
    }

    #[test]
    fn test_ffi_advance_day_with_out_of_range_day() {
        let baselines = c(r#"{"pushups":10,"squats":15,"situps":10,"planks":30}"#);
        let today = c("2024-03-01");

        unsafe {
            let state = take_string(seventyfive_challenge_start(
                ptr::null(),
                baselines.as_ptr(),
                today.as_ptr(),
            ));
            let mut value: serde_json::Value = serde_json::from_str(&state).unwrap();
            value["current_day"] = serde_json::json!(u32::MAX);
            let state = c(&value.to_string());

            let advanced = take_string(seventyfive_advance_day(state.as_ptr()));
            let advanced: ChallengeState = serde_json::from_str(&advanced).unwrap();
            assert_eq!(advanced.current_day, 75);
        }
    }

    #[test]
    fn test_ffi_bad_date() {
        let baselines = c(r#"{"pushups":10,"squats":15,"situps":10,"planks":30}"#);
        let today = c("March 1st");

        unsafe {
            let result =
                seventyfive_challenge_start(ptr::null(), baselines.as_ptr(), today.as_ptr());
            assert!(result.is_null());
        }
        assert!(last_error().unwrap().starts_with("Date parse error"));
    }

    #[test]
    fn test_ffi_daily_targets() {
        let baselines = c(r#"{"pushups":10,"squats":15,"situps":10,"planks":30}"#);
        unsafe {
            let json = take_string(seventyfive_daily_targets(baselines.as_ptr(), 75));
            let targets: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(targets["pushups"], 84);
            assert_eq!(targets["planks"], 400);
        }
    }

    #[test]
    fn test_ffi_counter_lifecycle() {
        let start_ms = Utc
            .with_ymd_and_hms(2024, 3, 1, 7, 0, 0)
            .unwrap()
            .timestamp_millis();
        let exercise = c("push-ups");
        let synth = PoseSynthesizer::default();
        let frame_json = |value: f64| {
            c(&serde_json::to_string(&synth.frame_for(ExerciseType::Pushups, value)).unwrap())
        };
        let down = frame_json(100.0);
        let up = frame_json(155.0);

        unsafe {
            let counter = seventyfive_counter_new(ptr::null());
            assert!(!counter.is_null());

            // not started yet
            assert!(seventyfive_counter_process(counter, exercise.as_ptr(), down.as_ptr(), start_ms)
                .is_null());

            assert_eq!(seventyfive_counter_start(counter, exercise.as_ptr(), start_ms), 0);
            take_string(seventyfive_counter_process(
                counter,
                exercise.as_ptr(),
                down.as_ptr(),
                start_ms + 900,
            ));
            let outcome = take_string(seventyfive_counter_process(
                counter,
                exercise.as_ptr(),
                up.as_ptr(),
                start_ms + 1800,
            ));
            let outcome: serde_json::Value = serde_json::from_str(&outcome).unwrap();
            assert_eq!(outcome["state"]["rep_count"], 1);
            assert_eq!(outcome["reps_added"], 1);

            let stopped = take_string(seventyfive_counter_stop(counter, exercise.as_ptr()));
            assert!(stopped.contains("\"rep_count\":1"));
            assert!(seventyfive_counter_stop(counter, exercise.as_ptr()).is_null());

            seventyfive_counter_free(counter);
        }
    }

    #[test]
    fn test_ffi_counter_bad_config() {
        let config = c("[pushups]\nenter_threshold = 'x'\n");
        unsafe {
            let counter = seventyfive_counter_new(config.as_ptr());
            assert!(counter.is_null());
        }
        assert!(last_error().is_some());
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = seventyfive_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
