// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Run Parameter Validation
//
// Everything a simulate request carries is checked here, before the order
// snapshot is read or anything is written.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::types::SimulateRequest;

/// Fixed textual pattern of the declared start time.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingParameter(&'static str),

    #[error("Invalid parameters. {0} must be a valid integer")]
    NotAnInteger(&'static str),

    #[error("Invalid parameters. {0} must be a positive integer")]
    NotPositive(&'static str),

    #[error("start_time must match YYYY-MM-DD HH:MM:SS, got {0:?}")]
    InvalidStartTime(String),
}

/// Validated run parameters.
///
/// `num_drivers` and `max_hours_per_day` are recorded on the run only; the
/// cost model does not read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationParams {
    pub num_drivers: u32,
    pub start_time: DateTime<Utc>,
    pub max_hours_per_day: u32,
}

impl SimulationParams {
    pub fn parse(request: &SimulateRequest) -> Result<Self, ValidationError> {
        let num_drivers = positive_int("num_drivers", request.num_drivers.as_ref())?;
        let max_hours_per_day =
            positive_int("max_hours_per_day", request.max_hours_per_day.as_ref())?;
        let raw_start = request
            .start_time
            .as_deref()
            .ok_or(ValidationError::MissingParameter("start_time"))?;
        let start_time = parse_start_time(raw_start)?;

        Ok(Self {
            num_drivers,
            start_time,
            max_hours_per_day,
        })
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS` exactly (no surrounding whitespace),
/// interpreting the wall time as UTC.
pub fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let invalid = || ValidationError::InvalidStartTime(raw.to_string());
    // chrono tolerates leading whitespace before numeric fields.
    if raw.trim() != raw {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(raw, START_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

/// Accept JSON integers, integral floats and integer strings.
fn positive_int(field: &'static str, raw: Option<&Value>) -> Result<u32, ValidationError> {
    let value = match raw {
        None | Some(Value::Null) => return Err(ValidationError::MissingParameter(field)),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => return Err(ValidationError::NotAnInteger(field)),
        },
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::NotAnInteger(field))?,
        Some(_) => return Err(ValidationError::NotAnInteger(field)),
    };

    if value <= 0 {
        return Err(ValidationError::NotPositive(field));
    }
    u32::try_from(value).map_err(|_| ValidationError::NotAnInteger(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn request(drivers: Value, start: Option<&str>, hours: Value) -> SimulateRequest {
        SimulateRequest {
            num_drivers: Some(drivers),
            start_time: start.map(str::to_string),
            max_hours_per_day: Some(hours),
        }
    }

    #[test]
    fn accepts_integers_and_integer_strings() {
        let params = SimulationParams::parse(&request(json!(3), Some("2025-01-15 09:00:00"), json!("8")))
            .expect("test: valid request");
        assert_eq!(params.num_drivers, 3);
        assert_eq!(params.max_hours_per_day, 8);
        assert_eq!(params.start_time.year(), 2025);
        assert_eq!(params.start_time.hour(), 9);
    }

    #[test]
    fn rejects_non_integer_driver_count() {
        let err = SimulationParams::parse(&request(json!("three"), Some("2025-01-15 09:00:00"), json!(8)));
        assert_eq!(err, Err(ValidationError::NotAnInteger("num_drivers")));

        let err = SimulationParams::parse(&request(json!(2.5), Some("2025-01-15 09:00:00"), json!(8)));
        assert_eq!(err, Err(ValidationError::NotAnInteger("num_drivers")));
    }

    #[test]
    fn rejects_non_positive_values() {
        let err = SimulationParams::parse(&request(json!(0), Some("2025-01-15 09:00:00"), json!(8)));
        assert_eq!(err, Err(ValidationError::NotPositive("num_drivers")));

        let err = SimulationParams::parse(&request(json!(2), Some("2025-01-15 09:00:00"), json!(-4)));
        assert_eq!(err, Err(ValidationError::NotPositive("max_hours_per_day")));
    }

    #[test]
    fn missing_parameters_are_reported() {
        let empty = SimulateRequest::default();
        assert_eq!(
            SimulationParams::parse(&empty),
            Err(ValidationError::MissingParameter("num_drivers"))
        );

        let no_start = request(json!(2), None, json!(8));
        assert_eq!(
            SimulationParams::parse(&no_start),
            Err(ValidationError::MissingParameter("start_time"))
        );
    }

    #[test]
    fn start_time_must_match_pattern() {
        for bad in [
            "2025-01-15T09:00:00",
            "15/01/2025 09:00:00",
            "2025-01-15",
            "2025-13-01 09:00:00",
            " 2025-01-15 09:00:00",
            "2025-01-15 09:00:00 ",
        ] {
            let err = SimulationParams::parse(&request(json!(2), Some(bad), json!(8)));
            assert!(
                matches!(err, Err(ValidationError::InvalidStartTime(_))),
                "{bad} should be rejected, got {err:?}"
            );
        }
    }
}
