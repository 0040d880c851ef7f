//! Configuration validation.
//!
//! Rules beyond the field-level `validator` derive:
//! - stream ids unique
//! - exactly one accelerometer stream, at most one orientation/magnetometer
//! - orientation context requires either an orientation stream or an
//!   accelerometer + magnetometer pair
//! - axis divisors strictly positive
//! - sink required fields present

use std::collections::HashSet;

use contracts::{AppBlueprint, ContractError, SensorKind, SinkType};
use validator::Validate;

/// Validate an AppBlueprint.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_stream_ids(blueprint)?;
    validate_stream_kinds(blueprint)?;
    validate_axis_divisors(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Run the derive-level range/length checks
fn validate_fields(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|e| {
        let field = e
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "blueprint".to_string());
        ContractError::config_validation(field, e.to_string())
    })
}

/// Stream ids must be unique
fn validate_stream_ids(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for stream in &blueprint.streams {
        if !seen.insert(stream.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("streams[id={}]", stream.id),
                "duplicate stream id",
            ));
        }
    }
    Ok(())
}

/// Stream kind topology must support detection
fn validate_stream_kinds(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    let count = |kind: SensorKind| {
        blueprint
            .streams
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    };

    let accel = count(SensorKind::Accelerometer);
    let orientation = count(SensorKind::Orientation);
    let magnetometer = count(SensorKind::Magnetometer);

    if accel != 1 {
        return Err(ContractError::config_validation(
            "streams",
            format!("exactly one accelerometer stream required, got {accel}"),
        ));
    }
    if orientation > 1 || magnetometer > 1 {
        return Err(ContractError::config_validation(
            "streams",
            "at most one orientation and one magnetometer stream allowed",
        ));
    }
    if orientation == 0 && magnetometer == 0 {
        return Err(ContractError::config_validation(
            "streams",
            "orientation context requires an orientation stream or a magnetometer stream",
        ));
    }
    Ok(())
}

/// Resolution-adjustment divisors must be strictly positive
fn validate_axis_divisors(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    for (axis, divisor) in blueprint.detector.axis_divisors.iter().enumerate() {
        if *divisor <= 0.0 {
            return Err(ContractError::config_validation(
                format!("detector.axis_divisors[{axis}]"),
                format!("divisor must be > 0, got {divisor}"),
            ));
        }
    }
    Ok(())
}

/// Sink required fields must be present
fn validate_sinks(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if sink.sink_type == SinkType::HttpLine && !sink.params.contains_key("url") {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].params.url"),
                "http_line sink requires a 'url' parameter",
            ));
        }
    }
    Ok(())
}
