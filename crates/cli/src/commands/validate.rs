//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{SensorKind, SourceMode};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    device_id: String,
    stream_count: usize,
    sink_count: usize,
    event_thresh: f64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    device_id: blueprint.device.id.clone(),
                    stream_count: blueprint.streams.len(),
                    sink_count: blueprint.sinks.len(),
                    event_thresh: blueprint.detector.event_thresh,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::AppBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    // Check for empty sinks
    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - confirmed events will only be logged".to_string());
    }

    // Push streams need an external driver the CLI cannot provide
    for stream in &blueprint.streams {
        if stream.source == SourceMode::Push {
            warnings.push(format!(
                "Stream '{}' uses a push source; it stays cold unless driven externally",
                stream.id
            ));
        }
    }

    // Stability window must fit inside the orientation ring
    if let Some(orientation) = blueprint.stream_of_kind(SensorKind::Orientation) {
        let window_samples =
            orientation.sample_rate_hz * blueprint.detector.std_window_ms as f64 / 1000.0;
        if window_samples > orientation.buffer_capacity as f64 {
            warnings.push(format!(
                "detector.std_window_ms ({} ms) exceeds the orientation buffer span; the gate will use the whole ring",
                blueprint.detector.std_window_ms
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Device: {}", summary.device_id);
            println!("  Streams: {}", summary.stream_count);
            println!("  Sinks: {}", summary.sink_count);
            println!("  Event threshold: {} m/s²", summary.event_thresh);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
