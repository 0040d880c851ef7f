//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    device: DeviceInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    streams: Vec<StreamInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    detector: DetectorInfo,
}

#[derive(Serialize)]
struct DeviceInfo {
    id: String,
    counter_path: String,
}

#[derive(Serialize)]
struct StreamInfo {
    id: String,
    kind: String,
    sample_rate_hz: f64,
    buffer_capacity: usize,
    source: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
}

#[derive(Serialize)]
struct DetectorInfo {
    event_thresh: f64,
    std_max: f64,
    std_window_ms: u64,
    cooldown_s: f64,
    axis_divisors: [f64; 3],
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::AppBlueprint, args: &InfoArgs) -> ConfigInfo {
    let streams = if args.streams {
        blueprint
            .streams
            .iter()
            .map(|s| StreamInfo {
                id: s.id.to_string(),
                kind: s.kind.label().to_string(),
                sample_rate_hz: s.sample_rate_hz,
                buffer_capacity: s.buffer_capacity,
                source: format!("{:?}", s.source),
            })
            .collect()
    } else {
        Vec::new()
    };

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        device: DeviceInfo {
            id: blueprint.device.id.clone(),
            counter_path: blueprint.device.counter_path.clone(),
        },
        streams,
        sinks,
        detector: DetectorInfo {
            event_thresh: blueprint.detector.event_thresh,
            std_max: blueprint.detector.std_max,
            std_window_ms: blueprint.detector.std_window_ms,
            cooldown_s: blueprint.detector.cooldown_s,
            axis_divisors: blueprint.detector.axis_divisors,
        },
    }
}

fn print_config_info(blueprint: &contracts::AppBlueprint, args: &InfoArgs) {
    println!("=== Bowsense Configuration ===\n");

    // Device info
    println!("Device");
    println!("   Version: {:?}", blueprint.version);
    println!("   Id: {}", blueprint.device.id);
    println!("   Counter file: {}", blueprint.device.counter_path);

    // Streams
    println!("\nStreams ({})", blueprint.streams.len());
    for stream in &blueprint.streams {
        if args.streams {
            println!(
                "   - {} ({}, {} Hz, capacity {}, {:?})",
                stream.id,
                stream.kind.label(),
                stream.sample_rate_hz,
                stream.buffer_capacity,
                stream.source
            );
        } else {
            println!("   - {} ({})", stream.id, stream.kind.label());
        }
    }

    // Detector settings
    println!("\nDetector");
    println!("   Threshold: {} m/s²", blueprint.detector.event_thresh);
    println!("   Std max: {}", blueprint.detector.std_max);
    println!("   Std window: {} ms", blueprint.detector.std_window_ms);
    println!("   Cooldown: {} s", blueprint.detector.cooldown_s);
    println!("   Axis divisors: {:?}", blueprint.detector.axis_divisors);
    println!(
        "   Align backoff: {} samples",
        blueprint.align.backoff_samples
    );
    println!("   Poll rate: {} Hz", blueprint.poll.poll_rate_hz);

    // Sinks
    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({})", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            if args.sinks {
                println!("   - {} ({:?}) params: {:?}", sink.name, sink.sink_type, sink.params);
            } else {
                println!("   - {} ({:?})", sink.name, sink.sink_type);
            }
        }
    }

    println!();
}
