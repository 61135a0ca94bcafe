//! Console reports
//!
//! Track summaries for `info`, the batch summary for `extract` and the
//! decoder listing for `formats`.

use dashcam_telemetry::{ExportFormat, FormatRegistry, GpsPoint, GpsTrack};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Outcome of one file in a batch
#[derive(Debug)]
pub enum FileOutcome {
    Exported {
        input: PathBuf,
        output: PathBuf,
        points: usize,
    },
    Failed {
        input: PathBuf,
        error: String,
    },
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

/// Print one line per file and the totals; returns the number of failures
pub fn print_batch_summary(outcomes: &[FileOutcome]) -> usize {
    for outcome in outcomes {
        match outcome {
            FileOutcome::Exported { input, output, points } => {
                println!("✓ {} -> {} ({} points)", input.display(), output.display(), points);
            }
            FileOutcome::Failed { input, error } => {
                eprintln!("✗ {}: {}", input.display(), error);
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    println!(
        "\n{} file(s) processed: {} exported, {} failed",
        outcomes.len(),
        outcomes.len() - failed,
        failed
    );
    failed
}

fn describe_point(point: &GpsPoint) -> String {
    format!(
        "{:.6}, {:.6} at {} ({:.1} km/h, fix {})",
        point.latitude,
        point.longitude,
        point.timestamp.to_rfc3339(),
        point.speed,
        point.fix_quality
    )
}

/// Human readable track summary
pub fn print_info(path: &Path, format_name: &str, track: &GpsTrack) {
    println!("═══════════════════════════════════════════════");
    println!("  {}", path.display());
    println!("═══════════════════════════════════════════════\n");

    println!("Format:    {}", format_name);
    println!("Points:    {}", track.len());
    println!("Valid:     {}", track.iter().filter(|p| p.is_valid()).count());
    println!("Duration:  {:.1} s", track.duration_secs());

    if let Some(bounds) = track.bounds() {
        println!(
            "Bounds:    lat {:.6} .. {:.6}, lon {:.6} .. {:.6}",
            bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
        );
    }
    if let Some(first) = track.first() {
        println!("First fix: {}", describe_point(first));
    }
    if let Some(last) = track.last() {
        println!("Last fix:  {}", describe_point(last));
    }

    if !track.device_info().is_empty() {
        println!("\nDevice info:");
        for (key, value) in track.device_info() {
            println!("  {:<24} {}", key, value);
        }
    }
}

/// Machine readable track summary for `info --json`
pub fn info_json(path: &Path, format_name: &str, track: &GpsTrack) -> serde_json::Value {
    json!({
        "file": path.to_string_lossy(),
        "format": format_name,
        "points": track.len(),
        "valid_points": track.iter().filter(|p| p.is_valid()).count(),
        "duration_seconds": track.duration_secs(),
        "bounds": track.bounds(),
        "first": track.first(),
        "last": track.last(),
        "device_info": track.device_info()
    })
}

/// List decoders and export formats
pub fn print_formats(registry: &FormatRegistry) {
    println!("Telemetry decoders (probed in this order):");
    for format in registry.iter() {
        println!("  {:<12} {}", format.name(), format.formats().join(", "));
    }

    println!("\nExport formats:");
    for format in ExportFormat::ALL {
        println!("  {:<8} .{:<8} {}", format.to_string(), format.extension(), format.display_name());
    }
}
