//! MP4 telemetry span inspector
//!
//! Lists every candidate telemetry box the scanner finds in a recording and
//! how many records each one decodes to. Useful when a new dashcam model
//! produces an empty track. Set RUST_LOG=debug for scanner detail.

use dashcam_telemetry::container::Mp4Scanner;
use dashcam_telemetry::formats::youqing::SIGNATURE;
use dashcam_telemetry::{ExtractConfig, TelemetryError, YouqingFormat};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: {} <mp4_file_path>", args[0]);
        return;
    }

    let file_path = Path::new(&args[1]);
    println!("\nFile: {:?}", file_path);
    println!("────────────────────────────────────────────────────────────────\n");

    let config = ExtractConfig::new();
    let mut scanner = match Mp4Scanner::open(file_path, vec![SIGNATURE], config.scan_options()) {
        Ok(s) => s,
        Err(e) => {
            println!("❌ ERROR: {}", e);
            return;
        }
    };
    println!("📊 File Size: {:.2} MB", scanner.file_len() as f64 / (1024.0 * 1024.0));

    let format = YouqingFormat::new();
    let mut spans = 0;
    let mut total_points = 0;

    println!(
        "\n{:<12} {:<10} {:<10} {:<8} {:<8} {}",
        "Offset", "Length", "Where", "Points", "Errors", "First fix"
    );
    println!("─────────────────────────────────────────────────────────────");

    while let Some(span) = scanner.next() {
        let span = match span {
            Ok(span) => span,
            Err(e) => {
                println!("❌ ERROR: {}", e);
                return;
            }
        };
        spans += 1;

        let payload = match scanner.read_payload(&span, config.max_span_len) {
            Ok(p) => p,
            Err(e) => {
                println!("❌ ERROR reading span at {}: {}", span.offset, e);
                continue;
            }
        };

        let mut points = Vec::new();
        let mut errors = 0;
        for record in format.records(&payload, span.payload_offset()) {
            match record {
                Ok(point) => points.push(point),
                Err(TelemetryError::CorruptRecord { .. } | TelemetryError::TruncatedStream { .. }) => {
                    errors += 1
                }
                Err(e) => println!("❌ ERROR: {}", e),
            }
        }
        total_points += points.len();

        let first = points
            .first()
            .map(|p| format!("{:.6}, {:.6} @ {}", p.latitude, p.longitude, p.timestamp))
            .unwrap_or_else(|| "-".to_string());
        let location = if span.embedded { "mdat" } else { "box tree" };
        println!(
            "{:<12} {:<10} {:<10} {:<8} {:<8} {}{}",
            span.offset,
            span.len,
            location,
            points.len(),
            errors,
            first,
            if span.clamped { " (clamped)" } else { "" }
        );
    }

    println!("\nCandidate spans: {}", spans);
    println!("Decoded points:  {}", total_points);

    if !scanner.warnings().is_empty() {
        println!("\n⚠️  Skipped structures:");
        for warning in scanner.warnings() {
            println!("   {}", warning);
        }
    }
}
