//! Dashcam Telemetry Library
//!
//! A stateless, reusable library for extracting GPS telemetry that dashcams
//! embed in their MP4 recordings, and for exporting it as GPX, GeoJSON, KML
//! or CSV.
//!
//! # Architecture
//!
//! Extraction is a single synchronous pass per file:
//! - The container scanner walks the MP4 box tree and reports candidate spans
//! - The format registry picks the vendor decoder that recognizes the file
//! - The decoder turns candidate payloads into a lazy stream of records
//! - The assembler counts bad records, applies skip-invalid and orders the
//!   points into a [`GpsTrack`]
//!
//! The library does NOT:
//! - Decode or render video
//! - Modify MP4 files
//! - Recover encrypted telemetry
//!
//! Batch processing and file output naming live in the application layer
//! (dashcam-telemetry-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use dashcam_telemetry::{extract_with_config, ExportFormat, ExtractConfig};
//!
//! let config = ExtractConfig::new().with_skip_invalid(true);
//! let track = extract_with_config("FILE0001.MP4", &config).unwrap();
//!
//! println!("{} points, {:.0} s", track.len(), track.duration_secs());
//! if let Some(bounds) = track.bounds() {
//!     println!("lat {} .. {}", bounds.min_lat, bounds.max_lat);
//! }
//!
//! track.to_gpx("FILE0001.gpx").unwrap();
//! track.export("FILE0001.json", ExportFormat::GeoJson).unwrap();
//! ```

// Public modules
pub mod assembler;
pub mod config;
pub mod container;
pub mod export;
pub mod extractor;
pub mod formats;
pub mod track;
pub mod types;

// Re-export main types for convenience
pub use config::ExtractConfig;
pub use export::{ExportFormat, KmlMode};
pub use extractor::{default_registry, extract, extract_with_config, TelemetryExtractor};
pub use formats::{FormatRegistry, TelemetryFormat, YouqingFormat};
pub use track::GpsTrack;
pub use types::{
    Bounds, DeviceInfo, DeviceValue, FixQuality, GpsPoint, Result, TelemetryError, Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
