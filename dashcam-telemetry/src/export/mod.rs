//! Track exporters
//!
//! Every exporter renders a [`GpsTrack`] to text without touching the disk;
//! only [`export_to_file`] performs I/O. Empty tracks render to valid, empty
//! documents.

use crate::track::GpsTrack;
use crate::types::{keys, Result, TelemetryError, Timestamp};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub mod csv;
pub mod geojson;
pub mod gpx;
pub mod kml;

pub use kml::KmlMode;

/// Output formats a track can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Gpx,
    GeoJson,
    Kml,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Gpx,
        ExportFormat::GeoJson,
        ExportFormat::Kml,
        ExportFormat::Csv,
    ];

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Gpx => "gpx",
            ExportFormat::GeoJson => "json",
            ExportFormat::Kml => "kml",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExportFormat::Gpx => "GPX (GPS Exchange)",
            ExportFormat::GeoJson => "GeoJSON",
            ExportFormat::Kml => "KML (Google Earth)",
            ExportFormat::Csv => "CSV",
        }
    }

    /// Guess the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ExportFormat::Gpx => "gpx",
            ExportFormat::GeoJson => "geojson",
            ExportFormat::Kml => "kml",
            ExportFormat::Csv => "csv",
        };
        write!(f, "{}", tag)
    }
}

impl FromStr for ExportFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gpx" => Ok(ExportFormat::Gpx),
            "geojson" | "json" => Ok(ExportFormat::GeoJson),
            "kml" => Ok(ExportFormat::Kml),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(TelemetryError::UnknownExportFormat(s.to_string())),
        }
    }
}

/// Render a track to text in the given format
pub fn render(track: &GpsTrack, format: ExportFormat) -> String {
    match format {
        ExportFormat::Gpx => gpx::render(track),
        ExportFormat::GeoJson => geojson::render(track),
        ExportFormat::Kml => kml::render(track),
        ExportFormat::Csv => csv::render(track),
    }
}

/// Render a track and write it to `path`, creating parent directories
pub fn export_to_file(track: &GpsTrack, path: &Path, format: ExportFormat) -> Result<()> {
    let content = render(track, format);
    write_output(path, &content)?;
    log::info!(
        "Exported {} points as {} to {:?}",
        track.len(),
        format.display_name(),
        path
    );
    Ok(())
}

pub(crate) fn write_output(path: &Path, content: &str) -> Result<()> {
    let serialization = |source| TelemetryError::Serialization {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(serialization)?;
    }
    fs::write(path, content).map_err(serialization)
}

/// UTC timestamp with an explicit `Z`
pub(crate) fn format_time(timestamp: &Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Decoder format tag recorded on the track, if any
pub(crate) fn format_tag(track: &GpsTrack) -> Option<&str> {
    track.device_info().get(keys::FORMAT).and_then(|v| v.as_str())
}

/// Human readable summary used as the document description
pub(crate) fn description(track: &GpsTrack) -> String {
    let source = track
        .source_file()
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match format_tag(track) {
        Some(tag) => format!("{} telemetry extracted from {}", tag, source),
        None => format!("Telemetry extracted from {}", source),
    }
}
