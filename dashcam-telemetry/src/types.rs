//! Core types for the telemetry extractor
//!
//! This module defines the normalized point type every vendor decoder emits,
//! the open-ended device metadata attached to a track, and the error taxonomy
//! shared by scanning, decoding, assembly and export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Timestamp type used throughout the extractor
pub type Timestamp = DateTime<Utc>;

/// Result type for extractor operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors that can occur while extracting or exporting telemetry
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Not a parseable MP4 box structure: {0}")]
    ContainerFormat(String),

    #[error("No registered decoder supports: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    #[error("Stream truncated at offset {offset}: record needs {needed} bytes, {available} available")]
    TruncatedStream {
        offset: u64,
        needed: usize,
        available: usize,
    },

    #[error("Failed to write {path:?}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input file not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("Unknown export format: {0}")]
    UnknownExportFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// True for per-record errors that the assembler recovers from locally
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            TelemetryError::CorruptRecord { .. } | TelemetryError::TruncatedStream { .. }
        )
    }
}

/// GPS receiver fix category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FixQuality {
    /// No usable fix; the point is present but semantically invalid
    Invalid,
    /// Standard GPS fix
    #[default]
    Gps,
    /// Differential GPS fix
    Dgps,
}

impl FixQuality {
    pub fn as_u8(self) -> u8 {
        match self {
            FixQuality::Invalid => 0,
            FixQuality::Gps => 1,
            FixQuality::Dgps => 2,
        }
    }
}

impl From<FixQuality> for u8 {
    fn from(quality: FixQuality) -> Self {
        quality.as_u8()
    }
}

impl TryFrom<u8> for FixQuality {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(FixQuality::Invalid),
            1 => Ok(FixQuality::Gps),
            2 => Ok(FixQuality::Dgps),
            other => Err(format!("invalid fix quality {}", other)),
        }
    }
}

impl fmt::Display for FixQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One GPS fix at one instant, with optional inertial sensor readings
///
/// Optional fields are `None` when the vendor format does not carry them.
/// A missing altitude is never reported as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    /// Latitude in decimal degrees, positive north
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east
    pub longitude: f64,
    /// UTC instant of the fix
    pub timestamp: Timestamp,
    /// Ground speed in km/h
    pub speed: f64,
    /// Course over ground in degrees from true north, [0, 360)
    pub heading: f64,
    /// Altitude in meters
    pub altitude: Option<f64>,
    pub fix_quality: FixQuality,
    /// Accelerometer axes, raw or g-force depending on the vendor scale
    pub gsensor_x: Option<f64>,
    pub gsensor_y: Option<f64>,
    pub gsensor_z: Option<f64>,
    /// Satellites used in the fix, if reported
    pub satellites: Option<u8>,
}

impl GpsPoint {
    /// Create a point with a GPS fix and no optional readings
    pub fn new(latitude: f64, longitude: f64, timestamp: Timestamp) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            speed: 0.0,
            heading: 0.0,
            altitude: None,
            fix_quality: FixQuality::Gps,
            gsensor_x: None,
            gsensor_y: None,
            gsensor_z: None,
            satellites: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_fix_quality(mut self, fix_quality: FixQuality) -> Self {
        self.fix_quality = fix_quality;
        self
    }

    pub fn with_gsensor(mut self, x: f64, y: f64, z: f64) -> Self {
        self.gsensor_x = Some(x);
        self.gsensor_y = Some(y);
        self.gsensor_z = Some(z);
        self
    }

    pub fn with_satellites(mut self, satellites: u8) -> Self {
        self.satellites = Some(satellites);
        self
    }

    /// True if the coordinates are finite and inside the WGS84 ranges
    pub fn has_valid_position(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// True if the point has a fix and an in-range position
    pub fn is_valid(&self) -> bool {
        self.fix_quality != FixQuality::Invalid && self.has_valid_position()
    }
}

/// Scalar or string value stored in a track's device metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl DeviceValue {
    /// Integer view of the value, if it is numeric
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DeviceValue::Integer(v) => Some(*v),
            DeviceValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DeviceValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceValue::Integer(v) => write!(f, "{}", v),
            DeviceValue::Float(v) => write!(f, "{}", v),
            DeviceValue::Boolean(v) => write!(f, "{}", v),
            DeviceValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for DeviceValue {
    fn from(value: &str) -> Self {
        DeviceValue::Text(value.to_string())
    }
}

impl From<String> for DeviceValue {
    fn from(value: String) -> Self {
        DeviceValue::Text(value)
    }
}

impl From<i64> for DeviceValue {
    fn from(value: i64) -> Self {
        DeviceValue::Integer(value)
    }
}

impl From<usize> for DeviceValue {
    fn from(value: usize) -> Self {
        DeviceValue::Integer(value as i64)
    }
}

impl From<f64> for DeviceValue {
    fn from(value: f64) -> Self {
        DeviceValue::Float(value)
    }
}

impl From<bool> for DeviceValue {
    fn from(value: bool) -> Self {
        DeviceValue::Boolean(value)
    }
}

/// Open-ended device metadata (vendor name, format tag, decode counters)
///
/// Ordered so exports are reproducible.
pub type DeviceInfo = BTreeMap<String, DeviceValue>;

/// Well-known device metadata keys
pub mod keys {
    pub const VENDOR: &str = "vendor";
    pub const FORMAT: &str = "format";
    pub const CANDIDATE_SPANS: &str = "candidate_spans";
    pub const SKIPPED_BOXES: &str = "skipped_boxes";
    pub const RECORDS_DECODED: &str = "records_decoded";
    pub const CORRUPT_RECORDS: &str = "corrupt_records";
    pub const TRUNCATED_STREAMS: &str = "truncated_streams";
    pub const INVALID_POINTS_SKIPPED: &str = "invalid_points_skipped";
}

/// Latitude/longitude bounding box of a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Bounding box of a single position
    pub fn from_point(latitude: f64, longitude: f64) -> Self {
        Self {
            min_lat: latitude,
            min_lon: longitude,
            max_lat: latitude,
            max_lon: longitude,
        }
    }

    /// Grow the box to include a position
    pub fn extend(&mut self, latitude: f64, longitude: f64) {
        self.min_lat = self.min_lat.min(latitude);
        self.min_lon = self.min_lon.min(longitude);
        self.max_lat = self.max_lat.max(latitude);
        self.max_lon = self.max_lon.max(longitude);
    }
}
