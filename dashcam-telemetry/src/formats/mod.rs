//! Vendor telemetry formats
//!
//! This module contains the decoders for dashcam telemetry formats and the
//! registry used to pick one for a given file. Each decoder implements
//! [`TelemetryFormat`]; detection asks every registered decoder, in
//! registration order, whether it recognizes the file.

use crate::config::ExtractConfig;
use crate::track::GpsTrack;
use crate::types::{Result, TelemetryError};
use std::path::Path;

pub mod nmea;
pub mod youqing;

pub use youqing::{RecordLayout, YouqingFormat, YouqingRecords};

/// Capability set of a vendor decoder
///
/// `can_parse` must be cheap (signature check, not a full decode) and must
/// not modify anything.
pub trait TelemetryFormat: Send + Sync {
    /// Display name
    fn name(&self) -> &'static str;

    /// Format tags (vendor or brand names) this decoder claims
    fn formats(&self) -> &'static [&'static str];

    /// Probe whether the file carries this decoder's telemetry
    fn can_parse(&self, path: &Path, config: &ExtractConfig) -> bool;

    /// Decode the file into an assembled track
    fn parse(&self, path: &Path, config: &ExtractConfig) -> Result<GpsTrack>;
}

/// Ordered collection of vendor decoders
///
/// Earlier registrations win when more than one decoder claims a file. The
/// registry is read-only once built and can be shared between threads;
/// registering while other threads detect needs external synchronization.
pub struct FormatRegistry {
    formats: Vec<Box<dyn TelemetryFormat>>,
}

impl FormatRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self { formats: Vec::new() }
    }

    /// Create a registry holding every built-in decoder
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(YouqingFormat::new()));
        registry
    }

    /// Append a decoder; it is probed after all earlier ones
    pub fn register(&mut self, format: Box<dyn TelemetryFormat>) {
        log::debug!("Registering telemetry format: {}", format.name());
        self.formats.push(format);
    }

    /// Select the first decoder whose probe accepts the file
    pub fn detect(&self, path: &Path, config: &ExtractConfig) -> Result<&dyn TelemetryFormat> {
        for format in &self.formats {
            if format.can_parse(path, config) {
                log::debug!("Detected {} telemetry in {:?}", format.name(), path);
                return Ok(format.as_ref());
            }
        }
        Err(TelemetryError::UnsupportedFormat(path.to_path_buf()))
    }

    /// Look up a decoder by display name or claimed format tag (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&dyn TelemetryFormat> {
        self.formats
            .iter()
            .find(|f| {
                f.name().eq_ignore_ascii_case(name)
                    || f.formats().iter().any(|tag| tag.eq_ignore_ascii_case(name))
            })
            .map(|f| f.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn TelemetryFormat> {
        self.formats.iter().map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
