//! Main extraction API
//!
//! `TelemetryExtractor` ties the pipeline together. It asks the format
//! registry for a decoder and hands the file to it.
//! The free functions [`extract`] and [`extract_with_config`] use a shared
//! registry holding the built-in decoders.

use crate::config::ExtractConfig;
use crate::container;
use crate::formats::{FormatRegistry, TelemetryFormat};
use crate::track::GpsTrack;
use crate::types::{Result, TelemetryError};
use std::path::Path;
use std::sync::OnceLock;

/// Entry point for extracting telemetry from video files
pub struct TelemetryExtractor {
    registry: FormatRegistry,
}

impl TelemetryExtractor {
    /// Create an extractor with every built-in decoder
    pub fn new() -> Self {
        Self::with_registry(FormatRegistry::new())
    }

    /// Create an extractor around a custom registry
    pub fn with_registry(registry: FormatRegistry) -> Self {
        Self { registry }
    }

    /// Add a decoder after the ones already registered
    ///
    /// # Example
    /// ```no_run
    /// use dashcam_telemetry::{TelemetryExtractor, YouqingFormat};
    ///
    /// let mut extractor = TelemetryExtractor::new();
    /// extractor.register(Box::new(YouqingFormat::new()));
    /// ```
    pub fn register(&mut self, format: Box<dyn TelemetryFormat>) {
        self.registry.register(format);
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Find the decoder for a file without decoding it
    pub fn detect(&self, path: &Path, config: &ExtractConfig) -> Result<&dyn TelemetryFormat> {
        detect_in(&self.registry, path, config)
    }

    /// Detect, decode and assemble one file
    ///
    /// # Example
    /// ```no_run
    /// use dashcam_telemetry::{ExtractConfig, TelemetryExtractor};
    /// use std::path::Path;
    ///
    /// let extractor = TelemetryExtractor::new();
    /// let config = ExtractConfig::new().with_skip_invalid(true);
    /// let track = extractor.extract_file(Path::new("FILE0001.MP4"), &config).unwrap();
    /// println!("{} points over {:.0}s", track.len(), track.duration_secs());
    /// ```
    pub fn extract_file(&self, path: &Path, config: &ExtractConfig) -> Result<GpsTrack> {
        log::info!("Extracting telemetry: {:?}", path);
        let format = self.detect(path, config)?;
        let track = format.parse(path, config)?;
        log::info!(
            "Extracted {} points ({}) from {:?}",
            track.len(),
            format.name(),
            path
        );
        Ok(track)
    }
}

impl Default for TelemetryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// A file no decoder claims is reported as `ContainerFormat` when it is not
/// an MP4 box tree at all, `UnsupportedFormat` otherwise
fn detect_in<'r>(
    registry: &'r FormatRegistry,
    path: &Path,
    config: &ExtractConfig,
) -> Result<&'r dyn TelemetryFormat> {
    if !path.is_file() {
        return Err(TelemetryError::FileNotFound(path.to_path_buf()));
    }
    match registry.detect(path, config) {
        Err(TelemetryError::UnsupportedFormat(unsupported)) => {
            container::check_structure(path)?;
            Err(TelemetryError::UnsupportedFormat(unsupported))
        }
        detected => detected,
    }
}

/// Registry of built-in decoders, created on first use
pub fn default_registry() -> &'static FormatRegistry {
    static REGISTRY: OnceLock<FormatRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FormatRegistry::new)
}

/// Extract a track with default settings (invalid points are kept)
pub fn extract(path: impl AsRef<Path>) -> Result<GpsTrack> {
    extract_with_config(path, &ExtractConfig::default())
}

/// Extract a track with the given settings
pub fn extract_with_config(path: impl AsRef<Path>, config: &ExtractConfig) -> Result<GpsTrack> {
    let path = path.as_ref();
    let format = detect_in(default_registry(), path, config)?;
    format.parse(path, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = extract("/nonexistent/FILE0001.MP4");
        assert!(matches!(result, Err(TelemetryError::FileNotFound(_))));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = TelemetryExtractor::new();
        let result = extractor.extract_file(dir.path(), &ExtractConfig::new());
        assert!(matches!(result, Err(TelemetryError::FileNotFound(_))));
    }

    #[test]
    fn test_default_registry_is_shared() {
        assert!(std::ptr::eq(default_registry(), default_registry()));
        assert!(default_registry().get("YOUQINGGPS").is_some());
    }

    #[test]
    fn test_not_an_mp4_is_container_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"these bytes are not an MP4 box tree at all").unwrap();

        let result = TelemetryExtractor::new().extract_file(&path, &ExtractConfig::new());
        assert!(matches!(result, Err(TelemetryError::ContainerFormat(_))));
    }

    #[test]
    fn test_mp4_without_telemetry_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.mp4");
        let mut bytes = 16u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"ftypisom\0\0\0\0");
        bytes.extend_from_slice(&8u32.to_be_bytes());
        bytes.extend_from_slice(b"mdat");
        std::fs::write(&path, &bytes).unwrap();

        let result = extract(&path);
        assert!(matches!(result, Err(TelemetryError::UnsupportedFormat(_))));
    }
}
