//! Extraction configuration
//!
//! This module defines the small set of knobs the extraction pipeline needs.
//! Everything presentation-related (output paths, batch handling) belongs to
//! the application layer.

use crate::container::ScanOptions;
use serde::{Deserialize, Serialize};

/// Default number of media bytes a detection probe may sweep (10 MiB)
pub const DEFAULT_PROBE_WINDOW: u64 = 10 * 1024 * 1024;

/// Default upper bound for a single candidate payload (16 MiB)
pub const DEFAULT_MAX_SPAN_LEN: u64 = 16 * 1024 * 1024;

/// Configuration for one extraction call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Drop points with no fix or out-of-range coordinates before assembly
    #[serde(default)]
    pub skip_invalid: bool,

    /// Sweep `mdat` payloads for telemetry boxes embedded between samples
    #[serde(default = "default_true")]
    pub deep_scan: bool,

    /// Media bytes a `can_parse` probe may sweep before giving up
    #[serde(default = "default_probe_window")]
    pub probe_window: u64,

    /// Candidate payloads larger than this are clamped
    #[serde(default = "default_max_span_len")]
    pub max_span_len: u64,
}

fn default_true() -> bool {
    true
}

fn default_probe_window() -> u64 {
    DEFAULT_PROBE_WINDOW
}

fn default_max_span_len() -> u64 {
    DEFAULT_MAX_SPAN_LEN
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            skip_invalid: false,
            deep_scan: true,
            probe_window: DEFAULT_PROBE_WINDOW,
            max_span_len: DEFAULT_MAX_SPAN_LEN,
        }
    }
}

impl ExtractConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable skip-invalid mode
    pub fn with_skip_invalid(mut self, enabled: bool) -> Self {
        self.skip_invalid = enabled;
        self
    }

    /// Builder method: enable or disable sweeping media data
    pub fn with_deep_scan(mut self, enabled: bool) -> Self {
        self.deep_scan = enabled;
        self
    }

    /// Builder method: set the detection probe window in bytes
    pub fn with_probe_window(mut self, bytes: u64) -> Self {
        self.probe_window = bytes;
        self
    }

    /// Builder method: set the maximum candidate payload length in bytes
    pub fn with_max_span_len(mut self, bytes: u64) -> Self {
        self.max_span_len = bytes;
        self
    }

    /// Scanner options for a full decode pass
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            deep_scan: self.deep_scan,
            deep_scan_limit: None,
        }
    }

    /// Scanner options for a cheap detection probe
    pub fn probe_options(&self) -> ScanOptions {
        ScanOptions {
            deep_scan: self.deep_scan,
            deep_scan_limit: Some(self.probe_window),
        }
    }
}
