//! Decoded GPS track
//!
//! A `GpsTrack` is built once per extraction by the assembler and is
//! read-only afterwards. Derived values (`duration`, `bounds`) are computed
//! on demand.

use crate::export::{self, ExportFormat, KmlMode};
use crate::types::{Bounds, DeviceInfo, GpsPoint, Result, Timestamp};
use chrono::Duration;
use serde::Serialize;
use std::ops::Index;
use std::path::{Path, PathBuf};

/// Ordered GPS fixes from one source file plus device metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsTrack {
    points: Vec<GpsPoint>,
    source_file: PathBuf,
    device_info: DeviceInfo,
}

impl GpsTrack {
    /// Points must already be in timestamp order
    pub(crate) fn new(points: Vec<GpsPoint>, source_file: PathBuf, device_info: DeviceInfo) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        Self {
            points,
            source_file,
            device_info,
        }
    }

    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GpsPoint> {
        self.points.iter()
    }

    pub fn first(&self) -> Option<&GpsPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&GpsPoint> {
        self.points.last()
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.first().map(|p| p.timestamp)
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.last().map(|p| p.timestamp)
    }

    /// Time between the first and last fix (zero for fewer than two points)
    pub fn duration(&self) -> Duration {
        match (self.start_time(), self.end_time()) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::zero(),
        }
    }

    /// [`duration`](Self::duration) in fractional seconds
    pub fn duration_secs(&self) -> f64 {
        let duration = self.duration();
        duration.num_milliseconds() as f64 / 1000.0
    }

    /// Bounding box over all points, `None` for an empty track
    pub fn bounds(&self) -> Option<Bounds> {
        let (first, rest) = self.points.split_first()?;
        let mut bounds = Bounds::from_point(first.latitude, first.longitude);
        for point in rest {
            bounds.extend(point.latitude, point.longitude);
        }
        Some(bounds)
    }

    /// Name used in exported documents: the source file stem
    pub fn name(&self) -> String {
        self.source_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Dashcam Track".to_string())
    }

    /// Copy of this track holding only valid points
    pub fn filter_valid(&self) -> GpsTrack {
        GpsTrack {
            points: self.points.iter().filter(|p| p.is_valid()).cloned().collect(),
            source_file: self.source_file.clone(),
            device_info: self.device_info.clone(),
        }
    }

    /// Write the track in the given format
    pub fn export(&self, path: impl AsRef<Path>, format: ExportFormat) -> Result<()> {
        export::export_to_file(self, path.as_ref(), format)
    }

    pub fn to_gpx(&self, path: impl AsRef<Path>) -> Result<()> {
        self.export(path, ExportFormat::Gpx)
    }

    pub fn to_geojson(&self, path: impl AsRef<Path>) -> Result<()> {
        self.export(path, ExportFormat::GeoJson)
    }

    /// KML with a `gx:Track` carrying timestamps and speed
    pub fn to_kml(&self, path: impl AsRef<Path>) -> Result<()> {
        self.export(path, ExportFormat::Kml)
    }

    /// KML in the given mode
    pub fn to_kml_with(&self, path: impl AsRef<Path>, mode: KmlMode) -> Result<()> {
        export::write_output(path.as_ref(), &export::kml::render_with_mode(self, mode))
    }

    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        self.export(path, ExportFormat::Csv)
    }
}

impl Index<usize> for GpsTrack {
    type Output = GpsPoint;

    fn index(&self, index: usize) -> &GpsPoint {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a GpsTrack {
    type Item = &'a GpsPoint;
    type IntoIter = std::slice::Iter<'a, GpsPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
