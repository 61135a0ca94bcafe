//! Track assembly
//!
//! Turns a decoder's record stream into a [`GpsTrack`]: per-record errors are
//! counted and skipped, invalid points are optionally dropped, and the result
//! is stably sorted by timestamp (some vendors interleave sensor and GPS
//! sub-records out of order).

use crate::track::GpsTrack;
use crate::types::{keys, DeviceInfo, GpsPoint, Result, TelemetryError};
use std::path::Path;

/// Counters collected while assembling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub records_decoded: usize,
    pub corrupt_records: usize,
    pub truncated_streams: usize,
    pub invalid_points_skipped: usize,
    pub reordered: bool,
}

impl AssemblyStats {
    fn record_into(&self, device_info: &mut DeviceInfo) {
        device_info.insert(keys::RECORDS_DECODED.into(), self.records_decoded.into());
        device_info.insert(keys::CORRUPT_RECORDS.into(), self.corrupt_records.into());
        device_info.insert(keys::TRUNCATED_STREAMS.into(), self.truncated_streams.into());
        device_info.insert(
            keys::INVALID_POINTS_SKIPPED.into(),
            self.invalid_points_skipped.into(),
        );
    }
}

/// Assemble a track from decoded records
///
/// `CorruptRecord` and `TruncatedStream` items are recovered here and show up
/// as counters in the track's device info; any other error aborts assembly.
/// An empty record sequence gives an empty track, not an error.
pub fn assemble<I>(
    records: I,
    mut device_info: DeviceInfo,
    source_file: impl AsRef<Path>,
    skip_invalid: bool,
) -> Result<GpsTrack>
where
    I: IntoIterator<Item = Result<GpsPoint>>,
{
    let mut stats = AssemblyStats::default();
    let mut points = Vec::new();

    for record in records {
        match record {
            Ok(point) => {
                stats.records_decoded += 1;
                if skip_invalid && !point.is_valid() {
                    stats.invalid_points_skipped += 1;
                    continue;
                }
                points.push(point);
            }
            Err(TelemetryError::CorruptRecord { .. }) => stats.corrupt_records += 1,
            Err(TelemetryError::TruncatedStream { .. }) => stats.truncated_streams += 1,
            Err(e) => return Err(e),
        }
    }

    stats.reordered = sort_by_time(&mut points);
    if stats.reordered {
        log::debug!("Decoder output was out of order, sorted {} points", points.len());
    }

    stats.record_into(&mut device_info);
    let source_file = source_file.as_ref();
    log::info!(
        "Assembled {} points from {:?} ({} corrupt, {} truncated, {} invalid skipped)",
        points.len(),
        source_file,
        stats.corrupt_records,
        stats.truncated_streams,
        stats.invalid_points_skipped
    );

    Ok(GpsTrack::new(points, source_file.to_path_buf(), device_info))
}

/// Stable sort by timestamp; returns true if anything moved
fn sort_by_time(points: &mut [GpsPoint]) -> bool {
    let ordered = points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp);
    if !ordered {
        points.sort_by_key(|p| p.timestamp);
    }
    !ordered
}
