//! YOUQINGGPS telemetry decoder
//!
//! Used by many dashcams built on the YOUQING chipset (REDTIGER, WolfBox and
//! various OEM brands). GPS fixes are stored unencrypted in `free` boxes,
//! either at the top level of the file or interleaved inside `mdat`.
//!
//! ## Record layout (v1)
//!
//! Offsets are relative to the box payload (just after the `free` header).
//! All multi-byte fields are little-endian.
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | `GPS ` marker |
//! | 4 | 4 | payload size (u32, unused) |
//! | 8 | 10 | `YOUQINGGPS` brand |
//! | 32 | 4 | latitude, NMEA `DDMM.MMMM` (f32) |
//! | 36 | 4 | longitude, NMEA `DDDMM.MMMM` (f32) |
//! | 40 | 4 | year, 2-digit values are offset from 2000 (u32) |
//! | 44 | 4 | hour (u32, some devices report 24+) |
//! | 48 | 4 | minute (u32) |
//! | 52 | 4 | day (u32) |
//! | 56 | 4 | month (u32) |
//! | 60 | 4 | second (u32) |
//! | 64 | 3 | status: `A`/`V`, `N`/`S`, `E`/`W` (ASCII) |
//! | 104 | 4 | speed in km/h (f32) |
//!
//! Records repeat back to back at `record_len` strides. A slot that does not
//! start with the marker and brand ends the stream for that payload.

use crate::assembler::assemble;
use crate::config::ExtractConfig;
use crate::container::header::FREE;
use crate::container::{Mp4Scanner, Signature};
use crate::formats::nmea::nmea_to_decimal;
use crate::formats::TelemetryFormat;
use crate::track::GpsTrack;
use crate::types::{keys, DeviceInfo, FixQuality, GpsPoint, Result, TelemetryError};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{TimeZone, Utc};
use std::path::Path;

/// Box signature shared by every YOUQING variant
pub const SIGNATURE: Signature = Signature::new(FREE, b"GPS ");

/// Candidates examined by a detection probe before giving up
const MAX_PROBE_CANDIDATES: usize = 8;

/// Speeds at or above this are treated as sensor glitches
const MAX_PLAUSIBLE_SPEED_KMH: f64 = 500.0;

/// Byte offsets of one record variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub version: &'static str,
    pub record_len: usize,
    pub marker: &'static [u8],
    pub brand_offset: usize,
    pub brand: &'static [u8],
    pub latitude: usize,
    pub longitude: usize,
    pub year: usize,
    pub hour: usize,
    pub minute: usize,
    pub day: usize,
    pub month: usize,
    pub second: usize,
    pub status: usize,
    pub speed: usize,
}

/// Layout observed in REDTIGER/WolfBox captures
pub const YOUQING_V1: RecordLayout = RecordLayout {
    version: "v1",
    record_len: 108,
    marker: b"GPS ",
    brand_offset: 8,
    brand: b"YOUQINGGPS",
    latitude: 32,
    longitude: 36,
    year: 40,
    hour: 44,
    minute: 48,
    day: 52,
    month: 56,
    second: 60,
    status: 64,
    speed: 104,
};

impl RecordLayout {
    /// Bytes needed to check the marker and brand
    pub fn header_len(&self) -> usize {
        self.brand_offset + self.brand.len()
    }

    /// True if the bytes start with this layout's marker and brand
    pub fn is_framed(&self, bytes: &[u8]) -> bool {
        bytes.len() >= self.header_len()
            && bytes.starts_with(self.marker)
            && &bytes[self.brand_offset..self.header_len()] == self.brand
    }

    fn read_u32(&self, record: &[u8], offset: usize) -> u32 {
        LittleEndian::read_u32(&record[offset..offset + 4])
    }

    fn read_f32(&self, record: &[u8], offset: usize) -> f64 {
        LittleEndian::read_f32(&record[offset..offset + 4]) as f64
    }

    /// Decode one framed record of exactly `record_len` bytes
    ///
    /// Structurally sound records with no fix or odd coordinates are still
    /// returned; validity is decided during assembly.
    pub fn decode(&self, record: &[u8]) -> std::result::Result<GpsPoint, String> {
        let lat_raw = self.read_f32(record, self.latitude);
        let lon_raw = self.read_f32(record, self.longitude);
        if !lat_raw.is_finite() || !lon_raw.is_finite() {
            return Err(format!("non-finite coordinate ({}, {})", lat_raw, lon_raw));
        }
        check_minutes(lat_raw)?;
        check_minutes(lon_raw)?;

        let status = &record[self.status..self.status + 3];
        let active = status[0] == b'A';

        let mut latitude = nmea_to_decimal(lat_raw);
        if status[1] == b'S' {
            latitude = -latitude;
        }
        let mut longitude = nmea_to_decimal(lon_raw);
        if status[2] == b'W' {
            longitude = -longitude;
        }

        let year = self.read_u32(record, self.year);
        let year = if year < 100 { 2000 + year } else { year };
        if year > 9999 {
            return Err(format!("implausible year {}", year));
        }
        let month = self.read_u32(record, self.month);
        let day = self.read_u32(record, self.day);
        let hour = self.read_u32(record, self.hour) % 24;
        let minute = self.read_u32(record, self.minute);
        let second = self.read_u32(record, self.second);

        let timestamp = Utc
            .with_ymd_and_hms(year as i32, month, day, hour, minute, second)
            .single()
            .ok_or_else(|| {
                format!(
                    "invalid date/time {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                )
            })?;

        let fix_quality = if lat_raw == 0.0 || lon_raw == 0.0 {
            FixQuality::Invalid
        } else if active {
            FixQuality::Gps
        } else {
            FixQuality::Invalid
        };

        let raw_speed = self.read_f32(record, self.speed);
        let speed = if raw_speed.is_finite() && (0.0..MAX_PLAUSIBLE_SPEED_KMH).contains(&raw_speed) {
            raw_speed
        } else {
            0.0
        };

        Ok(GpsPoint::new(latitude, longitude, timestamp)
            .with_speed(speed)
            .with_fix_quality(fix_quality))
    }
}

/// The minutes part of a packed NMEA value must be below 60
fn check_minutes(raw: f64) -> std::result::Result<(), String> {
    let magnitude = raw.abs();
    let minutes = magnitude - (magnitude / 100.0).trunc() * 100.0;
    if minutes >= 60.0 {
        return Err(format!("NMEA value {} has {} minutes", raw, minutes));
    }
    Ok(())
}

/// Lazy, restartable sequence of records in one candidate payload
///
/// Yields `CorruptRecord` for a framed record that does not decode and keeps
/// going; yields `TruncatedStream` once for a partial final record and stops.
pub struct YouqingRecords<'a> {
    payload: &'a [u8],
    base_offset: u64,
    layout: RecordLayout,
    pos: usize,
    done: bool,
}

impl<'a> YouqingRecords<'a> {
    /// `base_offset` is the absolute file offset of `payload[0]`, used in errors
    pub fn new(payload: &'a [u8], base_offset: u64, layout: RecordLayout) -> Self {
        Self {
            payload,
            base_offset,
            layout,
            pos: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for YouqingRecords<'a> {
    type Item = Result<GpsPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.payload.len() {
            return None;
        }

        let rest = &self.payload[self.pos..];
        let offset = self.base_offset + self.pos as u64;
        let record_len = self.layout.record_len;

        if rest.len() < record_len {
            self.done = true;
            let probe = rest.len().min(self.layout.marker.len());
            if rest[..probe] == self.layout.marker[..probe] {
                log::warn!(
                    "Record at offset {} truncated: {} of {} bytes",
                    offset,
                    rest.len(),
                    record_len
                );
                return Some(Err(TelemetryError::TruncatedStream {
                    offset,
                    needed: record_len,
                    available: rest.len(),
                }));
            }
            return None;
        }

        let record = &rest[..record_len];
        self.pos += record_len;

        if !self.layout.is_framed(record) {
            self.done = true;
            if record.iter().any(|&b| b != 0) {
                log::debug!("Unframed bytes at offset {}, ending record stream", offset);
            }
            return None;
        }

        match self.layout.decode(record) {
            Ok(point) => {
                log::trace!(
                    "Record at offset {}: {:.6}, {:.6} @ {}",
                    offset,
                    point.latitude,
                    point.longitude,
                    point.timestamp
                );
                Some(Ok(point))
            }
            Err(reason) => {
                log::warn!("Corrupt record at offset {}: {}", offset, reason);
                Some(Err(TelemetryError::CorruptRecord { offset, reason }))
            }
        }
    }
}

/// Decoder for the YOUQINGGPS family
pub struct YouqingFormat {
    layout: RecordLayout,
}

impl YouqingFormat {
    pub fn new() -> Self {
        Self::with_layout(YOUQING_V1)
    }

    /// Decoder for a different layout variant of the same family
    pub fn with_layout(layout: RecordLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Records in one payload, see [`YouqingRecords`]
    pub fn records<'a>(&self, payload: &'a [u8], base_offset: u64) -> YouqingRecords<'a> {
        YouqingRecords::new(payload, base_offset, self.layout)
    }

    fn probe(&self, path: &Path, config: &ExtractConfig) -> Result<bool> {
        let mut scanner = Mp4Scanner::open(path, vec![SIGNATURE], config.probe_options())?;
        let mut examined = 0;

        while let Some(span) = scanner.next() {
            let span = span?;
            let head = scanner.read_payload(&span, self.layout.header_len() as u64)?;
            if self.layout.is_framed(&head) {
                return Ok(true);
            }
            examined += 1;
            if examined >= MAX_PROBE_CANDIDATES {
                break;
            }
        }
        Ok(false)
    }
}

impl Default for YouqingFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryFormat for YouqingFormat {
    fn name(&self) -> &'static str {
        "YOUQINGGPS"
    }

    fn formats(&self) -> &'static [&'static str] {
        &["YOUQINGGPS", "REDTIGER", "WolfBox"]
    }

    fn can_parse(&self, path: &Path, config: &ExtractConfig) -> bool {
        match self.probe(path, config) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("{} probe rejected {:?}: {}", self.name(), path, e);
                false
            }
        }
    }

    fn parse(&self, path: &Path, config: &ExtractConfig) -> Result<GpsTrack> {
        log::info!("Parsing {} telemetry: {:?}", self.name(), path);

        let mut scanner = Mp4Scanner::open(path, vec![SIGNATURE], config.scan_options())?;
        let mut payloads = Vec::new();
        while let Some(span) = scanner.next() {
            let span = span?;
            let payload = scanner.read_payload(&span, config.max_span_len)?;
            payloads.push((span, payload));
        }

        let mut device_info = DeviceInfo::new();
        device_info.insert(keys::VENDOR.into(), "YOUQING".into());
        device_info.insert(keys::FORMAT.into(), self.name().into());
        device_info.insert("layout".into(), self.layout.version.into());
        device_info.insert(keys::CANDIDATE_SPANS.into(), payloads.len().into());
        device_info.insert(keys::SKIPPED_BOXES.into(), scanner.warnings().len().into());

        let records = payloads
            .iter()
            .flat_map(|(span, payload)| self.records(payload, span.payload_offset()));

        assemble(records, device_info, path, config.skip_invalid)
    }
}
