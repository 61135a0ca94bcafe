//! Synthetic dashcam recordings for integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const RECORD_LEN: usize = 108;

/// One YOUQINGGPS record before encoding
#[derive(Debug, Clone)]
pub struct Record {
    /// NMEA DDMM.MMMM
    pub lat: f32,
    /// NMEA DDDMM.MMMM
    pub lon: f32,
    /// (year, month, day)
    pub date: (u32, u32, u32),
    /// (hour, minute, second)
    pub time: (u32, u32, u32),
    pub status: [u8; 3],
    pub speed: f32,
}

impl Record {
    /// Active fix near Woodbridge, VA at 2024-04-20 14:24:`second`
    pub fn at(second: u32) -> Self {
        Record {
            lat: 3840.7339,
            lon: 7716.2932,
            date: (24, 4, 20),
            time: (14, 24, second),
            status: *b"ANW",
            speed: 45.5,
        }
    }

    pub fn void(mut self) -> Self {
        self.status[0] = b'V';
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut record = vec![0u8; RECORD_LEN];
        let mut put = |offset: usize, bytes: [u8; 4]| record[offset..offset + 4].copy_from_slice(&bytes);
        put(4, (RECORD_LEN as u32).to_le_bytes());
        put(32, self.lat.to_le_bytes());
        put(36, self.lon.to_le_bytes());
        put(40, self.date.0.to_le_bytes());
        put(44, self.time.0.to_le_bytes());
        put(48, self.time.1.to_le_bytes());
        put(52, self.date.2.to_le_bytes());
        put(56, self.date.1.to_le_bytes());
        put(60, self.time.2.to_le_bytes());
        put(104, self.speed.to_le_bytes());
        record[..4].copy_from_slice(b"GPS ");
        record[8..18].copy_from_slice(b"YOUQINGGPS");
        record[64..67].copy_from_slice(&self.status);
        record
    }
}

pub fn encode_all(records: &[Record]) -> Vec<u8> {
    records.iter().flat_map(Record::encode).collect()
}

pub fn mp4_box(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(fourcc);
    out.extend_from_slice(payload);
    out
}

pub fn ftyp() -> Vec<u8> {
    mp4_box(b"ftyp", b"isom\x00\x00\x02\x00isomiso2avc1mp41")
}

/// Box-by-box MP4 file builder
#[derive(Default)]
pub struct Mp4Builder {
    bytes: Vec<u8>,
}

impl Mp4Builder {
    pub fn new() -> Self {
        Self { bytes: ftyp() }
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Top-level `free` box holding GPS records
    pub fn gps(self, payload: &[u8]) -> Self {
        let b = mp4_box(b"free", payload);
        self.raw(&b)
    }

    /// `moov/udta/free` holding GPS records
    pub fn moov_gps(self, payload: &[u8]) -> Self {
        let mvhd = mp4_box(b"mvhd", &[0u8; 100]);
        let udta = mp4_box(b"udta", &mp4_box(b"free", payload));
        let mut moov = mvhd;
        moov.extend(udta);
        let b = mp4_box(b"moov", &moov);
        self.raw(&b)
    }

    /// `mdat` with each GPS payload embedded as a `free` box between fake samples
    pub fn mdat_with_gps(self, payloads: &[Vec<u8>]) -> Self {
        let mut media = vec![0x11u8; 4096];
        for payload in payloads {
            media.extend(mp4_box(b"free", payload));
            media.extend(vec![0x22u8; 2048]);
        }
        let b = mp4_box(b"mdat", &media);
        self.raw(&b)
    }

    pub fn mdat(self, len: usize) -> Self {
        let b = mp4_box(b"mdat", &vec![0x33u8; len]);
        self.raw(&b)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes).unwrap();
        path
    }
}

/// Seconds 0..n as consecutive records
pub fn records(n: u32) -> Vec<Record> {
    (0..n).map(Record::at).collect()
}
