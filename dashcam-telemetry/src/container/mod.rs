//! MP4 container scanner
//!
//! Walks the ISO-BMFF box tree and reports byte spans that plausibly hold
//! vendor telemetry, without parsing media boxes it does not care about.
//!
//! - Container boxes (`moov`, `udta`, `trak`, ...) are descended into
//! - Leaf boxes are matched against the registered vendor signatures
//! - `mdat` payloads are optionally swept for telemetry boxes that dashcams
//!   interleave with the media samples
//!
//! The scanner is an iterator and reads one header at a time, so memory use
//! does not grow with file size. Malformed boxes after the first one are
//! skipped or clamped and recorded as warnings; a file whose first box cannot
//! be read as a box at all is rejected with `ContainerFormat`.

pub mod header;

pub use header::{BoxHeader, BoxSize, FourCc};

use crate::types::{Result, TelemetryError};
use byteorder::{BigEndian, ReadBytesExt};
use header::MDAT;
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Bytes read per step when sweeping media data
const SWEEP_CHUNK: usize = 1024 * 1024;

/// Vendor telemetry box signature: a box type plus the payload's leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub fourcc: FourCc,
    pub magic: &'static [u8],
}

impl Signature {
    pub const fn new(fourcc: FourCc, magic: &'static [u8]) -> Self {
        Self { fourcc, magic }
    }

    /// Check a box type and payload prefix against this signature
    pub fn matches(&self, fourcc: FourCc, payload_prefix: &[u8]) -> bool {
        fourcc == self.fourcc && payload_prefix.starts_with(self.magic)
    }

    /// Byte pattern of the box type followed by the magic, as it appears in a raw stream
    fn needle(&self) -> Vec<u8> {
        let mut needle = self.fourcc.as_bytes().to_vec();
        needle.extend_from_slice(self.magic);
        needle
    }
}

/// A byte range suspected to hold vendor telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateSpan {
    /// Absolute offset of the box header
    pub offset: u64,
    pub fourcc: FourCc,
    pub header_len: u64,
    /// Box length in bytes, header included, after clamping
    pub len: u64,
    /// The declared size ran past its container and was cut short
    pub clamped: bool,
    /// Found by sweeping media data rather than by walking the box tree
    pub embedded: bool,
}

impl CandidateSpan {
    pub fn payload_offset(&self) -> u64 {
        self.offset + self.header_len
    }

    pub fn payload_len(&self) -> u64 {
        self.len.saturating_sub(self.header_len)
    }
}

/// Scanner behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Sweep `mdat` payloads for embedded telemetry boxes
    pub deep_scan: bool,
    /// Stop sweeping after this many media bytes (None = whole file)
    pub deep_scan_limit: Option<u64>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            deep_scan: true,
            deep_scan_limit: None,
        }
    }
}

/// A malformed but skippable structure encountered while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub offset: u64,
    pub message: String,
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}: {}", self.offset, self.message)
    }
}

/// Lazy iterator over candidate telemetry spans, in file order
pub struct Mp4Scanner<R> {
    reader: R,
    file_len: u64,
    signatures: Vec<Signature>,
    options: ScanOptions,
    /// End offsets of the containers currently being walked
    parents: Vec<u64>,
    pos: u64,
    boxes_seen: usize,
    swept: u64,
    pending: VecDeque<CandidateSpan>,
    warnings: Vec<ScanWarning>,
    finished: bool,
}

impl Mp4Scanner<BufReader<File>> {
    /// Open a file for scanning
    pub fn open(path: &Path, signatures: Vec<Signature>, options: ScanOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), signatures, options)
    }
}

impl<R: Read + Seek> Mp4Scanner<R> {
    /// Create a scanner over any seekable byte source
    pub fn new(mut reader: R, signatures: Vec<Signature>, options: ScanOptions) -> Result<Self> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        if file_len < 8 {
            return Err(TelemetryError::ContainerFormat(format!(
                "file is {} bytes, too short for a box header",
                file_len
            )));
        }

        Ok(Self {
            reader,
            file_len,
            signatures,
            options,
            parents: Vec::new(),
            pos: 0,
            boxes_seen: 0,
            swept: 0,
            pending: VecDeque::new(),
            warnings: Vec::new(),
            finished: false,
        })
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Warnings recorded so far
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Read a span's payload, at most `max_len` bytes
    pub fn read_payload(&mut self, span: &CandidateSpan, max_len: u64) -> Result<Vec<u8>> {
        let len = span.payload_len().min(max_len);
        if len < span.payload_len() {
            log::warn!(
                "Candidate '{}' at offset {} is {} bytes, reading first {}",
                span.fourcc,
                span.offset,
                span.payload_len(),
                len
            );
        }

        self.reader.seek(SeekFrom::Start(span.payload_offset()))?;
        let mut payload = vec![0u8; len as usize];
        self.reader.read_exact(&mut payload)?;
        Ok(payload)
    }

    fn limit(&self) -> u64 {
        self.parents.last().copied().unwrap_or(self.file_len)
    }

    fn at_first_box(&self) -> bool {
        self.boxes_seen == 0 && self.parents.is_empty()
    }

    /// The first top-level box decides whether this is a box structure at all;
    /// problems after that are recorded and scanning continues.
    fn reject_or_warn(&mut self, offset: u64, message: String) -> Result<()> {
        if self.at_first_box() {
            return Err(TelemetryError::ContainerFormat(message));
        }
        log::warn!("Skipping malformed box at offset {}: {}", offset, message);
        self.warnings.push(ScanWarning { offset, message });
        Ok(())
    }

    /// Process one box header (or close one container)
    fn step(&mut self) -> Result<()> {
        let limit = self.limit();

        if self.pos >= limit {
            match self.parents.pop() {
                Some(end) => self.pos = end,
                None => self.finished = true,
            }
            return Ok(());
        }

        let offset = self.pos;
        let remaining = limit - offset;
        if remaining < 8 {
            self.reject_or_warn(offset, format!("{} trailing bytes cannot hold a box header", remaining))?;
            self.pos = limit;
            return Ok(());
        }

        self.reader.seek(SeekFrom::Start(offset))?;
        let header = match BoxHeader::parse(&mut self.reader, offset) {
            Ok(header) => header,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.reject_or_warn(offset, "box header runs past the end of the file".to_string())?;
                self.pos = limit;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if !header.fourcc.is_box_type() {
            self.reject_or_warn(offset, format!("invalid box type '{}'", header.fourcc))?;
            self.pos = limit;
            return Ok(());
        }

        let declared = match header.size {
            BoxSize::ToEnd => remaining,
            BoxSize::Exact(n) => n,
        };

        if header.header_len > remaining || declared < header.header_len {
            self.reject_or_warn(
                offset,
                format!("box '{}' declares {} bytes, less than its header", header.fourcc, declared),
            )?;
            self.pos = limit;
            return Ok(());
        }

        let mut clamped = false;
        let mut box_len = declared;
        if declared > remaining {
            if self.at_first_box() {
                return Err(TelemetryError::ContainerFormat(format!(
                    "box '{}' declares {} bytes but the file has {}",
                    header.fourcc, declared, remaining
                )));
            }
            self.reject_or_warn(
                offset,
                format!(
                    "box '{}' declares {} bytes but only {} remain, clamping",
                    header.fourcc, declared, remaining
                ),
            )?;
            box_len = remaining;
            clamped = true;
        }

        let end = offset + box_len;
        self.boxes_seen += 1;
        log::trace!("Box '{}' at offset {} ({} bytes)", header.fourcc, offset, box_len);

        if header.is_container() {
            self.parents.push(end);
            self.pos = header.payload_offset();
            return Ok(());
        }

        if header.fourcc == MDAT {
            if self.options.deep_scan {
                self.sweep(header.payload_offset(), end)?;
            }
        } else {
            self.check_leaf(&header, box_len, clamped)?;
        }

        self.pos = end;
        Ok(())
    }

    /// Match a leaf box against the signatures
    fn check_leaf(&mut self, header: &BoxHeader, box_len: u64, clamped: bool) -> Result<()> {
        let max_magic = self.signatures.iter().map(|s| s.magic.len()).max().unwrap_or(0);
        let payload_len = box_len - header.header_len;
        let probe_len = (max_magic as u64).min(payload_len) as usize;

        // The reader sits at the payload after parsing the header
        let mut prefix = vec![0u8; probe_len];
        self.reader.read_exact(&mut prefix)?;

        if self.signatures.iter().any(|s| s.matches(header.fourcc, &prefix)) {
            log::debug!("Candidate '{}' box at offset {} ({} bytes)", header.fourcc, header.offset, box_len);
            self.pending.push_back(CandidateSpan {
                offset: header.offset,
                fourcc: header.fourcc,
                header_len: header.header_len,
                len: box_len,
                clamped,
                embedded: false,
            });
        }
        Ok(())
    }

    /// Sweep media data in `[start, end)` for embedded signature boxes
    fn sweep(&mut self, start: u64, end: u64) -> Result<()> {
        let budget = match self.options.deep_scan_limit {
            Some(limit) => limit.saturating_sub(self.swept),
            None => u64::MAX,
        };
        if budget == 0 || self.signatures.is_empty() {
            return Ok(());
        }

        let sweep_end = end.min(start.saturating_add(budget));
        let needles: Vec<(Signature, Vec<u8>)> =
            self.signatures.iter().map(|s| (*s, s.needle())).collect();
        let overlap = needles.iter().map(|(_, n)| n.len()).max().unwrap_or(1) - 1;

        let mut hits: Vec<(u64, Signature)> = Vec::new();
        let mut buf = vec![0u8; SWEEP_CHUNK];
        let mut chunk_start = start;

        while chunk_start < sweep_end {
            let want = (sweep_end - chunk_start).min(SWEEP_CHUNK as u64) as usize;
            self.reader.seek(SeekFrom::Start(chunk_start))?;
            self.reader.read_exact(&mut buf[..want])?;

            for (signature, needle) in &needles {
                for index in find_all(&buf[..want], needle) {
                    hits.push((chunk_start + index as u64, *signature));
                }
            }

            if chunk_start + want as u64 >= sweep_end {
                break;
            }
            chunk_start += (want - overlap) as u64;
        }

        self.swept += sweep_end - start;
        hits.sort_by_key(|(pos, _)| *pos);
        hits.dedup_by_key(|(pos, _)| *pos);

        let mut next_free = start;
        for (type_pos, signature) in hits {
            // The size field sits just before the box type
            let Some(box_start) = type_pos.checked_sub(4) else { continue };
            if box_start < next_free {
                continue;
            }

            self.reader.seek(SeekFrom::Start(box_start))?;
            let declared = self.reader.read_u32::<BigEndian>()? as u64;
            let min_len = 8 + signature.magic.len() as u64;
            if declared < min_len {
                self.warnings.push(ScanWarning {
                    offset: box_start,
                    message: format!("embedded '{}' box declares {} bytes", signature.fourcc, declared),
                });
                continue;
            }

            let available = end - box_start;
            let clamped = declared > available;
            let len = declared.min(available);
            if clamped {
                self.warnings.push(ScanWarning {
                    offset: box_start,
                    message: format!(
                        "embedded '{}' box declares {} bytes but only {} remain, clamping",
                        signature.fourcc, declared, available
                    ),
                });
            }

            log::debug!("Embedded '{}' box at offset {} ({} bytes)", signature.fourcc, box_start, len);
            self.pending.push_back(CandidateSpan {
                offset: box_start,
                fourcc: signature.fourcc,
                header_len: 8,
                len,
                clamped,
                embedded: true,
            });
            next_free = box_start + len;
        }

        Ok(())
    }
}

impl<R: Read + Seek> Iterator for Mp4Scanner<R> {
    type Item = Result<CandidateSpan>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(span) = self.pending.pop_front() {
                return Some(Ok(span));
            }
            if self.finished {
                return None;
            }
            if let Err(e) = self.step() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}

/// Walk a file's box tree without matching anything
///
/// Fails with `ContainerFormat` if the file does not start with a box.
pub fn check_structure(path: &Path) -> Result<()> {
    let options = ScanOptions {
        deep_scan: false,
        deep_scan_limit: None,
    };
    for span in Mp4Scanner::open(path, Vec::new(), options)? {
        span?;
    }
    Ok(())
}

/// Offsets of every occurrence of `needle` in `haystack`
fn find_all<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(move |(_, window)| *window == needle)
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const GPS: Signature = Signature::new(header::FREE, b"GPS ");

    fn mp4_box(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(fourcc);
        out.extend_from_slice(payload);
        out
    }

    fn gps_payload() -> Vec<u8> {
        let mut payload = b"GPS ".to_vec();
        payload.resize(40, 0xAB);
        payload
    }

    fn scan(bytes: Vec<u8>, options: ScanOptions) -> Mp4Scanner<Cursor<Vec<u8>>> {
        Mp4Scanner::new(Cursor::new(bytes), vec![GPS], options).unwrap()
    }

    fn spans(scanner: &mut Mp4Scanner<Cursor<Vec<u8>>>) -> Vec<CandidateSpan> {
        scanner.by_ref().collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_top_level_candidate() {
        let mut file = mp4_box(b"ftyp", b"isom\0\0\0\0");
        let gps_offset = file.len() as u64;
        file.extend(mp4_box(b"free", &gps_payload()));
        file.extend(mp4_box(b"mdat", &[0u8; 64]));

        let mut scanner = scan(file, ScanOptions::default());
        let found = spans(&mut scanner);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].offset, gps_offset);
        assert_eq!(found[0].payload_len(), 40);
        assert!(!found[0].embedded);
        assert!(scanner.warnings().is_empty());
    }

    #[test]
    fn test_recurses_into_containers() {
        let udta = mp4_box(b"udta", &mp4_box(b"free", &gps_payload()));
        let mut moov_payload = mp4_box(b"mvhd", &[0u8; 20]);
        moov_payload.extend(udta);
        let mut file = mp4_box(b"ftyp", b"isom");
        file.extend(mp4_box(b"moov", &moov_payload));

        let mut scanner = scan(file, ScanOptions::default());
        assert_eq!(spans(&mut scanner).len(), 1);
    }

    #[test]
    fn test_quicktime_metadata_boxes_do_not_hide_siblings() {
        let mut udta_payload = mp4_box(&[0xA9, b't', b'o', b'o'], b"\0\x0c\0\0Lavf60.3.100");
        udta_payload.extend(mp4_box(&[0xA9, b'n', b'a', b'm'], b"clip"));
        udta_payload.extend(mp4_box(b"free", &gps_payload()));
        let mut file = mp4_box(b"ftyp", b"isom");
        file.extend(mp4_box(b"moov", &mp4_box(b"udta", &udta_payload)));

        let mut scanner = scan(file, ScanOptions::default());
        let found = spans(&mut scanner);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].payload_len(), 40);
        assert!(scanner.warnings().is_empty());
    }

    #[test]
    fn test_unsigned_free_box_ignored() {
        let mut file = mp4_box(b"ftyp", b"isom");
        file.extend(mp4_box(b"free", &[0u8; 32]));
        let mut scanner = scan(file, ScanOptions::default());
        assert!(spans(&mut scanner).is_empty());
    }

    #[test]
    fn test_deep_scan_finds_embedded_boxes() {
        let mut media = vec![0x11u8; 100];
        media.extend(mp4_box(b"free", &gps_payload()));
        media.extend(vec![0x22u8; 50]);
        media.extend(mp4_box(b"free", &gps_payload()));
        let mut file = mp4_box(b"ftyp", b"isom");
        let mdat_offset = file.len() as u64;
        file.extend(mp4_box(b"mdat", &media));

        let mut scanner = scan(file.clone(), ScanOptions::default());
        let found = spans(&mut scanner);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|s| s.embedded));
        assert_eq!(found[0].offset, mdat_offset + 8 + 100);
        assert_eq!(found[1].offset, mdat_offset + 8 + 100 + 48 + 50);

        let disabled = ScanOptions { deep_scan: false, deep_scan_limit: None };
        let mut scanner = scan(file, disabled);
        assert!(spans(&mut scanner).is_empty());
    }

    #[test]
    fn test_deep_scan_limit() {
        let mut media = vec![0u8; 4096];
        media.extend(mp4_box(b"free", &gps_payload()));
        let mut file = mp4_box(b"ftyp", b"isom");
        file.extend(mp4_box(b"mdat", &media));

        let limited = ScanOptions { deep_scan: true, deep_scan_limit: Some(1024) };
        let mut scanner = scan(file, limited);
        assert!(spans(&mut scanner).is_empty());
    }

    #[test]
    fn test_not_a_box_structure() {
        let text = b"this is plainly a text file and not an mp4".to_vec();
        let mut scanner = scan(text, ScanOptions::default());
        let first = scanner.next().unwrap();
        assert!(matches!(first, Err(TelemetryError::ContainerFormat(_))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_too_short_file() {
        let result = Mp4Scanner::new(Cursor::new(vec![0u8; 3]), vec![GPS], ScanOptions::default());
        assert!(matches!(result, Err(TelemetryError::ContainerFormat(_))));
    }

    #[test]
    fn test_later_overflow_is_clamped() {
        let mut file = mp4_box(b"ftyp", b"isom");
        let gps_offset = file.len() as u64;
        let mut gps = mp4_box(b"free", &gps_payload());
        // Claim 1000 bytes; the file ends after 48
        gps[..4].copy_from_slice(&1000u32.to_be_bytes());
        file.extend(gps);

        let mut scanner = scan(file, ScanOptions::default());
        let found = spans(&mut scanner);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].offset, gps_offset);
        assert!(found[0].clamped);
        assert_eq!(found[0].payload_len(), 40);
        assert_eq!(scanner.warnings().len(), 1);
    }

    #[test]
    fn test_garbage_after_first_box_is_skipped() {
        let mut file = mp4_box(b"ftyp", b"isom");
        file.extend([0u8, 0, 0, 16, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);

        let mut scanner = scan(file, ScanOptions::default());
        assert!(spans(&mut scanner).is_empty());
        assert_eq!(scanner.warnings().len(), 1);
    }

    #[test]
    fn test_large_size_header() {
        let mut file = mp4_box(b"ftyp", b"isom");
        let payload = gps_payload();
        file.extend(1u32.to_be_bytes());
        file.extend(b"free");
        file.extend(((payload.len() + 16) as u64).to_be_bytes());
        file.extend(&payload);

        let mut scanner = scan(file, ScanOptions::default());
        let found = spans(&mut scanner);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].header_len, 16);
        assert_eq!(found[0].payload_len(), 40);
    }

    #[test]
    fn test_read_payload() {
        let mut file = mp4_box(b"ftyp", b"isom");
        file.extend(mp4_box(b"free", &gps_payload()));
        let mut scanner = scan(file, ScanOptions::default());
        let span = scanner.next().unwrap().unwrap();

        let payload = scanner.read_payload(&span, u64::MAX).unwrap();
        assert_eq!(payload, gps_payload());
        let head = scanner.read_payload(&span, 4).unwrap();
        assert_eq!(head, b"GPS ");
    }
}
