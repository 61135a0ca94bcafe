//! ISO-BMFF box header parsing
//!
//! Every box starts with a 32-bit big-endian size and a four-character type.
//! A size of 1 means a 64-bit size follows the type; a size of 0 means the box
//! runs to the end of its enclosing container.

use byteorder::{BigEndian, ReadBytesExt};
use std::fmt;
use std::io::Read;

/// Four-character box type code
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Real box types are printable ASCII, except QuickTime metadata types
    /// which open with `©` (0xA9). Anything else means we are not looking at
    /// a box header.
    pub fn is_box_type(&self) -> bool {
        let printable = |b: &u8| (0x20..=0x7E).contains(b);
        (printable(&self.0[0]) || self.0[0] == 0xA9) && self.0[1..].iter().all(printable)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (0x20..=0x7E).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({})", self)
    }
}

pub const FTYP: FourCc = FourCc::new(b"ftyp");
pub const MOOV: FourCc = FourCc::new(b"moov");
pub const TRAK: FourCc = FourCc::new(b"trak");
pub const MDIA: FourCc = FourCc::new(b"mdia");
pub const MINF: FourCc = FourCc::new(b"minf");
pub const STBL: FourCc = FourCc::new(b"stbl");
pub const UDTA: FourCc = FourCc::new(b"udta");
pub const EDTS: FourCc = FourCc::new(b"edts");
pub const DINF: FourCc = FourCc::new(b"dinf");
pub const MVEX: FourCc = FourCc::new(b"mvex");
pub const MOOF: FourCc = FourCc::new(b"moof");
pub const TRAF: FourCc = FourCc::new(b"traf");
pub const MFRA: FourCc = FourCc::new(b"mfra");
pub const MDAT: FourCc = FourCc::new(b"mdat");
pub const FREE: FourCc = FourCc::new(b"free");
pub const SKIP: FourCc = FourCc::new(b"skip");

/// Box types whose payload is a sequence of child boxes
pub const CONTAINER_BOXES: &[FourCc] = &[
    MOOV, TRAK, MDIA, MINF, STBL, UDTA, EDTS, DINF, MVEX, MOOF, TRAF, MFRA,
];

/// Declared box size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxSize {
    /// Size field was 0: the box extends to the end of its container
    ToEnd,
    /// Total box length in bytes, header included
    Exact(u64),
}

/// Parsed box header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// Absolute file offset of the size field
    pub offset: u64,
    pub fourcc: FourCc,
    /// 8, or 16 for the 64-bit size variant
    pub header_len: u64,
    pub size: BoxSize,
}

impl BoxHeader {
    /// Parse a box header from a reader positioned at `offset`
    pub fn parse<R: Read>(reader: &mut R, offset: u64) -> std::io::Result<Self> {
        let size = reader.read_u32::<BigEndian>()?;
        let mut code = [0u8; 4];
        reader.read_exact(&mut code)?;

        let (size, header_len) = match size {
            0 => (BoxSize::ToEnd, 8),
            1 => (BoxSize::Exact(reader.read_u64::<BigEndian>()?), 16),
            n => (BoxSize::Exact(n as u64), 8),
        };

        Ok(BoxHeader {
            offset,
            fourcc: FourCc(code),
            header_len,
            size,
        })
    }

    pub fn payload_offset(&self) -> u64 {
        self.offset + self.header_len
    }

    pub fn is_container(&self) -> bool {
        CONTAINER_BOXES.contains(&self.fourcc)
    }
}
