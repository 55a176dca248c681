//! File header and wire primitives for the guide format (version 2)
//!
//! ```text
//! "GDE"               3 bytes
//! version             u32 = 2
//! attr_count          u32
//!   { id u32, len u32, value[len] } * attr_count
//! ```
//!
//! All integers are little-endian.

use crate::core::error::{GuideError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SIGNATURE: [u8; 3] = *b"GDE";
pub const FORMAT_VERSION: u32 = 2;

/// Smallest file the loader will look at (a node-less format 1 file)
pub const MIN_FILE_SIZE: usize = 20;

/// Document attribute: uid counter
pub const ATTR_COUNTER: u32 = 1;
/// Document attribute: selected node reference
pub const ATTR_SELECTED: u32 = 2;

/// Pointer width of the machine that wrote a file
///
/// The on-disk node and parent references are as wide as a pointer on the
/// writing machine, and nothing in the file records which width was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ArchBits {
    Bits32,
    #[default]
    Bits64,
}

impl ArchBits {
    /// Width in bytes of one node reference
    pub fn ref_size(self) -> usize {
        match self {
            ArchBits::Bits32 => 4,
            ArchBits::Bits64 => 8,
        }
    }
}

impl TryFrom<u32> for ArchBits {
    type Error = String;

    fn try_from(bits: u32) -> std::result::Result<Self, Self::Error> {
        match bits {
            32 => Ok(ArchBits::Bits32),
            64 => Ok(ArchBits::Bits64),
            other => Err(format!("unsupported pointer width {other} (expected 32 or 64)")),
        }
    }
}

impl From<ArchBits> for u32 {
    fn from(arch: ArchBits) -> u32 {
        match arch {
            ArchBits::Bits32 => 32,
            ArchBits::Bits64 => 64,
        }
    }
}

impl FromStr for ArchBits {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bits: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid pointer width '{s}' (expected 32 or 64)"))?;
        ArchBits::try_from(bits)
    }
}

impl fmt::Display for ArchBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u32::from(*self))
    }
}

/// Parsed document header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Format version (always 2 once validated)
    pub version: u32,

    /// Persisted uid counter
    pub counter: u32,

    /// Reference to the selected node, 0 when nothing is selected
    pub selected_ref: u64,

    /// Number of bytes the header occupies
    pub len: usize,
}

impl Header {
    /// Serialize a version 2 header with its two document attributes
    pub fn to_bytes(counter: u32, selected_ref: u32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(35);
        bytes.extend_from_slice(&SIGNATURE);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        put_u32_attr(&mut bytes, ATTR_COUNTER, counter);
        put_u32_attr(&mut bytes, ATTR_SELECTED, selected_ref);
        bytes
    }

    /// Parse and validate the header at the start of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(GuideError::TooShort {
                len: bytes.len() as u64,
            });
        }
        if bytes[..3] != SIGNATURE {
            return Err(GuideError::InvalidSignature);
        }

        let mut reader = ByteReader::new(bytes);
        reader.skip(3)?;

        let version = reader.u32()?;
        if version != FORMAT_VERSION {
            return Err(GuideError::UnsupportedVersion(version));
        }

        let mut header = Header {
            version,
            counter: 0,
            selected_ref: 0,
            len: 0,
        };

        let attr_count = reader.u32()?;
        for _ in 0..attr_count {
            let offset = reader.offset();
            let id = reader.u32()?;
            let len = reader.u32()?;
            let value = reader.take(len as usize)?;
            match id {
                ATTR_COUNTER => {
                    header.counter = le_u32(value)
                        .ok_or(GuideError::InvalidAttribute { id, len, offset })?;
                }
                ATTR_SELECTED => {
                    header.selected_ref = match value.len() {
                        4..=7 => le_u32(value).map(u64::from),
                        _ => le_u64(value),
                    }
                    .ok_or(GuideError::InvalidAttribute { id, len, offset })?;
                }
                _ => tracing::warn!("Skipping unknown document attribute {} ({} bytes)", id, len),
            }
        }

        header.len = reader.offset();
        tracing::debug!(
            "Header: version={}, counter={}, selected_ref={:#x}",
            header.version,
            header.counter,
            header.selected_ref
        );
        Ok(header)
    }
}

pub(crate) fn put_u32_attr(bytes: &mut Vec<u8>, id: u32, value: u32) {
    bytes.extend_from_slice(&id.to_le_bytes());
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(&value.to_le_bytes());
}

/// First four bytes of an attribute value
pub(crate) fn le_u32(value: &[u8]) -> Option<u32> {
    let head: [u8; 4] = value.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(head))
}

fn le_u64(value: &[u8]) -> Option<u64> {
    let head: [u8; 8] = value.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(head))
}

/// Bounds-checked cursor over a byte buffer
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, offset: 0 }
    }

    pub(crate) fn at(bytes: &'a [u8], offset: usize) -> Self {
        ByteReader { bytes, offset }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(GuideError::Truncated {
                offset: self.offset,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read one node reference of the given width
    pub(crate) fn node_ref(&mut self, arch: ArchBits) -> Result<u64> {
        match arch {
            ArchBits::Bits32 => self.u32().map(u64::from),
            ArchBits::Bits64 => self.u64(),
        }
    }
}
