//! RIFF chunk tokenization and emission.
//!
//! A RIFF file is a tree of chunks. Every chunk starts with an 8-byte header
//! (fourcc + little-endian content length); `RIFF` and `LIST` chunks carry an
//! additional 4-byte sub-type and contain nested chunks. Content is padded to
//! an even byte count, and the pad byte is not counted in the length field.

mod reader;
mod writer;

pub use reader::ChunkReader;
pub use writer::{ChunkWriter, OpenChunk, StructField};

use bytes::{Buf, BufMut, BytesMut};

/// Four-character chunk code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const RIFF: Self = Self(*b"RIFF");
    pub const LIST: Self = Self(*b"LIST");
    pub const JUNK: Self = Self(*b"JUNK");
    pub const AVI: Self = Self(*b"AVI ");
    pub const HDRL: Self = Self(*b"hdrl");
    pub const AVIH: Self = Self(*b"avih");
    pub const STRL: Self = Self(*b"strl");
    pub const STRH: Self = Self(*b"strh");
    pub const STRF: Self = Self(*b"strf");
    pub const STRD: Self = Self(*b"strd");
    pub const STRN: Self = Self(*b"strn");
    pub const ODML: Self = Self(*b"odml");
    pub const MOVI: Self = Self(*b"movi");
    pub const IDX1: Self = Self(*b"idx1");
    pub const VIDS: Self = Self(*b"vids");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Create from a 4-byte string; `None` for any other length.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes: [u8; 4] = s.as_bytes().try_into().ok()?;
        Some(Self(bytes))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Whether this code introduces a chunk with a sub-type and children.
    pub fn is_list_marker(&self) -> bool {
        *self == Self::RIFF || *self == Self::LIST
    }
}

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Debug for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FourCc({:?})", self.as_str())
    }
}

impl From<&[u8; 4]> for FourCc {
    fn from(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for FourCc {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Parsed chunk header.
///
/// For list chunks the sub-type has already been consumed, so `length` and
/// `file_length` describe the remaining payload only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk code (`RIFF`/`LIST` for lists).
    pub fourcc: FourCc,
    /// List sub-type, present only for list chunks.
    pub list_type: Option<FourCc>,
    /// Declared content length.
    pub length: u32,
    /// Content length rounded up to even.
    pub file_length: u32,
    /// Header bytes consumed (8, or 12 for lists).
    pub header_size: u8,
}

impl Chunk {
    /// Whether this is a list chunk.
    pub fn is_list(&self) -> bool {
        self.list_type.is_some()
    }

    /// Whether this is a list of the given sub-type.
    pub fn is_list_of(&self, list_type: FourCc) -> bool {
        self.list_type == Some(list_type)
    }

    /// Whether this is a plain chunk with the given code.
    pub fn is(&self, fourcc: FourCc) -> bool {
        self.list_type.is_none() && self.fourcc == fourcc
    }
}

/// Padded on-disk size of `length` content bytes.
pub fn padded_len(length: u32) -> u32 {
    length.saturating_add(length & 1)
}

/// Fixed-size little-endian record with an explicit field codec.
pub trait Record: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Decode from exactly `SIZE` bytes.
    fn decode<B: Buf>(buf: &mut B) -> Self;

    /// Encode as exactly `SIZE` bytes.
    fn encode<B: BufMut>(&self, buf: &mut B);

    /// Decode the leading `SIZE` bytes of `bytes`, if there are enough.
    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut buf = bytes.get(..Self::SIZE)?;
        Some(Self::decode(&mut buf))
    }

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        self.encode(&mut buf);
        buf.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_display() {
        assert_eq!(FourCc::AVI.to_string(), "AVI ");
        assert_eq!(FourCc::from_bytes([0xff, 0, 0, 0]).as_str(), "????");
    }

    #[test]
    fn test_fourcc_parse() {
        assert_eq!(FourCc::parse("movi"), Some(FourCc::MOVI));
        assert_eq!(FourCc::parse("mov"), None);
        assert_eq!(FourCc::parse("movie"), None);
    }

    #[test]
    fn test_list_markers() {
        assert!(FourCc::RIFF.is_list_marker());
        assert!(FourCc::LIST.is_list_marker());
        assert!(!FourCc::JUNK.is_list_marker());
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(7), 8);
        assert_eq!(padded_len(8), 8);
    }
}
