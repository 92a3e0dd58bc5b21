//! Error types for avikit-media.

use crate::riff::FourCc;
use std::io;
use thiserror::Error;

/// Result type for avikit-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for avikit-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required chunk had a different fourcc.
    #[error("Expected chunk '{expected}', found '{found}'")]
    UnexpectedChunk { expected: FourCc, found: FourCc },

    /// A required list had a different marker or sub-type.
    #[error("Expected list '{expected}', found {found}")]
    UnexpectedList { expected: FourCc, found: String },

    /// End of stream where a required chunk was expected.
    #[error("Unexpected end of stream while looking for '{expected}'")]
    UnexpectedEof { expected: FourCc },

    /// Stream ended in the middle of a chunk header.
    #[error("Truncated chunk header: got {have} of 8 bytes")]
    TruncatedHeader { have: usize },

    /// Chunk is too small to hold the record it should contain.
    #[error("Chunk '{fourcc}' too small: need {need} bytes, have {have}")]
    ChunkTooSmall { fourcc: FourCc, need: usize, have: u32 },

    /// Index entry does not point at the chunk it names.
    #[error("Index mismatch for stream {stream} frame {frame}: expected '{expected}', found '{found}'")]
    IndexMismatch {
        stream: usize,
        frame: u32,
        expected: FourCc,
        found: FourCc,
    },

    /// Timecode string could not be parsed.
    #[error("Invalid timecode: {0}")]
    InvalidTimecode(String),

    /// Stream index does not exist.
    #[error("Unknown stream: {0}")]
    UnknownStream(usize),

    /// Chunk ids only carry two decimal digits of stream index.
    #[error("Too many streams: at most 100 are addressable")]
    TooManyStreams,

    /// Stream layout can no longer change because headers were written.
    #[error("Headers already committed; streams cannot be added")]
    HeadersCommitted,

    /// Frame rate is not usable for writing.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),
}

impl Error {
    /// Create a list mismatch error from the chunk that was actually found.
    pub fn unexpected_list(expected: FourCc, marker: FourCc, list_type: Option<FourCc>) -> Self {
        let found = match list_type {
            Some(t) => format!("'{marker}' of type '{t}'"),
            None => format!("chunk '{marker}'"),
        };
        Self::UnexpectedList { expected, found }
    }

    /// Create an invalid timecode error.
    pub fn invalid_timecode(msg: impl Into<String>) -> Self {
        Self::InvalidTimecode(msg.into())
    }

    /// Whether this error came from reaching the end of the input.
    pub fn is_eof(&self) -> bool {
        match self {
            Self::UnexpectedEof { .. } | Self::TruncatedHeader { .. } => true,
            Self::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
