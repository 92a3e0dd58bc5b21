//! Avikit-Media: AVI/RIFF container reading, index repair, and writing
//!
//! This crate reads and writes AVI files without touching codec payloads.
//! Frames are opaque byte blobs addressed by stream and frame number, or by
//! timecode.
//!
//! # Modules
//!
//! - `riff` - Chunk tokenizer with push-back and a two-phase chunk writer
//! - `avi` - Header records, header list parsing, index resolution, and the
//!   `AviInput` / `AviOutput` facades
//! - `timecode` - Frame-rate snapping and SMPTE timecode parsing
//! - `rate` - Sliding-window peak data rate estimation
//! - `diagnostics` - Injected progress reporting
//!
//! # Reading
//!
//! Opening a file parses `hdrl`, locates `movi`, and loads `idx1`. When
//! `idx1` is missing the index is rebuilt from the movi list. Index offsets
//! that were written relative to the file start (or to the `movi` tag) are
//! detected per stream and corrected before any frame is served.
//!
//! # Writing
//!
//! Headers are committed lazily on the first frame. Every header record is
//! written as a zeroed placeholder and patched on close, after the `idx1`
//! chunk, once frame counts and the peak data rate are known.

pub mod avi;
pub mod diagnostics;
pub mod error;
pub mod rate;
pub mod riff;
pub mod timecode;

pub use avi::{
    AviFrame, AviInput, AviOutput, FrameSink, FrameSource, FrameType, IndexSource, OutputOptions,
    VideoStream,
};
pub use diagnostics::{Diagnostics, Event, NullDiagnostics};
pub use error::{Error, Result};
pub use riff::FourCc;
