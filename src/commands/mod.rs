//! Subcommand implementations.
//!
//! Each command takes its inputs explicitly and writes its human-readable
//! report to a caller-supplied sink, so `main` stays a thin dispatcher.

pub mod copy;
pub mod dump;
pub mod frame;
pub mod probe;

pub use copy::{copy_stream, CopyReport, Repeat};
pub use dump::dump_chunks;
pub use frame::{extract_frame, FramePosition};
pub use probe::{probe_file, ProbeReport};
