//! Progress reporting for container reads and writes.
//!
//! The container facades never log on their own; they hand structured
//! [`Event`]s to an injected [`Diagnostics`] sink. The default sink drops
//! everything.

use crate::avi::{MainHeader, StreamInfo};
use crate::riff::FourCc;

/// Something noteworthy happened while reading or writing a container.
#[derive(Debug)]
pub enum Event<'a> {
    /// The `avih` record was decoded.
    MainHeader(&'a MainHeader),
    /// A stream list was decoded.
    Stream { index: usize, info: &'a StreamInfo },
    /// An `idx1` chunk was parsed.
    IndexParsed { entries: usize, slack: u32 },
    /// No `idx1` chunk follows the movi list.
    IndexMissing,
    /// The index was rebuilt by scanning the movi list.
    IndexRebuilt { entries: usize },
    /// A stream's index offsets were shifted to be movi-relative.
    OffsetsRepaired {
        stream: usize,
        chunk_id: FourCc,
        delta: u64,
    },
    /// Headers were committed on the first frame write.
    HeadersWritten { streams: usize, movi_offset: u64 },
    /// The output was finalized.
    Finalized {
        total_frames: u32,
        max_bytes_per_sec: u32,
    },
}

/// Receiver for container [`Event`]s.
pub trait Diagnostics {
    fn event(&self, event: &Event<'_>);
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn event(&self, _event: &Event<'_>) {}
}

impl<F: Fn(&Event<'_>)> Diagnostics for F {
    fn event(&self, event: &Event<'_>) {
        self(event)
    }
}

/// Forwards events to `tracing`.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

#[cfg(feature = "tracing")]
impl Diagnostics for TracingDiagnostics {
    fn event(&self, event: &Event<'_>) {
        match event {
            Event::MainHeader(h) => tracing::debug!(
                streams = h.streams,
                total_frames = h.total_frames,
                width = h.width,
                height = h.height,
                "Main header decoded"
            ),
            Event::Stream { index, info } => tracing::debug!(
                index,
                kind = %info.header.fcc_type,
                handler = %info.header.fcc_handler,
                length = info.header.length,
                "Stream decoded"
            ),
            Event::IndexParsed { entries, slack } => {
                tracing::debug!(entries, slack, "idx1 parsed")
            }
            Event::IndexMissing => tracing::info!("No idx1 chunk; rebuilding index from movi"),
            Event::IndexRebuilt { entries } => tracing::info!(entries, "Index rebuilt"),
            Event::OffsetsRepaired {
                stream,
                chunk_id,
                delta,
            } => tracing::warn!(
                stream,
                %chunk_id,
                delta,
                "Index offsets were not movi-relative; corrected"
            ),
            Event::HeadersWritten {
                streams,
                movi_offset,
            } => tracing::debug!(streams, movi_offset, "Headers written"),
            Event::Finalized {
                total_frames,
                max_bytes_per_sec,
            } => tracing::info!(total_frames, max_bytes_per_sec, "AVI finalized"),
        }
    }
}
