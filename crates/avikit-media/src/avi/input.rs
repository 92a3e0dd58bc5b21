//! Read facade.

use super::{
    parse_frame_id, parse_headers, resolve_index, AviFrame, AviHeaders, FrameIndex, FrameSource,
    IndexSource, MainHeader, StreamInfo, VideoStream,
};
use crate::diagnostics::{Diagnostics, NullDiagnostics};
use crate::riff::{ChunkReader, FourCc};
use crate::timecode::parse_timecode;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// An AVI file opened for random-access frame reads.
///
/// Headers and the frame index are resolved on construction; offsets are
/// already repaired by the time the first frame is served.
pub struct AviInput<R> {
    reader: ChunkReader<R>,
    headers: AviHeaders,
    index: FrameIndex,
    movi_offset: u64,
    source: IndexSource,
}

impl AviInput<BufReader<File>> {
    /// Open an AVI file from the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> AviInput<R> {
    /// Parse a container from a seekable reader positioned at its start.
    pub fn new(inner: R) -> Result<Self> {
        Self::with_diagnostics(inner, &NullDiagnostics)
    }

    /// Like [`new`](Self::new), reporting progress to `diagnostics`.
    pub fn with_diagnostics(inner: R, diagnostics: &dyn Diagnostics) -> Result<Self> {
        let mut reader = ChunkReader::new(inner);
        let mut headers = parse_headers(&mut reader, diagnostics)?;
        let resolved = resolve_index(&mut reader, diagnostics)?;

        for video in &mut headers.video_streams {
            video.frame_count = resolved.index.frame_count(video.index);
        }

        Ok(Self {
            reader,
            headers,
            index: resolved.index,
            movi_offset: resolved.movi_offset,
            source: resolved.source,
        })
    }

    pub fn main_header(&self) -> &MainHeader {
        &self.headers.main
    }

    /// Peak data rate declared in the main header.
    pub fn max_bytes_per_sec(&self) -> u32 {
        self.headers.main.max_bytes_per_sec
    }

    /// Every stream, video or not, in declaration order.
    pub fn streams(&self) -> &[StreamInfo] {
        &self.headers.streams
    }

    pub fn video_streams(&self) -> &[VideoStream] {
        &self.headers.video_streams
    }

    pub fn index(&self) -> &FrameIndex {
        &self.index
    }

    /// Whether the index came from `idx1` or was rebuilt.
    pub fn index_source(&self) -> IndexSource {
        self.source
    }

    /// Absolute position of the movi body.
    pub fn movi_offset(&self) -> u64 {
        self.movi_offset
    }

    /// Frame access for the `n`th video stream (not the overall stream index).
    pub fn video(&mut self, n: usize) -> Option<VideoStreamReader<'_, R>> {
        if n < self.headers.video_streams.len() {
            Some(VideoStreamReader {
                input: self,
                slot: n,
            })
        } else {
            None
        }
    }

    /// Read frame `number` of the stream with overall index `stream`.
    ///
    /// Returns `Ok(None)` when the stream has no such frame.
    pub fn get_frame(&mut self, stream: usize, number: u32) -> Result<Option<AviFrame>> {
        let Some(entry) = self.index.get(stream, number).copied() else {
            return Ok(None);
        };
        let Some((_, frame_type)) = parse_frame_id(entry.chunk_id) else {
            return Ok(None);
        };

        self.reader
            .seek_to(self.movi_offset + entry.offset as u64)?;
        let mut header = [0u8; 8];
        self.reader.read_exact(&mut header)?;
        let found = FourCc([header[0], header[1], header[2], header[3]]);
        if found != entry.chunk_id {
            return Err(Error::IndexMismatch {
                stream,
                frame: number,
                expected: entry.chunk_id,
                found,
            });
        }

        let data = self.reader.read_bytes(entry.size as u64)?;
        Ok(Some(AviFrame {
            number,
            frame_type,
            flags: entry.flags,
            data,
        }))
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// Borrowed view of one video stream of an [`AviInput`].
pub struct VideoStreamReader<'a, R> {
    input: &'a mut AviInput<R>,
    slot: usize,
}

impl<R: Read + Seek> VideoStreamReader<'_, R> {
    /// Read the frame addressed by a timecode at this stream's rate.
    ///
    /// `drop_frame` forces drop-frame counting on or off; `None` detects it
    /// from the separator. Negative or out-of-range positions give `Ok(None)`.
    pub fn frame_at_timecode(
        &mut self,
        timecode: &str,
        drop_frame: Option<bool>,
    ) -> Result<Option<AviFrame>> {
        let frame = parse_timecode(timecode, self.stream().frame_rate, drop_frame)?;
        match u32::try_from(frame) {
            Ok(number) => self.get_frame(number),
            Err(_) => Ok(None),
        }
    }
}

impl<R: Read + Seek> FrameSource for VideoStreamReader<'_, R> {
    fn stream(&self) -> &VideoStream {
        &self.input.headers.video_streams[self.slot]
    }

    fn get_frame(&mut self, number: u32) -> Result<Option<AviFrame>> {
        let stream = self.stream().index;
        self.input.get_frame(stream, number)
    }
}
