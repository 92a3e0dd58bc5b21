//! Write facade.
//!
//! Nothing is written until the first frame arrives, so streams can be
//! configured freely up to that point. Header records are reserved as zeroed
//! placeholders and patched in [`AviOutput::close`] once frame counts and the
//! peak data rate are known.

use super::{
    AviFrame, BitmapInfoHeader, FrameSink, MainHeader, Rect, StreamHeader, VideoStream,
    AVIF_HASINDEX, AVIF_ISINTERLEAVED,
};
use crate::diagnostics::{Diagnostics, Event, NullDiagnostics};
use crate::rate::RateMonitor;
use crate::riff::{ChunkWriter, FourCc, OpenChunk, Record, StructField};
use crate::timecode::frame_rate_to_ratio;
use crate::{Error, Result};
use bytes::{BufMut, BytesMut};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

/// Chunk ids carry the stream index as two decimal digits.
const MAX_STREAMS: usize = 100;

/// File-level settings for a new container.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    /// Frames per second; drives the main header and the rate monitor.
    pub frame_rate: f64,
    /// Main header width; 0 takes the first stream's.
    pub width: u32,
    /// Main header height; 0 takes the first stream's.
    pub height: u32,
    /// Lower bound for the declared peak rate.
    pub max_bytes_per_sec: Option<u32>,
    /// Frames sampled before the rate monitor tracks a peak.
    pub warmup_frames: usize,
    /// Main header flags (`AVIF_*`).
    pub flags: u32,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            frame_rate: 25.0,
            width: 0,
            height: 0,
            max_bytes_per_sec: None,
            warmup_frames: 8,
            flags: AVIF_HASINDEX | AVIF_ISINTERLEAVED,
        }
    }
}

struct OutputStream {
    video: VideoStream,
    header: Option<StructField<StreamHeader>>,
    format: Option<StructField<BitmapInfoHeader>>,
    max_frame_size: u32,
}

/// Placeholders that stay open between the first frame and `close`.
struct Layout {
    riff: OpenChunk,
    movi: OpenChunk,
    main: StructField<MainHeader>,
    movi_offset: u64,
    rate: RateMonitor,
}

/// An AVI file being written frame by frame.
pub struct AviOutput<W> {
    writer: ChunkWriter<W>,
    options: OutputOptions,
    streams: Vec<OutputStream>,
    layout: Option<Layout>,
    /// Pending `idx1` body, 16 bytes per frame.
    index: BytesMut,
    diagnostics: Box<dyn Diagnostics>,
}

impl AviOutput<BufWriter<File>> {
    /// Create (or truncate) an AVI file at the given path.
    pub fn create<P: AsRef<Path>>(path: P, options: OutputOptions) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_options(BufWriter::new(file), options))
    }
}

impl<W: Write + Seek> AviOutput<W> {
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, OutputOptions::default())
    }

    pub fn with_options(inner: W, options: OutputOptions) -> Self {
        Self::with_diagnostics(inner, options, Box::new(NullDiagnostics))
    }

    /// Create an output that reports progress to `diagnostics`.
    pub fn with_diagnostics(
        inner: W,
        options: OutputOptions,
        diagnostics: Box<dyn Diagnostics>,
    ) -> Self {
        Self {
            writer: ChunkWriter::new(inner),
            options,
            streams: Vec::new(),
            layout: None,
            index: BytesMut::new(),
            diagnostics,
        }
    }

    pub fn options(&self) -> &OutputOptions {
        &self.options
    }

    /// Mutable settings; fails once headers are committed.
    pub fn options_mut(&mut self) -> Result<&mut OutputOptions> {
        if self.layout.is_some() {
            return Err(Error::HeadersCommitted);
        }
        Ok(&mut self.options)
    }

    /// Whether the first frame has been written.
    pub fn headers_committed(&self) -> bool {
        self.layout.is_some()
    }

    /// Add a video stream; returns its stream index.
    ///
    /// The stream's `index` and `frame_count` are reassigned.
    pub fn add_video_stream(&mut self, mut video: VideoStream) -> Result<usize> {
        if self.layout.is_some() {
            return Err(Error::HeadersCommitted);
        }
        let index = self.streams.len();
        if index >= MAX_STREAMS {
            return Err(Error::TooManyStreams);
        }
        video.index = index;
        video.frame_count = 0;
        self.streams.push(OutputStream {
            video,
            header: None,
            format: None,
            max_frame_size: 0,
        });
        Ok(index)
    }

    /// Add a stream carrying the codec metadata of `template`.
    pub fn new_stream(&mut self, template: &VideoStream) -> Result<usize> {
        self.add_video_stream(template.clone())
    }

    pub fn video_streams(&self) -> impl Iterator<Item = &VideoStream> {
        self.streams.iter().map(|s| &s.video)
    }

    /// Sequential writer for one stream.
    pub fn stream(&mut self, index: usize) -> Option<VideoStreamWriter<'_, W>> {
        if index < self.streams.len() {
            Some(VideoStreamWriter {
                output: self,
                index,
            })
        } else {
            None
        }
    }

    /// Append a frame to stream `stream`; returns its frame number.
    pub fn write_frame(&mut self, stream: usize, frame: &AviFrame) -> Result<u32> {
        if stream >= self.streams.len() {
            return Err(Error::UnknownStream(stream));
        }
        self.commit_headers()?;
        let Some(layout) = self.layout.as_mut() else {
            return Err(Error::HeadersCommitted);
        };

        let chunk_id = frame.frame_type.chunk_id(stream);
        let position = self.writer.position()?;
        let chunk = self.writer.begin(chunk_id)?;
        self.writer.write(&frame.data)?;
        let size = self.writer.end(chunk)?;

        let offset = u32::try_from(position - layout.movi_offset).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "movi exceeds 4 GiB")
        })?;
        self.index.put_slice(chunk_id.as_bytes());
        self.index.put_u32_le(frame.flags);
        self.index.put_u32_le(offset);
        self.index.put_u32_le(size);
        layout.rate.sample(8 + size as u64);

        let out = &mut self.streams[stream];
        let number = out.video.frame_count;
        out.video.frame_count += 1;
        out.max_frame_size = out.max_frame_size.max(size);
        Ok(number)
    }

    /// Finish the file: close movi, write `idx1`, patch every header.
    ///
    /// A file with no frames still gets complete headers.
    pub fn close(mut self) -> Result<W> {
        self.commit_headers()?;
        let Some(layout) = self.layout.take() else {
            return Err(Error::HeadersCommitted);
        };

        self.writer.end(layout.movi)?;
        self.writer.write_chunk(FourCc::IDX1, &self.index)?;

        let main = self.main_header(&layout.rate);
        self.writer.update(&layout.main, &main)?;

        let (width, height) = (main.width, main.height);
        for out in &self.streams {
            let video = &out.video;
            let fps = if video.frame_rate > 0.0 {
                video.frame_rate
            } else {
                self.options.frame_rate
            };
            let (rate, scale) = frame_rate_to_ratio(fps)?;
            let stream_width = if video.width > 0 { video.width } else { width };
            let stream_height = if video.height > 0 { video.height } else { height };

            if let Some(field) = &out.header {
                let header = StreamHeader {
                    fcc_type: FourCc::VIDS,
                    fcc_handler: video.codec,
                    scale,
                    rate,
                    length: video.frame_count,
                    suggested_buffer_size: video.suggested_buffer_size.max(out.max_frame_size),
                    quality: u32::MAX,
                    frame: Rect {
                        left: 0,
                        top: 0,
                        right: stream_width.min(u16::MAX as u32) as u16,
                        bottom: stream_height.min(u16::MAX as u32) as u16,
                    },
                    ..Default::default()
                };
                self.writer.update(field, &header)?;
            }
            if let Some(field) = &out.format {
                let format = BitmapInfoHeader {
                    size: BitmapInfoHeader::SIZE as u32,
                    width: stream_width as i32,
                    height: stream_height as i32,
                    planes: 1,
                    bit_count: video.bit_depth,
                    compression: video.compression,
                    size_image: video.image_size,
                    ..Default::default()
                };
                self.writer.update(field, &format)?;
            }
        }

        self.writer.end(layout.riff)?;
        self.writer.flush()?;
        self.diagnostics.event(&Event::Finalized {
            total_frames: main.total_frames,
            max_bytes_per_sec: main.max_bytes_per_sec,
        });
        Ok(self.writer.into_inner())
    }

    fn main_header(&self, rate: &RateMonitor) -> MainHeader {
        let fps = self.options.frame_rate;
        let micro_sec_per_frame = if fps.is_finite() && fps > 0.0 {
            (1_000_000.0 / fps).round() as u32
        } else {
            0
        };
        let measured = rate.max().ceil() as u32;
        let max_bytes_per_sec = self
            .options
            .max_bytes_per_sec
            .map_or(measured, |floor| floor.max(measured));

        let first = self.streams.first().map(|s| &s.video);
        let width = match self.options.width {
            0 => first.map_or(0, |v| v.width),
            w => w,
        };
        let height = match self.options.height {
            0 => first.map_or(0, |v| v.height),
            h => h,
        };

        MainHeader {
            micro_sec_per_frame,
            max_bytes_per_sec,
            flags: self.options.flags,
            total_frames: self
                .streams
                .iter()
                .map(|s| s.video.frame_count)
                .max()
                .unwrap_or(0),
            streams: self.streams.len() as u32,
            suggested_buffer_size: self
                .streams
                .iter()
                .map(|s| s.video.suggested_buffer_size.max(s.max_frame_size))
                .max()
                .unwrap_or(0),
            width,
            height,
            ..Default::default()
        }
    }

    /// Emit the header lists and open movi, once.
    fn commit_headers(&mut self) -> Result<()> {
        if self.layout.is_some() {
            return Ok(());
        }
        self.check_frame_rates()?;

        let riff = self.writer.begin_list(FourCc::RIFF, FourCc::AVI)?;
        let hdrl = self.writer.begin_list(FourCc::LIST, FourCc::HDRL)?;
        let main = self.writer.reserve_record(FourCc::AVIH)?;

        for out in &mut self.streams {
            let strl = self.writer.begin_list(FourCc::LIST, FourCc::STRL)?;
            out.header = Some(self.writer.reserve_record(FourCc::STRH)?);
            out.format = Some(self.writer.reserve_record(FourCc::STRF)?);
            if let Some(data) = out.video.codec_data.as_deref().filter(|d| !d.is_empty()) {
                self.writer.write_chunk(FourCc::STRD, data)?;
            }
            self.writer.end(strl)?;
        }
        self.writer.end(hdrl)?;

        let movi = self.writer.begin_list(FourCc::LIST, FourCc::MOVI)?;
        let movi_offset = self.writer.position()?;
        self.diagnostics.event(&Event::HeadersWritten {
            streams: self.streams.len(),
            movi_offset,
        });

        self.layout = Some(Layout {
            riff,
            movi,
            main,
            movi_offset,
            rate: RateMonitor::new(self.options.frame_rate, self.options.warmup_frames),
        });
        Ok(())
    }

    /// Reject rates that cannot be stored as `rate/scale` before any bytes
    /// are written.
    fn check_frame_rates(&self) -> Result<()> {
        frame_rate_to_ratio(self.options.frame_rate)?;
        for out in &self.streams {
            if out.video.frame_rate > 0.0 {
                frame_rate_to_ratio(out.video.frame_rate)?;
            }
        }
        Ok(())
    }
}

/// Borrowed sequential writer for one stream of an [`AviOutput`].
pub struct VideoStreamWriter<'a, W> {
    output: &'a mut AviOutput<W>,
    index: usize,
}

impl<W: Write + Seek> FrameSink for VideoStreamWriter<'_, W> {
    fn stream(&self) -> &VideoStream {
        &self.output.streams[self.index].video
    }

    fn write_frame(&mut self, frame: &AviFrame) -> Result<u32> {
        self.output.write_frame(self.index, frame)
    }
}
