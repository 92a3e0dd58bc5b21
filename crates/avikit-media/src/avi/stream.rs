//! Stream records, frames, and the read/write capabilities over them.

use super::{BitmapInfoHeader, StreamHeader};
use crate::riff::FourCc;
use crate::timecode::normalize_frame_rate;
use crate::Result;

/// Everything declared in one `strl` list.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub header: StreamHeader,
    /// Present only for video streams.
    pub format: Option<BitmapInfoHeader>,
    /// Raw `strd` codec data.
    pub codec_data: Option<Vec<u8>>,
    /// `strn` name, trimmed at the first NUL.
    pub name: Option<String>,
}

/// Logical description of a video stream.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct VideoStream {
    /// Position among all streams; the `NN` of `NNdc` chunk ids.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    /// Normalized frames per second.
    pub frame_rate: f64,
    pub frame_count: u32,
    /// Handler fourcc from the stream header.
    pub codec: FourCc,
    #[cfg_attr(feature = "serialize", serde(skip_serializing_if = "Option::is_none"))]
    pub codec_data: Option<Vec<u8>>,
    pub suggested_buffer_size: u32,
    pub bit_depth: u16,
    /// Compression fourcc from the bitmap header.
    pub compression: FourCc,
    pub image_size: u32,
}

impl VideoStream {
    /// Build from a parsed stream list. `None` unless the stream has a bitmap format.
    pub fn from_info(index: usize, info: &StreamInfo) -> Option<Self> {
        let format = info.format?;
        Some(Self {
            index,
            width: format.width.unsigned_abs(),
            height: format.height.unsigned_abs(),
            frame_rate: normalize_frame_rate(info.header.frame_rate()),
            frame_count: 0,
            codec: info.header.fcc_handler,
            codec_data: info.codec_data.clone(),
            suggested_buffer_size: info.header.suggested_buffer_size,
            bit_depth: format.bit_count,
            compression: format.compression,
            image_size: format.size_image,
        })
    }

    /// Chunk id for frames of this stream.
    pub fn chunk_id(&self, frame_type: FrameType) -> FourCc {
        frame_type.chunk_id(self.index)
    }

    /// Duration in seconds at the normalized rate.
    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate <= 0.0 {
            0.0
        } else {
            self.frame_count as f64 / self.frame_rate
        }
    }
}

/// Two-character frame type suffix of a chunk id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// `db`
    Uncompressed,
    /// `dc`
    Compressed,
}

impl FrameType {
    pub fn code(&self) -> &'static [u8; 2] {
        match self {
            Self::Uncompressed => b"db",
            Self::Compressed => b"dc",
        }
    }

    pub fn from_code(code: [u8; 2]) -> Option<Self> {
        match &code {
            b"db" => Some(Self::Uncompressed),
            b"dc" => Some(Self::Compressed),
            _ => None,
        }
    }

    /// Build `NNdb` / `NNdc` for a stream index below 100.
    ///
    /// Two digits cannot address higher indices; callers keep below the
    /// limit (`AviOutput` refuses the 101st stream).
    pub fn chunk_id(&self, stream: usize) -> FourCc {
        debug_assert!(stream < 100, "stream index {stream} has no chunk id");
        let digits = format!("{:02}", stream % 100);
        let digits = digits.as_bytes();
        let code = self.code();
        FourCc([digits[0], digits[1], code[0], code[1]])
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code();
        write!(f, "{}{}", code[0] as char, code[1] as char)
    }
}

/// Split a video chunk id into stream index and frame type.
///
/// Returns `None` for ids that are not two ASCII digits followed by `db`/`dc`.
pub fn parse_frame_id(id: FourCc) -> Option<(usize, FrameType)> {
    let [a, b, c, d] = id.0;
    if !a.is_ascii_digit() || !b.is_ascii_digit() {
        return None;
    }
    let frame_type = FrameType::from_code([c, d])?;
    Some((((a - b'0') * 10 + (b - b'0')) as usize, frame_type))
}

/// One video frame as stored in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AviFrame {
    /// Frame number within its stream.
    pub number: u32,
    pub frame_type: FrameType,
    /// Index flags (see `AVIIF_*`).
    pub flags: u32,
    pub data: Vec<u8>,
}

impl AviFrame {
    /// A key frame of the given type. The number is assigned on write.
    pub fn new(frame_type: FrameType, data: Vec<u8>) -> Self {
        Self {
            number: 0,
            frame_type,
            flags: super::AVIIF_KEYFRAME,
            data,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags & super::AVIIF_KEYFRAME != 0
    }
}

/// Random access to the frames of one stream.
pub trait FrameSource {
    /// Stream description.
    fn stream(&self) -> &VideoStream;

    /// Read frame `number`; `Ok(None)` when it is out of range.
    fn get_frame(&mut self, number: u32) -> Result<Option<AviFrame>>;
}

/// Sequential writing of frames to one stream.
pub trait FrameSink {
    /// Stream description, including the running frame count.
    fn stream(&self) -> &VideoStream;

    /// Append a frame; returns its frame number.
    fn write_frame(&mut self, frame: &AviFrame) -> Result<u32>;
}
