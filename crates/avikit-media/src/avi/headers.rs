//! On-disk AVI records.
//!
//! Each record has an explicit little-endian codec over a fixed field order:
//!
//! | record             | bytes |
//! |--------------------|-------|
//! | `MainHeader`       | 56    |
//! | `StreamHeader`     | 56    |
//! | `BitmapInfoHeader` | 40    |
//! | `IndexEntry`       | 16    |

use crate::riff::{FourCc, Record};
use bytes::{Buf, BufMut};

/// Main header flag: file has an `idx1` index.
pub const AVIF_HASINDEX: u32 = 0x0000_0010;
/// Main header flag: index order determines presentation order.
pub const AVIF_MUSTUSEINDEX: u32 = 0x0000_0020;
/// Main header flag: streams are interleaved.
pub const AVIF_ISINTERLEAVED: u32 = 0x0000_0100;
/// Main header flag: chunk types can be trusted for keyframe detection.
pub const AVIF_TRUSTCKTYPE: u32 = 0x0000_0800;
/// Main header flag: file was allocated for capture.
pub const AVIF_WASCAPTUREFILE: u32 = 0x0001_0000;
/// Main header flag: copyrighted content.
pub const AVIF_COPYRIGHTED: u32 = 0x0002_0000;

/// Index flag: the entry describes a list.
pub const AVIIF_LIST: u32 = 0x0000_0001;
/// Index flag: the frame is a key frame.
pub const AVIIF_KEYFRAME: u32 = 0x0000_0010;
/// Index flag: the chunk has no presentation time.
pub const AVIIF_NO_TIME: u32 = 0x0000_0100;

/// File-level header (`avih`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct MainHeader {
    pub micro_sec_per_frame: u32,
    pub max_bytes_per_sec: u32,
    pub padding_granularity: u32,
    pub flags: u32,
    pub total_frames: u32,
    pub initial_frames: u32,
    pub streams: u32,
    pub suggested_buffer_size: u32,
    pub width: u32,
    pub height: u32,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub reserved: [u8; 16],
}

impl Record for MainHeader {
    const SIZE: usize = 56;

    fn decode<B: Buf>(buf: &mut B) -> Self {
        let mut header = Self {
            micro_sec_per_frame: buf.get_u32_le(),
            max_bytes_per_sec: buf.get_u32_le(),
            padding_granularity: buf.get_u32_le(),
            flags: buf.get_u32_le(),
            total_frames: buf.get_u32_le(),
            initial_frames: buf.get_u32_le(),
            streams: buf.get_u32_le(),
            suggested_buffer_size: buf.get_u32_le(),
            width: buf.get_u32_le(),
            height: buf.get_u32_le(),
            reserved: [0; 16],
        };
        buf.copy_to_slice(&mut header.reserved);
        header
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(self.micro_sec_per_frame);
        buf.put_u32_le(self.max_bytes_per_sec);
        buf.put_u32_le(self.padding_granularity);
        buf.put_u32_le(self.flags);
        buf.put_u32_le(self.total_frames);
        buf.put_u32_le(self.initial_frames);
        buf.put_u32_le(self.streams);
        buf.put_u32_le(self.suggested_buffer_size);
        buf.put_u32_le(self.width);
        buf.put_u32_le(self.height);
        buf.put_slice(&self.reserved);
    }
}

/// Display rectangle carried by a stream header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Rect {
    pub left: u16,
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
}

/// Per-stream header (`strh`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct StreamHeader {
    pub fcc_type: FourCc,
    pub fcc_handler: FourCc,
    pub flags: u32,
    pub priority: u16,
    pub language: u16,
    pub initial_frames: u32,
    pub scale: u32,
    pub rate: u32,
    pub start: u32,
    pub length: u32,
    pub suggested_buffer_size: u32,
    pub quality: u32,
    pub sample_size: u32,
    pub frame: Rect,
}

impl StreamHeader {
    /// Whether this header describes a video stream.
    pub fn is_video(&self) -> bool {
        self.fcc_type == FourCc::VIDS
    }

    /// Stream rate as `rate / scale`, or 0 when the scale is unset.
    pub fn frame_rate(&self) -> f64 {
        if self.scale == 0 {
            0.0
        } else {
            self.rate as f64 / self.scale as f64
        }
    }
}

impl Record for StreamHeader {
    const SIZE: usize = 56;

    fn decode<B: Buf>(buf: &mut B) -> Self {
        let mut fcc_type = [0u8; 4];
        buf.copy_to_slice(&mut fcc_type);
        let mut fcc_handler = [0u8; 4];
        buf.copy_to_slice(&mut fcc_handler);
        Self {
            fcc_type: FourCc(fcc_type),
            fcc_handler: FourCc(fcc_handler),
            flags: buf.get_u32_le(),
            priority: buf.get_u16_le(),
            language: buf.get_u16_le(),
            initial_frames: buf.get_u32_le(),
            scale: buf.get_u32_le(),
            rate: buf.get_u32_le(),
            start: buf.get_u32_le(),
            length: buf.get_u32_le(),
            suggested_buffer_size: buf.get_u32_le(),
            quality: buf.get_u32_le(),
            sample_size: buf.get_u32_le(),
            frame: Rect {
                left: buf.get_u16_le(),
                top: buf.get_u16_le(),
                right: buf.get_u16_le(),
                bottom: buf.get_u16_le(),
            },
        }
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.fcc_type.as_bytes());
        buf.put_slice(self.fcc_handler.as_bytes());
        buf.put_u32_le(self.flags);
        buf.put_u16_le(self.priority);
        buf.put_u16_le(self.language);
        buf.put_u32_le(self.initial_frames);
        buf.put_u32_le(self.scale);
        buf.put_u32_le(self.rate);
        buf.put_u32_le(self.start);
        buf.put_u32_le(self.length);
        buf.put_u32_le(self.suggested_buffer_size);
        buf.put_u32_le(self.quality);
        buf.put_u32_le(self.sample_size);
        buf.put_u16_le(self.frame.left);
        buf.put_u16_le(self.frame.top);
        buf.put_u16_le(self.frame.right);
        buf.put_u16_le(self.frame.bottom);
    }
}

/// Video stream format (`strf` of a `vids` stream).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: i32,
    /// Negative for top-down bitmaps.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: FourCc,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

impl Record for BitmapInfoHeader {
    const SIZE: usize = 40;

    fn decode<B: Buf>(buf: &mut B) -> Self {
        let size = buf.get_u32_le();
        let width = buf.get_i32_le();
        let height = buf.get_i32_le();
        let planes = buf.get_u16_le();
        let bit_count = buf.get_u16_le();
        let mut compression = [0u8; 4];
        buf.copy_to_slice(&mut compression);
        Self {
            size,
            width,
            height,
            planes,
            bit_count,
            compression: FourCc(compression),
            size_image: buf.get_u32_le(),
            x_pels_per_meter: buf.get_i32_le(),
            y_pels_per_meter: buf.get_i32_le(),
            clr_used: buf.get_u32_le(),
            clr_important: buf.get_u32_le(),
        }
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(self.size);
        buf.put_i32_le(self.width);
        buf.put_i32_le(self.height);
        buf.put_u16_le(self.planes);
        buf.put_u16_le(self.bit_count);
        buf.put_slice(self.compression.as_bytes());
        buf.put_u32_le(self.size_image);
        buf.put_i32_le(self.x_pels_per_meter);
        buf.put_i32_le(self.y_pels_per_meter);
        buf.put_u32_le(self.clr_used);
        buf.put_u32_le(self.clr_important);
    }
}

/// Entry of the legacy `idx1` index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Chunk id, e.g. `00dc`.
    pub chunk_id: FourCc,
    pub flags: u32,
    /// Offset of the chunk header; relative to the movi body once resolved.
    pub offset: u32,
    /// Declared chunk content length.
    pub size: u32,
}

impl IndexEntry {
    pub fn is_list(&self) -> bool {
        self.flags & AVIIF_LIST != 0
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags & AVIIF_KEYFRAME != 0
    }
}

impl Record for IndexEntry {
    const SIZE: usize = 16;

    fn decode<B: Buf>(buf: &mut B) -> Self {
        let mut chunk_id = [0u8; 4];
        buf.copy_to_slice(&mut chunk_id);
        Self {
            chunk_id: FourCc(chunk_id),
            flags: buf.get_u32_le(),
            offset: buf.get_u32_le(),
            size: buf.get_u32_le(),
        }
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.chunk_id.as_bytes());
        buf.put_u32_le(self.flags);
        buf.put_u32_le(self.offset);
        buf.put_u32_le(self.size);
    }
}
