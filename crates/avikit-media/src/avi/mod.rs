//! AVI container reading and writing.
//!
//! [`AviInput`] parses the header lists, resolves the frame index, and serves
//! frames by number. [`AviOutput`] writes frames as they arrive and patches
//! the headers once totals are known.

mod headers;
mod index;
mod input;
mod output;
mod parser;
mod stream;

pub use headers::{
    BitmapInfoHeader, IndexEntry, MainHeader, Rect, StreamHeader, AVIF_COPYRIGHTED,
    AVIF_HASINDEX, AVIF_ISINTERLEAVED, AVIF_MUSTUSEINDEX, AVIF_TRUSTCKTYPE, AVIF_WASCAPTUREFILE,
    AVIIF_KEYFRAME, AVIIF_LIST, AVIIF_NO_TIME,
};
pub use index::{resolve_index, FrameIndex, IndexSource, ResolvedIndex};
pub use input::{AviInput, VideoStreamReader};
pub use output::{AviOutput, OutputOptions, VideoStreamWriter};
pub use parser::{parse_headers, AviHeaders};
pub use stream::{
    parse_frame_id, AviFrame, FrameSink, FrameSource, FrameType, StreamInfo, VideoStream,
};
