//! Header list (`hdrl`) parsing.

use super::{BitmapInfoHeader, MainHeader, StreamHeader, StreamInfo, VideoStream};
use crate::diagnostics::{Diagnostics, Event};
use crate::riff::{ChunkReader, FourCc};
use crate::Result;
use std::io::{Read, Seek};

/// Decoded file and stream headers.
#[derive(Debug, Clone)]
pub struct AviHeaders {
    pub main: MainHeader,
    /// Every stream, in declaration order.
    pub streams: Vec<StreamInfo>,
    /// Streams with a bitmap format, indexed by their overall position.
    pub video_streams: Vec<VideoStream>,
}

/// Parse `RIFF AVI ` and its `hdrl` list.
///
/// Leaves the reader positioned at the first chunk after the last stream
/// list, which usually is some `LIST` before or at `movi`.
pub fn parse_headers<R: Read + Seek>(
    reader: &mut ChunkReader<R>,
    diagnostics: &dyn Diagnostics,
) -> Result<AviHeaders> {
    reader.expect_list(FourCc::RIFF, FourCc::AVI)?;
    reader.expect_list(FourCc::LIST, FourCc::HDRL)?;

    let avih = reader.expect_chunk(FourCc::AVIH)?;
    let main: MainHeader = reader.read_record(&avih)?;
    diagnostics.event(&Event::MainHeader(&main));

    let mut streams = Vec::new();
    let mut video_streams = Vec::new();

    while let Some(chunk) = reader.next_chunk()? {
        if chunk.is_list_of(FourCc::STRL) {
            let index = streams.len();
            let info = parse_stream_list(reader)?;
            diagnostics.event(&Event::Stream { index, info: &info });
            if let Some(video) = VideoStream::from_info(index, &info) {
                video_streams.push(video);
            }
            streams.push(info);
        } else if chunk.is_list_of(FourCc::ODML) {
            reader.skip(&chunk)?;
        } else {
            reader.push_back(&chunk)?;
            break;
        }
    }

    Ok(AviHeaders {
        main,
        streams,
        video_streams,
    })
}

/// Parse the body of one `strl` list.
fn parse_stream_list<R: Read + Seek>(reader: &mut ChunkReader<R>) -> Result<StreamInfo> {
    let strh = reader.expect_chunk(FourCc::STRH)?;
    let header: StreamHeader = reader.read_record(&strh)?;

    let strf = reader.expect_chunk(FourCc::STRF)?;
    let format = if header.is_video() {
        Some(reader.read_record::<BitmapInfoHeader>(&strf)?)
    } else {
        reader.skip(&strf)?;
        None
    };

    let mut info = StreamInfo {
        header,
        format,
        codec_data: None,
        name: None,
    };

    let mut next = reader.next_chunk()?;
    if let Some(chunk) = next.filter(|c| c.is(FourCc::STRD)) {
        info.codec_data = Some(reader.read_payload(&chunk)?);
        next = reader.next_chunk()?;
    }
    if let Some(chunk) = next.filter(|c| c.is(FourCc::STRN)) {
        info.name = Some(decode_name(&reader.read_payload(&chunk)?));
        next = None;
    }
    if let Some(chunk) = next {
        reader.push_back(&chunk)?;
    }

    Ok(info)
}

/// One byte per character, up to the first NUL.
fn decode_name(raw: &[u8]) -> String {
    raw.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}
