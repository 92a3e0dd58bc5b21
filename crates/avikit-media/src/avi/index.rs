//! Frame index resolution.
//!
//! The index is read from `idx1` when present and rebuilt from the movi list
//! otherwise. `idx1` offsets are supposed to be relative to the movi body, but
//! writers disagree; the first entry of every stream is checked against the
//! file and the whole stream is shifted when it does not line up.

use super::{parse_frame_id, IndexEntry, AVIIF_KEYFRAME};
use crate::diagnostics::{Diagnostics, Event};
use crate::riff::{ChunkReader, FourCc, Record};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Read, Seek};

/// Where a resolved index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum IndexSource {
    /// Parsed from an `idx1` chunk.
    Idx1,
    /// Reconstructed by scanning the movi list.
    Rebuilt,
}

/// Per-stream frame index. Entry position is the frame number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameIndex {
    tracks: BTreeMap<usize, Vec<IndexEntry>>,
}

impl FrameIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one stream; empty if the stream has none.
    pub fn track(&self, stream: usize) -> &[IndexEntry] {
        self.tracks.get(&stream).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entries of one stream, created empty on first access.
    pub fn track_mut(&mut self, stream: usize) -> &mut Vec<IndexEntry> {
        self.tracks.entry(stream).or_default()
    }

    /// Entry for a frame.
    pub fn get(&self, stream: usize, frame: u32) -> Option<&IndexEntry> {
        self.track(stream).get(frame as usize)
    }

    /// Number of frames indexed for a stream.
    pub fn frame_count(&self, stream: usize) -> u32 {
        self.track(stream).len() as u32
    }

    /// Total entries across all streams.
    pub fn len(&self) -> usize {
        self.tracks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Streams that have at least one entry.
    pub fn streams(&self) -> impl Iterator<Item = usize> + '_ {
        self.tracks
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(&stream, _)| stream)
    }

    fn push(&mut self, entry: IndexEntry) -> bool {
        match parse_frame_id(entry.chunk_id) {
            Some((stream, _)) => {
                self.track_mut(stream).push(entry);
                true
            }
            None => false,
        }
    }
}

/// Result of locating movi and resolving the index.
#[derive(Debug, Clone)]
pub struct ResolvedIndex {
    /// Absolute position of the first byte after the `movi` sub-type.
    pub movi_offset: u64,
    /// Content length of the movi list after the sub-type.
    pub movi_length: u32,
    pub index: FrameIndex,
    pub source: IndexSource,
}

/// Locate the top-level movi list and resolve the frame index.
pub fn resolve_index<R: Read + Seek>(
    reader: &mut ChunkReader<R>,
    diagnostics: &dyn Diagnostics,
) -> Result<ResolvedIndex> {
    let movi = loop {
        match reader.next_chunk()? {
            Some(chunk) if chunk.is_list_of(FourCc::MOVI) => break chunk,
            Some(chunk) => reader.skip(&chunk)?,
            None => {
                return Err(Error::UnexpectedEof {
                    expected: FourCc::MOVI,
                })
            }
        }
    };
    let movi_offset = reader.position()?;
    reader.skip(&movi)?;

    let idx1 = match reader.next_chunk()? {
        Some(chunk) if chunk.is(FourCc::IDX1) => Some(chunk),
        Some(chunk) => {
            reader.push_back(&chunk)?;
            None
        }
        None => None,
    };

    let (index, source) = match idx1 {
        Some(chunk) => {
            let count = chunk.length as usize / IndexEntry::SIZE;
            let raw = reader.read_bytes((count * IndexEntry::SIZE) as u64)?;
            let slack = chunk.file_length - raw.len() as u32;
            reader.skip_bytes(slack as u64)?;

            let mut index = FrameIndex::new();
            let mut entries = 0;
            for bytes in raw.chunks_exact(IndexEntry::SIZE) {
                let Some(entry) = IndexEntry::from_bytes(bytes) else {
                    continue;
                };
                if !entry.is_list() && index.push(entry) {
                    entries += 1;
                }
            }
            diagnostics.event(&Event::IndexParsed { entries, slack });

            repair_offsets(reader, &mut index, movi_offset, diagnostics)?;
            (index, IndexSource::Idx1)
        }
        None => {
            diagnostics.event(&Event::IndexMissing);
            let index = rebuild_index(reader, movi_offset, movi.length)?;
            diagnostics.event(&Event::IndexRebuilt {
                entries: index.len(),
            });
            (index, IndexSource::Rebuilt)
        }
    };

    Ok(ResolvedIndex {
        movi_offset,
        movi_length: movi.length,
        index,
        source,
    })
}

/// Scan the movi body and index every video frame chunk in file order.
///
/// Nested lists (`rec `) are entered rather than skipped so interleaved
/// records are indexed too.
fn rebuild_index<R: Read + Seek>(
    reader: &mut ChunkReader<R>,
    movi_offset: u64,
    movi_length: u32,
) -> Result<FrameIndex> {
    let end = movi_offset + movi_length as u64;
    let mut index = FrameIndex::new();

    reader.seek_to(movi_offset)?;
    while reader.position()? < end {
        let Some(chunk) = reader.next_chunk()? else {
            break;
        };
        if chunk.is_list() {
            continue;
        }

        let header_pos = reader.position()? - chunk.header_size as u64;
        index.push(IndexEntry {
            chunk_id: chunk.fourcc,
            flags: AVIIF_KEYFRAME,
            offset: (header_pos - movi_offset) as u32,
            size: chunk.length,
        });
        reader.skip(&chunk)?;
    }

    Ok(index)
}

/// Make every stream's offsets relative to the movi body.
///
/// Only the first entry of a stream is probed. Absolute offsets are the
/// usual culprit; offsets counted from the `movi` tag (4 bytes before the
/// body) are recognized as well.
fn repair_offsets<R: Read + Seek>(
    reader: &mut ChunkReader<R>,
    index: &mut FrameIndex,
    movi_offset: u64,
    diagnostics: &dyn Diagnostics,
) -> Result<()> {
    let streams: Vec<usize> = index.streams().collect();
    for stream in streams {
        let track = index.track_mut(stream);
        let first = track[0];
        let offset = first.offset as u64;

        if reader.fourcc_at(movi_offset + offset)? == Some(first.chunk_id) {
            continue;
        }

        let delta = if offset >= movi_offset
            && reader.fourcc_at(offset)? == Some(first.chunk_id)
        {
            movi_offset
        } else if offset >= 4 && reader.fourcc_at(movi_offset - 4 + offset)? == Some(first.chunk_id) {
            4
        } else {
            movi_offset
        };

        let shift = u32::try_from(delta).unwrap_or(u32::MAX);
        for entry in track.iter_mut() {
            entry.offset = entry.offset.saturating_sub(shift);
        }
        diagnostics.event(&Event::OffsetsRepaired {
            stream,
            chunk_id: first.chunk_id,
            delta,
        });
    }
    Ok(())
}
