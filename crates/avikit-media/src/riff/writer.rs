//! Two-phase chunk emission.
//!
//! Chunks are opened with a zero-length placeholder header and closed once
//! their content is written, at which point the real length is patched in.
//! Fixed-size records can be reserved up front and rewritten later.

use super::{FourCc, Record};
use crate::Result;
use std::io::{self, Seek, SeekFrom, Write};
use std::marker::PhantomData;

/// A chunk whose header still carries a placeholder length.
#[derive(Debug)]
#[must_use = "an open chunk must be closed with ChunkWriter::end"]
pub struct OpenChunk {
    fourcc: FourCc,
    offset: u64,
}

impl OpenChunk {
    /// Chunk code.
    pub fn fourcc(&self) -> FourCc {
        self.fourcc
    }

    /// Absolute offset of the header's first byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Location of a record written as a placeholder, patchable later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructField<T> {
    offset: u64,
    _record: PhantomData<T>,
}

impl<T> StructField<T> {
    /// Absolute offset of the record's first byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Writes chunks to a seekable byte sink.
pub struct ChunkWriter<W> {
    inner: W,
}

impl<W: Write + Seek> ChunkWriter<W> {
    /// Wrap a seekable writer. Output starts at its current position.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Current absolute position.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Open a plain chunk.
    pub fn begin(&mut self, fourcc: FourCc) -> Result<OpenChunk> {
        let offset = self.position()?;
        self.inner.write_all(fourcc.as_bytes())?;
        self.inner.write_all(&0u32.to_le_bytes())?;
        Ok(OpenChunk { fourcc, offset })
    }

    /// Open a list chunk (`RIFF` or `LIST`) with the given sub-type.
    pub fn begin_list(&mut self, marker: FourCc, list_type: FourCc) -> Result<OpenChunk> {
        let chunk = self.begin(marker)?;
        self.inner.write_all(list_type.as_bytes())?;
        Ok(chunk)
    }

    /// Append raw bytes to the open chunk.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        Ok(())
    }

    /// Close a chunk: pad to even, patch the header, return to end of file.
    ///
    /// Returns the declared (unpadded) content length.
    pub fn end(&mut self, chunk: OpenChunk) -> Result<u32> {
        let end = self.position()?;
        let length = u32::try_from(end - chunk.offset - 8).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("chunk '{}' exceeds 4 GiB", chunk.fourcc),
            )
        })?;
        if length & 1 == 1 {
            self.inner.write_all(&[0])?;
        }
        self.inner.seek(SeekFrom::Start(chunk.offset + 4))?;
        self.inner.write_all(&length.to_le_bytes())?;
        self.inner.seek(SeekFrom::End(0))?;
        Ok(length)
    }

    /// Write a complete chunk in one call.
    pub fn write_chunk(&mut self, fourcc: FourCc, data: &[u8]) -> Result<u32> {
        let chunk = self.begin(fourcc)?;
        self.write(data)?;
        self.end(chunk)
    }

    /// Write a chunk holding a zeroed record and remember where it lives.
    pub fn reserve_record<T: Record>(&mut self, fourcc: FourCc) -> Result<StructField<T>> {
        let chunk = self.begin(fourcc)?;
        let offset = self.position()?;
        self.write(&vec![0u8; T::SIZE])?;
        self.end(chunk)?;
        Ok(StructField {
            offset,
            _record: PhantomData,
        })
    }

    /// Overwrite a reserved record in place, then return to end of file.
    pub fn update<T: Record>(&mut self, field: &StructField<T>, value: &T) -> Result<()> {
        self.inner.seek(SeekFrom::Start(field.offset))?;
        self.inner.write_all(&value.to_bytes())?;
        self.inner.seek(SeekFrom::End(0))?;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Buf, BufMut};
    use std::io::Cursor;

    #[derive(Debug, PartialEq)]
    struct Pair(u32, u32);

    impl Record for Pair {
        const SIZE: usize = 8;

        fn decode<B: Buf>(buf: &mut B) -> Self {
            Pair(buf.get_u32_le(), buf.get_u32_le())
        }

        fn encode<B: BufMut>(&self, buf: &mut B) {
            buf.put_u32_le(self.0);
            buf.put_u32_le(self.1);
        }
    }

    #[test]
    fn test_odd_chunk_is_padded_but_length_is_not() {
        let mut writer = ChunkWriter::new(Cursor::new(Vec::new()));
        let length = writer.write_chunk(FourCc(*b"00db"), &[1, 2, 3]).unwrap();
        assert_eq!(length, 3);

        let data = writer.into_inner().into_inner();
        assert_eq!(data.len(), 12);
        assert_eq!(&data[0..4], b"00db");
        assert_eq!(u32::from_le_bytes([data[4], data[5], data[6], data[7]]), 3);
        assert_eq!(data[11], 0);
    }

    #[test]
    fn test_list_length_includes_subtype() {
        let mut writer = ChunkWriter::new(Cursor::new(Vec::new()));
        let list = writer.begin_list(FourCc::LIST, FourCc::MOVI).unwrap();
        writer.write_chunk(FourCc(*b"00dc"), &[7; 4]).unwrap();
        assert_eq!(writer.end(list).unwrap(), 4 + 12);

        let data = writer.into_inner().into_inner();
        assert_eq!(data.len(), 12 + 12);
        assert_eq!(&data[8..12], b"movi");
    }

    #[test]
    fn test_reserved_record_backpatch() {
        let mut writer = ChunkWriter::new(Cursor::new(Vec::new()));
        let field: StructField<Pair> = writer.reserve_record(FourCc(*b"pair")).unwrap();
        writer.write_chunk(FourCc(*b"tail"), b"xy").unwrap();
        let end = writer.position().unwrap();

        writer.update(&field, &Pair(5, 6)).unwrap();
        assert_eq!(writer.position().unwrap(), end);

        let data = writer.into_inner().into_inner();
        assert_eq!(field.offset(), 8);
        assert_eq!(Pair::from_bytes(&data[8..16]), Some(Pair(5, 6)));
        assert_eq!(&data[16..20], b"tail");
    }
}
