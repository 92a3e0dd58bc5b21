//! Chunk tokenizer with one-token push-back.

use super::{padded_len, Chunk, FourCc, Record};
use crate::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Reads chunk headers from a seekable byte stream.
///
/// `JUNK` padding chunks are consumed transparently and never returned.
pub struct ChunkReader<R> {
    inner: R,
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Wrap a seekable reader. Reading starts at its current position.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current absolute position.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute position.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Read the next chunk header.
    ///
    /// Returns `Ok(None)` when the stream ends exactly at a chunk boundary.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        loop {
            let mut header = [0u8; 8];
            let n = self.fill(&mut header)?;
            if n == 0 {
                return Ok(None);
            }
            if n < header.len() {
                return Err(Error::TruncatedHeader { have: n });
            }

            let fourcc = FourCc([header[0], header[1], header[2], header[3]]);
            let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if fourcc == FourCc::JUNK {
                self.inner.seek(SeekFrom::Current(padded_len(length) as i64))?;
                continue;
            }

            if fourcc.is_list_marker() {
                let mut list_type = [0u8; 4];
                let n = self.fill(&mut list_type)?;
                if n < list_type.len() || length < 4 {
                    return Err(Error::TruncatedHeader { have: 8 + n });
                }
                return Ok(Some(Chunk {
                    fourcc,
                    list_type: Some(FourCc(list_type)),
                    length: length - 4,
                    file_length: padded_len(length) - 4,
                    header_size: 12,
                }));
            }

            return Ok(Some(Chunk {
                fourcc,
                list_type: None,
                length,
                file_length: padded_len(length),
                header_size: 8,
            }));
        }
    }

    /// Skip a chunk's padded body from the current position.
    pub fn skip(&mut self, chunk: &Chunk) -> Result<()> {
        self.inner
            .seek(SeekFrom::Current(chunk.file_length as i64))?;
        Ok(())
    }

    /// Rewind over a header just returned by [`next_chunk`](Self::next_chunk).
    pub fn push_back(&mut self, chunk: &Chunk) -> Result<()> {
        self.inner
            .seek(SeekFrom::Current(-(chunk.header_size as i64)))?;
        Ok(())
    }

    /// Advance by `count` bytes.
    pub fn skip_bytes(&mut self, count: u64) -> Result<()> {
        if count > 0 {
            self.inner.seek(SeekFrom::Current(count as i64))?;
        }
        Ok(())
    }

    /// Read a chunk that must be a plain chunk with the given code.
    pub fn expect_chunk(&mut self, fourcc: FourCc) -> Result<Chunk> {
        match self.next_chunk()? {
            Some(chunk) if chunk.is(fourcc) => Ok(chunk),
            Some(chunk) => Err(Error::UnexpectedChunk {
                expected: fourcc,
                found: chunk.fourcc,
            }),
            None => Err(Error::UnexpectedEof { expected: fourcc }),
        }
    }

    /// Read a chunk that must be a list with the given marker and sub-type.
    pub fn expect_list(&mut self, marker: FourCc, list_type: FourCc) -> Result<Chunk> {
        match self.next_chunk()? {
            Some(chunk) if chunk.fourcc == marker && chunk.is_list_of(list_type) => Ok(chunk),
            Some(chunk) => Err(Error::unexpected_list(
                list_type,
                chunk.fourcc,
                chunk.list_type,
            )),
            None => Err(Error::UnexpectedEof {
                expected: list_type,
            }),
        }
    }

    /// Read a chunk's content and step over its pad byte.
    pub fn read_payload(&mut self, chunk: &Chunk) -> Result<Vec<u8>> {
        let data = self.read_bytes(chunk.length as u64).map_err(|e| {
            if e.is_eof() {
                Error::UnexpectedEof {
                    expected: chunk.fourcc,
                }
            } else {
                e
            }
        })?;
        let pad = chunk.file_length - chunk.length;
        if pad > 0 {
            self.inner.seek(SeekFrom::Current(pad as i64))?;
        }
        Ok(data)
    }

    /// Decode a fixed-size record from a chunk and skip any trailing slack.
    pub fn read_record<T: Record>(&mut self, chunk: &Chunk) -> Result<T> {
        if (chunk.length as usize) < T::SIZE {
            return Err(Error::ChunkTooSmall {
                fourcc: chunk.fourcc,
                need: T::SIZE,
                have: chunk.length,
            });
        }
        let mut data = vec![0u8; T::SIZE];
        self.inner.read_exact(&mut data)?;
        let slack = chunk.file_length as usize - T::SIZE;
        if slack > 0 {
            self.inner.seek(SeekFrom::Current(slack as i64))?;
        }
        let mut buf = data.as_slice();
        Ok(T::decode(&mut buf))
    }

    /// Read `len` bytes at the current position.
    ///
    /// Allocation follows what is actually read, so a corrupt length cannot
    /// reserve more memory than the stream holds.
    pub fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        (&mut self.inner).take(len).read_to_end(&mut data)?;
        if (data.len() as u64) < len {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        Ok(data)
    }

    /// Read exactly `buf.len()` bytes at the current position.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf)?;
        Ok(())
    }

    /// Peek the fourcc stored at an absolute position, leaving the cursor
    /// where it was. `None` if fewer than 4 bytes are available.
    pub fn fourcc_at(&mut self, pos: u64) -> Result<Option<FourCc>> {
        let saved = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(pos))?;
        let mut id = [0u8; 4];
        let n = self.fill(&mut id)?;
        self.inner.seek(SeekFrom::Start(saved))?;
        Ok((n == id.len()).then_some(FourCc(id)))
    }

    /// Read until `buf` is full or the stream ends; returns bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunk_bytes(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(fourcc);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn list_bytes(marker: &[u8; 4], list_type: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(marker);
        out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
        out.extend_from_slice(list_type);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_plain_chunk_lengths() {
        let data = chunk_bytes(b"abcd", &[1, 2, 3]);
        let mut reader = ChunkReader::new(Cursor::new(data));

        let chunk = reader.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.fourcc, FourCc(*b"abcd"));
        assert_eq!(chunk.length, 3);
        assert_eq!(chunk.file_length, 4);
        assert_eq!(chunk.header_size, 8);
        assert!(!chunk.is_list());

        reader.skip(&chunk).unwrap();
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_list_chunk_reports_remaining_payload() {
        let inner = chunk_bytes(b"avih", &[0; 10]);
        let data = list_bytes(b"LIST", b"hdrl", &inner);
        let mut reader = ChunkReader::new(Cursor::new(data));

        let chunk = reader.next_chunk().unwrap().unwrap();
        assert!(chunk.is_list_of(FourCc::HDRL));
        assert_eq!(chunk.length, inner.len() as u32);
        assert_eq!(chunk.file_length, inner.len() as u32);
        assert_eq!(chunk.header_size, 12);

        let child = reader.next_chunk().unwrap().unwrap();
        assert!(child.is(FourCc::AVIH));
    }

    #[test]
    fn test_junk_is_invisible() {
        let mut data = chunk_bytes(b"JUNK", &[0xAA; 5]);
        data.extend(chunk_bytes(b"strn", b"hi\0"));
        let mut reader = ChunkReader::new(Cursor::new(data));

        let chunk = reader.next_chunk().unwrap().unwrap();
        assert!(chunk.is(FourCc::STRN));
        assert_eq!(reader.read_payload(&chunk).unwrap(), b"hi\0");
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_push_back_replays_header() {
        let data = list_bytes(b"LIST", b"movi", &chunk_bytes(b"00dc", &[9]));
        let mut reader = ChunkReader::new(Cursor::new(data));

        let first = reader.next_chunk().unwrap().unwrap();
        reader.push_back(&first).unwrap();
        assert_eq!(reader.position().unwrap(), 0);

        let again = reader.next_chunk().unwrap().unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_truncated_header() {
        let mut reader = ChunkReader::new(Cursor::new(vec![b'a', b'b', b'c']));
        let err = reader.next_chunk().unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { have: 3 }));
        assert!(err.is_eof());
    }

    #[test]
    fn test_expect_chunk_mismatch() {
        let data = chunk_bytes(b"strf", &[0; 4]);
        let mut reader = ChunkReader::new(Cursor::new(data));
        match reader.expect_chunk(FourCc::STRH) {
            Err(Error::UnexpectedChunk { expected, found }) => {
                assert_eq!(expected, FourCc::STRH);
                assert_eq!(found, FourCc::STRF);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_expect_list_at_eof() {
        let mut reader = ChunkReader::new(Cursor::new(Vec::new()));
        let err = reader.expect_list(FourCc::RIFF, FourCc::AVI).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { expected } if expected == FourCc::AVI));
    }

    #[test]
    fn test_fourcc_at_restores_position() {
        let data = chunk_bytes(b"00db", &[1, 2, 3, 4]);
        let mut reader = ChunkReader::new(Cursor::new(data));
        assert_eq!(reader.fourcc_at(0).unwrap(), Some(FourCc(*b"00db")));
        assert_eq!(reader.fourcc_at(10).unwrap(), None);
        assert_eq!(reader.position().unwrap(), 0);
    }
}
