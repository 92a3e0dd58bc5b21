use anyhow::{Context, Result};
use avikit_media::riff::ChunkReader;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

/// Print the chunk tree of any RIFF file, one chunk per line.
///
/// `JUNK` padding is not shown. Lists are descended into; a `max_depth` of
/// `Some(0)` prints only the top level.
pub fn dump_chunks<W: Write>(path: &Path, max_depth: Option<usize>, out: &mut W) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut reader = ChunkReader::new(BufReader::new(file));
    dump_level(&mut reader, out, u64::MAX, 0, max_depth)
        .with_context(|| format!("Failed to walk chunks of {:?}", path))
}

fn dump_level<R: Read + Seek, W: Write>(
    reader: &mut ChunkReader<R>,
    out: &mut W,
    end: u64,
    depth: usize,
    max_depth: Option<usize>,
) -> Result<()> {
    let indent = depth * 2;
    while reader.position()? < end {
        let Some(chunk) = reader.next_chunk()? else {
            break;
        };
        let offset = reader.position()? - chunk.header_size as u64;

        match chunk.list_type {
            Some(list_type) => {
                writeln!(
                    out,
                    "{:indent$}{} '{}' {} bytes @ {}",
                    "", chunk.fourcc, list_type, chunk.length, offset
                )?;
                let body_end = reader.position()? + chunk.file_length as u64;
                if max_depth.map_or(true, |max| depth < max) {
                    dump_level(reader, out, body_end, depth + 1, max_depth)?;
                }
                reader.seek_to(body_end)?;
            }
            None => {
                writeln!(
                    out,
                    "{:indent$}{} {} bytes @ {}",
                    "", chunk.fourcc, chunk.length, offset
                )?;
                reader.skip(&chunk)?;
            }
        }
    }
    Ok(())
}
