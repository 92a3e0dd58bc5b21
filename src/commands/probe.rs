use anyhow::{Context, Result};
use avikit_media::avi::{AviInput, IndexSource, MainHeader, VideoStream};
use avikit_media::diagnostics::TracingDiagnostics;
use avikit_media::FourCc;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Everything `probe` reports about a file.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub file: PathBuf,
    pub main_header: MainHeader,
    pub streams: Vec<StreamSummary>,
    pub video_streams: Vec<VideoStream>,
    pub index: IndexSummary,
}

#[derive(Debug, Serialize)]
pub struct StreamSummary {
    pub index: usize,
    pub kind: FourCc,
    pub handler: FourCc,
    /// Length declared in the stream header, in the stream's units.
    pub length: u32,
    pub name: Option<String>,
    pub codec_data_len: usize,
}

#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub source: IndexSource,
    pub entries: usize,
    pub movi_offset: u64,
}

impl ProbeReport {
    pub fn from_input<R: Read + Seek>(file: &Path, input: &AviInput<R>) -> Self {
        let streams = input
            .streams()
            .iter()
            .enumerate()
            .map(|(index, info)| StreamSummary {
                index,
                kind: info.header.fcc_type,
                handler: info.header.fcc_handler,
                length: info.header.length,
                name: info.name.clone(),
                codec_data_len: info.codec_data.as_ref().map_or(0, Vec::len),
            })
            .collect();

        Self {
            file: file.to_path_buf(),
            main_header: *input.main_header(),
            streams,
            video_streams: input.video_streams().to_vec(),
            index: IndexSummary {
                source: input.index_source(),
                entries: input.index().len(),
                movi_offset: input.movi_offset(),
            },
        }
    }

    fn write_text<W: Write>(&self, out: &mut W) -> Result<()> {
        let main = &self.main_header;
        writeln!(out, "File: {}", self.file.display())?;
        writeln!(out, "Size: {}x{}", main.width, main.height)?;
        writeln!(
            out,
            "Frames: {} ({} us/frame)",
            main.total_frames, main.micro_sec_per_frame
        )?;
        writeln!(out, "Max data rate: {} bytes/s", main.max_bytes_per_sec)?;
        writeln!(out, "Flags: {:#x}", main.flags)?;

        writeln!(out, "\nStreams: {}", self.streams.len())?;
        for stream in &self.streams {
            write!(
                out,
                "  [{}] {} '{}', length {}",
                stream.index, stream.kind, stream.handler, stream.length
            )?;
            if let Some(name) = &stream.name {
                write!(out, " \"{}\"", name)?;
            }
            if stream.codec_data_len > 0 {
                write!(out, ", {} bytes codec data", stream.codec_data_len)?;
            }
            writeln!(out)?;

            if let Some(video) = self.video_streams.iter().find(|v| v.index == stream.index) {
                writeln!(
                    out,
                    "      {}x{}, {} bit, {:.3} fps, {} frames, compression '{}'",
                    video.width,
                    video.height,
                    video.bit_depth,
                    video.frame_rate,
                    video.frame_count,
                    video.compression
                )?;
            }
        }

        let source = match self.index.source {
            IndexSource::Idx1 => "idx1",
            IndexSource::Rebuilt => "rebuilt from movi",
        };
        writeln!(
            out,
            "\nIndex: {}, {} entries, movi at {}",
            source, self.index.entries, self.index.movi_offset
        )?;
        Ok(())
    }
}

/// Parse `path` and print its headers, streams, and index status.
pub fn probe_file<W: Write>(path: &Path, json: bool, out: &mut W) -> Result<ProbeReport> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let input = AviInput::with_diagnostics(BufReader::new(file), &TracingDiagnostics)
        .with_context(|| format!("Failed to parse {:?}", path))?;
    let report = ProbeReport::from_input(path, &input);

    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        report.write_text(out)?;
    }
    Ok(report)
}
