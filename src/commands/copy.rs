use crate::config::OutputConfig;
use anyhow::{Context, Result};
use avikit_media::diagnostics::TracingDiagnostics;
use avikit_media::{AviInput, AviOutput};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// `FRAME:COUNT` - write source frame `FRAME` `COUNT` times instead of once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    pub frame: u32,
    pub count: u32,
}

impl FromStr for Repeat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (frame, count) = s
            .split_once(':')
            .ok_or_else(|| format!("expected FRAME:COUNT, got {s:?}"))?;
        let frame = frame
            .trim()
            .parse()
            .map_err(|_| format!("invalid frame number {frame:?}"))?;
        let count = count
            .trim()
            .parse()
            .map_err(|_| format!("invalid repeat count {count:?}"))?;
        Ok(Self { frame, count })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    pub frames_read: u32,
    pub frames_written: u32,
    pub max_bytes_per_sec: u32,
}

/// Re-mux one video stream of `input` into a new file at `output`.
///
/// The declared peak rate is at least the source's and the configured
/// floor. `stream` counts video streams only. Later repeats of the same frame
/// override earlier ones; a count of 0 drops the frame.
pub fn copy_stream<W: Write>(
    input: &Path,
    output: &Path,
    stream: usize,
    repeats: &[Repeat],
    config: &OutputConfig,
    out: &mut W,
) -> Result<CopyReport> {
    let file = File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let mut source = AviInput::with_diagnostics(BufReader::new(file), &TracingDiagnostics)
        .with_context(|| format!("Failed to parse {:?}", input))?;

    let Some(template) = source.video_streams().get(stream).cloned() else {
        anyhow::bail!(
            "{:?} has {} video stream(s); stream {} does not exist",
            input,
            source.video_streams().len(),
            stream
        );
    };
    let repeats: BTreeMap<u32, u32> = repeats.iter().map(|r| (r.frame, r.count)).collect();
    if let Some((frame, _)) = repeats.range(template.frame_count..).next() {
        tracing::warn!(
            "Repeat for frame {} ignored; the stream has {} frames",
            frame,
            template.frame_count
        );
    }

    let mut options = config.to_options(template.frame_rate, template.width, template.height);
    // never declare less than the source did
    let source_rate = Some(source.max_bytes_per_sec()).filter(|&rate| rate > 0);
    options.max_bytes_per_sec = options.max_bytes_per_sec.max(source_rate);
    let target = File::create(output).with_context(|| format!("Failed to create {:?}", output))?;
    let mut writer = AviOutput::with_diagnostics(
        BufWriter::new(target),
        options,
        Box::new(TracingDiagnostics),
    );
    let out_stream = writer.new_stream(&template)?;

    let mut frames_written = 0;
    for number in 0..template.frame_count {
        let frame = source
            .get_frame(template.index, number)?
            .with_context(|| format!("Frame {} listed in the index but not readable", number))?;
        let count = repeats.get(&number).copied().unwrap_or(1);
        for _ in 0..count {
            writer.write_frame(out_stream, &frame)?;
            frames_written += 1;
        }
    }
    writer
        .close()
        .with_context(|| format!("Failed to finalize {:?}", output))?;

    let written = AviInput::open(output)
        .with_context(|| format!("Failed to re-read {:?}", output))?;
    let report = CopyReport {
        frames_read: template.frame_count,
        frames_written,
        max_bytes_per_sec: written.max_bytes_per_sec(),
    };
    writeln!(
        out,
        "Copied {} frames to {} frames in {} (peak {} bytes/s)",
        report.frames_read,
        report.frames_written,
        output.display(),
        report.max_bytes_per_sec
    )?;
    Ok(report)
}
