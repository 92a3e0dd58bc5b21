use anyhow::{Context, Result};
use avikit_media::diagnostics::TracingDiagnostics;
use avikit_media::{AviInput, FrameSource};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// How the frame to extract is addressed.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePosition {
    Number(u32),
    /// Timecode plus an optional forced drop-frame mode.
    Timecode(String, Option<bool>),
}

/// Write the raw payload of one frame to `output`.
///
/// Returns the frame number that was extracted.
pub fn extract_frame<W: Write>(
    input: &Path,
    stream: usize,
    position: &FramePosition,
    output: &Path,
    out: &mut W,
) -> Result<u32> {
    let file = File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let mut avi = AviInput::with_diagnostics(BufReader::new(file), &TracingDiagnostics)
        .with_context(|| format!("Failed to parse {:?}", input))?;
    let streams = avi.video_streams().len();
    let Some(mut video) = avi.video(stream) else {
        anyhow::bail!(
            "{:?} has {} video stream(s); stream {} does not exist",
            input,
            streams,
            stream
        );
    };
    let frame_count = video.stream().frame_count;

    let frame = match position {
        FramePosition::Number(n) => video.get_frame(*n)?,
        FramePosition::Timecode(tc, drop_frame) => video.frame_at_timecode(tc, *drop_frame)?,
    };
    let Some(frame) = frame else {
        anyhow::bail!(
            "{} is outside the stream ({} frames)",
            describe(position),
            frame_count
        );
    };

    std::fs::write(output, &frame.data)
        .with_context(|| format!("Failed to write {:?}", output))?;
    writeln!(
        out,
        "Frame {} ({}, {} bytes{}) written to {}",
        frame.number,
        frame.frame_type,
        frame.data.len(),
        if frame.is_keyframe() { ", key frame" } else { "" },
        output.display()
    )?;
    Ok(frame.number)
}

fn describe(position: &FramePosition) -> String {
    match position {
        FramePosition::Number(n) => format!("Frame {}", n),
        FramePosition::Timecode(tc, _) => format!("Timecode {}", tc),
    }
}
