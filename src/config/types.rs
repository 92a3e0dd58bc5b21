use avikit_media::avi::{AVIF_HASINDEX, AVIF_ISINTERLEAVED};
use avikit_media::OutputOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub timecode: TimecodeConfig,
}

/// Settings applied to every AVI written by `copy`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Frames sampled before the peak data rate is tracked (default: 8)
    #[serde(default = "default_warmup_frames")]
    pub warmup_frames: usize,

    /// Floor for the declared peak data rate
    #[serde(default)]
    pub max_bytes_per_sec: Option<u32>,

    /// Main header flags; defaults to HASINDEX | ISINTERLEAVED
    #[serde(default = "default_flags")]
    pub flags: u32,
}

fn default_warmup_frames() -> usize {
    8
}

fn default_flags() -> u32 {
    AVIF_HASINDEX | AVIF_ISINTERLEAVED
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            warmup_frames: default_warmup_frames(),
            max_bytes_per_sec: None,
            flags: default_flags(),
        }
    }
}

impl OutputConfig {
    /// Writer options for a file at the given rate and geometry.
    pub fn to_options(&self, frame_rate: f64, width: u32, height: u32) -> OutputOptions {
        OutputOptions {
            frame_rate,
            width,
            height,
            max_bytes_per_sec: self.max_bytes_per_sec,
            warmup_frames: self.warmup_frames,
            flags: self.flags,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TimecodeConfig {
    /// Force drop-frame counting on or off; unset detects it from the separator
    #[serde(default)]
    pub force_drop_frame: Option<bool>,
}
