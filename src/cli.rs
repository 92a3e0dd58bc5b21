use avikit::commands::Repeat;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "avikit")]
#[command(author, version, about = "Inspect, repair, extract from, and re-mux AVI files")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show headers, streams, and index status
    Probe {
        /// AVI file to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the chunk tree of a RIFF file
    Dump {
        /// File to dump
        #[arg(required = true)]
        file: PathBuf,

        /// Deepest list level to descend into
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Re-mux one video stream into a new AVI with a fresh index
    Copy {
        /// Source AVI
        input: PathBuf,

        /// Destination AVI (overwritten)
        output: PathBuf,

        /// Video stream to copy, counting video streams only
        #[arg(short, long, default_value = "0")]
        stream: usize,

        /// Repeat a frame: FRAME:COUNT (0 drops it); may be given several times
        #[arg(short, long, value_name = "FRAME:COUNT")]
        repeat: Vec<Repeat>,
    },

    /// Extract the raw payload of one frame
    #[command(group(ArgGroup::new("position").required(true).args(["number", "timecode"])))]
    Frame {
        /// Source AVI
        file: PathBuf,

        /// Frame number
        #[arg(short, long)]
        number: Option<u32>,

        /// Timecode (hh:mm:ss:ff, ';' before frames means drop-frame)
        #[arg(short, long, allow_hyphen_values = true)]
        timecode: Option<String>,

        /// Video stream, counting video streams only
        #[arg(short, long, default_value = "0")]
        stream: usize,

        /// Force drop-frame counting
        #[arg(long)]
        drop_frame: bool,

        /// File to write the payload to
        #[arg(short, long)]
        output: PathBuf,
    },
}
