mod cli;

use avikit::commands::{self, FramePosition};
use avikit::config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "avikit=debug,avikit_media=debug".to_string()
        } else {
            "avikit=info,avikit_media=warn".to_string()
        }
    });

    // Logs go to stderr so reports on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Probe { file, json } => {
            commands::probe_file(&file, json, &mut stdout)?;
        }
        Commands::Dump { file, max_depth } => {
            commands::dump_chunks(&file, max_depth, &mut stdout)?;
        }
        Commands::Copy {
            input,
            output,
            stream,
            repeat,
        } => {
            commands::copy_stream(&input, &output, stream, &repeat, &config.output, &mut stdout)?;
        }
        Commands::Frame {
            file,
            number,
            timecode,
            stream,
            drop_frame,
            output,
        } => {
            let position = match (number, timecode) {
                (Some(n), _) => FramePosition::Number(n),
                (None, Some(tc)) => {
                    let drop_frame = drop_frame.then_some(true).or(config.timecode.force_drop_frame);
                    FramePosition::Timecode(tc, drop_frame)
                }
                (None, None) => anyhow::bail!("Either --number or --timecode is required"),
            };
            commands::extract_frame(&file, stream, &position, &output, &mut stdout)?;
        }
    }

    Ok(())
}
