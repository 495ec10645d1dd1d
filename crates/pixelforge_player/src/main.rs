// SPDX-License-Identifier: MIT OR Apache-2.0
//! `PixelForge` player - headless tool for tile reels and canvas animations.
//!
//! Loads `.pxpr` reels or `.ron` canvas animations and:
//! - prints a JSON summary
//! - simulates playback on a manual clock
//! - exports frames to PNG

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::{Input, SimulateOptions};
use error::PlayerResult;
use pixelforge_timeline::config::SETTINGS_FILE_NAME;
use pixelforge_timeline::TimelineSettings;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "pixelforge", version, about = "Inspect, simulate and export PixelForge animations")]
struct Cli {
    /// Timeline settings file (RON)
    #[arg(long, global = true, default_value = SETTINGS_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a JSON summary of a reel or animation.
    Inspect {
        /// Input `.pxpr` reel or `.ron` animation.
        input: PathBuf,
    },
    /// Run playback on a simulated clock and print each frame change.
    Simulate(SimulateArgs),
    /// Write frames to PNG files.
    ExportFrames {
        /// Input `.pxpr` reel or `.ron` animation.
        input: PathBuf,

        /// Output directory.
        #[arg(long)]
        out: PathBuf,

        /// Export only this frame (0-based).
        #[arg(long)]
        frame: Option<usize>,
    },
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input `.pxpr` reel or `.ron` animation.
    input: PathBuf,

    /// Simulated time in milliseconds; defaults to one pass over all frames.
    #[arg(long)]
    duration_ms: Option<f64>,

    /// Clock step per tick; defaults to the configured tick interval.
    #[arg(long)]
    tick_ms: Option<f64>,

    /// Force ping-pong playback on or off.
    #[arg(long)]
    ping_pong: Option<bool>,

    /// Force looping on or off.
    #[arg(long)]
    looping: Option<bool>,

    /// Print JSON instead of one line per frame.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pixelforge=info,pixelforge_timeline=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> PlayerResult<()> {
    let settings = TimelineSettings::load_or_default(&cli.config)?;

    match cli.cmd {
        Command::Inspect { input } => {
            let input = Input::load(&input)?;
            println!("{}", commands::inspect(&input)?);
        }
        Command::Simulate(args) => {
            let input = Input::load(&args.input)?;
            let options = SimulateOptions {
                duration_ms: args.duration_ms.unwrap_or_else(|| commands::one_cycle_ms(&input)),
                tick_ms: args.tick_ms.unwrap_or(settings.tick_interval_ms as f64),
                ping_pong: args.ping_pong,
                looping: args.looping,
            };
            let frames = commands::simulate(input, options, &settings)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&frames)?);
            } else {
                for f in &frames {
                    println!("{:>10.1} ms  frame {}", f.time_ms, f.frame);
                }
            }
        }
        Command::ExportFrames { input, out, frame } => {
            let input = Input::load(&input)?;
            for path in commands::export_frames(&input, &out, frame, &settings)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
