//! # Level Inspector
//!
//! Decodes one level file and prints what it holds.
//!
//! ## Usage
//!
//! ```bash
//! level_inspect data/LEVEL2.TR2 --rooms
//! level_inspect demo/GYM.PHD --demo
//! level_inspect data/andrea1.trc --config strict.toml -v
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trlevel::inspect::{self, RoomReport, SummaryReport};
use trlevel::GameVersion;

#[derive(Parser)]
#[command(name = "level_inspect", about = "Decode a Tomb Raider level and summarise it")]
struct Args {
    /// Level file (.PHD, .TR2, .TR4, .TRC)
    file: PathBuf,
    /// Decoder config in TOML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Demo or expansion-pack layout (TR1/TR2)
    #[arg(long)]
    demo: bool,
    /// Skip detection and decode as this generation
    #[arg(long, value_enum)]
    format: Option<Format>,
    /// List every room
    #[arg(long)]
    rooms: bool,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Tr1,
    Tr2,
    Tr3,
    Tr4,
    Tr5,
}

impl From<Format> for GameVersion {
    fn from(format: Format) -> Self {
        match format {
            Format::Tr1 => Self::Tr1,
            Format::Tr2 => Self::Tr2,
            Format::Tr3 => Self::Tr3,
            Format::Tr4 => Self::Tr4,
            Format::Tr5 => Self::Tr5,
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = inspect::load_config(args.config.as_deref(), args.demo).context("loading decoder config")?;
    let level = inspect::load_level(&args.file, &config, args.format.map(GameVersion::from))
        .with_context(|| format!("decoding {}", args.file.display()))?;

    print!("{}", SummaryReport(&level));
    if args.rooms {
        println!();
        print!("{}", RoomReport(&level));
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose { EnvFilter::new("debug") } else { EnvFilter::from_default_env() };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
