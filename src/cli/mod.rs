use crate::config::{Settings, SettingsError};
use clap::Parser;
use std::path::PathBuf;

/// Drive the host sync test unit from a simulated host and print what it sees
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file (default: ./hostsyncrs.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Samples per processing cycle
    #[arg(long)]
    pub block_size: Option<u32>,

    /// Number of cycles to run
    #[arg(long)]
    pub cycles: Option<u32>,

    /// Host tempo
    #[arg(long)]
    pub bpm: Option<f64>,

    /// Host transport speed
    #[arg(long)]
    pub speed: Option<f32>,

    /// Send a transport position every N cycles (0 = never)
    #[arg(long)]
    pub position_interval: Option<u32>,

    /// Intra-cycle offset of transport position updates
    #[arg(long)]
    pub position_offset: Option<u32>,

    /// Inject a MIDI panic burst every N cycles (0 = never)
    #[arg(long)]
    pub panic_interval: Option<u32>,

    /// Output event buffer size in bytes
    #[arg(long)]
    pub output_capacity: Option<usize>,

    /// Show cycle progress
    #[arg(long)]
    pub progress: bool,

    /// Also log to the terminal
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not print diagnostic lines
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Command line values take precedence over file and environment.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(v) = self.sample_rate {
            settings.sample_rate = v;
        }
        if let Some(v) = self.block_size {
            settings.block_size = v;
        }
        if let Some(v) = self.cycles {
            settings.cycles = v;
        }
        if let Some(v) = self.bpm {
            settings.bpm = v;
        }
        if let Some(v) = self.speed {
            settings.speed = v;
        }
        if let Some(v) = self.position_interval {
            settings.position_interval = v;
        }
        if let Some(v) = self.position_offset {
            settings.position_offset = v;
        }
        if let Some(v) = self.panic_interval {
            settings.panic_interval = v;
        }
        if let Some(v) = self.output_capacity {
            settings.output_capacity = v;
        }
    }
}

pub fn load_settings(args: &Args) -> Result<Settings, SettingsError> {
    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}
