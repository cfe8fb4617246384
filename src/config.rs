// config.rs

use config::{Config, Environment, File};
use log::debug;
use std::path::Path;
use thiserror::Error;

/// Debounce window after an accepted trigger, in seconds.
pub const HOLDOFF_SECONDS: f64 = 0.25;
/// Note number of the emitted trigger notes (E4).
pub const TRIGGER_NOTE: u8 = 0x40;
pub const TRIGGER_VELOCITY: u8 = 0x7F;

/// Base name of the optional settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hostsyncrs";
pub const ENV_PREFIX: &str = "HOSTSYNC";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings for the simulated host session.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub sample_rate: f64,
    pub block_size: u32,
    pub cycles: u32,
    pub bpm: f64,
    pub beats_per_bar: f32,
    pub beat_unit: i32,
    pub speed: f32,
    /// One rising edge in the test signal every this many beats.
    pub pulse_interval_beats: f64,
    /// Send a position update every N cycles; 0 never sends one.
    pub position_interval: u32,
    /// Intra-cycle offset at which position updates are delivered.
    pub position_offset: u32,
    /// Inject a MIDI panic burst every N cycles; 0 disables it.
    pub panic_interval: u32,
    /// Output sequence capacity in bytes.
    pub output_capacity: usize,
    /// Diagnostic channel depth.
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            block_size: 512,
            cycles: 400,
            bpm: 120.0,
            beats_per_bar: 4.0,
            beat_unit: 4,
            speed: 1.0,
            pulse_interval_beats: 1.0,
            position_interval: 1,
            position_offset: 0,
            panic_interval: 0,
            output_capacity: 8192,
            channel_capacity: 1024,
        }
    }
}

impl Settings {
    /// Loads defaults, then the settings file, then `HOSTSYNC_*` variables.
    ///
    /// With `path` the file must exist; without it `./hostsyncrs.{toml,json,..}`
    /// is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let d = Settings::default();
        let builder = Config::builder()
            .set_default("sample_rate", d.sample_rate)?
            .set_default("block_size", i64::from(d.block_size))?
            .set_default("cycles", i64::from(d.cycles))?
            .set_default("bpm", d.bpm)?
            .set_default("beats_per_bar", f64::from(d.beats_per_bar))?
            .set_default("beat_unit", i64::from(d.beat_unit))?
            .set_default("speed", f64::from(d.speed))?
            .set_default("pulse_interval_beats", d.pulse_interval_beats)?
            .set_default("position_interval", i64::from(d.position_interval))?
            .set_default("position_offset", i64::from(d.position_offset))?
            .set_default("panic_interval", i64::from(d.panic_interval))?
            .set_default("output_capacity", d.output_capacity as i64)?
            .set_default("channel_capacity", d.channel_capacity as i64)?;

        let builder = match path {
            Some(p) => {
                debug!("Loading settings from {}", p.display());
                builder.add_source(File::from(p).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let cfg = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let settings = Settings {
            sample_rate: cfg.get_float("sample_rate")?,
            block_size: get_u32(&cfg, "block_size")?,
            cycles: get_u32(&cfg, "cycles")?,
            bpm: cfg.get_float("bpm")?,
            beats_per_bar: cfg.get_float("beats_per_bar")? as f32,
            beat_unit: i32::try_from(cfg.get_int("beat_unit")?).map_err(|e| {
                SettingsError::Invalid {
                    key: "beat_unit",
                    reason: e.to_string(),
                }
            })?,
            speed: cfg.get_float("speed")? as f32,
            pulse_interval_beats: cfg.get_float("pulse_interval_beats")?,
            position_interval: get_u32(&cfg, "position_interval")?,
            position_offset: get_u32(&cfg, "position_offset")?,
            panic_interval: get_u32(&cfg, "panic_interval")?,
            output_capacity: get_u32(&cfg, "output_capacity")? as usize,
            channel_capacity: get_u32(&cfg, "channel_capacity")? as usize,
        };
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(invalid("sample_rate", "must be a positive number"));
        }
        if self.block_size == 0 {
            return Err(invalid("block_size", "must be at least 1"));
        }
        if self.output_capacity == 0 {
            return Err(invalid("output_capacity", "must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(invalid("channel_capacity", "must be at least 1"));
        }
        if !self.bpm.is_finite() || self.bpm < 0.0 {
            return Err(invalid("bpm", "must be zero or positive"));
        }
        if !self.speed.is_finite() {
            return Err(invalid("speed", "must be finite"));
        }
        if !(self.beats_per_bar.is_finite() && self.beats_per_bar > 0.0) {
            return Err(invalid("beats_per_bar", "must be positive"));
        }
        Ok(())
    }
}

fn get_u32(cfg: &Config, key: &'static str) -> Result<u32, SettingsError> {
    let value = cfg.get_int(key)?;
    u32::try_from(value).map_err(|_| invalid(key, &format!("{} is out of range", value)))
}

fn invalid(key: &'static str, reason: &str) -> SettingsError {
    SettingsError::Invalid {
        key,
        reason: reason.to_string(),
    }
}
