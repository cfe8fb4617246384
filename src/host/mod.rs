//! A minimal plugin host for exercising the unit without a DAW.
//!
//! The host keeps its own transport, renders a pulse train locked to it, sends
//! `time:Position` snapshots and the occasional MIDI panic burst, and counts
//! the events the unit writes back. Keeping the events themselves is opt-in.

mod signal;

pub use signal::PulseTrain;

use crate::atom::InputEvent;
use crate::config::{Settings, SettingsError};
use crate::diagnostics::DiagnosticSink;
use crate::midi::{MidiMessage, OutputSequence, CC_ALL_NOTES_OFF, CC_RESET_ALL_CONTROLLERS, CC_SUSTAIN};
use crate::plugin::{AudioPorts, Features, HostSyncTest, InstantiateError};
use crate::transport::HostUpdate;
use crate::urid::{HashUridMap, Uris};
use chrono::{DateTime, Local};
use log::{debug, info};
use std::fmt;
use thiserror::Error;

/// Channel volume, sent alongside panic bursts so the filter has something
/// to let through.
const VOLUME_CC: [u8; 3] = [0xB0, 0x07, 100];

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Instantiate(#[from] InstantiateError),
}

/// An output event placed on the host's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedEvent {
    pub cycle: u64,
    pub offset: u32,
    /// Host transport frame of the event.
    pub sample: i64,
    pub message: MidiMessage,
}

#[derive(Debug, Clone)]
pub struct HostReport {
    pub started_at: DateTime<Local>,
    pub cycles: u64,
    pub note_ons: u64,
    pub note_offs: u64,
    pub dropped_emissions: u64,
    pub rejected_positions: u64,
    /// Largest difference between the unit's anchor and the host transport at
    /// the start of a cycle.
    pub max_drift: i64,
    /// Every emitted event, when the host was asked to record them.
    pub events: Vec<EmittedEvent>,
}

impl HostReport {
    fn new() -> Self {
        Self {
            started_at: Local::now(),
            cycles: 0,
            note_ons: 0,
            note_offs: 0,
            dropped_emissions: 0,
            rejected_positions: 0,
            max_drift: 0,
            events: Vec::new(),
        }
    }
}

impl fmt::Display for HostReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Session started {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "  cycles:            {}", self.cycles)?;
        writeln!(f, "  note-on:           {}", self.note_ons)?;
        writeln!(f, "  note-off:          {}", self.note_offs)?;
        writeln!(f, "  dropped emissions: {}", self.dropped_emissions)?;
        writeln!(f, "  rejected updates:  {}", self.rejected_positions)?;
        write!(f, "  max anchor drift:  {} samples", self.max_drift)
    }
}

/// Builds the update a host at `frame` would send.
pub fn position_at(frame: i64, settings: &Settings) -> HostUpdate {
    let beats = frame as f64 * settings.bpm / (60.0 * settings.sample_rate);
    let beats_per_bar = f64::from(settings.beats_per_bar);
    let bar = (beats / beats_per_bar).floor();
    HostUpdate {
        bar: bar as i64,
        bar_beat: beats - bar * beats_per_bar,
        beats_per_bar: settings.beats_per_bar,
        beat_unit: settings.beat_unit,
        bpm: settings.bpm as f32,
        speed: settings.speed,
        frame,
    }
}

pub struct SimulatedHost {
    settings: Settings,
    uris: Uris,
    unit: HostSyncTest,
    signal: Option<PulseTrain>,
    frame: i64,
    cycle: u64,
    events: Vec<InputEvent>,
    audio_in: Vec<f32>,
    audio_out: Vec<f32>,
    output: OutputSequence,
    cycle_events: Vec<EmittedEvent>,
    record_events: bool,
    report: HostReport,
}

impl SimulatedHost {
    /// Validates `settings` and instantiates the unit. Without `sink` its
    /// diagnostics go to the `log` crate.
    pub fn new(
        settings: Settings,
        sink: Option<Box<dyn DiagnosticSink>>,
    ) -> Result<Self, HostError> {
        settings.validate()?;
        let urid_map = HashUridMap::new();
        let mut features = Features::new().with_urid_map(&urid_map);
        if let Some(sink) = sink {
            features = features.with_log(sink);
        }
        let unit = HostSyncTest::instantiate(settings.sample_rate, features)?;
        let uris = Uris::new(&urid_map);

        let n = settings.block_size as usize;
        let signal = PulseTrain::new(
            settings.bpm,
            settings.pulse_interval_beats,
            settings.sample_rate,
        );
        info!(
            "Simulated host: {} Hz, {} samples/cycle, {} bpm, pulse period {:?}",
            settings.sample_rate,
            settings.block_size,
            settings.bpm,
            signal.map(|s| s.period())
        );

        Ok(Self {
            output: OutputSequence::with_capacity(settings.output_capacity),
            settings,
            uris,
            unit,
            signal,
            frame: 0,
            cycle: 0,
            events: Vec::with_capacity(8),
            audio_in: vec![0.0; n],
            audio_out: vec![0.0; n],
            cycle_events: Vec::with_capacity(8),
            record_events: false,
            report: HostReport::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Keep every emitted event in [`HostReport::events`].
    pub fn record_events(mut self, record: bool) -> Self {
        self.record_events = record;
        self
    }

    pub fn unit(&self) -> &HostSyncTest {
        &self.unit
    }

    /// Host transport frame at the start of the next cycle.
    pub fn frame(&self) -> i64 {
        self.frame
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn report(&self) -> &HostReport {
        &self.report
    }

    pub fn into_report(self) -> HostReport {
        self.report
    }

    /// Events the unit wrote during the last cycle.
    pub fn last_output(&self) -> &OutputSequence {
        &self.output
    }

    fn every(&self, interval: u32) -> bool {
        interval > 0 && self.cycle % u64::from(interval) == 0
    }

    fn advance(&self, samples: u32) -> i64 {
        (self.settings.speed * samples as f32).floor() as i64
    }

    fn prepare_events(&mut self) {
        self.events.clear();
        let n = self.settings.block_size;

        if self.every(self.settings.panic_interval) {
            for controller in [CC_ALL_NOTES_OFF, CC_RESET_ALL_CONTROLLERS, CC_SUSTAIN] {
                self.events
                    .push(InputEvent::midi(0, &[0xB0, controller, 0]));
            }
            self.events.push(InputEvent::midi(0, &VOLUME_CC));
        }

        if self.every(self.settings.position_interval) {
            let offset = self.settings.position_offset.min(n.saturating_sub(1));
            let update = position_at(self.frame + self.advance(offset), &self.settings);
            self.events
                .push(InputEvent::object(offset, update.to_object(&self.uris)));
        }

        self.events.sort_by_key(|ev| ev.frames);
    }

    /// Runs one cycle and returns the events the unit emitted in it.
    pub fn run_cycle(&mut self) -> &[EmittedEvent] {
        let drift = (self.unit.anchor().sample_origin - self.frame).abs();
        self.report.max_drift = self.report.max_drift.max(drift);

        self.prepare_events();
        match &self.signal {
            Some(signal) => signal.fill(self.frame, &mut self.audio_in),
            None => self.audio_in.fill(0.0),
        }

        self.unit.run(
            &self.events,
            AudioPorts::Separate {
                input: &self.audio_in,
                output: &mut self.audio_out,
            },
            &mut self.output,
        );

        self.cycle_events.clear();
        for timed in self.output.events() {
            let Some(message) = timed.message() else {
                continue;
            };
            match message {
                MidiMessage::NoteOn { .. } => self.report.note_ons += 1,
                MidiMessage::NoteOff { .. } => self.report.note_offs += 1,
                MidiMessage::ControlChange { .. } => {}
            }
            self.cycle_events.push(EmittedEvent {
                cycle: self.cycle,
                offset: timed.offset,
                sample: self.frame + i64::from(timed.offset),
                message,
            });
        }
        if !self.cycle_events.is_empty() {
            debug!(
                "Cycle {}: {} events emitted",
                self.cycle,
                self.cycle_events.len()
            );
            if self.record_events {
                self.report.events.extend_from_slice(&self.cycle_events);
            }
        }

        self.frame += self.advance(self.settings.block_size);
        self.cycle += 1;
        self.report.cycles = self.cycle;
        self.report.dropped_emissions = self.unit.dropped_emissions();
        self.report.rejected_positions = self.unit.rejected_positions();

        &self.cycle_events
    }

    /// Runs the configured number of cycles, calling `on_cycle` after each.
    pub fn run_with<F>(&mut self, mut on_cycle: F)
    where
        F: FnMut(&SimulatedHost),
    {
        for _ in 0..self.settings.cycles {
            self.run_cycle();
            on_cycle(self);
        }
        info!(
            "Simulation finished: {} cycles, {} note-on, {} note-off",
            self.report.cycles, self.report.note_ons, self.report.note_offs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at_splits_bars() {
        let settings = Settings::default();
        // 5.5 beats at 120 bpm, 48 kHz
        let update = position_at(132_000, &settings);
        assert_eq!(update.bar, 1);
        assert_eq!(update.bar_beat, 1.5);
        assert_eq!(update.beat_position(), 5.5);
        assert_eq!(update.frame, 132_000);
    }

    #[test]
    fn test_panic_burst_is_time_ordered() {
        let settings = Settings {
            panic_interval: 1,
            position_offset: 0,
            cycles: 1,
            ..Settings::default()
        };
        let mut host = SimulatedHost::new(settings, None).unwrap();
        host.prepare_events();
        assert_eq!(host.events.len(), 5);
        assert!(host.events.windows(2).all(|w| w[0].frames <= w[1].frames));
    }

    #[test]
    fn test_new_rejects_empty_cycles() {
        let settings = Settings {
            block_size: 0,
            cycles: 1,
            ..Settings::default()
        };
        assert!(matches!(
            SimulatedHost::new(settings, None),
            Err(HostError::Settings(SettingsError::Invalid {
                key: "block_size",
                ..
            }))
        ));
    }

    #[test]
    fn test_events_are_recorded_only_on_request() {
        let settings = Settings {
            block_size: 24_000,
            cycles: 4,
            ..Settings::default()
        };
        let mut host = SimulatedHost::new(settings.clone(), None).unwrap();
        host.run_with(|_| {});
        // edges at 24000, 48000 and 72000, each with its note-off
        assert!(host.report().events.is_empty());
        assert_eq!(host.report().note_ons, 3);
        assert_eq!(host.report().note_offs, 3);

        let mut host = SimulatedHost::new(settings, None)
            .unwrap()
            .record_events(true);
        host.run_with(|_| {});
        assert_eq!(host.report().events.len(), 6);
    }
}
