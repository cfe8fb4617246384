//! The processing unit: one instance per host plugin slot.

use crate::atom::{Atom, InputEvent};
use crate::config::{TRIGGER_NOTE, TRIGGER_VELOCITY};
use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink};
use crate::midi::{is_panic_message, MidiMessage, OutputSequence};
use crate::transport::{Timeline, TransportAnchor, TransportReconciler};
use crate::trigger::{EdgeDetector, TriggerEvent, TriggerState};
use crate::urid::{UridMap, Uris};
use log::{error, info, trace};
use thiserror::Error;

const NOTE_ON: MidiMessage = MidiMessage::NoteOn {
    channel: 0,
    note: TRIGGER_NOTE,
    velocity: TRIGGER_VELOCITY,
};

const NOTE_OFF: MidiMessage = MidiMessage::NoteOff {
    channel: 0,
    note: TRIGGER_NOTE,
    velocity: 0,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstantiateError {
    #[error("HostSyncTest: Host does not support {0}")]
    MissingFeature(&'static str),
    #[error("HostSyncTest: invalid sample rate {0}")]
    InvalidSampleRate(f64),
}

/// Capabilities the host offers at instantiation.
#[derive(Default)]
pub struct Features<'a> {
    pub urid_map: Option<&'a dyn UridMap>,
    pub log: Option<Box<dyn DiagnosticSink>>,
}

impl<'a> Features<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urid_map(mut self, map: &'a dyn UridMap) -> Self {
        self.urid_map = Some(map);
        self
    }

    pub fn with_log(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.log = Some(sink);
        self
    }
}

/// Audio ports for one cycle. With separate buffers the cycle is as long as
/// the shorter of the two.
pub enum AudioPorts<'a> {
    /// Distinct buffers; input is copied to output unchanged.
    Separate {
        input: &'a [f32],
        output: &'a mut [f32],
    },
    /// Host connected both ports to the same buffer.
    InPlace(&'a mut [f32]),
}

impl<'a> AudioPorts<'a> {
    /// Performs the pass-through and returns the signal to analyse.
    fn forward(self) -> &'a [f32] {
        match self {
            AudioPorts::Separate { input, output } => {
                let n = input.len().min(output.len());
                let output = &mut output[..n];
                output.copy_from_slice(&input[..n]);
                output
            }
            AudioPorts::InPlace(buffer) => buffer,
        }
    }
}

/// Transport sync test unit.
///
/// Reports host MIDI and transport positions, and answers every rising zero
/// crossing of its audio input with a note-on followed a quarter second later
/// by a note-off.
pub struct HostSyncTest {
    uris: Uris,
    sample_rate: f64,
    reconciler: TransportReconciler,
    detector: EdgeDetector,
    sink: Box<dyn DiagnosticSink>,
    dropped_emissions: u64,
    rejected_positions: u64,
}

impl HostSyncTest {
    pub const URI: &'static str = "http://gareus.org/oss/lv2/host_sync_test";

    pub fn instantiate(sample_rate: f64, features: Features<'_>) -> Result<Self, InstantiateError> {
        let Some(map) = features.urid_map else {
            let err = InstantiateError::MissingFeature("urid:map");
            error!("{}", err);
            return Err(err);
        };

        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            let err = InstantiateError::InvalidSampleRate(sample_rate);
            error!("{}", err);
            return Err(err);
        }

        let detector = EdgeDetector::for_sample_rate(sample_rate);
        info!(
            "HostSyncTest instantiated at {} Hz, holdoff {} samples",
            sample_rate,
            detector.holdoff_samples()
        );

        Ok(Self {
            uris: Uris::new(map),
            sample_rate,
            reconciler: TransportReconciler::new(sample_rate),
            detector,
            sink: features.log.unwrap_or_else(|| Box::new(LogSink)),
            dropped_emissions: 0,
            rejected_positions: 0,
        })
    }

    /// Processes one cycle.
    pub fn run(&mut self, events: &[InputEvent], audio: AudioPorts<'_>, output: &mut OutputSequence) {
        let samples = audio.forward();
        let n_samples = samples.len() as u32;

        output.begin_cycle();
        self.reconciler.begin_cycle();

        for ev in events {
            match &ev.atom {
                Atom::Midi(bytes) => {
                    if is_panic_message(bytes) {
                        continue;
                    }
                    let pos = self.reconciler.position_at(ev.frames);
                    self.sink.report(Diagnostic::MidiEvent {
                        sample: pos.sample,
                        beat: pos.beat,
                        bytes: bytes.clone(),
                    });
                }
                Atom::Object(obj) if obj.otype == self.uris.time_position => {
                    if let Err(e) = self.reconciler.handle_position(ev.frames, obj, &self.uris) {
                        self.rejected_positions += 1;
                        trace!("Rejected position #{}: {}", self.rejected_positions, e);
                    }
                }
                _ => {}
            }
        }

        let reconciler = &self.reconciler;
        let sink = &mut self.sink;
        let dropped = &mut self.dropped_emissions;
        self.detector.process(samples, |event| match event {
            TriggerEvent::NoteOn {
                offset,
                previous,
                value,
            } => {
                let pos = reconciler.position_at(offset);
                sink.report(Diagnostic::RisingEdge {
                    sample: pos.sample,
                    beat: pos.beat,
                    previous,
                    value,
                });
                emit(output, offset, NOTE_ON, dropped);
            }
            TriggerEvent::NoteOff { offset } => emit(output, offset, NOTE_OFF, dropped),
        });

        self.reconciler.finish_cycle(n_samples);
    }

    pub fn anchor(&self) -> &TransportAnchor {
        self.reconciler.anchor()
    }

    /// Sub-regions of the most recent cycle.
    pub fn timeline(&self) -> &Timeline {
        self.reconciler.timeline()
    }

    pub fn trigger(&self) -> &TriggerState {
        self.detector.state()
    }

    pub fn has_host_position(&self) -> bool {
        self.reconciler.has_host_position()
    }

    pub fn holdoff_samples(&self) -> u32 {
        self.detector.holdoff_samples()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn uris(&self) -> &Uris {
        &self.uris
    }

    /// `time:Position` objects discarded as invalid since instantiation.
    pub fn rejected_positions(&self) -> u64 {
        self.rejected_positions
    }

    /// Messages lost to a full output sequence since instantiation.
    pub fn dropped_emissions(&self) -> u64 {
        self.dropped_emissions
    }
}

fn emit(output: &mut OutputSequence, offset: u32, message: MidiMessage, dropped: &mut u64) {
    if let Err(e) = output.emit(offset, message) {
        *dropped += 1;
        trace!("Dropped {:?} at frame {}: {}", message, offset, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urid::HashUridMap;

    #[test]
    fn test_requires_urid_map() {
        let result = HostSyncTest::instantiate(48_000.0, Features::new());
        assert_eq!(
            result.err(),
            Some(InstantiateError::MissingFeature("urid:map"))
        );
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        let map = HashUridMap::new();
        for rate in [0.0, -1.0, f64::NAN] {
            let result = HostSyncTest::instantiate(rate, Features::new().with_urid_map(&map));
            assert!(matches!(
                result.err(),
                Some(InstantiateError::InvalidSampleRate(_))
            ));
        }
    }

    #[test]
    fn test_defaults_after_instantiate() {
        let map = HashUridMap::new();
        let unit = HostSyncTest::instantiate(48_000.0, Features::new().with_urid_map(&map)).unwrap();
        assert_eq!(unit.holdoff_samples(), 12_000);
        assert_eq!(unit.anchor().speed, 1.0);
        assert_eq!(unit.anchor().bpm, 0.0);
        assert_eq!(unit.trigger().holdoff_remaining(), -1);
        assert_eq!(unit.trigger().last_sample, 1.0);
        assert!(!unit.has_host_position());
    }

    #[test]
    fn test_separate_ports_copy_through() {
        let input = [0.1, -0.2, 0.3];
        let mut output = [0.0; 3];
        let seen = AudioPorts::Separate {
            input: &input,
            output: &mut output,
        }
        .forward()
        .to_vec();
        assert_eq!(seen, input.to_vec());
        assert_eq!(output, input);
    }

    #[test]
    fn test_longer_output_is_cut_to_input() {
        let input = [0.0; 4];
        let mut output = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let seen = AudioPorts::Separate {
            input: &input,
            output: &mut output,
        }
        .forward();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_stale_output_samples_are_not_scanned() {
        let map = HashUridMap::new();
        let mut unit =
            HostSyncTest::instantiate(48_000.0, Features::new().with_urid_map(&map)).unwrap();
        let mut out = OutputSequence::with_capacity(1024);
        let input = [0.0; 4];
        let mut output = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        unit.run(
            &[],
            AudioPorts::Separate {
                input: &input,
                output: &mut output,
            },
            &mut out,
        );
        assert!(out.is_empty());
        assert_eq!(unit.anchor().sample_origin, 4);
    }
}
