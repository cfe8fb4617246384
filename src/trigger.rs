//! Rising-edge detection with a holdoff window.
//!
//! An edge is a sample that is strictly positive while the previous one was
//! zero or below. After an accepted edge at offset `i` further edges are
//! ignored through `i + holdoff` inclusive, and the matching note-off is due at
//! exactly `i + holdoff`. When that lands past the end of the cycle the
//! deadline is carried into the following cycles.

use crate::config::HOLDOFF_SECONDS;

/// Debounce state carried between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holdoff {
    /// Ready to accept the next edge.
    Armed,
    /// A note-off is pending at this offset from the start of the next cycle.
    CountingDown(u32),
}

/// How a [`Holdoff`] plays out over a cycle of a given length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldoffPhase {
    Armed,
    /// Still pending past this cycle; remaining samples from its start.
    CountingDown(u32),
    /// The pending note-off is due inside this cycle, at this offset.
    FiresAt(u32),
}

impl Holdoff {
    pub fn phase(&self, n_samples: u32) -> HoldoffPhase {
        match *self {
            Holdoff::Armed => HoldoffPhase::Armed,
            Holdoff::CountingDown(d) if d < n_samples => HoldoffPhase::FiresAt(d),
            Holdoff::CountingDown(d) => HoldoffPhase::CountingDown(d),
        }
    }
}

/// Cycle-spanning trigger state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerState {
    pub holdoff: Holdoff,
    /// Last sample of the previous cycle.
    pub last_sample: f32,
}

impl Default for TriggerState {
    fn default() -> Self {
        // Starts "high" so a signal that begins positive is not an edge.
        Self {
            holdoff: Holdoff::Armed,
            last_sample: 1.0,
        }
    }
}

impl TriggerState {
    /// Signed counter view: samples until the pending note-off, or -1 when
    /// armed.
    pub fn holdoff_remaining(&self) -> i32 {
        match self.holdoff {
            Holdoff::Armed => -1,
            Holdoff::CountingDown(d) => d as i32,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.holdoff == Holdoff::Armed
    }
}

/// Something the detector wants emitted, in non-decreasing offset order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEvent {
    NoteOn {
        offset: u32,
        previous: f32,
        value: f32,
    },
    NoteOff {
        offset: u32,
    },
}

impl TriggerEvent {
    pub fn offset(&self) -> u32 {
        match *self {
            TriggerEvent::NoteOn { offset, .. } | TriggerEvent::NoteOff { offset } => offset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeDetector {
    holdoff_samples: u32,
    state: TriggerState,
}

impl EdgeDetector {
    pub fn new(holdoff_samples: u32) -> Self {
        Self {
            holdoff_samples,
            state: TriggerState::default(),
        }
    }

    /// Holdoff of a quarter second at `sample_rate`.
    pub fn for_sample_rate(sample_rate: f64) -> Self {
        Self::new((sample_rate * HOLDOFF_SECONDS) as u32)
    }

    pub fn holdoff_samples(&self) -> u32 {
        self.holdoff_samples
    }

    pub fn state(&self) -> &TriggerState {
        &self.state
    }

    /// Scans one cycle and reports note-on/note-off decisions to `handle`.
    ///
    /// A note-off deferred from an earlier cycle is reported first if it is
    /// due in this one.
    pub fn process<F>(&mut self, samples: &[f32], mut handle: F)
    where
        F: FnMut(TriggerEvent),
    {
        let n = samples.len() as i64;

        // Last offset (this cycle's coordinates) at which edges are ignored.
        let mut blocked_through = match self.state.holdoff {
            Holdoff::Armed => None,
            Holdoff::CountingDown(d) => Some(i64::from(d)),
        };

        if let HoldoffPhase::FiresAt(offset) = self.state.holdoff.phase(samples.len() as u32) {
            handle(TriggerEvent::NoteOff { offset });
        }

        let mut prev = self.state.last_sample;
        for (i, &value) in samples.iter().enumerate() {
            let i = i as i64;
            if prev <= 0.0 && value > 0.0 && blocked_through.map_or(true, |d| i > d) {
                handle(TriggerEvent::NoteOn {
                    offset: i as u32,
                    previous: prev,
                    value,
                });

                let note_off = i + i64::from(self.holdoff_samples);
                blocked_through = Some(note_off);
                if note_off < n {
                    handle(TriggerEvent::NoteOff {
                        offset: note_off as u32,
                    });
                }
            }
            prev = value;
        }

        self.state.last_sample = prev;
        self.state.holdoff = match blocked_through {
            Some(d) if d >= n => Holdoff::CountingDown((d - n) as u32),
            _ => Holdoff::Armed,
        };
    }
}
