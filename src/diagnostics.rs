//! Human-readable diagnostic side channel.
//!
//! The unit reports every MIDI event it accepts and every trigger it fires,
//! each with its absolute sample and beat position. Where those lines end up
//! is the host's business: the `log` crate, a channel, or a test buffer.

use crate::midi::hex_bytes;
use crossbeam::channel::{Sender, TrySendError};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    MidiEvent {
        sample: i64,
        beat: f64,
        bytes: Vec<u8>,
    },
    RisingEdge {
        sample: i64,
        beat: f64,
        previous: f32,
        value: f32,
    },
}

impl Diagnostic {
    pub fn sample(&self) -> i64 {
        match self {
            Diagnostic::MidiEvent { sample, .. } | Diagnostic::RisingEdge { sample, .. } => *sample,
        }
    }

    pub fn beat(&self) -> f64 {
        match self {
            Diagnostic::MidiEvent { beat, .. } | Diagnostic::RisingEdge { beat, .. } => *beat,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MidiEvent {
                sample,
                beat,
                bytes,
            } => write!(
                f,
                "@{:6} | {:4.2} MIDI ev[{}]:{}",
                sample,
                beat,
                bytes.len(),
                hex_bytes(bytes)
            ),
            Diagnostic::RisingEdge {
                sample,
                beat,
                previous,
                value,
            } => write!(
                f,
                "@{:6} | {:4.2} Rising Edge [{:.2}] -> {:.2}",
                sample, beat, previous, value
            ),
        }
    }
}

/// Receives diagnostics from the processing thread. Implementations must not
/// block.
pub trait DiagnosticSink: Send {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Fallback sink writing through the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::info!("{}", diagnostic);
    }
}

/// Forwards diagnostics over a crossbeam channel, dropping them when the
/// channel is full or disconnected.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Diagnostic>,
    dropped: Arc<AtomicU64>,
}

impl ChannelSink {
    pub fn new(tx: Sender<Diagnostic>) -> Self {
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of diagnostics that could not be delivered.
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }
}

impl DiagnosticSink for ChannelSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match self.tx.try_send(diagnostic) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
