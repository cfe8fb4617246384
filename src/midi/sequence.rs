//! Capacity-bounded output event sequence.
//!
//! Sizes follow the LV2 atom sequence layout: a 16 byte sequence header, then
//! per event an 8 byte frame stamp, an 8 byte atom header and the body padded
//! to a multiple of 8.

use super::{MidiMessage, MESSAGE_SIZE};
use thiserror::Error;

pub const SEQUENCE_HEADER_SIZE: usize = 16;
const EVENT_HEADER_SIZE: usize = 16;

/// Bytes one event with a `body_len` byte body occupies.
pub fn event_size(body_len: usize) -> usize {
    EVENT_HEADER_SIZE + pad_size(body_len)
}

fn pad_size(size: usize) -> usize {
    (size + 7) & !7
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("output sequence full: {needed} bytes needed, {available} available")]
    Overflow { needed: usize, available: usize },
    #[error("event at frame {offset} precedes previous event at frame {last}")]
    OutOfOrder { offset: u32, last: u32 },
}

/// Encoded MIDI stamped with its intra-cycle frame offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMessage {
    pub offset: u32,
    pub bytes: [u8; MESSAGE_SIZE],
}

impl TimedMessage {
    pub fn message(&self) -> Option<MidiMessage> {
        MidiMessage::parse(&self.bytes)
    }
}

/// The unit's MIDI output port for one cycle.
#[derive(Debug)]
pub struct OutputSequence {
    capacity: usize,
    used: usize,
    events: Vec<TimedMessage>,
}

impl OutputSequence {
    /// `capacity` is in bytes and includes the sequence header.
    pub fn with_capacity(capacity: usize) -> Self {
        let max_events = capacity.saturating_sub(SEQUENCE_HEADER_SIZE) / event_size(MESSAGE_SIZE);
        Self {
            capacity,
            used: 0,
            events: Vec::with_capacity(max_events),
        }
    }

    /// Drops last cycle's events and writes a fresh header.
    pub fn begin_cycle(&mut self) {
        self.events.clear();
        self.used = SEQUENCE_HEADER_SIZE.min(self.capacity);
    }

    /// Encodes `message` and appends it at `offset`.
    pub fn emit(&mut self, offset: u32, message: MidiMessage) -> Result<(), EmitError> {
        if let Some(last) = self.events.last() {
            if offset < last.offset {
                return Err(EmitError::OutOfOrder {
                    offset,
                    last: last.offset,
                });
            }
        }

        let needed = event_size(MESSAGE_SIZE);
        let available = self.capacity - self.used;
        if self.used < SEQUENCE_HEADER_SIZE || needed > available {
            return Err(EmitError::Overflow { needed, available });
        }

        self.used += needed;
        self.events.push(TimedMessage {
            offset,
            bytes: message.to_bytes(),
        });
        Ok(())
    }

    pub fn events(&self) -> &[TimedMessage] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes written this cycle, header included.
    pub fn used(&self) -> usize {
        self.used
    }
}
