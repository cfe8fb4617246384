//! MIDI functionality for HostSync
//!
//! This module provides:
//! - The note and controller messages the unit emits, with their encoding
//! - The panic-message filter applied to incoming events
//! - The capacity-bounded output sequence the unit writes into
//!
mod message;
mod sequence;

pub use message::{
    hex_bytes, is_panic_message, MidiMessage, CC_ALL_NOTES_OFF, CC_RESET_ALL_CONTROLLERS,
    CC_SUSTAIN, MESSAGE_SIZE,
};
pub use sequence::{event_size, EmitError, OutputSequence, TimedMessage, SEQUENCE_HEADER_SIZE};
