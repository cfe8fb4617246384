use std::fmt::Write;

/// The three-byte channel messages the unit emits or inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
}

/// All Notes Off
pub const CC_ALL_NOTES_OFF: u8 = 0x7B;
/// Reset All Controllers
pub const CC_RESET_ALL_CONTROLLERS: u8 = 0x79;
pub const CC_SUSTAIN: u8 = 0x40;

/// Encoded size of every [`MidiMessage`].
pub const MESSAGE_SIZE: usize = 3;

impl MidiMessage {
    /// Decodes one message. Anything but a three-byte note or controller
    /// message is `None`.
    pub fn parse(data: &[u8]) -> Option<MidiMessage> {
        let &[status, d1, d2] = data else {
            return None;
        };
        let channel = status & 0x0F;
        match status & 0xF0 {
            0x90 => Some(MidiMessage::NoteOn {
                channel,
                note: d1,
                velocity: d2,
            }),
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: d1,
                velocity: d2,
            }),
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                controller: d1,
                value: d2,
            }),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> [u8; MESSAGE_SIZE] {
        match *self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => [0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => [0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F],
        }
    }
}

/// True for the three-byte controller messages hosts send on stop or
/// relocate: all-notes-off, reset-all-controllers and sustain, on any channel.
pub fn is_panic_message(data: &[u8]) -> bool {
    data.len() == 3
        && data[0] >> 4 == 0xB
        && matches!(
            data[1],
            CC_ALL_NOTES_OFF | CC_RESET_ALL_CONTROLLERS | CC_SUSTAIN
        )
}

/// Lowercase hex with a leading space per byte, e.g. `" 90 40 7f"`.
pub fn hex_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for byte in data {
        let _ = write!(out, " {:02x}", byte);
    }
    out
}
