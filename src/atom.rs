//! Already-decoded input events
//!
//! The host delivers a time-ordered sequence of events per cycle. Each event
//! carries an intra-cycle frame offset and a typed value. Only MIDI packets and
//! `time:Position` objects mean anything to the unit; everything else is
//! skipped.

use crate::urid::Urid;

/// A typed value as delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Midi(Vec<u8>),
    Object(Object),
    /// Anything the unit has no decoder for, tagged with its type URID.
    Other(Urid),
}

impl Atom {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Atom::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Atom::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Atom::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Short name of the value's type, used in log messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Atom::Int(_) => "Int",
            Atom::Long(_) => "Long",
            Atom::Float(_) => "Float",
            Atom::Double(_) => "Double",
            Atom::Bool(_) => "Bool",
            Atom::Midi(_) => "MidiEvent",
            Atom::Object(_) => "Object",
            Atom::Other(_) => "Other",
        }
    }
}

/// A structured record: an object type plus keyed properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub otype: Urid,
    pub properties: Vec<(Urid, Atom)>,
}

impl Object {
    pub fn new(otype: Urid) -> Self {
        Self {
            otype,
            properties: Vec::new(),
        }
    }

    /// Builder-style property append.
    pub fn with(mut self, key: Urid, value: Atom) -> Self {
        self.properties.push((key, value));
        self
    }

    /// First value stored under `key`.
    pub fn get(&self, key: Urid) -> Option<&Atom> {
        self.properties
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// One entry of the input sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    /// Offset in samples from the start of the cycle.
    pub frames: u32,
    pub atom: Atom,
}

impl InputEvent {
    pub fn new(frames: u32, atom: Atom) -> Self {
        Self { frames, atom }
    }

    pub fn midi(frames: u32, bytes: &[u8]) -> Self {
        Self::new(frames, Atom::Midi(bytes.to_vec()))
    }

    pub fn object(frames: u32, object: Object) -> Self {
        Self::new(frames, Atom::Object(object))
    }
}
