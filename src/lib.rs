pub mod atom;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod host;
pub mod logging;
pub mod midi;
pub mod plugin;
pub mod transport;
pub mod trigger;
pub mod ui;
pub mod urid;

pub use atom::{Atom, InputEvent, Object};
pub use diagnostics::{ChannelSink, Diagnostic, DiagnosticSink, LogSink};
pub use host::{HostError, HostReport, SimulatedHost};
pub use midi::{MidiMessage, OutputSequence};
pub use plugin::{AudioPorts, Features, HostSyncTest, InstantiateError};
pub use urid::{HashUridMap, UridMap, Uris};
