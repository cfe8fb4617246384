//! Terminal progress display for simulated sessions
//!
//! Shows a cycle counter and a transport line with the unit's anchor, tempo
//! and trigger state. Built on indicatif progress bars and spinners.

mod progress;

pub use progress::{create_cycle_progress, create_transport_spinner, transport_line, CycleMonitor};
