//! Transport functionality
//!
//! This module handles the transport aspects of HostSync, including:
//! - Parsing host `time:Position` snapshots
//! - The sample/beat anchor and its per-cycle timeline of sub-regions
//! - Reconciling local sample-counted time against host updates
//!
//! Musical position is `bar * beatsPerBar + barBeat`; the beat unit is not
//! applied.

mod anchor;
mod position;
mod reconciler;

pub use anchor::{Breakpoint, Position, Timeline, TransportAnchor};
pub use position::{HostUpdate, PositionError};
pub use reconciler::TransportReconciler;
