use super::{HostUpdate, Position, PositionError, Timeline, TransportAnchor};
use crate::atom::Object;
use crate::urid::Uris;
use log::{debug, trace};

/// Keeps the unit's notion of musical time in step with the host.
///
/// Between host updates the anchor is extrapolated at constant rate; when an
/// update arrives it snaps to the host's values at the update's offset.
#[derive(Debug, Clone)]
pub struct TransportReconciler {
    sample_rate: f64,
    anchor: TransportAnchor,
    timeline: Timeline,
    host_position: bool,
}

impl TransportReconciler {
    pub fn new(sample_rate: f64) -> Self {
        let anchor = TransportAnchor::default();
        Self {
            sample_rate,
            anchor,
            timeline: Timeline::new(anchor, sample_rate),
            host_position: false,
        }
    }

    /// Opens a cycle whose first region uses the extrapolated anchor.
    pub fn begin_cycle(&mut self) {
        self.timeline.reset(self.anchor, self.sample_rate);
    }

    /// Parses a `time:Position` object received at `offset` and applies it.
    /// An invalid object leaves the anchor untouched.
    pub fn handle_position(
        &mut self,
        offset: u32,
        obj: &Object,
        uris: &Uris,
    ) -> Result<(), PositionError> {
        match HostUpdate::parse(obj, uris) {
            Ok(update) => {
                self.apply(offset, &update);
                Ok(())
            }
            Err(e) => {
                self.host_position = false;
                debug!("Ignoring host position at frame {}: {}", offset, e);
                Err(e)
            }
        }
    }

    /// Snaps the anchor to `update` from `offset` on.
    pub fn apply(&mut self, offset: u32, update: &HostUpdate) {
        let anchor = TransportAnchor::from_update(update);
        debug!(
            "Host position at frame {}: sample {} -> {}, beat {:.3} -> {:.3}",
            offset,
            self.timeline.position_at(offset).sample,
            anchor.sample_origin,
            self.timeline.position_at(offset).beat,
            anchor.beat_origin
        );
        self.anchor = anchor;
        self.timeline.push(offset, anchor, self.sample_rate);
        self.host_position = true;
    }

    pub fn position_at(&self, offset: u32) -> Position {
        self.timeline.position_at(offset)
    }

    /// Advances the anchor past a cycle of `n_samples`, measured from the
    /// last region's start.
    pub fn finish_cycle(&mut self, n_samples: u32) {
        let last = *self.timeline.last();
        let elapsed = n_samples.saturating_sub(last.offset);
        self.anchor = last.anchor.advanced(elapsed, self.sample_rate);
        trace!(
            "Cycle end: sample {} speed {} -> next start {}",
            last.anchor.sample_origin,
            last.anchor.speed,
            self.anchor.sample_origin
        );
    }

    /// Anchor in effect right now: the last applied update during a cycle,
    /// the extrapolated start of the next cycle after `finish_cycle`.
    pub fn anchor(&self) -> &TransportAnchor {
        &self.anchor
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Whether the most recent position object was accepted.
    pub fn has_host_position(&self) -> bool {
        self.host_position
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urid::HashUridMap;
    use approx::assert_relative_eq;

    const RATE: f64 = 48_000.0;

    fn update(frame: i64, bar: i64, bar_beat: f64, bpm: f32) -> HostUpdate {
        HostUpdate {
            bar,
            bar_beat,
            beats_per_bar: 4.0,
            beat_unit: 4,
            bpm,
            speed: 1.0,
            frame,
        }
    }

    #[test]
    fn test_extrapolates_without_updates() {
        let mut r = TransportReconciler::new(RATE);
        for _ in 0..3 {
            r.begin_cycle();
            r.finish_cycle(480);
        }
        assert_eq!(r.anchor().sample_origin, 1_440);
        assert_eq!(r.anchor().beat_origin, 0.0);
        assert!(!r.has_host_position());
    }

    #[test]
    fn test_mid_cycle_snap_then_advance() {
        let mut r = TransportReconciler::new(RATE);
        r.begin_cycle();
        r.apply(100, &update(96_000, 2, 1.0, 120.0));
        assert_eq!(r.anchor().sample_origin, 96_000);
        assert_eq!(r.anchor().beat_origin, 9.0);

        r.finish_cycle(480);
        assert_eq!(r.anchor().sample_origin, 96_380);
        assert_relative_eq!(r.anchor().beat_origin, 9.0 + 380.0 / 24_000.0);
    }

    #[test]
    fn test_invalid_object_keeps_anchor() {
        let map = HashUridMap::new();
        let uris = Uris::new(&map);
        let mut r = TransportReconciler::new(RATE);
        r.begin_cycle();
        r.apply(0, &update(1_000, 0, 0.0, 120.0));
        let before = *r.anchor();

        let mut obj = update(5_000, 1, 0.0, 90.0).to_object(&uris);
        obj.properties.pop();
        assert!(r.handle_position(10, &obj, &uris).is_err());
        assert_eq!(*r.anchor(), before);
        assert!(!r.has_host_position());
        assert_eq!(r.timeline().breakpoints().len(), 2);
    }

    #[test]
    fn test_last_update_wins() {
        let mut r = TransportReconciler::new(RATE);
        r.begin_cycle();
        r.apply(10, &update(1_000, 0, 0.0, 120.0));
        r.apply(200, &update(50_000, 5, 2.0, 60.0));
        r.finish_cycle(480);
        assert_eq!(r.anchor().sample_origin, 50_280);
        assert_eq!(r.anchor().bpm, 60.0);
        assert_eq!(r.timeline().breakpoints().len(), 3);
    }
}
