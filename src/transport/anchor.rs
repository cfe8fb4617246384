use super::HostUpdate;

/// Mapping between absolute sample count and musical position.
///
/// `sample_origin` and `beat_origin` describe the same instant and are only
/// ever replaced together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportAnchor {
    pub sample_origin: i64,
    pub beat_origin: f64,
    pub bpm: f64,
    pub speed: f64,
}

impl Default for TransportAnchor {
    fn default() -> Self {
        Self {
            sample_origin: 0,
            beat_origin: 0.0,
            bpm: 0.0,
            speed: 1.0,
        }
    }
}

impl TransportAnchor {
    pub fn from_update(update: &HostUpdate) -> Self {
        Self {
            sample_origin: update.frame,
            beat_origin: update.beat_position(),
            bpm: f64::from(update.bpm),
            speed: f64::from(update.speed),
        }
    }

    pub fn beats_per_sample(&self, sample_rate: f64) -> f64 {
        self.bpm * self.speed / (60.0 * sample_rate)
    }

    /// Anchor `elapsed` samples later, extrapolated at constant rate.
    ///
    /// The sample advance is `floor(speed * elapsed)`; the beat advance is that
    /// many samples at `beats_per_sample`.
    pub fn advanced(&self, elapsed: u32, sample_rate: f64) -> Self {
        let distance = (self.speed as f32 * elapsed as f32).floor() as i64;
        Self {
            sample_origin: self.sample_origin + distance,
            beat_origin: self.beat_origin + distance as f64 * self.beats_per_sample(sample_rate),
            ..*self
        }
    }
}

/// Start of a sub-region of the cycle that uses `anchor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub offset: u32,
    pub anchor: TransportAnchor,
    pub beats_per_sample: f64,
}

/// Absolute position of one sample, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub sample: i64,
    pub beat: f64,
}

/// Piecewise-constant anchor over one cycle.
///
/// Always holds at least the breakpoint opened at offset 0 by
/// [`Timeline::reset`]. Breakpoints are pushed in non-decreasing offset order.
#[derive(Debug, Clone)]
pub struct Timeline {
    breakpoints: Vec<Breakpoint>,
}

impl Timeline {
    pub fn new(anchor: TransportAnchor, sample_rate: f64) -> Self {
        let mut timeline = Self {
            breakpoints: Vec::with_capacity(4),
        };
        timeline.reset(anchor, sample_rate);
        timeline
    }

    /// Starts a new cycle with a single region covering it.
    pub fn reset(&mut self, anchor: TransportAnchor, sample_rate: f64) {
        self.breakpoints.clear();
        self.breakpoints.push(Breakpoint {
            offset: 0,
            anchor,
            beats_per_sample: anchor.beats_per_sample(sample_rate),
        });
    }

    /// Opens a region starting at `offset`. An offset lower than the current
    /// last breakpoint is clamped to it so lookups stay ordered.
    pub fn push(&mut self, offset: u32, anchor: TransportAnchor, sample_rate: f64) {
        let offset = offset.max(self.last().offset);
        self.breakpoints.push(Breakpoint {
            offset,
            anchor,
            beats_per_sample: anchor.beats_per_sample(sample_rate),
        });
    }

    pub fn last(&self) -> &Breakpoint {
        // reset() guarantees one entry
        &self.breakpoints[self.breakpoints.len() - 1]
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Region in effect at `offset`: the last breakpoint at or before it.
    pub fn region_at(&self, offset: u32) -> &Breakpoint {
        let idx = self
            .breakpoints
            .partition_point(|bp| bp.offset <= offset)
            .saturating_sub(1);
        &self.breakpoints[idx]
    }

    pub fn position_at(&self, offset: u32) -> Position {
        let bp = self.region_at(offset);
        let when = i64::from(offset) - i64::from(bp.offset);
        Position {
            sample: bp.anchor.sample_origin + when,
            beat: bp.anchor.beat_origin + when as f64 * bp.beats_per_sample,
        }
    }
}
