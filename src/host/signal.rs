/// Square wave locked to the host transport, rising once per period.
///
/// The wave is high for the first half of each period and low for the second,
/// so the rising edge is the first sample at or after each multiple of the
/// period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseTrain {
    period: f64,
}

impl PulseTrain {
    /// One pulse every `interval_beats` beats. `None` when the tempo or the
    /// interval cannot produce a finite period.
    pub fn new(bpm: f64, interval_beats: f64, sample_rate: f64) -> Option<Self> {
        if !(bpm > 0.0 && interval_beats > 0.0 && sample_rate > 0.0) {
            return None;
        }
        let period = interval_beats * 60.0 * sample_rate / bpm;
        if !period.is_finite() || period < 2.0 {
            return None;
        }
        Some(Self { period })
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn value_at(&self, frame: i64) -> f32 {
        if (frame as f64).rem_euclid(self.period) < self.period / 2.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Writes the samples for frames `start..start + buffer.len()`.
    pub fn fill(&self, start: i64, buffer: &mut [f32]) {
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = self.value_at(start + i as i64);
        }
    }

    /// Frame of the `k`-th rising edge, `k >= 1`.
    pub fn edge_frame(&self, k: u64) -> i64 {
        (k as f64 * self.period).ceil() as i64
    }
}
