use crate::atom::{Atom, Object};
use crate::urid::{Urid, Uris};
use thiserror::Error;

/// Reasons a `time:Position` object is not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("missing property {0}")]
    Missing(&'static str),
    #[error("property {name} has type {found}, expected {expected}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("negative frame {0}")]
    NegativeFrame(i64),
}

/// One authoritative transport snapshot from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostUpdate {
    pub bar: i64,
    pub bar_beat: f64,
    pub beats_per_bar: f32,
    /// Parsed but not folded into the beat count.
    pub beat_unit: i32,
    pub bpm: f32,
    pub speed: f32,
    pub frame: i64,
}

impl HostUpdate {
    /// Reads all seven properties; any missing or mistyped one rejects the
    /// whole update.
    pub fn from_object(obj: &Object, uris: &Uris) -> Result<Self, PositionError> {
        let bar = typed(obj, uris.time_bar, "bar", "Long", Atom::as_long)?;
        let bar_beat = typed(obj, uris.time_bar_beat, "barBeat", "Float", Atom::as_float)?;
        let beat_unit = typed(obj, uris.time_beat_unit, "beatUnit", "Int", Atom::as_int)?;
        let beats_per_bar = typed(
            obj,
            uris.time_beats_per_bar,
            "beatsPerBar",
            "Float",
            Atom::as_float,
        )?;
        let bpm = typed(
            obj,
            uris.time_beats_per_minute,
            "beatsPerMinute",
            "Float",
            Atom::as_float,
        )?;
        let speed = typed(obj, uris.time_speed, "speed", "Float", Atom::as_float)?;
        let frame = typed(obj, uris.time_frame, "frame", "Long", Atom::as_long)?;

        Ok(Self {
            bar,
            bar_beat: f64::from(bar_beat),
            beats_per_bar,
            beat_unit,
            bpm,
            speed,
            frame,
        })
    }

    /// Like [`HostUpdate::from_object`] but also rejects a negative frame,
    /// which hosts use to signal "sample position unknown".
    pub fn parse(obj: &Object, uris: &Uris) -> Result<Self, PositionError> {
        let update = Self::from_object(obj, uris)?;
        if update.frame < 0 {
            return Err(PositionError::NegativeFrame(update.frame));
        }
        Ok(update)
    }

    /// Bar and beat merged into one beat count. TODO: fold `beat_unit` in
    /// once there is a defined mapping for non-quarter beat units.
    pub fn beat_position(&self) -> f64 {
        self.bar as f64 * f64::from(self.beats_per_bar) + self.bar_beat
    }

    /// Builds the object a host would send for this snapshot.
    pub fn to_object(&self, uris: &Uris) -> Object {
        Object::new(uris.time_position)
            .with(uris.time_bar, Atom::Long(self.bar))
            .with(uris.time_bar_beat, Atom::Float(self.bar_beat as f32))
            .with(uris.time_beat_unit, Atom::Int(self.beat_unit))
            .with(uris.time_beats_per_bar, Atom::Float(self.beats_per_bar))
            .with(uris.time_beats_per_minute, Atom::Float(self.bpm))
            .with(uris.time_speed, Atom::Float(self.speed))
            .with(uris.time_frame, Atom::Long(self.frame))
    }
}

fn typed<T>(
    obj: &Object,
    key: Urid,
    name: &'static str,
    expected: &'static str,
    extract: fn(&Atom) -> Option<T>,
) -> Result<T, PositionError> {
    let atom = obj.get(key).ok_or(PositionError::Missing(name))?;
    extract(atom).ok_or(PositionError::WrongType {
        name,
        expected,
        found: atom.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urid::HashUridMap;

    fn sample_update() -> HostUpdate {
        HostUpdate {
            bar: 3,
            bar_beat: 1.5,
            beats_per_bar: 4.0,
            beat_unit: 4,
            bpm: 120.0,
            speed: 1.0,
            frame: 48_000,
        }
    }

    #[test]
    fn test_parse_complete_object() {
        let map = HashUridMap::new();
        let uris = Uris::new(&map);
        let update = sample_update();
        let parsed = HostUpdate::parse(&update.to_object(&uris), &uris).unwrap();
        assert_eq!(parsed, update);
        assert_eq!(parsed.beat_position(), 13.5);
    }

    #[test]
    fn test_beat_unit_is_ignored() {
        let mut update = sample_update();
        update.beat_unit = 8;
        assert_eq!(update.beat_position(), 13.5);
    }

    #[test]
    fn test_missing_property() {
        let map = HashUridMap::new();
        let uris = Uris::new(&map);
        let mut obj = sample_update().to_object(&uris);
        obj.properties.retain(|(k, _)| *k != uris.time_speed);
        assert_eq!(
            HostUpdate::parse(&obj, &uris),
            Err(PositionError::Missing("speed"))
        );
    }

    #[test]
    fn test_wrong_type() {
        let map = HashUridMap::new();
        let uris = Uris::new(&map);
        let obj = Object::new(uris.time_position)
            .with(uris.time_bar, Atom::Int(3))
            .with(uris.time_bar_beat, Atom::Float(0.0));
        assert_eq!(
            HostUpdate::parse(&obj, &uris),
            Err(PositionError::WrongType {
                name: "bar",
                expected: "Long",
                found: "Int"
            })
        );
    }

    #[test]
    fn test_negative_frame() {
        let map = HashUridMap::new();
        let uris = Uris::new(&map);
        let mut update = sample_update();
        update.frame = -1;
        let obj = update.to_object(&uris);
        assert!(HostUpdate::from_object(&obj, &uris).is_ok());
        assert_eq!(
            HostUpdate::parse(&obj, &uris),
            Err(PositionError::NegativeFrame(-1))
        );
    }
}
