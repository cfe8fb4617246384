//! URI to integer mapping
//!
//! Every type and property key the unit inspects is identified by a URID, a
//! small integer the host hands out for a URI string. The unit maps the URIs
//! it cares about once at instantiation and compares integers afterwards.

use std::collections::HashMap;
use std::sync::Mutex;

/// Mapped URI. Zero is never handed out and means "unmapped".
pub type Urid = u32;

pub const TIME_POSITION: &str = "http://lv2plug.in/ns/ext/time#Position";
pub const TIME_BAR: &str = "http://lv2plug.in/ns/ext/time#bar";
pub const TIME_BAR_BEAT: &str = "http://lv2plug.in/ns/ext/time#barBeat";
pub const TIME_BEAT_UNIT: &str = "http://lv2plug.in/ns/ext/time#beatUnit";
pub const TIME_BEATS_PER_BAR: &str = "http://lv2plug.in/ns/ext/time#beatsPerBar";
pub const TIME_BEATS_PER_MINUTE: &str = "http://lv2plug.in/ns/ext/time#beatsPerMinute";
pub const TIME_SPEED: &str = "http://lv2plug.in/ns/ext/time#speed";
pub const TIME_FRAME: &str = "http://lv2plug.in/ns/ext/time#frame";

/// Host-side capability that turns URIs into URIDs.
pub trait UridMap: Send + Sync {
    fn map(&self, uri: &str) -> Urid;
}

/// In-memory URID map, handing out consecutive ids starting at 1.
#[derive(Debug, Default)]
pub struct HashUridMap {
    ids: Mutex<HashMap<String, Urid>>,
}

impl HashUridMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UridMap for HashUridMap {
    fn map(&self, uri: &str) -> Urid {
        let Ok(mut ids) = self.ids.lock() else {
            return 0;
        };
        if let Some(id) = ids.get(uri) {
            return *id;
        }
        let id = ids.len() as Urid + 1;
        ids.insert(uri.to_string(), id);
        id
    }
}

/// The URIDs the unit needs, mapped once at instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uris {
    pub time_position: Urid,
    pub time_bar: Urid,
    pub time_bar_beat: Urid,
    pub time_beat_unit: Urid,
    pub time_beats_per_bar: Urid,
    pub time_beats_per_minute: Urid,
    pub time_speed: Urid,
    pub time_frame: Urid,
}

impl Uris {
    pub fn new(map: &dyn UridMap) -> Self {
        Self {
            time_position: map.map(TIME_POSITION),
            time_bar: map.map(TIME_BAR),
            time_bar_beat: map.map(TIME_BAR_BEAT),
            time_beat_unit: map.map(TIME_BEAT_UNIT),
            time_beats_per_bar: map.map(TIME_BEATS_PER_BAR),
            time_beats_per_minute: map.map(TIME_BEATS_PER_MINUTE),
            time_speed: map.map(TIME_SPEED),
            time_frame: map.map(TIME_FRAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_is_stable_and_nonzero() {
        let map = HashUridMap::new();
        let a = map.map(TIME_POSITION);
        let b = map.map(TIME_FRAME);
        assert_ne!(a, 0);
        assert_ne!(a, b);
        assert_eq!(map.map(TIME_POSITION), a);
    }

    #[test]
    fn test_uris_are_distinct() {
        let map = HashUridMap::new();
        let uris = Uris::new(&map);
        let mut all = vec![
            uris.time_position,
            uris.time_bar,
            uris.time_bar_beat,
            uris.time_beat_unit,
            uris.time_beats_per_bar,
            uris.time_beats_per_minute,
            uris.time_speed,
            uris.time_frame,
        ];
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 8);
    }
}
