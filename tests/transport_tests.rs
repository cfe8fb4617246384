use approx::assert_relative_eq;
use hostsyncrs::transport::{HostUpdate, TransportAnchor, TransportReconciler};

const RATE: f64 = 48_000.0;

fn update(frame: i64, bar: i64, bar_beat: f64, bpm: f32, speed: f32) -> HostUpdate {
    HostUpdate {
        bar,
        bar_beat,
        beats_per_bar: 4.0,
        beat_unit: 4,
        bpm,
        speed,
        frame,
    }
}

#[test]
fn test_extrapolation_is_continuous_across_cycles() {
    let mut r = TransportReconciler::new(RATE);
    r.begin_cycle();
    r.apply(0, &update(1_000, 0, 0.0, 120.0, 1.0));
    r.finish_cycle(512);

    let mut total = 512;
    for n in [64u32, 480, 1_000, 7] {
        r.begin_cycle();
        // the cycle starts where the last one ended
        assert_eq!(r.position_at(0).sample, r.anchor().sample_origin);
        r.finish_cycle(n);
        total += n;
    }

    let expected = TransportAnchor::from_update(&update(1_000, 0, 0.0, 120.0, 1.0))
        .advanced(total, RATE);
    assert_eq!(r.anchor().sample_origin, 1_000 + i64::from(total));
    assert_relative_eq!(r.anchor().beat_origin, expected.beat_origin, epsilon = 1e-9);
}

#[test]
fn test_half_speed_advances_floor_of_half() {
    let mut r = TransportReconciler::new(RATE);
    r.begin_cycle();
    r.apply(0, &update(0, 0, 0.0, 120.0, 0.5));
    r.finish_cycle(511);
    assert_eq!(r.anchor().sample_origin, 255);
    // 255 samples at 120 bpm, half speed
    assert_relative_eq!(r.anchor().beat_origin, 255.0 * 0.5 / 24_000.0);
}

#[test]
fn test_positions_before_and_after_snap() {
    let mut r = TransportReconciler::new(RATE);
    r.begin_cycle();
    r.apply(0, &update(10_000, 0, 0.0, 120.0, 1.0));
    r.finish_cycle(480);

    r.begin_cycle();
    r.apply(200, &update(500, 0, 0.0, 120.0, 1.0));

    // before the snap the old anchor is extrapolated
    assert_eq!(r.position_at(199).sample, 10_480 + 199);
    // from the snap on the host's value wins, even moving backwards
    assert_eq!(r.position_at(200).sample, 500);
    assert_eq!(r.position_at(479).sample, 779);

    r.finish_cycle(480);
    assert_eq!(r.anchor().sample_origin, 780);
}

#[test]
fn test_stopped_transport_holds_beat() {
    let mut r = TransportReconciler::new(RATE);
    r.begin_cycle();
    r.apply(0, &update(48_000, 1, 2.0, 120.0, 0.0));
    r.finish_cycle(480);
    assert_eq!(r.anchor().sample_origin, 48_000);
    assert_eq!(r.anchor().beat_origin, 6.0);
}
