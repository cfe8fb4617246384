use hostsyncrs::midi::{
    event_size, hex_bytes, is_panic_message, EmitError, MidiMessage, OutputSequence,
    SEQUENCE_HEADER_SIZE,
};

#[test]
fn test_parse_channel_messages() {
    assert_eq!(
        MidiMessage::parse(&[0x93, 0x40, 0x7F]),
        Some(MidiMessage::NoteOn {
            channel: 3,
            note: 0x40,
            velocity: 0x7F
        })
    );
    assert_eq!(
        MidiMessage::parse(&[0xB0, 0x07, 100]),
        Some(MidiMessage::ControlChange {
            channel: 0,
            controller: 7,
            value: 100
        })
    );
    assert_eq!(MidiMessage::parse(&[0xF8]), None);
    assert_eq!(MidiMessage::parse(&[]), None);
}

#[test]
fn test_trigger_notes_encode() {
    let on = MidiMessage::NoteOn {
        channel: 0,
        note: 0x40,
        velocity: 0x7F,
    };
    let off = MidiMessage::NoteOff {
        channel: 0,
        note: 0x40,
        velocity: 0,
    };
    assert_eq!(on.to_bytes(), [0x90, 0x40, 0x7F]);
    assert_eq!(off.to_bytes(), [0x80, 0x40, 0x00]);
    assert_eq!(hex_bytes(&off.to_bytes()), " 80 40 00");
}

#[test]
fn test_panic_filter() {
    for channel in 0..16u8 {
        assert!(is_panic_message(&[0xB0 | channel, 0x7B, 0]));
        assert!(is_panic_message(&[0xB0 | channel, 0x79, 0]));
        assert!(is_panic_message(&[0xB0 | channel, 0x40, 0x7F]));
    }
    assert!(!is_panic_message(&[0xB0, 0x07, 100]));
    assert!(!is_panic_message(&[0x90, 0x40, 0x7F]));
    assert!(!is_panic_message(&[0xB0, 0x7B]));
    assert!(!is_panic_message(&[0xB0, 0x7B, 0, 0]));
}

#[test]
fn test_sequence_capacity() {
    let note = MidiMessage::NoteOn {
        channel: 0,
        note: 0x40,
        velocity: 0x7F,
    };
    let mut seq = OutputSequence::with_capacity(SEQUENCE_HEADER_SIZE + 2 * event_size(3));
    seq.begin_cycle();
    assert!(seq.emit(0, note).is_ok());
    assert!(seq.emit(0, note).is_ok());
    assert!(matches!(seq.emit(1, note), Err(EmitError::Overflow { .. })));
    assert_eq!(seq.used(), seq.capacity());

    seq.begin_cycle();
    assert!(seq.is_empty());
    assert!(seq.emit(10, note).is_ok());
    assert_eq!(
        seq.emit(5, note),
        Err(EmitError::OutOfOrder { offset: 5, last: 10 })
    );
    assert_eq!(seq.len(), 1);
}
