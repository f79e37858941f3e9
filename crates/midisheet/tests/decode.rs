//! Parsing whole files: note reconstruction, error reporting and
//! agreement with an independent SMF parser.

mod common;

use common::{band_piece, piano_piece, smf, TrackBuilder};
use midisheet::{Error, MidiFile, Note};
use pretty_assertions::assert_eq;

#[test]
fn single_note_file() {
    let track = TrackBuilder::new()
        .note_on(0, 0, 60, 64)
        .note_off(480, 0, 60)
        .end();
    let midi = MidiFile::parse(&smf(1, 480, &[track])).unwrap();

    assert_eq!(midi.tracks().len(), 1);
    assert_eq!(midi.tracks()[0].notes, vec![Note::new(0, 0, 60, 480)]);
}

#[test]
fn zero_velocity_note_on_closes_note() {
    let track = TrackBuilder::new()
        .note_on(0, 3, 70, 5)
        .note_on(123, 3, 70, 0)
        .end();
    let midi = MidiFile::parse(&smf(0, 96, &[track])).unwrap();
    assert_eq!(midi.tracks()[0].notes, vec![Note::new(0, 3, 70, 123)]);
}

#[test]
fn running_status_across_a_file() {
    let track = TrackBuilder::new()
        .raw(0, &[0x90, 60, 80])
        .raw(0, &[64, 80])
        .raw(0, &[67, 80])
        .raw(240, &[60, 0])
        .raw(0, &[64, 0])
        .raw(0, &[67, 0])
        .end();
    let midi = MidiFile::parse(&smf(0, 480, &[track])).unwrap();
    let notes = &midi.tracks()[0].notes;
    assert_eq!(notes.len(), 3);
    assert!(notes.iter().all(|n| n.duration == 240 && n.start_time == 0));
}

#[test]
fn tracks_without_notes_keep_their_events() {
    let midi = MidiFile::parse(&piano_piece()).unwrap();
    assert_eq!(midi.events().len(), 2);
    assert_eq!(midi.events()[0].len(), 3);
    assert_eq!(midi.tracks().len(), 1);
    assert_eq!(midi.tracks()[0].number, 1);
    assert_eq!(midi.total_pulses(), 1440);
    assert_eq!(midi.end_time(), 1200);
}

#[test]
fn channel_split_single_track() {
    let midi = MidiFile::parse(&band_piece()).unwrap();
    assert!(midi.is_channel_split());

    let summary: Vec<(u8, u8, usize)> = midi
        .tracks()
        .iter()
        .map(|t| (t.notes[0].channel, t.instrument, t.notes.len()))
        .collect();
    assert_eq!(summary, vec![(1, 33, 1), (9, 128, 2), (0, 0, 2)]);
    assert_eq!(midi.tracks()[1].instrument_name(), "Percussion");
}

#[test]
fn lyrics_are_collected() {
    let track = TrackBuilder::new()
        .lyric(0, "Twin-")
        .note_on(0, 0, 60, 80)
        .note_off(240, 0, 60)
        .lyric(0, "kle")
        .note_on(0, 0, 60, 80)
        .note_off(240, 0, 60)
        .end();
    let midi = MidiFile::parse(&smf(0, 480, &[track])).unwrap();
    assert!(midi.has_lyrics());
    let lyrics: Vec<(i64, &str)> = midi.tracks()[0]
        .lyrics
        .iter()
        .map(|l| (l.start_time, l.text.as_str()))
        .collect();
    assert_eq!(lyrics, vec![(0, "Twin-"), (240, "kle")]);
}

#[test]
fn truncated_last_track_keeps_decoded_notes() {
    let track = TrackBuilder::new()
        .note_on(0, 0, 60, 80)
        .note_off(480, 0, 60)
        .raw(0, &[])
        .into_bytes();
    // Declare far more bytes than exist and end on a dangling varlen byte.
    let mut data = smf(0, 480, &[track]);
    data.pop();
    data.push(0x83);
    let len_at = 14 + 4;
    data[len_at..len_at + 4].copy_from_slice(&1000u32.to_be_bytes());

    let midi = MidiFile::parse(&data).unwrap();
    assert_eq!(midi.tracks()[0].notes, vec![Note::new(0, 0, 60, 480)]);
}

#[test]
fn truncated_header_is_an_error() {
    assert!(matches!(
        MidiFile::parse(b"MThd\0\0"),
        Err(Error::Truncated { offset: 4 })
    ));
}

#[test]
fn missing_track_chunk_is_an_error() {
    let mut data = smf(1, 480, &[TrackBuilder::new().end()]);
    data[14..18].copy_from_slice(b"MTxx");
    match MidiFile::parse(&data) {
        Err(Error::HeaderMismatch { offset, message }) => {
            assert_eq!(offset, 14);
            assert!(message.contains("MTrk"));
        }
        other => panic!("expected header mismatch, got {:?}", other),
    }
}

#[test]
fn unknown_event_reports_code_and_offset() {
    let track = TrackBuilder::new().raw(0, &[0x40, 0x40]).end();
    let data = smf(0, 480, &[track]);
    match MidiFile::parse(&data) {
        Err(Error::UnknownEventCode { code, offset }) => {
            assert_eq!(code, 0x40);
            assert_eq!(offset, 23);
        }
        other => panic!("expected unknown event code, got {:?}", other),
    }
}

#[test]
fn malformed_tempo_is_an_error() {
    let track = TrackBuilder::new().raw(0, &[0xFF, 0x51, 0x04, 0, 0, 0, 0]).end();
    assert!(matches!(
        MidiFile::parse(&smf(0, 480, &[track])),
        Err(Error::MalformedTempoEvent { length: 4, .. })
    ));
}

#[test]
fn open_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("piece.mid");
    std::fs::write(&path, piano_piece()).unwrap();

    let midi = MidiFile::open(&path).unwrap();
    assert_eq!(midi.name(), Some("piece.mid"));
    assert_eq!(midi.tracks().len(), 1);

    match MidiFile::open(dir.path().join("missing.mid")) {
        Err(Error::Io { path, .. }) => assert!(path.ends_with("missing.mid")),
        other => panic!("expected io error, got {:?}", other),
    }
}

#[test]
fn agrees_with_midly_on_note_ons() {
    for data in [piano_piece(), band_piece()] {
        let smf = midly::Smf::parse(&data).unwrap();
        let expected = smf
            .tracks
            .iter()
            .flatten()
            .filter(|e| {
                matches!(
                    e.kind,
                    midly::TrackEventKind::Midi {
                        message: midly::MidiMessage::NoteOn { vel, .. },
                        ..
                    } if vel.as_int() > 0
                )
            })
            .count();

        let midi = MidiFile::parse(&data).unwrap();
        let notes: usize = midi.tracks().iter().map(|t| t.notes.len()).sum();
        assert_eq!(notes, expected);
        assert_eq!(smf.tracks.len(), midi.events().len());
    }
}
