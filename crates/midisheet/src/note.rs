use crate::event::{EventKind, Meta, RawEvent, META_LYRIC};
use crate::instruments;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Channel reserved for percussion in General MIDI.
pub const PERCUSSION_CHANNEL: u8 = 9;

/// A single note with absolute pulse timing.
///
/// `start_time` is signed because shifting notes left may move them before
/// zero. `pitch` is signed and unbounded above because transposition only
/// clamps at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub start_time: i64,
    pub channel: u8,
    pub pitch: i32,
    /// Zero while the note is still open.
    pub duration: i64,
}

impl Note {
    pub fn new(start_time: i64, channel: u8, pitch: i32, duration: i64) -> Self {
        Self {
            start_time,
            channel,
            pitch,
            duration,
        }
    }

    pub fn end_time(&self) -> i64 {
        self.start_time + self.duration
    }
}

/// A lyric syllable and the pulse it is sung at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyric {
    pub start_time: i64,
    pub text: String,
}

/// The notes of one track, ordered by start time then pitch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Track {
    /// Index of the source `MTrk` chunk, or the staff/channel ordinal for
    /// derived tracks.
    pub number: usize,
    pub notes: Vec<Note>,
    /// General MIDI program, 0-127, or 128 for percussion.
    pub instrument: u8,
    pub lyrics: Vec<Lyric>,
}

impl Track {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    pub fn instrument_name(&self) -> &'static str {
        instruments::name(self.instrument)
    }

    pub fn has_lyrics(&self) -> bool {
        !self.lyrics.is_empty()
    }

    /// True if the notes use more than one channel.
    pub fn has_multiple_channels(&self) -> bool {
        match self.notes.first() {
            Some(first) => self.notes.iter().any(|n| n.channel != first.channel),
            None => false,
        }
    }

    /// Sort notes by start time, then pitch. The sort is stable.
    pub fn sort_notes(&mut self) {
        self.notes
            .sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.pitch.cmp(&b.pitch)));
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Track number={} instrument={} ({})",
            self.number,
            self.instrument,
            self.instrument_name()
        )?;
        for n in &self.notes {
            writeln!(
                f,
                "  start={} channel={} pitch={} duration={}",
                n.start_time, n.channel, n.pitch, n.duration
            )?;
        }
        write!(f, "End Track")
    }
}

/// Build a track from decoded events, pairing note-on with note-off.
///
/// Open notes are kept on a stack per (channel, pitch), so an off event
/// always closes the most recently started note of that key. Off events
/// with nothing open are ignored.
pub fn assemble_track(events: &[RawEvent], number: usize) -> Track {
    let mut track = Track::new(number);
    let mut open: HashMap<(u8, u8), Vec<usize>> = HashMap::new();
    let mut program: Option<u8> = None;

    for event in events {
        let time = event.start_time as i64;
        match &event.kind {
            EventKind::NoteOn {
                channel,
                pitch,
                velocity,
            } if *velocity > 0 => {
                open.entry((*channel, *pitch))
                    .or_default()
                    .push(track.notes.len());
                track
                    .notes
                    .push(Note::new(time, *channel, *pitch as i32, 0));
            }
            EventKind::NoteOn { channel, pitch, .. } | EventKind::NoteOff { channel, pitch, .. } => {
                if let Some(idx) = open.get_mut(&(*channel, *pitch)).and_then(|stack| stack.pop()) {
                    let note = &mut track.notes[idx];
                    note.duration = time - note.start_time;
                }
            }
            EventKind::ProgramChange { program: p, .. } => {
                program.get_or_insert(*p);
            }
            EventKind::Meta(Meta::Other { kind, data }) if *kind == META_LYRIC => {
                track.lyrics.push(Lyric {
                    start_time: time,
                    text: String::from_utf8_lossy(data).into_owned(),
                });
            }
            _ => {}
        }
    }

    track.instrument = match (program, track.notes.first()) {
        (Some(p), _) => p,
        (None, Some(first)) if first.channel == PERCUSSION_CHANNEL => instruments::PERCUSSION,
        _ => 0,
    };
    track.sort_notes();
    track
}
