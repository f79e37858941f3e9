//! Fan a single multi-channel track out into one track per channel.

use crate::event::{EventKind, RawEvent};
use crate::instruments;
use crate::note::{Track, PERCUSSION_CHANNEL};

/// Split `track` by note channel, in order of each channel's first note.
///
/// Each derived track takes the last Program-Change seen on its channel in
/// `events`; the percussion channel is always instrument 128. The source
/// track's lyrics go to the first derived track.
pub fn split_channels(track: &Track, events: &[RawEvent]) -> Vec<Track> {
    let mut programs = [0u8; 16];
    for event in events {
        if let EventKind::ProgramChange { channel, program } = event.kind {
            programs[(channel & 0x0F) as usize] = program;
        }
    }

    let mut result: Vec<Track> = Vec::new();
    for note in &track.notes {
        let existing = result
            .iter_mut()
            .find(|t| t.notes.first().map(|n| n.channel) == Some(note.channel));
        match existing {
            Some(t) => t.notes.push(*note),
            None => {
                let mut t = Track::new(result.len());
                t.instrument = if note.channel == PERCUSSION_CHANNEL {
                    instruments::PERCUSSION
                } else {
                    programs[(note.channel & 0x0F) as usize]
                };
                t.notes.push(*note);
                result.push(t);
            }
        }
    }

    if let Some(first) = result.first_mut() {
        first.lyrics = track.lyrics.clone();
    }
    result
}
