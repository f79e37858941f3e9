//! Note transforms used to make sheet music readable.
//!
//! Every function here works on tracks owned by the caller, normally clones
//! taken from a parsed [`MidiFile`](crate::MidiFile). Nothing in this module
//! can reach the parsed file itself.

use crate::note::{Lyric, Note, Track};
use crate::time::TimeSignature;

/// Top of the treble staff (E5), the initial guess for the upper voice.
const INITIAL_HIGH: i32 = 76;
/// Bottom of the bass staff (A3), the initial guess for the lower voice.
const INITIAL_LOW: i32 = 45;
const OCTAVE: i32 = 12;

/// Shift every note's start time by `amount` pulses. Results may go negative.
pub fn shift_time(tracks: &mut [Track], amount: i64) {
    for note in tracks.iter_mut().flat_map(|t| t.notes.iter_mut()) {
        note.start_time += amount;
    }
}

/// Shift every note's pitch by `amount` semitones, flooring at 0.
///
/// There is deliberately no ceiling: pitches above 127 are kept as is.
pub fn transpose(tracks: &mut [Track], amount: i32) {
    for note in tracks.iter_mut().flat_map(|t| t.notes.iter_mut()) {
        note.pitch = (note.pitch + amount).max(0);
    }
}

/// Give notes that start within `millisec` of each other the same start
/// time, so they are drawn as one chord.
///
/// All start times are sorted and walked left to right; a value within the
/// interval of the (already adjusted) value before it takes that value. Each
/// note then snaps to the adjusted value at or below its start that lies
/// within the interval. Runs of closely spaced onsets can therefore drift
/// away from their first member one interval at a time.
pub fn round_start_times(tracks: &mut [Track], millisec: u32, time: &TimeSignature) {
    let mut starts: Vec<i64> = tracks
        .iter()
        .flat_map(|t| t.notes.iter().map(|n| n.start_time))
        .collect();
    starts.sort_unstable();

    let interval = time.quarter as i64 * millisec as i64 * 1000 / time.tempo.max(1) as i64;

    for i in 1..starts.len() {
        if starts[i] - starts[i - 1] <= interval {
            starts[i] = starts[i - 1];
        }
    }

    debug_assert!(tracks.iter().all(is_time_ordered), "note start times out of order");

    for track in tracks.iter_mut() {
        let mut i = 0;
        for note in track.notes.iter_mut() {
            while i < starts.len() && note.start_time - interval > starts[i] {
                i += 1;
            }
            if let Some(&start) = starts.get(i) {
                if note.start_time > start && note.start_time - start <= interval {
                    note.start_time = start;
                }
            }
        }
        track.sort_notes();
    }
}

/// Lengthen notes up to the next note where that gives a plain note value.
///
/// Each note except the last of a track gets the largest of a quarter,
/// eighth, triplet eighth or sixteenth that fits before the next note with a
/// later start. Durations never shrink. A note is left alone when the note
/// before it ends exactly where it starts and has the same duration, so the
/// pair can still be drawn as equal notes.
pub fn round_durations(tracks: &mut [Track], quarter: u32) {
    let quarter = quarter as i64;
    let candidates = [quarter, quarter / 2, quarter / 3, quarter / 4];

    for track in tracks.iter_mut() {
        let notes = &mut track.notes;
        let Some(last_start) = notes.last().map(|n| n.start_time) else {
            continue;
        };
        let mut prev: Option<usize> = None;

        for i in 0..notes.len() - 1 {
            let prev_note = notes[*prev.get_or_insert(i)];
            let start = notes[i].start_time;
            let current = notes[i].duration;

            let next_start = notes[i + 1..]
                .iter()
                .map(|n| n.start_time)
                .find(|&s| s > start)
                .unwrap_or(last_start);
            let max_duration = next_start - start;

            let mut duration = candidates
                .iter()
                .copied()
                .find(|&d| d <= max_duration)
                .unwrap_or(0)
                .max(current);

            if prev_note.end_time() == start && prev_note.duration == current {
                duration = current;
            }
            notes[i].duration = duration;

            if notes[i + 1].start_time != start {
                prev = Some(i);
            }
        }
    }
}

/// Split a track into a top (treble) and bottom (bass) staff.
///
/// Each note is compared, in order, against:
/// 1. the highest/lowest notes starting at the same time, if either is more
///    than an octave away from it;
/// 2. the highest/lowest notes overlapping it (within a measure), if either
///    is more than an octave away;
/// 3. the same-time highest/lowest, if they span more than an octave;
/// 4. the overlapping highest/lowest, if they span more than an octave;
/// 5. the last overlapping highest/lowest pair that spanned more than an
///    octave, starting from E5/A3.
///
/// The note goes to the staff whose reference pitch is closer, the top staff
/// on ties. Returns `[top, bottom]`.
pub fn split_track(track: &Track, measure: i64) -> Vec<Track> {
    let notes = &track.notes;
    let mut top = Track::new(1);
    let mut bottom = Track::new(2);
    top.instrument = track.instrument;
    bottom.instrument = track.instrument;

    let mut prev_high = INITIAL_HIGH;
    let mut prev_low = INITIAL_LOW;
    let mut start_index = 0;

    for note in notes {
        let pitch = note.pitch;
        while start_index < notes.len() && notes[start_index].end_time() < note.start_time {
            start_index += 1;
        }

        let (high, low) = overlapping_high_low(
            notes,
            measure,
            start_index,
            note.start_time,
            note.end_time(),
            pitch,
        );
        let (high_exact, low_exact) = exact_high_low(notes, start_index, note.start_time, pitch);

        let to_top = if high_exact - pitch > OCTAVE || pitch - low_exact > OCTAVE {
            high_exact - pitch <= pitch - low_exact
        } else if high - pitch > OCTAVE || pitch - low > OCTAVE {
            high - pitch <= pitch - low
        } else if high_exact - low_exact > OCTAVE {
            high_exact - pitch <= pitch - low_exact
        } else if high - low > OCTAVE {
            high - pitch <= pitch - low
        } else {
            prev_high - pitch <= pitch - prev_low
        };

        if to_top {
            top.notes.push(*note);
        } else {
            bottom.notes.push(*note);
        }

        if high - low > OCTAVE {
            prev_high = high;
            prev_low = low;
        }
    }

    top.sort_notes();
    bottom.sort_notes();
    vec![top, bottom]
}

/// Highest and lowest pitch among notes overlapping `[start, end)`, with
/// both this note's span and the others' limited to one measure.
fn overlapping_high_low(
    notes: &[Note],
    measure: i64,
    start_index: usize,
    start: i64,
    end: i64,
    pitch: i32,
) -> (i32, i32) {
    let end = end.min(start + measure);
    let (mut high, mut low) = (pitch, pitch);
    for n in notes[start_index.min(notes.len())..]
        .iter()
        .take_while(|n| n.start_time < end)
    {
        if n.end_time() < start || n.start_time + measure < start {
            continue;
        }
        high = high.max(n.pitch);
        low = low.min(n.pitch);
    }
    (high, low)
}

/// Highest and lowest pitch among notes starting exactly at `start`.
fn exact_high_low(notes: &[Note], start_index: usize, start: i64, pitch: i32) -> (i32, i32) {
    let (mut high, mut low) = (pitch, pitch);
    for n in notes[start_index.min(notes.len())..]
        .iter()
        .skip_while(|n| n.start_time < start)
        .take_while(|n| n.start_time == start)
    {
        high = high.max(n.pitch);
        low = low.min(n.pitch);
    }
    (high, low)
}

/// Merge the notes of several time-ordered tracks into one.
///
/// Notes come out ordered by start time then pitch (earlier tracks first on
/// full ties). Notes with the same start and pitch collapse into one that
/// keeps the longer duration.
pub fn combine_to_single_track(tracks: &[Track]) -> Track {
    let mut result = Track::new(1);
    match tracks {
        [] => return result,
        [only] => {
            result.notes = only.notes.clone();
            return result;
        }
        _ => {}
    }

    let mut index = vec![0usize; tracks.len()];
    loop {
        let mut lowest: Option<(usize, Note)> = None;
        for (t, track) in tracks.iter().enumerate() {
            let Some(note) = track.notes.get(index[t]) else {
                continue;
            };
            let better = match lowest {
                None => true,
                Some((_, l)) => {
                    note.start_time < l.start_time
                        || (note.start_time == l.start_time && note.pitch < l.pitch)
                }
            };
            if better {
                lowest = Some((t, *note));
            }
        }

        let Some((t, note)) = lowest else {
            break;
        };
        index[t] += 1;

        match result.notes.last_mut() {
            Some(prev) if prev.start_time == note.start_time && prev.pitch == note.pitch => {
                prev.duration = prev.duration.max(note.duration);
            }
            _ => result.notes.push(note),
        }
    }
    result
}

/// Merge all tracks and split the result into a top and bottom staff, as
/// for a piano score. Lyrics from every track are merged onto the top staff.
pub fn combine_to_two_tracks(tracks: &[Track], measure: i64) -> Vec<Track> {
    let single = combine_to_single_track(tracks);
    let mut result = split_track(&single, measure);

    let mut lyrics: Vec<Lyric> = tracks.iter().flat_map(|t| t.lyrics.iter().cloned()).collect();
    if !lyrics.is_empty() {
        lyrics.sort_by_key(|l| l.start_time);
        result[0].lyrics = lyrics;
    }
    result
}

/// Candidate measure lengths in pulses, smallest first.
///
/// A measure is assumed to last between 0.5 and 4 seconds. Onsets are
/// measured from the first note of the song and rounded down to a multiple
/// of 4 pulses; onsets within 0.06 seconds of the previous accepted onset
/// in the same track are skipped.
pub fn guess_measure_length(tracks: &[Track], time: &TimeSignature) -> Vec<i64> {
    let tempo = time.tempo.max(1);
    let pulses_per_second = (1_000_000.0 / tempo as f64 * time.quarter as f64) as i64;
    let min_measure = pulses_per_second / 2;
    let max_measure = pulses_per_second * 4;

    let first_note = tracks
        .iter()
        .filter_map(|t| t.notes.first())
        .map(|n| n.start_time)
        .fold(time.measure() * 5, i64::min);

    let interval = time.quarter as i64 * 60_000 / tempo as i64;

    let mut result: Vec<i64> = Vec::new();
    for track in tracks {
        let mut prev_time = 0;
        for note in &track.notes {
            if note.start_time - prev_time <= interval {
                continue;
            }
            prev_time = note.start_time;

            let from_first = (note.start_time - first_note) / 4 * 4;
            if from_first < min_measure {
                continue;
            }
            if from_first > max_measure {
                break;
            }
            if !result.contains(&from_first) {
                result.push(from_first);
            }
        }
    }
    result.sort_unstable();
    result
}

pub(crate) fn is_time_ordered(track: &Track) -> bool {
    track
        .notes
        .windows(2)
        .all(|w| w[0].start_time <= w[1].start_time)
}
