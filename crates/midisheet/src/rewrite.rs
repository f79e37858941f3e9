//! Re-encoding raw events into playback bytes.
//!
//! [`apply_options`] retunes a copy of a file's raw events (tempo,
//! transposition, instruments, track or channel selection, start point) and
//! [`encode`] writes any event collection back out as a Standard MIDI File.
//! Every event is written with an explicit status byte.

use crate::container::MidiFile;
use crate::event::{EventKind, Meta, RawEvent};
use crate::instruments;
use crate::options::Options;
use crate::time::MAX_TEMPO;
use tracing::debug;

const CHANNELS: usize = 16;

/// Largest value a 4-byte variable-length quantity can hold.
pub const MAX_VARLEN: u32 = 0x0FFF_FFFF;

/// Apply playback `options` to a copy of the file's raw events.
///
/// Every track gets a tempo event at its start and existing tempo events
/// are set to the options tempo, capped at [`MAX_TEMPO`]. Note pitches are
/// transposed and clamped to 0..=127. Hidden or muted tracks are left out,
/// or, when the file was split by channel, their channels are silenced with
/// velocity 0. With a pause time set, playback starts at that pulse.
#[tracing::instrument(skip_all, fields(channel_split = midi.is_channel_split()))]
pub fn apply_options(midi: &MidiFile, options: &Options) -> Vec<Vec<RawEvent>> {
    let events = if midi.is_channel_split() {
        apply_per_channel(midi, options)
    } else {
        apply_per_track(midi, options)
    };
    debug!(tracks = events.len(), "applied playback options");
    events
}

fn apply_per_track(midi: &MidiFile, options: &Options) -> Vec<Vec<RawEvent>> {
    let raw = midi.events();

    // Options are indexed by note track; map them onto raw tracks.
    let mut instruments = vec![0u8; raw.len()];
    let mut keep = vec![true; raw.len()];
    for (index, track) in midi.tracks().iter().enumerate() {
        if track.number >= raw.len() {
            continue;
        }
        instruments[track.number] = options.instrument(index);
        if options.is_silenced(index) {
            keep[track.number] = false;
        }
    }

    let mut events = with_tempo(raw, options.tempo);
    for (number, track) in events.iter_mut().enumerate() {
        for event in track.iter_mut() {
            retune(&mut event.kind, options);
            if !options.use_default_instruments {
                if let EventKind::ProgramChange { program, .. } = &mut event.kind {
                    retarget(program, instruments[number]);
                }
            }
        }
    }

    if options.pause_time > 0 {
        events = start_at_pause_time(&events, options.pause_time);
    }

    events
        .into_iter()
        .zip(keep)
        .filter_map(|(track, keep)| keep.then_some(track))
        .collect()
}

fn apply_per_channel(midi: &MidiFile, options: &Options) -> Vec<Vec<RawEvent>> {
    let mut instruments = [0u8; CHANNELS];
    let mut keep = [true; CHANNELS];
    for (index, track) in midi.tracks().iter().enumerate() {
        let Some(first) = track.notes.first() else {
            continue;
        };
        let channel = (first.channel & 0x0F) as usize;
        instruments[channel] = options.instrument(index);
        if options.is_silenced(index) {
            keep[channel] = false;
        }
    }

    let mut events = with_tempo(midi.events(), options.tempo);
    for event in events.iter_mut().flatten() {
        retune(&mut event.kind, options);
        match &mut event.kind {
            EventKind::NoteOn {
                channel, velocity, ..
            }
            | EventKind::NoteOff {
                channel, velocity, ..
            } if !keep[(*channel & 0x0F) as usize] => {
                *velocity = 0;
            }
            EventKind::ProgramChange { channel, program } if !options.use_default_instruments => {
                retarget(program, instruments[(*channel & 0x0F) as usize]);
            }
            _ => {}
        }
    }

    if options.pause_time > 0 {
        events = start_at_pause_time(&events, options.pause_time);
    }
    events
}

fn with_tempo(raw: &[Vec<RawEvent>], tempo: u32) -> Vec<Vec<RawEvent>> {
    raw.iter()
        .map(|track| {
            let mut events = Vec::with_capacity(track.len() + 1);
            events.push(RawEvent::tempo(tempo.min(MAX_TEMPO)));
            events.extend(track.iter().cloned());
            events
        })
        .collect()
}

/// Percussion is not a program; its channel keeps whatever it had.
fn retarget(program: &mut u8, instrument: u8) {
    if instrument != instruments::PERCUSSION {
        *program = instrument;
    }
}

fn retune(kind: &mut EventKind, options: &Options) {
    match kind {
        EventKind::NoteOn { pitch, .. }
        | EventKind::NoteOff { pitch, .. }
        | EventKind::KeyPressure { pitch, .. } => {
            *pitch = (*pitch as i32 + options.transpose).clamp(0, 127) as u8;
        }
        EventKind::Meta(Meta::Tempo(tempo)) => *tempo = options.tempo.min(MAX_TEMPO),
        _ => {}
    }
}

/// Make each track start playing at `pause_time` pulses.
///
/// Before the pause, notes are dropped, controller changes are collapsed to
/// the last value per channel and controller, and everything else is kept.
/// All of these play immediately. The first event at or after the pause is
/// delayed by its distance from the pause; later events keep their deltas.
pub fn start_at_pause_time(tracks: &[Vec<RawEvent>], pause_time: u64) -> Vec<Vec<RawEvent>> {
    tracks
        .iter()
        .map(|events| {
            let mut result: Vec<RawEvent> = Vec::with_capacity(events.len());
            let mut found_after_pause = false;

            for event in events {
                let mut event = event.clone();
                if event.start_time < pause_time {
                    if event.kind.is_note() {
                        continue;
                    }
                    event.delta_time = 0;
                    if let EventKind::ControlChange {
                        channel,
                        controller,
                        value,
                    } = event.kind
                    {
                        let existing = result.iter_mut().find_map(|e| match &mut e.kind {
                            EventKind::ControlChange {
                                channel: c,
                                controller: n,
                                value: v,
                            } if *c == channel && *n == controller => Some(v),
                            _ => None,
                        });
                        if let Some(v) = existing {
                            *v = value;
                            continue;
                        }
                    }
                    result.push(event);
                } else if !found_after_pause {
                    let delay = event.start_time - pause_time;
                    event.delta_time = u32::try_from(delay).unwrap_or(MAX_VARLEN);
                    found_after_pause = true;
                    result.push(event);
                } else {
                    result.push(event);
                }
            }
            result
        })
        .collect()
}

/// Append `value` as a variable-length quantity. Only the low 28 bits are
/// written.
pub fn write_varlen(buf: &mut Vec<u8>, value: u32) {
    let value = value & MAX_VARLEN;
    let mut shift = 21;
    while shift > 0 && value >> shift == 0 {
        shift -= 7;
    }
    while shift > 0 {
        buf.push(((value >> shift) & 0x7F) as u8 | 0x80);
        shift -= 7;
    }
    buf.push((value & 0x7F) as u8);
}

/// Encode tracks of events as a complete Standard MIDI File.
pub fn encode(tracks: &[Vec<RawEvent>], format: u16, pulses_per_quarter: u16) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&format.to_be_bytes());
    buf.extend_from_slice(&(tracks.len().min(u16::MAX as usize) as u16).to_be_bytes());
    buf.extend_from_slice(&pulses_per_quarter.to_be_bytes());

    for events in tracks {
        let data = encode_track(events);
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&data);
    }
    buf
}

fn encode_track(events: &[RawEvent]) -> Vec<u8> {
    let mut buf = Vec::new();
    for event in events {
        write_varlen(&mut buf, event.delta_time);
        buf.push(event.kind.status());
        match &event.kind {
            EventKind::NoteOff {
                pitch, velocity, ..
            }
            | EventKind::NoteOn {
                pitch, velocity, ..
            } => buf.extend_from_slice(&[*pitch, *velocity]),
            EventKind::KeyPressure {
                pitch, pressure, ..
            } => buf.extend_from_slice(&[*pitch, *pressure]),
            EventKind::ControlChange {
                controller, value, ..
            } => buf.extend_from_slice(&[*controller, *value]),
            EventKind::ProgramChange { program, .. } => buf.push(*program),
            EventKind::ChannelPressure { pressure, .. } => buf.push(*pressure),
            EventKind::PitchBend { value, .. } => buf.extend_from_slice(&value.to_be_bytes()),
            EventKind::Sysex { data, .. } => {
                write_varlen(&mut buf, data.len() as u32);
                buf.extend_from_slice(data);
            }
            EventKind::Meta(meta) => {
                buf.push(meta.kind());
                match meta {
                    Meta::Tempo(tempo) => {
                        buf.push(3);
                        buf.extend_from_slice(&(*tempo).min(MAX_TEMPO).to_be_bytes()[1..]);
                    }
                    Meta::TimeSignature { data, .. } | Meta::Other { data, .. } => {
                        write_varlen(&mut buf, data.len() as u32);
                        buf.extend_from_slice(data);
                    }
                }
            }
        }
    }
    buf
}
