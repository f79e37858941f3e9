//! The parsed contents of a Standard MIDI File.

use crate::channels::split_channels;
use crate::cursor::ByteCursor;
use crate::decode::decode_track;
use crate::event::RawEvent;
use crate::note::{assemble_track, Track};
use crate::options::Options;
use crate::rewrite;
use crate::time::{TimeSignature, DEFAULT_TEMPO};
use crate::transform;
use crate::{Error, Result};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A decoded MIDI file.
///
/// Holds every track's raw events, for re-encoding, alongside the tracks
/// that contain notes, for display. The note tracks are never changed after
/// parsing; [`MidiFile::change_notes`] works on copies.
#[derive(Debug, Clone)]
pub struct MidiFile {
    name: Option<String>,
    format: u16,
    pulses_per_quarter: u16,
    events: Vec<Vec<RawEvent>>,
    tracks: Vec<Track>,
    time: TimeSignature,
    total_pulses: i64,
    channel_split: bool,
}

impl MidiFile {
    /// Read and parse the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut midi = Self::parse(&data)?;
        midi.name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(midi)
    }

    /// Parse a complete file held in memory.
    #[tracing::instrument(skip_all, fields(len = data.len()))]
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);

        let id = cursor.read_ascii(4)?;
        if id != "MThd" {
            return Err(Error::HeaderMismatch {
                offset: 0,
                message: format!("expected MThd, found {id:?}"),
            });
        }
        let header_len = cursor.read_u32()?;
        if header_len != 6 {
            return Err(Error::HeaderMismatch {
                offset: 4,
                message: format!("header length is {header_len}, expected 6"),
            });
        }
        let format = cursor.read_u16()?;
        let track_count = cursor.read_u16()?;
        let pulses_per_quarter = cursor.read_u16()?;
        debug!(format, track_count, pulses_per_quarter, "read header");

        let mut events = Vec::with_capacity(track_count as usize);
        let mut tracks = Vec::new();
        for number in 0..track_count as usize {
            let id = cursor.read_ascii(4)?;
            if id != "MTrk" {
                return Err(Error::HeaderMismatch {
                    offset: cursor.offset() - 4,
                    message: format!("expected MTrk for track {number}, found {id:?}"),
                });
            }
            let track_len = cursor.read_u32()?;
            let track_events = decode_track(&mut cursor, track_len)?;
            let track = assemble_track(&track_events, number);
            debug!(
                track = number,
                events = track_events.len(),
                notes = track.notes.len(),
                "decoded track"
            );
            if !track.notes.is_empty() {
                tracks.push(track);
            }
            events.push(track_events);
        }

        let total_pulses = tracks
            .iter()
            .filter_map(|t| t.notes.last())
            .map(|n| n.end_time())
            .max()
            .unwrap_or(0);

        let mut channel_split = false;
        if let [only] = tracks.as_slice() {
            if only.has_multiple_channels() {
                let split = split_channels(only, &events[only.number]);
                debug!(channels = split.len(), "split single track by channel");
                tracks = split;
                channel_split = true;
            }
        }

        debug_assert!(
            tracks.iter().all(transform::is_time_ordered),
            "track notes out of order after parsing"
        );

        let time = derive_time_signature(&events, pulses_per_quarter);

        Ok(Self {
            name: None,
            format,
            pulses_per_quarter,
            events,
            tracks,
            time,
            total_pulses,
            channel_split,
        })
    }

    /// File name, when opened from a path.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Header format: 0 single track, 1 simultaneous tracks, 2 independent.
    pub fn format(&self) -> u16 {
        self.format
    }

    pub fn pulses_per_quarter(&self) -> u16 {
        self.pulses_per_quarter
    }

    /// Raw events of every track in the file, including tracks without notes.
    pub fn events(&self) -> &[Vec<RawEvent>] {
        &self.events
    }

    /// Tracks that contain notes, or one track per channel in channel-split
    /// mode.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn time(&self) -> &TimeSignature {
        &self.time
    }

    /// Pulse at which the last note ends.
    pub fn total_pulses(&self) -> i64 {
        self.total_pulses
    }

    /// True when a single multi-channel track was split into one track per
    /// channel.
    pub fn is_channel_split(&self) -> bool {
        self.channel_split
    }

    /// Start time of the latest note.
    pub fn end_time(&self) -> i64 {
        self.tracks
            .iter()
            .filter_map(|t| t.notes.last())
            .map(|n| n.start_time)
            .max()
            .unwrap_or(0)
    }

    pub fn has_lyrics(&self) -> bool {
        self.tracks.iter().any(Track::has_lyrics)
    }

    /// Candidate measure lengths in pulses, smallest first.
    pub fn guess_measure_length(&self) -> Vec<i64> {
        transform::guess_measure_length(&self.tracks, &self.time)
    }

    /// The tracks to display with `options` applied.
    ///
    /// Hidden tracks are dropped, close onsets are merged into chords and
    /// durations rounded. The result is then optionally combined into two
    /// staves, shifted, and transposed.
    pub fn change_notes(&self, options: &Options) -> Vec<Track> {
        let mut tracks: Vec<Track> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(i, _)| options.is_visible(*i))
            .map(|(_, t)| t.clone())
            .collect();

        let time = options.time.unwrap_or(self.time);
        transform::round_start_times(&mut tracks, options.combine_interval, &self.time);
        transform::round_durations(&mut tracks, time.quarter);

        if options.two_staffs {
            tracks = transform::combine_to_two_tracks(&tracks, self.time.measure());
        }
        if options.shift_time != 0 {
            transform::shift_time(&mut tracks, options.shift_time);
        }
        if options.transpose != 0 {
            transform::transpose(&mut tracks, options.transpose);
        }
        tracks
    }

    /// Encode the file, with playback `options` applied if given.
    pub fn to_bytes(&self, options: Option<&Options>) -> Vec<u8> {
        let events: Cow<'_, [Vec<RawEvent>]> = match options {
            Some(options) => Cow::Owned(rewrite::apply_options(self, options)),
            None => Cow::Borrowed(&self.events),
        };
        rewrite::encode(&events, self.format, self.pulses_per_quarter)
    }

    /// Encode the file to `writer`. See [`MidiFile::to_bytes`].
    pub fn write_to<W: Write>(&self, mut writer: W, options: Option<&Options>) -> Result<()> {
        writer
            .write_all(&self.to_bytes(options))
            .and_then(|()| writer.flush())
            .map_err(|source| Error::Write { source })
    }

    /// Encode the file to a new file at `path`, replacing any existing one.
    pub fn write(&self, path: impl AsRef<Path>, options: Option<&Options>) -> Result<()> {
        std::fs::write(path, self.to_bytes(options)).map_err(|source| Error::Write { source })
    }
}

impl std::fmt::Display for MidiFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Midi File tracks={} quarter={}",
            self.tracks.len(),
            self.pulses_per_quarter
        )?;
        writeln!(f, "{}", self.time)?;
        for track in &self.tracks {
            writeln!(f, "{track}")?;
        }
        Ok(())
    }
}

/// First non-zero tempo and first time signature with a non-zero numerator,
/// across all tracks in file order.
fn derive_time_signature(events: &[Vec<RawEvent>], pulses_per_quarter: u16) -> TimeSignature {
    let tempo = events
        .iter()
        .flatten()
        .filter_map(RawEvent::tempo_value)
        .find(|&tempo| tempo != 0)
        .unwrap_or(DEFAULT_TEMPO);

    let (numerator, denominator) = events
        .iter()
        .flatten()
        .filter_map(RawEvent::time_signature)
        .find(|&(numerator, _)| numerator != 0)
        .map(|(numerator, denominator)| (numerator as u32, denominator))
        .unwrap_or((4, 4));

    TimeSignature::new(numerator, denominator, pulses_per_quarter as u32, tempo)
}
