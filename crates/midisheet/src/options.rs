use crate::container::MidiFile;
use crate::instruments;
use crate::time::TimeSignature;
use serde::{Deserialize, Serialize};

/// Default chord-combine interval in milliseconds.
pub const DEFAULT_COMBINE_INTERVAL: u32 = 40;

/// Display and playback settings applied to a parsed file.
///
/// The per-track vectors are indexed like [`MidiFile::tracks`]. Indices past
/// the end of a vector count as visible, unmuted, and instrument 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Which tracks to display.
    pub tracks: Vec<bool>,
    /// Which tracks to silence on playback.
    pub mute: Vec<bool>,
    /// Program to play each track with when `use_default_instruments` is off.
    pub instruments: Vec<u8>,
    pub use_default_instruments: bool,
    /// Semitones to shift every note.
    pub transpose: i32,
    /// Pulses to shift every note start.
    pub shift_time: i64,
    /// Notes starting within this many milliseconds become one chord.
    pub combine_interval: u32,
    /// Merge all tracks into a treble and a bass staff.
    pub two_staffs: bool,
    /// Replaces the file's time signature when rounding durations.
    pub time: Option<TimeSignature>,
    /// Microseconds per quarter note for playback.
    pub tempo: u32,
    /// Pulse at which playback starts.
    pub pause_time: u64,
}

impl Options {
    /// The defaults for a freshly opened file.
    pub fn for_file(midi: &MidiFile) -> Self {
        let tracks = midi.tracks();
        Self {
            tracks: tracks
                .iter()
                .map(|t| t.instrument != instruments::PERCUSSION)
                .collect(),
            mute: vec![false; tracks.len()],
            instruments: tracks.iter().map(|t| t.instrument).collect(),
            use_default_instruments: true,
            transpose: 0,
            shift_time: 0,
            combine_interval: DEFAULT_COMBINE_INTERVAL,
            two_staffs: tracks.len() == 1,
            time: None,
            tempo: midi.time().tempo,
            pause_time: 0,
        }
    }

    pub fn is_visible(&self, track: usize) -> bool {
        self.tracks.get(track).copied().unwrap_or(true)
    }

    pub fn is_muted(&self, track: usize) -> bool {
        self.mute.get(track).copied().unwrap_or(false)
    }

    /// True if the track is left out of playback, either hidden or muted.
    pub fn is_silenced(&self, track: usize) -> bool {
        !self.is_visible(track) || self.is_muted(track)
    }

    pub fn instrument(&self, track: usize) -> u8 {
        self.instruments.get(track).copied().unwrap_or(0)
    }
}
