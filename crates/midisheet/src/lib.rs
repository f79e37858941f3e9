//! MIDI file decoding and note transforms for sheet music display.
//!
//! This crate parses Standard MIDI Files into typed events, rebuilds the
//! notes of every track, and provides the transforms a notation view needs:
//! chord alignment, duration rounding, two-staff splitting, track merging,
//! transposition and time shifting. The [`rewrite`] module encodes the raw
//! events back to bytes, optionally retuned by playback [`Options`].
//!
//! # Example
//!
//! ```
//! use midisheet::{MidiFile, Options};
//!
//! let mut bytes = Vec::new();
//! bytes.extend_from_slice(b"MThd");
//! bytes.extend_from_slice(&6u32.to_be_bytes());
//! bytes.extend_from_slice(&[0, 1, 0, 1, 0x01, 0xE0]);
//! let track = [0x00, 0x90, 60, 64, 0x83, 0x60, 0x80, 60, 0, 0x00, 0xFF, 0x2F, 0x00];
//! bytes.extend_from_slice(b"MTrk");
//! bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
//! bytes.extend_from_slice(&track);
//!
//! let midi = MidiFile::parse(&bytes).unwrap();
//! assert_eq!(midi.tracks()[0].notes[0].duration, 480);
//!
//! let options = Options::for_file(&midi);
//! let staves = midi.change_notes(&options);
//! assert_eq!(staves.len(), 2);
//! ```

pub mod channels;
pub mod container;
pub mod cursor;
pub mod decode;
pub mod event;
pub mod instruments;
pub mod note;
pub mod options;
pub mod rewrite;
pub mod time;
pub mod transform;

pub use container::MidiFile;
pub use cursor::ByteCursor;
pub use event::{EventKind, Meta, RawEvent, SysexKind};
pub use note::{Lyric, Note, Track};
pub use options::Options;
pub use time::TimeSignature;

use std::path::PathBuf;

/// Errors from decoding, reading or writing MIDI data.
///
/// Every decode error carries the byte offset where it was detected.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("header mismatch at byte {offset}: {message}")]
    HeaderMismatch { offset: usize, message: String },

    #[error("MIDI data is truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("unknown event code {code:#04x} at byte {offset}")]
    UnknownEventCode { code: u8, offset: usize },

    #[error("tempo meta event has length {length}, expected 3 (byte {offset})")]
    MalformedTempoEvent { length: usize, offset: usize },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write MIDI data: {source}")]
    Write { source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
