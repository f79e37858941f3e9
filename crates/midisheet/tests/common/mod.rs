//! Builders for synthetic Standard MIDI Files.

#![allow(dead_code)]

use midisheet::rewrite::write_varlen;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Accumulates the bytes of one `MTrk` chunk body.
#[derive(Default)]
pub struct TrackBuilder {
    data: Vec<u8>,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event with an explicit status byte in `bytes`, or with
    /// running status if `bytes` starts with a data byte.
    pub fn raw(mut self, delta: u32, bytes: &[u8]) -> Self {
        write_varlen(&mut self.data, delta);
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn note_on(self, delta: u32, channel: u8, pitch: u8, velocity: u8) -> Self {
        self.raw(delta, &[0x90 | channel, pitch, velocity])
    }

    pub fn note_off(self, delta: u32, channel: u8, pitch: u8) -> Self {
        self.raw(delta, &[0x80 | channel, pitch, 0])
    }

    pub fn program(self, delta: u32, channel: u8, program: u8) -> Self {
        self.raw(delta, &[0xC0 | channel, program])
    }

    pub fn control(self, delta: u32, channel: u8, controller: u8, value: u8) -> Self {
        self.raw(delta, &[0xB0 | channel, controller, value])
    }

    pub fn tempo(self, delta: u32, micros: u32) -> Self {
        let b = micros.to_be_bytes();
        self.raw(delta, &[0xFF, 0x51, 0x03, b[1], b[2], b[3]])
    }

    pub fn time_signature(self, delta: u32, numerator: u8, denominator_pow: u8) -> Self {
        self.raw(delta, &[0xFF, 0x58, 0x04, numerator, denominator_pow, 0x18, 0x08])
    }

    pub fn lyric(self, delta: u32, text: &str) -> Self {
        let mut bytes = vec![0xFF, 0x05];
        write_varlen(&mut bytes, text.len() as u32);
        bytes.extend_from_slice(text.as_bytes());
        self.raw(delta, &bytes)
    }

    /// Append End-of-Track and return the chunk body.
    pub fn end(self) -> Vec<u8> {
        self.raw(0, &[0xFF, 0x2F, 0x00]).data
    }

    /// The chunk body without End-of-Track.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Assemble a complete file from track chunk bodies.
pub fn smf(format: u16, ppq: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&format.to_be_bytes());
    buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    buf.extend_from_slice(&ppq.to_be_bytes());
    for track in tracks {
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(track.len() as u32).to_be_bytes());
        buf.extend_from_slice(track);
    }
    buf
}

/// A two-track piece: a conductor track and a piano melody with chords.
pub fn piano_piece() -> Vec<u8> {
    let conductor = TrackBuilder::new()
        .time_signature(0, 4, 2)
        .tempo(0, 500_000)
        .end();
    let piano = TrackBuilder::new()
        .program(0, 0, 0)
        .note_on(0, 0, 48, 80)
        .note_on(0, 0, 64, 80)
        .note_on(10, 0, 67, 80)
        .note_off(470, 0, 64)
        .note_off(0, 0, 67)
        .note_on(0, 0, 72, 90)
        .note_off(480, 0, 48)
        .note_off(0, 0, 72)
        .note_on(0, 0, 50, 80)
        .note_on(240, 0, 74, 90)
        .note_off(240, 0, 50)
        .note_off(0, 0, 74)
        .end();
    smf(1, 480, &[conductor, piano])
}

/// A single format-0 track with piano on channel 0, bass on channel 1 and
/// drums on channel 9.
pub fn band_piece() -> Vec<u8> {
    let track = TrackBuilder::new()
        .tempo(0, 500_000)
        .program(0, 0, 0)
        .program(0, 1, 33)
        .control(0, 0, 7, 100)
        .note_on(0, 0, 72, 80)
        .note_on(0, 1, 36, 80)
        .note_on(0, 9, 42, 80)
        .note_off(240, 9, 42)
        .note_on(0, 9, 38, 80)
        .note_off(240, 0, 72)
        .note_off(0, 1, 36)
        .note_off(0, 9, 38)
        .note_on(0, 0, 74, 80)
        .note_off(480, 0, 74)
        .end();
    smf(0, 480, &[track])
}

/// A seeded generator so generated inputs repeat across runs.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
