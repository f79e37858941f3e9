//! Typed MIDI track events.

use serde::{Deserialize, Serialize};

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const KEY_PRESSURE: u8 = 0xA0;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_PRESSURE: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;
pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_ESCAPE: u8 = 0xF7;
pub const META: u8 = 0xFF;

pub const META_SEQUENCE: u8 = 0x00;
pub const META_TEXT: u8 = 0x01;
pub const META_COPYRIGHT: u8 = 0x02;
pub const META_TRACK_NAME: u8 = 0x03;
pub const META_INSTRUMENT: u8 = 0x04;
pub const META_LYRIC: u8 = 0x05;
pub const META_MARKER: u8 = 0x06;
pub const META_END_OF_TRACK: u8 = 0x2F;
pub const META_TEMPO: u8 = 0x51;
pub const META_SMPTE_OFFSET: u8 = 0x54;
pub const META_TIME_SIGNATURE: u8 = 0x58;
pub const META_KEY_SIGNATURE: u8 = 0x59;

/// One decoded event of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Pulses since the previous event in the same track.
    pub delta_time: u32,
    /// Absolute time in pulses from the start of the track.
    pub start_time: u64,
    pub kind: EventKind,
}

/// Which of the two sysex status bytes introduced a sysex event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SysexKind {
    /// 0xF0
    Start,
    /// 0xF7
    Escape,
}

impl SysexKind {
    pub fn status(self) -> u8 {
        match self {
            SysexKind::Start => SYSEX_START,
            SysexKind::Escape => SYSEX_ESCAPE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    KeyPressure { channel: u8, pitch: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// The two data bytes as read, high byte first.
    PitchBend { channel: u8, value: u16 },
    Sysex { kind: SysexKind, data: Vec<u8> },
    Meta(Meta),
}

/// Meta events, with tempo and time signature decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meta {
    /// Microseconds per quarter note.
    Tempo(u32),
    /// `data` keeps the original payload so clocks-per-click and
    /// 32nds-per-quarter survive re-encoding.
    TimeSignature {
        numerator: u8,
        denominator: u32,
        data: Vec<u8>,
    },
    Other { kind: u8, data: Vec<u8> },
}

impl Meta {
    /// The meta subkind byte.
    pub fn kind(&self) -> u8 {
        match self {
            Meta::Tempo(_) => META_TEMPO,
            Meta::TimeSignature { .. } => META_TIME_SIGNATURE,
            Meta::Other { kind, .. } => *kind,
        }
    }
}

impl EventKind {
    /// Channel of a channel-voice event; `None` for sysex and meta.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            EventKind::NoteOff { channel, .. }
            | EventKind::NoteOn { channel, .. }
            | EventKind::KeyPressure { channel, .. }
            | EventKind::ControlChange { channel, .. }
            | EventKind::ProgramChange { channel, .. }
            | EventKind::ChannelPressure { channel, .. }
            | EventKind::PitchBend { channel, .. } => Some(channel),
            EventKind::Sysex { .. } | EventKind::Meta(_) => None,
        }
    }

    /// The status byte this event is written with.
    pub fn status(&self) -> u8 {
        let channel = self.channel().unwrap_or(0) & 0x0F;
        match self {
            EventKind::NoteOff { .. } => NOTE_OFF | channel,
            EventKind::NoteOn { .. } => NOTE_ON | channel,
            EventKind::KeyPressure { .. } => KEY_PRESSURE | channel,
            EventKind::ControlChange { .. } => CONTROL_CHANGE | channel,
            EventKind::ProgramChange { .. } => PROGRAM_CHANGE | channel,
            EventKind::ChannelPressure { .. } => CHANNEL_PRESSURE | channel,
            EventKind::PitchBend { .. } => PITCH_BEND | channel,
            EventKind::Sysex { kind, .. } => kind.status(),
            EventKind::Meta(_) => META,
        }
    }

    /// True for Note-On and Note-Off, the events dropped before a pause point.
    pub fn is_note(&self) -> bool {
        matches!(self, EventKind::NoteOn { .. } | EventKind::NoteOff { .. })
    }
}

impl RawEvent {
    /// A tempo meta event at the very start of a track.
    pub fn tempo(micros_per_quarter: u32) -> Self {
        Self {
            delta_time: 0,
            start_time: 0,
            kind: EventKind::Meta(Meta::Tempo(micros_per_quarter)),
        }
    }

    pub fn tempo_value(&self) -> Option<u32> {
        match self.kind {
            EventKind::Meta(Meta::Tempo(tempo)) => Some(tempo),
            _ => None,
        }
    }

    /// Numerator and denominator of a time signature meta event.
    pub fn time_signature(&self) -> Option<(u8, u32)> {
        match self.kind {
            EventKind::Meta(Meta::TimeSignature {
                numerator,
                denominator,
                ..
            }) => Some((numerator, denominator)),
            _ => None,
        }
    }
}
