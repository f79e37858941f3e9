//! Decoding of a single `MTrk` event stream.

use crate::cursor::ByteCursor;
use crate::event::*;
use crate::{Error, Result};
use tracing::warn;

/// Decode the events of one track, starting at the cursor's offset and
/// running for `track_len` bytes.
///
/// Running status is honored: when the byte after a delta time is below
/// 0x80 the previous status byte applies again. If the data runs out while
/// reading a delta time, the events decoded so far are returned; truncation
/// anywhere else is an error.
pub fn decode_track(cursor: &mut ByteCursor<'_>, track_len: u32) -> Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    let track_end = cursor.offset().saturating_add(track_len as usize);
    let mut start_time: u64 = 0;
    let mut running_status: Option<u8> = None;

    while cursor.offset() < track_end {
        let (delta_time, peeked) = match read_delta(cursor) {
            Ok(v) => v,
            Err(Error::Truncated { offset }) => {
                warn!(offset, decoded = events.len(), "track data truncated, keeping events read so far");
                return Ok(events);
            }
            Err(e) => return Err(e),
        };
        start_time += delta_time as u64;

        if peeked >= 0x80 {
            running_status = Some(cursor.read_byte()?);
        }
        let status = match running_status {
            Some(status) => status,
            None => {
                return Err(Error::UnknownEventCode {
                    code: peeked,
                    offset: cursor.offset(),
                })
            }
        };

        let kind = decode_event(cursor, status)?;
        events.push(RawEvent {
            delta_time,
            start_time,
            kind,
        });
    }

    Ok(events)
}

fn read_delta(cursor: &mut ByteCursor<'_>) -> Result<(u32, u8)> {
    let delta = cursor.read_varlen()?;
    let peeked = cursor.peek()?;
    Ok((delta, peeked))
}

fn decode_event(cursor: &mut ByteCursor<'_>, status: u8) -> Result<EventKind> {
    let channel = status & 0x0F;
    let kind = match status & 0xF0 {
        NOTE_OFF => EventKind::NoteOff {
            channel,
            pitch: cursor.read_byte()?,
            velocity: cursor.read_byte()?,
        },
        NOTE_ON => EventKind::NoteOn {
            channel,
            pitch: cursor.read_byte()?,
            velocity: cursor.read_byte()?,
        },
        KEY_PRESSURE => EventKind::KeyPressure {
            channel,
            pitch: cursor.read_byte()?,
            pressure: cursor.read_byte()?,
        },
        CONTROL_CHANGE => EventKind::ControlChange {
            channel,
            controller: cursor.read_byte()?,
            value: cursor.read_byte()?,
        },
        PROGRAM_CHANGE => EventKind::ProgramChange {
            channel,
            program: cursor.read_byte()?,
        },
        CHANNEL_PRESSURE => EventKind::ChannelPressure {
            channel,
            pressure: cursor.read_byte()?,
        },
        PITCH_BEND => EventKind::PitchBend {
            channel,
            value: cursor.read_u16()?,
        },
        _ => match status {
            SYSEX_START | SYSEX_ESCAPE => {
                let len = cursor.read_varlen()? as usize;
                let data = cursor.read_bytes(len)?.to_vec();
                let kind = if status == SYSEX_START {
                    SysexKind::Start
                } else {
                    SysexKind::Escape
                };
                EventKind::Sysex { kind, data }
            }
            META => EventKind::Meta(decode_meta(cursor)?),
            _ => {
                return Err(Error::UnknownEventCode {
                    code: status,
                    offset: cursor.offset().saturating_sub(1),
                })
            }
        },
    };
    Ok(kind)
}

fn decode_meta(cursor: &mut ByteCursor<'_>) -> Result<Meta> {
    let kind = cursor.read_byte()?;
    let len = cursor.read_varlen()? as usize;
    let data = cursor.read_bytes(len)?;

    let meta = match kind {
        META_TIME_SIGNATURE => {
            let (numerator, denominator) = if data.len() < 2 {
                (0, 4)
            } else {
                (data[0], 1u32 << data[1].min(31))
            };
            Meta::TimeSignature {
                numerator,
                denominator,
                data: data.to_vec(),
            }
        }
        META_TEMPO => {
            if data.len() != 3 {
                return Err(Error::MalformedTempoEvent {
                    length: data.len(),
                    offset: cursor.offset(),
                });
            }
            Meta::Tempo(((data[0] as u32) << 16) | ((data[1] as u32) << 8) | data[2] as u32)
        }
        _ => Meta::Other {
            kind,
            data: data.to_vec(),
        },
    };
    Ok(meta)
}
