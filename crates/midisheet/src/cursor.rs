//! Sequential big-endian reader over an in-memory MIDI buffer.

use crate::{Error, Result};

/// Reads bytes, big-endian integers, ASCII tags and variable-length
/// quantities from a byte slice.
///
/// A read that would run past the end of the buffer fails with
/// [`Error::Truncated`] and leaves the offset unchanged.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The whole underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn check(&self, amount: usize) -> Result<()> {
        match self.offset.checked_add(amount) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(Error::Truncated {
                offset: self.offset,
            }),
        }
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&self) -> Result<u8> {
        self.check(1)?;
        Ok(self.data[self.offset])
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.check(1)?;
        let b = self.data[self.offset];
        self.offset += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, amount: usize) -> Result<&'a [u8]> {
        self.check(amount)?;
        let bytes = &self.data[self.offset..self.offset + amount];
        self.offset += amount;
        Ok(bytes)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a fixed-length ASCII tag such as `MThd`.
    pub fn read_ascii(&mut self, len: usize) -> Result<String> {
        let b = self.read_bytes(len)?;
        Ok(b.iter().map(|&c| c as char).collect())
    }

    /// Read a variable-length quantity of 1 to 4 bytes.
    ///
    /// Each byte carries 7 data bits; a set high bit means another byte
    /// follows. Reading stops after the fourth byte regardless.
    pub fn read_varlen(&mut self) -> Result<u32> {
        let start = self.offset;
        let mut b = self.read_byte()?;
        let mut result = (b & 0x7F) as u32;
        for _ in 0..3 {
            if b & 0x80 == 0 {
                break;
            }
            b = match self.read_byte() {
                Ok(b) => b,
                Err(e) => {
                    self.offset = start;
                    return Err(e);
                }
            };
            result = (result << 7) | (b & 0x7F) as u32;
        }
        Ok(result)
    }

    pub fn skip(&mut self, amount: usize) -> Result<()> {
        self.check(amount)?;
        self.offset += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_integers() {
        let data = [0x12, 0x34, 0xDE, 0xAD, 0xBE, 0xEF];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(cursor.offset(), 6);
    }

    #[test]
    fn peek_does_not_advance() {
        let data = [0x90, 0x3C];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.peek().unwrap(), 0x90);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.read_byte().unwrap(), 0x90);
        assert_eq!(cursor.peek().unwrap(), 0x3C);
    }

    #[test]
    fn reads_ascii_tag() {
        let mut cursor = ByteCursor::new(b"MThdrest");
        assert_eq!(cursor.read_ascii(4).unwrap(), "MThd");
        assert_eq!(cursor.offset(), 4);
    }

    #[test]
    fn varlen_examples() {
        let cases: [(&[u8], u32); 6] = [
            (&[0x00], 0),
            (&[0x7F], 0x7F),
            (&[0x81, 0x00], 0x80),
            (&[0x83, 0x60], 480),
            (&[0xFF, 0x7F], 0x3FFF),
            (&[0xFF, 0xFF, 0xFF, 0x7F], 0x0FFF_FFFF),
        ];
        for (bytes, expected) in cases {
            let mut cursor = ByteCursor::new(bytes);
            assert_eq!(cursor.read_varlen().unwrap(), expected, "bytes {:02x?}", bytes);
            assert_eq!(cursor.offset(), bytes.len());
        }
    }

    #[test]
    fn varlen_stops_after_four_bytes() {
        let data = [0x81, 0x80, 0x80, 0x80, 0x05];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_varlen().unwrap();
        assert_eq!(cursor.offset(), 4);
    }

    #[test]
    fn truncated_read_reports_offset() {
        let data = [0x00, 0x01, 0x02];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(2).unwrap();
        match cursor.read_u16() {
            Err(Error::Truncated { offset }) => assert_eq!(offset, 2),
            other => panic!("expected truncation, got {:?}", other),
        }
        assert_eq!(cursor.offset(), 2);
    }

    #[test]
    fn truncated_varlen_rewinds() {
        let data = [0x00, 0x81, 0x80];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(1).unwrap();
        assert!(matches!(
            cursor.read_varlen(),
            Err(Error::Truncated { offset: 3 })
        ));
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn empty_buffer_is_truncated() {
        let cursor = ByteCursor::new(&[]);
        assert!(matches!(cursor.peek(), Err(Error::Truncated { offset: 0 })));
    }
}
