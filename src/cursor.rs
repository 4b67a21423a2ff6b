//! Byte-stream cursor over the raw instruction bytes.
//!
//! This is the only module that touches the input slice. Every multi-byte
//! read is little-endian, as x86 encodes all immediates and displacements.

use std::fmt;

/// An x86 instruction is at most 15 bytes long; a 16th byte is always an
/// encoding error, no matter how many input bytes remain.
pub const MAX_INSTR_LEN: usize = 15;

/// The cursor ran past the end of the supplied byte slice.
///
/// This is the single data-driven failure mode of the whole decoder: it means
/// "incomplete instruction at end of buffer" and is always recoverable by the
/// caller (feed more bytes, or stop).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OutOfData;

impl fmt::Display for OutOfData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("ran out of instruction bytes")
    }
}

/// A position-advancing read failed.
///
/// The two cases need different caller reactions: `OutOfData` can be cured
/// by supplying more input, `TooLong` never can — the bytes themselves are
/// an invalid encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The buffer ended mid-instruction.
    OutOfData,
    /// The instruction would exceed [`MAX_INSTR_LEN`] bytes.
    TooLong,
}

impl From<OutOfData> for ReadError {
    fn from(_: OutOfData) -> Self {
        ReadError::OutOfData
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadError::OutOfData => OutOfData.fmt(f),
            ReadError::TooLong => f.write_str("instruction longer than 15 bytes"),
        }
    }
}

/// Position-advancing reader over one instruction's bytes.
///
/// The cursor starts at `start` and never reads more than [`MAX_INSTR_LEN`]
/// bytes past it, even when the slice is longer.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    start: usize,
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8], start: usize) -> Self {
        Self { bytes, start, pos: start }
    }

    /// Offset of the next byte that will be read.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes consumed since the cursor was created.
    pub fn consumed(&self) -> usize {
        self.pos - self.start
    }

    /// Reads a single byte, advancing the position.
    pub fn read(&mut self) -> Result<u8, ReadError> {
        if self.consumed() == MAX_INSTR_LEN {
            return Err(ReadError::TooLong);
        }
        let b = *self.bytes.get(self.pos).ok_or(ReadError::OutOfData)?;
        self.pos += 1;
        Ok(b)
    }

    /// Returns the next byte without advancing.
    pub fn peek(&self) -> Result<u8, OutOfData> {
        self.peek_at(0)
    }

    /// Returns the byte `n` positions ahead without advancing.
    pub fn peek_at(&self, n: usize) -> Result<u8, OutOfData> {
        self.bytes.get(self.pos + n).copied().ok_or(OutOfData)
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        let lo = self.read()? as u16;
        let hi = self.read()? as u16;
        Ok(lo | hi << 8)
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        let lo = self.read_u16()? as u32;
        let hi = self.read_u16()? as u32;
        Ok(lo | hi << 16)
    }

    pub fn read_u64(&mut self) -> Result<u64, ReadError> {
        let lo = self.read_u32()? as u64;
        let hi = self.read_u32()? as u64;
        Ok(lo | hi << 32)
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadError> {
        Ok(self.read()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, ReadError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, ReadError> {
        Ok(self.read_u32()? as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let mut cur = ByteCursor::new(&[0x01, 0x02, 0x03, 0x04, 0x05], 0);
        assert_eq!(cur.read().unwrap(), 0x01);
        assert_eq!(cur.read_u16().unwrap(), 0x0302);
        assert_eq!(cur.consumed(), 3);
        assert_eq!(cur.peek().unwrap(), 0x04);
        assert_eq!(cur.consumed(), 3);
    }

    #[test]
    fn out_of_data() {
        let mut cur = ByteCursor::new(&[0xAA], 0);
        assert_eq!(cur.read().unwrap(), 0xAA);
        assert_eq!(cur.read(), Err(ReadError::OutOfData));
        // position does not move past the end
        assert_eq!(cur.consumed(), 1);
    }

    #[test]
    fn truncated_multibyte_read() {
        let mut cur = ByteCursor::new(&[0x11, 0x22, 0x33], 0);
        assert_eq!(cur.read_u32(), Err(ReadError::OutOfData));
    }

    #[test]
    fn length_limit() {
        // The 16th byte exists in the buffer but is still refused; more
        // input is not the cure here.
        let bytes = [0x90u8; 20];
        let mut cur = ByteCursor::new(&bytes, 0);
        for _ in 0..MAX_INSTR_LEN {
            cur.read().unwrap();
        }
        assert_eq!(cur.read(), Err(ReadError::TooLong));
        assert_eq!(cur.peek(), Ok(0x90));
    }

    #[test]
    fn starts_at_offset() {
        let mut cur = ByteCursor::new(&[0x00, 0x00, 0x42], 2);
        assert_eq!(cur.position(), 2);
        assert_eq!(cur.read().unwrap(), 0x42);
        assert_eq!(cur.consumed(), 1);
    }
}
