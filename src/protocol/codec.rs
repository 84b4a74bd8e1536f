//! Byte cursors and the encode/decode traits shared by every structure.
//!
//! Each structure lists its own fields in order against a [`Reader`] or
//! [`Writer`], so field order and widths are spelled out per type instead of
//! being discovered at runtime.

use crate::error::{KnxError, Result};

/// A structure with a known packed size that can be written into a buffer.
pub trait Encode {
    /// Number of bytes [`Encode::encode`] writes.
    fn size(&self) -> usize;

    /// Write the structure into `buf`, returning the number of bytes written.
    ///
    /// Fails with `BufferTooSmall` when `buf` is shorter than [`Encode::size`].
    fn encode(&self, buf: &mut [u8]) -> Result<usize>;
}

/// A structure that can be read from the front of a buffer.
pub trait Decode: Sized {
    /// Parse the structure, returning it with the number of bytes consumed.
    fn decode(data: &[u8]) -> Result<(Self, usize)>;
}

/// Read cursor over a byte slice.
///
/// Every shortfall is reported as `InvalidLength`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Unread tail of the buffer.
    pub(crate) fn rest(&self) -> &'a [u8] {
        self.buf.get(self.pos..).unwrap_or_default()
    }

    /// Move past `len` bytes consumed by a nested decoder.
    pub(crate) fn advance(&mut self, len: usize) -> Result<()> {
        self.read_exact(len).map(|_| ())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.buf.get(self.pos).ok_or_else(KnxError::invalid_length)?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(KnxError::invalid_length());
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..start + len])
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }

    pub(crate) fn read_be_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }
}

/// Write cursor over a mutable byte slice.
///
/// Every overflow is reported as `BufferTooSmall`.
#[derive(Debug)]
pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub(crate) fn write_u8(&mut self, value: u8) -> Result<()> {
        if self.remaining() < 1 {
            return Err(KnxError::buffer_too_small());
        }
        self.buf[self.pos] = value;
        self.pos += 1;
        Ok(())
    }

    pub(crate) fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.remaining() < data.len() {
            return Err(KnxError::buffer_too_small());
        }
        let end = self.pos + data.len();
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    pub(crate) fn write_be_u16(&mut self, value: u16) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Encode a nested structure at the current position.
    pub(crate) fn write_encoded<E: Encode + ?Sized>(&mut self, value: &E) -> Result<()> {
        let written = value.encode(&mut self.buf[self.pos..])?;
        self.pos += written;
        Ok(())
    }
}

/// Length byte for a structure, rejecting sizes that do not fit in one byte.
pub(crate) fn length_byte(size: usize) -> Result<u8> {
    u8::try_from(size).map_err(|_| KnxError::payload_too_large())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reads_values() {
        let mut r = Reader::new(&[1, 2, 3, 4, 5]);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_exact(2).unwrap(), &[2, 3]);
        assert_eq!(r.read_be_u16().unwrap(), 0x0405);
        assert_eq!(r.position(), 5);
        assert_eq!(r.remaining(), 0);
        assert!(r.rest().is_empty());
    }

    #[test]
    fn test_reader_rest_and_advance() {
        let mut r = Reader::new(&[1, 2, 3]);
        r.read_u8().unwrap();
        assert_eq!(r.rest(), &[2, 3]);
        r.advance(2).unwrap();
        assert!(r.advance(1).unwrap_err().is_invalid_length());
    }

    #[test]
    fn test_reader_bounds() {
        let mut r = Reader::new(&[1]);
        assert!(r.read_be_u16().unwrap_err().is_invalid_length());
        // A failed read does not advance
        assert_eq!(r.read_u8().unwrap(), 1);
        assert!(r.read_u8().unwrap_err().is_invalid_length());
    }

    #[test]
    fn test_writer_writes_values() {
        let mut buf = [0u8; 5];
        let mut w = Writer::new(&mut buf);
        w.write_u8(1).unwrap();
        w.write_all(&[2, 3]).unwrap();
        w.write_be_u16(0x0405).unwrap();
        assert_eq!(w.position(), 5);
        assert_eq!(buf, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_writer_bounds() {
        let mut buf = [0u8; 1];
        let mut w = Writer::new(&mut buf);
        w.write_u8(1).unwrap();
        assert!(w.write_u8(2).unwrap_err().is_buffer_too_small());
    }

    #[test]
    fn test_length_byte() {
        assert_eq!(length_byte(54).unwrap(), 54);
        assert_eq!(length_byte(256).unwrap_err().kind(), crate::error::ErrorKind::PayloadTooLarge);
    }
}
