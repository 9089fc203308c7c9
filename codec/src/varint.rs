//! Variable-length integer encoding of lengths.
//!
//! Each byte uses 7 bits for the value and 1 "continuation" bit to indicate if more
//! bytes follow (the same layout as Protocol Buffers). Only `u32` is supported so that
//! lengths encode identically on 32-bit and 64-bit targets.

use crate::Error;
use bytes::{Buf, BufMut};

const DATA_BITS_PER_BYTE: usize = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// Maximum number of bytes a `u32` varint may occupy.
const MAX_BYTES: usize = 5;

/// Encodes a `u32` as a varint.
pub fn write(value: u32, buf: &mut impl BufMut) {
    let mut val = value;
    while val >= CONTINUATION_BIT_MASK as u32 {
        buf.put_u8((val as u8) | CONTINUATION_BIT_MASK);
        val >>= DATA_BITS_PER_BYTE;
    }
    buf.put_u8(val as u8);
}

/// Decodes a `u32` from a varint.
///
/// Rejects encodings that overflow 32 bits or use more bytes than necessary.
pub fn read(buf: &mut impl Buf) -> Result<u32, Error> {
    let mut result: u32 = 0;
    for i in 0..MAX_BYTES {
        if !buf.has_remaining() {
            return Err(Error::EndOfBuffer);
        }
        let byte = buf.get_u8();
        let shift = i * DATA_BITS_PER_BYTE;

        // The fifth byte may only carry the top 4 bits
        if i == MAX_BYTES - 1 && byte > 0x0F {
            return Err(Error::InvalidVarint);
        }
        result |= ((byte & DATA_BITS_MASK) as u32) << shift;

        if byte & CONTINUATION_BIT_MASK == 0 {
            // A trailing zero byte means the value had a shorter encoding
            if i > 0 && byte == 0 {
                return Err(Error::InvalidVarint);
            }
            return Ok(result);
        }
    }
    Err(Error::InvalidVarint)
}

/// Calculates the number of bytes needed to encode `value` as a varint.
pub fn size(value: u32) -> usize {
    let data_bits = 32 - value.leading_zeros() as usize;
    usize::max(1, data_bits.div_ceil(DATA_BITS_PER_BYTE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_varint_encoding() {
        let test_cases = [0u32, 1, 127, 128, 129, 0xFF, 0x3FFF, 0x4000, 0x1FFFFF, u32::MAX];
        for &value in &test_cases {
            let mut buf = Vec::new();
            write(value, &mut buf);
            assert_eq!(buf.len(), size(value));

            let mut read_buf = &buf[..];
            assert_eq!(read(&mut read_buf).unwrap(), value);
            assert_eq!(read_buf.len(), 0);
        }
    }

    #[test]
    fn test_varint_insufficient_buffer() {
        let mut buf = Bytes::from_static(&[0x80]);
        assert!(matches!(read(&mut buf), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_varint_overflow() {
        let mut buf = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]);
        assert!(matches!(read(&mut buf), Err(Error::InvalidVarint)));

        let mut buf = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        assert!(matches!(read(&mut buf), Err(Error::InvalidVarint)));
    }

    #[test]
    fn test_varint_non_canonical() {
        let mut buf = Bytes::from_static(&[0x81, 0x00]);
        assert!(matches!(read(&mut buf), Err(Error::InvalidVarint)));
    }
}
