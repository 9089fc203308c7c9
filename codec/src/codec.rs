//! Core codec traits

use crate::error::Error;
use bytes::{Buf, BufMut, BytesMut};

/// Trait for types that can be written (encoded) to a buffer.
pub trait Write {
    /// Encodes this value by writing to a buffer.
    ///
    /// Implementations should panic if the buffer doesn't have enough capacity.
    fn write(&self, buf: &mut impl BufMut);
}

/// Trait for types that know their exact encoded length.
pub trait EncodeSize {
    /// Returns the encoded length of this value.
    ///
    /// This method MUST return the exact number of bytes that will be written by `write()`.
    fn encode_size(&self) -> usize;
}

/// Trait for types with a known, fixed encoded length.
pub trait FixedSize {
    /// The length of the encoded value.
    const SIZE: usize;
}

// Types with a fixed size always know their encoded length.
impl<T: FixedSize> EncodeSize for T {
    fn encode_size(&self) -> usize {
        Self::SIZE
    }
}

/// Trait for types that can be read/decoded from a buffer.
///
/// The `Cfg` associated type allows for configuration during the read process. For example, it is
/// used to bound the number of items (and thus the allocation) when decoding untrusted data.
/// Use `()` for types that do not require configuration.
pub trait Read: Sized {
    /// The configuration required to read the value.
    type Cfg: Clone + Send + Sync + 'static;

    /// Reads a value from the buffer using the provided configuration `cfg`, consuming the
    /// necessary bytes.
    fn read_cfg(buf: &mut impl Buf, cfg: &Self::Cfg) -> Result<Self, Error>;
}

/// Trait for types that can be encoded to a buffer.
pub trait Encode: Write + EncodeSize {
    /// Encodes a value to a `BytesMut` buffer.
    ///
    /// Panics if the `write` implementation does not write the expected number of bytes.
    fn encode(&self) -> BytesMut {
        let len = self.encode_size();
        let mut buffer = BytesMut::with_capacity(len);
        self.write(&mut buffer);
        assert_eq!(buffer.len(), len, "write() did not write expected bytes");
        buffer
    }
}

impl<T: Write + EncodeSize> Encode for T {}

/// Trait for types that can be decoded from a buffer, ensuring the entire buffer is consumed.
pub trait Decode: Read {
    /// Decodes a value from a buffer, ensuring the buffer is fully consumed.
    fn decode_cfg(mut buf: impl Buf, cfg: &Self::Cfg) -> Result<Self, Error> {
        let result = Self::read_cfg(&mut buf, cfg)?;

        // Check that the buffer is fully consumed.
        let remaining = buf.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(result)
    }
}

impl<T: Read> Decode for T {}

/// Trait for types that can be encoded and decoded.
pub trait Codec: Encode + Decode {}

impl<T: Encode + Decode> Codec for T {}

/// Extension trait providing an ergonomic read method for types requiring no configuration.
pub trait ReadExt: Read<Cfg = ()> {
    /// Reads a value using the default `()` config.
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Self::read_cfg(buf, &())
    }
}

impl<T: Read<Cfg = ()>> ReadExt for T {}

/// Extension trait providing an ergonomic decode method for types requiring no configuration.
pub trait DecodeExt: Decode<Cfg = ()> {
    /// Decodes a value using the default `()` config.
    fn decode(buf: impl Buf) -> Result<Self, Error> {
        Self::decode_cfg(buf, &())
    }
}

impl<T: Decode<Cfg = ()>> DecodeExt for T {}
