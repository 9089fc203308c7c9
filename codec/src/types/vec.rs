//! Codec implementation for [`Vec`].
//!
//! Decoding requires a [`RangeCfg`] bounding the number of items (so an attacker cannot
//! force a large allocation) and the configuration of the item type.

use crate::{varint, EncodeSize, Error, RangeCfg, Read, Write};
use bytes::{Buf, BufMut};

impl<T: Write> Write for Vec<T> {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        let len = u32::try_from(self.len()).expect("Vec length exceeds u32");
        varint::write(len, buf);
        for item in self {
            item.write(buf);
        }
    }
}

impl<T: EncodeSize> EncodeSize for Vec<T> {
    #[inline]
    fn encode_size(&self) -> usize {
        let len = u32::try_from(self.len()).expect("Vec length exceeds u32");
        varint::size(len) + self.iter().map(EncodeSize::encode_size).sum::<usize>()
    }
}

impl<T: Read> Read for Vec<T> {
    type Cfg = (RangeCfg, T::Cfg);

    #[inline]
    fn read_cfg(buf: &mut impl Buf, (range, cfg): &Self::Cfg) -> Result<Self, Error> {
        let len = varint::read(buf)? as usize;
        if !range.contains(len) {
            return Err(Error::InvalidLength(len));
        }
        let mut vec = Vec::with_capacity(len);
        for _ in 0..len {
            vec.push(T::read_cfg(buf, cfg)?);
        }
        Ok(vec)
    }
}
