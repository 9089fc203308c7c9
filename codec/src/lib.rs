//! Serialize structured data.
//!
//! # Overview
//!
//! A binary serialization library designed to efficiently and safely:
//! - Serialize structured data into a binary format
//! - Deserialize untrusted binary input into structured data
//!
//! # Supported Types
//!
//! Natively supports:
//! - Primitives: `u8`, `u16`, `u32`, `u64`, `bool`, and `[u8; N]`
//! - Collections: `Vec<T>`, `Option<T>`, and [`bytes::Bytes`]
//!
//! Variable-length types require a [`RangeCfg`] when decoding so that untrusted input
//! cannot request an arbitrarily large allocation.
//!
//! # Example
//!
//! ```
//! use bytes::{Buf, BufMut};
//! use yoso_codec::{Decode, Encode, EncodeSize, Error, RangeCfg, Read, ReadExt, Write};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Item {
//!     index: u32,
//!     values: Vec<u64>,
//! }
//!
//! impl Write for Item {
//!     fn write(&self, buf: &mut impl BufMut) {
//!         self.index.write(buf);
//!         self.values.write(buf);
//!     }
//! }
//!
//! impl EncodeSize for Item {
//!     fn encode_size(&self) -> usize {
//!         self.index.encode_size() + self.values.encode_size()
//!     }
//! }
//!
//! impl Read for Item {
//!     type Cfg = usize;
//!
//!     fn read_cfg(buf: &mut impl Buf, max: &usize) -> Result<Self, Error> {
//!         let index = u32::read(buf)?;
//!         let values = Vec::<u64>::read_cfg(buf, &(RangeCfg::from(..=*max), ()))?;
//!         Ok(Self { index, values })
//!     }
//! }
//!
//! let item = Item { index: 1, values: vec![2, 3] };
//! let decoded = Item::decode_cfg(item.encode(), &2).unwrap();
//! assert_eq!(item, decoded);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod types;
pub mod varint;

pub use codec::{Codec, Decode, DecodeExt, Encode, EncodeSize, FixedSize, Read, ReadExt, Write};
pub use config::RangeCfg;
pub use error::Error;
