//! zfpbuf: a boundary layer for compressing dense numeric arrays with an
//! external array codec (ZFP), and for managing the byte buffers that cross
//! that boundary.
//!
//! A host creates [`ArrayBuffer`] descriptors, fills an input descriptor with
//! an array (or supplies a compressed byte span), and calls one of the two
//! endpoints. Output descriptors are reused between calls: their arena only
//! grows, and only when a call needs more bytes than it holds.
//!
//! ```ignore
//! use zfpbuf::{ArrayBuffer, CompressOptions, ZfpCodec};
//!
//! let mut input = ArrayBuffer::new();
//! input.load(&[0f32; 16], &[4, 4], &[])?;
//!
//! let mut compressed = ArrayBuffer::new();
//! let len = zfpbuf::compress(&ZfpCodec, &mut compressed, &input, &CompressOptions::reversible())?;
//!
//! let mut decoded = ArrayBuffer::new();
//! zfpbuf::decompress(&ZfpCodec, &mut decoded, &compressed.storage()[..len])?;
//! assert_eq!(decoded.typed_data::<f32>()?, &[0f32; 16]);
//! ```
//!
//! The [`boundary`] module exposes the same operations with the integer
//! status contract of the host interface, and [`ffi`] exports them as a C ABI.

pub mod allocator;
pub mod boundary;
pub mod compress;
pub mod decompress;
pub mod descriptor;
pub mod error;
pub mod ffi;
pub mod options;

pub use compress::compress;
pub use decompress::decompress;
pub use descriptor::ArrayBuffer;
pub use error::{CompressError, DecompressError};
pub use options::CompressOptions;

pub use zfpbuf_codec::{ArrayCodec, Arity, CompressionMode, FieldLayout, Scalar, ScalarType};

#[cfg(feature = "zfp")]
pub use zfpbuf_codec::ZfpCodec;
