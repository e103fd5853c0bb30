//! Test utilities for the zfpbuf crates.
//!
//! - [`codec`]: deterministic stand-in codecs implementing
//!   [`zfpbuf_codec::ArrayCodec`], usable without the ZFP library, including
//!   one that fails on demand
//! - [`data_gen`]: synthetic arrays for round-trip and error-bound tests

pub mod codec;
pub mod data_gen;

pub use codec::{FaultyCodec, TestCodec};
