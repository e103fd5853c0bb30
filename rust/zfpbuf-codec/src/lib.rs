//! The array-codec seam of zfpbuf.
//!
//! This crate describes *what* a codec is handed (a [`FieldLayout`] and a
//! [`CompressionMode`]) and *what* it must do ([`ArrayCodec`]). The production
//! implementation, [`ZfpCodec`], drives the ZFP library through `zfp-sys` and
//! is available with the `zfp` feature (enabled by default).

pub mod codec;
pub mod layout;
pub mod mode;
pub mod scalar;

#[cfg(feature = "zfp")]
pub mod zfp;

pub use codec::ArrayCodec;
pub use layout::{Arity, FieldLayout, MAX_DIMENSIONS};
pub use mode::CompressionMode;
pub use scalar::{Scalar, ScalarType};

#[cfg(feature = "zfp")]
pub use zfp::ZfpCodec;
