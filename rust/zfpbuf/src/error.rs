//! Endpoint errors and their integer codes.
//!
//! Codes are scoped per endpoint: `-1` from compression and `-1` from
//! decompression denote different conditions.

use thiserror::Error;
use zfpbuf_bytes::AllocError;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("input buffer is missing")]
    MissingInput,

    #[error("output buffer is missing")]
    MissingOutput,

    #[error("output and input are the same buffer")]
    Aliased,

    #[error("input dimensionality {0} is outside 1..=4")]
    InvalidDimensions(u32),

    #[error("codec '{codec}' wrote no bytes")]
    CodecFailure { codec: String },

    #[error("output allocation failed: {0}")]
    Allocation(#[from] AllocError),

    #[error("invalid input layout: {0}")]
    InvalidLayout(String),
}

impl CompressError {
    pub fn code(&self) -> i32 {
        match self {
            CompressError::MissingInput => -1,
            CompressError::MissingOutput | CompressError::Aliased => -2,
            CompressError::InvalidDimensions(_) => -3,
            CompressError::CodecFailure { .. } => -4,
            CompressError::Allocation(_) => -5,
            CompressError::InvalidLayout(_) => -6,
        }
    }
}

#[derive(Debug, Error)]
pub enum DecompressError {
    #[error("output buffer is missing")]
    MissingOutput,

    #[error("source bytes are missing")]
    MissingSource,

    #[error("source lies inside the output arena")]
    Aliased,

    #[error("source does not start with a valid header")]
    InvalidHeader,

    #[error("codec '{codec}' produced no bytes")]
    CodecFailure { codec: String },

    #[error("output allocation failed: {0}")]
    Allocation(#[from] AllocError),
}

impl DecompressError {
    pub fn code(&self) -> i32 {
        match self {
            DecompressError::MissingOutput => -1,
            DecompressError::MissingSource | DecompressError::Aliased => -2,
            DecompressError::InvalidHeader => -3,
            DecompressError::CodecFailure { .. } => -4,
            DecompressError::Allocation(_) => -5,
        }
    }
}

impl From<CompressError> for zfpbuf_common::Error {
    fn from(e: CompressError) -> Self {
        match e {
            CompressError::Allocation(e) => e.into(),
            e => zfpbuf_common::Error::other("compress", e),
        }
    }
}

impl From<DecompressError> for zfpbuf_common::Error {
    fn from(e: DecompressError) -> Self {
        match e {
            DecompressError::Allocation(e) => e.into(),
            e => zfpbuf_common::Error::other("decompress", e),
        }
    }
}
