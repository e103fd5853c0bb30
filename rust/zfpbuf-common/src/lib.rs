//! Core definitions (error and result types) relied upon by all zfpbuf-* crates.

pub mod error;
pub mod result;

pub use error::{Error, ErrorKind};
pub use result::Result;
