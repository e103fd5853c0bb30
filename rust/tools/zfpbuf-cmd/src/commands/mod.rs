//! Command implementations for zfpbuf-cmd

use anyhow::{Context, Result};
use std::fs;

pub mod compress;
pub mod decompress;
pub mod inspect;

/// Writes `bytes` to `path`, replacing any existing file.
pub fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write file: {}", path))
}
