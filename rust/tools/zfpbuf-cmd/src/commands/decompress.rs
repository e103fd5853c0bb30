//! Decompress command implementation

use anyhow::{Context, Result};
use zfpbuf::{ArrayBuffer, ZfpCodec};

use crate::{commands::write_output, utils};

pub fn run(input: String, output: String) -> Result<()> {
    let stream = utils::read_input(&input)?;
    let buffer = decode(&stream).with_context(|| format!("Failed to decompress {}", input))?;
    write_output(&output, buffer.data())?;

    println!(
        "Decompressed {} into {}: {} {:?} ({})",
        input,
        output,
        buffer.scalar_type().map_or("<unset>", |t| t.name()),
        &buffer.shape()[..buffer.dimensions() as usize],
        utils::format_size(buffer.size() as u64)
    );
    Ok(())
}

/// Decodes a whole ZFP stream into a fresh descriptor.
pub fn decode(stream: &[u8]) -> Result<ArrayBuffer> {
    let mut buffer = ArrayBuffer::new();
    zfpbuf::decompress(&ZfpCodec, &mut buffer, stream)?;
    Ok(buffer)
}
