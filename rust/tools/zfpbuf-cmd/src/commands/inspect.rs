//! Inspect command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use zfpbuf::{ArrayCodec, ZfpCodec};

use crate::{commands::decompress, utils};

#[derive(Serialize, Debug)]
pub struct StreamSummary {
    stream_bytes: usize,
    #[serde(rename = "type")]
    scalar_type: String,
    dimensions: u32,
    shape: Vec<usize>,
    stride: Vec<isize>,
    scalar_size: usize,
    decoded_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression_ratio: Option<f64>,
}

pub fn run(verbose: u8, stream_path: String) -> Result<()> {
    let stream = utils::read_input(&stream_path)?;
    let summary =
        summarize(&stream, verbose > 0).with_context(|| format!("Invalid stream {}", stream_path))?;
    let json =
        serde_json::to_string_pretty(&summary).context("Failed to serialize stream summary")?;
    println!("{}", json);
    Ok(())
}

/// Describes the stream header. With `decode` set the stream is fully decoded
/// to measure the compression ratio.
pub fn summarize(stream: &[u8], decode: bool) -> Result<StreamSummary> {
    let Some(layout) = ZfpCodec.read_header(stream) else {
        anyhow::bail!("stream does not start with a ZFP header");
    };
    let decoded_bytes = layout
        .byte_size()
        .context("stream header describes an array too large to address")?;

    let compression_ratio = if decode {
        let buffer = decompress::decode(stream)?;
        Some(buffer.size() as f64 / stream.len() as f64)
    } else {
        None
    };

    Ok(StreamSummary {
        stream_bytes: stream.len(),
        scalar_type: layout.scalar_type().name().to_string(),
        dimensions: layout.dimensions(),
        shape: layout.extents().to_vec(),
        stride: layout.effective_strides()[..layout.extents().len()].to_vec(),
        scalar_size: layout.scalar_type().size(),
        decoded_bytes,
        compression_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zfpbuf::{ArrayBuffer, CompressOptions};

    fn stream() -> Vec<u8> {
        let mut input = ArrayBuffer::new();
        input.load(&[1.5f32; 96], &[4, 4, 6], &[]).unwrap();
        let mut output = ArrayBuffer::new();
        let len = zfpbuf::compress(&ZfpCodec, &mut output, &input, &CompressOptions::reversible())
            .unwrap();
        output.storage()[..len].to_vec()
    }

    #[test]
    fn test_summarize() {
        let stream = stream();
        let summary = summarize(&stream, false).unwrap();
        assert_eq!(summary.scalar_type, "float");
        assert_eq!(summary.dimensions, 3);
        assert_eq!(summary.shape, vec![4, 4, 6]);
        assert_eq!(summary.stride, vec![1, 4, 16]);
        assert_eq!(summary.scalar_size, 4);
        assert_eq!(summary.decoded_bytes, 384);
        assert!(summary.compression_ratio.is_none());

        let summary = summarize(&stream, true).unwrap();
        assert!(summary.compression_ratio.unwrap() > 1.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "float");
    }

    #[test]
    fn test_summarize_rejects_garbage() {
        let err = summarize(b"not a zfp stream at all", false).unwrap_err();
        assert!(err.to_string().contains("ZFP header"));
    }
}
