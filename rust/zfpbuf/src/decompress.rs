//! The decompression endpoint.

use zfpbuf_codec::ArrayCodec;

use crate::{ArrayBuffer, DecompressError};

/// Decodes the self-describing stream in `src` into `output`.
///
/// The array layout is recovered from the stream header; the arena is grown
/// to exactly the decoded size when its capacity is smaller. On success the
/// descriptor's type, dimensionality, shape, strides, scalar size and size all
/// describe the decoded array, with strides reported as their effective
/// contiguous values.
///
/// A malformed header leaves `output` untouched. A codec failure may leave
/// the arena grown, but the metadata and size are not updated.
pub fn decompress<C: ArrayCodec + ?Sized>(
    codec: &C,
    output: &mut ArrayBuffer,
    src: &[u8],
) -> Result<(), DecompressError> {
    let Some(layout) = codec.read_header(src) else {
        log::debug!(
            "{} rejected a {}-byte stream header",
            codec.name(),
            src.len()
        );
        return Err(DecompressError::InvalidHeader);
    };
    let Some(size) = layout.byte_size() else {
        log::debug!(
            "{} header describes an array too large to address: {:?}",
            codec.name(),
            layout.extents()
        );
        return Err(DecompressError::InvalidHeader);
    };

    output.ensure_capacity(size)?;

    let produced = codec.decompress(src, &layout, &mut output.storage_mut()[..size]);
    if produced == 0 {
        log::warn!(
            "{} failed to decode a {} {:?} array from {} bytes",
            codec.name(),
            layout.scalar_type(),
            layout.extents(),
            src.len()
        );
        return Err(DecompressError::CodecFailure {
            codec: codec.name().to_string(),
        });
    }

    output.assign_layout(&layout, size);
    log::debug!(
        "{} decoded {} bytes into a {} {:?} array",
        codec.name(),
        src.len(),
        layout.scalar_type(),
        layout.extents()
    );
    Ok(())
}
