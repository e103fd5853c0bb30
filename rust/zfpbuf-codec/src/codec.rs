use crate::{CompressionMode, FieldLayout};

/// An external array codec: writes a self-describing header followed by the
/// encoded payload, and reads it back.
///
/// The methods mirror the codec's C surface, in that failures are reported as
/// zero bytes written or produced; the endpoints built on top of this trait
/// turn those into typed errors.
pub trait ArrayCodec {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Encodes the array described by `field`, whose origin is the first byte
    /// of `src`, into `dest` as a full header followed by the payload.
    ///
    /// Returns the total number of bytes written to the front of `dest`, or
    /// zero if encoding failed (including when the result does not fit).
    /// Implementations must not read `src` beyond
    /// [`FieldLayout::required_bytes`] and must fail rather than read out of
    /// bounds when `src` is shorter.
    fn compress(
        &self,
        field: &FieldLayout,
        mode: &CompressionMode,
        src: &[u8],
        dest: &mut [u8],
    ) -> usize;

    /// Parses the header at the front of `src`. The recovered layout has
    /// contiguous (zero) strides.
    fn read_header(&self, src: &[u8]) -> Option<FieldLayout>;

    /// Decodes the stream in `src` into `dest`, which must hold at least
    /// [`FieldLayout::byte_size`] bytes. `field` is the layout previously
    /// returned by [`ArrayCodec::read_header`] for the same stream.
    ///
    /// Returns a non-zero byte count on success and zero on failure.
    fn decompress(&self, src: &[u8], field: &FieldLayout, dest: &mut [u8]) -> usize;
}

impl<C: ArrayCodec + ?Sized> ArrayCodec for &C {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn compress(
        &self,
        field: &FieldLayout,
        mode: &CompressionMode,
        src: &[u8],
        dest: &mut [u8],
    ) -> usize {
        (**self).compress(field, mode, src, dest)
    }

    fn read_header(&self, src: &[u8]) -> Option<FieldLayout> {
        (**self).read_header(src)
    }

    fn decompress(&self, src: &[u8], field: &FieldLayout, dest: &mut [u8]) -> usize {
        (**self).decompress(src, field, dest)
    }
}

impl<C: ArrayCodec + ?Sized> ArrayCodec for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn compress(
        &self,
        field: &FieldLayout,
        mode: &CompressionMode,
        src: &[u8],
        dest: &mut [u8],
    ) -> usize {
        (**self).compress(field, mode, src, dest)
    }

    fn read_header(&self, src: &[u8]) -> Option<FieldLayout> {
        (**self).read_header(src)
    }

    fn decompress(&self, src: &[u8], field: &FieldLayout, dest: &mut [u8]) -> usize {
        (**self).decompress(src, field, dest)
    }
}
