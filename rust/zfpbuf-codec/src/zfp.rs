//! [`ArrayCodec`] backed by the ZFP library.
//!
//! All calls into `zfp-sys` go through two small owners, [`Field`] and
//! [`Stream`], that free their C allocations on drop. ZFP's bit streams read
//! and write whole 64-bit words, so every buffer handed to a stream is
//! word-aligned and large enough for the worst case the library reports;
//! sources and undersized destinations go through a padded scratch copy.
//!
//! Output arenas are sized to the uncompressed input, which is below that
//! worst case, so encoding normally lands in a per-thread scratch area that
//! is kept between calls and then copied out.

use std::{cell::RefCell, ffi::c_void, ptr::NonNull};

use zfp_sys as sys;

use crate::{ArrayCodec, Arity, CompressionMode, FieldLayout, ScalarType};

const WORD: usize = std::mem::size_of::<u64>();

thread_local!(static SCRATCH: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) });

/// The ZFP codec, writing and reading full ZFP headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZfpCodec;

impl ZfpCodec {
    pub const fn new() -> ZfpCodec {
        ZfpCodec
    }
}

impl ArrayCodec for ZfpCodec {
    fn name(&self) -> &str {
        "zfp"
    }

    fn compress(
        &self,
        layout: &FieldLayout,
        mode: &CompressionMode,
        src: &[u8],
        dest: &mut [u8],
    ) -> usize {
        match layout.required_bytes() {
            Some(required) if required <= src.len() => (),
            _ => {
                log::warn!(
                    "zfp: source of {} bytes does not cover the field {layout:?}",
                    src.len()
                );
                return 0;
            }
        }

        let Some(mut field) = Field::alloc() else {
            return 0;
        };
        field.set_type(layout.scalar_type());
        field.set_shape(layout);
        // zfp only reads through the field pointer while compressing.
        field.set_pointer(src.as_ptr() as *mut c_void);

        let Some(mut stream) = Stream::open() else {
            return 0;
        };
        stream.set_mode(mode, layout);
        let bound = stream.maximum_size(&field);

        if dest.len() >= bound && dest.as_ptr().align_offset(WORD) == 0 {
            // SAFETY: `dest` covers the worst-case stream size, is word
            // aligned and outlives `stream`, which is consumed by `encode`.
            return unsafe { encode(stream, &field, dest.as_mut_ptr(), dest.len()) };
        }

        with_scratch(bound, |scratch| {
            // SAFETY: as above, for the scratch words.
            let written = unsafe {
                encode(
                    stream,
                    &field,
                    scratch.as_mut_ptr().cast(),
                    scratch.len() * WORD,
                )
            };
            if written == 0 || written > dest.len() {
                log::debug!(
                    "zfp: encoded stream of {written} bytes does not fit into {} bytes",
                    dest.len()
                );
                return 0;
            }
            let bytes: &[u8] = bytemuck::cast_slice(scratch);
            dest[..written].copy_from_slice(&bytes[..written]);
            written
        })
        .unwrap_or(0)
    }

    fn read_header(&self, src: &[u8]) -> Option<FieldLayout> {
        Source::open(src, 0)?.field.layout()
    }

    fn decompress(&self, src: &[u8], layout: &FieldLayout, dest: &mut [u8]) -> usize {
        match layout.byte_size() {
            Some(size) if size <= dest.len() => (),
            _ => return 0,
        }

        // The first pass only learns the worst-case stream size, so that a
        // truncated payload decodes from zero padding rather than past the
        // end of the source.
        let Some(bound) = Source::open(src, 0).map(|s| s.stream.maximum_size(&s.field)) else {
            return 0;
        };
        let Some(mut source) = Source::open(src, bound) else {
            return 0;
        };
        match source.field.layout() {
            Some(found) if found.same_shape(layout) => (),
            _ => return 0,
        }
        source.field.set_pointer(dest.as_mut_ptr() as *mut c_void);
        source.stream.decompress(&mut source.field)
    }
}

/// Binds `stream` to `buffer`, writes a full header and the payload, and
/// returns the total stream size in bytes (zero on failure).
///
/// # Safety
///
/// `buffer` must be valid for writes of `len` bytes, aligned to 8 bytes, and
/// `len` must be at least the stream's maximum size for `field`.
unsafe fn encode(mut stream: Stream, field: &Field, buffer: *mut u8, len: usize) -> usize {
    if !unsafe { stream.bind(buffer, len) } {
        return 0;
    }
    if stream.write_header(field) == 0 {
        return 0;
    }
    stream.compress(field)
}

/// Runs `f` over this thread's encode scratch, grown to cover `bytes`.
/// Returns `None` if the scratch cannot be grown.
fn with_scratch<R>(bytes: usize, f: impl FnOnce(&mut [u64]) -> R) -> Option<R> {
    SCRATCH.with(|scratch| {
        let mut scratch = scratch.borrow_mut();
        let count = bytes.div_ceil(WORD);
        if scratch.len() < count {
            scratch.try_reserve_exact(count - scratch.len()).ok()?;
            scratch.resize(count, 0);
        }
        Some(f(&mut scratch[..count]))
    })
}

fn zeroed_words(bytes: usize) -> Option<Vec<u64>> {
    let count = bytes.div_ceil(WORD);
    let mut words = Vec::new();
    words.try_reserve_exact(count).ok()?;
    words.resize(count, 0);
    Some(words)
}

/// A stream bound to a padded, word-aligned copy of a source byte span, with
/// its header already parsed into `field`.
struct Source {
    // Declared first so it is dropped before the words it points into.
    stream: Stream,
    field: Field,
    _words: Vec<u64>,
}

impl Source {
    fn open(src: &[u8], min_len: usize) -> Option<Source> {
        // One extra word keeps the final partial word readable.
        let mut words = zeroed_words(src.len().max(min_len) + WORD)?;
        bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..src.len()].copy_from_slice(src);

        let mut stream = Stream::open()?;
        let mut field = Field::alloc()?;
        // SAFETY: the heap buffer of `words` does not move when the vector
        // is moved into `Source`, and `stream` is dropped before it.
        if !unsafe { stream.bind(words.as_mut_ptr().cast(), words.len() * WORD) } {
            return None;
        }
        if stream.read_header(&mut field) == 0 {
            return None;
        }
        Some(Source {
            stream,
            field,
            _words: words,
        })
    }
}

/// Owner of a `zfp_field`.
struct Field(NonNull<sys::zfp_field>);

impl Field {
    fn alloc() -> Option<Field> {
        // SAFETY: plain allocation, checked for null.
        NonNull::new(unsafe { sys::zfp_field_alloc() }).map(Field)
    }

    #[inline]
    fn as_ptr(&self) -> *mut sys::zfp_field {
        self.0.as_ptr()
    }

    fn set_type(&mut self, scalar_type: ScalarType) {
        // SAFETY: `self` owns a live field.
        unsafe {
            sys::zfp_field_set_type(self.as_ptr(), scalar_type.tag() as _);
        }
    }

    fn set_pointer(&mut self, pointer: *mut c_void) {
        // SAFETY: `self` owns a live field; the pointer is only dereferenced
        // by compress/decompress calls made while the caller keeps it valid.
        unsafe {
            sys::zfp_field_set_pointer(self.as_ptr(), pointer);
        }
    }

    /// Registers the extents and strides of `layout` for its arity.
    fn set_shape(&mut self, layout: &FieldLayout) {
        let field = self.as_ptr();
        let [nx, ny, nz, nw] = layout.shape();
        let [sx, sy, sz, sw] = layout.stride();
        // SAFETY: `self` owns a live field.
        unsafe {
            match layout.arity() {
                Arity::One => {
                    sys::zfp_field_set_size_1d(field, nx as _);
                    sys::zfp_field_set_stride_1d(field, sx as _);
                }
                Arity::Two => {
                    sys::zfp_field_set_size_2d(field, nx as _, ny as _);
                    sys::zfp_field_set_stride_2d(field, sx as _, sy as _);
                }
                Arity::Three => {
                    sys::zfp_field_set_size_3d(field, nx as _, ny as _, nz as _);
                    sys::zfp_field_set_stride_3d(field, sx as _, sy as _, sz as _);
                }
                Arity::Four => {
                    sys::zfp_field_set_size_4d(field, nx as _, ny as _, nz as _, nw as _);
                    sys::zfp_field_set_stride_4d(field, sx as _, sy as _, sz as _, sw as _);
                }
            }
        }
    }

    /// Introspects the field: type, dimensionality, extents and effective
    /// strides. Returns `None` for anything outside the supported kinds.
    fn layout(&self) -> Option<FieldLayout> {
        let field = self.as_ptr();
        let mut shape = [0usize; 4];
        let mut stride = [0isize; 4];
        // SAFETY: `self` owns a live field; both arrays hold the four
        // entries zfp writes at most.
        let (raw_type, dimensions, precision) = unsafe {
            sys::zfp_field_size(field, shape.as_mut_ptr().cast());
            sys::zfp_field_stride(field, stride.as_mut_ptr().cast());
            (
                sys::zfp_field_type(field),
                sys::zfp_field_dimensionality(field),
                sys::zfp_field_precision(field),
            )
        };
        let scalar_type = ScalarType::try_from(raw_type as u32).ok()?;
        let arity = Arity::try_from(dimensions as u32).ok()?;
        if precision as u32 != scalar_type.precision() {
            return None;
        }
        let layout = FieldLayout::new(scalar_type, arity, shape, stride);
        layout.byte_size().map(|_| layout)
    }
}

impl Drop for Field {
    fn drop(&mut self) {
        // SAFETY: allocated by `zfp_field_alloc` and freed exactly once.
        unsafe { sys::zfp_field_free(self.as_ptr()) }
    }
}

/// Owner of a `zfp_stream` and the bit stream currently bound to it.
struct Stream {
    zfp: NonNull<sys::zfp_stream>,
    bits: Option<NonNull<sys::bitstream>>,
}

impl Stream {
    fn open() -> Option<Stream> {
        // SAFETY: a stream may be opened without a bit stream and bound later.
        let zfp = NonNull::new(unsafe { sys::zfp_stream_open(std::ptr::null_mut()) })?;
        Some(Stream { zfp, bits: None })
    }

    #[inline]
    fn as_ptr(&self) -> *mut sys::zfp_stream {
        self.zfp.as_ptr()
    }

    fn set_mode(&mut self, mode: &CompressionMode, layout: &FieldLayout) {
        let zfp = self.as_ptr();
        // SAFETY: `self` owns a live stream.
        unsafe {
            match *mode {
                CompressionMode::FixedAccuracy { tolerance } => {
                    sys::zfp_stream_set_accuracy(zfp, tolerance);
                }
                CompressionMode::FixedRate { rate } => {
                    sys::zfp_stream_set_rate(
                        zfp,
                        rate,
                        layout.scalar_type().tag() as _,
                        layout.dimensions() as _,
                        0,
                    );
                }
                CompressionMode::FixedPrecision { precision } => {
                    sys::zfp_stream_set_precision(zfp, precision as _);
                }
                CompressionMode::Reversible => {
                    sys::zfp_stream_set_reversible(zfp);
                }
            }
        }
        log::trace!("zfp: stream mode {mode:?}");
    }

    fn maximum_size(&self, field: &Field) -> usize {
        // SAFETY: both are live.
        unsafe { sys::zfp_stream_maximum_size(self.as_ptr(), field.as_ptr()) as usize }
    }

    /// Binds a new bit stream over `buffer`, replacing any previous one, and
    /// rewinds.
    ///
    /// # Safety
    ///
    /// `buffer` must be valid for reads and writes of `len` bytes, aligned to
    /// 8 bytes, and stay valid until the stream is rebound or dropped.
    unsafe fn bind(&mut self, buffer: *mut u8, len: usize) -> bool {
        let Some(bits) = NonNull::new(unsafe { sys::stream_open(buffer.cast(), len as _) }) else {
            return false;
        };
        if let Some(previous) = self.bits.replace(bits) {
            unsafe { sys::stream_close(previous.as_ptr()) };
        }
        unsafe {
            sys::zfp_stream_set_bit_stream(self.as_ptr(), bits.as_ptr());
            sys::zfp_stream_rewind(self.as_ptr());
        }
        true
    }

    fn write_header(&mut self, field: &Field) -> usize {
        // SAFETY: callers bind a bit stream first.
        unsafe {
            sys::zfp_write_header(self.as_ptr(), field.as_ptr(), sys::ZFP_HEADER_FULL) as usize
        }
    }

    fn read_header(&mut self, field: &mut Field) -> usize {
        // SAFETY: callers bind a bit stream first.
        unsafe {
            sys::zfp_read_header(self.as_ptr(), field.as_ptr(), sys::ZFP_HEADER_FULL) as usize
        }
    }

    fn compress(&mut self, field: &Field) -> usize {
        // SAFETY: the field pointer and the bound buffer are kept valid by
        // the caller for the duration of the call.
        unsafe { sys::zfp_compress(self.as_ptr(), field.as_ptr()) as usize }
    }

    fn decompress(&mut self, field: &mut Field) -> usize {
        // SAFETY: as for `compress`.
        unsafe { sys::zfp_decompress(self.as_ptr(), field.as_ptr()) as usize }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        // SAFETY: each pointer was opened by this owner and is closed once.
        unsafe {
            sys::zfp_stream_close(self.as_ptr());
            if let Some(bits) = self.bits.take() {
                sys::stream_close(bits.as_ptr());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(
        codec: &ZfpCodec,
        layout: &FieldLayout,
        mode: CompressionMode,
        src: &[u8],
    ) -> Vec<u8> {
        let mut dest = vec![0u8; src.len() + 1024];
        let written = codec.compress(layout, &mode, src, &mut dest);
        assert!(written > 0);
        dest.truncate(written);
        dest
    }

    #[test]
    fn test_reversible_round_trip_3d() {
        let codec = ZfpCodec::new();
        let values: Vec<f64> = (0..2 * 3 * 4).map(|i| (i as f64 * 0.37).sin()).collect();
        let layout = FieldLayout::contiguous(ScalarType::Double, &[2, 3, 4]).unwrap();
        let stream = encode_all(
            &codec,
            &layout,
            CompressionMode::Reversible,
            bytemuck::cast_slice(&values),
        );

        let header = codec.read_header(&stream).unwrap();
        assert!(header.same_shape(&layout));
        assert_eq!(header.effective_strides(), [1, 2, 6, 0]);

        let mut out = vec![0f64; values.len()];
        let produced = codec.decompress(&stream, &header, bytemuck::cast_slice_mut(&mut out));
        assert!(produced > 0);
        assert_eq!(out, values);
    }

    #[test]
    fn test_header_of_garbage_is_rejected() {
        let codec = ZfpCodec::new();
        assert!(codec.read_header(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).is_none());
        assert!(codec.read_header(&[]).is_none());
        assert!(codec.read_header(b"zf").is_none());
    }

    #[test]
    fn test_strided_source_is_gathered() {
        let codec = ZfpCodec::new();
        // Every other element of a 16-element vector.
        let values: Vec<i32> = (0..16).collect();
        let layout = FieldLayout::contiguous(ScalarType::Int32, &[8])
            .unwrap()
            .with_strides(&[2])
            .unwrap();
        let stream = encode_all(
            &codec,
            &layout,
            CompressionMode::Reversible,
            bytemuck::cast_slice(&values),
        );

        let header = codec.read_header(&stream).unwrap();
        let mut out = vec![0i32; 8];
        assert!(codec.decompress(&stream, &header, bytemuck::cast_slice_mut(&mut out)) > 0);
        assert_eq!(out, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[test]
    fn test_short_source_is_refused() {
        let codec = ZfpCodec::new();
        let layout = FieldLayout::contiguous(ScalarType::Float, &[16]).unwrap();
        let src = vec![0u8; 60];
        let mut dest = vec![0u8; 256];
        assert_eq!(codec.compress(&layout, &CompressionMode::Reversible, &src, &mut dest), 0);
    }

    #[test]
    fn test_destination_too_small() {
        let codec = ZfpCodec::new();
        let values: Vec<f64> = (0..64).map(|_| fastrand::f64()).collect();
        let layout = FieldLayout::contiguous(ScalarType::Double, &[64]).unwrap();
        let mut dest = vec![0u8; 8];
        let written = codec.compress(
            &layout,
            &CompressionMode::Reversible,
            bytemuck::cast_slice(&values),
            &mut dest,
        );
        assert_eq!(written, 0);
    }

    #[test]
    fn test_encode_scratch_is_reused() {
        let codec = ZfpCodec::new();
        let values: Vec<f64> = (0..256)
            .map(|i| ((i as f64 * 0.1).sin() * 64.0).round() / 64.0)
            .collect();
        let layout = FieldLayout::contiguous(ScalarType::Double, &[16, 16]).unwrap();
        let src: &[u8] = bytemuck::cast_slice(&values);

        // Input-sized destinations are below the worst-case bound.
        let mut first = vec![0u8; src.len()];
        let written = codec.compress(&layout, &CompressionMode::Reversible, src, &mut first);
        assert!(written > 0);
        let scratch = SCRATCH.with(|s| (s.borrow().as_ptr(), s.borrow().len()));
        assert!(scratch.1 * WORD > src.len());

        let mut second = vec![0u8; src.len()];
        let again = codec.compress(&layout, &CompressionMode::Reversible, src, &mut second);
        assert_eq!(again, written);
        assert_eq!(first[..written], second[..written]);
        assert_eq!(SCRATCH.with(|s| (s.borrow().as_ptr(), s.borrow().len())), scratch);
    }

    #[test]
    fn test_fixed_accuracy_bound() {
        let codec = ZfpCodec::new();
        let values: Vec<f32> = (0..32 * 32)
            .map(|i| ((i % 32) as f32 * 0.2).cos() * 10.0 + (i / 32) as f32)
            .collect();
        let layout = FieldLayout::contiguous(ScalarType::Float, &[32, 32]).unwrap();
        let tolerance = 0.01;
        let stream = encode_all(
            &codec,
            &layout,
            CompressionMode::FixedAccuracy { tolerance },
            bytemuck::cast_slice(&values),
        );
        assert!(stream.len() < values.len() * 4);

        let header = codec.read_header(&stream).unwrap();
        let mut out = vec![0f32; values.len()];
        assert!(codec.decompress(&stream, &header, bytemuck::cast_slice_mut(&mut out)) > 0);
        for (a, b) in values.iter().zip(&out) {
            assert!(((a - b) as f64).abs() <= tolerance);
        }
    }

    #[test]
    fn test_truncated_stream_does_not_read_past_end() {
        let codec = ZfpCodec::new();
        let values: Vec<f64> = (0..256).map(|i| i as f64 * 1.5).collect();
        let layout = FieldLayout::contiguous(ScalarType::Double, &[16, 16]).unwrap();
        let stream = encode_all(
            &codec,
            &layout,
            CompressionMode::Reversible,
            bytemuck::cast_slice(&values),
        );

        let truncated = &stream[..stream.len() / 2];
        let header = codec.read_header(truncated).unwrap();
        let mut out = vec![0f64; values.len()];
        // The decoded values are meaningless, only the call must stay in bounds.
        codec.decompress(truncated, &header, bytemuck::cast_slice_mut(&mut out));
    }
}
