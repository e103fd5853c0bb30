//! C ABI over [`crate::boundary`].
//!
//! Descriptors are opaque pointers obtained from [`zfpbuf_create_buffer`] and
//! released with [`zfpbuf_free_buffer`]. A pointer must not be used after it
//! has been released, and must not be released twice.

use std::ptr;

use zfpbuf_codec::{MAX_DIMENSIONS, ScalarType};
use zfpbuf_common::ErrorKind;

use crate::{ArrayBuffer, boundary};
#[cfg(feature = "zfp")]
use crate::{CompressError, DecompressError};

#[unsafe(no_mangle)]
pub extern "C" fn zfpbuf_create_buffer() -> *mut ArrayBuffer {
    Box::into_raw(boundary::create())
}

/// # Safety
///
/// `buffer` must be null or a live pointer returned by
/// [`zfpbuf_create_buffer`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_free_buffer(buffer: *mut ArrayBuffer) {
    let handle = (!buffer.is_null()).then(|| unsafe { Box::from_raw(buffer) });
    boundary::destroy(handle);
}

/// Compresses `input` into `output` with ZFP. Negative `tolerance` or `rate`
/// and negative `precision` mean "unset".
///
/// Returns the number of bytes written to the front of `output`'s arena, or
/// a negative code. `output` and `input` must be different descriptors.
///
/// # Safety
///
/// Both pointers must be null or live descriptor pointers.
#[cfg(feature = "zfp")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_compress(
    output: *mut ArrayBuffer,
    input: *const ArrayBuffer,
    tolerance: f64,
    rate: f64,
    precision: i32,
) -> isize {
    if !input.is_null() && ptr::eq(output, input) {
        return CompressError::Aliased.code() as isize;
    }
    let input = unsafe { input.as_ref() };
    let output = unsafe { output.as_mut() };
    boundary::compress(output, input, tolerance, rate, precision)
}

/// Decodes `len` bytes at `source` into `output` with ZFP. Returns zero on
/// success or a negative code. `source` must not point into `output`'s
/// arena.
///
/// # Safety
///
/// `output` must be null or a live descriptor pointer; `source` must be null
/// or valid for reads of `len` bytes.
#[cfg(feature = "zfp")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_decompress(
    output: *mut ArrayBuffer,
    source: *const u8,
    len: usize,
) -> i32 {
    let output = unsafe { output.as_mut() };
    if source.is_null() {
        return boundary::decompress(output, None);
    }
    if let Some(output) = output.as_deref()
        && overlaps(output.storage(), source, len)
    {
        return DecompressError::Aliased.code();
    }
    let source = unsafe { std::slice::from_raw_parts(source, len) };
    boundary::decompress(output, Some(source))
}

/// Populates `buffer` with an array of `dimensions` extents taken from
/// `shape`, read from `len` bytes at `data`. `stride` may be null for a
/// contiguous array; otherwise it holds `dimensions` element strides, zero
/// meaning contiguous along that axis.
///
/// Returns 0 on success, -1 for a null descriptor, -2 for invalid arguments
/// and -5 on allocation failure.
///
/// # Safety
///
/// `buffer` must be null or a live descriptor pointer. `data` must be valid
/// for reads of `len` bytes, `shape` for `dimensions` values, and `stride`
/// (when non-null) for `dimensions` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_load(
    buffer: *mut ArrayBuffer,
    type_tag: u32,
    data: *const u8,
    len: usize,
    dimensions: u32,
    shape: *const usize,
    stride: *const isize,
) -> i32 {
    let Some(buffer) = (unsafe { buffer.as_mut() }) else {
        return -1;
    };
    let Ok(scalar_type) = ScalarType::try_from(type_tag) else {
        return -2;
    };
    let dims = dimensions as usize;
    if data.is_null() || shape.is_null() || dims == 0 || dims > MAX_DIMENSIONS {
        return -2;
    }
    if overlaps(buffer.storage(), data, len) {
        return -2;
    }

    let data = unsafe { std::slice::from_raw_parts(data, len) };
    let shape = unsafe { std::slice::from_raw_parts(shape, dims) };
    let stride: &[isize] = if stride.is_null() {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(stride, dims) }
    };

    match buffer.load_bytes(scalar_type, data, shape, stride) {
        Ok(()) => 0,
        Err(e) => {
            log::debug!("load: {e}");
            match e.kind() {
                ErrorKind::Allocation(_) => -5,
                _ => -2,
            }
        }
    }
}

/// Pointer to the descriptor's arena; null for a null descriptor or an
/// empty arena.
///
/// # Safety
///
/// `buffer` must be null or a live descriptor pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_data(buffer: *const ArrayBuffer) -> *const u8 {
    unsafe { buffer.as_ref() }.map_or(ptr::null(), ArrayBuffer::as_ptr)
}

/// # Safety
///
/// `buffer` must be null or a live descriptor pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_capacity(buffer: *const ArrayBuffer) -> usize {
    unsafe { buffer.as_ref() }.map_or(0, ArrayBuffer::capacity)
}

/// # Safety
///
/// `buffer` must be null or a live descriptor pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_size(buffer: *const ArrayBuffer) -> usize {
    unsafe { buffer.as_ref() }.map_or(0, ArrayBuffer::size)
}

/// # Safety
///
/// `buffer` must be null or a live descriptor pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_scalar_size(buffer: *const ArrayBuffer) -> usize {
    unsafe { buffer.as_ref() }.map_or(0, ArrayBuffer::scalar_size)
}

/// # Safety
///
/// `buffer` must be null or a live descriptor pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_dimensions(buffer: *const ArrayBuffer) -> u32 {
    unsafe { buffer.as_ref() }.map_or(0, ArrayBuffer::dimensions)
}

/// Numeric type tag: 1 int32, 2 int64, 3 float, 4 double, 0 unset.
///
/// # Safety
///
/// `buffer` must be null or a live descriptor pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_type(buffer: *const ArrayBuffer) -> u32 {
    unsafe { buffer.as_ref() }.map_or(0, ArrayBuffer::type_tag)
}

/// Extent along `axis`, zero when the axis is out of range.
///
/// # Safety
///
/// `buffer` must be null or a live descriptor pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_shape(buffer: *const ArrayBuffer, axis: u32) -> usize {
    unsafe { buffer.as_ref() }
        .and_then(|b| b.shape().get(axis as usize).copied())
        .unwrap_or(0)
}

/// Element stride along `axis`, zero when the axis is out of range.
///
/// # Safety
///
/// `buffer` must be null or a live descriptor pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zfpbuf_buffer_stride(buffer: *const ArrayBuffer, axis: u32) -> isize {
    unsafe { buffer.as_ref() }
        .and_then(|b| b.stride().get(axis as usize).copied())
        .unwrap_or(0)
}

fn overlaps(storage: &[u8], ptr: *const u8, len: usize) -> bool {
    if storage.is_empty() || len == 0 {
        return false;
    }
    let range = storage.as_ptr_range();
    let start = ptr as usize;
    let end = start.saturating_add(len);
    start < range.end as usize && (range.start as usize) < end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_free() {
        let buffer = zfpbuf_create_buffer();
        assert!(!buffer.is_null());
        unsafe {
            assert_eq!(zfpbuf_buffer_capacity(buffer), 0);
            assert_eq!(zfpbuf_buffer_size(buffer), 0);
            assert_eq!(zfpbuf_buffer_dimensions(buffer), 0);
            assert!(zfpbuf_buffer_data(buffer).is_null());
            zfpbuf_free_buffer(buffer);
            zfpbuf_free_buffer(ptr::null_mut());
        }
    }

    #[test]
    fn test_accessors_on_null() {
        unsafe {
            assert!(zfpbuf_buffer_data(ptr::null()).is_null());
            assert_eq!(zfpbuf_buffer_capacity(ptr::null()), 0);
            assert_eq!(zfpbuf_buffer_type(ptr::null()), 0);
            assert_eq!(zfpbuf_buffer_shape(ptr::null(), 0), 0);
            assert_eq!(zfpbuf_buffer_stride(ptr::null(), 0), 0);
        }
    }

    #[test]
    fn test_load_and_read_back() {
        let values: Vec<f64> = (0..12).map(f64::from).collect();
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let shape = [3usize, 4];
        let buffer = zfpbuf_create_buffer();
        unsafe {
            let rc = zfpbuf_buffer_load(
                buffer,
                4,
                bytes.as_ptr(),
                bytes.len(),
                2,
                shape.as_ptr(),
                ptr::null(),
            );
            assert_eq!(rc, 0);
            assert_eq!(zfpbuf_buffer_size(buffer), 96);
            assert_eq!(zfpbuf_buffer_scalar_size(buffer), 8);
            assert_eq!(zfpbuf_buffer_type(buffer), 4);
            assert_eq!(zfpbuf_buffer_dimensions(buffer), 2);
            assert_eq!(zfpbuf_buffer_shape(buffer, 1), 4);
            assert_eq!(zfpbuf_buffer_shape(buffer, 9), 0);
            let data = std::slice::from_raw_parts(zfpbuf_buffer_data(buffer), 96);
            assert_eq!(data, bytes);
            zfpbuf_free_buffer(buffer);
        }
    }

    #[test]
    fn test_load_rejects_invalid_arguments() {
        let bytes = [0u8; 64];
        let shape = [4usize, 4];
        let buffer = zfpbuf_create_buffer();
        unsafe {
            let load = |tag, dims, len| {
                zfpbuf_buffer_load(
                    buffer,
                    tag,
                    bytes.as_ptr(),
                    len,
                    dims,
                    shape.as_ptr(),
                    ptr::null(),
                )
            };
            assert_eq!(load(7, 2, 64), -2);
            assert_eq!(load(3, 0, 64), -2);
            assert_eq!(load(3, 5, 64), -2);
            assert_eq!(load(3, 2, 63), -2);
            assert_eq!(load(3, 2, 64), 0);
            assert_eq!(
                zfpbuf_buffer_load(
                    ptr::null_mut(),
                    3,
                    bytes.as_ptr(),
                    64,
                    2,
                    shape.as_ptr(),
                    ptr::null()
                ),
                -1
            );

            // Loading a buffer from its own arena is refused.
            let own = zfpbuf_buffer_data(buffer);
            assert_eq!(
                zfpbuf_buffer_load(buffer, 3, own, 64, 2, shape.as_ptr(), ptr::null()),
                -2
            );
            zfpbuf_free_buffer(buffer);
        }
    }

    #[test]
    fn test_overlaps() {
        let storage = [0u8; 16];
        let p = storage.as_ptr();
        assert!(overlaps(&storage, p, 1));
        assert!(overlaps(&storage, p.wrapping_add(15), 4));
        assert!(!overlaps(&storage, p.wrapping_add(16), 4));
        assert!(!overlaps(&storage, p, 0));
        assert!(!overlaps(&[], p, 4));
    }

    #[cfg(feature = "zfp")]
    #[test]
    fn test_compress_round_trip() {
        let values = [0f32; 16];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let shape = [4usize, 4];
        let input = zfpbuf_create_buffer();
        let output = zfpbuf_create_buffer();
        let decoded = zfpbuf_create_buffer();
        unsafe {
            let rc = zfpbuf_buffer_load(
                input,
                3,
                bytes.as_ptr(),
                bytes.len(),
                2,
                shape.as_ptr(),
                ptr::null(),
            );
            assert_eq!(rc, 0);

            assert_eq!(zfpbuf_compress(output, ptr::null(), -1.0, -1.0, -1), -1);
            assert_eq!(zfpbuf_compress(ptr::null_mut(), input, -1.0, -1.0, -1), -2);
            assert_eq!(zfpbuf_compress(input, input, -1.0, -1.0, -1), -2);

            let written = zfpbuf_compress(output, input, -1.0, -1.0, -1);
            assert!(written > 0 && written < 64);
            assert_eq!(zfpbuf_buffer_size(output), 0);

            let stream = zfpbuf_buffer_data(output);
            assert_eq!(zfpbuf_decompress(ptr::null_mut(), stream, written as usize), -1);
            assert_eq!(zfpbuf_decompress(decoded, ptr::null(), 0), -2);
            assert_eq!(zfpbuf_decompress(output, stream, written as usize), -2);

            assert_eq!(zfpbuf_decompress(decoded, stream, written as usize), 0);
            assert_eq!(zfpbuf_buffer_size(decoded), 64);
            assert_eq!(zfpbuf_buffer_type(decoded), 3);
            assert_eq!(zfpbuf_buffer_shape(decoded, 0), 4);
            assert_eq!(zfpbuf_buffer_shape(decoded, 1), 4);
            let data = std::slice::from_raw_parts(zfpbuf_buffer_data(decoded), 64);
            assert!(data.iter().all(|&b| b == 0));

            zfpbuf_free_buffer(input);
            zfpbuf_free_buffer(output);
            zfpbuf_free_buffer(decoded);
        }
    }
}
