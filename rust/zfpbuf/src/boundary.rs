//! The host-facing call contract.
//!
//! Descriptors cross the boundary as optional owned handles, and every
//! outcome is reported as an integer: non-negative on success, a small
//! negative code scoped to the endpoint on failure. Quality parameters use a
//! negative value for "unset".
//!
//! | code | `compress`                 | `decompress`            |
//! |------|----------------------------|-------------------------|
//! | -1   | missing input              | missing output          |
//! | -2   | missing output             | missing source          |
//! | -3   | dimensions outside 1..=4   | invalid stream header   |
//! | -4   | codec wrote no bytes       | codec produced no bytes |
//! | -5   | allocation failure         | allocation failure      |
//! | -6   | input layout out of bounds |                         |

use zfpbuf_codec::ArrayCodec;

use crate::{ArrayBuffer, CompressError, CompressOptions, DecompressError, allocator};

/// An owned descriptor handle as held by a host.
pub type Handle = Box<ArrayBuffer>;

/// Returns a new zero-valued descriptor handle.
pub fn create() -> Handle {
    allocator::create()
}

/// Releases a handle; `None` is a no-op.
pub fn destroy(handle: Option<Handle>) {
    allocator::destroy(handle)
}

/// Compresses `input` into `output` with `codec`.
///
/// Returns the number of bytes written at the front of `output`'s arena, or
/// a negative code. `output.size()` is not updated.
pub fn compress_with<C: ArrayCodec + ?Sized>(
    codec: &C,
    output: Option<&mut ArrayBuffer>,
    input: Option<&ArrayBuffer>,
    tolerance: f64,
    rate: f64,
    precision: i32,
) -> isize {
    let result = match (output, input) {
        (_, None) => Err(CompressError::MissingInput),
        (None, Some(_)) => Err(CompressError::MissingOutput),
        (Some(output), Some(input)) => {
            let options = CompressOptions::from_raw(tolerance, rate, precision);
            crate::compress(codec, output, input, &options)
        }
    };
    match result {
        Ok(written) => written as isize,
        Err(e) => {
            log::debug!("compress: {e}");
            e.code() as isize
        }
    }
}

/// Decodes `source` into `output` with `codec`.
///
/// Returns zero on success, after which `output.size()` is the decoded
/// length, or a negative code.
pub fn decompress_with<C: ArrayCodec + ?Sized>(
    codec: &C,
    output: Option<&mut ArrayBuffer>,
    source: Option<&[u8]>,
) -> i32 {
    let result = match (output, source) {
        (None, _) => Err(DecompressError::MissingOutput),
        (Some(_), None) => Err(DecompressError::MissingSource),
        (Some(output), Some(source)) => crate::decompress(codec, output, source),
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::debug!("decompress: {e}");
            e.code()
        }
    }
}

/// [`compress_with`] using the ZFP codec.
#[cfg(feature = "zfp")]
pub fn compress(
    output: Option<&mut ArrayBuffer>,
    input: Option<&ArrayBuffer>,
    tolerance: f64,
    rate: f64,
    precision: i32,
) -> isize {
    compress_with(&crate::ZfpCodec, output, input, tolerance, rate, precision)
}

/// [`decompress_with`] using the ZFP codec.
#[cfg(feature = "zfp")]
pub fn decompress(output: Option<&mut ArrayBuffer>, source: Option<&[u8]>) -> i32 {
    decompress_with(&crate::ZfpCodec, output, source)
}

#[cfg(test)]
mod tests {
    use zfpbuf_testkit::TestCodec;

    use super::*;

    #[test]
    fn test_missing_handles_map_to_error_codes() {
        let mut input = create();
        input.load(&[0i32; 8], &[8], &[]).unwrap();
        let mut output = create();

        let rc = compress_with(&TestCodec, Some(output.as_mut()), None, -1.0, -1.0, -1);
        assert_eq!(rc, CompressError::MissingInput.code() as isize);
        let rc = compress_with(&TestCodec, None, Some(input.as_ref()), -1.0, -1.0, -1);
        assert_eq!(rc, CompressError::MissingOutput.code() as isize);

        let rc = decompress_with(&TestCodec, None, Some(&[0u8; 4]));
        assert_eq!(rc, DecompressError::MissingOutput.code());
        let rc = decompress_with(&TestCodec, Some(output.as_mut()), None);
        assert_eq!(rc, DecompressError::MissingSource.code());
        assert_eq!(output.capacity(), 0);
    }
}
