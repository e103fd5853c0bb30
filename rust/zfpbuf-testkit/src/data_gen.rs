//! Synthetic arrays for tests.
//!
//! Floating-point generators produce smooth fields snapped to multiples of
//! 1/64, the kind of data array codecs are built for, and which stays
//! compressible for general-purpose byte compressors. Integer generators are
//! uniform within a range. All values are laid out with x varying fastest.

use zfpbuf_codec::ScalarType;

/// A smooth 64-bit field over `shape`.
pub fn smooth_f64(shape: &[usize]) -> Vec<f64> {
    let count = shape.iter().product::<usize>();
    (0..count)
        .map(|linear| {
            let mut rest = linear;
            let mut value = 0.0;
            for (axis, &n) in shape.iter().enumerate() {
                let i = (rest % n) as f64;
                rest /= n;
                value += (i * 0.3 + axis as f64).sin() * (axis + 1) as f64;
            }
            (value * 64.0).round() / 64.0
        })
        .collect()
}

/// A smooth 32-bit field over `shape`.
pub fn smooth_f32(shape: &[usize]) -> Vec<f32> {
    smooth_f64(shape).into_iter().map(|v| v as f32).collect()
}

pub fn random_i32(count: usize, range: std::ops::Range<i32>) -> Vec<i32> {
    (0..count).map(|_| fastrand::i32(range.clone())).collect()
}

pub fn random_i64(count: usize, range: std::ops::Range<i64>) -> Vec<i64> {
    (0..count).map(|_| fastrand::i64(range.clone())).collect()
}

/// Native-endian bytes of `shape.product()` values of `scalar_type`.
pub fn array_bytes(scalar_type: ScalarType, shape: &[usize]) -> Vec<u8> {
    let count = shape.iter().product::<usize>();
    match scalar_type {
        ScalarType::Int32 => bytemuck::cast_slice(&random_i32(count, -100..100)).to_vec(),
        ScalarType::Int64 => bytemuck::cast_slice(&random_i64(count, -1000..1000)).to_vec(),
        ScalarType::Float => bytemuck::cast_slice(&smooth_f32(shape)).to_vec(),
        ScalarType::Double => bytemuck::cast_slice(&smooth_f64(shape)).to_vec(),
    }
}

/// Largest absolute difference between two equally long sequences.
pub fn max_abs_error(expected: &[f64], actual: &[f64]) -> f64 {
    assert_eq!(expected.len(), actual.len());
    expected
        .iter()
        .zip(actual)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
