//! Stand-in array codecs.
//!
//! [`TestCodec`] writes a fixed 48-byte header followed by a zstd frame of the
//! gathered array:
//!
//! ```text
//! 0..4    magic "ZBT\x01"
//! 4       scalar type tag
//! 5       dimensions
//! 6       mode tag (0 reversible, 1 accuracy, 2 rate, 3 precision)
//! 7       reserved
//! 8..16   mode parameter, f64 LE
//! 16..48  four extents, u64 LE
//! ```
//!
//! In fixed-accuracy mode floating-point values are snapped to multiples of
//! the tolerance, so decoded values are within half a tolerance of the
//! originals. Every other mode is lossless.

use std::io::Write;

use zfpbuf_codec::{ArrayCodec, Arity, CompressionMode, FieldLayout, MAX_DIMENSIONS, ScalarType};

pub const HEADER_LEN: usize = 48;
pub const MAGIC: [u8; 4] = *b"ZBT\x01";

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct TestCodec;

impl TestCodec {
    /// Encodes the stream header for `layout` compressed with `mode`.
    ///
    /// Exposed so that tests can craft headers the codec itself would never
    /// produce, such as extents whose byte size cannot be allocated.
    pub fn encode_header(layout: &FieldLayout, mode: &CompressionMode) -> [u8; HEADER_LEN] {
        let (mode_tag, param) = match *mode {
            CompressionMode::Reversible => (0u8, 0f64),
            CompressionMode::FixedAccuracy { tolerance } => (1, tolerance),
            CompressionMode::FixedRate { rate } => (2, rate),
            CompressionMode::FixedPrecision { precision } => (3, precision as f64),
        };
        let mut header = [0u8; HEADER_LEN];
        header[..4].copy_from_slice(&MAGIC);
        header[4] = layout.scalar_type().tag() as u8;
        header[5] = layout.dimensions() as u8;
        header[6] = mode_tag;
        header[8..16].copy_from_slice(&param.to_le_bytes());
        for (i, &n) in layout.shape().iter().enumerate() {
            let at = 16 + i * 8;
            header[at..at + 8].copy_from_slice(&(n as u64).to_le_bytes());
        }
        header
    }

    /// Parses the mode recorded in a stream header.
    pub fn header_mode(src: &[u8]) -> Option<CompressionMode> {
        TestCodec.read_header(src)?;
        let param = f64::from_le_bytes(src[8..16].try_into().ok()?);
        match src[6] {
            0 => Some(CompressionMode::Reversible),
            1 => Some(CompressionMode::FixedAccuracy { tolerance: param }),
            2 => Some(CompressionMode::FixedRate { rate: param }),
            3 => Some(CompressionMode::FixedPrecision {
                precision: param as u32,
            }),
            _ => None,
        }
    }

    fn encode(
        &self,
        layout: &FieldLayout,
        mode: &CompressionMode,
        src: &[u8],
    ) -> std::io::Result<Vec<u8>> {
        let mut payload = gather(layout, src);
        if let CompressionMode::FixedAccuracy { tolerance } = *mode {
            quantize(layout.scalar_type(), &mut payload, tolerance);
        }

        let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), ZSTD_LEVEL)?;
        encoder.write_all(&payload)?;
        let frame = encoder.finish()?;

        let mut stream = Vec::with_capacity(HEADER_LEN + frame.len());
        stream.extend_from_slice(&TestCodec::encode_header(layout, mode));
        stream.extend_from_slice(&frame);
        Ok(stream)
    }
}

impl ArrayCodec for TestCodec {
    fn name(&self) -> &str {
        "test"
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
            _ => return 0,
        }
        let stream = match self.encode(layout, mode, src) {
            Ok(stream) => stream,
            Err(e) => {
                log::debug!("test codec: encoding failed: {e}");
                return 0;
            }
        };
        if stream.len() > dest.len() {
            return 0;
        }
        dest[..stream.len()].copy_from_slice(&stream);
        stream.len()
    }

    fn read_header(&self, src: &[u8]) -> Option<FieldLayout> {
        if src.len() < HEADER_LEN || src[..4] != MAGIC {
            return None;
        }
        let scalar_type = ScalarType::try_from(src[4] as u32).ok()?;
        let arity = Arity::try_from(src[5] as u32).ok()?;
        if src[6] > 3 {
            return None;
        }
        let mut shape = [0usize; MAX_DIMENSIONS];
        for (i, n) in shape.iter_mut().enumerate().take(arity.get()) {
            let at = 16 + i * 8;
            let extent = u64::from_le_bytes(src[at..at + 8].try_into().ok()?);
            *n = usize::try_from(extent).ok()?;
            if *n == 0 {
                return None;
            }
        }
        Some(FieldLayout::new(
            scalar_type,
            arity,
            shape,
            [0; MAX_DIMENSIONS],
        ))
    }

    fn decompress(&self, src: &[u8], layout: &FieldLayout, dest: &mut [u8]) -> usize {
        let Some(size) = layout.byte_size() else {
            return 0;
        };
        if size > dest.len() || src.len() < HEADER_LEN {
            return 0;
        }
        let payload = match zstd::stream::decode_all(&src[HEADER_LEN..]) {
            Ok(payload) => payload,
            Err(e) => {
                log::debug!("test codec: decoding failed: {e}");
                return 0;
            }
        };
        if payload.len() != size {
            return 0;
        }
        dest[..size].copy_from_slice(&payload);
        size
    }
}

/// A [`TestCodec`] whose compress or decompress step reports failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultyCodec {
    pub fail_compress: bool,
    pub fail_decompress: bool,
}

impl FaultyCodec {
    pub fn failing_compress() -> FaultyCodec {
        FaultyCodec {
            fail_compress: true,
            fail_decompress: false,
        }
    }

    pub fn failing_decompress() -> FaultyCodec {
        FaultyCodec {
            fail_compress: false,
            fail_decompress: true,
        }
    }
}

impl ArrayCodec for FaultyCodec {
    fn name(&self) -> &str {
        "faulty"
    }

    fn compress(
        &self,
        layout: &FieldLayout,
        mode: &CompressionMode,
        src: &[u8],
        dest: &mut [u8],
    ) -> usize {
        if self.fail_compress {
            return 0;
        }
        TestCodec.compress(layout, mode, src, dest)
    }

    fn read_header(&self, src: &[u8]) -> Option<FieldLayout> {
        TestCodec.read_header(src)
    }

    fn decompress(&self, src: &[u8], layout: &FieldLayout, dest: &mut [u8]) -> usize {
        if self.fail_decompress {
            return 0;
        }
        TestCodec.decompress(src, layout, dest)
    }
}

/// Copies the strided elements of `layout` out of `src` in x-fastest order.
fn gather(layout: &FieldLayout, src: &[u8]) -> Vec<u8> {
    let width = layout.scalar_type().size();
    let extents = layout.extents();
    let strides = layout.effective_strides();
    let count = layout.scalar_count().unwrap_or(0);

    let mut out = Vec::with_capacity(count * width);
    for linear in 0..count {
        let mut rest = linear;
        let mut offset = 0usize;
        for (&n, &s) in extents.iter().zip(strides.iter()) {
            offset += (rest % n) * s as usize;
            rest /= n;
        }
        let at = offset * width;
        out.extend_from_slice(&src[at..at + width]);
    }
    out
}

fn quantize(scalar_type: ScalarType, payload: &mut [u8], tolerance: f64) {
    if tolerance.is_nan() || tolerance <= 0.0 {
        return;
    }
    match scalar_type {
        ScalarType::Float => {
            for chunk in payload.chunks_exact_mut(4) {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(chunk);
                let v = f32::from_le_bytes(bytes) as f64;
                let q = ((v / tolerance).round() * tolerance) as f32;
                chunk.copy_from_slice(&q.to_le_bytes());
            }
        }
        ScalarType::Double => {
            for chunk in payload.chunks_exact_mut(8) {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                let v = f64::from_le_bytes(bytes);
                let q = (v / tolerance).round() * tolerance;
                chunk.copy_from_slice(&q.to_le_bytes());
            }
        }
        ScalarType::Int32 | ScalarType::Int64 => (),
    }
}
