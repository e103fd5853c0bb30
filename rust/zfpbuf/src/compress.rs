//! The compression endpoint.

use zfpbuf_codec::{ArrayCodec, Arity, FieldLayout};

use crate::{ArrayBuffer, CompressError, CompressOptions};

/// Compresses the array described by `input` into `output`'s arena as a full
/// codec header followed by the payload.
///
/// The output arena is grown to exactly `input.size()` bytes when its
/// capacity is smaller, and reused otherwise. On success returns the number
/// of bytes written at the front of the arena. `output.size()` is left as it
/// was: the returned length is the only authority on the valid prefix.
///
/// Validation failures leave `output` untouched. A codec failure may leave
/// the arena grown, with unspecified contents.
pub fn compress<C: ArrayCodec + ?Sized>(
    codec: &C,
    output: &mut ArrayBuffer,
    input: &ArrayBuffer,
    options: &CompressOptions,
) -> Result<usize, CompressError> {
    let layout = input_layout(input)?;
    let mode = options.mode();

    output.ensure_capacity(input.size())?;

    let written = codec.compress(&layout, &mode, input.data(), output.storage_mut());
    if written == 0 {
        log::warn!(
            "{} failed to encode a {} {:?} array ({})",
            codec.name(),
            layout.scalar_type(),
            layout.extents(),
            mode.name()
        );
        return Err(CompressError::CodecFailure {
            codec: codec.name().to_string(),
        });
    }

    log::debug!(
        "{} encoded {} input bytes into {written} bytes ({})",
        codec.name(),
        input.size(),
        mode.name()
    );
    Ok(written)
}

/// Builds the codec field for `input`, checking that every strided element
/// lies within the input's meaningful bytes.
fn input_layout(input: &ArrayBuffer) -> Result<FieldLayout, CompressError> {
    let dimensions = input.dimensions();
    let arity =
        Arity::try_from(dimensions).map_err(|_| CompressError::InvalidDimensions(dimensions))?;

    let Some(scalar_type) = input.scalar_type() else {
        return Err(CompressError::InvalidLayout(
            "input scalar type is not set".to_string(),
        ));
    };
    let layout = FieldLayout::new(scalar_type, arity, input.shape(), input.stride());

    if layout.scalar_count().unwrap_or(0) == 0 {
        return Err(CompressError::InvalidLayout(format!(
            "input shape {:?} is empty",
            layout.extents()
        )));
    }
    let required = layout.required_bytes().ok_or_else(|| {
        CompressError::InvalidLayout(format!(
            "strides {:?} address elements before the array origin",
            &layout.stride()[..arity.get()]
        ))
    })?;
    if required > input.size() {
        return Err(CompressError::InvalidLayout(format!(
            "shape {:?} with strides {:?} needs {required} bytes, input holds {}",
            layout.extents(),
            &layout.stride()[..arity.get()],
            input.size()
        )));
    }
    Ok(layout)
}
