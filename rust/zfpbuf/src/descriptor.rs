//! The buffer descriptor: an owned byte arena paired with array metadata.

use zfpbuf_bytes::{AlignedArena, AllocError};
use zfpbuf_codec::{Arity, FieldLayout, MAX_DIMENSIONS, Scalar, ScalarType};
use zfpbuf_common::{Error, Result, verify_arg};

/// A growable byte arena together with the shape of the array it holds.
///
/// `capacity` is the size of the arena and `size` the number of meaningful
/// bytes at its front. The arena is replaced by a larger one only when an
/// operation needs more than `capacity` bytes; it never shrinks. An arena of
/// zero capacity holds no allocation.
///
/// For compression inputs the metadata is supplied by the caller (see
/// [`ArrayBuffer::load`] and the raw setters). After a successful
/// decompression it is recovered from the stream header.
#[derive(Debug, Default)]
pub struct ArrayBuffer {
    storage: AlignedArena,
    size: usize,
    scalar_size: usize,
    shape: [usize; MAX_DIMENSIONS],
    stride: [isize; MAX_DIMENSIONS],
    dimensions: u32,
    scalar_type: Option<ScalarType>,
}

impl ArrayBuffer {
    /// Creates a zero-valued descriptor: no arena, no shape, no type.
    pub const fn new() -> ArrayBuffer {
        ArrayBuffer {
            storage: AlignedArena::new(),
            size: 0,
            scalar_size: 0,
            shape: [0; MAX_DIMENSIONS],
            stride: [0; MAX_DIMENSIONS],
            dimensions: 0,
            scalar_type: None,
        }
    }

    /// Bytes currently allocated for the arena.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Logically meaningful bytes at the front of the arena.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn scalar_size(&self) -> usize {
        self.scalar_size
    }

    #[inline]
    pub fn shape(&self) -> [usize; MAX_DIMENSIONS] {
        self.shape
    }

    #[inline]
    pub fn stride(&self) -> [isize; MAX_DIMENSIONS] {
        self.stride
    }

    #[inline]
    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    #[inline]
    pub fn scalar_type(&self) -> Option<ScalarType> {
        self.scalar_type
    }

    /// Numeric type tag, zero when no type is set.
    #[inline]
    pub fn type_tag(&self) -> u32 {
        self.scalar_type.map_or(0, ScalarType::tag)
    }

    /// The whole arena, including bytes beyond `size`.
    #[inline]
    pub fn storage(&self) -> &[u8] {
        self.storage.as_slice()
    }

    #[inline]
    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        self.storage.as_mut_slice()
    }

    /// The first `size` bytes of the arena.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.storage()[..self.size]
    }

    /// Pointer to the arena, null when the capacity is zero.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.storage.as_ptr()
    }

    /// The first `size` bytes viewed as scalars of type `T`.
    ///
    /// Fails if the descriptor's scalar type is not `T`.
    pub fn typed_data<T: Scalar>(&self) -> Result<&[T]> {
        if self.scalar_type != Some(T::SCALAR_TYPE) {
            return Err(Error::invalid_operation(format!(
                "typed_data::<{}> on a buffer of type {}",
                T::SCALAR_TYPE,
                self.scalar_type.map_or("<unset>", ScalarType::name)
            )));
        }
        self.storage
            .typed_prefix::<T>(self.size)
            .map_err(|e| Error::invalid_format("data", format!("{e:?}")))
    }

    pub fn set_scalar_type(&mut self, scalar_type: Option<ScalarType>) {
        self.scalar_type = scalar_type;
        self.scalar_size = scalar_type.map_or(0, ScalarType::size);
    }

    /// Sets the raw dimensionality. Values outside 1..=4 are accepted here and
    /// rejected by the operations that consume the descriptor.
    pub fn set_dimensions(&mut self, dimensions: u32) {
        self.dimensions = dimensions;
    }

    pub fn set_shape(&mut self, shape: [usize; MAX_DIMENSIONS]) {
        self.shape = shape;
    }

    pub fn set_stride(&mut self, stride: [isize; MAX_DIMENSIONS]) {
        self.stride = stride;
    }

    /// Sets the logical size, which must not exceed the capacity.
    pub fn set_size(&mut self, size: usize) -> Result<()> {
        verify_arg!(size, size <= self.capacity());
        self.size = size;
        Ok(())
    }

    /// Copies `bytes` to the front of the arena, growing it if needed, and
    /// sets `size` to their length. Shape metadata is left untouched.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.storage_mut()[..bytes.len()].copy_from_slice(bytes);
        self.size = bytes.len();
        Ok(())
    }

    /// Populates the descriptor with a typed array, as an input for
    /// compression.
    ///
    /// `shape` gives the extents (x varying fastest) and its length the
    /// dimensionality; `strides` may list fewer entries than `shape`, missing
    /// ones being the contiguous default.
    pub fn load<T: Scalar>(
        &mut self,
        data: &[T],
        shape: &[usize],
        strides: &[isize],
    ) -> Result<()> {
        self.load_bytes(T::SCALAR_TYPE, bytemuck::cast_slice(data), shape, strides)
    }

    /// Untyped form of [`ArrayBuffer::load`].
    pub fn load_bytes(
        &mut self,
        scalar_type: ScalarType,
        bytes: &[u8],
        shape: &[usize],
        strides: &[isize],
    ) -> Result<()> {
        let layout = FieldLayout::contiguous(scalar_type, shape)?.with_strides(strides)?;

        let scalar_count = layout.scalar_count().unwrap_or(0);
        if scalar_count == 0 {
            return Err(Error::invalid_arg(
                "shape",
                format!("cannot compress an empty array (shape {shape:?})"),
            ));
        }
        let required = layout.required_bytes().ok_or_else(|| {
            Error::invalid_arg(
                "strides",
                format!("strides {strides:?} address elements outside the array"),
            )
        })?;
        if bytes.len() < required {
            return Err(Error::invalid_arg(
                "data",
                format!(
                    "data buffer is too small. Expected {required} bytes, got {}",
                    bytes.len()
                ),
            ));
        }

        self.write_bytes(&bytes[..required])?;
        self.set_scalar_type(Some(scalar_type));
        self.dimensions = layout.dimensions();
        self.shape = layout.shape();
        self.stride = layout.stride();
        Ok(())
    }

    /// Makes sure the arena holds at least `required` bytes.
    ///
    /// A larger arena of exactly `required` bytes replaces the current one
    /// only when the capacity is insufficient; its previous contents are not
    /// carried over. On allocation failure the descriptor is unchanged.
    /// Returns whether a new arena was allocated.
    pub(crate) fn ensure_capacity(
        &mut self,
        required: usize,
    ) -> std::result::Result<bool, AllocError> {
        if self.capacity() >= required {
            return Ok(false);
        }
        let arena = AlignedArena::try_zeroed(required)?;
        log::debug!(
            "growing buffer arena from {} to {required} bytes",
            self.capacity()
        );
        self.storage = arena;
        Ok(true)
    }

    /// Replaces the array metadata with `layout`, as recovered from a stream
    /// header, and sets the logical size.
    pub(crate) fn assign_layout(&mut self, layout: &FieldLayout, size: usize) {
        debug_assert!(size <= self.capacity());
        self.set_scalar_type(Some(layout.scalar_type()));
        self.dimensions = layout.dimensions();
        self.shape = layout.shape();
        self.stride = layout.effective_strides();
        self.size = size;
    }

    /// Dimensionality as a checked arity.
    pub fn arity(&self) -> Result<Arity> {
        Arity::try_from(self.dimensions)
    }
}
