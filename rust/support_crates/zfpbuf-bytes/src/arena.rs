use std::fmt;

use crate::align::align_up;

/// Failure to obtain memory for an arena from the global allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed to allocate {size} bytes")]
pub struct AllocError {
    /// Number of bytes requested by the caller.
    pub size: usize,
}

/// A fixed-length, zero-initialized byte arena whose storage is aligned to a
/// power-of-two boundary.
///
/// Unlike a `Vec<u8>`, the arena never grows implicitly: its length is the
/// exact capacity requested at construction, and replacing it with a larger
/// arena is an explicit operation of the owner. An empty arena holds no heap
/// allocation and reports a null data pointer.
///
/// Allocation is fallible: constructors return [`AllocError`] instead of
/// aborting the process when memory cannot be obtained.
pub struct AlignedArena {
    /// The underlying byte vector, may include padding at start
    inner: Vec<u8>,
    /// Offset from start of inner vec to maintain alignment
    start: u32,
    /// Required alignment, specified during arena creation.
    alignment: u32,
}

impl AlignedArena {
    /// Default alignment in bytes, sufficient for every scalar kind and for
    /// word-oriented bit streams.
    pub const ALIGNMENT: usize = 64;

    /// Creates an empty arena without allocating.
    pub const fn new() -> AlignedArena {
        AlignedArena {
            inner: Vec::new(),
            start: 0,
            alignment: Self::ALIGNMENT as u32,
        }
    }

    /// Allocates a zero-filled arena of exactly `len` bytes with the default
    /// alignment.
    pub fn try_zeroed(len: usize) -> Result<AlignedArena, AllocError> {
        Self::try_zeroed_with_alignment(len, Self::ALIGNMENT)
    }

    /// Allocates a zero-filled arena of exactly `len` bytes aligned to
    /// `alignment`.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two or exceeds `u32::MAX`.
    pub fn try_zeroed_with_alignment(
        len: usize,
        alignment: usize,
    ) -> Result<AlignedArena, AllocError> {
        let alignment = alignment.max(1);
        assert!(alignment.is_power_of_two());
        assert!(alignment <= u32::MAX as usize);

        if len == 0 {
            return Ok(AlignedArena {
                inner: Vec::new(),
                start: 0,
                alignment: alignment as u32,
            });
        }

        let vec_capacity = len
            .checked_add(alignment)
            .ok_or(AllocError { size: len })?;
        let mut inner = Vec::<u8>::new();
        inner
            .try_reserve_exact(vec_capacity)
            .map_err(|_| AllocError { size: len })?;
        // Within the reserved capacity, so the buffer does not move.
        inner.resize(vec_capacity, 0);

        let p = inner.as_ptr() as usize;
        let aligned = align_up(p, alignment).ok_or(AllocError { size: len })?;
        let start = aligned - p;
        inner.truncate(start + len);

        log::trace!("allocated arena of {len} bytes (alignment {alignment})");
        Ok(AlignedArena {
            inner,
            start: start as u32,
            alignment: alignment as u32,
        })
    }

    /// Returns the number of bytes in the arena, which is also its capacity.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len() - self.start_offset()
    }

    /// Returns `true` if the arena holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the alignment the arena was created with.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment as usize
    }

    /// Returns a raw pointer to the arena storage, or null if the arena is
    /// empty.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        if self.is_empty() {
            std::ptr::null()
        } else {
            self.as_slice().as_ptr()
        }
    }

    /// Returns a mutable raw pointer to the arena storage, or null if the
    /// arena is empty.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        if self.is_empty() {
            std::ptr::null_mut()
        } else {
            self.as_mut_slice().as_mut_ptr()
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.start_offset()..]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let start = self.start_offset();
        &mut self.inner[start..]
    }

    /// Reinterprets the first `byte_len` bytes of the arena as a slice of `T`.
    ///
    /// Fails if `byte_len` exceeds the arena, is not a multiple of
    /// `size_of::<T>()`, or the storage is misaligned for `T`.
    pub fn typed_prefix<T>(&self, byte_len: usize) -> Result<&[T], bytemuck::PodCastError>
    where
        T: bytemuck::AnyBitPattern,
    {
        let bytes = self
            .as_slice()
            .get(..byte_len)
            .ok_or(bytemuck::PodCastError::OutputSliceWouldHaveSlop)?;
        bytemuck::try_cast_slice(bytes)
    }

    #[inline]
    fn start_offset(&self) -> usize {
        self.start as usize
    }
}

impl Default for AlignedArena {
    fn default() -> Self {
        AlignedArena::new()
    }
}

impl std::ops::Deref for AlignedArena {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl std::ops::DerefMut for AlignedArena {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl fmt::Debug for AlignedArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedArena")
            .field("len", &self.len())
            .field("alignment", &self.alignment)
            .field("ptr", &self.as_ptr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_new() {
        let arena = AlignedArena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);
        assert!(arena.as_ptr().is_null());
    }

    #[test]
    fn test_arena_zero_length_does_not_allocate() {
        let mut arena = AlignedArena::try_zeroed(0).unwrap();
        assert!(arena.as_ptr().is_null());
        assert!(arena.as_mut_ptr().is_null());
        assert_eq!(arena.as_slice(), &[] as &[u8]);
    }

    #[test]
    fn test_arena_zeroed_exact_length() {
        for len in [1, 7, 64, 100, 4096] {
            let arena = AlignedArena::try_zeroed(len).unwrap();
            assert_eq!(arena.len(), len);
            assert!(arena.iter().all(|&b| b == 0));
            assert_eq!(arena.as_ptr().align_offset(AlignedArena::ALIGNMENT), 0);
        }
    }

    #[test]
    fn test_arena_custom_alignment() {
        for alignment in [1, 2, 8, 16, 256, 4096] {
            let arena = AlignedArena::try_zeroed_with_alignment(33, alignment).unwrap();
            assert_eq!(arena.len(), 33);
            assert_eq!(arena.alignment(), alignment);
            assert_eq!(arena.as_ptr().align_offset(alignment), 0);
        }
    }

    #[test]
    fn test_arena_write_through_deref() {
        let mut arena = AlignedArena::try_zeroed(4).unwrap();
        arena[1] = 7;
        arena.as_mut_slice()[3] = 9;
        assert_eq!(&arena[..], &[0, 7, 0, 9]);
    }

    #[test]
    fn test_arena_typed_prefix() {
        let values = [1.5f64, -2.0, 3.25];
        let mut arena = AlignedArena::try_zeroed(24).unwrap();
        arena.copy_from_slice(bytemuck::cast_slice(&values));
        assert_eq!(arena.typed_prefix::<f64>(24).unwrap(), &values);
        assert_eq!(arena.typed_prefix::<f64>(16).unwrap(), &values[..2]);
        assert!(arena.typed_prefix::<f64>(12).is_err());
        assert!(arena.typed_prefix::<f64>(32).is_err());
    }

    #[test]
    fn test_arena_allocation_failure_is_reported() {
        let err = AlignedArena::try_zeroed(usize::MAX / 2).unwrap_err();
        assert_eq!(err.size, usize::MAX / 2);

        let err = AlignedArena::try_zeroed(usize::MAX).unwrap_err();
        assert_eq!(err, AllocError { size: usize::MAX });
        assert_eq!(err.to_string(), format!("failed to allocate {} bytes", usize::MAX));
    }

    #[test]
    fn test_arena_debug_format() {
        let arena = AlignedArena::try_zeroed(10).unwrap();
        let debug = format!("{arena:?}");
        assert!(debug.contains("AlignedArena"));
        assert!(debug.contains("len: 10"));
    }

    #[test]
    fn test_arena_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AlignedArena>();
    }
}
