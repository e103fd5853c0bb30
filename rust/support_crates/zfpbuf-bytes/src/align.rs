/// Aligns a number up to the next multiple of the specified alignment.
///
/// Returns `None` when the aligned value does not fit in `usize`.
///
/// # Examples
///
/// ```
/// use zfpbuf_bytes::align::align_up;
///
/// assert_eq!(align_up(0, 8), Some(0));
/// assert_eq!(align_up(1, 8), Some(8));
/// assert_eq!(align_up(8, 8), Some(8));
/// assert_eq!(align_up(9, 8), Some(16));
/// assert_eq!(align_up(usize::MAX, 8), None);
/// ```
///
/// # Panics
///
/// This function will panic in debug builds if `alignment` is 0 or not a
/// power of 2.
#[inline]
pub fn align_up(n: usize, alignment: usize) -> Option<usize> {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    n.checked_add(alignment - 1).map(|v| v & !(alignment - 1))
}
