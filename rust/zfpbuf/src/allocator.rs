//! Creation and release of buffer descriptors.
//!
//! Descriptors are heap-allocated so that a host can hold them as opaque
//! handles. Releasing a descriptor frees its arena, then the descriptor.

use crate::ArrayBuffer;

/// Returns a new zero-valued descriptor: no arena, zero size and
/// dimensionality.
pub fn create() -> Box<ArrayBuffer> {
    let buffer = Box::new(ArrayBuffer::new());
    log::trace!("created buffer descriptor {:p}", buffer.as_ref());
    buffer
}

/// Releases a descriptor and its arena. A missing descriptor is a no-op.
pub fn destroy(buffer: Option<Box<ArrayBuffer>>) {
    if let Some(buffer) = buffer {
        log::trace!(
            "releasing buffer descriptor {:p} ({} bytes)",
            buffer.as_ref(),
            buffer.capacity()
        );
        drop(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_zero_valued() {
        let buffer = create();
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.size(), 0);
        assert_eq!(buffer.dimensions(), 0);
        assert!(buffer.as_ptr().is_null());
        destroy(Some(buffer));
    }

    #[test]
    fn test_destroy_none_is_noop() {
        destroy(None);
    }

    #[test]
    fn test_destroy_with_arena() {
        let mut buffer = create();
        buffer.write_bytes(&[1; 4096]).unwrap();
        assert_eq!(buffer.capacity(), 4096);
        destroy(Some(buffer));
    }
}
