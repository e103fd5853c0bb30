//! Byte arenas for the zfpbuf boundary layer: owned, aligned storage with an
//! exact, caller-controlled capacity and fallible allocation.

pub mod align;
pub mod arena;

pub use arena::{AlignedArena, AllocError};
