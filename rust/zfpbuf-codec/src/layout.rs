//! Field layout: the codec-level description of an array in memory.

use zfpbuf_common::{Error, Result};

use crate::ScalarType;

/// Maximum number of dimensions the codec supports.
pub const MAX_DIMENSIONS: usize = 4;

/// Dimensionality of a field, checked at runtime when converted from a raw
/// integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Arity {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Arity {
    #[inline]
    pub fn get(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for Arity {
    type Error = Error;

    fn try_from(dimensions: u32) -> Result<Self> {
        match dimensions {
            1 => Ok(Arity::One),
            2 => Ok(Arity::Two),
            3 => Ok(Arity::Three),
            4 => Ok(Arity::Four),
            _ => Err(Error::invalid_arg(
                "dimensions",
                format!("{dimensions} is outside 1..={MAX_DIMENSIONS}"),
            )),
        }
    }
}

impl TryFrom<usize> for Arity {
    type Error = Error;

    fn try_from(dimensions: usize) -> Result<Self> {
        let dimensions = u32::try_from(dimensions).unwrap_or(u32::MAX);
        Arity::try_from(dimensions)
    }
}

/// Memory layout of a dense array: scalar type, extents and element strides.
///
/// Only the first `arity` entries of `shape` and `stride` are meaningful; the
/// rest are kept at zero. A zero stride stands for the codec's default
/// contiguous stride along that dimension (see [`FieldLayout::effective_strides`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    scalar_type: ScalarType,
    arity: Arity,
    shape: [usize; MAX_DIMENSIONS],
    stride: [isize; MAX_DIMENSIONS],
}

impl FieldLayout {
    pub fn new(
        scalar_type: ScalarType,
        arity: Arity,
        shape: [usize; MAX_DIMENSIONS],
        stride: [isize; MAX_DIMENSIONS],
    ) -> FieldLayout {
        let mut layout = FieldLayout {
            scalar_type,
            arity,
            shape,
            stride,
        };
        layout.shape[arity.get()..].fill(0);
        layout.stride[arity.get()..].fill(0);
        layout
    }

    /// Creates a layout with default (contiguous) strides for the given
    /// extents, `extents[0]` varying fastest.
    pub fn contiguous(scalar_type: ScalarType, extents: &[usize]) -> Result<FieldLayout> {
        let arity = Arity::try_from(extents.len())?;
        let mut shape = [0; MAX_DIMENSIONS];
        shape[..extents.len()].copy_from_slice(extents);
        Ok(FieldLayout::new(scalar_type, arity, shape, [0; MAX_DIMENSIONS]))
    }

    /// Returns a copy of the layout with explicit strides for the leading
    /// dimensions.
    pub fn with_strides(mut self, strides: &[isize]) -> Result<FieldLayout> {
        if strides.len() > self.arity.get() {
            return Err(Error::invalid_arg(
                "strides",
                format!(
                    "{} strides given for a {}-dimensional field",
                    strides.len(),
                    self.arity.get()
                ),
            ));
        }
        self.stride = [0; MAX_DIMENSIONS];
        self.stride[..strides.len()].copy_from_slice(strides);
        Ok(self)
    }

    #[inline]
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    #[inline]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    #[inline]
    pub fn dimensions(&self) -> u32 {
        self.arity as u32
    }

    #[inline]
    pub fn shape(&self) -> [usize; MAX_DIMENSIONS] {
        self.shape
    }

    #[inline]
    pub fn stride(&self) -> [isize; MAX_DIMENSIONS] {
        self.stride
    }

    /// Extents of the meaningful dimensions.
    #[inline]
    pub fn extents(&self) -> &[usize] {
        &self.shape[..self.arity.get()]
    }

    /// Total number of scalars, or `None` on overflow.
    pub fn scalar_count(&self) -> Option<usize> {
        self.extents()
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
    }

    /// Size in bytes of the array when stored contiguously.
    pub fn byte_size(&self) -> Option<usize> {
        self.scalar_count()?.checked_mul(self.scalar_type.size())
    }

    /// Strides in elements with zero entries replaced by the contiguous
    /// default for that dimension (1, nx, nx*ny, nx*ny*nz).
    pub fn effective_strides(&self) -> [isize; MAX_DIMENSIONS] {
        let mut strides = [0isize; MAX_DIMENSIONS];
        let mut default = 1isize;
        for (i, stride) in strides.iter_mut().enumerate().take(self.arity.get()) {
            *stride = if self.stride[i] != 0 {
                self.stride[i]
            } else {
                default
            };
            default = default.saturating_mul(self.shape[i].min(isize::MAX as usize) as isize);
        }
        strides
    }

    /// Number of bytes a source buffer must hold, starting at the field
    /// origin, for every strided element to be addressable.
    ///
    /// Returns `None` if some element would live at a negative offset or the
    /// extent overflows.
    pub fn required_bytes(&self) -> Option<usize> {
        if self.scalar_count()? == 0 {
            return Some(0);
        }
        let strides = self.effective_strides();
        let mut last = 0isize;
        for (&n, &s) in self.extents().iter().zip(strides.iter()) {
            let reach = isize::try_from(n - 1).ok()?.checked_mul(s)?;
            if reach < 0 {
                return None;
            }
            last = last.checked_add(reach)?;
        }
        usize::try_from(last)
            .ok()?
            .checked_add(1)?
            .checked_mul(self.scalar_type.size())
    }

    /// Returns `true` if both layouts describe the same scalar type and
    /// extents, regardless of strides.
    pub fn same_shape(&self, other: &FieldLayout) -> bool {
        self.scalar_type == other.scalar_type
            && self.arity == other.arity
            && self.shape == other.shape
    }
}
