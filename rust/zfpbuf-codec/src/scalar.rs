//! Scalar kinds understood by the array codec.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use zfpbuf_common::{Error, Result};

/// Scalar type tag of an array.
///
/// Discriminants match the codec's own type tags and are part of the host
/// contract (`type` field of a buffer descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum ScalarType {
    Int32 = 1,
    Int64 = 2,
    Float = 3,
    Double = 4,
}

impl ScalarType {
    pub const ALL: [ScalarType; 4] = [
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::Float,
        ScalarType::Double,
    ];

    /// Numeric tag of the type.
    #[inline]
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Precision in bits.
    #[inline]
    pub fn precision(self) -> u32 {
        match self {
            ScalarType::Int32 | ScalarType::Float => 32,
            ScalarType::Int64 | ScalarType::Double => 64,
        }
    }

    /// Size in bytes of a single element.
    #[inline]
    pub fn size(self) -> usize {
        (self.precision() / 8) as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }
}

impl TryFrom<u32> for ScalarType {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self> {
        match tag {
            1 => Ok(ScalarType::Int32),
            2 => Ok(ScalarType::Int64),
            3 => Ok(ScalarType::Float),
            4 => Ok(ScalarType::Double),
            _ => Err(Error::invalid_arg(
                "type",
                format!("unknown scalar type tag {tag}"),
            )),
        }
    }
}

impl FromStr for ScalarType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "i32" | "int32" => Ok(ScalarType::Int32),
            "i64" | "int64" => Ok(ScalarType::Int64),
            "f32" | "float" | "float32" => Ok(ScalarType::Float),
            "f64" | "double" | "float64" => Ok(ScalarType::Double),
            _ => Err(Error::invalid_arg(
                "type",
                format!("unsupported scalar type '{s}'"),
            )),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Rust element types that map onto a [`ScalarType`].
pub trait Scalar: bytemuck::Pod + PartialEq + fmt::Debug + sealed::Sealed {
    const SCALAR_TYPE: ScalarType;
}

impl Scalar for i32 {
    const SCALAR_TYPE: ScalarType = ScalarType::Int32;
}

impl Scalar for i64 {
    const SCALAR_TYPE: ScalarType = ScalarType::Int64;
}

impl Scalar for f32 {
    const SCALAR_TYPE: ScalarType = ScalarType::Float;
}

impl Scalar for f64 {
    const SCALAR_TYPE: ScalarType = ScalarType::Double;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for ty in ScalarType::ALL {
            assert_eq!(ScalarType::try_from(ty.tag()).unwrap(), ty);
        }
        assert!(ScalarType::try_from(0).is_err());
        assert!(ScalarType::try_from(5).is_err());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(ScalarType::Int32.size(), 4);
        assert_eq!(ScalarType::Int64.size(), 8);
        assert_eq!(ScalarType::Float.size(), 4);
        assert_eq!(ScalarType::Double.size(), 8);
        assert_eq!(<f32 as Scalar>::SCALAR_TYPE.size(), std::mem::size_of::<f32>());
        assert_eq!(<i64 as Scalar>::SCALAR_TYPE.size(), std::mem::size_of::<i64>());
    }

    #[test]
    fn test_parse() {
        assert_eq!("f32".parse::<ScalarType>().unwrap(), ScalarType::Float);
        assert_eq!("Double".parse::<ScalarType>().unwrap(), ScalarType::Double);
        assert_eq!("i64".parse::<ScalarType>().unwrap(), ScalarType::Int64);
        assert!("u8".parse::<ScalarType>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ScalarType::Float).unwrap();
        assert_eq!(json, "\"float\"");
        let ty: ScalarType = serde_json::from_str("\"int32\"").unwrap();
        assert_eq!(ty, ScalarType::Int32);
    }
}
