// Supported element types
//
// The closed set of numeric element types the bridge accepts. Tag values
// follow the torch ScalarType codes so hosts that already speak that
// numbering keep working.

use candle_core::DType;

use crate::errors::{BridgeError, Result};

/// Element type of a tensor crossing the bridge boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    I64,
    F32,
    F64,
}

impl ElementType {
    /// Numeric tag used on the wire (torch ScalarType codes).
    pub fn tag(self) -> u32 {
        match self {
            ElementType::U8 => 0,
            ElementType::I64 => 4,
            ElementType::F32 => 6,
            ElementType::F64 => 7,
        }
    }

    /// Parse a wire tag. Anything outside the supported set is rejected.
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(ElementType::U8),
            4 => Ok(ElementType::I64),
            6 => Ok(ElementType::F32),
            7 => Ok(ElementType::F64),
            other => Err(BridgeError::UnsupportedDtype(other)),
        }
    }

    /// Width of one element in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::I64 => 8,
            ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    /// The runtime dtype this element type maps onto.
    pub fn dtype(self) -> DType {
        match self {
            ElementType::U8 => DType::U8,
            ElementType::I64 => DType::I64,
            ElementType::F32 => DType::F32,
            ElementType::F64 => DType::F64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for ty in [
            ElementType::U8,
            ElementType::I64,
            ElementType::F32,
            ElementType::F64,
        ] {
            assert_eq!(ElementType::from_tag(ty.tag()).unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        // 5 is torch Half, which the bridge does not carry
        let err = ElementType::from_tag(5).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedDtype(5)));
    }

    #[test]
    fn test_byte_widths() {
        assert_eq!(ElementType::F32.byte_width(), 4);
        assert_eq!(ElementType::F64.byte_width(), 8);
        assert_eq!(ElementType::I64.byte_width(), 8);
        assert_eq!(ElementType::U8.byte_width(), 1);
    }
}
