//! Data type system for narray tensors
//!
//! This module provides the `DType` enum representing all supported element types,
//! along with the `Element` trait bridging runtime dtypes to Rust primitives.

mod element;

pub use element::Element;

use std::fmt;

/// Data types supported by narray tensors
///
/// This enum represents the element type of a tensor at runtime, letting
/// shape-level code stay untyped while kernels dispatch on the concrete type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 8-bit unsigned integer
    U8,
    /// 32-bit signed integer
    I32,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Returns true if this is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Returns true if this is an integer type
    #[inline]
    pub const fn is_int(self) -> bool {
        matches!(self, Self::U8 | Self::I32)
    }

    /// Short name for display (e.g., "f32", "i32")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::U8.size_in_bytes(), 1);
        assert_eq!(DType::I32.size_in_bytes(), 4);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F64.size_in_bytes(), 8);
    }

    #[test]
    fn test_dtype_categories() {
        assert!(DType::F32.is_float());
        assert!(DType::F64.is_float());
        assert!(!DType::I32.is_float());
        assert!(DType::U8.is_int());
        assert!(DType::I32.is_int());
        assert!(!DType::F64.is_int());
    }

    #[test]
    fn test_short_names() {
        assert_eq!(DType::U8.short_name(), "u8");
        assert_eq!(DType::F64.to_string(), "f64");
    }
}
