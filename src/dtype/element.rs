//! Element trait for mapping Rust types to DType

use super::DType;
use num_traits::{One, Zero};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// Trait for types that can be elements of a tensor
///
/// Connects Rust's type system to narray's runtime dtype system. Implemented
/// for the supported primitive numeric types.
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - elements are plain values shared across threads
/// - `Add + Sub + Mul + Div + AddAssign` - elementwise arithmetic (Output = Self)
/// - `Zero + One` - additive and multiplicative identities
/// - `PartialOrd` - comparison for min/max and pivot selection
///
/// Note: `Neg` is NOT required since unsigned types don't support it.
/// Numeric kernels that need signed arithmetic go through to_f64/from_f64.
pub trait Element:
    Copy
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + Zero
    + One
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    ///
    /// Integer types truncate toward zero.
    fn from_f64(v: f64) -> Self;

    /// Absolute value in f64, usable for unsigned types too
    #[inline]
    fn abs_f64(self) -> f64 {
        self.to_f64().abs()
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as i32
    }
}

impl Element for u8 {
    const DTYPE: DType = DType::U8;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_dtype() {
        assert_eq!(f64::DTYPE, DType::F64);
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(i32::DTYPE, DType::I32);
        assert_eq!(u8::DTYPE, DType::U8);
    }

    #[test]
    fn test_element_conversions() {
        assert_eq!(f32::from_f64(2.5).to_f64(), 2.5f32 as f64);
        assert_eq!(i32::from_f64(42.9), 42);
        assert_eq!(u8::from_f64(3.0), 3);
    }

    #[test]
    fn test_identities() {
        assert_eq!(f64::zero() + f64::one(), 1.0);
        assert_eq!(i32::zero() + i32::one(), 1);
    }
}
