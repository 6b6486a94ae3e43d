/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Traits describing the scalar types the codec understands.
//!
//! [`Scalar`] is implemented by the four supported element types (`i32`,
//! `i64`, `f32`, `f64`) and carries the constants the block pipeline needs:
//! mantissa precision, exponent field width and bias, the fixed-point
//! position used when normalizing a floating-point block, and the smallest
//! encodable block exponent. [`Coefficient`] is the signed integer type a
//! block is transformed in (`i32` or `i64`); all its arithmetic wraps at the
//! coefficient width so that the lifting transform is exactly invertible.

use core::fmt::Debug;
use core::ops::{BitAnd, BitOr};

use super::words::Word;

/// A signed block coefficient with two's-complement wraparound arithmetic.
///
/// The lifting transform and the signed→unsigned interleaving are expressed
/// entirely through these operations, so implementations on targets that trap
/// on overflow must use explicit wrapping arithmetic.
pub trait Coefficient:
    Copy
    + Eq
    + Default
    + Debug
    + BitOr<Output = Self>
    + BitAnd<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// The unsigned image of [`Coefficient::to_code`], wide as `Self`.
    type Code: Word;

    /// Width of the coefficient in bits (32 or 64).
    const BITS: usize;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;

    /// Wrapping left shift by one.
    fn wrapping_shl1(self) -> Self;

    /// Arithmetic right shift.
    fn sar(self, n: u32) -> Self;

    /// A small constant lifted into the coefficient type.
    fn small(v: i8) -> Self;

    fn is_odd(self) -> bool;

    /// Map to the unsigned code `(2s) XOR (s >> (w-1))`, whose bit planes
    /// reveal sign and magnitude progressively from the top down.
    fn to_code(self) -> Self::Code;

    /// Inverse of [`Coefficient::to_code`].
    fn from_code(code: Self::Code) -> Self;
}

macro_rules! impl_coefficient {
    ($signed:ty, $unsigned:ty, $bits:literal) => {
        impl Coefficient for $signed {
            type Code = $unsigned;

            const BITS: usize = $bits;

            #[inline(always)]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$signed>::wrapping_add(self, rhs)
            }

            #[inline(always)]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$signed>::wrapping_sub(self, rhs)
            }

            #[inline(always)]
            fn wrapping_shl1(self) -> Self {
                self.wrapping_shl(1)
            }

            #[inline(always)]
            fn sar(self, n: u32) -> Self {
                self >> n
            }

            #[inline(always)]
            fn small(v: i8) -> Self {
                v as $signed
            }

            #[inline(always)]
            fn is_odd(self) -> bool {
                self & 1 != 0
            }

            #[inline(always)]
            fn to_code(self) -> $unsigned {
                (self.wrapping_shl(1) ^ (self >> ($bits - 1))) as $unsigned
            }

            #[inline(always)]
            fn from_code(code: $unsigned) -> Self {
                ((code >> 1) as $signed) ^ -((code & 1) as $signed)
            }
        }
    };
}

impl_coefficient!(i32, u32, 32);
impl_coefficient!(i64, u64, 64);

/// An element type the codec can compress.
///
/// Integer types carry an implicit exponent of zero and map to coefficients
/// by identity; floating-point types are normalized per block by a shared
/// exponent before quantization to [`Scalar::Coeff`].
pub trait Scalar: Copy + PartialOrd + Default + Debug + Send + Sync + 'static {
    /// The signed integer type blocks of this scalar are transformed in.
    type Coeff: Coefficient;

    const IS_FLOAT: bool;

    /// Bits of precision of the type (mantissa including the implicit bit
    /// for floats, full width for integers).
    const PRECISION: usize;

    /// Width of the encoded per-block exponent field (0 for integers).
    const EBITS: usize;

    /// Bias added to the block exponent before encoding.
    const EBIAS: i32;

    /// Fixed-point position: floating blocks are scaled by
    /// `2^(Q - emax)` before rounding to integers.
    const Q: i32;

    /// Smallest block exponent that can still be encoded.
    const MIN_EXP: i32;

    /// `floor(log2 |x|)`, or `i32::MIN` for zero.
    fn exponent(self) -> i32;

    /// Quantize to a coefficient under the block exponent `emax`.
    fn to_fixed(self, emax: i32) -> Self::Coeff;

    /// Inverse of [`Scalar::to_fixed`].
    fn from_fixed(c: Self::Coeff, emax: i32) -> Self;

    /// Order-preserving reinterpretation of the value as a coefficient,
    /// used by the bit-exact reversible path. The identity for integers.
    fn to_pattern(self) -> Self::Coeff;

    /// Inverse of [`Scalar::to_pattern`].
    fn from_pattern(c: Self::Coeff) -> Self;
}

/// `x * 2^n` in two exact steps, so that `|n|` may exceed the largest
/// finite exponent of `f64`.
#[inline]
fn scale_f64(x: f64, n: i32) -> f64 {
    let half = n / 2;
    x * 2f64.powi(half) * 2f64.powi(n - half)
}

impl Scalar for f32 {
    type Coeff = i32;

    const IS_FLOAT: bool = true;
    const PRECISION: usize = 24;
    const EBITS: usize = 8;
    const EBIAS: i32 = 128;
    const Q: i32 = 30;
    const MIN_EXP: i32 = -149;

    #[inline]
    fn exponent(self) -> i32 {
        if self == 0.0 {
            return i32::MIN;
        }
        let bits = self.to_bits();
        let e = ((bits >> 23) & 0xff) as i32;
        if e != 0 {
            e - 127
        } else {
            // subnormal: the value is mantissa * 2^-149
            let m = bits & 0x007f_ffff;
            31 - m.leading_zeros() as i32 - 149
        }
    }

    #[inline]
    fn to_fixed(self, emax: i32) -> i32 {
        scale_f64(self as f64, Self::Q - emax).round() as i32
    }

    #[inline]
    fn from_fixed(c: i32, emax: i32) -> f32 {
        scale_f64(c as f64, emax - Self::Q) as f32
    }

    #[inline]
    fn to_pattern(self) -> i32 {
        let u = self.to_bits();
        let m = if u >> 31 == 0 { u | 0x8000_0000 } else { !u };
        (m ^ 0x8000_0000) as i32
    }

    #[inline]
    fn from_pattern(c: i32) -> f32 {
        let m = (c as u32) ^ 0x8000_0000;
        let u = if m >> 31 == 1 { m & 0x7fff_ffff } else { !m };
        f32::from_bits(u)
    }
}

impl Scalar for f64 {
    type Coeff = i64;

    const IS_FLOAT: bool = true;
    const PRECISION: usize = 53;
    const EBITS: usize = 11;
    const EBIAS: i32 = 1024;
    const Q: i32 = 62;
    const MIN_EXP: i32 = -1074;

    #[inline]
    fn exponent(self) -> i32 {
        if self == 0.0 {
            return i32::MIN;
        }
        let bits = self.to_bits();
        let e = ((bits >> 52) & 0x7ff) as i32;
        if e != 0 {
            e - 1023
        } else {
            let m = bits & 0x000f_ffff_ffff_ffff;
            63 - m.leading_zeros() as i32 - 1074
        }
    }

    #[inline]
    fn to_fixed(self, emax: i32) -> i64 {
        scale_f64(self, Self::Q - emax).round() as i64
    }

    #[inline]
    fn from_fixed(c: i64, emax: i32) -> f64 {
        scale_f64(c as f64, emax - Self::Q)
    }

    #[inline]
    fn to_pattern(self) -> i64 {
        let u = self.to_bits();
        let m = if u >> 63 == 0 {
            u | 0x8000_0000_0000_0000
        } else {
            !u
        };
        (m ^ 0x8000_0000_0000_0000) as i64
    }

    #[inline]
    fn from_pattern(c: i64) -> f64 {
        let m = (c as u64) ^ 0x8000_0000_0000_0000;
        let u = if m >> 63 == 1 {
            m & 0x7fff_ffff_ffff_ffff
        } else {
            !m
        };
        f64::from_bits(u)
    }
}

macro_rules! impl_int_scalar {
    ($ty:ty, $bits:literal) => {
        impl Scalar for $ty {
            type Coeff = $ty;

            const IS_FLOAT: bool = false;
            const PRECISION: usize = $bits;
            const EBITS: usize = 0;
            const EBIAS: i32 = 0;
            const Q: i32 = 0;
            const MIN_EXP: i32 = i32::MIN;

            #[inline(always)]
            fn exponent(self) -> i32 {
                0
            }

            #[inline(always)]
            fn to_fixed(self, _emax: i32) -> $ty {
                self
            }

            #[inline(always)]
            fn from_fixed(c: $ty, _emax: i32) -> $ty {
                c
            }

            #[inline(always)]
            fn to_pattern(self) -> $ty {
                self
            }

            #[inline(always)]
            fn from_pattern(c: $ty) -> $ty {
                c
            }
        }
    };
}

impl_int_scalar!(i32, 32);
impl_int_scalar!(i64, 64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponent_matches_log2() {
        assert_eq!(1.0f32.exponent(), 0);
        assert_eq!(1.5f32.exponent(), 0);
        assert_eq!(2.0f32.exponent(), 1);
        assert_eq!(0.75f64.exponent(), -1);
        assert_eq!((-8.0f64).exponent(), 3);
        assert_eq!(0.0f32.exponent(), i32::MIN);
        // smallest f32 subnormal is 2^-149
        assert_eq!(f32::from_bits(1).exponent(), -149);
    }

    #[test]
    fn fixed_point_roundtrip_within_precision() {
        let x = 0.7853981f32;
        let emax = x.exponent();
        let c = x.to_fixed(emax);
        let y = f32::from_fixed(c, emax);
        assert!((x - y).abs() <= 2f32.powi(emax - 23));
    }

    #[test]
    fn pattern_roundtrip_is_exact_and_ordered() {
        let values = [-2.5f64, -0.0, 0.0, 1.0e-300, 3.25, f64::MAX];
        for &v in &values {
            let p = v.to_pattern();
            assert_eq!(f64::from_pattern(p).to_bits(), v.to_bits());
        }
        for w in values.windows(2) {
            if w[0] < w[1] {
                assert!(w[0].to_pattern() < w[1].to_pattern());
            }
        }
    }

    #[test]
    fn code_roundtrip() {
        for s in [0i32, 1, -1, 2, -2, i32::MAX, i32::MIN, 12345, -98765] {
            assert_eq!(i32::from_code(s.to_code()), s);
        }
        // small magnitudes map to small codes
        assert_eq!(0i64.to_code(), 0);
        assert_eq!((-1i64).to_code(), 1);
        assert_eq!(1i64.to_code(), 2);
    }
}
