/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The block codec: the forward and inverse pipeline for one 4^d tile.

Compression runs gather → float-to-integer mapping (floats only) →
decorrelating transform → coding-order permutation → signed-to-unsigned
interleaving → embedded bit-plane coding; decompression mirrors every stage.
Blocks are self-contained (no state crosses block boundaries), which is what
allows block-granular random access in fixed-rate streams.

Per-block stream layout, in write order:

1. one "block has data" bit (`0` → the block is all zero and the code ends);
2. floats only: the biased common exponent, 8 bits for `f32`, 11 for `f64`
   (omitted on the reversible path, which codes raw bit patterns);
3. the embedded code (see [`embedded`](self) internals);
4. zero padding up to `minbits`.

*/

pub(crate) mod embedded;
pub(crate) mod order;
pub(crate) mod transform;

use crate::config::Config;
use crate::traits::{BitRead, BitWrite, Coefficient, Scalar};

use embedded::Budget;
pub(crate) use embedded::MAX_BLOCK;

/// Largest supported dimensionality.
pub const MAX_DIMS: usize = 4;

/// Blocks are `BLOCK_EDGE` scalars long in every dimension.
pub const BLOCK_EDGE: usize = 4;

/// Number of scalars in a block of dimensionality `dims`, that is, 4^dims.
#[inline(always)]
pub const fn block_size(dims: usize) -> usize {
    1 << (2 * dims)
}

/// Conservative upper bound, in bits, on the code of a single block,
/// before `minbits` padding is taken into account.
pub(crate) fn bound_block_bits<T: Scalar>(dims: usize) -> u64 {
    let n = block_size(dims) as u64;
    let planes = <T::Coeff as Coefficient>::BITS as u64;
    // header, then per plane one flag per group and one bit per coefficient
    1 + T::EBITS as u64 + planes * (n / 4 + n)
}

/// Number of bit planes retained for a floating-point block with common
/// exponent `emax`: `maxprec` capped by the accuracy floor, with `2(d+1)`
/// planes of slack for transform gain.
fn effective_precision<T: Scalar>(config: &Config, dims: usize, emax: i32) -> usize {
    let by_accuracy = (emax as i64 - config.minexp() as i64 + 2 * (dims as i64 + 1)).max(0);
    (config.maxprec() as i64)
        .min(by_accuracy)
        .min(<T::Coeff as Coefficient>::BITS as i64) as usize
}

/// Encode one gathered (and, if partial, padded) block. Returns the number
/// of bits written, which in fixed-rate mode is exactly the block budget.
pub(crate) fn encode_block<T: Scalar, W: BitWrite>(
    config: &Config,
    dims: usize,
    block: &[T],
    writer: &mut W,
) -> Result<u64, W::Error> {
    let n = block_size(dims);
    debug_assert_eq!(block.len(), n);
    let reversible = config.is_reversible();
    let minbits = config.minbits() as u64;
    let mut budget = Budget::new(config.maxbits() as u64);
    let mut coeffs = [T::Coeff::default(); MAX_BLOCK];

    let mut emax = 0i32;
    let mut planes = 0usize;
    let has_data = if reversible || !T::IS_FLOAT {
        for (c, &v) in coeffs[..n].iter_mut().zip(block) {
            *c = v.to_pattern();
        }
        planes = if reversible {
            <T::Coeff as Coefficient>::BITS
        } else {
            (config.maxprec() as usize).min(<T::Coeff as Coefficient>::BITS)
        };
        coeffs[..n].iter().any(|&c| c != T::Coeff::default())
    } else {
        let top = block
            .iter()
            .map(|v| v.exponent())
            .max()
            .unwrap_or(i32::MIN);
        if top == i32::MIN {
            false
        } else {
            // keep the biased exponent positive
            emax = top.max(1 - T::EBIAS);
            planes = effective_precision::<T>(config, dims, emax);
            if planes == 0 {
                false
            } else {
                for (c, &v) in coeffs[..n].iter_mut().zip(block) {
                    *c = v.to_fixed(emax);
                }
                true
            }
        }
    };

    budget.take();
    let mut bits = writer.write_bit(has_data)? as u64;
    if !has_data {
        if bits < minbits {
            bits += writer.pad((minbits - bits) as usize)? as u64;
        }
        return Ok(bits);
    }

    if T::IS_FLOAT && !reversible {
        budget.take_n(T::EBITS as u64);
        bits += writer.write_bits((emax + T::EBIAS) as u64, T::EBITS)? as u64;
    }

    if reversible {
        transform::forward_lossless(&mut coeffs[..n], dims);
    } else {
        transform::forward(&mut coeffs[..n], dims);
    }

    let perm = order::permutation(dims);
    let mut codes = [<<T::Coeff as Coefficient>::Code as common_traits::Number>::ZERO; MAX_BLOCK];
    for (code, &p) in codes[..n].iter_mut().zip(perm) {
        *code = coeffs[p as usize].to_code();
    }

    bits += embedded::encode(writer, &codes[..n], planes, &mut budget)?;
    if bits < minbits {
        bits += writer.pad((minbits - bits) as usize)? as u64;
    }
    Ok(bits)
}

/// Decode one block into `block`, which receives the full padded tile.
/// Returns the number of bits consumed, mirroring [`encode_block`].
pub(crate) fn decode_block<T: Scalar, R: BitRead>(
    config: &Config,
    dims: usize,
    block: &mut [T],
    reader: &mut R,
) -> Result<u64, R::Error> {
    let n = block_size(dims);
    debug_assert_eq!(block.len(), n);
    let reversible = config.is_reversible();
    let minbits = config.minbits() as u64;
    let mut budget = Budget::new(config.maxbits() as u64);

    budget.take();
    let mut bits = 1u64;
    if !reader.read_bit()? {
        block[..n].fill(T::default());
        if bits < minbits {
            reader.skip_bits((minbits - bits) as usize)?;
            bits = minbits;
        }
        return Ok(bits);
    }

    let mut emax = 0i32;
    let planes = if T::IS_FLOAT && !reversible {
        budget.take_n(T::EBITS as u64);
        emax = reader.read_bits(T::EBITS)? as i32 - T::EBIAS;
        bits += T::EBITS as u64;
        effective_precision::<T>(config, dims, emax)
    } else if reversible {
        <T::Coeff as Coefficient>::BITS
    } else {
        (config.maxprec() as usize).min(<T::Coeff as Coefficient>::BITS)
    };

    let mut codes = [<<T::Coeff as Coefficient>::Code as common_traits::Number>::ZERO; MAX_BLOCK];
    bits += embedded::decode(reader, &mut codes[..n], planes, &mut budget)?;

    let perm = order::permutation(dims);
    let mut coeffs = [T::Coeff::default(); MAX_BLOCK];
    for (&code, &p) in codes[..n].iter().zip(perm) {
        coeffs[p as usize] = T::Coeff::from_code(code);
    }

    if reversible {
        transform::inverse_lossless(&mut coeffs[..n], dims);
    } else {
        transform::inverse(&mut coeffs[..n], dims);
    }

    for (v, &c) in block[..n].iter_mut().zip(&coeffs[..n]) {
        *v = if T::IS_FLOAT && !reversible {
            T::from_fixed(c, emax)
        } else {
            T::from_pattern(c)
        };
    }

    if bits < minbits {
        reader.skip_bits((minbits - bits) as usize)?;
        bits = minbits;
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{BitReader, BitWriter, MemWordReader, MemWordWriterVec};

    fn roundtrip<T: Scalar>(config: &Config, dims: usize, block: &[T]) -> (Vec<T>, u64, u64) {
        let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
        let written = encode_block(config, dims, block, &mut writer).unwrap();
        writer.flush().unwrap();
        let words = writer.into_inner().unwrap().into_inner();

        let mut reader = BitReader::new(MemWordReader::new(words));
        let mut decoded = vec![T::default(); block.len()];
        let read = decode_block(config, dims, &mut decoded, &mut reader).unwrap();
        (decoded, written, read)
    }

    #[test]
    fn all_zero_float_block_costs_one_bit() {
        let config = Config::default();
        let block = [0.0f32; 16];
        let (decoded, written, read) = roundtrip(&config, 2, &block);
        assert_eq!(written, 1);
        assert_eq!(read, 1);
        assert_eq!(decoded, block);
    }

    #[test]
    fn all_zero_block_pads_to_minbits() {
        let mut config = Config::default();
        config.set_rate(8.0, 2);
        let block = [0.0f64; 16];
        let (decoded, written, read) = roundtrip(&config, 2, &block);
        assert_eq!(written, config.minbits() as u64);
        assert_eq!(read, written);
        assert_eq!(decoded, block);
    }

    #[test]
    fn reversible_ints_roundtrip_exactly() {
        let mut config = Config::default();
        config.set_reversible();
        let block: Vec<i32> = (0..64)
            .map(|i| (i as i32).wrapping_mul(-0x1234_5677).wrapping_add(99))
            .collect();
        let (decoded, written, read) = roundtrip(&config, 3, &block);
        assert_eq!(decoded, block);
        assert_eq!(written, read);
    }

    #[test]
    fn reversible_floats_roundtrip_exactly() {
        let mut config = Config::default();
        config.set_reversible();
        let block: Vec<f64> = (0..16)
            .map(|i| (i as f64 * 0.377).sin() * 1e6 - 3.25)
            .collect();
        let (decoded, _, _) = roundtrip(&config, 2, &block);
        for (a, b) in decoded.iter().zip(&block) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn fixed_rate_block_consumes_exact_budget() {
        let mut config = Config::default();
        config.set_rate(16.0, 2);
        let block: Vec<f32> = (0..16).map(|i| (i as f32) * 0.125 - 0.9).collect();
        let (decoded, written, read) = roundtrip(&config, 2, &block);
        assert_eq!(written, config.maxbits() as u64);
        assert_eq!(read, written);
        for (a, b) in decoded.iter().zip(&block) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    fn smooth_block_decodes_within_tolerance() {
        let mut config = Config::default();
        let tol = config.set_accuracy(1e-6).unwrap();
        let block: Vec<f64> = (0..64)
            .map(|i| ((i % 4) as f64 * 0.1 + ((i / 4) % 4) as f64 * 0.01).cos())
            .collect();
        let (decoded, _, _) = roundtrip(&config, 3, &block);
        for (a, b) in decoded.iter().zip(&block) {
            assert!((a - b).abs() <= tol, "{} vs {} (tol {})", a, b, tol);
        }
    }
}
