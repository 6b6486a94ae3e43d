/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Embedded bit-plane coder.
//!
//! Coefficients arrive as unsigned codes in coding order and are emitted one
//! bit plane at a time from the most significant plane down. Within a plane,
//! the coefficients are partitioned into consecutive groups of four:
//!
//! 1. one flag bit per group, set when any not-yet-significant member has its
//!    bit set at this plane;
//! 2. one refinement bit for every coefficient that became significant at a
//!    higher plane;
//! 3. one candidate bit for every not-yet-significant member of a flagged
//!    group; a one bit promotes the coefficient to significant immediately,
//!    so it takes no refinement bit until the next plane.
//!
//! Any prefix of the output is a valid lower-fidelity code: the decoder runs
//! the same schedule and treats bits beyond the budget (or beyond a truncated
//! stream) as zeros.

use crate::traits::{BitRead, BitWrite, Word};

/// Largest supported block (4^4 coefficients).
pub(crate) const MAX_BLOCK: usize = 256;

const GROUP: usize = 4;

/// Remaining bit allowance for one block.
pub(crate) struct Budget {
    left: u64,
}

impl Budget {
    pub(crate) fn new(maxbits: u64) -> Self {
        Self { left: maxbits }
    }

    /// Reserve one bit; `false` once the block budget is exhausted.
    #[inline(always)]
    pub(crate) fn take(&mut self) -> bool {
        if self.left == 0 {
            false
        } else {
            self.left -= 1;
            true
        }
    }

    /// Reserve `n` bits, saturating; `false` if they were not all available.
    #[inline(always)]
    pub(crate) fn take_n(&mut self, n: u64) -> bool {
        if self.left < n {
            self.left = 0;
            false
        } else {
            self.left -= n;
            true
        }
    }
}

#[inline(always)]
fn bit<U: Word>(code: U, k: usize) -> bool {
    (code >> k) & U::ONE != U::ZERO
}

/// Encode `planes` bit planes of `codes`, stopping early when `budget` runs
/// out. Returns the number of bits written.
pub(crate) fn encode<U: Word, W: BitWrite>(
    writer: &mut W,
    codes: &[U],
    planes: usize,
    budget: &mut Budget,
) -> Result<u64, W::Error> {
    let n = codes.len();
    let groups = n / GROUP;
    debug_assert!(n <= MAX_BLOCK && n % GROUP == 0);

    let mut sig = [false; MAX_BLOCK];
    let mut flags = [false; MAX_BLOCK / GROUP];
    let mut written = 0u64;
    let kmin = U::BITS - planes.min(U::BITS);

    'planes: for k in (kmin..U::BITS).rev() {
        for (g, flag) in flags[..groups].iter_mut().enumerate() {
            *flag = (GROUP * g..GROUP * (g + 1)).any(|i| !sig[i] && bit(codes[i], k));
        }
        for &flag in &flags[..groups] {
            if !budget.take() {
                break 'planes;
            }
            written += writer.write_bit(flag)? as u64;
        }
        for i in 0..n {
            if sig[i] {
                if !budget.take() {
                    break 'planes;
                }
                written += writer.write_bit(bit(codes[i], k))? as u64;
            }
        }
        for g in 0..groups {
            if !flags[g] {
                continue;
            }
            for i in GROUP * g..GROUP * (g + 1) {
                if sig[i] {
                    continue;
                }
                if !budget.take() {
                    break 'planes;
                }
                let b = bit(codes[i], k);
                written += writer.write_bit(b)? as u64;
                sig[i] = b;
            }
        }
    }
    Ok(written)
}

/// Mirror of [`encode`]: reconstruct `codes` from `planes` bit planes,
/// stopping at the same point the encoder did.
pub(crate) fn decode<U: Word, R: BitRead>(
    reader: &mut R,
    codes: &mut [U],
    planes: usize,
    budget: &mut Budget,
) -> Result<u64, R::Error> {
    let n = codes.len();
    let groups = n / GROUP;
    debug_assert!(n <= MAX_BLOCK && n % GROUP == 0);

    let mut sig = [false; MAX_BLOCK];
    let mut flags = [false; MAX_BLOCK / GROUP];
    let mut read = 0u64;
    let kmin = U::BITS - planes.min(U::BITS);

    'planes: for k in (kmin..U::BITS).rev() {
        for flag in flags[..groups].iter_mut() {
            if !budget.take() {
                break 'planes;
            }
            *flag = reader.read_bit()?;
            read += 1;
        }
        for (i, code) in codes.iter_mut().enumerate() {
            if sig[i] {
                if !budget.take() {
                    break 'planes;
                }
                if reader.read_bit()? {
                    *code = *code | (U::ONE << k);
                }
                read += 1;
            }
        }
        for g in 0..groups {
            if !flags[g] {
                continue;
            }
            for i in GROUP * g..GROUP * (g + 1) {
                if sig[i] {
                    continue;
                }
                if !budget.take() {
                    break 'planes;
                }
                let b = reader.read_bit()?;
                read += 1;
                if b {
                    codes[i] = codes[i] | (U::ONE << k);
                    sig[i] = true;
                }
            }
        }
    }
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{BitReader, BitWriter, MemWordReader, MemWordWriterVec};

    fn roundtrip(codes: &[u32], planes: usize, maxbits: u64) -> (Vec<u32>, u64, u64) {
        let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
        let mut budget = Budget::new(maxbits);
        let written = encode(&mut writer, codes, planes, &mut budget).unwrap();
        writer.flush().unwrap();
        let words = writer.into_inner().unwrap().into_inner();

        let mut reader = BitReader::new(MemWordReader::new(words));
        let mut budget = Budget::new(maxbits);
        let mut decoded = vec![0u32; codes.len()];
        let read = decode(&mut reader, &mut decoded, planes, &mut budget).unwrap();
        (decoded, written, read)
    }

    #[test]
    fn full_budget_is_lossless() {
        let codes: Vec<u32> = (0..16).map(|i| (i * 2654435761u64) as u32).collect();
        let (decoded, written, read) = roundtrip(&codes, 32, u64::MAX);
        assert_eq!(decoded, codes);
        assert_eq!(written, read);
    }

    #[test]
    fn truncation_degrades_monotonically() {
        let codes: Vec<u32> = (0..16).map(|i| 1u32 << (31 - i)).collect();
        let mut last_error: u64 = u64::MAX;
        for maxbits in [16u64, 64, 128, 512, 4096] {
            let (decoded, _, _) = roundtrip(&codes, 32, maxbits);
            let error: u64 = codes
                .iter()
                .zip(&decoded)
                .map(|(&a, &b)| (a as i64 - b as i64).unsigned_abs())
                .sum();
            assert!(error <= last_error);
            last_error = error;
        }
        assert_eq!(last_error, 0);
    }

    #[test]
    fn fewer_planes_drop_low_bits_only() {
        let codes = [0xFFFF_FFFFu32, 0, 0, 0];
        let (decoded, _, _) = roundtrip(&codes, 8, u64::MAX);
        assert_eq!(decoded[0], 0xFF00_0000);
        assert_eq!(&decoded[1..], &[0, 0, 0]);
    }

    #[test]
    fn all_zero_codes_cost_group_bits_only() {
        let codes = [0u32; 16];
        let (_, written, _) = roundtrip(&codes, 32, u64::MAX);
        // one flag per group per plane, nothing else
        assert_eq!(written, 4 * 32);
    }
}
