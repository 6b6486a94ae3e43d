/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::convert::Infallible;
#[cfg(feature = "mem_dbg")]
use mem_dbg::{MemDbg, MemSize};

use crate::traits::*;

/// An implementation of [`WordRead`] and [`WordSeek`] for a slice, with
/// infinite zero extension.
///
/// Reads past the end of the slice return zero words rather than failing.
/// This is the behavior a decoder wants on a truncated stream: missing bit
/// positions decode as zeros, degrading fidelity gracefully instead of
/// erroring out. As a consequence the error type is
/// [`Infallible`](core::convert::Infallible).
///
/// # Example
/// ```
/// use tessera::prelude::*;
///
/// let words: [u64; 1] = [3];
/// let mut reader = MemWordReader::new(&words);
/// assert_eq!(reader.read_word(), Ok(3));
/// assert_eq!(reader.read_word(), Ok(0));
/// assert_eq!(reader.read_word(), Ok(0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct MemWordReader<W: Word, B: AsRef<[W]>> {
    data: B,
    word_index: usize,
    _marker: core::marker::PhantomData<W>,
}

impl<W: Word, B: AsRef<[W]>> MemWordReader<W, B> {
    /// Create a new [`MemWordReader`] from a slice of data.
    #[must_use]
    pub fn new(data: B) -> Self {
        Self {
            data,
            word_index: 0,
            _marker: core::marker::PhantomData,
        }
    }

    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<W: Word, B: AsRef<[W]>> WordRead for MemWordReader<W, B> {
    type Error = Infallible;
    type Word = W;

    #[inline(always)]
    fn read_word(&mut self) -> Result<W, Infallible> {
        let res = self
            .data
            .as_ref()
            .get(self.word_index)
            .copied()
            .unwrap_or(W::ZERO);
        self.word_index += 1;
        Ok(res)
    }
}

impl<W: Word, B: AsRef<[W]>> WordSeek for MemWordReader<W, B> {
    type Error = Infallible;

    #[inline(always)]
    fn word_pos(&mut self) -> Result<u64, Infallible> {
        Ok(self.word_index as u64)
    }

    #[inline(always)]
    fn set_word_pos(&mut self, word_index: u64) -> Result<(), Infallible> {
        self.word_index = word_index as usize;
        Ok(())
    }
}
