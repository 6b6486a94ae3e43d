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

/// An implementation of [`WordWrite`], [`WordRead`], and [`WordSeek`] for a
/// mutable slice.
///
/// Writing beyond the end of the slice returns an error: this is the backend
/// of choice when the caller has sized a compressed buffer and overruns must
/// be detected rather than grow the allocation.
///
/// # Example
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use tessera::prelude::*;
///
/// let mut words: [u64; 2] = [0, 0];
/// let mut writer = MemWordWriterSlice::new(&mut words);
///
/// writer.write_word(17)?;
/// assert_eq!(writer.word_pos()?, 1);
/// writer.set_word_pos(0)?;
/// assert_eq!(writer.read_word()?, 17);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct MemWordWriterSlice<W: Word, B: AsMut<[W]>> {
    data: B,
    word_index: usize,
    _marker: core::marker::PhantomData<W>,
}

impl<W: Word, B: AsMut<[W]>> MemWordWriterSlice<W, B> {
    /// Create a new [`MemWordWriterSlice`] from a slice of **zero-initialized**
    /// data.
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

impl<W: Word, B: AsMut<[W]>> WordWrite for MemWordWriterSlice<W, B> {
    type Error = WordError;
    type Word = W;

    #[inline]
    fn write_word(&mut self, word: W) -> Result<(), WordError> {
        match self.data.as_mut().get_mut(self.word_index) {
            Some(dst) => {
                *dst = word;
                self.word_index += 1;
                Ok(())
            }
            None => Err(WordError::UnexpectedEof {
                word_pos: self.word_index,
            }),
        }
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<(), WordError> {
        Ok(())
    }
}

impl<W: Word, B: AsMut<[W]>> WordRead for MemWordWriterSlice<W, B> {
    type Error = WordError;
    type Word = W;

    #[inline]
    fn read_word(&mut self) -> Result<W, WordError> {
        match self.data.as_mut().get(self.word_index) {
            Some(word) => {
                self.word_index += 1;
                Ok(*word)
            }
            None => Err(WordError::UnexpectedEof {
                word_pos: self.word_index,
            }),
        }
    }
}

impl<W: Word, B: AsMut<[W]>> WordSeek for MemWordWriterSlice<W, B> {
    type Error = WordError;

    #[inline(always)]
    fn word_pos(&mut self) -> Result<u64, WordError> {
        Ok(self.word_index as u64)
    }

    #[inline(always)]
    fn set_word_pos(&mut self, word_index: u64) -> Result<(), WordError> {
        if word_index > self.data.as_mut().len() as u64 {
            Err(WordError::UnexpectedEof {
                word_pos: word_index as usize,
            })
        } else {
            self.word_index = word_index as usize;
            Ok(())
        }
    }
}

/// An implementation of [`WordWrite`], [`WordRead`], and [`WordSeek`] for a
/// mutable vector.
///
/// The vector is extended as new data is written or as the position is moved
/// past its end, so every operation is infallible.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct MemWordWriterVec<W: Word, B: AsMut<Vec<W>>> {
    data: B,
    word_index: usize,
    _marker: core::marker::PhantomData<W>,
}

impl<W: Word, B: AsMut<Vec<W>> + AsRef<Vec<W>>> MemWordWriterVec<W, B> {
    #[must_use]
    pub fn new(data: B) -> Self {
        Self {
            data,
            word_index: 0,
            _marker: core::marker::PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<W: Word, B: AsMut<Vec<W>>> WordWrite for MemWordWriterVec<W, B> {
    type Error = Infallible;
    type Word = W;

    #[inline]
    fn write_word(&mut self, word: W) -> Result<(), Infallible> {
        let data = self.data.as_mut();
        if self.word_index >= data.len() {
            data.resize(self.word_index + 1, W::ZERO);
        }
        data[self.word_index] = word;
        self.word_index += 1;
        Ok(())
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl<W: Word, B: AsMut<Vec<W>>> WordRead for MemWordWriterVec<W, B> {
    type Error = Infallible;
    type Word = W;

    #[inline]
    fn read_word(&mut self) -> Result<W, Infallible> {
        let res = self
            .data
            .as_mut()
            .get(self.word_index)
            .copied()
            .unwrap_or(W::ZERO);
        self.word_index += 1;
        Ok(res)
    }
}

impl<W: Word, B: AsMut<Vec<W>>> WordSeek for MemWordWriterVec<W, B> {
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
