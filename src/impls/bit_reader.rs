/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use common_traits::{AsBytes, CastableInto, Integer, Number};
#[cfg(feature = "mem_dbg")]
use mem_dbg::{MemDbg, MemSize};

use crate::traits::*;

/// An implementation of [`BitRead`] for a [`WordRead`], and of [`BitSeek`]
/// when the backend is also seekable.
///
/// The bit order mirrors [`BitWriter`](crate::impls::BitWriter): within each
/// word, bit 0 is read first. The reader keeps its own cursor, independent of
/// any writer over the same words.
///
/// # Example
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use tessera::prelude::*;
///
/// let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
/// writer.write_bits(0x3F7, 12)?;
/// writer.flush()?;
/// let words = writer.into_inner()?.into_inner();
///
/// let mut reader = BitReader::new(MemWordReader::new(&words));
/// assert_eq!(reader.read_bits(12)?, 0x3F7);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct BitReader<WR: WordRead> {
    backend: WR,
    /// Unread bits of the current word, the next one in the lowest position.
    buffer: WR::Word,
    /// Number of unread bits in the buffer, always less than the word width.
    bits_in_buffer: usize,
}

#[inline(always)]
fn mask64(n: usize) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

#[inline(always)]
fn shr_full<W: Word>(word: W, n: usize) -> W {
    if n >= W::BITS {
        W::ZERO
    } else {
        word >> n
    }
}

impl<WR: WordRead> BitReader<WR> {
    /// Create a new [`BitReader`] around a [`WordRead`].
    pub fn new(backend: WR) -> Self {
        Self {
            backend,
            buffer: WR::Word::ZERO,
            bits_in_buffer: 0,
        }
    }

    pub fn into_inner(self) -> WR {
        self.backend
    }
}

impl<WR: WordRead> BitRead for BitReader<WR>
where
    WR::Word: CastableInto<u64>,
{
    type Error = WR::Error;

    fn read_bits(&mut self, n: usize) -> Result<u64, Self::Error> {
        debug_assert!(n <= 64);
        if n == 0 {
            return Ok(0);
        }
        if n <= self.bits_in_buffer {
            let res = self.buffer.cast() & mask64(n);
            self.buffer = shr_full(self.buffer, n);
            self.bits_in_buffer -= n;
            return Ok(res);
        }
        let mut res: u64 = self.buffer.cast();
        let mut filled = self.bits_in_buffer;
        self.buffer = WR::Word::ZERO;
        self.bits_in_buffer = 0;
        while filled < n {
            let word = self.backend.read_word()?.to_le();
            if filled < 64 {
                res |= word.cast() << filled;
            }
            let take = core::cmp::min(WR::Word::BITS, n - filled);
            if take < WR::Word::BITS {
                self.buffer = shr_full(word, take);
                self.bits_in_buffer = WR::Word::BITS - take;
            }
            filled += take;
        }
        Ok(res & mask64(n))
    }

    fn skip_bits(&mut self, n: usize) -> Result<(), Self::Error> {
        if n <= self.bits_in_buffer {
            self.buffer = shr_full(self.buffer, n);
            self.bits_in_buffer -= n;
            return Ok(());
        }
        let mut left = n - self.bits_in_buffer;
        self.buffer = WR::Word::ZERO;
        self.bits_in_buffer = 0;
        while left >= WR::Word::BITS {
            self.backend.read_word()?;
            left -= WR::Word::BITS;
        }
        if left > 0 {
            let word = self.backend.read_word()?.to_le();
            self.buffer = shr_full(word, left);
            self.bits_in_buffer = WR::Word::BITS - left;
        }
        Ok(())
    }

    #[inline]
    fn align(&mut self) -> Result<usize, Self::Error> {
        let skipped = self.bits_in_buffer;
        self.buffer = WR::Word::ZERO;
        self.bits_in_buffer = 0;
        Ok(skipped)
    }
}

impl<E, W, WR> BitSeek for BitReader<WR>
where
    E: core::error::Error + Send + Sync + 'static,
    W: Word,
    WR: WordRead<Word = W, Error = E> + WordSeek<Error = E>,
{
    type Error = E;

    fn bit_pos(&mut self) -> Result<u64, E> {
        Ok(self.backend.word_pos()? * WR::Word::BITS as u64 - self.bits_in_buffer as u64)
    }

    fn set_bit_pos(&mut self, bit_pos: u64) -> Result<(), E> {
        let word_pos = bit_pos / WR::Word::BITS as u64;
        let offset = (bit_pos % WR::Word::BITS as u64) as usize;
        self.backend.set_word_pos(word_pos)?;
        if offset != 0 {
            let word = self.backend.read_word()?.to_le();
            self.buffer = shr_full(word, offset);
            self.bits_in_buffer = WR::Word::BITS - offset;
        } else {
            self.buffer = WR::Word::ZERO;
            self.bits_in_buffer = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::MemWordReader;

    #[test]
    fn reads_across_words() {
        let words: [u8; 3] = [0xCD, 0xAB, 0x05];
        let mut reader = BitReader::new(MemWordReader::new(&words));
        assert_eq!(reader.read_bits(16).unwrap(), 0xABCD);
        assert_eq!(reader.read_bits(3).unwrap(), 0x5);
    }

    #[test]
    fn zero_extends_past_the_end() {
        let words: [u64; 1] = [u64::MAX];
        let mut reader = BitReader::new(MemWordReader::new(&words));
        assert_eq!(reader.read_bits(64).unwrap(), u64::MAX);
        assert_eq!(reader.read_bits(64).unwrap(), 0);
    }

    #[test]
    fn seek_then_read() {
        let words: [u64; 2] = [0xDEAD_BEEF_0123_4567, 0xFFFF];
        let mut reader = BitReader::new(MemWordReader::new(&words));
        reader.set_bit_pos(64).unwrap();
        assert_eq!(reader.read_bits(16).unwrap(), 0xFFFF);
        reader.set_bit_pos(4).unwrap();
        assert_eq!(reader.read_bits(8).unwrap(), 0x56);
    }
}
