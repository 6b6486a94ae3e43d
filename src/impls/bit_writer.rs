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

/// An implementation of [`BitWrite`] for a [`WordWrite`], and of [`BitSeek`]
/// when the backend is also seekable and readable.
///
/// Bits are packed little-endian within each word: bit 0 of a word is the
/// first bit written to it. The implementation keeps a one-word bit buffer;
/// a word reaches the backend only when all of its bits have been produced
/// or on [`flush`](BitWrite::flush), which zero-fills the remainder.
///
/// Seeking writes out the pending partial word (zero-padded) and, when the
/// target position is not word-aligned, latches the low bits already stored
/// in the target word; the bits above the target position in that word are
/// discarded on the next flush. Block budgets in fixed-rate mode are word
/// multiples, so in practice seeks land on word boundaries.
///
/// The writer does not flush on drop: call [`flush`](BitWrite::flush) or
/// [`into_inner`](BitWriter::into_inner) when done.
///
/// # Example
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use tessera::prelude::*;
///
/// let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
/// writer.write_bits(0b1011, 4)?;
/// writer.write_bit(true)?;
/// let padding = writer.flush()?;
/// assert_eq!(padding, 59);
///
/// let words = writer.into_inner()?.into_inner();
/// assert_eq!(words, vec![0b11011]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct BitWriter<WW: WordWrite> {
    backend: WW,
    /// Pending bits, the oldest in the lowest positions. Only the lowest
    /// `bits_in_buffer` bits are meaningful, the rest are zero.
    buffer: WW::Word,
    /// Number of pending bits, always less than the word width.
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

impl<WW: WordWrite> BitWriter<WW> {
    /// Create a new [`BitWriter`] around a [`WordWrite`].
    pub fn new(backend: WW) -> Self {
        Self {
            backend,
            buffer: WW::Word::ZERO,
            bits_in_buffer: 0,
        }
    }

    /// Flush and return the backend.
    pub fn into_inner(mut self) -> Result<WW, WW::Error>
    where
        u64: CastableInto<WW::Word>,
    {
        BitWrite::flush(&mut self)?;
        Ok(self.backend)
    }
}

impl<WW: WordWrite> BitWrite for BitWriter<WW>
where
    u64: CastableInto<WW::Word>,
{
    type Error = WW::Error;

    fn write_bits(&mut self, value: u64, n: usize) -> Result<usize, Self::Error> {
        debug_assert!(n <= 64);
        #[cfg(feature = "checks")]
        assert_eq!(value & !mask64(n), 0, "value does not fit in {} bits", n);

        if n == 0 {
            return Ok(0);
        }
        let mut value = value & mask64(n);
        let mut left = n;
        loop {
            // bits_in_buffer < Word::BITS, so there is always room for one bit
            let space = WW::Word::BITS - self.bits_in_buffer;
            if left < space {
                self.buffer |= value.cast() << self.bits_in_buffer;
                self.bits_in_buffer += left;
                break;
            }
            let word = self.buffer | (value.cast() << self.bits_in_buffer);
            self.backend.write_word(word.to_le())?;
            self.buffer = WW::Word::ZERO;
            self.bits_in_buffer = 0;
            value = if space >= 64 { 0 } else { value >> space };
            left -= space;
            if left == 0 {
                break;
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<usize, Self::Error> {
        if self.bits_in_buffer == 0 {
            self.backend.flush()?;
            return Ok(0);
        }
        let padded = WW::Word::BITS - self.bits_in_buffer;
        self.backend.write_word(self.buffer.to_le())?;
        self.buffer = WW::Word::ZERO;
        self.bits_in_buffer = 0;
        self.backend.flush()?;
        Ok(padded)
    }

    #[inline(always)]
    fn align(&mut self) -> Result<usize, Self::Error> {
        self.flush()
    }
}

impl<E, W, WW> BitSeek for BitWriter<WW>
where
    E: core::error::Error + Send + Sync + 'static,
    W: Word,
    WW: WordWrite<Word = W, Error = E> + WordRead<Word = W, Error = E> + WordSeek<Error = E>,
    u64: CastableInto<W>,
{
    type Error = E;

    fn bit_pos(&mut self) -> Result<u64, E> {
        Ok(self.backend.word_pos()? * W::BITS as u64 + self.bits_in_buffer as u64)
    }

    fn set_bit_pos(&mut self, bit_pos: u64) -> Result<(), E> {
        if self.bits_in_buffer > 0 {
            // zero-padded, like a flush
            self.backend.write_word(self.buffer.to_le())?;
        }
        let word_pos = bit_pos / W::BITS as u64;
        let offset = (bit_pos % W::BITS as u64) as usize;
        self.backend.set_word_pos(word_pos)?;
        if offset != 0 {
            // latch the bits already stored below the target position
            let existing = WordRead::read_word(&mut self.backend)?.to_le();
            self.backend.set_word_pos(word_pos)?;
            self.buffer = existing & ((W::ONE << offset) - W::ONE);
            self.bits_in_buffer = offset;
        } else {
            self.buffer = W::ZERO;
            self.bits_in_buffer = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::MemWordWriterVec;

    #[test]
    fn spills_across_words() {
        let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u8>::new()));
        writer.write_bits(0xABCD, 16).unwrap();
        writer.write_bits(0x5, 3).unwrap();
        writer.flush().unwrap();
        let bytes = writer.into_inner().unwrap().into_inner();
        assert_eq!(bytes, vec![0xCD, 0xAB, 0x05]);
    }

    #[test]
    fn seek_preserves_low_bits_of_target_word() {
        let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
        writer.write_bits(u64::MAX, 64).unwrap();
        writer.set_bit_pos(4).unwrap();
        writer.write_bits(0, 60).unwrap();
        let words = writer.into_inner().unwrap().into_inner();
        assert_eq!(words, vec![0xF]);
    }
}
