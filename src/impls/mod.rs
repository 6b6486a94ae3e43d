/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Implementations of bit and word (seekable) streams.

The bit streams read from and write to word streams, that is, implementations
of [`WordRead`](crate::traits::WordRead) and
[`WordWrite`](crate::traits::WordWrite). To read or write words directly from
memory, use [`MemWordReader`] and [`MemWordWriterVec`]/[`MemWordWriterSlice`],
which read from a slice and write to a vector/slice.

The word type selects the rate granularity of the codec: fixed-rate block
budgets are rounded up to a word multiple, so a `u8` word quantizes rates
four times finer than a `u64` word (at some speed cost). The word type of the
compressed-array layer is chosen at build time through the `word_8`/`word_16`/
`word_32` features and defaults to `u64`.

Once you have a word stream, [`BitWriter`] and [`BitReader`] pack and unpack
bits at arbitrary positions. Both store bits little-endian within each word,
and both implement [`BitSeek`](crate::traits::BitSeek) when the backend is
seekable; the read and write cursors are fully independent. Words reach
memory in little-endian byte order on every host, so a compressed buffer can
be memcpy'd between hosts of different endianness provided bytes are swapped
at the word granularity used at build time (this is exactly what
[`words_to_le_bytes`](crate::utils::words_to_le_bytes) does).

*/

mod mem_word_reader;
pub use mem_word_reader::*;

mod mem_word_writer;
pub use mem_word_writer::*;

mod bit_reader;
pub use bit_reader::BitReader;

mod bit_writer;
pub use bit_writer::BitWriter;
