/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Traits for operating on streams of bits and on the scalars the codec
understands.

We provide three bit-based traits, [`BitRead`], [`BitWrite`], and [`BitSeek`],
analogous to [`std::io::Read`], [`std::io::Write`], and [`std::io::Seek`],
respectively. They provide read/write operations on fixed-width groups of
bits with a little-endian convention inside each word: bit 0 of a word is the
first bit written to it.

The implementations we provide for these traits (e.g.,
[`BitWriter`](crate::impls::BitWriter)) are based on [`WordRead`],
[`WordWrite`], and [`WordSeek`], which provide word-based operations, as
reading or writing multiple bytes at a time is usually much faster than
reading or writing single bytes, in particular when interacting with memory.
The word width is also the rate granularity of fixed-rate compression.

All traits have an internal error type `Error`, which usually propagates the
error of the underlying backend. In some cases (e.g.,
[`MemWordReader`](crate::impls::MemWordReader), which zero-extends past the
end of its slice) the error type is [`Infallible`](core::convert::Infallible),
in which case the compiler is able to perform several further optimizations.

[`Scalar`] and [`Coefficient`] describe the four element types
(`i32`, `i64`, `f32`, `f64`) and the wraparound integer arithmetic the block
transform is defined on.

*/

mod bits;
pub use bits::*;

mod words;
pub use words::*;

mod scalar;
pub use scalar::*;
