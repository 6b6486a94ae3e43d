/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]

pub mod array;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod impls;
pub mod traits;
pub mod utils;

#[cfg(feature = "fuzz")]
pub mod fuzz;

/// The bit-stream word type selected at build time through the
/// `word_8`/`word_16`/`word_32` features; `u64` by default.
///
/// The word width is the granularity of fixed-rate compression: a block
/// budget is rounded up to a word multiple, that is, `8/4^d` bits per value
/// per word-size byte.
#[cfg(feature = "word_8")]
pub type StreamWord = u8;

#[cfg(all(feature = "word_16", not(feature = "word_8")))]
/// The bit-stream word type selected at build time.
pub type StreamWord = u16;

#[cfg(all(feature = "word_32", not(any(feature = "word_8", feature = "word_16"))))]
/// The bit-stream word type selected at build time.
pub type StreamWord = u32;

#[cfg(not(any(feature = "word_8", feature = "word_16", feature = "word_32")))]
/// The bit-stream word type selected at build time through the
/// `word_8`/`word_16`/`word_32` features; `u64` by default.
///
/// The word width is the granularity of fixed-rate compression: a block
/// budget is rounded up to a word multiple, that is, `8/4^d` bits per value
/// per word-size byte.
pub type StreamWord = u64;

/// Width of [`StreamWord`] in bits.
pub const STREAM_WORD_BITS: usize = core::mem::size_of::<StreamWord>() * 8;

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::array::{Array1, Array2, Array3, Array4, CompressedArray};
    pub use crate::config::{Config, Execution, Mode};
    pub use crate::driver::{compress, compress_to_words, decompress, maximum_size};
    pub use crate::error::{Error, Result};
    pub use crate::field::{Field, FieldMut};
    pub use crate::impls::*;
    pub use crate::traits::*;
    pub use crate::utils::{crc32, words_from_le_bytes, words_to_le_bytes};
    pub use crate::{StreamWord, STREAM_WORD_BITS};
}
