/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Support utilities: stream hashing for the conformance tests and the byte
serialization of word buffers.

Compressed data lives in memory as native-endian words; on disk and on the
wire it is little-endian at the build-time word granularity. The two helpers
here convert between the representations, which is also all that is needed to
move a buffer between hosts of different endianness.

*/

pub mod checksum;
pub use checksum::crc32;

use crate::StreamWord;

/// Serialize words in the on-disk order: little-endian bytes, word by word.
pub fn words_to_le_bytes(words: &[StreamWord]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Inverse of [`words_to_le_bytes`]. Trailing bytes that do not fill a word
/// are zero-extended into a final word.
pub fn words_from_le_bytes(bytes: &[u8]) -> Vec<StreamWord> {
    const SIZE: usize = core::mem::size_of::<StreamWord>();
    let mut words = Vec::with_capacity(bytes.len().div_ceil(SIZE));
    let mut chunks = bytes.chunks_exact(SIZE);
    for chunk in &mut chunks {
        let mut buf = [0u8; SIZE];
        buf.copy_from_slice(chunk);
        words.push(StreamWord::from_le_bytes(buf));
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut buf = [0u8; SIZE];
        buf[..rest.len()].copy_from_slice(rest);
        words.push(StreamWord::from_le_bytes(buf));
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_roundtrip() {
        let words: Vec<StreamWord> = (0..5).map(|i| (i as StreamWord).wrapping_mul(0x33)).collect();
        assert_eq!(words_from_le_bytes(&words_to_le_bytes(&words)), words);
    }
}
