/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Whole-field compression and decompression.
//!
//! The driver walks blocks in row-major block order (x fastest), gathers each
//! tile through the field's strides, and runs the block codec. In fixed-rate
//! mode every block lands word-aligned at a known offset, which enables both
//! O(1) random access and the parallel execution policy; in the other modes
//! block offsets are data-dependent and the walk is strictly sequential.
//!
//! The caller provides the destination buffer. [`maximum_size`] computes the
//! conservative upper bound the buffer must meet; a smaller buffer is
//! rejected up front with [`Error::Capacity`] and nothing is written.

use crate::codec::{self, block_size, MAX_DIMS};
use crate::config::{Config, Execution, Mode};
use crate::error::{Error, Result};
use crate::field::{Field, FieldMut};
use crate::impls::{BitReader, BitWriter, MemWordReader, MemWordWriterSlice};
use crate::traits::{BitRead, BitWrite, Scalar};
use crate::{StreamWord, STREAM_WORD_BITS};

/// Conservative upper bound, in bytes, on the compressed size of a field
/// with the given extents under `config`.
pub fn maximum_size<T: Scalar>(config: &Config, dims: &[usize]) -> usize {
    required_words::<T>(config, &block_counts_of(dims), dims.len().clamp(1, MAX_DIMS))
        * (STREAM_WORD_BITS / 8)
}

fn block_counts_of(dims: &[usize]) -> [usize; MAX_DIMS] {
    let mut counts = [1usize; MAX_DIMS];
    for (axis, &n) in dims.iter().enumerate().take(MAX_DIMS) {
        counts[axis] = n.div_ceil(codec::BLOCK_EDGE);
    }
    counts
}

fn required_words<T: Scalar>(config: &Config, counts: &[usize; MAX_DIMS], dims: usize) -> usize {
    let blocks: u64 = counts.iter().product::<usize>() as u64;
    let per_block = match config.mode() {
        Mode::FixedRate => config.maxbits() as u64,
        _ => codec::bound_block_bits::<T>(dims)
            .min(config.maxbits() as u64)
            .max(config.minbits() as u64),
    };
    (blocks * per_block).div_ceil(STREAM_WORD_BITS as u64) as usize
}

fn check_mode<T: Scalar>(config: &Config) -> Result<()> {
    if config.mode() == Mode::FixedAccuracy && !T::IS_FLOAT {
        return Err(Error::InvalidConfig(
            "fixed-accuracy mode requires a floating-point scalar type",
        ));
    }
    Ok(())
}

/// Block coordinates of the `b`-th block in row-major block order.
#[inline]
fn block_coords(b: usize, counts: &[usize; MAX_DIMS]) -> [usize; MAX_DIMS] {
    [
        b % counts[0],
        (b / counts[0]) % counts[1],
        (b / (counts[0] * counts[1])) % counts[2],
        b / (counts[0] * counts[1] * counts[2]),
    ]
}

/// Compress `field` into `dst`, returning the number of bits written.
///
/// `dst` must hold at least [`maximum_size`] bytes worth of words; smaller
/// buffers are rejected with [`Error::Capacity`] and zero bits written. Under
/// [`Execution::Offload`] in a non-fixed-rate mode the call returns `Ok(0)`
/// and leaves `dst` untouched, mirroring what an accelerator backend must do.
pub fn compress<T: Scalar>(
    config: &Config,
    field: &Field<T>,
    dst: &mut [StreamWord],
) -> Result<u64> {
    check_mode::<T>(config)?;
    let required =
        required_words::<T>(config, &field.layout().block_counts(), field.dimensionality());
    if dst.len() < required {
        return Err(Error::Capacity {
            required,
            actual: dst.len(),
        });
    }
    match config.execution() {
        Execution::Serial => compress_serial(config, field, dst),
        Execution::Threaded => {
            if config.mode() == Mode::FixedRate {
                compress_threaded(config, field, dst)
            } else {
                // data-dependent offsets: strictly sequential
                compress_serial(config, field, dst)
            }
        }
        Execution::Offload => {
            if config.mode() == Mode::FixedRate {
                compress_serial(config, field, dst)
            } else {
                Ok(0)
            }
        }
    }
}

/// Compress into a freshly allocated buffer, returning the words that were
/// produced and the bit count.
pub fn compress_to_words<T: Scalar>(
    config: &Config,
    field: &Field<T>,
) -> Result<(Vec<StreamWord>, u64)> {
    let mut words = vec![
        0 as StreamWord;
        required_words::<T>(config, &field.layout().block_counts(), field.dimensionality())
    ];
    let bits = compress(config, field, &mut words)?;
    words.truncate((bits.div_ceil(STREAM_WORD_BITS as u64)) as usize);
    Ok((words, bits))
}

fn compress_serial<T: Scalar>(
    config: &Config,
    field: &Field<T>,
    dst: &mut [StreamWord],
) -> Result<u64> {
    let dims = field.dimensionality();
    let n = block_size(dims);
    let counts = field.layout().block_counts();
    let fixed_rate = config.mode() == Mode::FixedRate;
    let mut writer = BitWriter::new(MemWordWriterSlice::new(dst));
    let mut block = [T::default(); codec::MAX_BLOCK];
    let mut bits = 0u64;
    for b in 0..field.layout().total_blocks() {
        field.gather(block_coords(b, &counts), &mut block[..n]);
        bits += codec::encode_block(config, dims, &block[..n], &mut writer)?;
        if fixed_rate {
            bits += writer.align()? as u64;
        }
    }
    writer.flush()?;
    Ok(bits)
}

/// Fixed-rate only: blocks are dealt out to scoped threads in contiguous
/// runs, each thread writing its own word-aligned range of `dst`. The output
/// is bit-identical to the serial path.
fn compress_threaded<T: Scalar>(
    config: &Config,
    field: &Field<T>,
    dst: &mut [StreamWord],
) -> Result<u64> {
    let counts = field.layout().block_counts();
    let total = field.layout().total_blocks();
    let words_per_block = config.block_bits() as usize / STREAM_WORD_BITS;
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(total);
    if threads <= 1 {
        return compress_serial(config, field, dst);
    }
    let chunk_blocks = total.div_ceil(threads);
    let chunk_words = chunk_blocks * words_per_block;

    let dims = field.dimensionality();
    let n = block_size(dims);
    let mut bits = 0u64;
    std::thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(threads);
        for (ci, chunk) in dst[..total * words_per_block]
            .chunks_mut(chunk_words)
            .enumerate()
        {
            let blocks_here = chunk.len() / words_per_block;
            let first = ci * chunk_blocks;
            handles.push(scope.spawn(move || -> Result<u64> {
                let mut writer = BitWriter::new(MemWordWriterSlice::new(chunk));
                let mut block = [T::default(); codec::MAX_BLOCK];
                let mut bits = 0u64;
                for b in first..first + blocks_here {
                    field.gather(block_coords(b, &counts), &mut block[..n]);
                    bits += codec::encode_block(config, dims, &block[..n], &mut writer)?;
                    bits += writer.align()? as u64;
                }
                Ok(bits)
            }));
        }
        for handle in handles {
            match handle.join() {
                Ok(result) => bits += result?,
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        Ok(())
    })?;
    Ok(bits)
}

/// Decompress `src` into `field`, returning the number of bits consumed.
///
/// A truncated `src` decodes missing bits as zeros. Under
/// [`Execution::Offload`] in a non-fixed-rate mode the call returns `Ok(0)`
/// without touching `field`.
pub fn decompress<T: Scalar>(
    config: &Config,
    src: &[StreamWord],
    field: &mut FieldMut<T>,
) -> Result<u64> {
    check_mode::<T>(config)?;
    if config.execution() == Execution::Offload && config.mode() != Mode::FixedRate {
        return Ok(0);
    }
    let dims = field.dimensionality();
    let n = block_size(dims);
    let counts = field.layout().block_counts();
    let fixed_rate = config.mode() == Mode::FixedRate;
    let mut reader = BitReader::new(MemWordReader::new(src));
    let mut block = [T::default(); codec::MAX_BLOCK];
    let mut bits = 0u64;
    for b in 0..field.layout().total_blocks() {
        bits += codec::decode_block(config, dims, &mut block[..n], &mut reader)?;
        if fixed_rate {
            bits += reader.align()? as u64;
        }
        field.scatter(block_coords(b, &counts), &block[..n]);
    }
    Ok(bits)
}
