/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Compressed arrays: the illusion of a mutable dense array over a fixed-rate
compressed buffer.

A [`CompressedArray`] owns a contiguous buffer of compressed blocks (every
block the same, word-aligned, number of bits, so block `b` starts at a known
offset) and a small write-back [cache](cache) of decoded blocks. Reads decode
at most one block on a cache miss; writes mutate the cached block and mark it
dirty; a dirty block is re-encoded when its cache slot is reused or on an
explicit flush. Operations that expose the compressed buffer
([`CompressedArray::compressed_data`] and friends) flush first.

[`Reference`], [`Pointer`], and [`Iter`] are proxy handles carrying the array
and a flat index: a decoded scalar only exists while its block is cached, so
handles revalidate through the cache on every access instead of pinning
memory. The cache lives behind a [`RefCell`]; the array is deliberately not
`Sync`: concurrent access would race on cache metadata.

```
use tessera::array::Array2;

let array = Array2::<f32>::new([17, 9], 12.0).unwrap();
array.set([16, 8], 2.5);
assert_eq!(array.get([16, 8]), 2.5);
array.flush_cache();
assert!((array.get([16, 8]) - 2.5).abs() < 1e-3);
```

*/

mod cache;
mod iter;
mod pointer;
mod reference;

pub use iter::Iter;
pub use pointer::Pointer;
pub use reference::Reference;

use std::cell::{Ref, RefCell};

use crate::codec::{self, block_size, BLOCK_EDGE, MAX_DIMS};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::field::{Field, FieldMut};
use crate::impls::{BitReader, BitWriter, MemWordReader, MemWordWriterSlice};
use crate::traits::{BitWrite, Scalar};
use crate::{StreamWord, STREAM_WORD_BITS};

use cache::Cache;

/// A 1-dimensional compressed array.
pub type Array1<T> = CompressedArray<T, 1>;
/// A 2-dimensional compressed array.
pub type Array2<T> = CompressedArray<T, 2>;
/// A 3-dimensional compressed array.
pub type Array3<T> = CompressedArray<T, 3>;
/// A 4-dimensional compressed array.
pub type Array4<T> = CompressedArray<T, 4>;

struct Store<T> {
    words: Vec<StreamWord>,
    cache: Cache<T>,
}

impl<T: Scalar> Store<T> {
    /// Re-encode the line in `slot` if it holds modified data.
    fn write_back(&mut self, config: &Config, dims: usize, wpb: usize, slot: usize) -> Result<()> {
        let Store { words, cache } = self;
        let line = &mut cache.lines[slot];
        if line.dirty {
            if let Some(tag) = line.tag {
                let mut writer =
                    BitWriter::new(MemWordWriterSlice::new(&mut words[tag * wpb..(tag + 1) * wpb]));
                codec::encode_block(config, dims, &line.data, &mut writer)?;
                writer.flush()?;
            }
            line.dirty = false;
        }
        Ok(())
    }

    /// Make `block` resident and return its slot, evicting as needed.
    fn fetch(&mut self, config: &Config, dims: usize, wpb: usize, block: usize) -> Result<usize> {
        let slot = block & self.cache.mask;
        if self.cache.lines[slot].tag != Some(block) {
            self.write_back(config, dims, wpb, slot)?;
            let Store { words, cache } = self;
            let line = &mut cache.lines[slot];
            let mut reader =
                BitReader::new(MemWordReader::new(&words[block * wpb..(block + 1) * wpb]));
            codec::decode_block(config, dims, &mut line.data, &mut reader)?;
            line.tag = Some(block);
            line.dirty = false;
        }
        Ok(slot)
    }

    fn flush(&mut self, config: &Config, dims: usize, wpb: usize) -> Result<()> {
        for slot in 0..self.cache.lines.len() {
            self.write_back(config, dims, wpb, slot)?;
        }
        Ok(())
    }
}

/// A fixed-rate compressed array of dimensionality `D` (1 to 4).
///
/// Element accessors take multi-dimensional coordinates (`[i]`, `[i, j]`, …
/// with x varying fastest in memory order) and panic when out of bounds,
/// like slice indexing. Flat-index accessors and proxy handles address the
/// same cells in row-major order.
pub struct CompressedArray<T: Scalar, const D: usize> {
    dims: [usize; D],
    config: Config,
    store: RefCell<Store<T>>,
}

impl<T: Scalar, const D: usize> core::fmt::Debug for CompressedArray<T, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompressedArray")
            .field("dims", &self.dims)
            .field("rate", &self.rate())
            .finish_non_exhaustive()
    }
}

/// The block-storage invariant: writers and readers stay inside the
/// preallocated per-block word ranges, so storage errors cannot occur after
/// construction.
fn expect_store<R>(result: Result<R>) -> R {
    match result {
        Ok(value) => value,
        Err(e) => panic!("compressed block store invariant violated: {}", e),
    }
}

impl<T: Scalar, const D: usize> CompressedArray<T, D> {
    /// An array of the given extents, all cells zero, compressed at `rate`
    /// bits per value (rounded up to the achievable granularity).
    pub fn new(dims: [usize; D], rate: f64) -> Result<Self> {
        Self::with_options(dims, rate, None, 0)
    }

    /// An array initialized from `data`, in row-major order with x fastest.
    pub fn with_contents(dims: [usize; D], rate: f64, data: &[T]) -> Result<Self> {
        Self::with_options(dims, rate, Some(data), 0)
    }

    /// Full constructor: optional initial contents and a minimum cache
    /// capacity in bytes (0 selects the default of two layers of blocks).
    pub fn with_options(
        dims: [usize; D],
        rate: f64,
        data: Option<&[T]>,
        cache_bytes: usize,
    ) -> Result<Self> {
        if D == 0 || D > MAX_DIMS {
            return Err(Error::InvalidConfig("dimensionality must be 1 to 4"));
        }
        if dims.iter().any(|&n| n == 0) {
            return Err(Error::InvalidField("zero-sized dimension"));
        }
        if !(rate > 0.0) || !rate.is_finite() {
            return Err(Error::InvalidConfig("rate must be positive"));
        }
        let mut config = Config::default();
        config.set_rate(rate, D);
        let blocks: usize = dims.iter().map(|n| n.div_ceil(BLOCK_EDGE)).product();
        let wpb = config.block_bits() as usize / STREAM_WORD_BITS;
        let mut words = Vec::new();
        words
            .try_reserve_exact(blocks * wpb)
            .map_err(|_| Error::Alloc)?;
        words.resize(blocks * wpb, 0);
        let cache_blocks = Self::cache_blocks_for(dims, cache_bytes);
        let cache = Cache::new(cache_blocks, block_size(D))?;
        let array = Self {
            dims,
            config,
            store: RefCell::new(Store { words, cache }),
        };
        if let Some(data) = data {
            array.copy_from(data)?;
        }
        // an all-zero buffer is already the encoded form of an all-zero
        // array: the "has data" bit of every block reads back as zero
        Ok(array)
    }

    fn cache_blocks_for(dims: [usize; D], cache_bytes: usize) -> usize {
        if cache_bytes == 0 {
            // two layers of blocks in the leading dimensions
            let bx = dims[0].div_ceil(BLOCK_EDGE);
            let by = if D >= 2 { dims[1].div_ceil(BLOCK_EDGE) } else { 1 };
            (2 * bx * by).max(2)
        } else {
            let line_bytes = block_size(D) * core::mem::size_of::<T>();
            cache_bytes.div_ceil(line_bytes).max(1)
        }
    }

    // geometry

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extents along each axis.
    pub fn extents(&self) -> [usize; D] {
        self.dims
    }

    pub fn size_x(&self) -> usize {
        self.dims[0]
    }

    pub fn size_y(&self) -> usize {
        self.dims.get(1).copied().unwrap_or(1)
    }

    pub fn size_z(&self) -> usize {
        self.dims.get(2).copied().unwrap_or(1)
    }

    pub fn size_w(&self) -> usize {
        self.dims.get(3).copied().unwrap_or(1)
    }

    /// Compressed bits per value actually in effect.
    pub fn rate(&self) -> f64 {
        self.config.block_bits() as f64 / block_size(D) as f64
    }

    fn cells(&self) -> usize {
        block_size(D)
    }

    fn words_per_block(&self) -> usize {
        self.config.block_bits() as usize / STREAM_WORD_BITS
    }

    fn block_counts(&self) -> [usize; D] {
        let mut counts = [0usize; D];
        for (count, &n) in counts.iter_mut().zip(&self.dims) {
            *count = n.div_ceil(BLOCK_EDGE);
        }
        counts
    }

    fn total_blocks(&self) -> usize {
        self.block_counts().iter().product()
    }

    pub(crate) fn flat_of(&self, coords: [usize; D]) -> usize {
        let mut flat = 0;
        for axis in (0..D).rev() {
            flat = flat * self.dims[axis] + coords[axis];
        }
        flat
    }

    pub(crate) fn coords_of(&self, mut flat: usize) -> [usize; D] {
        let mut coords = [0usize; D];
        for axis in 0..D {
            coords[axis] = flat % self.dims[axis];
            flat /= self.dims[axis];
        }
        coords
    }

    /// Linear block index and in-block cell offset of `coords`.
    fn locate(&self, coords: [usize; D]) -> (usize, usize) {
        let counts = self.block_counts();
        let mut block = 0;
        let mut cell = 0;
        for axis in (0..D).rev() {
            block = block * counts[axis] + coords[axis] / BLOCK_EDGE;
            cell = cell * BLOCK_EDGE + coords[axis] % BLOCK_EDGE;
        }
        (block, cell)
    }

    fn check_bounds(&self, coords: [usize; D]) {
        for axis in 0..D {
            assert!(
                coords[axis] < self.dims[axis],
                "coordinate {} out of bounds on axis {} (extent {})",
                coords[axis],
                axis,
                self.dims[axis]
            );
        }
    }

    // element access

    /// Read one cell; decodes its block on a cache miss.
    pub fn get(&self, coords: [usize; D]) -> T {
        self.check_bounds(coords);
        let (block, cell) = self.locate(coords);
        expect_store(self.read_cell(block, cell))
    }

    /// Write one cell through the cache; the compressed buffer is not
    /// touched until the block is evicted or flushed.
    pub fn set(&self, coords: [usize; D], value: T) {
        self.check_bounds(coords);
        let (block, cell) = self.locate(coords);
        expect_store(self.write_cell(block, cell, value));
    }

    /// Read by flat row-major index.
    pub fn get_flat(&self, index: usize) -> T {
        assert!(index < self.len(), "flat index out of bounds");
        self.get(self.coords_of(index))
    }

    /// Write by flat row-major index.
    pub fn set_flat(&self, index: usize, value: T) {
        assert!(index < self.len(), "flat index out of bounds");
        self.set(self.coords_of(index), value);
    }

    fn read_cell(&self, block: usize, cell: usize) -> Result<T> {
        let mut store = self.store.borrow_mut();
        let slot = store.fetch(&self.config, D, self.words_per_block(), block)?;
        Ok(store.cache.lines[slot].data[cell])
    }

    fn write_cell(&self, block: usize, cell: usize, value: T) -> Result<()> {
        let mut store = self.store.borrow_mut();
        let slot = store.fetch(&self.config, D, self.words_per_block(), block)?;
        let line = &mut store.cache.lines[slot];
        line.data[cell] = value;
        line.dirty = true;
        Ok(())
    }

    // proxies

    /// A proxy reference to the cell at `coords`.
    pub fn ref_at(&self, coords: [usize; D]) -> Reference<'_, T, D> {
        self.check_bounds(coords);
        Reference::new(self, self.flat_of(coords))
    }

    /// A proxy pointer to the cell at flat index `index`.
    pub fn ptr_at(&self, index: usize) -> Pointer<'_, T, D> {
        Pointer::new(self, index as isize)
    }

    /// Iterate over all cells in block order (every cell of a block before
    /// the next block), which maximizes cache hits.
    pub fn iter(&self) -> Iter<'_, T, D> {
        Iter::new(self)
    }

    // bulk transfers

    /// Re-encode the whole array from `data` (row-major, x fastest). Cached
    /// blocks are discarded: the new contents supersede them.
    pub fn copy_from(&self, data: &[T]) -> Result<()> {
        if data.len() < self.len() {
            return Err(Error::InvalidField("slice shorter than the extents"));
        }
        let dims: Vec<usize> = self.dims.to_vec();
        let field = Field::new(data, &dims)?;
        let counts = self.block_counts();
        let mut store = self.store.borrow_mut();
        store.cache.reset();
        let wpb = self.words_per_block();
        let mut block = [T::default(); codec::MAX_BLOCK];
        for b in 0..self.total_blocks() {
            field.gather(split_linear(b, counts), &mut block[..self.cells()]);
            let mut writer = BitWriter::new(MemWordWriterSlice::new(
                &mut store.words[b * wpb..(b + 1) * wpb],
            ));
            codec::encode_block(&self.config, D, &block[..self.cells()], &mut writer)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Decode the whole array into `data` (row-major, x fastest), flushing
    /// pending writes first.
    pub fn copy_to(&self, data: &mut [T]) -> Result<()> {
        if data.len() < self.len() {
            return Err(Error::InvalidField("slice shorter than the extents"));
        }
        self.flush_cache_checked()?;
        let dims: Vec<usize> = self.dims.to_vec();
        let store = self.store.borrow();
        let mut field = FieldMut::new(data, &dims)?;
        let counts = self.block_counts();
        let wpb = self.words_per_block();
        let mut block = [T::default(); codec::MAX_BLOCK];
        for b in 0..self.total_blocks() {
            let mut reader =
                BitReader::new(MemWordReader::new(&store.words[b * wpb..(b + 1) * wpb]));
            codec::decode_block(&self.config, D, &mut block[..self.cells()], &mut reader)?;
            field.scatter(split_linear(b, counts), &block[..self.cells()]);
        }
        Ok(())
    }

    // compressed storage

    /// The compressed buffer, after flushing pending writes. The borrow
    /// must be dropped before the next mutating operation.
    pub fn compressed_data(&self) -> Ref<'_, [StreamWord]> {
        self.flush_cache();
        Ref::map(self.store.borrow(), |s| s.words.as_slice())
    }

    /// The compressed buffer serialized in on-disk byte order, after
    /// flushing pending writes.
    pub fn compressed_bytes(&self) -> Vec<u8> {
        self.flush_cache();
        crate::utils::words_to_le_bytes(&self.store.borrow().words)
    }

    /// Size of the compressed buffer in bytes; flushes pending writes.
    pub fn compressed_size(&self) -> usize {
        self.flush_cache();
        self.store.borrow().words.len() * (STREAM_WORD_BITS / 8)
    }

    /// Adopt an externally produced compressed buffer of the same geometry.
    /// Cached blocks are discarded without write-back: they describe the
    /// previous contents.
    pub fn set_compressed_data(&self, words: &[StreamWord]) -> Result<()> {
        let mut store = self.store.borrow_mut();
        if words.len() != store.words.len() {
            return Err(Error::Capacity {
                required: store.words.len(),
                actual: words.len(),
            });
        }
        store.words.copy_from_slice(words);
        store.cache.reset();
        Ok(())
    }

    // cache management

    /// Capacity of the block cache in bytes.
    pub fn cache_size(&self) -> usize {
        self.store.borrow().cache.capacity_bytes()
    }

    /// Flush, then resize the cache to at least `bytes` (0 restores the
    /// default). On allocation failure the previous cache stays intact.
    pub fn set_cache_size(&self, bytes: usize) -> Result<()> {
        self.flush_cache_checked()?;
        let new_cache = Cache::new(Self::cache_blocks_for(self.dims, bytes), self.cells())?;
        self.store.borrow_mut().cache = new_cache;
        Ok(())
    }

    /// Write every dirty cached block back to the compressed buffer.
    pub fn flush_cache(&self) {
        expect_store(self.flush_cache_checked());
    }

    fn flush_cache_checked(&self) -> Result<()> {
        self.store
            .borrow_mut()
            .flush(&self.config, D, self.words_per_block())
    }

    /// Discard cached blocks, dirty ones included, without writing back.
    pub fn clear_cache(&self) {
        self.store.borrow_mut().cache.reset();
    }

    // destructive reconfiguration

    /// Change the rate. Destructive: contents are reset to zero. Returns
    /// the rate actually in effect.
    pub fn set_rate(&mut self, rate: f64) -> Result<f64> {
        if !(rate > 0.0) || !rate.is_finite() {
            return Err(Error::InvalidConfig("rate must be positive"));
        }
        let mut config = self.config.clone();
        let effective = config.set_rate(rate, D);
        let wpb = config.block_bits() as usize / STREAM_WORD_BITS;
        let len = self.total_blocks() * wpb;
        let mut words = Vec::new();
        words.try_reserve_exact(len).map_err(|_| Error::Alloc)?;
        words.resize(len, 0);
        self.config = config;
        let mut store = self.store.borrow_mut();
        store.words = words;
        store.cache.reset();
        Ok(effective)
    }

    /// Change the extents. Destructive when the block geometry changes:
    /// contents are reset to zero (always, when `clear` is set). On
    /// allocation failure the array is left unchanged.
    pub fn resize(&mut self, dims: [usize; D], clear: bool) -> Result<()> {
        if dims.iter().any(|&n| n == 0) {
            return Err(Error::InvalidField("zero-sized dimension"));
        }
        if dims == self.dims && !clear {
            return Ok(());
        }
        let blocks: usize = dims.iter().map(|n| n.div_ceil(BLOCK_EDGE)).product();
        let len = blocks * self.words_per_block();
        let mut words = Vec::new();
        words.try_reserve_exact(len).map_err(|_| Error::Alloc)?;
        words.resize(len, 0);
        let cache = Cache::new(Self::cache_blocks_for(dims, 0), self.cells())?;
        self.dims = dims;
        let mut store = self.store.borrow_mut();
        store.words = words;
        store.cache = cache;
        Ok(())
    }
}

/// Block coordinates (padded to four axes) of the `b`-th block.
fn split_linear<const D: usize>(mut b: usize, counts: [usize; D]) -> [usize; MAX_DIMS] {
    let mut bc = [0usize; MAX_DIMS];
    for axis in 0..D {
        bc[axis] = b % counts[axis];
        b /= counts[axis];
    }
    bc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_array_reads_zero() {
        let array = Array2::<f32>::new([9, 5], 8.0).unwrap();
        assert_eq!(array.len(), 45);
        assert_eq!(array.get([8, 4]), 0.0);
    }

    #[test]
    fn compressed_size_matches_fixed_rate_layout() {
        let array = Array3::<f64>::new([65, 65, 65], 4.0).unwrap();
        let blocks = 17 * 17 * 17;
        let bits_per_block = (4.0 * 64.0) as usize;
        assert_eq!(array.compressed_size(), blocks * bits_per_block / 8);
        assert!(array.rate() >= 4.0);
    }

    #[test]
    fn writes_survive_flush_within_rate_error() {
        let array = Array2::<f64>::new([10, 10], 16.0).unwrap();
        array.set([3, 7], 0.625);
        assert_eq!(array.get([3, 7]), 0.625);
        array.flush_cache();
        array.clear_cache();
        assert!((array.get([3, 7]) - 0.625).abs() < 1e-2);
    }

    #[test]
    fn clear_cache_discards_dirty_blocks() {
        let array = Array1::<f32>::new([16], 16.0).unwrap();
        array.set([2], 9.0);
        array.clear_cache();
        assert_eq!(array.get([2]), 0.0);
    }

    #[test]
    fn set_rate_is_destructive_and_quantized() {
        let mut array = Array2::<f32>::new([8, 8], 4.0).unwrap();
        array.set([1, 1], 3.0);
        let effective = array.set_rate(9.1).unwrap();
        assert!(effective >= 9.1);
        assert_eq!(array.get([1, 1]), 0.0);
    }

    #[test]
    fn resize_keeps_previous_state_on_bad_input() {
        let mut array = Array2::<f32>::new([8, 8], 8.0).unwrap();
        assert!(array.resize([0, 4], true).is_err());
        assert_eq!(array.extents(), [8, 8]);
    }

    #[test]
    fn bulk_roundtrip() {
        let data: Vec<f32> = (0..45).map(|i| (i as f32 * 0.21).sin()).collect();
        let array = Array2::<f32>::with_contents([9, 5], 16.0, &data).unwrap();
        let mut out = vec![0.0f32; 45];
        array.copy_to(&mut out).unwrap();
        for (a, b) in out.iter().zip(&data) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn out_of_bounds_get_panics() {
        let array = Array1::<f32>::new([4], 8.0).unwrap();
        array.get([4]);
    }
}
