/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Views of uncompressed arrays.
//!
//! A [`Field`] borrows caller-owned memory and describes its shape: up to
//! four extents and per-axis strides measured in scalar elements. Strides may
//! be negative (a reversed axis) or larger than the extent (interleaved or
//! permuted layouts); `origin` locates element (0, 0, 0, 0) inside the
//! borrowed slice. The default layout is contiguous row-major with x fastest.
//!
//! Fields also gather and scatter the 4^d tiles the block codec works on.
//! A partial tile at an array boundary is padded to full size by a cascade
//! along the axes: within each length-4 lane holding `n` valid samples,
//! position 1 fills from 0, position 2 from 0, and position 3 from 1. The
//! cascade runs along x for every valid line, then along y, then z, then w,
//! so a given shape always pads the same way and streams over non-multiple
//! of-4 extents are reproducible.

use crate::codec::{block_size, BLOCK_EDGE, MAX_DIMS};
use crate::error::{Error, Result};
use crate::traits::Scalar;

/// Shape, strides, and origin shared by [`Field`] and [`FieldMut`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    dims: [usize; MAX_DIMS],
    strides: [isize; MAX_DIMS],
    origin: usize,
    dimensionality: usize,
}

impl Layout {
    fn contiguous(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() || dims.len() > MAX_DIMS {
            return Err(Error::InvalidField("between one and four dimensions"));
        }
        if dims.iter().any(|&n| n == 0) {
            return Err(Error::InvalidField("zero-sized dimension"));
        }
        let mut d = [0usize; MAX_DIMS];
        let mut s = [0isize; MAX_DIMS];
        let mut stride = 1isize;
        for (axis, &n) in dims.iter().enumerate() {
            d[axis] = n;
            s[axis] = stride;
            stride *= n as isize;
        }
        Ok(Self {
            dims: d,
            strides: s,
            origin: 0,
            dimensionality: dims.len(),
        })
    }

    fn strided(dims: &[usize], strides: &[isize], origin: usize) -> Result<Self> {
        if dims.is_empty() || dims.len() > MAX_DIMS || strides.len() != dims.len() {
            return Err(Error::InvalidField("between one and four dimensions"));
        }
        if dims.iter().any(|&n| n == 0) {
            return Err(Error::InvalidField("zero-sized dimension"));
        }
        let mut d = [0usize; MAX_DIMS];
        let mut s = [0isize; MAX_DIMS];
        d[..dims.len()].copy_from_slice(dims);
        s[..dims.len()].copy_from_slice(strides);
        Ok(Self {
            dims: d,
            strides: s,
            origin,
            dimensionality: dims.len(),
        })
    }

    /// Smallest and largest offset the view can reach.
    fn offset_range(&self) -> (isize, isize) {
        let mut lo = self.origin as isize;
        let mut hi = self.origin as isize;
        for axis in 0..self.dimensionality {
            let span = (self.dims[axis] as isize - 1) * self.strides[axis];
            if span >= 0 {
                hi += span;
            } else {
                lo += span;
            }
        }
        (lo, hi)
    }

    fn check_len(&self, len: usize) -> Result<()> {
        let (lo, hi) = self.offset_range();
        if lo < 0 || hi as usize >= len {
            return Err(Error::InvalidField("strides reach outside the slice"));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn offset(&self, coords: [usize; MAX_DIMS]) -> usize {
        let mut off = self.origin as isize;
        for axis in 0..self.dimensionality {
            off += coords[axis] as isize * self.strides[axis];
        }
        off as usize
    }

    pub(crate) fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    pub(crate) fn extent(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    pub(crate) fn num_elements(&self) -> usize {
        self.dims[..self.dimensionality].iter().product()
    }

    /// Number of blocks along each axis (1 for absent axes).
    pub(crate) fn block_counts(&self) -> [usize; MAX_DIMS] {
        let mut counts = [1usize; MAX_DIMS];
        for axis in 0..self.dimensionality {
            counts[axis] = self.dims[axis].div_ceil(BLOCK_EDGE);
        }
        counts
    }

    pub(crate) fn total_blocks(&self) -> usize {
        self.block_counts().iter().product()
    }

    /// Valid extents of the block at block coordinates `bc`.
    fn block_extents(&self, bc: [usize; MAX_DIMS]) -> [usize; MAX_DIMS] {
        let mut e = [1usize; MAX_DIMS];
        for axis in 0..self.dimensionality {
            e[axis] = BLOCK_EDGE.min(self.dims[axis] - BLOCK_EDGE * bc[axis]);
        }
        e
    }
}

/// Pad a length-4 lane holding `n` valid leading samples.
fn pad_lane<T: Copy>(p: &mut [T], base: usize, s: usize, n: usize) {
    match n {
        1 => {
            p[base + s] = p[base];
            p[base + 2 * s] = p[base];
            p[base + 3 * s] = p[base + s];
        }
        2 => {
            p[base + 2 * s] = p[base];
            p[base + 3 * s] = p[base + s];
        }
        3 => {
            p[base + 3 * s] = p[base + s];
        }
        _ => {}
    }
}

/// Run the padding cascade over a gathered block buffer.
fn pad_block<T: Copy>(out: &mut [T], dims: usize, e: [usize; MAX_DIMS]) {
    for axis in 0..dims {
        if e[axis] == BLOCK_EDGE {
            continue;
        }
        let lim = |other: usize| -> usize {
            if other >= dims || other == axis {
                1
            } else if other < axis {
                BLOCK_EDGE
            } else {
                e[other]
            }
        };
        for c3 in 0..lim(3) {
            for c2 in 0..lim(2) {
                for c1 in 0..lim(1) {
                    for c0 in 0..lim(0) {
                        let base = c0 + 4 * c1 + 16 * c2 + 64 * c3;
                        pad_lane(out, base, 1 << (2 * axis), e[axis]);
                    }
                }
            }
        }
    }
}

/// An immutable view of an uncompressed array, the compression source.
#[derive(Debug, Clone)]
pub struct Field<'a, T> {
    data: &'a [T],
    layout: Layout,
}

impl<'a, T: Scalar> Field<'a, T> {
    /// A contiguous row-major view with the given extents, x fastest.
    pub fn new(data: &'a [T], dims: &[usize]) -> Result<Self> {
        let layout = Layout::contiguous(dims)?;
        if layout.num_elements() > data.len() {
            return Err(Error::InvalidField("slice shorter than the extents"));
        }
        Ok(Self { data, layout })
    }

    /// A strided view. `strides` are in scalar elements and may be negative;
    /// `origin` is the index of element (0, 0, 0, 0) in `data`.
    pub fn with_strides(
        data: &'a [T],
        dims: &[usize],
        strides: &[isize],
        origin: usize,
    ) -> Result<Self> {
        let layout = Layout::strided(dims, strides, origin)?;
        layout.check_len(data.len())?;
        Ok(Self { data, layout })
    }

    pub fn dimensionality(&self) -> usize {
        self.layout.dimensionality()
    }

    /// Extent along `axis`, zero if the axis is absent.
    pub fn extent(&self, axis: usize) -> usize {
        if axis < self.layout.dimensionality() {
            self.layout.extent(axis)
        } else {
            0
        }
    }

    pub fn num_elements(&self) -> usize {
        self.layout.num_elements()
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Fill `out` (of block size) from the block at block coordinates `bc`,
    /// padding partial tiles.
    pub(crate) fn gather(&self, bc: [usize; MAX_DIMS], out: &mut [T]) {
        let dims = self.layout.dimensionality();
        debug_assert_eq!(out.len(), block_size(dims));
        let e = self.layout.block_extents(bc);
        let lim = |axis: usize| if axis < dims { e[axis] } else { 1 };
        for c3 in 0..lim(3) {
            for c2 in 0..lim(2) {
                for c1 in 0..lim(1) {
                    for c0 in 0..lim(0) {
                        let coords = [
                            BLOCK_EDGE * bc[0] + c0,
                            BLOCK_EDGE * bc[1] + c1,
                            BLOCK_EDGE * bc[2] + c2,
                            BLOCK_EDGE * bc[3] + c3,
                        ];
                        out[c0 + 4 * c1 + 16 * c2 + 64 * c3] =
                            self.data[self.layout.offset(coords)];
                    }
                }
            }
        }
        pad_block(out, dims, e);
    }
}

/// A mutable view of an uncompressed array, the decompression target.
#[derive(Debug)]
pub struct FieldMut<'a, T> {
    data: &'a mut [T],
    layout: Layout,
}

impl<'a, T: Scalar> FieldMut<'a, T> {
    /// A contiguous row-major view with the given extents, x fastest.
    pub fn new(data: &'a mut [T], dims: &[usize]) -> Result<Self> {
        let layout = Layout::contiguous(dims)?;
        if layout.num_elements() > data.len() {
            return Err(Error::InvalidField("slice shorter than the extents"));
        }
        Ok(Self { data, layout })
    }

    /// A strided view; see [`Field::with_strides`].
    pub fn with_strides(
        data: &'a mut [T],
        dims: &[usize],
        strides: &[isize],
        origin: usize,
    ) -> Result<Self> {
        let layout = Layout::strided(dims, strides, origin)?;
        layout.check_len(data.len())?;
        Ok(Self { data, layout })
    }

    pub fn dimensionality(&self) -> usize {
        self.layout.dimensionality()
    }

    pub fn extent(&self, axis: usize) -> usize {
        if axis < self.layout.dimensionality() {
            self.layout.extent(axis)
        } else {
            0
        }
    }

    pub fn num_elements(&self) -> usize {
        self.layout.num_elements()
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Write the valid region of a decoded block back to the view; padding
    /// cells of partial tiles are discarded.
    pub(crate) fn scatter(&mut self, bc: [usize; MAX_DIMS], block: &[T]) {
        let dims = self.layout.dimensionality();
        debug_assert_eq!(block.len(), block_size(dims));
        let e = self.layout.block_extents(bc);
        let lim = |axis: usize| if axis < dims { e[axis] } else { 1 };
        for c3 in 0..lim(3) {
            for c2 in 0..lim(2) {
                for c1 in 0..lim(1) {
                    for c0 in 0..lim(0) {
                        let coords = [
                            BLOCK_EDGE * bc[0] + c0,
                            BLOCK_EDGE * bc[1] + c1,
                            BLOCK_EDGE * bc[2] + c2,
                            BLOCK_EDGE * bc[3] + c3,
                        ];
                        self.data[self.layout.offset(coords)] =
                            block[c0 + 4 * c1 + 16 * c2 + 64 * c3];
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_shapes() {
        let data = [0.0f32; 8];
        assert!(Field::new(&data, &[]).is_err());
        assert!(Field::new(&data, &[2, 0]).is_err());
        assert!(Field::new(&data, &[3, 3]).is_err());
        assert!(Field::new(&data, &[2, 2, 2]).is_ok());
    }

    #[test]
    fn rejects_out_of_bounds_strides() {
        let data = [0i32; 16];
        assert!(Field::with_strides(&data, &[4, 4], &[1, 4], 1).is_err());
        assert!(Field::with_strides(&data, &[4, 4], &[-1, 4], 0).is_err());
        assert!(Field::with_strides(&data, &[4, 4], &[-1, 4], 3).is_ok());
    }

    #[test]
    fn gather_contiguous_block() {
        let data: Vec<i32> = (0..16).collect();
        let field = Field::new(&data, &[4, 4]).unwrap();
        let mut out = [0i32; 16];
        field.gather([0, 0, 0, 0], &mut out);
        assert_eq!(out.to_vec(), data);
    }

    #[test]
    fn gather_reversed_axis_matches_reversed_data() {
        let data: Vec<i32> = (0..16).collect();
        let reversed: Vec<i32> = data.iter().rev().copied().collect();
        let view = Field::with_strides(&data, &[16], &[-1], 15).unwrap();
        let plain = Field::new(&reversed, &[16]).unwrap();
        let mut a = [0i32; 4];
        let mut b = [0i32; 4];
        for block in 0..4 {
            view.gather([block, 0, 0, 0], &mut a);
            plain.gather([block, 0, 0, 0], &mut b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn partial_block_pads_by_the_cascade() {
        // one valid line of three samples in a 2-D block
        let data = [10i32, 20, 30];
        let field = Field::new(&data, &[3, 1]).unwrap();
        let mut out = [0i32; 16];
        field.gather([0, 0, 0, 0], &mut out);
        // x cascade on the valid line: p3 = p1
        assert_eq!(&out[0..4], &[10, 20, 30, 20]);
        // y cascade replicates lines: row1 = row0, row2 = row0, row3 = row1
        assert_eq!(&out[4..8], &out[0..4]);
        assert_eq!(&out[8..12], &out[0..4]);
        assert_eq!(&out[12..16], &out[0..4]);
    }

    #[test]
    fn scatter_writes_only_valid_cells() {
        let mut data = [0i32; 6];
        {
            let mut field = FieldMut::new(&mut data, &[3, 2]).unwrap();
            let block: Vec<i32> = (1..=16).collect();
            field.scatter([0, 0, 0, 0], &block);
        }
        assert_eq!(data, [1, 2, 3, 5, 6, 7]);
    }
}
