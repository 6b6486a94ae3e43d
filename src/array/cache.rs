/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Write-back cache of decoded blocks.
//!
//! A direct-mapped table keyed by block index modulo the (power-of-two)
//! number of lines. The invariant the array layer relies on: at most one
//! live cached copy of any block, all writes go through the cache, and a
//! dirty line is re-encoded into the compressed buffer before its slot is
//! reused.

use crate::error::{Error, Result};
use crate::traits::Scalar;

pub(super) struct Line<T> {
    /// Block index held by this line, if any.
    pub tag: Option<usize>,
    /// The decoded block differs from its encoded form.
    pub dirty: bool,
    /// A full padded block of scalars.
    pub data: Box<[T]>,
}

pub(super) struct Cache<T> {
    pub lines: Box<[Line<T>]>,
    pub mask: usize,
    cells: usize,
}

impl<T: Scalar> Cache<T> {
    /// A cache with at least `min_blocks` lines of `cells` scalars each.
    /// Allocation failure is reported, not aborted on.
    pub fn new(min_blocks: usize, cells: usize) -> Result<Self> {
        let count = min_blocks.max(1).next_power_of_two();
        let mut lines = Vec::new();
        lines.try_reserve_exact(count).map_err(|_| Error::Alloc)?;
        for _ in 0..count {
            let mut data = Vec::new();
            data.try_reserve_exact(cells).map_err(|_| Error::Alloc)?;
            data.resize(cells, T::default());
            lines.push(Line {
                tag: None,
                dirty: false,
                data: data.into_boxed_slice(),
            });
        }
        Ok(Self {
            lines: lines.into_boxed_slice(),
            mask: count - 1,
            cells,
        })
    }

    pub fn capacity_bytes(&self) -> usize {
        self.lines.len() * self.cells * core::mem::size_of::<T>()
    }

    /// Drop every line without writing anything back.
    pub fn reset(&mut self) {
        for line in self.lines.iter_mut() {
            line.tag = None;
            line.dirty = false;
        }
    }
}
