/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::Scalar;

use super::{CompressedArray, Pointer};

/// A proxy reference to one cell of a [`CompressedArray`].
///
/// The decoded scalar exists only while its block is cached, so a reference
/// never holds an address: it carries the array and a flat index and goes
/// back through the cache on every access. It is a small `Copy` value and
/// stays valid across evictions.
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a, T: Scalar, const D: usize> {
    array: &'a CompressedArray<T, D>,
    index: usize,
}

impl<'a, T: Scalar, const D: usize> Reference<'a, T, D> {
    pub(super) fn new(array: &'a CompressedArray<T, D>, index: usize) -> Self {
        Self { array, index }
    }

    /// Read the referenced cell.
    pub fn get(&self) -> T {
        self.array.get_flat(self.index)
    }

    /// Write the referenced cell through the array's cache.
    pub fn set(&self, value: T) {
        self.array.set_flat(self.index, value);
    }

    /// Assignment between references: a read from `other`, then a write.
    pub fn assign_from(&self, other: &Reference<'_, T, D>) {
        self.set(other.get());
    }

    /// Flat row-major index of the referenced cell.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Multi-dimensional coordinates of the referenced cell.
    pub fn coords(&self) -> [usize; D] {
        self.array.coords_of(self.index)
    }

    /// The array this reference borrows from.
    pub fn array(&self) -> &'a CompressedArray<T, D> {
        self.array
    }

    /// A pointer to the same cell.
    pub fn ptr(&self) -> Pointer<'a, T, D> {
        Pointer::new(self.array, self.index as isize)
    }
}
