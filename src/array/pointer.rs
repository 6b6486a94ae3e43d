/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::cmp::Ordering;
use core::ops::{Add, AddAssign, Sub, SubAssign};

use crate::traits::Scalar;

use super::{CompressedArray, Reference};

/// A proxy pointer into a [`CompressedArray`]: a [`Reference`] with
/// arithmetic.
///
/// Pointers walk storage in flat row-major order. Like raw pointers they may
/// point one past either end between arithmetic operations; they validate on
/// dereference, not on construction. Two pointers into the same array are
/// ordered by flat index; comparing pointers into different arrays yields
/// `None`/`false`.
#[derive(Debug, Clone, Copy)]
pub struct Pointer<'a, T: Scalar, const D: usize> {
    array: &'a CompressedArray<T, D>,
    index: isize,
}

impl<'a, T: Scalar, const D: usize> Pointer<'a, T, D> {
    pub(super) fn new(array: &'a CompressedArray<T, D>, index: isize) -> Self {
        Self { array, index }
    }

    /// Read the pointed-to cell; panics if the pointer is out of range.
    pub fn get(&self) -> T {
        self.deref().get()
    }

    /// Write the pointed-to cell; panics if the pointer is out of range.
    pub fn set(&self, value: T) {
        self.deref().set(value);
    }

    /// The reference this pointer denotes; panics if out of range.
    pub fn deref(&self) -> Reference<'a, T, D> {
        assert!(
            self.index >= 0 && (self.index as usize) < self.array.len(),
            "pointer at {} is out of range",
            self.index
        );
        Reference::new(self.array, self.index as usize)
    }

    /// The cell `delta` positions away in flat order.
    #[must_use]
    pub fn offset(&self, delta: isize) -> Self {
        Self {
            array: self.array,
            index: self.index + delta,
        }
    }

    /// `distance(p, q)` is `flat(q) - flat(p)`; panics on pointers into
    /// different arrays.
    pub fn distance(&self, other: &Pointer<'_, T, D>) -> isize {
        assert!(
            self.same_array(other),
            "distance between pointers into different arrays"
        );
        other.index - self.index
    }

    /// Flat index, which may be out of range for a past-the-end pointer.
    pub fn index(&self) -> isize {
        self.index
    }

    fn same_array(&self, other: &Pointer<'_, T, D>) -> bool {
        core::ptr::eq(self.array, other.array)
    }
}

impl<T: Scalar, const D: usize> PartialEq for Pointer<'_, T, D> {
    fn eq(&self, other: &Self) -> bool {
        self.same_array(other) && self.index == other.index
    }
}

impl<T: Scalar, const D: usize> PartialOrd for Pointer<'_, T, D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.same_array(other) {
            self.index.partial_cmp(&other.index)
        } else {
            None
        }
    }
}

impl<'a, T: Scalar, const D: usize> Add<isize> for Pointer<'a, T, D> {
    type Output = Pointer<'a, T, D>;

    fn add(self, delta: isize) -> Self::Output {
        self.offset(delta)
    }
}

impl<'a, T: Scalar, const D: usize> Sub<isize> for Pointer<'a, T, D> {
    type Output = Pointer<'a, T, D>;

    fn sub(self, delta: isize) -> Self::Output {
        self.offset(-delta)
    }
}

impl<T: Scalar, const D: usize> Sub for Pointer<'_, T, D> {
    type Output = isize;

    /// `p - q` is `flat(p) - flat(q)`.
    fn sub(self, other: Self) -> isize {
        other.distance(&self)
    }
}

impl<T: Scalar, const D: usize> AddAssign<isize> for Pointer<'_, T, D> {
    fn add_assign(&mut self, delta: isize) {
        self.index += delta;
    }
}

impl<T: Scalar, const D: usize> SubAssign<isize> for Pointer<'_, T, D> {
    fn sub_assign(&mut self, delta: isize) {
        self.index -= delta;
    }
}
