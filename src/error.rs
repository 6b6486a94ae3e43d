/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Crate-level error type.
//!
//! Stream backends have their own lightweight error types (see
//! [`WordError`](crate::traits::WordError)); everything that can fail at the
//! codec or array level is reported through [`Error`].

use thiserror::Error;

/// Error variants for codec and array operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Parameters outside their invariants, or an incompatible
    /// (mode, dimension, scalar type) combination.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// A field whose dimensions or strides do not describe a valid view
    /// of the borrowed slice.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// The caller-provided buffer is smaller than the conservative upper
    /// bound on the compressed size; nothing was written.
    #[error("destination holds {actual} words but {required} are required")]
    Capacity { required: usize, actual: usize },

    /// Ran off the end of a bounded word stream.
    #[error("word stream ended at position {word_pos}")]
    StreamEof { word_pos: usize },

    /// The allocator refused a cache or buffer resize; the previous state
    /// is left intact.
    #[error("allocation failed")]
    Alloc,
}

/// A specialized `Result` for codec and array operations.
pub type Result<T> = core::result::Result<T, Error>;

impl From<core::convert::Infallible> for Error {
    fn from(e: core::convert::Infallible) -> Self {
        match e {}
    }
}

impl From<crate::traits::WordError> for Error {
    fn from(e: crate::traits::WordError) -> Self {
        match e {
            crate::traits::WordError::UnexpectedEof { word_pos } => Error::StreamEof { word_pos },
        }
    }
}
