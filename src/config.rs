/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Codec parameters and the compression-mode policy.
//!
//! User intent (a rate, a precision, an accuracy, losslessness, or raw
//! expert knobs) is translated into the four numeric parameters the block
//! coder budgets with: `minbits`, `maxbits`, `maxprec`, and `minexp`. Each
//! setter returns the parameter actually in effect, which may differ from the
//! requested one because rates are quantized to the achievable granularity
//! (a word multiple of bits per block) and tolerances to powers of two.

use crate::error::{Error, Result};
use crate::{codec, STREAM_WORD_BITS};

/// Upper bound on coefficient precision.
pub const MAX_PREC: u32 = 64;

/// Smallest block exponent any supported scalar type can produce.
pub const MIN_EXP: i32 = -1074;

/// A `maxbits` value no block can reach: the bound for a 4^4 block of
/// 64-bit scalars (header plus 64 planes of group flags and value bits).
pub const MAX_BITS: u32 = 1 + 11 + 64 * (256 + 64);

/// How the driver executes the block loop.
///
/// The policy never changes the bits a fixed-rate stream contains; it only
/// changes who produces them. Policies other than [`Execution::Serial`]
/// require fixed-rate mode, where block offsets are known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// One thread walks blocks in order.
    #[default]
    Serial,
    /// Blocks are partitioned among threads, each writing its own
    /// word-aligned range. Falls back to serial outside fixed-rate mode.
    Threaded,
    /// Hand off to an accelerator. The core carries no device code: in
    /// fixed-rate mode the call runs the (bit-identical) serial path, in any
    /// other mode it returns zero and leaves the stream untouched.
    Offload,
}

/// The four budgeting policies, reconstructed from the knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    FixedRate,
    FixedPrecision,
    FixedAccuracy,
    Reversible,
    Expert,
}

/// Compression parameters: the three bit budgets, the accuracy floor, and
/// the execution policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Lower bound on encoded bits per block.
    minbits: u32,
    /// Upper bound on encoded bits per block.
    maxbits: u32,
    /// Upper bound on bit planes retained per coefficient.
    maxprec: u32,
    /// Smallest block exponent that is still encoded.
    minexp: i32,
    reversible: bool,
    exec: Execution,
}

impl Default for Config {
    /// Near-lossless defaults: no truncation beyond the scalar's own
    /// precision, serial execution.
    fn default() -> Self {
        Self {
            minbits: 1,
            maxbits: MAX_BITS,
            maxprec: MAX_PREC,
            minexp: MIN_EXP,
            reversible: false,
            exec: Execution::Serial,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration in fixed-rate mode; see [`Config::set_rate`].
    pub fn fixed_rate(rate: f64, dims: usize) -> Self {
        let mut config = Self::default();
        config.set_rate(rate, dims);
        config
    }

    /// A configuration in fixed-precision mode; see [`Config::set_precision`].
    pub fn fixed_precision(precision: u32) -> Self {
        let mut config = Self::default();
        config.set_precision(precision);
        config
    }

    /// A configuration in fixed-accuracy mode; see [`Config::set_accuracy`].
    pub fn fixed_accuracy(tolerance: f64) -> Result<Self> {
        let mut config = Self::default();
        config.set_accuracy(tolerance)?;
        Ok(config)
    }

    /// A configuration in reversible mode.
    pub fn reversible() -> Self {
        let mut config = Self::default();
        config.set_reversible();
        config
    }

    /// Select fixed-rate mode: every block of dimensionality `dims` consumes
    /// exactly the same number of bits, rounded up to a stream-word multiple
    /// so that block `b` starts at a known offset. Returns the rate actually
    /// achieved, in bits per value.
    pub fn set_rate(&mut self, rate: f64, dims: usize) -> f64 {
        let n = codec::block_size(dims) as u32;
        let word = STREAM_WORD_BITS as u32;
        let wanted = ((rate * n as f64).round() as u32).max(1);
        let bits = wanted.div_ceil(word) * word;
        self.minbits = bits;
        self.maxbits = bits;
        self.maxprec = MAX_PREC;
        self.minexp = MIN_EXP;
        self.reversible = false;
        bits as f64 / n as f64
    }

    /// Select fixed-precision mode: at most `precision` bit planes are kept
    /// per coefficient, with no bound on block size. Returns the precision
    /// actually in effect.
    pub fn set_precision(&mut self, precision: u32) -> u32 {
        let precision = precision.clamp(1, MAX_PREC);
        self.minbits = 1;
        self.maxbits = MAX_BITS;
        self.maxprec = precision;
        self.minexp = MIN_EXP;
        self.reversible = false;
        precision
    }

    /// Select fixed-accuracy mode: absolute errors stay below `tolerance`.
    /// Only meaningful for floating-point scalars. Returns the tolerance
    /// actually enforced, the largest power of two at most `tolerance`.
    pub fn set_accuracy(&mut self, tolerance: f64) -> Result<f64> {
        if !(tolerance > 0.0) || !tolerance.is_finite() {
            return Err(Error::InvalidConfig("tolerance must be positive"));
        }
        let minexp = (tolerance.log2().floor() as i32).max(MIN_EXP);
        self.minbits = 1;
        self.maxbits = MAX_BITS;
        self.maxprec = MAX_PREC;
        self.minexp = minexp;
        self.reversible = false;
        Ok(2f64.powi(minexp))
    }

    /// Select reversible mode: all planes of the exactly invertible pipeline
    /// are kept, and decompression is bit-for-bit exact.
    pub fn set_reversible(&mut self) {
        self.minbits = 1;
        self.maxbits = MAX_BITS;
        self.maxprec = MAX_PREC;
        self.minexp = MIN_EXP;
        self.reversible = true;
    }

    /// Set all four knobs directly, subject to the invariants
    /// `1 <= minbits <= maxbits`, `1 <= maxprec <= 64`, and
    /// `minexp >= -1074`.
    pub fn set_expert(
        &mut self,
        minbits: u32,
        maxbits: u32,
        maxprec: u32,
        minexp: i32,
    ) -> Result<()> {
        if minbits == 0 || minbits > maxbits {
            return Err(Error::InvalidConfig("minbits must be in 1..=maxbits"));
        }
        if maxprec == 0 || maxprec > MAX_PREC {
            return Err(Error::InvalidConfig("maxprec must be in 1..=64"));
        }
        if minexp < MIN_EXP {
            return Err(Error::InvalidConfig("minexp below the scalar floor"));
        }
        self.minbits = minbits;
        self.maxbits = maxbits;
        self.maxprec = maxprec;
        self.minexp = minexp;
        self.reversible = false;
        Ok(())
    }

    /// The budgeting policy the current knobs describe.
    pub fn mode(&self) -> Mode {
        if self.reversible {
            Mode::Reversible
        } else if self.minbits == self.maxbits {
            Mode::FixedRate
        } else if self.maxprec < MAX_PREC {
            Mode::FixedPrecision
        } else if self.minexp > MIN_EXP {
            Mode::FixedAccuracy
        } else {
            Mode::Expert
        }
    }

    pub fn set_execution(&mut self, exec: Execution) {
        self.exec = exec;
    }

    pub fn execution(&self) -> Execution {
        self.exec
    }

    pub fn minbits(&self) -> u32 {
        self.minbits
    }

    pub fn maxbits(&self) -> u32 {
        self.maxbits
    }

    pub fn maxprec(&self) -> u32 {
        self.maxprec
    }

    pub fn minexp(&self) -> i32 {
        self.minexp
    }

    pub fn is_reversible(&self) -> bool {
        self.reversible
    }

    /// In fixed-rate mode, the exact number of bits per block.
    pub(crate) fn block_bits(&self) -> u32 {
        debug_assert_eq!(self.minbits, self.maxbits);
        self.maxbits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_quantized_to_word_multiples() {
        let mut config = Config::default();
        let effective = config.set_rate(7.3, 3);
        let bits = config.minbits();
        assert_eq!(bits % STREAM_WORD_BITS as u32, 0);
        assert_eq!(config.maxbits(), bits);
        assert!(effective >= 7.3 - 1.0 && effective * 64.0 == bits as f64);
        assert_eq!(config.mode(), Mode::FixedRate);
    }

    #[test]
    fn precision_is_clamped() {
        let mut config = Config::default();
        assert_eq!(config.set_precision(200), MAX_PREC);
        assert_eq!(config.set_precision(0), 1);
        assert_eq!(config.mode(), Mode::FixedPrecision);
    }

    #[test]
    fn accuracy_rounds_down_to_a_power_of_two() {
        let mut config = Config::default();
        let actual = config.set_accuracy(0.3).unwrap();
        assert_eq!(actual, 0.25);
        assert_eq!(config.mode(), Mode::FixedAccuracy);
        assert!(config.set_accuracy(0.0).is_err());
        assert!(config.set_accuracy(-1.0).is_err());
    }

    #[test]
    fn expert_rejects_inverted_budgets() {
        let mut config = Config::default();
        assert!(config.set_expert(100, 10, 32, -100).is_err());
        assert!(config.set_expert(10, 100, 0, -100).is_err());
        assert!(config.set_expert(10, 100, 32, -20000).is_err());
        assert!(config.set_expert(10, 100, 64, MIN_EXP).is_ok());
        assert_eq!(config.mode(), Mode::Expert);
    }

    #[test]
    fn reversible_mode_is_detected() {
        assert_eq!(Config::reversible().mode(), Mode::Reversible);
    }
}
