/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Harnesses called by the fuzz targets in `fuzz/fuzz_targets`.

use arbitrary::Arbitrary;

use crate::impls::{BitReader, BitWriter, MemWordReader, MemWordWriterVec};
use crate::traits::{BitRead, BitWrite};

/// One operation against the bit-stream writer.
#[derive(Arbitrary, Debug, Clone)]
pub enum StreamOp {
    WriteBits { value: u64, n_bits: u8 },
    Pad { n_bits: u8 },
    Align,
}

/// Replay `ops` against a writer, then read every written chunk back and
/// check it.
pub fn stream_roundtrip(ops: Vec<StreamOp>) {
    let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
    let mut expected: Vec<(u64, usize)> = Vec::new();
    for op in &ops {
        match op {
            StreamOp::WriteBits { value, n_bits } => {
                let n = (*n_bits % 65) as usize;
                let value = if n == 64 {
                    *value
                } else {
                    *value & ((1u64 << n) - 1)
                };
                writer.write_bits(value, n).unwrap();
                expected.push((value, n));
            }
            StreamOp::Pad { n_bits } => {
                let n = (*n_bits % 65) as usize;
                writer.pad(n).unwrap();
                expected.push((0, n));
            }
            StreamOp::Align => {
                let zeros = writer.align().unwrap();
                expected.push((0, zeros));
            }
        }
    }
    writer.flush().unwrap();
    let words = writer.into_inner().unwrap().into_inner();

    let mut reader = BitReader::new(MemWordReader::new(words));
    for (value, n) in expected {
        assert_eq!(reader.read_bits(n).unwrap(), value);
    }
}
