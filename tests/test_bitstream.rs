/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tessera::prelude::*;

fn mask(n: usize) -> u64 {
    if n == 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

#[test]
fn write_then_read_random_widths() -> Result<()> {
    const N: usize = 100_000;
    let mut r = SmallRng::seed_from_u64(0);
    let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
    let mut chunks = Vec::with_capacity(N);
    for _ in 0..N {
        let n = r.gen_range(0..=64usize);
        let value = r.gen::<u64>() & mask(n);
        writer.write_bits(value, n)?;
        chunks.push((value, n));
    }
    writer.flush()?;
    let words = writer.into_inner()?.into_inner();

    let mut reader = BitReader::new(MemWordReader::new(words));
    for (value, n) in chunks {
        assert_eq!(reader.read_bits(n)?, value);
    }
    Ok(())
}

#[test]
fn single_bits_match_bulk_writes() -> Result<()> {
    let mut r = SmallRng::seed_from_u64(1);
    let bits: Vec<bool> = (0..1000).map(|_| r.gen()).collect();

    let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
    for &bit in &bits {
        writer.write_bit(bit)?;
    }
    writer.flush()?;
    let words = writer.into_inner()?.into_inner();

    let mut reader = BitReader::new(MemWordReader::new(&words));
    for (i, &bit) in bits.iter().enumerate() {
        assert_eq!(reader.read_bit()?, bit, "bit {}", i);
    }
    Ok(())
}

#[test]
fn flush_pads_with_zeros_and_reports_count() -> Result<()> {
    let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
    writer.write_bits(0b101, 3)?;
    assert_eq!(writer.flush()?, 61);
    assert_eq!(writer.flush()?, 0);
    let words = writer.into_inner()?.into_inner();
    assert_eq!(words, vec![0b101]);
    Ok(())
}

#[test]
fn pad_writes_zero_bits() -> Result<()> {
    let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
    writer.write_bits(u64::MAX, 7)?;
    writer.pad(100)?;
    writer.write_bits(1, 1)?;
    writer.flush()?;
    let words = writer.into_inner()?.into_inner();

    let mut reader = BitReader::new(MemWordReader::new(words));
    assert_eq!(reader.read_bits(7)?, 0x7F);
    assert_eq!(reader.read_bits(64)?, 0);
    assert_eq!(reader.read_bits(36)?, 0);
    assert_eq!(reader.read_bit()?, true);
    Ok(())
}

#[test]
fn read_cursor_seeks_independently() -> Result<()> {
    let mut r = SmallRng::seed_from_u64(2);
    let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
    let values: Vec<u64> = (0..512).map(|_| r.gen::<u64>() & mask(17)).collect();
    for &v in &values {
        writer.write_bits(v, 17)?;
    }
    writer.flush()?;
    let words = writer.into_inner()?.into_inner();

    let mut reader = BitReader::new(MemWordReader::new(&words));
    let mut probes: Vec<usize> = (0..values.len()).collect();
    // an arbitrary but deterministic shuffle
    for i in (1..probes.len()).rev() {
        probes.swap(i, r.gen_range(0..=i));
    }
    for &i in &probes {
        reader.set_bit_pos(17 * i as u64)?;
        assert_eq!(reader.read_bits(17)?, values[i]);
        assert_eq!(reader.bit_pos()?, 17 * (i as u64 + 1));
    }
    Ok(())
}

#[test]
fn write_cursor_seeks_to_block_boundaries() -> Result<()> {
    // three 64-bit "blocks", written out of order
    let mut words = vec![0u64; 3];
    let mut writer = BitWriter::new(MemWordWriterSlice::new(&mut words));
    writer.set_bit_pos(128)?;
    writer.write_bits(0xCCCC, 64)?;
    writer.set_bit_pos(0)?;
    writer.write_bits(0xAAAA, 64)?;
    writer.set_bit_pos(64)?;
    writer.write_bits(0xBBBB, 64)?;
    writer.flush()?;
    drop(writer);
    assert_eq!(words, vec![0xAAAA, 0xBBBB, 0xCCCC]);
    Ok(())
}

#[test]
fn align_rounds_up_to_the_next_word() -> Result<()> {
    let mut writer = BitWriter::new(MemWordWriterVec::new(Vec::<u64>::new()));
    writer.write_bits(0b11, 2)?;
    assert_eq!(BitWrite::align(&mut writer)?, 62);
    writer.write_bits(0b1, 1)?;
    writer.flush()?;
    let words = writer.into_inner()?.into_inner();
    assert_eq!(words, vec![0b11, 0b1]);

    let mut reader = BitReader::new(MemWordReader::new(words));
    assert_eq!(reader.read_bits(2)?, 0b11);
    assert_eq!(BitRead::align(&mut reader)?, 62);
    assert_eq!(reader.read_bit()?, true);
    Ok(())
}

#[test]
fn truncated_stream_reads_zeros() -> Result<()> {
    let words = vec![u64::MAX; 2];
    let mut reader = BitReader::new(MemWordReader::new(&words[..1]));
    assert_eq!(reader.read_bits(64)?, u64::MAX);
    assert_eq!(reader.read_bits(64)?, 0);
    assert_eq!(reader.read_bits(33)?, 0);
    Ok(())
}

#[test]
fn words_serialize_little_endian() {
    let words: Vec<StreamWord> = vec![1 as StreamWord];
    let bytes = words_to_le_bytes(&words);
    assert_eq!(bytes[0], 1);
    assert!(bytes[1..].iter().all(|&b| b == 0));
    assert_eq!(words_from_le_bytes(&bytes), words);
}
