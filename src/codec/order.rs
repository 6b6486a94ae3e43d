/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Coefficient traversal orders.
//!
//! After the transform, the 4^d coefficients are visited in order of
//! increasing total degree (the sum of the per-axis frequency indices), which
//! concentrates significance toward the front of the embedded code. The 1-,
//! 2-, and 3-dimensional tables are fixed; the 256-entry 4-dimensional order
//! is generated once on first use with the same total-degree rule.

use std::sync::OnceLock;

/// `PERM_D[j]` is the block-buffer index (x fastest) of the `j`-th
/// coefficient in coding order.
static PERM_1: [u8; 4] = [0, 1, 2, 3];

static PERM_2: [u8; 16] = [
    0,  /* (0, 0) : 0 */
    1,  /* (1, 0) : 1 */
    4,  /* (0, 1) : 1 */
    5,  /* (1, 1) : 2 */
    2,  /* (2, 0) : 2 */
    8,  /* (0, 2) : 2 */
    6,  /* (2, 1) : 3 */
    9,  /* (1, 2) : 3 */
    3,  /* (3, 0) : 3 */
    12, /* (0, 3) : 3 */
    10, /* (2, 2) : 4 */
    7,  /* (3, 1) : 4 */
    13, /* (1, 3) : 4 */
    11, /* (3, 2) : 5 */
    14, /* (2, 3) : 5 */
    15, /* (3, 3) : 6 */
];

static PERM_3: [u8; 64] = [
    0,  /* (0, 0, 0) : 0 */
    1,  /* (1, 0, 0) : 1 */
    4,  /* (0, 1, 0) : 1 */
    16, /* (0, 0, 1) : 1 */
    20, /* (0, 1, 1) : 2 */
    17, /* (1, 0, 1) : 2 */
    5,  /* (1, 1, 0) : 2 */
    2,  /* (2, 0, 0) : 2 */
    8,  /* (0, 2, 0) : 2 */
    32, /* (0, 0, 2) : 2 */
    21, /* (1, 1, 1) : 3 */
    6,  /* (2, 1, 0) : 3 */
    18, /* (2, 0, 1) : 3 */
    24, /* (0, 2, 1) : 3 */
    9,  /* (1, 2, 0) : 3 */
    33, /* (1, 0, 2) : 3 */
    36, /* (0, 1, 2) : 3 */
    3,  /* (3, 0, 0) : 3 */
    12, /* (0, 3, 0) : 3 */
    48, /* (0, 0, 3) : 3 */
    22, /* (2, 1, 1) : 4 */
    25, /* (1, 2, 1) : 4 */
    37, /* (1, 1, 2) : 4 */
    40, /* (0, 2, 2) : 4 */
    34, /* (2, 0, 2) : 4 */
    10, /* (2, 2, 0) : 4 */
    7,  /* (3, 1, 0) : 4 */
    19, /* (3, 0, 1) : 4 */
    28, /* (0, 3, 1) : 4 */
    13, /* (1, 3, 0) : 4 */
    49, /* (1, 0, 3) : 4 */
    52, /* (0, 1, 3) : 4 */
    41, /* (1, 2, 2) : 5 */
    38, /* (2, 1, 2) : 5 */
    26, /* (2, 2, 1) : 5 */
    23, /* (3, 1, 1) : 5 */
    29, /* (1, 3, 1) : 5 */
    53, /* (1, 1, 3) : 5 */
    11, /* (3, 2, 0) : 5 */
    35, /* (3, 0, 2) : 5 */
    44, /* (0, 3, 2) : 5 */
    14, /* (2, 3, 0) : 5 */
    50, /* (2, 0, 3) : 5 */
    56, /* (0, 2, 3) : 5 */
    42, /* (2, 2, 2) : 6 */
    27, /* (3, 2, 1) : 6 */
    39, /* (3, 1, 2) : 6 */
    45, /* (1, 3, 2) : 6 */
    30, /* (2, 3, 1) : 6 */
    54, /* (2, 1, 3) : 6 */
    57, /* (1, 2, 3) : 6 */
    60, /* (0, 3, 3) : 6 */
    51, /* (3, 0, 3) : 6 */
    15, /* (3, 3, 0) : 6 */
    43, /* (3, 2, 2) : 7 */
    46, /* (2, 3, 2) : 7 */
    58, /* (2, 2, 3) : 7 */
    61, /* (1, 3, 3) : 7 */
    55, /* (3, 1, 3) : 7 */
    31, /* (3, 3, 1) : 7 */
    62, /* (2, 3, 3) : 8 */
    59, /* (3, 2, 3) : 8 */
    47, /* (3, 3, 2) : 8 */
    63, /* (3, 3, 3) : 9 */
];

static PERM_4: OnceLock<[u8; 256]> = OnceLock::new();

/// Build the 4-D order: total degree first, then the sum of squared degrees
/// (mixed frequencies before pure ones), then buffer order.
fn perm_4() -> &'static [u8; 256] {
    PERM_4.get_or_init(|| {
        let mut indices: Vec<u8> = (0..=255).collect();
        let key = |&p: &u8| {
            let (i, j, k, l) = (p & 3, (p >> 2) & 3, (p >> 4) & 3, (p >> 6) & 3);
            let degree = i + j + k + l;
            let spread = i * i + j * j + k * k + l * l;
            (degree, spread, p)
        };
        indices.sort_by_key(key);
        let mut table = [0u8; 256];
        table.copy_from_slice(&indices);
        table
    })
}

/// The coding-order permutation for `dims` dimensions.
pub(crate) fn permutation(dims: usize) -> &'static [u8] {
    match dims {
        1 => &PERM_1,
        2 => &PERM_2,
        3 => &PERM_3,
        4 => perm_4(),
        _ => unreachable!("dimensionality out of range"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_is_permutation(table: &[u8]) {
        let mut seen = vec![false; table.len()];
        for &p in table {
            assert!(!seen[p as usize], "duplicate entry {}", p);
            seen[p as usize] = true;
        }
    }

    #[test]
    fn tables_are_permutations() {
        for dims in 1..=4 {
            let table = permutation(dims);
            assert_eq!(table.len(), 1 << (2 * dims));
            assert_is_permutation(table);
        }
    }

    #[test]
    fn total_degree_is_nondecreasing() {
        for dims in 1..=4 {
            let degree = |p: u8| -> u32 {
                (0..dims).map(|a| ((p >> (2 * a)) & 3) as u32).sum()
            };
            let table = permutation(dims);
            for pair in table.windows(2) {
                assert!(degree(pair[0]) <= degree(pair[1]));
            }
        }
    }

    #[test]
    fn low_frequencies_come_first() {
        assert_eq!(permutation(2)[..3], [0, 1, 4]);
        assert_eq!(permutation(3)[..4], [0, 1, 4, 16]);
        assert_eq!(permutation(4)[..5], [0, 1, 4, 16, 64]);
    }
}
