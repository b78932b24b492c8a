// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Quality-scaled quantization tables per ITU-T T.81 Annex K.

use crate::BLOCK_DIM;

const TABLE_SIZE: usize = BLOCK_DIM * BLOCK_DIM;

// Annex K.1, luminance.
#[rustfmt::skip]
const BASE_LUMA: [u8; TABLE_SIZE] = [
    16,  11,  10,  16,  24,  40,  51,  61,
    12,  12,  14,  19,  26,  58,  60,  55,
    14,  13,  16,  24,  40,  57,  69,  56,
    14,  17,  22,  29,  51,  87,  80,  62,
    18,  22,  37,  56,  68, 109, 103,  77,
    24,  35,  55,  64,  81, 104, 113,  92,
    49,  64,  78,  87, 103, 121, 120, 101,
    72,  92,  95,  98, 112, 100, 103,  99,
];

// Annex K.2, chrominance.
#[rustfmt::skip]
const BASE_CHROMA: [u8; TABLE_SIZE] = [
    17,  18,  24,  47,  99,  99,  99,  99,
    18,  21,  26,  66,  99,  99,  99,  99,
    24,  26,  56,  99,  99,  99,  99,  99,
    47,  66,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
];

/// 8x8 table of quantization steps, row-major. Entries are in [1, 255]
/// and never change after construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantTable {
    entries: [u8; TABLE_SIZE],
}

impl QuantTable {
    #[inline]
    pub fn entry(&self, row: usize, col: usize) -> u8 {
        debug_assert!(row < BLOCK_DIM && col < BLOCK_DIM);
        self.entries[row * BLOCK_DIM + col]
    }

    pub fn entries(&self) -> &[u8; TABLE_SIZE] {
        &self.entries
    }
}

fn scale_table(base: &[u8; TABLE_SIZE], quality: i32) -> QuantTable {
    // Quality is coerced into range, never rejected.
    let q = quality.clamp(1, 99) as u32;
    let scale = if q < 50 { 5000 / q } else { 200 - 2 * q };
    let mut entries = [0u8; TABLE_SIZE];
    for (entry, &base) in entries.iter_mut().zip(base.iter()) {
        *entry = ((base as u32 * scale + 50) / 100).clamp(1, 255) as u8;
    }
    QuantTable { entries }
}

/// Luminance quantization table for `quality`, clamped to [1, 99].
pub fn build_luma_table(quality: i32) -> QuantTable {
    scale_table(&BASE_LUMA, quality)
}

/// Chrominance quantization table for `quality`, clamped to [1, 99].
pub fn build_chroma_table(quality: i32) -> QuantTable {
    scale_table(&BASE_CHROMA, quality)
}
