// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Strided in-place 8-point DCT-II / DCT-III with the JPEG Annex A 1-D
//! scaling (alpha(0) = 1/(2*sqrt(2)), alpha(u>0) = 1/2). Applying the
//! forward transform along rows and then columns of an 8x8 block yields
//! exactly the 2-D DCT used by JPEG, so quantization tables keep their
//! standard magnitudes.
//!
//! Contract: `dct8_inverse(dct8_forward(x)) == x` up to f32 rounding,
//! and a constant input produces a DC-only spectrum.

use std::f32::consts::FRAC_1_SQRT_2;

pub const DCT_DIM: usize = 8;

// cos(k * pi / 16) for k in 0..=8.
const COS_PI_16: [f32; 9] = [
    1.0,
    0.980_785_25,
    0.923_879_5,
    0.831_469_6,
    FRAC_1_SQRT_2,
    0.555_570_2,
    0.382_683_43,
    0.195_090_32,
    0.0,
];

const fn cos16(k: usize) -> f32 {
    let mut m = k % 32;
    if m > 16 {
        m = 32 - m;
    }
    if m <= 8 {
        COS_PI_16[m]
    } else {
        -COS_PI_16[16 - m]
    }
}

// BASIS[u][x] = alpha(u) * cos((2x + 1) * u * pi / 16). The matrix is
// orthonormal, so the inverse transform is its transpose.
const fn build_basis() -> [[f32; DCT_DIM]; DCT_DIM] {
    let mut basis = [[0.0; DCT_DIM]; DCT_DIM];
    let mut u = 0;
    while u < DCT_DIM {
        let alpha = if u == 0 { 0.5 * FRAC_1_SQRT_2 } else { 0.5 };
        let mut x = 0;
        while x < DCT_DIM {
            basis[u][x] = alpha * cos16((2 * x + 1) * u);
            x += 1;
        }
        u += 1;
    }
    basis
}

const BASIS: [[f32; DCT_DIM]; DCT_DIM] = build_basis();

/// Forward 8-point DCT over `data[offset + i * stride]` for `i` in `0..8`,
/// in place.
#[inline]
pub fn dct8_forward(data: &mut [f32], offset: usize, stride: usize) {
    let mut line = [0.0f32; DCT_DIM];
    for (x, v) in line.iter_mut().enumerate() {
        *v = data[offset + x * stride];
    }
    for (u, row) in BASIS.iter().enumerate() {
        let mut sum = 0.0f32;
        for (x, &b) in row.iter().enumerate() {
            sum = b.mul_add(line[x], sum);
        }
        data[offset + u * stride] = sum;
    }
}

/// Inverse 8-point DCT over `data[offset + i * stride]` for `i` in `0..8`,
/// in place. Exact inverse of [`dct8_forward`] up to f32 rounding.
#[inline]
pub fn dct8_inverse(data: &mut [f32], offset: usize, stride: usize) {
    let mut line = [0.0f32; DCT_DIM];
    for (u, v) in line.iter_mut().enumerate() {
        *v = data[offset + u * stride];
    }
    for x in 0..DCT_DIM {
        let mut sum = 0.0f32;
        for (u, row) in BASIS.iter().enumerate() {
            sum = row[x].mul_add(line[u], sum);
        }
        data[offset + x * stride] = sum;
    }
}
