// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Direct-formula f64 reference transforms, used only to validate the
//! fast path in tests.

#![allow(dead_code)]

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::dct::DCT_DIM;

#[inline(always)]
fn alpha(u: usize) -> f64 {
    if u == 0 { FRAC_1_SQRT_2 } else { 1.0 }
}

pub fn dct8_slow(input: &[f64; DCT_DIM]) -> [f64; DCT_DIM] {
    let mut output = [0.0; DCT_DIM];
    for (u, out) in output.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (x, &v) in input.iter().enumerate() {
            sum += v * ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos();
        }
        *out = 0.5 * alpha(u) * sum;
    }
    output
}

pub fn idct8_slow(input: &[f64; DCT_DIM]) -> [f64; DCT_DIM] {
    let mut output = [0.0; DCT_DIM];
    for (x, out) in output.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (u, &v) in input.iter().enumerate() {
            sum += 0.5 * alpha(u) * v * ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos();
        }
        *out = sum;
    }
    output
}
