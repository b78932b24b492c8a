// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#[cfg(test)]
pub mod test;

/// Largest multiple of `align` that is `<= v`.
#[inline]
pub fn align_down(v: usize, align: usize) -> usize {
    v / align * align
}

/// Smallest multiple of `align` that is `>= v`.
#[inline]
pub fn align_up(v: usize, align: usize) -> usize {
    v.div_ceil(align) * align
}
