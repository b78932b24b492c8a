// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Full-range BT.601 RGB <-> YCbCr, as defined by JFIF Clause 7:
//! https://www.itu.int/rec/T-REC-T.871-201105-I/en
//!
//! The f32 functions are the kernel path; precision is only dropped
//! when pixels are written back. The u8 helpers round and saturate per
//! call and are the host-facing equivalents.

#[inline]
pub fn rgb_to_y(r: f32, g: f32, b: f32) -> f32 {
    r.mul_add(0.299, g.mul_add(0.587, b * 0.114))
}

#[inline]
pub fn rgb_to_cb(r: f32, g: f32, b: f32) -> f32 {
    r.mul_add(-0.16874, g.mul_add(-0.33126, b.mul_add(0.5, 128.0)))
}

#[inline]
pub fn rgb_to_cr(r: f32, g: f32, b: f32) -> f32 {
    r.mul_add(0.5, g.mul_add(-0.41869, b.mul_add(-0.08131, 128.0)))
}

#[inline]
pub fn ycbcr_to_rgb(y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
    let cb = cb - 128.0;
    let cr = cr - 128.0;
    let r = cr.mul_add(1.402, y);
    let g = cr.mul_add(-0.71414, cb.mul_add(-0.34414, y));
    let b = cb.mul_add(1.772, y);
    (r, g, b)
}

/// Round to nearest and saturate into the 8-bit pixel range.
#[inline]
pub fn round_to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub fn rgb_to_ycbcr_u8(rgb: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (rgb[0] as f32, rgb[1] as f32, rgb[2] as f32);
    [
        round_to_u8(rgb_to_y(r, g, b)),
        round_to_u8(rgb_to_cb(r, g, b)),
        round_to_u8(rgb_to_cr(r, g, b)),
    ]
}

pub fn ycbcr_to_rgb_u8(ycbcr: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = ycbcr_to_rgb(ycbcr[0] as f32, ycbcr[1] as f32, ycbcr[2] as f32);
    [round_to_u8(r), round_to_u8(g), round_to_u8(b)]
}
