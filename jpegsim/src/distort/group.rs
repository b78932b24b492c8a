// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Pixel groups: the finest unit of chroma-shared pixels. A group holds
//! 1, 2 or 4 luma samples (depending on the subsampling flags) and one
//! shared chroma pair derived from the box average of the group's RGB
//! pixels.

use crate::color;
use crate::image::RgbView;

pub(crate) const fn group_width<const H: bool>() -> usize {
    if H {
        2
    } else {
        1
    }
}

pub(crate) const fn group_height<const V: bool>() -> usize {
    if V {
        2
    } else {
        1
    }
}

/// Transient per-group values, centered at 0 (pixel value minus 128).
/// Only the first `group_width * group_height` luma entries are valid.
pub(crate) struct PixelGroup {
    pub luma: [f32; 4],
    pub cb: f32,
    pub cr: f32,
}

pub(crate) fn gather_group<const H: bool, const V: bool>(
    input: &RgbView,
    anchor: (usize, usize),
) -> PixelGroup {
    let gw = group_width::<H>();
    let gh = group_height::<V>();
    let mut luma = [0.0f32; 4];
    let mut sum = [0u32; 3];
    for sy in 0..gh {
        for sx in 0..gw {
            let px = input.get_clamped(anchor.0 + sx, anchor.1 + sy);
            luma[sy * gw + sx] =
                color::rgb_to_y(px[0] as f32, px[1] as f32, px[2] as f32) - 128.0;
            for (acc, &c) in sum.iter_mut().zip(px.iter()) {
                *acc += c as u32;
            }
        }
    }
    // Rounded box mean of the sampled pixels; the shared chroma pair is
    // derived from it.
    let n = (gw * gh) as u32;
    let [r, g, b] = sum.map(|s| ((s + n / 2) / n) as f32);
    PixelGroup {
        luma,
        cb: color::rgb_to_cb(r, g, b) - 128.0,
        cr: color::rgb_to_cr(r, g, b) - 128.0,
    }
}
