// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Block transform engine. One processing unit covers the pixel
//! footprint of a single chroma block (8, 16 or 32 pixels per side
//! depending on the subsampling flags): 1, 2 or 4 luma scratch blocks
//! ("pages"), one Cb block and one Cr block, with the unit's 8x8 grid
//! of pixel groups mapping one-to-one onto the chroma block.
//!
//! The engine runs as a staged pipeline; every stage finishes a full
//! pass over the scratch before the next stage reads it, which is the
//! sequential equivalent of the barrier between cooperative lanes.

use jpegsim_transforms::{dct8_forward, dct8_inverse};

use crate::color;
use crate::distort::group::{gather_group, group_height, group_width};
use crate::image::{RgbView, RgbViewMut};
use crate::quant::QuantTable;
use crate::BLOCK_DIM;

// One padding lane per scratch row; the column pass addresses the block
// through this stride.
const SCRATCH_STRIDE: usize = BLOCK_DIM + 1;
const SCRATCH_LEN: usize = BLOCK_DIM * SCRATCH_STRIDE;
const MAX_LUMA_PAGES: usize = 4;

#[derive(Clone, Copy)]
struct ScratchBlock {
    data: [f32; SCRATCH_LEN],
}

impl ScratchBlock {
    fn new() -> ScratchBlock {
        ScratchBlock {
            data: [0.0; SCRATCH_LEN],
        }
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> f32 {
        self.data[row * SCRATCH_STRIDE + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, v: f32) {
        self.data[row * SCRATCH_STRIDE + col] = v;
    }

    /// Separable forward 2-D DCT: row pass, then column pass.
    fn forward(&mut self) {
        for r in 0..BLOCK_DIM {
            dct8_forward(&mut self.data, r * SCRATCH_STRIDE, 1);
        }
        for c in 0..BLOCK_DIM {
            dct8_forward(&mut self.data, c, SCRATCH_STRIDE);
        }
    }

    /// Separable inverse 2-D DCT: column pass, then row pass.
    fn inverse(&mut self) {
        for c in 0..BLOCK_DIM {
            dct8_inverse(&mut self.data, c, SCRATCH_STRIDE);
        }
        for r in 0..BLOCK_DIM {
            dct8_inverse(&mut self.data, r * SCRATCH_STRIDE, 1);
        }
    }

    /// Lossy rounding to the table's coefficient grid: divide, round to
    /// nearest, multiply back. Entries below 1 are floored to 1.
    fn quantize(&mut self, table: &QuantTable) {
        for r in 0..BLOCK_DIM {
            for c in 0..BLOCK_DIM {
                let step = table.entry(r, c).max(1) as f32;
                let v = self.at(r, c);
                self.set(r, c, (v / step).round() * step);
            }
        }
    }
}

/// Per-tile scratch, reused across all units the tile covers.
pub(crate) struct TileScratch {
    luma: [ScratchBlock; MAX_LUMA_PAGES],
    cb: ScratchBlock,
    cr: ScratchBlock,
}

impl TileScratch {
    pub(crate) fn new() -> TileScratch {
        TileScratch {
            luma: [ScratchBlock::new(); MAX_LUMA_PAGES],
            cb: ScratchBlock::new(),
            cr: ScratchBlock::new(),
        }
    }
}

/// Runs the full distortion pipeline for the unit anchored at `origin`
/// (a multiple of the unit size on both axes). Units may extend past
/// the image edge; out-of-bounds pixels are gathered with border
/// clamping and skipped entirely on output.
pub(crate) fn process_unit<const H: bool, const V: bool, const Q: bool>(
    input: &RgbView,
    output: &mut RgbViewMut,
    luma_table: &QuantTable,
    chroma_table: &QuantTable,
    origin: (usize, usize),
    scratch: &mut TileScratch,
) {
    let gw = group_width::<H>();
    let gh = group_height::<V>();
    let pages = gw * gh;

    // Gather: color transform + subsampling into centered scratch.
    for gy in 0..BLOCK_DIM {
        for gx in 0..BLOCK_DIM {
            let anchor = (origin.0 + gx * gw, origin.1 + gy * gh);
            let group = gather_group::<H, V>(input, anchor);
            for sy in 0..gh {
                for sx in 0..gw {
                    let lx = gx * gw + sx;
                    let ly = gy * gh + sy;
                    let page = (ly / BLOCK_DIM) * gw + lx / BLOCK_DIM;
                    scratch.luma[page].set(ly % BLOCK_DIM, lx % BLOCK_DIM, group.luma[sy * gw + sx]);
                }
            }
            scratch.cb.set(gy, gx, group.cb);
            scratch.cr.set(gy, gx, group.cr);
        }
    }

    // Forward transform, all active blocks.
    for page in scratch.luma[..pages].iter_mut() {
        page.forward();
    }
    scratch.cb.forward();
    scratch.cr.forward();

    // Quantization. Replicated luma pages all use the luma table.
    if Q {
        for page in scratch.luma[..pages].iter_mut() {
            page.quantize(luma_table);
        }
        scratch.cb.quantize(chroma_table);
        scratch.cr.quantize(chroma_table);
    }

    // Inverse transform.
    for page in scratch.luma[..pages].iter_mut() {
        page.inverse();
    }
    scratch.cb.inverse();
    scratch.cr.inverse();

    // Scatter: shift back, saturate, inverse color transform with the
    // group's chroma pair broadcast to every luma position.
    let (width, height) = output.size();
    for gy in 0..BLOCK_DIM {
        for gx in 0..BLOCK_DIM {
            let cb = (scratch.cb.at(gy, gx) + 128.0).clamp(0.0, 255.0);
            let cr = (scratch.cr.at(gy, gx) + 128.0).clamp(0.0, 255.0);
            for sy in 0..gh {
                for sx in 0..gw {
                    let px = origin.0 + gx * gw + sx;
                    let py = origin.1 + gy * gh + sy;
                    if px >= width || py >= height {
                        continue;
                    }
                    let lx = gx * gw + sx;
                    let ly = gy * gh + sy;
                    let page = (ly / BLOCK_DIM) * gw + lx / BLOCK_DIM;
                    let y = (scratch.luma[page].at(ly % BLOCK_DIM, lx % BLOCK_DIM) + 128.0)
                        .clamp(0.0, 255.0);
                    let (r, g, b) = color::ycbcr_to_rgb(y, cb, cr);
                    output.put(
                        px,
                        py,
                        [
                            color::round_to_u8(r),
                            color::round_to_u8(g),
                            color::round_to_u8(b),
                        ],
                    );
                }
            }
        }
    }
}
