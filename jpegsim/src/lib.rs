// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Simulates the visual artifacts of lossy JPEG compression on raw RGB
//! buffers, without producing a bitstream: color conversion, chroma
//! subsampling emulation, blockwise DCT and quantization against
//! quality-scaled tables, then reconstruction. Intended as a data
//! augmentation step; there is no entropy coding and no codec
//! conformance guarantee.

#![deny(unsafe_code)]
pub mod color;
pub mod distort;
pub mod error;
pub mod image;
pub mod quant;
pub mod util;

pub use distort::{
    distort_batch, distort_image, distort_tiles, tile_grid, DistortionMode, DistortionParams,
    SampleDescriptor, TileDescriptor,
};
pub use error::{Error, Result};
pub use image::{RgbImage, RgbView, RgbViewMut};

pub(crate) const BLOCK_DIM: usize = 8;
