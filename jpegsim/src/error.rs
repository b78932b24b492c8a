// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Image size too large: {0}x{1}")]
    ImageSizeTooLarge(usize, usize),
    #[error("Invalid image size: {0}x{1}")]
    InvalidImageSize(usize, usize),
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error("Invalid pixel stride {0}: interleaved RGB needs at least 3")]
    InvalidPixelStride(usize),
    #[error("Invalid row stride {0} for a row of {1} pixels with pixel stride {2}")]
    InvalidRowStride(usize, usize, usize),
    #[error("Buffer of {0} bytes too small for a {1}x{2} view needing {3} bytes")]
    BufferTooSmall(usize, usize, usize, usize),
    #[error("Input is {0}x{1} but output is {2}x{3}")]
    SampleShapeMismatch(usize, usize, usize, usize),
    #[error("Tile references sample {0}, but the batch has {1} samples")]
    SampleIndexOutOfRange(usize, usize),
    #[error("Tile {0}..{1} x {2}..{3} is empty or inverted")]
    EmptyTile(usize, usize, usize, usize),
}

pub type Result<T> = std::result::Result<T, Error>;
