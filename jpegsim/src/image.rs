// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Read-only view over a packed 3-channel 8-bit image, row-major with
/// configurable row and pixel strides.
#[derive(Clone, Copy)]
pub struct RgbView<'a> {
    data: &'a [u8],
    size: (usize, usize),
    row_stride: usize,
    pixel_stride: usize,
}

/// Write-only counterpart of [`RgbView`], same layout rules.
pub struct RgbViewMut<'a> {
    data: &'a mut [u8],
    size: (usize, usize),
    row_stride: usize,
    pixel_stride: usize,
}

impl Debug for RgbView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rgb {}x{} rs {} ps {}",
            self.size.0, self.size.1, self.row_stride, self.pixel_stride
        )
    }
}

impl Debug for RgbViewMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mut rgb {}x{} rs {} ps {}",
            self.size.0, self.size.1, self.row_stride, self.pixel_stride
        )
    }
}

fn check_layout(
    len: usize,
    size: (usize, usize),
    row_stride: usize,
    pixel_stride: usize,
) -> Result<()> {
    let (xsize, ysize) = size;
    if xsize == 0 || ysize == 0 {
        return Err(Error::InvalidImageSize(xsize, ysize));
    }
    // These limits let us not worry about overflows below.
    if xsize as u64 >= i64::MAX as u64 / 4 || ysize as u64 >= i64::MAX as u64 / 4 {
        return Err(Error::ImageSizeTooLarge(xsize, ysize));
    }
    if pixel_stride < 3 {
        return Err(Error::InvalidPixelStride(pixel_stride));
    }
    if row_stride < (xsize - 1) * pixel_stride + 3 {
        return Err(Error::InvalidRowStride(row_stride, xsize, pixel_stride));
    }
    let needed = (ysize - 1) * row_stride + (xsize - 1) * pixel_stride + 3;
    if len < needed {
        return Err(Error::BufferTooSmall(len, xsize, ysize, needed));
    }
    Ok(())
}

impl<'a> RgbView<'a> {
    /// Packed layout: pixel stride 3, rows contiguous.
    pub fn new(data: &'a [u8], size: (usize, usize)) -> Result<RgbView<'a>> {
        Self::with_strides(data, size, size.0 * 3, 3)
    }

    pub fn with_strides(
        data: &'a [u8],
        size: (usize, usize),
        row_stride: usize,
        pixel_stride: usize,
    ) -> Result<RgbView<'a>> {
        check_layout(data.len(), size, row_stride, pixel_stride)?;
        Ok(RgbView {
            data,
            size,
            row_stride,
            pixel_stride,
        })
    }

    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        debug_assert!(x < self.size.0 && y < self.size.1);
        let base = y * self.row_stride + x * self.pixel_stride;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }

    /// Clamped-border addressing: coordinates past the right/bottom edge
    /// read the nearest edge pixel.
    #[inline]
    pub fn get_clamped(&self, x: usize, y: usize) -> [u8; 3] {
        self.get(x.min(self.size.0 - 1), y.min(self.size.1 - 1))
    }
}

impl<'a> RgbViewMut<'a> {
    pub fn new(data: &'a mut [u8], size: (usize, usize)) -> Result<RgbViewMut<'a>> {
        Self::with_strides(data, size, size.0 * 3, 3)
    }

    pub fn with_strides(
        data: &'a mut [u8],
        size: (usize, usize),
        row_stride: usize,
        pixel_stride: usize,
    ) -> Result<RgbViewMut<'a>> {
        check_layout(data.len(), size, row_stride, pixel_stride)?;
        Ok(RgbViewMut {
            data,
            size,
            row_stride,
            pixel_stride,
        })
    }

    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    #[inline]
    pub fn put(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        debug_assert!(x < self.size.0 && y < self.size.1);
        let base = y * self.row_stride + x * self.pixel_stride;
        self.data[base..base + 3].copy_from_slice(&rgb);
    }

    pub fn as_view(&self) -> RgbView<'_> {
        RgbView {
            data: self.data,
            size: self.size,
            row_stride: self.row_stride,
            pixel_stride: self.pixel_stride,
        }
    }
}

/// Owned packed RGB image, mostly for hosts that do not already have
/// their own buffers (CLI, tests).
pub struct RgbImage {
    size: (usize, usize),
    data: Vec<u8>,
}

impl RgbImage {
    #[instrument(err)]
    pub fn new(size: (usize, usize)) -> Result<RgbImage> {
        let (xsize, ysize) = size;
        if xsize == 0 || ysize == 0 {
            return Err(Error::InvalidImageSize(xsize, ysize));
        }
        if xsize as u64 >= i64::MAX as u64 / 4 || ysize as u64 >= i64::MAX as u64 / 4 {
            return Err(Error::ImageSizeTooLarge(xsize, ysize));
        }
        let total = xsize
            .checked_mul(ysize)
            .and_then(|px| px.checked_mul(3))
            .ok_or(Error::ImageSizeTooLarge(xsize, ysize))?;
        debug!("allocating {}x{} rgb image", xsize, ysize);
        let mut data = vec![];
        data.try_reserve_exact(total)?;
        data.resize(total, 0);
        Ok(RgbImage { size, data })
    }

    pub fn from_raw(size: (usize, usize), data: Vec<u8>) -> Result<RgbImage> {
        check_layout(data.len(), size, size.0 * 3, 3)?;
        Ok(RgbImage { size, data })
    }

    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn as_view(&self) -> RgbView<'_> {
        RgbView {
            data: &self.data,
            size: self.size,
            row_stride: self.size.0 * 3,
            pixel_stride: 3,
        }
    }

    pub fn as_view_mut(&mut self) -> RgbViewMut<'_> {
        RgbViewMut {
            data: &mut self.data,
            size: self.size,
            row_stride: self.size.0 * 3,
            pixel_stride: 3,
        }
    }
}
