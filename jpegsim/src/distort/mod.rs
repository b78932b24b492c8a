// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Tile driver and batch entry points.

mod group;
mod tile;

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::image::{RgbView, RgbViewMut};
use crate::quant::{build_chroma_table, build_luma_table, QuantTable};
use crate::util::{align_down, align_up};
use crate::BLOCK_DIM;

use group::{group_height, group_width};
use tile::{process_unit, TileScratch};

/// Kernel mode selection: the two subsampling axes and whether DCT
/// coefficients are quantized. Each combination dispatches to its own
/// monomorphized kernel; there are no mode branches in the hot loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistortionMode {
    pub subsample_horizontal: bool,
    pub subsample_vertical: bool,
    pub quantize: bool,
}

impl Default for DistortionMode {
    /// 4:2:0 with quantization, the common JPEG configuration.
    fn default() -> Self {
        DistortionMode {
            subsample_horizontal: true,
            subsample_vertical: true,
            quantize: true,
        }
    }
}

impl DistortionMode {
    /// Pixel footprint of one processing unit (one chroma block).
    pub fn unit_size(&self) -> (usize, usize) {
        (
            BLOCK_DIM << (self.subsample_horizontal as usize),
            BLOCK_DIM << (self.subsample_vertical as usize),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistortionParams {
    pub quality: i32,
    pub mode: DistortionMode,
}

impl Default for DistortionParams {
    fn default() -> Self {
        DistortionParams {
            quality: 75,
            mode: DistortionMode::default(),
        }
    }
}

/// One image of a batch: input and output buffers of identical shape
/// plus the two quantization tables derived from this sample's quality.
pub struct SampleDescriptor<'a> {
    pub input: RgbView<'a>,
    pub output: RgbViewMut<'a>,
    pub luma_table: QuantTable,
    pub chroma_table: QuantTable,
}

impl<'a> SampleDescriptor<'a> {
    pub fn new(input: RgbView<'a>, output: RgbViewMut<'a>, quality: i32) -> Result<Self> {
        Self::with_tables(
            input,
            output,
            build_luma_table(quality),
            build_chroma_table(quality),
        )
    }

    pub fn with_tables(
        input: RgbView<'a>,
        output: RgbViewMut<'a>,
        luma_table: QuantTable,
        chroma_table: QuantTable,
    ) -> Result<Self> {
        let (iw, ih) = input.size();
        let (ow, oh) = output.size();
        if (iw, ih) != (ow, oh) {
            return Err(Error::SampleShapeMismatch(iw, ih, ow, oh));
        }
        Ok(SampleDescriptor {
            input,
            output,
            luma_table,
            chroma_table,
        })
    }

    pub fn size(&self) -> (usize, usize) {
        self.input.size()
    }
}

/// Rectangular pixel region of one sample, `start` inclusive, `end`
/// exclusive. Produced by an external partitioner (or [`tile_grid`]);
/// the driver aligns the region outward to unit boundaries, and units
/// extending past the image edge leave out-of-bounds output untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileDescriptor {
    pub sample: usize,
    pub start: (usize, usize),
    pub end: (usize, usize),
}

/// Partitions `size` into unit-aligned tiles of roughly `tile_size`
/// pixels for sample `sample`.
pub fn tile_grid(
    size: (usize, usize),
    tile_size: (usize, usize),
    sample: usize,
    mode: DistortionMode,
) -> Vec<TileDescriptor> {
    let unit = mode.unit_size();
    let tw = align_up(tile_size.0.max(unit.0), unit.0);
    let th = align_up(tile_size.1.max(unit.1), unit.1);
    let mut tiles = vec![];
    let mut y = 0;
    while y < size.1 {
        let mut x = 0;
        while x < size.0 {
            tiles.push(TileDescriptor {
                sample,
                start: (x, y),
                end: ((x + tw).min(size.0), (y + th).min(size.1)),
            });
            x += tw;
        }
        y += th;
    }
    tiles
}

fn check_tile(tile: &TileDescriptor, num_samples: usize) -> Result<()> {
    if tile.sample >= num_samples {
        return Err(Error::SampleIndexOutOfRange(tile.sample, num_samples));
    }
    if tile.end.0 <= tile.start.0 || tile.end.1 <= tile.start.1 {
        return Err(Error::EmptyTile(
            tile.start.0, tile.end.0, tile.start.1, tile.end.1,
        ));
    }
    Ok(())
}

fn process_tile<const H: bool, const V: bool, const Q: bool>(
    sample: &mut SampleDescriptor,
    tile: &TileDescriptor,
) {
    let unit_w = BLOCK_DIM * group_width::<H>();
    let unit_h = BLOCK_DIM * group_height::<V>();
    let x0 = align_down(tile.start.0, unit_w);
    let x1 = align_up(tile.end.0, unit_w);
    let y0 = align_down(tile.start.1, unit_h);
    let y1 = align_up(tile.end.1, unit_h);
    let mut scratch = TileScratch::new();
    let mut uy = y0;
    while uy < y1 {
        let mut ux = x0;
        while ux < x1 {
            process_unit::<H, V, Q>(
                &sample.input,
                &mut sample.output,
                &sample.luma_table,
                &sample.chroma_table,
                (ux, uy),
                &mut scratch,
            );
            ux += unit_w;
        }
        uy += unit_h;
    }
}

fn process_tile_dispatch(sample: &mut SampleDescriptor, tile: &TileDescriptor, mode: DistortionMode) {
    let DistortionMode {
        subsample_horizontal: h,
        subsample_vertical: v,
        quantize: q,
    } = mode;
    match (h, v, q) {
        (false, false, false) => process_tile::<false, false, false>(sample, tile),
        (false, false, true) => process_tile::<false, false, true>(sample, tile),
        (false, true, false) => process_tile::<false, true, false>(sample, tile),
        (false, true, true) => process_tile::<false, true, true>(sample, tile),
        (true, false, false) => process_tile::<true, false, false>(sample, tile),
        (true, false, true) => process_tile::<true, false, true>(sample, tile),
        (true, true, false) => process_tile::<true, true, false>(sample, tile),
        (true, true, true) => process_tile::<true, true, true>(sample, tile),
    }
}

/// Processes an explicit tile list sequentially.
#[instrument(skip_all, err)]
pub fn distort_tiles(
    samples: &mut [SampleDescriptor],
    tiles: &[TileDescriptor],
    mode: DistortionMode,
) -> Result<()> {
    let num_samples = samples.len();
    for tile in tiles {
        check_tile(tile, num_samples)?;
        debug!(?tile, "processing tile");
        process_tile_dispatch(&mut samples[tile.sample], tile, mode);
    }
    Ok(())
}

/// Processes a batch, samples in parallel (with the `parallel` feature)
/// and each sample's tiles in order.
#[instrument(skip_all, err)]
pub fn distort_batch(
    samples: &mut [SampleDescriptor],
    tiles: &[TileDescriptor],
    mode: DistortionMode,
) -> Result<()> {
    let num_samples = samples.len();
    let mut per_sample: Vec<Vec<&TileDescriptor>> = vec![vec![]; num_samples];
    for tile in tiles {
        check_tile(tile, num_samples)?;
        per_sample[tile.sample].push(tile);
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        samples
            .par_iter_mut()
            .zip(per_sample.par_iter())
            .for_each(|(sample, tiles)| {
                for tile in tiles {
                    process_tile_dispatch(sample, tile, mode);
                }
            });
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (sample, tiles) in samples.iter_mut().zip(per_sample.iter()) {
            for tile in tiles {
                process_tile_dispatch(sample, tile, mode);
            }
        }
    }
    Ok(())
}

/// Single-image convenience wrapper: builds tables from
/// `params.quality` and a full-cover tile grid internally.
#[instrument(skip(input, output), err)]
pub fn distort_image(
    input: RgbView<'_>,
    output: RgbViewMut<'_>,
    params: &DistortionParams,
) -> Result<()> {
    let tiles = tile_grid(input.size(), (256, 256), 0, params.mode);
    let mut samples = [SampleDescriptor::new(input, output, params.quality)?];
    distort_tiles(&mut samples, &tiles, params.mode)
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use test_log::test;

    use super::*;
    use crate::color;
    use crate::image::RgbImage;

    fn random_image(size: (usize, usize), seed: u64) -> Result<RgbImage> {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let data: Vec<u8> = (0..size.0 * size.1 * 3).map(|_| rng.random()).collect();
        RgbImage::from_raw(size, data)
    }

    fn no_distortion() -> DistortionMode {
        DistortionMode {
            subsample_horizontal: false,
            subsample_vertical: false,
            quantize: false,
        }
    }

    fn luma_of(rgb: [u8; 3]) -> f32 {
        color::rgb_to_y(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32)
    }

    #[test]
    fn round_trip_identity() -> Result<()> {
        // Odd dimensions exercise the boundary path too.
        let input = random_image((23, 17), 7)?;
        let mut output = RgbImage::new((23, 17))?;
        let params = DistortionParams {
            quality: 95,
            mode: no_distortion(),
        };
        distort_image(input.as_view(), output.as_view_mut(), &params)?;
        for (got, want) in output.data().iter().zip(input.data().iter()) {
            assert!(
                (*got as i16 - *want as i16).abs() <= 1,
                "{got} differs from {want} by more than one level"
            );
        }
        Ok(())
    }

    #[test]
    fn flat_gray_survives_quantization() -> Result<()> {
        let mut input = RgbImage::new((16, 16))?;
        {
            let mut view = input.as_view_mut();
            for y in 0..16 {
                for x in 0..16 {
                    view.put(x, y, [128, 128, 128]);
                }
            }
        }
        let mut output = RgbImage::new((16, 16))?;
        let params = DistortionParams {
            quality: 95,
            mode: DistortionMode {
                subsample_horizontal: false,
                subsample_vertical: false,
                quantize: true,
            },
        };
        distort_image(input.as_view(), output.as_view_mut(), &params)?;
        for (got, want) in output.data().iter().zip(input.data().iter()) {
            assert!((*got as i16 - *want as i16).abs() <= 1);
        }
        Ok(())
    }

    #[test]
    fn subsampling_broadcasts_chroma_exactly_for_uniform_groups() -> Result<()> {
        // Horizontal 2x1 groups where both pixels are identical must
        // come out the same up to rounding: they share luma and the
        // broadcast chroma.
        let mut rng = XorShiftRng::seed_from_u64(11);
        let mut input = RgbImage::new((16, 8))?;
        {
            let mut view = input.as_view_mut();
            for y in 0..8 {
                for gx in 0..8 {
                    let rgb: [u8; 3] = std::array::from_fn(|_| rng.random());
                    view.put(2 * gx, y, rgb);
                    view.put(2 * gx + 1, y, rgb);
                }
            }
        }
        let mut output = RgbImage::new((16, 8))?;
        let params = DistortionParams {
            quality: 95,
            mode: DistortionMode {
                subsample_horizontal: true,
                subsample_vertical: false,
                quantize: false,
            },
        };
        distort_image(input.as_view(), output.as_view_mut(), &params)?;
        let view = output.as_view();
        for y in 0..8 {
            for gx in 0..8 {
                let a = view.get(2 * gx, y);
                let b = view.get(2 * gx + 1, y);
                for c in 0..3 {
                    assert!((a[c] as i16 - b[c] as i16).abs() <= 1, "{a:?} vs {b:?}");
                }
            }
        }
        Ok(())
    }

    #[test]
    fn subsampling_shares_one_chroma_pair_per_group() -> Result<()> {
        // With varied luma inside a group the output RGB differs, but
        // the chroma recomputed from it stays within the rounding error
        // of one shared pair, while luma follows per-pixel brightness.
        let input = random_image((16, 16), 23)?;
        let mut output = RgbImage::new((16, 16))?;
        let params = DistortionParams {
            quality: 95,
            mode: DistortionMode {
                subsample_horizontal: true,
                subsample_vertical: true,
                quantize: false,
            },
        };
        distort_image(input.as_view(), output.as_view_mut(), &params)?;
        let view = output.as_view();
        for gy in 0..8 {
            for gx in 0..8 {
                let pixels = [
                    view.get(2 * gx, 2 * gy),
                    view.get(2 * gx + 1, 2 * gy),
                    view.get(2 * gx, 2 * gy + 1),
                    view.get(2 * gx + 1, 2 * gy + 1),
                ];
                let chroma: Vec<(f32, f32)> = pixels
                    .iter()
                    .map(|&[r, g, b]| {
                        (
                            color::rgb_to_cb(r as f32, g as f32, b as f32),
                            color::rgb_to_cr(r as f32, g as f32, b as f32),
                        )
                    })
                    .collect();
                for (cb, cr) in &chroma[1..] {
                    assert!((cb - chroma[0].0).abs() <= 1.5);
                    assert!((cr - chroma[0].1).abs() <= 1.5);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn subsampling_preserves_per_pixel_luma() -> Result<()> {
        let input = random_image((16, 16), 29)?;
        let mut output = RgbImage::new((16, 16))?;
        let params = DistortionParams {
            quality: 95,
            mode: DistortionMode {
                subsample_horizontal: true,
                subsample_vertical: true,
                quantize: false,
            },
        };
        distort_image(input.as_view(), output.as_view_mut(), &params)?;
        for y in 0..16 {
            for x in 0..16 {
                let want = luma_of(input.as_view().get(x, y));
                let got = luma_of(output.as_view().get(x, y));
                assert!(
                    (want - got).abs() <= 1.5,
                    "luma at ({x}, {y}) drifted: {want} -> {got}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn low_quality_attenuates_high_frequencies() -> Result<()> {
        // A single bright column on black; at quality 10 + 4:2:0 the
        // neighborhood of the edge must lose variance compared to
        // quality 95 on the same input.
        let mut input = RgbImage::new((16, 16))?;
        {
            let mut view = input.as_view_mut();
            for y in 0..16 {
                view.put(8, y, [255, 255, 255]);
            }
        }
        let variance_at = |quality: i32| -> Result<f64> {
            let mut output = RgbImage::new((16, 16))?;
            let params = DistortionParams {
                quality,
                mode: DistortionMode::default(),
            };
            distort_image(input.as_view(), output.as_view_mut(), &params)?;
            let view = output.as_view();
            let mut values = vec![];
            for y in 4..12 {
                for x in 4..12 {
                    values.push(luma_of(view.get(x, y)) as f64);
                }
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Ok(values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
                / values.len() as f64)
        };
        assert!(variance_at(10)? < variance_at(95)?);
        Ok(())
    }

    #[test]
    fn tiles_beyond_image_edge_leave_buffer_untouched() -> Result<()> {
        // 12x10 image inside a larger canary buffer; tile units align
        // up to 16x16 but only declared pixels may be written.
        let input = random_image((12, 10), 31)?;
        let row_stride = 16 * 3 + 5;
        let mut data = vec![0xEEu8; row_stride * 16];
        {
            let output = RgbViewMut::with_strides(&mut data, (12, 10), row_stride, 3)?;
            let params = DistortionParams {
                quality: 10,
                mode: DistortionMode::default(),
            };
            distort_image(input.as_view(), output, &params)?;
        }
        for y in 0..16 {
            for i in 0..row_stride {
                if y < 10 && i < 12 * 3 {
                    continue;
                }
                assert_eq!(
                    data[y * row_stride + i],
                    0xEE,
                    "byte ({i}, {y}) outside the image was written"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn batch_matches_sequential_tiles() -> Result<()> {
        let input_a = random_image((40, 24), 41)?;
        let input_b = random_image((17, 33), 43)?;
        let mode = DistortionMode::default();

        let mut seq_a = RgbImage::new((40, 24))?;
        let mut seq_b = RgbImage::new((17, 33))?;
        let mut tiles = tile_grid((40, 24), (16, 16), 0, mode);
        tiles.extend(tile_grid((17, 33), (16, 16), 1, mode));
        {
            let mut samples = [
                SampleDescriptor::new(input_a.as_view(), seq_a.as_view_mut(), 30)?,
                SampleDescriptor::new(input_b.as_view(), seq_b.as_view_mut(), 80)?,
            ];
            distort_tiles(&mut samples, &tiles, mode)?;
        }

        let mut par_a = RgbImage::new((40, 24))?;
        let mut par_b = RgbImage::new((17, 33))?;
        {
            let mut samples = [
                SampleDescriptor::new(input_a.as_view(), par_a.as_view_mut(), 30)?,
                SampleDescriptor::new(input_b.as_view(), par_b.as_view_mut(), 80)?,
            ];
            distort_batch(&mut samples, &tiles, mode)?;
        }

        assert_eq!(seq_a.data(), par_a.data());
        assert_eq!(seq_b.data(), par_b.data());
        Ok(())
    }

    #[test]
    fn tile_partitioning_is_independent_of_grid() -> Result<()> {
        // Units are anchored at absolute coordinates, so any unit-aligned
        // partition produces identical output.
        let input = random_image((48, 32), 47)?;
        let mode = DistortionMode::default();

        let mut coarse = RgbImage::new((48, 32))?;
        {
            let tiles = tile_grid((48, 32), (48, 32), 0, mode);
            let mut samples = [SampleDescriptor::new(input.as_view(), coarse.as_view_mut(), 40)?];
            distort_tiles(&mut samples, &tiles, mode)?;
        }

        let mut fine = RgbImage::new((48, 32))?;
        {
            let tiles = tile_grid((48, 32), (16, 16), 0, mode);
            let mut samples = [SampleDescriptor::new(input.as_view(), fine.as_view_mut(), 40)?];
            distort_tiles(&mut samples, &tiles, mode)?;
        }

        assert_eq!(coarse.data(), fine.data());
        Ok(())
    }

    #[test]
    fn bad_sample_index_is_rejected() -> Result<()> {
        let input = random_image((8, 8), 53)?;
        let mut output = RgbImage::new((8, 8))?;
        let mode = DistortionMode::default();
        let mut samples = [SampleDescriptor::new(input.as_view(), output.as_view_mut(), 50)?];
        let tiles = [TileDescriptor {
            sample: 3,
            start: (0, 0),
            end: (8, 8),
        }];
        assert!(matches!(
            distort_tiles(&mut samples, &tiles, mode),
            Err(Error::SampleIndexOutOfRange(3, 1))
        ));
        assert!(matches!(
            distort_batch(&mut samples, &tiles, mode),
            Err(Error::SampleIndexOutOfRange(3, 1))
        ));
        Ok(())
    }

    #[test]
    fn empty_tile_is_rejected() -> Result<()> {
        let input = random_image((8, 8), 59)?;
        let mut output = RgbImage::new((8, 8))?;
        let mode = DistortionMode::default();
        let mut samples = [SampleDescriptor::new(input.as_view(), output.as_view_mut(), 50)?];
        let tiles = [TileDescriptor {
            sample: 0,
            start: (8, 0),
            end: (8, 8),
        }];
        assert!(distort_tiles(&mut samples, &tiles, mode).is_err());
        Ok(())
    }

    #[test]
    fn shape_mismatch_is_rejected() -> Result<()> {
        let input = random_image((8, 8), 61)?;
        let mut output = RgbImage::new((8, 9))?;
        assert!(matches!(
            SampleDescriptor::new(input.as_view(), output.as_view_mut(), 50),
            Err(Error::SampleShapeMismatch(8, 8, 8, 9))
        ));
        Ok(())
    }

    #[test]
    fn tile_grid_covers_image() {
        let mode = DistortionMode::default();
        let tiles = tile_grid((100, 60), (32, 32), 0, mode);
        let mut covered = vec![vec![false; 100]; 60];
        for tile in &tiles {
            assert_eq!(tile.sample, 0);
            for y in tile.start.1..tile.end.1 {
                for x in tile.start.0..tile.end.0 {
                    assert!(!covered[y][x], "({x}, {y}) covered twice");
                    covered[y][x] = true;
                }
            }
        }
        assert!(covered.iter().flatten().all(|&c| c));
    }

    #[test]
    fn quantization_visibly_distorts_low_quality() -> Result<()> {
        let input = random_image((32, 32), 67)?;
        let mut output = RgbImage::new((32, 32))?;
        let params = DistortionParams {
            quality: 5,
            mode: DistortionMode::default(),
        };
        distort_image(input.as_view(), output.as_view_mut(), &params)?;
        let differing = output
            .data()
            .iter()
            .zip(input.data().iter())
            .filter(|(a, b)| a != b)
            .count();
        // Noise at quality 5 cannot survive nearly intact.
        assert!(differing > output.data().len() / 2);
        Ok(())
    }
}
