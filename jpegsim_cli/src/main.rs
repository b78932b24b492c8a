// Copyright (c) the jpegsim Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, Result, WrapErr};
use jpegsim::{distort_image, DistortionMode, DistortionParams, RgbImage};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Subsampling {
    /// No chroma subsampling.
    #[value(name = "444")]
    S444,
    /// Halved chroma resolution on the horizontal axis.
    #[value(name = "422")]
    S422,
    /// Halved chroma resolution on both axes.
    #[value(name = "420")]
    S420,
}

#[derive(Parser)]
struct Opt {
    /// Input PNG file
    input: PathBuf,

    /// Output PNG file
    output: PathBuf,

    /// JPEG-style quality factor, 1 (worst) to 99 (best)
    #[clap(short, long, default_value_t = 75)]
    quality: i32,

    /// Chroma subsampling layout
    #[clap(short, long, value_enum, default_value_t = Subsampling::S420)]
    subsampling: Subsampling,

    /// Skip coefficient quantization (subsampling artifacts only)
    #[clap(long)]
    no_quantize: bool,
}

fn load_png(path: &PathBuf) -> Result<RgbImage> {
    let file = fs::File::open(path).wrap_err_with(|| format!("cannot open {}", path.display()))?;
    let decoder = png::Decoder::new(file);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    if info.bit_depth != png::BitDepth::Eight {
        return Err(eyre!("only 8-bit PNG input is supported"));
    }
    let size = (info.width as usize, info.height as usize);
    let data = match info.color_type {
        png::ColorType::Rgb => buf[..info.buffer_size()].to_vec(),
        png::ColorType::Rgba => buf[..info.buffer_size()]
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        png::ColorType::Grayscale => buf[..info.buffer_size()]
            .iter()
            .flat_map(|&g| [g, g, g])
            .collect(),
        other => return Err(eyre!("unsupported PNG color type {other:?}")),
    };
    Ok(RgbImage::from_raw(size, data)?)
}

fn save_png(path: &PathBuf, image: &RgbImage) -> Result<()> {
    let file =
        fs::File::create(path).wrap_err_with(|| format!("cannot create {}", path.display()))?;
    let (width, height) = image.size();
    let mut encoder = png::Encoder::new(file, width as u32, height as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.data())?;
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let opt = Opt::parse();
    let input = load_png(&opt.input)?;
    let (width, height) = input.size();
    println!("Image size: {width} x {height}");

    let (subsample_horizontal, subsample_vertical) = match opt.subsampling {
        Subsampling::S444 => (false, false),
        Subsampling::S422 => (true, false),
        Subsampling::S420 => (true, true),
    };
    let params = DistortionParams {
        quality: opt.quality,
        mode: DistortionMode {
            subsample_horizontal,
            subsample_vertical,
            quantize: !opt.no_quantize,
        },
    };

    let mut output = RgbImage::new((width, height))?;
    distort_image(input.as_view(), output.as_view_mut(), &params)?;
    save_png(&opt.output, &output)?;
    Ok(())
}
