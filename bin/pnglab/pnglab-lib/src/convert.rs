// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use clap::ArgMatches;
use log::{debug, error, info};
use rawpng::{BitDepth, ColorType, CompressionLevel, DensityUnit, PhysicalDensity, PngImage};
use std::fs::{File, remove_file};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::AppError;

fn in_out_paths(options: &ArgMatches) -> crate::Result<(&PathBuf, &PathBuf)> {
  let in_file: &PathBuf = options.get_one("INPUT").expect("INPUT not available");
  let out_file: &PathBuf = options.get_one("OUTPUT").expect("OUTPUT not available");
  debug!("Infile: {:?}, Outfile: {:?}", in_file, out_file);

  if !in_file.exists() {
    return Err(AppError::NotFound(in_file.clone()));
  }
  if out_file.exists() && !options.get_flag("override") {
    return Err(AppError::AlreadyExists(out_file.clone()));
  }
  Ok((in_file, out_file))
}

fn compression_level(options: &ArgMatches) -> CompressionLevel {
  options.get_one::<CompressionLevel>("compression").copied().unwrap_or_default()
}

/// Entry point for Clap sub command `encode`
pub fn encode(options: &ArgMatches) -> crate::Result<()> {
  let (in_file, out_file) = in_out_paths(options)?;
  let now = Instant::now();

  let width = *options.get_one::<u32>("width").expect("width is required");
  let height = *options.get_one::<u32>("height").expect("height is required");
  let bit_depth = match options.get_one::<String>("depth").map(String::as_str) {
    Some("16") => BitDepth::Sixteen,
    _ => BitDepth::Eight,
  };
  let color_type = options.get_one::<ColorType>("color").copied().unwrap_or(ColorType::Truecolor);
  let unit = options.get_one::<DensityUnit>("unit").copied().unwrap_or_default();
  let density = match (options.get_one::<u32>("ppu_x"), options.get_one::<u32>("ppu_y")) {
    (Some(x), Some(y)) => Some(PhysicalDensity::new(*x, *y, unit)),
    _ => None,
  };

  let pixels = std::fs::read(in_file)?;
  let image = match density {
    Some(density) => PngImage::with_density(pixels, width, height, bit_depth, color_type, density)?,
    None => PngImage::new(pixels, width, height, bit_depth, color_type)?,
  };
  image.save(out_file, compression_level(options))?;

  info!("Encoded {} in {:.2}s", in_file.display(), now.elapsed().as_secs_f32());
  Ok(())
}

/// Entry point for Clap sub command `decode`
pub fn decode(options: &ArgMatches) -> crate::Result<()> {
  let (in_file, out_file) = in_out_paths(options)?;
  let now = Instant::now();

  let image = PngImage::open(in_file)?;
  if let Err(err) = write_pixels(out_file, image.pixels()) {
    if let Err(err) = remove_file(out_file) {
      error!("Failed to delete raw file after write error: {:?}", err);
    }
    return Err(err);
  }

  let info = image.info();
  info!(
    "Decoded {} ({}x{}, {:?}, {} bit) in {:.2}s",
    in_file.display(),
    info.width,
    info.height,
    info.color_type,
    info.bit_depth,
    now.elapsed().as_secs_f32()
  );
  Ok(())
}

fn write_pixels(path: &Path, pixels: &[u8]) -> crate::Result<()> {
  let mut stream = BufWriter::new(File::create(path)?);
  stream.write_all(pixels)?;
  stream.flush()?;
  Ok(())
}

/// Entry point for Clap sub command `recompress`
pub fn recompress(options: &ArgMatches) -> crate::Result<()> {
  let (in_file, out_file) = in_out_paths(options)?;
  let now = Instant::now();

  let image = PngImage::open(in_file)?;
  let level = compression_level(options);
  image.save(out_file, level)?;

  info!("Recompressed {} with level '{}' in {:.2}s", in_file.display(), level.name(), now.elapsed().as_secs_f32());
  Ok(())
}
