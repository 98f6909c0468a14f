// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::chunk::{self, Chunk, ChunkSource, ChunkType};
use crate::compress::CompressionLevel;
use crate::decoder::{self, DecodeParams};
use crate::format::{BitDepth, ColorType, INTERLACE_NONE, PNG_SIGNATURE, PhysicalDensity};
use crate::rawsource::PngSource;
use crate::scanlines::{FilterStrategy, ScanlineLayout, alloc_buffer};
use crate::{PngError, Result};

/// Raw pixel buffer together with the metadata needed to encode it.
///
/// Pixels are stored row by row, top to bottom, without padding. Samples of
/// 16 bit images are stored big-endian.
pub struct PngImage {
  width: u32,
  height: u32,
  bit_depth: BitDepth,
  color_type: ColorType,
  density: Option<PhysicalDensity>,
  pixels: Vec<u8>,
  filter_strategy: FilterStrategy,
  header: Chunk,
  phys: Option<Chunk>,
  end: Chunk,
}

/// Metadata summary of an image
#[derive(Debug, Clone, Serialize)]
pub struct PngInfo {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_type: ColorType,
  pub channels: usize,
  pub bytes_per_pixel: usize,
  pub interlace: u8,
  pub density: Option<PhysicalDensity>,
  pub dpi: Option<(f64, f64)>,
  pub raw_pixel_size: usize,
}

impl PngImage {
  pub fn new(pixels: Vec<u8>, width: u32, height: u32, bit_depth: BitDepth, color_type: ColorType) -> Result<Self> {
    Self::build(pixels, width, height, bit_depth, color_type, None)
  }

  /// Like [`PngImage::new`], a density with a zero axis is dropped
  pub fn with_density(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    bit_depth: BitDepth,
    color_type: ColorType,
    density: PhysicalDensity,
  ) -> Result<Self> {
    Self::build(pixels, width, height, bit_depth, color_type, Some(density))
  }

  fn build(pixels: Vec<u8>, width: u32, height: u32, bit_depth: BitDepth, color_type: ColorType, density: Option<PhysicalDensity>) -> Result<Self> {
    let layout = ScanlineLayout::new(width, height, color_type.channels() * bit_depth.bytes_per_channel())?;
    if pixels.len() != layout.pixel_len() {
      return Err(PngError::InvalidArgument(format!(
        "Pixel buffer has {} bytes, a {}x{} {:?} image with {} bits per sample needs {}",
        pixels.len(),
        width,
        height,
        color_type,
        bit_depth.bits(),
        layout.pixel_len()
      )));
    }
    let mut image = Self {
      width,
      height,
      bit_depth,
      color_type,
      density: density.filter(PhysicalDensity::is_present),
      pixels,
      filter_strategy: FilterStrategy::default(),
      header: Chunk::new(ChunkType::IHDR, Vec::new()),
      phys: None,
      end: chunk::end_chunk(),
    };
    image.rebuild_chunks();
    Ok(image)
  }

  fn rebuild_chunks(&mut self) {
    self.header = chunk::header_chunk(&*self);
    self.phys = self.density.as_ref().and_then(chunk::phys_chunk);
  }

  /// Use another execution strategy for filtering on encode
  pub fn with_filter_strategy(mut self, strategy: FilterStrategy) -> Self {
    self.filter_strategy = strategy;
    self
  }

  pub fn set_density(&mut self, density: Option<PhysicalDensity>) {
    self.density = density.filter(PhysicalDensity::is_present);
    self.rebuild_chunks();
  }

  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    Self::open_with(path, &DecodeParams::default())
  }

  pub fn open_with<P: AsRef<Path>>(path: P, params: &DecodeParams) -> Result<Self> {
    let source = PngSource::new(path.as_ref())?;
    decoder::decode_source(&source, params)
  }

  pub fn from_bytes(buf: &[u8]) -> Result<Self> {
    decoder::decode_bytes(buf, &DecodeParams::default())
  }

  /// Assemble the complete file: signature, header, density, data and end chunk
  pub fn encode_to_vec(&self, level: CompressionLevel) -> Result<Vec<u8>> {
    let data = chunk::data_chunk(self, level, self.filter_strategy)?;
    let total = PNG_SIGNATURE.len()
      + self.header.encoded_len()
      + self.phys.as_ref().map_or(0, Chunk::encoded_len)
      + data.encoded_len()
      + self.end.encoded_len();
    let mut out = alloc_buffer(total)?;
    out.extend_from_slice(&PNG_SIGNATURE);
    self.header.write(&mut out)?;
    if let Some(phys) = &self.phys {
      phys.write(&mut out)?;
    }
    data.write(&mut out)?;
    self.end.write(&mut out)?;
    debug!("Encoded {}x{} image into {} bytes", self.width, self.height, out.len());
    Ok(out)
  }

  pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W, level: CompressionLevel) -> Result<()> {
    let buf = self.encode_to_vec(level)?;
    writer.write_all(&buf)?;
    Ok(())
  }

  /// Encode and write to `path`. Nothing is written if encoding fails,
  /// a partially written file is removed.
  pub fn save<P: AsRef<Path>>(&self, path: P, level: CompressionLevel) -> Result<()> {
    let path = path.as_ref();
    let buf = self.encode_to_vec(level)?;
    let file = File::create(path).map_err(|err| PngError::with_io_error(path, err))?;
    let mut writer = BufWriter::new(file);
    if let Err(err) = writer.write_all(&buf).and_then(|_| writer.flush()) {
      drop(writer);
      if let Err(rm_err) = fs::remove_file(path) {
        debug!("Failed to remove partial file {:?}: {}", path, rm_err);
      }
      return Err(PngError::with_io_error(path, err));
    }
    info!("Wrote {} bytes to {:?}", buf.len(), path);
    Ok(())
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn bit_depth(&self) -> BitDepth {
    self.bit_depth
  }

  pub fn color_type(&self) -> ColorType {
    self.color_type
  }

  /// Always 0, interlaced images are not supported
  pub fn interlace(&self) -> u8 {
    INTERLACE_NONE
  }

  pub fn density(&self) -> Option<PhysicalDensity> {
    self.density
  }

  pub fn channels(&self) -> usize {
    self.color_type.channels()
  }

  pub fn bytes_per_pixel(&self) -> usize {
    self.channels() * self.bit_depth.bytes_per_channel()
  }

  pub fn pixels(&self) -> &[u8] {
    &self.pixels
  }

  pub fn raw_pixels(&self) -> Vec<u8> {
    self.pixels.clone()
  }

  pub fn raw_pixel_size(&self) -> usize {
    self.pixels.len()
  }

  pub fn into_pixels(self) -> Vec<u8> {
    self.pixels
  }

  pub fn header_chunk(&self) -> &Chunk {
    &self.header
  }

  pub fn phys_chunk(&self) -> Option<&Chunk> {
    self.phys.as_ref()
  }

  pub fn end_chunk(&self) -> &Chunk {
    &self.end
  }

  pub fn info(&self) -> PngInfo {
    PngInfo {
      width: self.width,
      height: self.height,
      bit_depth: self.bit_depth.bits(),
      color_type: self.color_type,
      channels: self.channels(),
      bytes_per_pixel: self.bytes_per_pixel(),
      interlace: self.interlace(),
      density: self.density,
      dpi: self.density.and_then(|d| d.dpi()),
      raw_pixel_size: self.raw_pixel_size(),
    }
  }
}

impl ChunkSource for PngImage {
  fn dimensions(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  fn bit_depth(&self) -> BitDepth {
    self.bit_depth
  }

  fn color_type(&self) -> ColorType {
    self.color_type
  }

  fn pixels(&self) -> &[u8] {
    &self.pixels
  }
}

impl Clone for PngImage {
  fn clone(&self) -> Self {
    let mut image = Self {
      width: self.width,
      height: self.height,
      bit_depth: self.bit_depth,
      color_type: self.color_type,
      density: self.density,
      pixels: self.pixels.clone(),
      filter_strategy: self.filter_strategy,
      header: Chunk::new(ChunkType::IHDR, Vec::new()),
      phys: None,
      end: chunk::end_chunk(),
    };
    image.rebuild_chunks();
    image
  }
}

impl fmt::Debug for PngImage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PngImage")
      .field("width", &self.width)
      .field("height", &self.height)
      .field("bit_depth", &self.bit_depth)
      .field("color_type", &self.color_type)
      .field("density", &self.density)
      .field("pixels", &self.pixels.len())
      .finish()
  }
}
