// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Conversion between raw pixel rows and the filtered scanline buffer
//! (one filter tag byte followed by the filtered row, for every row).
//!
//! Encoding may run on several workers since each row only depends on
//! the raw row above it. Decoding is strictly sequential: every row
//! needs the reconstructed row above.

use log::debug;
use num_enum::TryFromPrimitive;
use rayon::prelude::*;

use crate::envparams::rawpng_filter_threads;
use crate::filter::{FilterType, select_filter, unfilter_row};
use crate::partition::{RowPartitioner, worker_count};
use crate::{PngError, Result};

/// Geometry of a scanline buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanlineLayout {
  pub width: usize,
  pub height: usize,
  /// Bytes per complete pixel
  pub bpp: usize,
  row_bytes: usize,
  buffer_len: usize,
}

impl ScanlineLayout {
  pub fn new(width: u32, height: u32, bpp: usize) -> Result<Self> {
    if width == 0 || height == 0 || bpp == 0 {
      return Err(PngError::InvalidArgument(format!("Invalid image geometry {}x{} with {} bytes per pixel", width, height, bpp)));
    }
    let (width, height) = (width as usize, height as usize);
    let too_large = || PngError::InvalidArgument(format!("Image of {}x{} pixels is too large", width, height));
    let row_bytes = width.checked_mul(bpp).ok_or_else(too_large)?;
    let buffer_len = row_bytes.checked_add(1).and_then(|line| line.checked_mul(height)).ok_or_else(too_large)?;
    Ok(Self {
      width,
      height,
      bpp,
      row_bytes,
      buffer_len,
    })
  }

  /// Bytes of one raw pixel row
  pub fn row_bytes(&self) -> usize {
    self.row_bytes
  }

  /// Bytes of one scanline including its filter tag
  pub fn line_len(&self) -> usize {
    self.row_bytes + 1
  }

  /// Size of the complete scanline buffer
  pub fn buffer_len(&self) -> usize {
    self.buffer_len
  }

  /// Size of the raw pixel buffer
  pub fn pixel_len(&self) -> usize {
    self.row_bytes * self.height
  }
}

/// How encode-side filtering is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterStrategy {
  /// Single threaded, always available
  Sequential,
  /// Exactly this many row groups (capped by the image height)
  Parallel { workers: usize },
  /// Worker count from `RAWPNG_FILTER_THREADS` or the hardware
  #[default]
  Auto,
}

pub(crate) fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
  let mut buf = Vec::new();
  buf.try_reserve_exact(len).map_err(|err| PngError::Allocation(format!("{} bytes: {}", len, err)))?;
  Ok(buf)
}

fn check_pixels(pixels: &[u8], layout: &ScanlineLayout) -> Result<()> {
  if pixels.len() != layout.pixel_len() {
    return Err(PngError::InvalidArgument(format!(
      "Pixel buffer has {} bytes, expected {}",
      pixels.len(),
      layout.pixel_len()
    )));
  }
  Ok(())
}

/// Filter consecutive raw rows, `prior` being the raw row above the first one
fn filter_rows(data: &[u8], prior: Option<&[u8]>, row_bytes: usize, bpp: usize) -> Result<Vec<u8>> {
  let rows = data.len() / row_bytes;
  let mut out = alloc_buffer(rows * (row_bytes + 1))?;
  let mut scratch = vec![0; row_bytes];
  let mut prev = prior;
  for row in data.chunks_exact(row_bytes) {
    let filter = select_filter(bpp, row, prev, &mut scratch);
    out.push(filter.into());
    out.extend_from_slice(&scratch);
    prev = Some(row);
  }
  Ok(out)
}

pub fn encode_scanlines_sequential(pixels: &[u8], layout: &ScanlineLayout) -> Result<Vec<u8>> {
  check_pixels(pixels, layout)?;
  let out = filter_rows(pixels, None, layout.row_bytes(), layout.bpp)?;
  log_filter_usage("encoded", &out, layout);
  Ok(out)
}

pub fn encode_scanlines_parallel(pixels: &[u8], layout: &ScanlineLayout, workers: usize) -> Result<Vec<u8>> {
  check_pixels(pixels, layout)?;
  let row_bytes = layout.row_bytes();
  let parts: Vec<_> = RowPartitioner::new(pixels, row_bytes, layout.height, workers).collect();
  debug!("Filter {} rows using {} workers", layout.height, parts.len());

  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(parts.len())
    .thread_name(|i| format!("rawpng-filter-{}", i))
    .build()?;

  let results = pool.install(|| {
    parts
      .par_iter()
      .map(|part| filter_rows(part.data, part.prior, row_bytes, layout.bpp))
      .collect::<Result<Vec<Vec<u8>>>>()
  })?;

  let mut out = alloc_buffer(layout.buffer_len())?;
  for group in results {
    out.extend_from_slice(&group);
  }
  log_filter_usage("encoded", &out, layout);
  Ok(out)
}

/// Filter all rows of `pixels` using the given execution strategy
pub fn encode_scanlines(pixels: &[u8], layout: &ScanlineLayout, strategy: FilterStrategy) -> Result<Vec<u8>> {
  match strategy {
    FilterStrategy::Sequential => encode_scanlines_sequential(pixels, layout),
    FilterStrategy::Parallel { workers } => encode_scanlines_parallel(pixels, layout, workers),
    FilterStrategy::Auto => {
      let available = rawpng_filter_threads().unwrap_or_else(rayon::current_num_threads);
      match worker_count(layout.height, available) {
        1 => encode_scanlines_sequential(pixels, layout),
        workers => encode_scanlines_parallel(pixels, layout, workers),
      }
    }
  }
}

/// Reconstruct raw pixels from a scanline buffer, row by row
pub fn decode_scanlines(scanlines: &[u8], layout: &ScanlineLayout) -> Result<Vec<u8>> {
  if scanlines.len() != layout.buffer_len() {
    return Err(PngError::Format(format!(
      "Scanline buffer has {} bytes, expected {}",
      scanlines.len(),
      layout.buffer_len()
    )));
  }
  let row_bytes = layout.row_bytes();
  let mut out = alloc_buffer(layout.pixel_len())?;
  out.resize(layout.pixel_len(), 0);

  for (row, line) in scanlines.chunks_exact(layout.line_len()).enumerate() {
    let tag = line[0];
    let filter = FilterType::try_from_primitive(tag).map_err(|_| PngError::InvalidFilter { row, tag })?;
    let (done, rest) = out.split_at_mut(row * row_bytes);
    let current = &mut rest[..row_bytes];
    current.copy_from_slice(&line[1..]);
    let prior = if row == 0 { None } else { Some(&done[(row - 1) * row_bytes..]) };
    unfilter_row(filter, layout.bpp, current, prior);
  }
  log_filter_usage("decoded", scanlines, layout);
  Ok(out)
}

/// Count rows per filter tag, tags above 4 are ignored
pub fn filter_histogram(scanlines: &[u8], layout: &ScanlineLayout) -> [usize; 5] {
  let mut hist = [0; 5];
  for line in scanlines.chunks_exact(layout.line_len()) {
    if let Some(slot) = hist.get_mut(line[0] as usize) {
      *slot += 1;
    }
  }
  hist
}

fn log_filter_usage(what: &str, scanlines: &[u8], layout: &ScanlineLayout) {
  if log::log_enabled!(log::Level::Debug) {
    let [none, sub, up, avg, paeth] = filter_histogram(scanlines, layout);
    debug!(
      "Rows {}: none={}, sub={}, up={}, average={}, paeth={}",
      what, none, sub, up, avg, paeth
    );
  }
}
