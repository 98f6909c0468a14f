// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Codec for chunk based, checksummed raster images (PNG container).
//! Given a raw pixel buffer you get a byte exact file, and given such a file
//! you get back the raw pixel buffer and its metadata.
//!
//! # Example
//! ```rust,no_run
//! use rawpng::{BitDepth, ColorType, CompressionLevel, PngImage};
//!
//! fn main() -> rawpng::Result<()> {
//!   let pixels = vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120];
//!   let image = PngImage::new(pixels, 2, 2, BitDepth::Eight, ColorType::Truecolor)?;
//!   image.save("out.png", CompressionLevel::Default)?;
//!
//!   let decoded = rawpng::decode_file("out.png")?;
//!   assert_eq!(decoded.pixels(), image.pixels());
//!   Ok(())
//! }
//! ```

#![deny(
    //missing_docs,
    //missing_debug_implementations,
    //missing_copy_implementations,
    //unsafe_code,
    unstable_features,
    //unused_import_braces,
    //unused_qualifications
  )]

pub mod bits;
pub mod chunk;
pub mod compress;
pub mod crc;
pub mod decoder;
mod envparams;
pub mod filter;
pub mod format;
pub mod image;
pub mod partition;
pub mod pixutil;
pub mod rawsource;
pub mod scanlines;
pub mod scanner;

pub use chunk::{Chunk, ChunkType};
pub use compress::CompressionLevel;
pub use decoder::{ChunkWalk, DecodeParams};
pub use filter::FilterType;
pub use format::{BitDepth, ColorType, DensityUnit, PNG_SIGNATURE, PhysicalDensity};
pub use image::{PngImage, PngInfo};
pub use scanlines::FilterStrategy;

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PngError {
  #[error("I/O error: {}", _0)]
  Io(#[from] std::io::Error),

  #[error("I/O error on file: {:?}, {}", path, source)]
  FileIo { path: PathBuf, source: std::io::Error },

  #[error("Unsupported bit depth: {}, must be 8 or 16", _0)]
  UnsupportedBitDepth(u8),

  #[error("Unsupported color type: {}, only 0 (grayscale), 2 (truecolor), 4 (grayscale+alpha) and 6 (truecolor+alpha) are managed", _0)]
  UnsupportedColorType(u8),

  #[error("Unsupported interlace method: {}", _0)]
  UnsupportedInterlace(u8),

  #[error("Unsupported {} method: {}", what, value)]
  UnsupportedMethod { what: &'static str, value: u8 },

  #[error("Invalid filter type 0x{:02x} in scanline {}", tag, row)]
  InvalidFilter { row: usize, tag: u8 },

  #[error("Decompression failed: {}", _0)]
  Decompress(String),

  #[error("Checksum mismatch in {} chunk: stored 0x{:08x}, computed 0x{:08x}", chunk, stored, computed)]
  ChecksumMismatch { chunk: ChunkType, stored: u32, computed: u32 },

  #[error("Format error: {}", _0)]
  Format(String),

  #[error("Allocation failed: {}", _0)]
  Allocation(String),

  #[error("Invalid argument: {}", _0)]
  InvalidArgument(String),

  #[error("Failed to build worker pool: {}", _0)]
  ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, PngError>;

impl PngError {
  pub fn with_io_error(path: impl AsRef<Path>, error: std::io::Error) -> Self {
    Self::FileIo {
      path: path.as_ref().to_owned(),
      source: error,
    }
  }

  /// True for errors raised while opening, reading or writing files and streams
  pub fn is_io(&self) -> bool {
    matches!(self, Self::Io(_) | Self::FileIo { .. })
  }

  /// True for errors caused by malformed or unsupported image data
  pub fn is_format(&self) -> bool {
    matches!(
      self,
      Self::UnsupportedBitDepth(_)
        | Self::UnsupportedColorType(_)
        | Self::UnsupportedInterlace(_)
        | Self::UnsupportedMethod { .. }
        | Self::InvalidFilter { .. }
        | Self::Decompress(_)
        | Self::ChecksumMismatch { .. }
        | Self::Format(_)
    )
  }
}

impl From<std::collections::TryReserveError> for PngError {
  fn from(err: std::collections::TryReserveError) -> Self {
    Self::Allocation(err.to_string())
  }
}

/// Build an image from raw pixels, ready to be saved.
pub fn encode(pixels: Vec<u8>, width: u32, height: u32, bit_depth: BitDepth, color_type: ColorType) -> Result<PngImage> {
  PngImage::new(pixels, width, height, bit_depth, color_type)
}

/// Take a path to an image file and return the decoded image or an error
///
/// # Example
/// ```rust,ignore
/// let image = match rawpng::decode_file("path/to/your/file.png") {
///   Ok(val) => val,
///   Err(e) => ... some appropriate action when the file is unreadable ...
/// };
/// ```
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<PngImage> {
  PngImage::open(path)
}

/// Decode an image held completely in memory
pub fn decode_buffer(buf: &[u8]) -> Result<PngImage> {
  PngImage::from_bytes(buf)
}

/// Take a readable source and return a decoded image or an error.
/// The whole stream is consumed before decoding starts.
pub fn decode(reader: &mut dyn Read) -> Result<PngImage> {
  let source = rawsource::PngSource::from_reader(reader)?;
  decoder::decode_source(&source, &DecodeParams::default())
}

/// Check if a stream carries an image header tag at all.
/// The stream position is restored afterwards.
pub fn is_png_stream<R: Read + Seek>(reader: &mut R) -> Result<bool> {
  Ok(scanner::find_pattern_in(reader, &ChunkType::IHDR.0)?.is_some())
}

#[cfg(test)]
pub(crate) fn init_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}
