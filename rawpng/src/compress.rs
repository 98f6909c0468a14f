// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{self, Read};

use libflate::zlib::Decoder;
use log::debug;

use crate::scanlines::alloc_buffer;
use crate::{PngError, Result};

/// Trade-off between output size and encoding speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
  /// Stored blocks only
  None,
  Fastest,
  #[default]
  Default,
  /// Longest match search, smallest output
  Best,
}

impl CompressionLevel {
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "none" | "store" => Some(Self::None),
      "fast" | "fastest" => Some(Self::Fastest),
      "default" => Some(Self::Default),
      "best" => Some(Self::Best),
      _ => None,
    }
  }

  /// Numeric deflate level (0-9)
  pub fn deflate_level(&self) -> u8 {
    match self {
      Self::None => 0,
      Self::Fastest => 1,
      Self::Default => 6,
      Self::Best => 9,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Fastest => "fast",
      Self::Default => "default",
      Self::Best => "best",
    }
  }
}

/// Compress `data` into a zlib stream
pub fn deflate(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
  let packed = miniz_oxide::deflate::compress_to_vec_zlib(data, level.deflate_level());
  debug!("Deflated {} bytes into {} bytes at level {}", data.len(), packed.len(), level.deflate_level());
  Ok(packed)
}

/// Reads a list of byte slices as one continuous stream
struct Segments<'a> {
  pending: &'a [&'a [u8]],
  current: &'a [u8],
}

impl<'a> Read for Segments<'a> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    loop {
      if !self.current.is_empty() || buf.is_empty() {
        return self.current.read(buf);
      }
      match self.pending.split_first() {
        Some((first, rest)) => {
          self.current = *first;
          self.pending = rest;
        }
        None => return Ok(0),
      }
    }
  }
}

/// Decompress the zlib stream formed by concatenating `segments` in order.
/// The output must be exactly `expected_len` bytes.
pub fn inflate(segments: &[&[u8]], expected_len: usize) -> Result<Vec<u8>> {
  let input = Segments {
    pending: segments,
    current: &[],
  };
  let decoder = Decoder::new(input).map_err(|err| PngError::Decompress(format!("Invalid zlib header: {}", err)))?;
  let mut out = alloc_buffer(expected_len)?;
  decoder
    .take(expected_len as u64 + 1)
    .read_to_end(&mut out)
    .map_err(|err| PngError::Decompress(err.to_string()))?;
  if out.len() != expected_len {
    return Err(PngError::Decompress(if out.len() > expected_len {
      format!("Data stream inflates to more than {} bytes", expected_len)
    } else {
      format!("Data stream inflates to {} bytes, expected {}", out.len(), expected_len)
    }));
  }
  debug!("Inflated {} segments into {} bytes", segments.len(), out.len());
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_data() -> Vec<u8> {
    (0..20_000_u32).map(|i| ((i / 16) ^ (i % 7)) as u8).collect()
  }

  #[test]
  fn all_levels_inflate_back() -> std::result::Result<(), Box<dyn std::error::Error>> {
    crate::init_test_logger();
    let data = sample_data();
    for level in [CompressionLevel::None, CompressionLevel::Fastest, CompressionLevel::Default, CompressionLevel::Best] {
      let packed = deflate(&data, level)?;
      assert_eq!(inflate(&[packed.as_slice()], data.len())?, data, "level {:?}", level);
    }
    Ok(())
  }

  #[test]
  fn stored_is_larger_than_compressed() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let data = sample_data();
    let stored = deflate(&data, CompressionLevel::None)?;
    let packed = deflate(&data, CompressionLevel::Default)?;
    assert!(stored.len() > data.len());
    assert!(packed.len() < stored.len());
    Ok(())
  }

  #[test]
  fn split_stream() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let data = sample_data();
    let packed = deflate(&data, CompressionLevel::Default)?;
    let (a, rest) = packed.split_at(3);
    let (b, c) = rest.split_at(rest.len() / 2);
    let empty: &[u8] = &[];
    assert_eq!(inflate(&[a, empty, b, c], data.len())?, data);
    Ok(())
  }

  #[test]
  fn size_mismatch_is_an_error() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let data = sample_data();
    let packed = deflate(&data, CompressionLevel::Fastest)?;
    assert!(matches!(inflate(&[packed.as_slice()], data.len() + 1), Err(PngError::Decompress(_))));
    assert!(matches!(inflate(&[packed.as_slice()], data.len() - 1), Err(PngError::Decompress(_))));
    Ok(())
  }

  #[test]
  fn corrupt_stream_is_an_error() {
    let junk: &[u8] = &[0x12, 0x34, 0x56];
    assert!(matches!(inflate(&[junk], 10), Err(PngError::Decompress(_))));
    assert!(matches!(inflate(&[], 10), Err(PngError::Decompress(_))));
  }

  #[test]
  fn higher_levels_compress_better() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // smooth gradients with sparse noise, like filtered photographic rows
    let mut state = 0x2545_F491_u32;
    let data: Vec<u8> = (0..256 * 256_u32)
      .map(|i| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let (x, y) = (i % 256, i / 256);
        if (x + y) % 5 == 0 { state as u8 } else { (x * 3 + y * 7) as u8 }
      })
      .collect();
    let sizes: Vec<usize> = [CompressionLevel::None, CompressionLevel::Fastest, CompressionLevel::Default, CompressionLevel::Best]
      .into_iter()
      .map(|level| deflate(&data, level).map(|packed| packed.len()))
      .collect::<Result<_>>()?;
    assert!(sizes[3] <= sizes[2], "best {} > default {}", sizes[3], sizes[2]);
    assert!(sizes[2] < sizes[1], "default {} >= fastest {}", sizes[2], sizes[1]);
    assert!(sizes[1] < sizes[0], "fastest {} >= none {}", sizes[1], sizes[0]);
    Ok(())
  }

  #[test]
  fn level_names() {
    assert_eq!(CompressionLevel::from_name("best"), Some(CompressionLevel::Best));
    assert_eq!(CompressionLevel::from_name("fast"), Some(CompressionLevel::Fastest));
    assert_eq!(CompressionLevel::from_name("zip"), None);
    assert_eq!(CompressionLevel::Default.name(), "default");
    assert_eq!(CompressionLevel::Best.deflate_level(), 9);
  }
}
