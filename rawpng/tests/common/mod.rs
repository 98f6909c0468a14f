// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use rawpng::{BitDepth, ColorType, CompressionLevel, PngImage};
use std::path::PathBuf;

macro_rules! roundtrip_check {
  ($test:ident, $width:expr, $height:expr, $depth:expr, $color:expr) => {
    #[test]
    fn $test() -> std::result::Result<(), Box<dyn std::error::Error>> {
      crate::common::init_test_logger();
      crate::common::check_roundtrip($width, $height, $depth, $color)
    }
  };
}

pub(crate) use roundtrip_check;

pub(crate) fn init_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic pixel content with smooth areas and some noise
pub(crate) fn sample_pixels(width: u32, height: u32, depth: BitDepth, color: ColorType) -> Vec<u8> {
  let row_bytes = width as usize * color.channels() * depth.bytes_per_channel();
  let mut state = 0x9E37_79B9_u32;
  let mut pixels = Vec::with_capacity(row_bytes * height as usize);
  for y in 0..height as usize {
    for x in 0..row_bytes {
      state ^= state << 13;
      state ^= state >> 17;
      state ^= state << 5;
      let value = if (x + y) % 5 == 0 { state as u8 } else { (x * 3 + y * 7) as u8 };
      pixels.push(value);
    }
  }
  pixels
}

/// Unique file path in the temp directory, removed on drop
pub(crate) struct TempFile(pub PathBuf);

impl TempFile {
  pub(crate) fn new(name: &str) -> Self {
    let mut path = std::env::temp_dir();
    path.push(format!("rawpng-{}-{}", std::process::id(), name));
    Self(path)
  }
}

impl Drop for TempFile {
  fn drop(&mut self) {
    let _ = std::fs::remove_file(&self.0);
  }
}

/// Encode sample pixels to disk and in memory, decode both and compare
pub(crate) fn check_roundtrip(width: u32, height: u32, depth: BitDepth, color: ColorType) -> std::result::Result<(), Box<dyn std::error::Error>> {
  let pixels = sample_pixels(width, height, depth, color);
  let image = PngImage::new(pixels.clone(), width, height, depth, color)?;

  let file = TempFile::new(&format!("roundtrip-{}x{}-{:?}-{:?}.png", width, height, depth, color));
  image.save(&file.0, CompressionLevel::Default)?;
  let decoded = rawpng::decode_file(&file.0)?;
  assert_eq!(decoded.width(), width);
  assert_eq!(decoded.height(), height);
  assert_eq!(decoded.bit_depth(), depth);
  assert_eq!(decoded.color_type(), color);
  assert_eq!(decoded.interlace(), 0);
  assert_eq!(decoded.pixels(), pixels.as_slice());

  let buf = image.encode_to_vec(CompressionLevel::Best)?;
  assert_eq!(rawpng::decode_buffer(&buf)?.into_pixels(), pixels);
  Ok(())
}
