// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use crate::{PngError, Result};

/// Fixed magic at the start of every file
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub const COMPRESSION_METHOD_DEFLATE: u8 = 0;
pub const FILTER_METHOD_ADAPTIVE: u8 = 0;
pub const INTERLACE_NONE: u8 = 0;

/// Color modes handled by the codec. Palette (3) is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColorType {
  Grayscale = 0,
  Truecolor = 2,
  GrayscaleAlpha = 4,
  TruecolorAlpha = 6,
}

impl ColorType {
  /// Samples per pixel
  pub fn channels(self) -> usize {
    match self {
      Self::Grayscale => 1,
      Self::GrayscaleAlpha => 2,
      Self::Truecolor => 3,
      Self::TruecolorAlpha => 4,
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "gray" | "grayscale" => Some(Self::Grayscale),
      "graya" | "grayscale-alpha" => Some(Self::GrayscaleAlpha),
      "rgb" | "truecolor" => Some(Self::Truecolor),
      "rgba" | "truecolor-alpha" => Some(Self::TruecolorAlpha),
      _ => None,
    }
  }

  /// Parse the color type field of a header
  pub fn from_raw(value: u8) -> Result<Self> {
    Self::try_from_primitive(value).map_err(|_| PngError::UnsupportedColorType(value))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum BitDepth {
  Eight = 8,
  Sixteen = 16,
}

impl BitDepth {
  pub fn bytes_per_channel(self) -> usize {
    match self {
      Self::Eight => 1,
      Self::Sixteen => 2,
    }
  }

  pub fn bits(self) -> u8 {
    self.into()
  }

  /// Parse the bit depth field of a header
  pub fn from_raw(value: u8) -> Result<Self> {
    Self::try_from_primitive(value).map_err(|_| PngError::UnsupportedBitDepth(value))
  }
}

/// Unit of the physical pixel density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum DensityUnit {
  Unspecified = 0,
  Meter = 1,
}

impl Default for DensityUnit {
  fn default() -> Self {
    Self::Unspecified
  }
}

/// Physical pixel dimensions (pixels per unit on each axis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PhysicalDensity {
  pub ppu_x: u32,
  pub ppu_y: u32,
  pub unit: DensityUnit,
}

impl PhysicalDensity {
  pub fn new(ppu_x: u32, ppu_y: u32, unit: DensityUnit) -> Self {
    Self { ppu_x, ppu_y, unit }
  }

  /// A density with a zero axis is treated as absent and never written
  pub fn is_present(&self) -> bool {
    self.ppu_x != 0 && self.ppu_y != 0
  }

  /// Convert to dots per inch, only meaningful for metric units
  pub fn dpi(&self) -> Option<(f64, f64)> {
    match self.unit {
      DensityUnit::Meter if self.is_present() => Some((self.ppu_x as f64 * 0.0254, self.ppu_y as f64 * 0.0254)),
      _ => None,
    }
  }
}
